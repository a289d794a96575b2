//! Event dispatch pipeline.
//!
//! Every inbound platform update becomes an [`Event`] and runs through an
//! ordered chain of [`Stage`]s, each able to enrich the shared
//! [`DispatchContext`], veto further processing, or pass the event along.
//! Events that survive the whole chain reach command logic.

pub mod context;
pub mod dispatcher;
pub mod event;
pub mod stages;

#[cfg(test)]
pub mod testing;

pub use context::DispatchContext;
pub use dispatcher::{DispatchError, DispatchOutcome, Dispatcher, Stage, StageOutcome};
pub use event::{
    Author, CallbackEvent, ChatKind, ChatRef, Event, MembershipEvent, MembershipUpdate,
    MessageEvent, ReplyRef,
};
