//! Built-in dispatch stages.
//!
//! Registration order matters: blacklist enforcement runs before anything
//! that records or responds to a user's activity, and the membership guard
//! runs before anything that persists chat state.

pub mod blacklist;
pub mod history;
pub mod membership;

pub use blacklist::BlacklistStage;
pub use history::HistoryStage;
pub use membership::MembershipGuardStage;
