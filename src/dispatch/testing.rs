//! Recording gateway stub shared by the stage tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::gateway::{GatewayError, MemberRestrictions, PlatformGateway};

/// A side-effecting call the stub observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Send { chat_id: i64 },
    Delete { chat_id: i64, message_id: i32 },
    Ban { chat_id: i64, user_id: i64, revoke_history: bool },
    Unban { chat_id: i64, user_id: i64 },
    Restrict { chat_id: i64, user_id: i64 },
    Leave { chat_id: i64 },
}

/// Gateway stub that records calls and can be configured to fail.
#[derive(Default)]
pub struct TestGateway {
    admins: HashSet<i64>,
    calls: Mutex<Vec<RecordedCall>>,
    admin_fetches: AtomicUsize,
    fail_admin_fetches: bool,
    fail_bans: bool,
}

impl TestGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_admins(mut self, admins: impl IntoIterator<Item = i64>) -> Self {
        self.admins = admins.into_iter().collect();
        self
    }

    pub fn failing_admin_fetches(mut self) -> Self {
        self.fail_admin_fetches = true;
        self
    }

    pub fn failing_bans(mut self) -> Self {
        self.fail_bans = true;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("call log lock").clone()
    }

    pub fn admin_fetches(&self) -> usize {
        self.admin_fetches.load(Ordering::SeqCst)
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().expect("call log lock").push(call);
    }
}

#[async_trait]
impl PlatformGateway for TestGateway {
    async fn send_message(&self, chat_id: i64, _text: &str) -> Result<(), GatewayError> {
        self.record(RecordedCall::Send { chat_id });
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), GatewayError> {
        self.record(RecordedCall::Delete {
            chat_id,
            message_id,
        });
        Ok(())
    }

    async fn ban_member(
        &self,
        chat_id: i64,
        user_id: i64,
        revoke_history: bool,
    ) -> Result<(), GatewayError> {
        self.record(RecordedCall::Ban {
            chat_id,
            user_id,
            revoke_history,
        });
        if self.fail_bans {
            return Err(GatewayError::Api("not enough rights".to_string()));
        }
        Ok(())
    }

    async fn unban_member(&self, chat_id: i64, user_id: i64) -> Result<(), GatewayError> {
        self.record(RecordedCall::Unban { chat_id, user_id });
        Ok(())
    }

    async fn restrict_member(
        &self,
        chat_id: i64,
        user_id: i64,
        _restrictions: MemberRestrictions,
        _until: Option<DateTime<Utc>>,
    ) -> Result<(), GatewayError> {
        self.record(RecordedCall::Restrict { chat_id, user_id });
        Ok(())
    }

    async fn get_chat_administrators(&self, _chat_id: i64) -> Result<HashSet<i64>, GatewayError> {
        self.admin_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_admin_fetches {
            return Err(GatewayError::Network("connection reset".to_string()));
        }
        Ok(self.admins.clone())
    }

    async fn leave_chat(&self, chat_id: i64) -> Result<(), GatewayError> {
        self.record(RecordedCall::Leave { chat_id });
        Ok(())
    }
}
