//! Mailers for testing the email channel without an SMTP relay.

use async_trait::async_trait;
use errnotify::{ErrorMail, Mailer};
use std::sync::{Arc, Mutex};

/// Records every mail it is asked to send.
#[derive(Clone, Debug, Default)]
pub struct RecordingMailer {
    pub sent: Arc<Mutex<Vec<ErrorMail>>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<ErrorMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn error_notification(&self, mail: &ErrorMail) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

/// Fails every send, like a relay that refuses connections.
#[derive(Clone, Debug, Default)]
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn error_notification(&self, _mail: &ErrorMail) -> anyhow::Result<()> {
        anyhow::bail!("connection refused by SMTP relay")
    }
}
