use async_trait::async_trait;
use tracing::info;

/// Outbound mail seam. Handlers send through this trait from a background
/// task so a slow (or absent) mail system never delays the response.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_activation(&self, recipient: &str, token_plaintext: &str) -> anyhow::Result<()>;
}

/// Writes would-be mail to the log. Used whenever SMTP is disabled, which
/// includes every test run.
pub struct LogMailer {
    sender: String,
}

impl LogMailer {
    #[must_use]
    pub const fn new(sender: String) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_activation(&self, recipient: &str, token_plaintext: &str) -> anyhow::Result<()> {
        info!(
            from = %self.sender,
            to = %recipient,
            "activation mail (smtp disabled): token={token_plaintext}"
        );
        Ok(())
    }
}
