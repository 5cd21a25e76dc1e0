use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::ChatId,
    protocol::{BotApiResponse, SendMessageRequest},
};
use tracing::info;
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
pub const WEBHOOK_PATH: &str = "/webhook";

/// Where replies go once a command has been handled.
#[async_trait]
pub trait Outbox: Send + Sync {
    async fn deliver(&self, chat_id: ChatId, text: &str) -> Result<()>;
}

/// Used when no bot token is configured.
pub struct LogOutbox;

#[async_trait]
impl Outbox for LogOutbox {
    async fn deliver(&self, chat_id: ChatId, text: &str) -> Result<()> {
        info!(chat_id = chat_id.0, %text, "reply not sent: no bot token configured");
        Ok(())
    }
}

#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    api_base: String,
    token: String,
}

impl TelegramClient {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_base: api_base.into(),
            token: token.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.api_base.trim_end_matches('/'),
            self.token
        )
    }

    pub async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<()> {
        let res = self
            .http
            .post(self.method_url("sendMessage"))
            .json(&SendMessageRequest {
                chat_id,
                text: text.to_string(),
            })
            .send()
            .await
            .context("sendMessage request failed")?;
        check_reply("sendMessage", res).await
    }

    pub async fn set_webhook(&self, webhook_url: &Url) -> Result<()> {
        let res = self
            .http
            .get(self.method_url("setWebhook"))
            .query(&[("url", webhook_url.as_str())])
            .send()
            .await
            .context("setWebhook request failed")?;
        check_reply("setWebhook", res).await
    }
}

#[async_trait]
impl Outbox for TelegramClient {
    async fn deliver(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.send_message(chat_id, text).await
    }
}

async fn check_reply(method: &str, res: reqwest::Response) -> Result<()> {
    let status = res.status();
    let body = res.json::<BotApiResponse>().await.ok();
    match body {
        Some(body) if status.is_success() && body.ok => Ok(()),
        Some(body) => bail!(
            "{method} rejected with status {status}: {}",
            body.description.unwrap_or_else(|| "no description".into())
        ),
        None => bail!("{method} failed with status {status}"),
    }
}

/// Appends the webhook route to the public base URL, keeping any path prefix.
pub fn webhook_url(public_url: &str) -> Result<Url> {
    let mut url = Url::parse(public_url.trim())
        .with_context(|| format!("invalid public url '{public_url}'"))?;
    if url.cannot_be_a_base() {
        bail!("public url '{public_url}' cannot carry a path");
    }
    let path = format!("{}{WEBHOOK_PATH}", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.set_query(None);
    Ok(url)
}

#[cfg(test)]
#[path = "tests/telegram_tests.rs"]
mod tests;
