use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

/// Inbound webhook body. Only plain text messages are acted on; every other
/// update kind deserializes with `message` (or its `text`) left empty.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub update_id: Option<i64>,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl Update {
    /// `(chat_id, text)` when this update is a text message.
    pub fn text_message(&self) -> Option<(i64, &str)> {
        let message = self.message.as_ref()?;
        let text = message.text.as_deref()?;
        Some((message.chat.id, text))
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Delivers a reply to a chat. Delivery failures are the implementation's
/// problem: they are logged, never returned.
pub trait Messenger {
    fn send(&self, chat_id: i64, text: &str);
}

pub struct TelegramMessenger {
    client: Client,
    api_url: String,
}

impl TelegramMessenger {
    /// `api_url` is the bot root, `<base>/bot<token>`.
    pub fn new(api_url: String) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, api_url })
    }

    pub fn post(&self, chat_id: i64, text: &str) -> Result<()> {
        let url = format!("{}/sendMessage", self.api_url);
        let resp = self
            .client
            .post(url)
            .json(&SendMessage { chat_id, text })
            .send()
            .context("Failed to reach the chat platform")?;

        let status = resp.status();
        let body = resp.text().context("Failed to read sendMessage response")?;
        let parsed: ApiResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(anyhow!("sendMessage failed: HTTP {status}"));
            }
            Err(err) => return Err(anyhow!("Invalid sendMessage response JSON: {err}")),
        };

        if !parsed.ok {
            return Err(anyhow!(
                "sendMessage rejected: {}",
                parsed.description.as_deref().unwrap_or("no description")
            ));
        }
        Ok(())
    }
}

impl Messenger for TelegramMessenger {
    fn send(&self, chat_id: i64, text: &str) {
        match self.post(chat_id, text) {
            Ok(()) => tracing::debug!(chat_id, "reply delivered"),
            Err(err) => tracing::warn!(chat_id, "failed to send message: {err:#}"),
        }
    }
}

/// Prints replies instead of posting them.
pub struct StdoutMessenger;

impl Messenger for StdoutMessenger {
    fn send(&self, chat_id: i64, text: &str) {
        tracing::debug!(chat_id, "printing reply");
        println!("{text}");
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: std::cell::RefCell<Vec<(i64, String)>>,
}

#[cfg(test)]
impl Messenger for RecordingMessenger {
    fn send(&self, chat_id: i64, text: &str) {
        self.sent.borrow_mut().push((chat_id, text.to_string()));
    }
}
