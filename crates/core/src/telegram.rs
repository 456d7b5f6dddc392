//! Telegram Bot API implementation of [`ChannelSender`].
//!
//! Text goes through `sendMessage`. Albums go through `sendMediaGroup`, as a
//! JSON body when every photo is a remote URL and as a multipart upload with
//! `attach://` references when photos were staged locally.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::fetch::FetchConfig;
use crate::sender::{ChannelSender, ChatTarget, MediaItem, MediaSource, ParseMode};
use crate::{RelayError, Result};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Bot API client bound to one bot token.
#[derive(Clone)]
pub struct TelegramSender {
    client: Client,
    api_base: String,
    token: String,
    config: FetchConfig,
}

impl std::fmt::Debug for TelegramSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSender").field("api_base", &self.api_base).finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct InputMediaPhoto {
    #[serde(rename = "type")]
    kind: &'static str,
    media: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    error_code: Option<u16>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

fn parse_mode_name(mode: ParseMode) -> Option<&'static str> {
    match mode {
        ParseMode::Plain => None,
        ParseMode::MarkdownV2 => Some("MarkdownV2"),
    }
}

fn chat_id_value(target: &ChatTarget) -> Value {
    match target {
        ChatTarget::Id(id) => json!(id),
        ChatTarget::Channel(name) => json!(name),
    }
}

/// Builds the `media` array and the list of local files it references.
fn input_media(items: &[MediaItem], parse_mode: ParseMode) -> (Vec<InputMediaPhoto>, Vec<(String, std::path::PathBuf)>) {
    let mut attachments = Vec::new();
    let media = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let media = match &item.source {
                MediaSource::Url(url) => url.clone(),
                MediaSource::File(path) => {
                    let name = format!("photo{}", index);
                    attachments.push((name.clone(), path.clone()));
                    format!("attach://{}", name)
                }
            };
            let parse_mode = item.caption.as_ref().and_then(|_| parse_mode_name(parse_mode));
            InputMediaPhoto { kind: "photo", media, caption: item.caption.clone(), parse_mode }
        })
        .collect();
    (media, attachments)
}

/// Turns a Bot API reply into its result or a [`RelayError::TelegramError`].
fn decode_response<T: for<'de> Deserialize<'de>>(status: u16, body: &str) -> Result<Option<T>> {
    match serde_json::from_str::<ApiResponse<T>>(body) {
        Ok(response) if response.ok => Ok(response.result),
        Ok(response) => Err(RelayError::TelegramError {
            code: response.error_code.unwrap_or(status),
            description: response.description.unwrap_or_else(|| "unknown error".to_string()),
        }),
        Err(_) => Err(RelayError::TelegramError {
            code: status,
            description: body.chars().take(200).collect(),
        }),
    }
}

impl TelegramSender {
    pub fn new(token: impl Into<String>, config: &FetchConfig) -> Result<Self> {
        Ok(Self {
            client: config.client()?,
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.into(),
            config: config.clone(),
        })
    }

    /// Points the client at a different Bot API server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// Sends a request; URLs are stripped from errors since they carry the token.
    async fn call<T: for<'de> Deserialize<'de>>(&self, request: reqwest::RequestBuilder) -> Result<Option<T>> {
        let response = request.send().await.map_err(|e| self.config.map_send_error(e.without_url()))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| RelayError::HttpError(e.without_url()))?;
        decode_response(status, &body)
    }
}

#[async_trait]
impl ChannelSender for TelegramSender {
    async fn send_text(&self, target: &ChatTarget, text: &str, parse_mode: ParseMode) -> Result<i64> {
        let mut body = json!({ "chat_id": chat_id_value(target), "text": text });
        if let Some(mode) = parse_mode_name(parse_mode) {
            body["parse_mode"] = json!(mode);
        }

        let request = self.client.post(self.method_url("sendMessage")).json(&body);
        let sent: Option<SentMessage> = self.call(request).await?;
        Ok(sent.map(|m| m.message_id).unwrap_or_default())
    }

    async fn send_media_group(&self, target: &ChatTarget, items: &[MediaItem], parse_mode: ParseMode) -> Result<()> {
        let (media, attachments) = input_media(items, parse_mode);
        let url = self.method_url("sendMediaGroup");

        let request = if attachments.is_empty() {
            self.client.post(url).json(&json!({ "chat_id": chat_id_value(target), "media": media }))
        } else {
            let media = serde_json::to_string(&media).map_err(|e| RelayError::SerializeError(e.to_string()))?;
            let mut form = Form::new().text("chat_id", target.to_string()).text("media", media);
            for (name, path) in attachments {
                let bytes = tokio::fs::read(&path).await?;
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| format!("{}.jpg", name));
                form = form.part(name, Part::bytes(bytes).file_name(file_name));
            }
            self.client.post(url).multipart(form)
        };

        let _: Option<Value> = self.call(request).await?;
        Ok(())
    }
}
