//! Public web APIs that turn a joke or a quote into a ready-made draft.

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use thiserror::Error;

use crate::config::SourcesConfig;
use crate::notes::NoteDraft;

const USER_AGENT: &str = concat!(
    "notetake/",
    env!("CARGO_PKG_VERSION"),
    " (terminal note client)"
);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum SourceKind {
    Joke,
    Quote,
}

impl SourceKind {
    pub fn failure_alert(self) -> &'static str {
        match self {
            SourceKind::Joke => "Could not fetch a joke right now.",
            SourceKind::Quote => "Could not fetch a quote right now.",
        }
    }
}

#[derive(Debug, Error)]
pub enum ContentSourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{kind} service answered {status}")]
    Status { kind: SourceKind, status: u16 },
    #[error("unexpected {kind} payload: {reason}")]
    Payload { kind: SourceKind, reason: String },
    #[error("{0} source is disabled")]
    Disabled(SourceKind),
}

pub trait ContentSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    fn fetch(&self) -> Result<NoteDraft, ContentSourceError>;
}

#[derive(Debug, Deserialize)]
struct JokePayload {
    joke: String,
}

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    quote: QuotePayload,
}

#[derive(Debug, Deserialize)]
struct QuotePayload {
    body: String,
    author: String,
}

pub fn parse_joke(raw: &str) -> Result<NoteDraft, ContentSourceError> {
    let payload: JokePayload =
        serde_json::from_str(raw).map_err(|err| ContentSourceError::Payload {
            kind: SourceKind::Joke,
            reason: err.to_string(),
        })?;
    Ok(NoteDraft::from_joke(&payload.joke))
}

pub fn parse_quote(raw: &str) -> Result<NoteDraft, ContentSourceError> {
    let envelope: QuoteEnvelope =
        serde_json::from_str(raw).map_err(|err| ContentSourceError::Payload {
            kind: SourceKind::Quote,
            reason: err.to_string(),
        })?;
    Ok(NoteDraft::from_quote(
        &envelope.quote.body,
        &envelope.quote.author,
    ))
}

fn build_client(timeout: Duration) -> Result<Client, ContentSourceError> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?)
}

fn get_json_text(client: &Client, url: &str, kind: SourceKind) -> Result<String, ContentSourceError> {
    let response = client.get(url).header(ACCEPT, "application/json").send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(ContentSourceError::Status {
            kind,
            status: status.as_u16(),
        });
    }
    Ok(response.text()?)
}

/// icanhazdadjoke: only answers JSON when asked for it via `Accept`.
pub struct JokeSource {
    client: Client,
    url: String,
}

impl JokeSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ContentSourceError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.into(),
        })
    }
}

impl ContentSource for JokeSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Joke
    }

    fn fetch(&self) -> Result<NoteDraft, ContentSourceError> {
        let raw = get_json_text(&self.client, &self.url, SourceKind::Joke)?;
        parse_joke(&raw)
    }
}

pub struct QuoteSource {
    client: Client,
    url: String,
    enabled: bool,
}

impl QuoteSource {
    pub fn new(
        url: impl Into<String>,
        enabled: bool,
        timeout: Duration,
    ) -> Result<Self, ContentSourceError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.into(),
            enabled,
        })
    }
}

impl ContentSource for QuoteSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Quote
    }

    fn fetch(&self) -> Result<NoteDraft, ContentSourceError> {
        if !self.enabled {
            return Err(ContentSourceError::Disabled(SourceKind::Quote));
        }
        let raw = get_json_text(&self.client, &self.url, SourceKind::Quote)?;
        parse_quote(&raw)
    }
}

#[derive(Clone)]
pub struct ContentSources {
    joke: Arc<dyn ContentSource>,
    quote: Arc<dyn ContentSource>,
}

impl ContentSources {
    pub fn new(joke: Arc<dyn ContentSource>, quote: Arc<dyn ContentSource>) -> Self {
        Self { joke, quote }
    }

    pub fn from_config(
        config: &SourcesConfig,
        timeout: Duration,
    ) -> Result<Self, ContentSourceError> {
        let joke = JokeSource::new(config.joke_url.clone(), timeout)?;
        let quote = QuoteSource::new(config.quote_url.clone(), config.quote_enabled, timeout)?;
        Ok(Self::new(Arc::new(joke), Arc::new(quote)))
    }

    pub fn get(&self, kind: SourceKind) -> &dyn ContentSource {
        match kind {
            SourceKind::Joke => self.joke.as_ref(),
            SourceKind::Quote => self.quote.as_ref(),
        }
    }

    pub fn fetch(&self, kind: SourceKind) -> Result<NoteDraft, ContentSourceError> {
        let result = self.get(kind).fetch();
        if let Err(err) = &result {
            tracing::error!(%err, %kind, "content source fetch failed");
        }
        result
    }
}
