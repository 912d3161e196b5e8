//! Persistence behind the note list.
//!
//! The client never mints ids or timestamps; every note it displays comes
//! back from one of these gateways.

use std::sync::Arc;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::config::{BackendConfig, BackendKind};
use crate::notes::{Note, NoteDraft, NoteId};

pub mod embedded;
pub mod http;

pub use embedded::EmbeddedGateway;
pub use http::HttpGateway;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("note {0} does not exist")]
    MissingNote(NoteId),
    #[error("could not decode backend reply: {0}")]
    Decode(String),
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub trait NoteGateway: Send + Sync {
    fn name(&self) -> &'static str;

    fn create(&self, draft: &NoteDraft) -> Result<Note, GatewayError>;

    fn list(&self) -> Result<Vec<Note>, GatewayError>;

    fn delete_one(&self, id: NoteId) -> Result<(), GatewayError>;

    fn delete_all(&self) -> Result<(), GatewayError>;

    fn update(&self, id: NoteId, draft: &NoteDraft) -> Result<Note, GatewayError>;
}

pub fn connect(config: &BackendConfig) -> Result<Arc<dyn NoteGateway>> {
    match (config.kind, config.base_url.as_deref()) {
        (BackendKind::Http, Some(base_url)) => {
            let gateway = HttpGateway::new(base_url, config.request_timeout())
                .with_context(|| format!("building http client for {base_url}"))?;
            tracing::info!(base_url, "using http backend");
            Ok(Arc::new(gateway))
        }
        (BackendKind::Http, None) | (BackendKind::Embedded, _) => {
            let gateway =
                EmbeddedGateway::open(&config.database_path, config.wal_autocheckpoint)
                    .with_context(|| {
                        format!("opening note database {}", config.database_path.display())
                    })?;
            tracing::info!(path = %config.database_path.display(), "using embedded backend");
            Ok(Arc::new(gateway))
        }
    }
}
