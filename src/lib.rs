pub mod app;
pub mod cli;
pub mod config;
pub mod gateway;
pub mod notes;
pub mod sources;
pub mod ui;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use gateway::{GatewayError, NoteGateway};
pub use notes::{Note, NoteDraft, NoteId};
