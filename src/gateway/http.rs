use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use super::{GatewayError, NoteGateway};
use crate::notes::{Note, NoteDraft, NoteId};

const USER_AGENT: &str = concat!("notetake/", env!("CARGO_PKG_VERSION"));

pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/notes", self.base_url)
    }

    fn note_url(&self, id: NoteId) -> String {
        format!("{}/notes/{id}", self.base_url)
    }
}

impl NoteGateway for HttpGateway {
    fn name(&self) -> &'static str {
        "http"
    }

    fn create(&self, draft: &NoteDraft) -> Result<Note, GatewayError> {
        let response = self
            .client
            .post(self.collection_url())
            .header(ACCEPT, "application/json")
            .json(draft)
            .send()?;
        decode(check(response, None)?)
    }

    fn list(&self) -> Result<Vec<Note>, GatewayError> {
        let response = self
            .client
            .get(self.collection_url())
            .header(ACCEPT, "application/json")
            .send()?;
        decode(check(response, None)?)
    }

    fn delete_one(&self, id: NoteId) -> Result<(), GatewayError> {
        let response = self.client.delete(self.note_url(id)).send()?;
        check(response, Some(id)).map(drop)
    }

    fn delete_all(&self) -> Result<(), GatewayError> {
        let response = self.client.delete(self.collection_url()).send()?;
        check(response, None).map(drop)
    }

    fn update(&self, id: NoteId, draft: &NoteDraft) -> Result<Note, GatewayError> {
        let response = self
            .client
            .put(self.note_url(id))
            .header(ACCEPT, "application/json")
            .json(draft)
            .send()?;
        decode(check(response, Some(id))?)
    }
}

/// A 404 on a single-note route means the note is gone.
fn check(response: Response, note: Option<NoteId>) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if let (StatusCode::NOT_FOUND, Some(id)) = (status, note) {
        return Err(GatewayError::MissingNote(id));
    }
    let message = response.text().unwrap_or_default();
    Err(GatewayError::Status {
        status: status.as_u16(),
        message: message.trim().to_string(),
    })
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let body = response.text()?;
    serde_json::from_str(&body).map_err(|err| GatewayError::Decode(err.to_string()))
}
