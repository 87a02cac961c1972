//! Hosted persistence service over a PostgREST-style HTTP API.
//!
//! # Responsibility
//! - Map `select`/`insert`/`update`/`delete` onto `GET`/`POST`/`PATCH`/`DELETE`
//!   against `{base_url}/rest/v1/{table}`.
//! - Decode service rows into `TaskRow` values.
//!
//! # Invariants
//! - Every request carries the `apikey` header and a bearer token.
//! - Mutations ask for `Prefer: return=representation` so the service echoes
//!   the stored rows, including assigned ids.
//! - Non-success statuses become `PersistenceError::Service`; bodies that do
//!   not decode become `PersistenceError::MalformedRecord`.
//! - An id filter the id column cannot parse matches no rows, the same as
//!   an id that does not exist.

use crate::config::StoreConfig;
use crate::logging::sanitize_message;
use crate::model::task::TaskId;
use crate::store::{
    NewTaskRow, PersistenceError, PersistenceResult, PersistenceService, TaskRow, TaskRowPatch,
    TaskSelect,
};
use log::debug;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{Method, StatusCode};
use serde::Deserialize;

const PREFER_REPRESENTATION: &str = "return=representation";
const ORDER_BY_DUE: &str = "due_date.asc,id.asc";
const MAX_ERROR_BODY_CHARS: usize = 200;
/// Postgres `invalid_text_representation`, reported for unparsable filters.
const INVALID_TEXT_REPRESENTATION: &str = "22P02";
const EMPTY_ROWS: &str = "[]";

/// Blocking HTTP client for the hosted task collection.
pub struct RestPersistence {
    client: Client,
    config: StoreConfig,
}

impl RestPersistence {
    /// Builds an HTTP client honoring the configured timeout.
    pub fn new(config: StoreConfig) -> PersistenceResult<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn request(&self, method: Method, filter: Option<&TaskId>) -> RequestBuilder {
        let builder = self
            .client
            .request(method, self.config.collection_url())
            .header("apikey", self.config.api_key())
            .bearer_auth(self.config.api_key());
        match filter {
            Some(id) => builder.query(&[("id", id_filter(id))]),
            None => builder,
        }
    }

    fn send(
        &self,
        method: &'static str,
        filter: Option<&TaskId>,
        request: RequestBuilder,
    ) -> PersistenceResult<String> {
        let response = request.send()?;
        let status = response.status();
        debug!(
            "event=rest_request module=store method={method} http_status={}",
            status.as_u16()
        );
        let body = response.text()?;
        if status.is_success() {
            return Ok(body);
        }
        if filter.is_some() && is_invalid_id_filter(status, &body) {
            debug!("event=rest_request module=store method={method} status=skip reason=unparsable_id");
            return Ok(EMPTY_ROWS.to_string());
        }
        Err(PersistenceError::Service {
            status: status.as_u16(),
            message: sanitize_message(&body, MAX_ERROR_BODY_CHARS),
        })
    }
}

impl PersistenceService for RestPersistence {
    fn select(&self, query: &TaskSelect) -> PersistenceResult<Vec<TaskRow>> {
        let request = self
            .request(Method::GET, query.id.as_ref())
            .query(&[("select", "*"), ("order", ORDER_BY_DUE)]);
        decode_rows(&self.send("GET", query.id.as_ref(), request)?)
    }

    fn insert(&self, row: &NewTaskRow) -> PersistenceResult<TaskRow> {
        let request = self
            .request(Method::POST, None)
            .header("Prefer", PREFER_REPRESENTATION)
            .json(&[row]);
        decode_rows(&self.send("POST", None, request)?)?
            .into_iter()
            .next()
            .ok_or_else(|| PersistenceError::MalformedRecord("insert returned no rows".to_string()))
    }

    fn update(&self, id: &TaskId, patch: &TaskRowPatch) -> PersistenceResult<Vec<TaskRow>> {
        if patch.is_empty() {
            return self.select(&TaskSelect::by_id(id));
        }
        let request = self
            .request(Method::PATCH, Some(id))
            .header("Prefer", PREFER_REPRESENTATION)
            .json(patch);
        decode_rows(&self.send("PATCH", Some(id), request)?)
    }

    fn delete(&self, id: &TaskId) -> PersistenceResult<()> {
        let request = self.request(Method::DELETE, Some(id));
        self.send("DELETE", Some(id), request).map(|_| ())
    }
}

fn id_filter(id: &TaskId) -> String {
    format!("eq.{id}")
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    #[serde(default)]
    code: Option<String>,
}

fn is_invalid_id_filter(status: StatusCode, body: &str) -> bool {
    status == StatusCode::BAD_REQUEST
        && serde_json::from_str::<ServiceErrorBody>(body)
            .ok()
            .and_then(|error| error.code)
            .is_some_and(|code| code == INVALID_TEXT_REPRESENTATION)
}

/// Service ids may be numeric or textual depending on the column type.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireId {
    Integer(i64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct WireTaskRow {
    id: WireId,
    title: String,
    description: String,
    due_date: String,
    #[serde(default)]
    is_completed: Option<bool>,
}

impl From<WireTaskRow> for TaskRow {
    fn from(value: WireTaskRow) -> Self {
        let id = match value.id {
            WireId::Integer(id) => TaskId::from(id),
            WireId::Text(id) => TaskId::new(id),
        };
        Self {
            id,
            title: value.title,
            description: value.description,
            due_date: value.due_date,
            is_completed: value.is_completed.unwrap_or(false),
        }
    }
}

fn decode_rows(body: &str) -> PersistenceResult<Vec<TaskRow>> {
    let rows: Vec<WireTaskRow> = serde_json::from_str(body)
        .map_err(|err| PersistenceError::MalformedRecord(format!("undecodable response: {err}")))?;
    Ok(rows.into_iter().map(TaskRow::from).collect())
}
