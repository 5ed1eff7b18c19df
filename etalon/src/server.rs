//! HTTP control surface for the filterwheel.
//!
//! Clients address the server by method and form fields rather than by route,
//! so every request goes through a single fallback handler:
//!
//! | Method | Path contains | Body                                   | Response                      |
//! |--------|---------------|----------------------------------------|-------------------------------|
//! | GET    | `log.txt`     |                                        | temperature CSV bytes         |
//! | POST   | any           | `command=filterwheel&position=<0-3>`   | empty, wheel moved            |
//! | POST   | any           | `command=filterwheel&status=`          | current position, e.g. `2`    |
//! | POST   | any           | `command=filterwheel&home=`            | empty, homing sequence done   |
//!
//! A POST with no `command`, another command, or no recognized key gets an
//! empty 200. Errors get a text body: 400 for an invalid position, 500 for
//! desync, hardware faults, or an unreadable temperature log.
//!
//! Hardware calls run on the blocking pool while holding the controller
//! mutex, so filterwheel operations execute one at a time and a move holds
//! its connection until the wheel stops.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use bytes::Bytes;
use hardware::FilterWheel;
use thiserror::Error;
use tracing::{debug, error};

use crate::audit_log::AuditLog;
use crate::controller::{ControllerError, PositionController};
use crate::position::FilterSlot;

/// Errors turned into non-2xx responses.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Controller(#[from] ControllerError),

    #[error("Temperature log unavailable: {0}")]
    TemperatureLog(std::io::Error),

    #[error("Filterwheel controller is poisoned by an earlier panic")]
    Poisoned,

    #[error("Filterwheel task failed: {0}")]
    Task(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::Controller(ControllerError::InvalidPosition(_)) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// Shared state behind the router.
pub struct ServerState<W> {
    controller: Mutex<PositionController<W>>,
    temperature_log: PathBuf,
    audit: AuditLog,
}

impl<W: FilterWheel> ServerState<W> {
    pub fn new(
        controller: PositionController<W>,
        temperature_log: impl Into<PathBuf>,
        audit: AuditLog,
    ) -> Self {
        Self {
            controller: Mutex::new(controller),
            temperature_log: temperature_log.into(),
            audit,
        }
    }
}

/// URL-encoded form fields. Blank values are kept and the first value of a
/// repeated key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields(HashMap<String, String>);

impl FormFields {
    pub fn parse(body: &[u8]) -> Self {
        let mut fields = HashMap::new();
        for (key, value) in url::form_urlencoded::parse(body) {
            fields
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }
}

/// A `command=filterwheel` request. Key precedence is `position`, then
/// `status`, then `home`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterwheelRequest {
    Move(String),
    Status,
    Home,
}

impl FilterwheelRequest {
    pub fn from_form(form: &FormFields) -> Option<Self> {
        if let Some(position) = form.get("position") {
            Some(Self::Move(position.to_string()))
        } else if form.contains("status") {
            Some(Self::Status)
        } else if form.contains("home") {
            Some(Self::Home)
        } else {
            None
        }
    }
}

/// Build the router. All paths and methods go to one dispatcher.
pub fn router<W>(state: Arc<ServerState<W>>) -> Router
where
    W: FilterWheel + Send + 'static,
{
    Router::new().fallback(dispatch::<W>).with_state(state)
}

/// Serve `app` on an already bound listener until the process exits.
pub async fn serve(listener: tokio::net::TcpListener, app: Router) -> std::io::Result<()> {
    axum::serve(listener, app).await
}

fn html(body: impl Into<Body>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html")],
        body.into(),
    )
        .into_response()
}

async fn dispatch<W>(
    State(state): State<Arc<ServerState<W>>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response
where
    W: FilterWheel + Send + 'static,
{
    debug!("{} {}", method, uri);

    let result = match method {
        Method::GET => get_request(&state, &uri).await,
        Method::HEAD => Ok(html(Body::empty())),
        Method::POST => post_request(Arc::clone(&state), &body).await,
        _ => return StatusCode::NOT_IMPLEMENTED.into_response(),
    };

    result.unwrap_or_else(|e| {
        error!("{} {} failed: {}", method, uri, e);
        state.audit.record(format!("ERROR {e}"));
        e.into_response()
    })
}

async fn get_request<W>(state: &ServerState<W>, uri: &Uri) -> Result<Response, ServerError> {
    let target = uri.path_and_query().map_or(uri.path(), |pq| pq.as_str());
    if !target.contains("log.txt") {
        return Ok(html(Body::empty()));
    }

    let contents = tokio::fs::read(&state.temperature_log)
        .await
        .map_err(ServerError::TemperatureLog)?;
    state.audit.record("log.txt dumped");
    Ok(html(contents))
}

async fn post_request<W>(state: Arc<ServerState<W>>, body: &[u8]) -> Result<Response, ServerError>
where
    W: FilterWheel + Send + 'static,
{
    let form = FormFields::parse(body);
    let Some(command) = form.get("command") else {
        return Ok(html(Body::empty()));
    };
    state
        .audit
        .record(format!("COMMAND {command} just received with data"));

    if command != "filterwheel" {
        return Ok(html(Body::empty()));
    }

    match FilterwheelRequest::from_form(&form) {
        Some(FilterwheelRequest::Move(raw)) => {
            let target: FilterSlot = raw.parse().map_err(ControllerError::from)?;
            with_controller(state, move |controller| controller.set_position(target)).await?;
            Ok(html(Body::empty()))
        }
        Some(FilterwheelRequest::Status) => {
            let slot = with_controller(state, |controller| controller.get_position()).await?;
            Ok(html(slot.to_string()))
        }
        Some(FilterwheelRequest::Home) => {
            with_controller(state, |controller| controller.home()).await?;
            Ok(html(Body::empty()))
        }
        None => Ok(html(Body::empty())),
    }
}

/// Run `op` against the controller on the blocking pool.
async fn with_controller<W, T, F>(state: Arc<ServerState<W>>, op: F) -> Result<T, ServerError>
where
    W: FilterWheel + Send + 'static,
    T: Send + 'static,
    F: FnOnce(&mut PositionController<W>) -> Result<T, ControllerError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut controller = state.controller.lock().map_err(|_| ServerError::Poisoned)?;
        op(&mut controller).map_err(ServerError::from)
    })
    .await
    .map_err(|e| ServerError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_keeps_blank_values() {
        let form = FormFields::parse(b"command=filterwheel&status=");
        assert_eq!(form.get("command"), Some("filterwheel"));
        assert_eq!(form.get("status"), Some(""));
    }

    #[test]
    fn test_form_first_value_wins() {
        let form = FormFields::parse(b"position=1&position=3");
        assert_eq!(form.get("position"), Some("1"));
    }

    #[test]
    fn test_form_decodes() {
        let form = FormFields::parse(b"command=filter+wheel&note=a%26b");
        assert_eq!(form.get("command"), Some("filter wheel"));
        assert_eq!(form.get("note"), Some("a&b"));
    }

    #[test]
    fn test_request_precedence() {
        let form = FormFields::parse(b"command=filterwheel&home=&status=&position=2");
        assert_eq!(
            FilterwheelRequest::from_form(&form),
            Some(FilterwheelRequest::Move("2".to_string()))
        );

        let form = FormFields::parse(b"command=filterwheel&home=&status=");
        assert_eq!(
            FilterwheelRequest::from_form(&form),
            Some(FilterwheelRequest::Status)
        );

        let form = FormFields::parse(b"command=filterwheel&home=");
        assert_eq!(
            FilterwheelRequest::from_form(&form),
            Some(FilterwheelRequest::Home)
        );

        let form = FormFields::parse(b"command=filterwheel&speed=3");
        assert_eq!(FilterwheelRequest::from_form(&form), None);
    }

    #[test]
    fn test_error_status_codes() {
        let invalid = ServerError::from(ControllerError::from(crate::SlotError::OutOfRange(9)));
        assert_eq!(invalid.into_response().status(), StatusCode::BAD_REQUEST);

        let desync = ServerError::from(ControllerError::Desync {
            offset: 1,
            slots: [100, 300, 500, 700],
        });
        assert_eq!(
            desync.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
