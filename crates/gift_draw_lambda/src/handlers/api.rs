use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::handlers::draws::handle_create_draw;
use crate::handlers::entries::{handle_reveal_entry, handle_view_entry};
use crate::runtime::contract::{ErrorResponse, ReasonCode};
use crate::runtime::orchestrator::DrawSettings;
use crate::runtime::store::EntryStore;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

/// Per-invocation handler settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    pub draw: DrawSettings,
    /// RFC 3339 timestamp stamped onto created and revealed entries.
    pub event_time: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: String,
    pub path: String,
    pub entry_id: Option<String>,
    pub body: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    CreateDraw,
    ViewEntry(String),
    RevealEntry(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteError {
    NotFound,
    MethodNotAllowed,
}

pub fn handle_api_event(
    event: Value,
    config: &HandlerConfig,
    store: &impl EntryStore,
    rng: &mut impl Rng,
) -> ApiGatewayResponse {
    let request = match parse_api_event(event) {
        Ok(value) => value,
        Err(message) => return error_response(ReasonCode::InvalidInput, &message),
    };

    let route = match resolve_route(&request) {
        Ok(value) => value,
        Err(RouteError::NotFound) => {
            tracing::info!(
                component = "api_router",
                event = "route_not_found",
                method = %request.method,
                path = %request.path,
            );
            return error_response(ReasonCode::RouteNotFound, "");
        }
        Err(RouteError::MethodNotAllowed) => {
            return error_response(ReasonCode::MethodNotAllowed, "");
        }
    };

    match route {
        Route::CreateDraw => handle_create_draw(request.body, config, store, rng),
        Route::ViewEntry(entry_id) => handle_view_entry(&entry_id, store),
        Route::RevealEntry(entry_id) => handle_reveal_entry(&entry_id, config, store),
    }
}

/// Accepts REST (v1) and HTTP API (v2) proxy events. An event with no HTTP
/// shape at all is a direct invocation and is treated as `POST /draws` with
/// the event itself as the payload.
pub fn parse_api_event(event: Value) -> Result<ApiRequest, String> {
    let Some(object) = event.as_object() else {
        return Err("Request payload must be a JSON object".to_string());
    };

    let method = object
        .get("httpMethod")
        .and_then(Value::as_str)
        .or_else(|| {
            event
                .pointer("/requestContext/http/method")
                .and_then(Value::as_str)
        });
    let path = object
        .get("path")
        .and_then(Value::as_str)
        .or_else(|| object.get("rawPath").and_then(Value::as_str));

    let (Some(method), Some(path)) = (method, path) else {
        return Ok(ApiRequest {
            method: "POST".to_string(),
            path: "/draws".to_string(),
            entry_id: None,
            body: event,
        });
    };

    let entry_id = event
        .pointer("/pathParameters/entryId")
        .and_then(Value::as_str)
        .map(str::to_string);
    let is_base64 = object
        .get("isBase64Encoded")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    Ok(ApiRequest {
        method: method.to_ascii_uppercase(),
        path: path.to_string(),
        entry_id,
        body: decode_body(object.get("body"), is_base64)?,
    })
}

fn decode_body(body: Option<&Value>, is_base64: bool) -> Result<Value, String> {
    match body {
        None | Some(Value::Null) => Ok(json!({})),
        Some(value @ Value::Object(_)) => Ok(value.clone()),
        Some(Value::String(text)) => {
            let text = if is_base64 {
                let bytes = BASE64
                    .decode(text.trim())
                    .map_err(|error| format!("Malformed base64 body: {error}"))?;
                String::from_utf8(bytes)
                    .map_err(|error| format!("Body is not valid UTF-8: {error}"))?
            } else {
                text.clone()
            };
            if text.trim().is_empty() {
                return Ok(json!({}));
            }
            serde_json::from_str(&text).map_err(|error| format!("Malformed JSON body: {error}"))
        }
        _ => Err("Request body must be a JSON object".to_string()),
    }
}

/// Matches on the trailing path segments so stage or base-path prefixes
/// added by the gateway do not matter.
pub fn resolve_route(request: &ApiRequest) -> Result<Route, RouteError> {
    let segments: Vec<&str> = request
        .path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();

    // Entry routes go first so an entry id that happens to be `draws` is not
    // read as the create route.
    let (expected_method, route) = match segments.as_slice() {
        [.., "entries", entry_id] => ("GET", Route::ViewEntry(pick_entry_id(request, entry_id))),
        [.., "entries", entry_id, "reveal"] => (
            "POST",
            Route::RevealEntry(pick_entry_id(request, entry_id)),
        ),
        [.., "draws"] => ("POST", Route::CreateDraw),
        _ => return Err(RouteError::NotFound),
    };

    if request.method != expected_method {
        return Err(RouteError::MethodNotAllowed);
    }
    Ok(route)
}

fn pick_entry_id(request: &ApiRequest, from_path: &str) -> String {
    request
        .entry_id
        .clone()
        .unwrap_or_else(|| from_path.to_string())
}

pub fn success_response(status_code: u16, payload: impl Serialize) -> ApiGatewayResponse {
    match serde_json::to_string(&payload) {
        Ok(body) => ApiGatewayResponse {
            status_code,
            headers: response_headers(),
            body,
        },
        Err(error) => {
            tracing::error!(
                component = "api_router",
                event = "serialization_error",
                error = %error,
            );
            error_response(ReasonCode::InternalError, "")
        }
    }
}

/// The message is only included for reasons that are safe to show callers.
pub fn error_response(reason: ReasonCode, message: &str) -> ApiGatewayResponse {
    let payload = ErrorResponse {
        reason,
        message: (reason.exposes_message() && !message.is_empty()).then(|| message.to_string()),
    };
    let body = serde_json::to_string(&payload)
        .unwrap_or_else(|_| json!({ "reason": reason.as_str() }).to_string());

    ApiGatewayResponse {
        status_code: reason.status_code(),
        headers: response_headers(),
        body,
    }
}

fn response_headers() -> Value {
    json!({
        "Content-Type": "application/json",
        "Cache-Control": "no-store",
    })
}
