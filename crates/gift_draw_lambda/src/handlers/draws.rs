use std::time::{Duration, Instant};

use rand::Rng;
use serde_json::Value;

use crate::handlers::api::{error_response, success_response, ApiGatewayResponse, HandlerConfig};
use crate::runtime::contract::{CreateDrawRequest, CreateDrawResponse, ReasonCode};
use crate::runtime::orchestrator::{create_draw, DrawError};
use crate::runtime::store::EntryStore;

pub fn handle_create_draw(
    payload: Value,
    config: &HandlerConfig,
    store: &impl EntryStore,
    rng: &mut impl Rng,
) -> ApiGatewayResponse {
    let started_at = Instant::now();

    let request = match serde_json::from_value::<CreateDrawRequest>(payload) {
        Ok(value) => value,
        Err(error) => {
            return error_response(
                ReasonCode::InvalidInput,
                &format!("Malformed request: {error}"),
            )
        }
    };
    let submitted = request.names.as_ref().map_or(0, Vec::len);

    match create_draw(request, &config.draw, &config.event_time, store, rng) {
        Ok(draw) => {
            tracing::info!(
                component = "draw_handler",
                event = "draw_created",
                draw_id = %draw.draw_id,
                participants = draw.entries.len(),
                attempts = draw.attempts,
                duration_ms = duration_millis(started_at.elapsed()),
            );
            success_response(
                200,
                CreateDrawResponse {
                    entries: draw.entries,
                },
            )
        }
        Err(error) => {
            log_draw_failure(&error, submitted);
            error_response(error.reason(), &error.to_string())
        }
    }
}

fn duration_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

// Validation messages can quote participant names, so they are never logged.
fn log_draw_failure(error: &DrawError, submitted: usize) {
    match error {
        DrawError::InvalidInput(_) => tracing::info!(
            component = "draw_handler",
            event = "draw_rejected",
            participants = submitted,
        ),
        DrawError::TooManyAttempts { attempts } => tracing::info!(
            component = "draw_handler",
            event = "draw_exhausted",
            participants = submitted,
            attempts = *attempts,
        ),
        DrawError::InvariantViolation(detail) => tracing::error!(
            component = "draw_handler",
            event = "invariant_violation",
            participants = submitted,
            detail = %detail,
        ),
        DrawError::Storage(store_error) => tracing::error!(
            component = "draw_handler",
            event = "draw_not_persisted",
            participants = submitted,
            retryable = store_error.is_retryable(),
            error = %store_error,
        ),
    }
}
