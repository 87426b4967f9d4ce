use crate::handlers::api::{error_response, success_response, ApiGatewayResponse, HandlerConfig};
use crate::runtime::contract::{ReasonCode, RevealEntryResponse, ViewEntryResponse};
use crate::runtime::entry::is_well_formed_entry_id;
use crate::runtime::orchestrator::{reveal_entry, store_reason, view_entry};
use crate::runtime::store::{EntryStore, RevealOutcome, StoreError};

pub fn handle_view_entry(entry_id: &str, store: &impl EntryStore) -> ApiGatewayResponse {
    if !is_well_formed_entry_id(entry_id) {
        return error_response(ReasonCode::NotFound, "");
    }

    match view_entry(entry_id, store) {
        Ok(Some(view)) => success_response(
            200,
            ViewEntryResponse {
                viewer: view.intended_viewer,
                seen: view.revealed,
            },
        ),
        Ok(None) => error_response(ReasonCode::NotFound, ""),
        Err(error) => store_failure_response("view", entry_id, &error),
    }
}

pub fn handle_reveal_entry(
    entry_id: &str,
    config: &HandlerConfig,
    store: &impl EntryStore,
) -> ApiGatewayResponse {
    if !is_well_formed_entry_id(entry_id) {
        return error_response(ReasonCode::NotFound, "");
    }

    match reveal_entry(entry_id, &config.event_time, store) {
        Ok(RevealOutcome::Revealed { drawn_name }) => {
            tracing::info!(
                component = "entry_handler",
                event = "entry_revealed",
                entry_id,
            );
            success_response(200, RevealEntryResponse { drawn_name })
        }
        Ok(RevealOutcome::AlreadyRevealed) => {
            tracing::info!(
                component = "entry_handler",
                event = "reveal_already_drawn",
                entry_id,
            );
            error_response(ReasonCode::AlreadyDrawn, "")
        }
        Ok(RevealOutcome::NotFound) => error_response(ReasonCode::NotFound, ""),
        Err(error) => store_failure_response("reveal", entry_id, &error),
    }
}

fn store_failure_response(
    operation: &str,
    entry_id: &str,
    error: &StoreError,
) -> ApiGatewayResponse {
    let event = match error {
        StoreError::Unavailable(_) => "storage_unavailable",
        StoreError::CorruptRecord { .. } => "corrupt_record",
    };
    tracing::error!(
        component = "entry_handler",
        event,
        operation,
        entry_id,
        error = %error,
    );
    error_response(store_reason(error), "")
}
