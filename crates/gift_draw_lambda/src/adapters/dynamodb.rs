//! DynamoDB-backed [`EntryStore`].
//!
//! Table layout: hash key `EntryId` (S); attributes `DrawId`, `IntendedViewer`,
//! `DrawnName`, `CreatedAt` and, once revealed, `RevealedAt`. The reveal is a
//! single conditional `UpdateItem`, so DynamoDB serializes racing reveals of
//! one entry and exactly one of them passes the condition.

use std::collections::HashMap;
use std::future::Future;

use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{
    AttributeValue, Put, ReturnValue, ReturnValuesOnConditionCheckFailure, TransactWriteItem,
};

use crate::runtime::entry::{Entry, EntryView};
use crate::runtime::store::{EntryStore, RevealOutcome, StoreError};

pub const ENTRY_ID_ATTR: &str = "EntryId";
pub const DRAW_ID_ATTR: &str = "DrawId";
pub const INTENDED_VIEWER_ATTR: &str = "IntendedViewer";
pub const DRAWN_NAME_ATTR: &str = "DrawnName";
pub const CREATED_AT_ATTR: &str = "CreatedAt";
pub const REVEALED_AT_ATTR: &str = "RevealedAt";

/// DynamoDB caps a single transaction at 100 actions.
pub const MAX_TRANSACT_ITEMS: usize = 100;

type Item = HashMap<String, AttributeValue>;

#[derive(Clone)]
pub struct DynamoEntryStore {
    table_name: String,
    client: aws_sdk_dynamodb::Client,
}

impl DynamoEntryStore {
    pub fn new(table_name: impl Into<String>, client: aws_sdk_dynamodb::Client) -> Self {
        Self {
            table_name: table_name.into(),
            client,
        }
    }

    fn key(entry_id: &str) -> (String, AttributeValue) {
        (
            ENTRY_ID_ATTR.to_string(),
            AttributeValue::S(entry_id.to_string()),
        )
    }
}

impl EntryStore for DynamoEntryStore {
    fn create_batch(&self, entries: &[Entry]) -> Result<(), StoreError> {
        if entries.len() > MAX_TRANSACT_ITEMS {
            return Err(StoreError::Unavailable(format!(
                "batch of {} entries exceeds the transaction limit of {MAX_TRANSACT_ITEMS}",
                entries.len()
            )));
        }

        let mut actions = Vec::with_capacity(entries.len());
        for entry in entries {
            let put = Put::builder()
                .table_name(&self.table_name)
                .set_item(Some(entry_to_item(entry)))
                .condition_expression("attribute_not_exists(#entry_id)")
                .expression_attribute_names("#entry_id", ENTRY_ID_ATTR)
                .build()
                .map_err(|error| {
                    StoreError::Unavailable(format!("failed to build entry put: {error}"))
                })?;
            actions.push(TransactWriteItem::builder().put(put).build());
        }

        let client = self.client.clone();
        block_on(async move {
            client
                .transact_write_items()
                .set_transact_items(Some(actions))
                .send()
                .await
                .map(|_| ())
                .map_err(|error| {
                    unavailable("create_batch", format!("{}", DisplayErrorContext(&error)))
                })
        })
    }

    fn get_by_entry_id(&self, entry_id: &str) -> Result<Option<EntryView>, StoreError> {
        let (key_name, key_value) = Self::key(entry_id);
        let client = self.client.clone();
        let table_name = self.table_name.clone();

        let output = block_on(async move {
            client
                .get_item()
                .table_name(table_name)
                .key(key_name, key_value)
                .projection_expression("#viewer, #revealed_at")
                .expression_attribute_names("#viewer", INTENDED_VIEWER_ATTR)
                .expression_attribute_names("#revealed_at", REVEALED_AT_ATTR)
                .consistent_read(true)
                .send()
                .await
                .map_err(|error| {
                    unavailable(
                        "get_by_entry_id",
                        format!("{}", DisplayErrorContext(&error)),
                    )
                })
        })?;

        output
            .item()
            .map(|item| view_from_item(entry_id, item))
            .transpose()
    }

    fn reveal(&self, entry_id: &str, revealed_at: &str) -> Result<RevealOutcome, StoreError> {
        let (key_name, key_value) = Self::key(entry_id);
        let client = self.client.clone();
        let table_name = self.table_name.clone();
        let revealed_at = revealed_at.to_string();

        let result = block_on(async move {
            client
                .update_item()
                .table_name(table_name)
                .key(key_name, key_value)
                .update_expression("SET #revealed_at = :revealed_at")
                .condition_expression(
                    "attribute_exists(#entry_id) AND attribute_not_exists(#revealed_at)",
                )
                .expression_attribute_names("#entry_id", ENTRY_ID_ATTR)
                .expression_attribute_names("#revealed_at", REVEALED_AT_ATTR)
                .expression_attribute_values(":revealed_at", AttributeValue::S(revealed_at))
                .return_values(ReturnValue::AllNew)
                .return_values_on_condition_check_failure(
                    ReturnValuesOnConditionCheckFailure::AllOld,
                )
                .send()
                .await
        });

        match result {
            Ok(output) => {
                let item = output
                    .attributes()
                    .ok_or_else(|| StoreError::CorruptRecord {
                        entry_id: entry_id.to_string(),
                        detail: "update returned no attributes".to_string(),
                    })?;
                Ok(RevealOutcome::Revealed {
                    drawn_name: string_attr(entry_id, item, DRAWN_NAME_ATTR)?,
                })
            }
            Err(error) => match error.as_service_error() {
                Some(UpdateItemError::ConditionalCheckFailedException(failed)) => {
                    Ok(classify_failed_reveal(failed.item()))
                }
                _ => Err(unavailable(
                    "reveal",
                    format!("{}", DisplayErrorContext(&error)),
                )),
            },
        }
    }
}

pub fn entry_to_item(entry: &Entry) -> Item {
    let mut item = HashMap::from([
        (
            ENTRY_ID_ATTR.to_string(),
            AttributeValue::S(entry.entry_id.clone()),
        ),
        (
            DRAW_ID_ATTR.to_string(),
            AttributeValue::S(entry.draw_id.clone()),
        ),
        (
            INTENDED_VIEWER_ATTR.to_string(),
            AttributeValue::S(entry.intended_viewer.clone()),
        ),
        (
            DRAWN_NAME_ATTR.to_string(),
            AttributeValue::S(entry.drawn_name.clone()),
        ),
        (
            CREATED_AT_ATTR.to_string(),
            AttributeValue::S(entry.created_at.clone()),
        ),
    ]);
    if let Some(revealed_at) = &entry.revealed_at {
        item.insert(
            REVEALED_AT_ATTR.to_string(),
            AttributeValue::S(revealed_at.clone()),
        );
    }
    item
}

pub fn view_from_item(entry_id: &str, item: &Item) -> Result<EntryView, StoreError> {
    Ok(EntryView {
        intended_viewer: string_attr(entry_id, item, INTENDED_VIEWER_ATTR)?,
        revealed: item.contains_key(REVEALED_AT_ATTR),
    })
}

/// A failed reveal condition with a prior image means the entry exists and
/// was already revealed; without one, the entry was never created.
pub fn classify_failed_reveal(old_item: Option<&Item>) -> RevealOutcome {
    match old_item {
        Some(item) if !item.is_empty() => RevealOutcome::AlreadyRevealed,
        _ => RevealOutcome::NotFound,
    }
}

fn string_attr(entry_id: &str, item: &Item, name: &str) -> Result<String, StoreError> {
    match item.get(name) {
        Some(AttributeValue::S(value)) => Ok(value.clone()),
        Some(_) => Err(StoreError::CorruptRecord {
            entry_id: entry_id.to_string(),
            detail: format!("{name} is not a string attribute"),
        }),
        None => Err(StoreError::CorruptRecord {
            entry_id: entry_id.to_string(),
            detail: format!("{name} is missing"),
        }),
    }
}

fn unavailable(operation: &'static str, detail: String) -> StoreError {
    tracing::warn!(
        component = "dynamodb_store",
        event = "storage_unavailable",
        operation,
        error = %detail,
    );
    StoreError::Unavailable(detail)
}

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
