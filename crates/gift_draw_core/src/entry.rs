use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_ENTRY_PATH_PREFIX: &str = "e?id=";

/// One participant's persisted draw record.
///
/// `drawn_name` is fixed at creation; `revealed_at` is the only field that
/// ever changes, and only once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub entry_id: String,
    pub draw_id: String,
    pub intended_viewer: String,
    pub drawn_name: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revealed_at: Option<String>,
}

impl Entry {
    pub fn is_revealed(&self) -> bool {
        self.revealed_at.is_some()
    }

    pub fn view(&self) -> EntryView {
        EntryView {
            intended_viewer: self.intended_viewer.clone(),
            revealed: self.is_revealed(),
        }
    }
}

/// Read-side projection of an entry. Deliberately has no access to the
/// drawn name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryView {
    pub intended_viewer: String,
    pub revealed: bool,
}

pub fn new_draw_id() -> String {
    Uuid::new_v4().to_string()
}

/// Entry ids come from the OS generator, never from the draw's RNG, so an id
/// carries no information about the assignment.
pub fn new_entry_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn is_well_formed_entry_id(candidate: &str) -> bool {
    Uuid::parse_str(candidate).is_ok()
}

pub fn entry_path(prefix: &str, entry_id: &str) -> String {
    format!("{prefix}{entry_id}")
}
