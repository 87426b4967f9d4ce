use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_MAX_PARTICIPANTS: usize = 100;
pub const DEFAULT_MAX_ATTEMPTS: usize = 100;
pub const MAX_NAME_CHARS: usize = 200;

/// Caller-visible failure reasons. Every error response carries exactly one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    InvalidInput,
    TooManyAttempts,
    AlreadyDrawn,
    NotFound,
    RouteNotFound,
    MethodNotAllowed,
    StorageUnavailable,
    InternalError,
    Misconfiguration,
}

impl ReasonCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::TooManyAttempts => "TOO_MANY_ATTEMPTS",
            Self::AlreadyDrawn => "ALREADY_DRAWN",
            Self::NotFound => "NOT_FOUND",
            Self::RouteNotFound => "ROUTE_NOT_FOUND",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::StorageUnavailable => "STORAGE_UNAVAILABLE",
            Self::InternalError => "INTERNAL_ERROR",
            Self::Misconfiguration => "MISCONFIGURATION",
        }
    }

    pub fn status_code(self) -> u16 {
        match self {
            Self::InvalidInput | Self::AlreadyDrawn => 400,
            Self::NotFound | Self::RouteNotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::TooManyAttempts => 422,
            Self::StorageUnavailable => 503,
            Self::InternalError | Self::Misconfiguration => 500,
        }
    }

    /// Whether the caller may usefully see the accompanying message.
    pub fn exposes_message(self) -> bool {
        matches!(self, Self::InvalidInput | Self::TooManyAttempts)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateDrawRequest {
    #[serde(default)]
    pub names: Option<Vec<String>>,
    /// Any JSON value is a label; labels are compared exactly as submitted.
    #[serde(default)]
    pub groups: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntryHandle {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateDrawResponse {
    pub entries: Vec<EntryHandle>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewEntryResponse {
    pub viewer: String,
    pub seen: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RevealEntryResponse {
    #[serde(rename = "drawnName")]
    pub drawn_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub reason: ReasonCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Group a participant belongs to for the exclusion rule.
///
/// Participants without a declared group get `Solo(index)`, which never
/// compares equal to any other participant's label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupLabel {
    /// Canonical JSON text of the submitted label, so `1` and `"1"` differ.
    Named(String),
    Solo(usize),
}

impl GroupLabel {
    /// `null` is an absent label; every other value is kept verbatim.
    pub fn from_raw(raw: Value, index: usize) -> Self {
        match raw {
            Value::Null => Self::Solo(index),
            label => Self::Named(label.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub name: String,
    pub group: GroupLabel,
}

impl Participant {
    pub fn new(name: impl Into<String>, group: GroupLabel) -> Self {
        Self {
            name: name.into(),
            group,
        }
    }
}

/// Participants index-aligned with the submitted names.
pub type Roster = Vec<Participant>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub fn validate_roster(
    request: CreateDrawRequest,
    max_participants: usize,
) -> Result<Roster, ValidationError> {
    let Some(raw_names) = request.names else {
        return Err(ValidationError::new("names is required"));
    };

    if raw_names.is_empty() {
        return Err(ValidationError::new("names cannot be empty"));
    }

    if raw_names.len() > max_participants {
        return Err(ValidationError::new(format!(
            "names exceeds the maximum of {max_participants} participants"
        )));
    }

    if let Some(groups) = &request.groups {
        if groups.len() != raw_names.len() {
            return Err(ValidationError::new(format!(
                "groups has {} labels but names has {} entries",
                groups.len(),
                raw_names.len()
            )));
        }
    }

    let mut seen = HashSet::with_capacity(raw_names.len());
    let mut names = Vec::with_capacity(raw_names.len());
    for (index, raw) in raw_names.into_iter().enumerate() {
        let name = raw.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::new(format!(
                "name at position {index} cannot be blank"
            )));
        }
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(ValidationError::new(format!(
                "name at position {index} exceeds {MAX_NAME_CHARS} characters"
            )));
        }
        if !seen.insert(name.clone()) {
            return Err(ValidationError::new(format!("duplicate name '{name}'")));
        }
        names.push(name);
    }

    let mut groups = request.groups.unwrap_or_default().into_iter();
    let roster = names
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let group = GroupLabel::from_raw(groups.next().unwrap_or(Value::Null), index);
            Participant::new(name, group)
        })
        .collect();

    Ok(roster)
}
