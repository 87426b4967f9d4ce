//! Composes validation, generation and persistence into the three operations
//! participants use. Nothing is cached between calls; every read goes back
//! to the store.

use rand::Rng;

use crate::contract::{
    validate_roster, CreateDrawRequest, EntryHandle, ReasonCode, ValidationError,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_PARTICIPANTS,
};
use crate::derangement::{generate, GenerationError};
use crate::entry::{
    entry_path, new_draw_id, new_entry_id, Entry, EntryView, DEFAULT_ENTRY_PATH_PREFIX,
};
use crate::store::{EntryStore, RevealOutcome, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawSettings {
    pub max_participants: usize,
    pub max_attempts: usize,
    pub entry_path_prefix: String,
}

impl Default for DrawSettings {
    fn default() -> Self {
        Self {
            max_participants: DEFAULT_MAX_PARTICIPANTS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            entry_path_prefix: DEFAULT_ENTRY_PATH_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedDraw {
    pub draw_id: String,
    /// Handles in the order the names were submitted.
    pub entries: Vec<EntryHandle>,
    pub attempts: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrawError {
    #[error(transparent)]
    InvalidInput(#[from] ValidationError),
    #[error("no valid assignment found within {attempts} attempts")]
    TooManyAttempts { attempts: usize },
    #[error("draw invariant violated: {0}")]
    InvariantViolation(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl DrawError {
    pub fn reason(&self) -> ReasonCode {
        match self {
            Self::InvalidInput(_) => ReasonCode::InvalidInput,
            Self::TooManyAttempts { .. } => ReasonCode::TooManyAttempts,
            Self::InvariantViolation(_) => ReasonCode::InternalError,
            Self::Storage(error) => store_reason(error),
        }
    }
}

impl From<GenerationError> for DrawError {
    fn from(error: GenerationError) -> Self {
        match error {
            GenerationError::TooManyAttempts { attempts } => Self::TooManyAttempts { attempts },
            GenerationError::InvariantViolation(detail) => Self::InvariantViolation(detail),
        }
    }
}

pub fn store_reason(error: &StoreError) -> ReasonCode {
    match error {
        StoreError::Unavailable(_) => ReasonCode::StorageUnavailable,
        StoreError::CorruptRecord { .. } => ReasonCode::InternalError,
    }
}

pub fn create_draw(
    request: CreateDrawRequest,
    settings: &DrawSettings,
    created_at: &str,
    store: &impl EntryStore,
    rng: &mut impl Rng,
) -> Result<CreatedDraw, DrawError> {
    let roster = validate_roster(request, settings.max_participants)?;
    let generated = generate(&roster, settings.max_attempts, rng)?;

    let draw_id = new_draw_id();
    let entries: Vec<Entry> = roster
        .iter()
        .enumerate()
        .map(|(giver, participant)| {
            let receiver = &roster[generated.permutation.receiver_of(giver)];
            Entry {
                entry_id: new_entry_id(),
                draw_id: draw_id.clone(),
                intended_viewer: participant.name.clone(),
                drawn_name: receiver.name.clone(),
                created_at: created_at.to_string(),
                revealed_at: None,
            }
        })
        .collect();

    store.create_batch(&entries)?;

    let handles = entries
        .iter()
        .map(|entry| EntryHandle {
            name: entry.intended_viewer.clone(),
            path: entry_path(&settings.entry_path_prefix, &entry.entry_id),
        })
        .collect();

    Ok(CreatedDraw {
        draw_id,
        entries: handles,
        attempts: generated.attempts,
    })
}

pub fn view_entry(
    entry_id: &str,
    store: &impl EntryStore,
) -> Result<Option<EntryView>, StoreError> {
    store.get_by_entry_id(entry_id)
}

pub fn reveal_entry(
    entry_id: &str,
    revealed_at: &str,
    store: &impl EntryStore,
) -> Result<RevealOutcome, StoreError> {
    store.reveal(entry_id, revealed_at)
}
