use std::convert::Infallible;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::collection::Entity;
use crate::error::RepositoryError;
use crate::store::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryKind {
    Donation,
    Request,
}

impl fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryKind::Donation => f.write_str("Donation"),
            HistoryKind::Request => f.write_str("Request"),
        }
    }
}

/// Log entry of a donation or request event, owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: u64,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: HistoryKind,
    pub date: NaiveDate,
    pub location: String,
    pub units: u32,
    /// Free-form outcome, e.g. `Completed`, `Accepted`, `Open`.
    pub status: String,
}

impl HistoryItem {
    pub fn from_draft(id: u64, draft: HistoryDraft) -> Self {
        Self {
            id,
            user_id: draft.user_id,
            kind: draft.kind,
            date: draft.date,
            location: draft.location,
            units: draft.units,
            status: draft.status,
        }
    }
}

/// Payload for appending a history entry.
#[derive(Debug, Clone)]
pub struct HistoryDraft {
    pub user_id: String,
    pub kind: HistoryKind,
    pub date: NaiveDate,
    pub location: String,
    pub units: u32,
    pub status: String,
}

// History is append-only: neither patches nor actions can be constructed.
impl Entity for HistoryItem {
    type Id = u64;
    type Patch = Infallible;
    type Action = Infallible;
    type ActionResult = Infallible;

    const TABLE: Table = Table::History;

    fn id(&self) -> &u64 {
        &self.id
    }

    fn not_found(id: &u64) -> RepositoryError {
        RepositoryError::ValidationError(format!("History item not found: {}", id))
    }

    fn on_update(&mut self, patch: Infallible) -> Result<(), RepositoryError> {
        match patch {}
    }

    fn handle_action(&mut self, action: Infallible) -> Result<Infallible, RepositoryError> {
        match action {}
    }
}
