use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::BloodGroup;

/// Priority tier of a request. Orders `Normal < Urgent < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Urgency {
    Normal,
    Urgent,
    Critical,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Urgency::Normal => f.write_str("Normal"),
            Urgency::Urgent => f.write_str("Urgent"),
            Urgency::Critical => f.write_str("Critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Open,
    Fulfilled,
    Cancelled,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Open)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestStatus::Open => f.write_str("OPEN"),
            RequestStatus::Fulfilled => f.write_str("FULFILLED"),
            RequestStatus::Cancelled => f.write_str("CANCELLED"),
        }
    }
}

/// An open need for blood posted by a requester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodRequest {
    pub id: String,
    pub requester_id: String,
    /// Snapshot taken when the request was posted; not re-synced on rename.
    pub requester_name: String,
    pub blood_group: BloodGroup,
    pub units: u32,
    pub hospital_name: String,
    pub location: String,
    pub urgency: Urgency,
    pub description: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
    /// Donor whose acceptance fulfilled the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responder_id: Option<String>,
}

/// Payload for posting a new request.
#[derive(Debug, Clone)]
pub struct RequestDraft {
    pub requester_id: String,
    pub blood_group: BloodGroup,
    pub units: u32,
    pub hospital_name: String,
    pub location: String,
    pub urgency: Urgency,
    pub description: String,
}

impl RequestDraft {
    pub fn new(
        requester_id: impl Into<String>,
        blood_group: BloodGroup,
        units: u32,
        hospital_name: impl Into<String>,
    ) -> Self {
        Self {
            requester_id: requester_id.into(),
            blood_group,
            units,
            hospital_name: hospital_name.into(),
            location: "Current Location".to_string(),
            urgency: Urgency::Normal,
            description: String::new(),
        }
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
