//! Demo collections used when a table is absent or unreadable.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::domain::{
    BloodGroup, BloodRequest, DonorProfile, HistoryItem, HistoryKind, RequestStatus, RoleProfile, Urgency, User,
};

pub fn users() -> Vec<User> {
    vec![
        User {
            id: "u1".to_string(),
            name: "John Doe".to_string(),
            email: "john@college.edu".to_string(),
            phone: "555-0101".to_string(),
            role: RoleProfile::Donor(DonorProfile {
                blood_group: BloodGroup::OPos,
                is_available: true,
                last_donation_date: NaiveDate::from_ymd_opt(2023, 10, 15),
            }),
            college_id: Some("STU-2024-001".to_string()),
            location: Some("North Campus".to_string()),
            has_allergies: false,
        },
        User {
            id: "u2".to_string(),
            name: "Jane Smith".to_string(),
            email: "jane@college.edu".to_string(),
            phone: "555-0102".to_string(),
            role: RoleProfile::Requester,
            college_id: Some("STU-2024-002".to_string()),
            location: None,
            has_allergies: false,
        },
    ]
}

/// Newest first, timestamps relative to `now`.
pub fn requests(now: DateTime<Utc>) -> Vec<BloodRequest> {
    vec![
        BloodRequest {
            id: "r2".to_string(),
            requester_id: "u3".to_string(),
            requester_name: "Admin Coord".to_string(),
            blood_group: BloodGroup::ONeg,
            units: 1,
            hospital_name: "University Medical Center".to_string(),
            location: "On Campus".to_string(),
            urgency: Urgency::Critical,
            description: "Critical emergency. O- donor needed immediately.".to_string(),
            status: RequestStatus::Open,
            created_at: now,
            distance: Some("0.5 km".to_string()),
            responder_id: None,
        },
        BloodRequest {
            id: "r1".to_string(),
            requester_id: "u2".to_string(),
            requester_name: "Jane Smith".to_string(),
            blood_group: BloodGroup::APos,
            units: 2,
            hospital_name: "City General Hospital".to_string(),
            location: "Downtown".to_string(),
            urgency: Urgency::Urgent,
            description: "Urgent need for A+ blood for surgery.".to_string(),
            status: RequestStatus::Open,
            created_at: now - Duration::days(1),
            distance: Some("2.5 km".to_string()),
            responder_id: None,
        },
    ]
}

pub fn history() -> Vec<HistoryItem> {
    [
        (1, "u1", HistoryKind::Donation, (2023, 10, 15), "City General Hospital", 1, "Completed"),
        (2, "u1", HistoryKind::Donation, (2023, 6, 20), "Campus Blood Drive", 1, "Completed"),
        (3, "u2", HistoryKind::Request, (2023, 1, 10), "University Medical Center", 2, "Fulfilled"),
    ]
    .into_iter()
    .filter_map(|(id, user_id, kind, (y, m, d), location, units, status)| {
        Some(HistoryItem {
            id,
            user_id: user_id.to_string(),
            kind,
            date: NaiveDate::from_ymd_opt(y, m, d)?,
            location: location.to_string(),
            units,
            status: status.to_string(),
        })
    })
    .collect()
}
