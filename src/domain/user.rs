use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::eligibility::{self, Eligibility};

/// The eight ABO/Rh blood groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APos,
    #[serde(rename = "A-")]
    ANeg,
    #[serde(rename = "B+")]
    BPos,
    #[serde(rename = "B-")]
    BNeg,
    #[serde(rename = "AB+")]
    AbPos,
    #[serde(rename = "AB-")]
    AbNeg,
    #[serde(rename = "O+")]
    OPos,
    #[serde(rename = "O-")]
    ONeg,
}

impl BloodGroup {
    pub const ALL: [BloodGroup; 8] = [
        BloodGroup::APos,
        BloodGroup::ANeg,
        BloodGroup::BPos,
        BloodGroup::BNeg,
        BloodGroup::AbPos,
        BloodGroup::AbNeg,
        BloodGroup::OPos,
        BloodGroup::ONeg,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodGroup::APos => "A+",
            BloodGroup::ANeg => "A-",
            BloodGroup::BPos => "B+",
            BloodGroup::BNeg => "B-",
            BloodGroup::AbPos => "AB+",
            BloodGroup::AbNeg => "AB-",
            BloodGroup::OPos => "O+",
            BloodGroup::ONeg => "O-",
        }
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role discriminant, used where the payload does not matter (patches, filters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Donor,
    Requester,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Donor => f.write_str("DONOR"),
            Role::Requester => f.write_str("REQUESTER"),
            Role::Admin => f.write_str("ADMIN"),
        }
    }
}

/// Donor-only attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorProfile {
    pub blood_group: BloodGroup,
    pub is_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_donation_date: Option<NaiveDate>,
}

impl DonorProfile {
    pub fn new(blood_group: BloodGroup) -> Self {
        Self {
            blood_group,
            is_available: true,
            last_donation_date: None,
        }
    }
}

/// A user's role together with the data that only exists for that role.
///
/// Serialized with an inline `role` tag, so a donor's profile fields sit next
/// to the common user fields in the stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleProfile {
    Donor(DonorProfile),
    Requester,
    Admin,
}

impl RoleProfile {
    pub fn role(&self) -> Role {
        match self {
            RoleProfile::Donor(_) => Role::Donor,
            RoleProfile::Requester => Role::Requester,
            RoleProfile::Admin => Role::Admin,
        }
    }
}

/// Represents a registered user in the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(flatten)]
    pub role: RoleProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub college_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub has_allergies: bool,
}

impl User {
    /// Builds the stored record for a registration under a freshly assigned id.
    pub fn from_registration(id: String, registration: Registration) -> Self {
        Self {
            id,
            name: registration.name,
            email: registration.email.trim().to_string(),
            phone: registration.phone,
            role: registration.role,
            college_id: registration.college_id,
            location: registration.location,
            has_allergies: registration.has_allergies,
        }
    }

    pub fn role(&self) -> Role {
        self.role.role()
    }

    pub fn donor_profile(&self) -> Option<&DonorProfile> {
        match &self.role {
            RoleProfile::Donor(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn blood_group(&self) -> Option<BloodGroup> {
        self.donor_profile().map(|profile| profile.blood_group)
    }

    /// Case-insensitive email comparison.
    pub fn email_matches(&self, email: &str) -> bool {
        self.email.trim().to_lowercase() == email.trim().to_lowercase()
    }

    /// Effective availability: an allergy hold overrides the stored flag.
    pub fn is_available(&self) -> bool {
        !self.has_allergies
            && self
                .donor_profile()
                .map(|profile| profile.is_available)
                .unwrap_or(false)
    }

    /// Donation eligibility on `today`. Users without a donor profile carry no
    /// donation history, so only the allergy hold applies to them.
    pub fn eligibility(&self, today: NaiveDate) -> Eligibility {
        let last_donation = self
            .donor_profile()
            .and_then(|profile| profile.last_donation_date);
        eligibility::calculate(self.has_allergies, last_donation, today)
    }
}

/// Payload for registering a new user.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: RoleProfile,
    pub college_id: Option<String>,
    pub location: Option<String>,
    pub has_allergies: bool,
}

impl Registration {
    /// Registration for an available donor with no recorded donations.
    pub fn donor(name: impl Into<String>, email: impl Into<String>, blood_group: BloodGroup) -> Self {
        Self::with_role(name, email, RoleProfile::Donor(DonorProfile::new(blood_group)))
    }

    pub fn requester(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self::with_role(name, email, RoleProfile::Requester)
    }

    pub fn with_role(name: impl Into<String>, email: impl Into<String>, role: RoleProfile) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: String::new(),
            role,
            college_id: None,
            location: None,
            has_allergies: false,
        }
    }
}

/// Partial profile update. `None` leaves the field untouched.
///
/// `last_donation_date` is tri-state: `Some(None)` clears the date.
/// Donor-only fields are rejected for users without a donor profile, unless
/// the same patch switches the user to [`Role::Donor`].
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub college_id: Option<String>,
    pub location: Option<String>,
    pub has_allergies: Option<bool>,
    pub role: Option<Role>,
    pub blood_group: Option<BloodGroup>,
    pub is_available: Option<bool>,
    pub last_donation_date: Option<Option<NaiveDate>>,
}

impl UserPatch {
    pub fn touches_donor_fields(&self) -> bool {
        self.blood_group.is_some() || self.is_available.is_some() || self.last_donation_date.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn donor() -> User {
        User::from_registration(
            "user_1".to_string(),
            Registration::donor("Alice", "Alice@College.edu", BloodGroup::ONeg),
        )
    }

    #[test]
    fn test_email_match_ignores_case_and_whitespace() {
        let user = donor();
        assert!(user.email_matches("alice@college.edu"));
        assert!(user.email_matches("  ALICE@college.EDU "));
        assert!(!user.email_matches("bob@college.edu"));
    }

    #[test]
    fn test_allergy_hold_overrides_stored_availability() {
        let mut user = donor();
        assert!(user.is_available());

        user.has_allergies = true;
        assert!(!user.is_available());
        assert_eq!(user.donor_profile().map(|p| p.is_available), Some(true));
    }

    #[test]
    fn test_requester_is_never_available() {
        let user = User::from_registration(
            "user_2".to_string(),
            Registration::requester("Bob", "bob@college.edu"),
        );
        assert!(!user.is_available());
        assert_eq!(user.blood_group(), None);
    }

    #[test]
    fn test_donor_serializes_with_inline_role_tag() {
        let mut user = donor();
        if let RoleProfile::Donor(profile) = &mut user.role {
            profile.last_donation_date = NaiveDate::from_ymd_opt(2023, 10, 15);
        }

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["role"], "DONOR");
        assert_eq!(json["bloodGroup"], "O-");
        assert_eq!(json["isAvailable"], true);
        assert_eq!(json["lastDonationDate"], "2023-10-15");
        assert_eq!(json["hasAllergies"], false);

        let back: User = serde_json::from_value(json).unwrap();
        assert_eq!(back, user);
    }

    #[test]
    fn test_requester_record_has_no_donor_fields() {
        let json = serde_json::json!({
            "id": "u2",
            "name": "Jane Smith",
            "email": "jane@college.edu",
            "phone": "555-0102",
            "role": "REQUESTER",
            "collegeId": "STU-2024-002"
        });

        let user: User = serde_json::from_value(json).unwrap();
        assert_eq!(user.role, RoleProfile::Requester);
        assert_eq!(user.college_id.as_deref(), Some("STU-2024-002"));
        assert!(!user.has_allergies);

        let out = serde_json::to_value(&user).unwrap();
        assert!(out.get("bloodGroup").is_none());
    }
}
