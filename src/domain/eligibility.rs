//! Donor eligibility windows.
//!
//! Pure calendar arithmetic: nothing here reads the clock or touches state.
//! Callers pass `today` explicitly.

use std::fmt;

use chrono::{Days, NaiveDate};
use serde::Serialize;

/// Minimum whole-blood donation interval.
pub const COOLDOWN_DAYS: u64 = 56;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EligibilityStatus {
    Eligible,
    Cooldown,
    MedicalHold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Eligibility {
    pub status: EligibilityStatus,
    /// Whole days until the donor may give again; zero unless in cooldown.
    pub days_remaining: u32,
    /// First eligible date after the last donation, when one is recorded.
    pub next_eligible: Option<NaiveDate>,
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        self.status == EligibilityStatus::Eligible
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            EligibilityStatus::Eligible => f.write_str("You can donate today!"),
            EligibilityStatus::Cooldown => write!(f, "Eligible in {} days", self.days_remaining),
            EligibilityStatus::MedicalHold => f.write_str("Medical Hold"),
        }
    }
}

/// Computes eligibility from the donor's allergy flag and last donation.
///
/// An allergy hold wins over any donation history. Without a recorded
/// donation the donor is eligible immediately. Otherwise the donor becomes
/// eligible on `last_donation + COOLDOWN_DAYS`, and that boundary day counts
/// as eligible.
pub fn calculate(has_allergies: bool, last_donation: Option<NaiveDate>, today: NaiveDate) -> Eligibility {
    let next_eligible = last_donation.and_then(|date| date.checked_add_days(Days::new(COOLDOWN_DAYS)));

    if has_allergies {
        return Eligibility {
            status: EligibilityStatus::MedicalHold,
            days_remaining: 0,
            next_eligible,
        };
    }

    let days_remaining = match next_eligible {
        Some(next) => (next - today).num_days().max(0),
        None => 0,
    };

    if days_remaining == 0 {
        Eligibility {
            status: EligibilityStatus::Eligible,
            days_remaining: 0,
            next_eligible,
        }
    } else {
        Eligibility {
            status: EligibilityStatus::Cooldown,
            days_remaining: u32::try_from(days_remaining).unwrap_or(u32::MAX),
            next_eligible,
        }
    }
}
