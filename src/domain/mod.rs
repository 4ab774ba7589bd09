//! Business entities. Pure data with no actor or storage concerns, apart from
//! the serde shape they are persisted in.

pub mod eligibility;
pub mod history;
pub mod request;
pub mod user;

pub use eligibility::{Eligibility, EligibilityStatus, COOLDOWN_DAYS};
pub use history::*;
pub use request::*;
pub use user::*;
