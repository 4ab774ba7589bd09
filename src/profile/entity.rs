use std::convert::Infallible;

use crate::collection::Entity;
use crate::domain::{BloodGroup, DonorProfile, Role, RoleProfile, User, UserPatch};
use crate::error::RepositoryError;
use crate::store::Table;

impl Entity for User {
    type Id = String;
    type Patch = UserPatch;
    type Action = Infallible;
    type ActionResult = Infallible;

    const TABLE: Table = Table::Users;

    fn id(&self) -> &String {
        &self.id
    }

    fn not_found(id: &String) -> RepositoryError {
        RepositoryError::UserNotFound(id.clone())
    }

    /// Merges the patch into the profile.
    ///
    /// # Fields Updated
    /// - common fields: `name`, `phone`, `college_id`, `location`, `has_allergies`
    /// - `role`: switching to donor needs `blood_group` in the same patch;
    ///   switching away drops the donor profile
    /// - donor fields: `blood_group`, `is_available`, `last_donation_date`
    ///
    /// # Errors
    /// `ValidationError` when donor fields target a user without a donor profile.
    fn on_update(&mut self, patch: UserPatch) -> Result<(), RepositoryError> {
        let touches_donor_fields = patch.touches_donor_fields();
        let UserPatch {
            name,
            phone,
            college_id,
            location,
            has_allergies,
            role,
            blood_group,
            is_available,
            last_donation_date,
        } = patch;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(phone) = phone {
            self.phone = phone;
        }
        if let Some(college_id) = college_id {
            self.college_id = Some(college_id);
        }
        if let Some(location) = location {
            self.location = Some(location);
        }
        if let Some(has_allergies) = has_allergies {
            self.has_allergies = has_allergies;
        }
        if let Some(role) = role {
            self.switch_role(role, blood_group)?;
        }

        match &mut self.role {
            RoleProfile::Donor(profile) => {
                if let Some(blood_group) = blood_group {
                    profile.blood_group = blood_group;
                }
                if let Some(is_available) = is_available {
                    profile.is_available = is_available;
                }
                if let Some(last_donation_date) = last_donation_date {
                    profile.last_donation_date = last_donation_date;
                }
                Ok(())
            }
            other if touches_donor_fields => Err(RepositoryError::ValidationError(format!(
                "{} users have no blood group, availability or donation date",
                other.role()
            ))),
            _ => Ok(()),
        }
    }

    fn handle_action(&mut self, action: Infallible) -> Result<Infallible, RepositoryError> {
        match action {}
    }
}

impl User {
    fn switch_role(&mut self, role: Role, blood_group: Option<BloodGroup>) -> Result<(), RepositoryError> {
        if self.role() == role {
            return Ok(());
        }
        self.role = match role {
            Role::Donor => {
                let blood_group = blood_group.ok_or_else(|| {
                    RepositoryError::ValidationError("Switching to DONOR requires a blood group".to_string())
                })?;
                RoleProfile::Donor(DonorProfile::new(blood_group))
            }
            Role::Requester => RoleProfile::Requester,
            Role::Admin => RoleProfile::Admin,
        };
        Ok(())
    }
}
