use std::convert::Infallible;

use crate::collection::Entity;
use crate::domain::{BloodRequest, RequestStatus};
use crate::error::RepositoryError;
use crate::store::Table;

use super::actions::RequestAction;

impl Entity for BloodRequest {
    type Id = String;
    // Posted requests are immutable apart from lifecycle transitions.
    type Patch = Infallible;
    type Action = RequestAction;
    type ActionResult = RequestStatus;

    const TABLE: Table = Table::Requests;

    fn id(&self) -> &String {
        &self.id
    }

    fn not_found(id: &String) -> RepositoryError {
        RepositoryError::RequestNotFound(id.clone())
    }

    fn on_update(&mut self, patch: Infallible) -> Result<(), RepositoryError> {
        match patch {}
    }

    /// OPEN -> FULFILLED | CANCELLED. Both targets are terminal, so a repeated
    /// action is rejected rather than applied twice.
    fn handle_action(&mut self, action: RequestAction) -> Result<RequestStatus, RepositoryError> {
        if self.status.is_terminal() {
            return Err(RepositoryError::RequestNotOpen {
                id: self.id.clone(),
                status: self.status,
            });
        }
        match action {
            RequestAction::Fulfil { donor_id } => {
                self.status = RequestStatus::Fulfilled;
                self.responder_id = Some(donor_id);
            }
            RequestAction::Cancel => {
                self.status = RequestStatus::Cancelled;
            }
        }
        Ok(self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BloodGroup, Urgency};
    use chrono::Utc;

    fn open_request() -> BloodRequest {
        BloodRequest {
            id: "r1".to_string(),
            requester_id: "u2".to_string(),
            requester_name: "Jane Smith".to_string(),
            blood_group: BloodGroup::APos,
            units: 2,
            hospital_name: "City General Hospital".to_string(),
            location: "Downtown".to_string(),
            urgency: Urgency::Urgent,
            description: String::new(),
            status: RequestStatus::Open,
            created_at: Utc::now(),
            distance: None,
            responder_id: None,
        }
    }

    #[test]
    fn test_fulfil_records_responder() {
        let mut request = open_request();
        let status = request
            .handle_action(RequestAction::Fulfil {
                donor_id: "u1".to_string(),
            })
            .unwrap();

        assert_eq!(status, RequestStatus::Fulfilled);
        assert_eq!(request.responder_id.as_deref(), Some("u1"));
    }

    #[test]
    fn test_terminal_states_reject_further_actions() {
        let mut request = open_request();
        request.handle_action(RequestAction::Cancel).unwrap();

        let err = request
            .handle_action(RequestAction::Fulfil {
                donor_id: "u1".to_string(),
            })
            .unwrap_err();

        assert_eq!(
            err,
            RepositoryError::RequestNotOpen {
                id: "r1".to_string(),
                status: RequestStatus::Cancelled,
            }
        );
        assert_eq!(request.responder_id, None);
    }

    #[test]
    fn test_second_fulfil_is_rejected() {
        let mut request = open_request();
        let accept = RequestAction::Fulfil {
            donor_id: "u1".to_string(),
        };
        request.handle_action(accept.clone()).unwrap();

        assert!(matches!(
            request.handle_action(accept),
            Err(RepositoryError::RequestNotOpen { .. })
        ));
    }
}
