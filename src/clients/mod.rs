//! Client handle for the repository service.

mod macros;

use tokio::sync::mpsc;
use tracing::{debug, instrument};

use crate::domain::{
    BloodGroup, BloodRequest, Eligibility, HistoryDraft, HistoryItem, Registration, RequestDraft, User,
    UserPatch,
};
use crate::error::{RepositoryError, Written};
use crate::messages::{Acceptance, RepositoryRequest};

use macros::client_method;

/// Cloneable handle to the repository service. Every call is one message, so
/// the service applies each operation whole before starting the next.
#[derive(Clone)]
pub struct RepositoryClient {
    sender: mpsc::Sender<RepositoryRequest>,
}

impl RepositoryClient {
    pub fn new(sender: mpsc::Sender<RepositoryRequest>) -> Self {
        Self { sender }
    }

    /// Asks the service to stop after the messages already queued.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), RepositoryError> {
        debug!("Sending shutdown request");
        self.sender
            .send(RepositoryRequest::Shutdown)
            .await
            .map_err(|_| RepositoryError::ActorCommunicationError("Service closed".to_string()))
    }
}

// Auth and session. `login` checks only that the email is registered.
client_method!(RepositoryClient => fn login(email: String) -> Written<User> as RepositoryRequest::Login);
client_method!(RepositoryClient => fn register(registration: Registration) -> Written<User> as RepositoryRequest::Register);
client_method!(RepositoryClient => fn logout() -> Written<()> as RepositoryRequest::Logout);
client_method!(RepositoryClient => fn current_user() -> Option<User> as RepositoryRequest::CurrentUser);

// Profiles
client_method!(RepositoryClient => fn get_user(id: String) -> Option<User> as RepositoryRequest::GetUser);
client_method!(RepositoryClient => fn update_user_profile(id: String, patch: UserPatch) -> Written<User> as RepositoryRequest::UpdateUserProfile);
client_method!(RepositoryClient => fn list_available_donors(blood_group: Option<BloodGroup>) -> Vec<User> as RepositoryRequest::ListAvailableDonors);
client_method!(RepositoryClient => fn eligibility(user_id: String) -> Eligibility as RepositoryRequest::Eligibility);

// Requests
client_method!(RepositoryClient => fn list_requests() -> Vec<BloodRequest> as RepositoryRequest::ListRequests);
client_method!(RepositoryClient => fn list_requests_for(donor_id: String) -> Vec<BloodRequest> as RepositoryRequest::ListRequestsFor);
client_method!(RepositoryClient => fn create_request(draft: RequestDraft) -> Written<BloodRequest> as RepositoryRequest::CreateRequest);
client_method!(RepositoryClient => fn accept_request(request_id: String, donor_id: String) -> Written<Acceptance> as RepositoryRequest::AcceptRequest);
client_method!(RepositoryClient => fn ignore_request(request_id: String, donor_id: String) -> Written<()> as RepositoryRequest::IgnoreRequest);
client_method!(RepositoryClient => fn cancel_request(request_id: String, requester_id: String) -> Written<BloodRequest> as RepositoryRequest::CancelRequest);

// History
client_method!(RepositoryClient => fn list_history(user_id: String) -> Vec<HistoryItem> as RepositoryRequest::ListHistory);
client_method!(RepositoryClient => fn add_history_item(draft: HistoryDraft) -> Written<HistoryItem> as RepositoryRequest::AddHistoryItem);

#[cfg(test)]
mod tests {
    use crate::error::RepositoryError;
    use crate::mock_framework::{create_mock_client, expect_login};

    #[tokio::test]
    async fn test_client_sends_login_and_returns_reply() {
        let (client, mut receiver) = create_mock_client(4);

        let login = tokio::spawn(async move { client.login("john@college.edu".to_string()).await });

        let (email, responder) = expect_login(&mut receiver).await.expect("Expected Login request");
        assert_eq!(email, "john@college.edu");
        responder
            .send(Err(RepositoryError::UserNotFound(email)))
            .unwrap();

        let result = login.await.unwrap();
        assert_eq!(
            result,
            Err(RepositoryError::UserNotFound("john@college.edu".to_string()))
        );
    }

    #[tokio::test]
    async fn test_dropped_reply_is_communication_error() {
        let (client, mut receiver) = create_mock_client(4);

        let pending = tokio::spawn(async move { client.list_requests().await });
        drop(receiver.recv().await);

        assert!(matches!(
            pending.await.unwrap(),
            Err(RepositoryError::ActorCommunicationError(_))
        ));
    }

    #[tokio::test]
    async fn test_closed_service_is_communication_error() {
        let (client, receiver) = create_mock_client(4);
        drop(receiver);

        assert!(matches!(
            client.current_user().await,
            Err(RepositoryError::ActorCommunicationError(_))
        ));
    }
}
