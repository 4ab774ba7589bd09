use tokio::sync::oneshot;

use crate::domain::{
    BloodGroup, BloodRequest, Eligibility, HistoryDraft, HistoryItem, Registration, RequestDraft, User,
    UserPatch,
};
use crate::error::{RepositoryError, Written};

/// Generic type aliases for service communication
pub type ServiceResult<T, E> = std::result::Result<T, E>;
pub type ServiceResponse<T, E> = oneshot::Sender<ServiceResult<T, E>>;
pub type RepositoryResponse<T> = ServiceResponse<T, RepositoryError>;

/// Outcome of a donor accepting a request.
#[derive(Debug, Clone, PartialEq)]
pub struct Acceptance {
    pub request: BloodRequest,
    pub history_item: HistoryItem,
}

/// Typed messages for the repository service. Each variant carries its
/// parameters and a oneshot channel for the response.
#[derive(Debug)]
pub enum RepositoryRequest {
    Login {
        email: String,
        respond_to: RepositoryResponse<Written<User>>,
    },
    Register {
        registration: Registration,
        respond_to: RepositoryResponse<Written<User>>,
    },
    Logout {
        respond_to: RepositoryResponse<Written<()>>,
    },
    CurrentUser {
        respond_to: RepositoryResponse<Option<User>>,
    },
    GetUser {
        id: String,
        respond_to: RepositoryResponse<Option<User>>,
    },
    UpdateUserProfile {
        id: String,
        patch: UserPatch,
        respond_to: RepositoryResponse<Written<User>>,
    },
    ListAvailableDonors {
        blood_group: Option<BloodGroup>,
        respond_to: RepositoryResponse<Vec<User>>,
    },
    Eligibility {
        user_id: String,
        respond_to: RepositoryResponse<Eligibility>,
    },
    ListRequests {
        respond_to: RepositoryResponse<Vec<BloodRequest>>,
    },
    ListRequestsFor {
        donor_id: String,
        respond_to: RepositoryResponse<Vec<BloodRequest>>,
    },
    CreateRequest {
        draft: RequestDraft,
        respond_to: RepositoryResponse<Written<BloodRequest>>,
    },
    AcceptRequest {
        request_id: String,
        donor_id: String,
        respond_to: RepositoryResponse<Written<Acceptance>>,
    },
    IgnoreRequest {
        request_id: String,
        donor_id: String,
        respond_to: RepositoryResponse<Written<()>>,
    },
    CancelRequest {
        request_id: String,
        requester_id: String,
        respond_to: RepositoryResponse<Written<BloodRequest>>,
    },
    ListHistory {
        user_id: String,
        respond_to: RepositoryResponse<Vec<HistoryItem>>,
    },
    AddHistoryItem {
        draft: HistoryDraft,
        respond_to: RepositoryResponse<Written<HistoryItem>>,
    },
    Shutdown,
}
