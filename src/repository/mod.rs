//! The repository service: sole owner of users, requests, history,
//! dismissals and the session.
//!
//! Runs as one actor task. Each message is handled to completion
//! (validate, mutate, persist) before the next is received, so no caller can
//! observe or persist a half-applied change.

pub mod seed;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use mockable::Clock;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::app_system::SystemConfig;
use crate::clients::RepositoryClient;
use crate::collection::Collection;
use crate::domain::{
    BloodGroup, BloodRequest, Eligibility, HistoryDraft, HistoryItem, HistoryKind, Registration, RequestDraft,
    RequestStatus, Role, User, UserPatch,
};
use crate::error::{RepositoryError, Written};
use crate::lifecycle::{Dismissals, RequestAction};
use crate::messages::{Acceptance, RepositoryRequest};
use crate::session::SessionManager;
use crate::store::Store;

/// Clock shared between the service and its id generators.
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// Placeholder distance shown for newly posted requests.
pub const NEW_REQUEST_DISTANCE: &str = "0.8 km";

pub struct RepositoryService {
    receiver: mpsc::Receiver<RepositoryRequest>,
    store: Arc<dyn Store>,
    clock: SharedClock,
    write_attempts: u32,
    users: Collection<User>,
    requests: Collection<BloodRequest>,
    history: Collection<HistoryItem>,
    dismissals: Dismissals,
    session: SessionManager,
}

impl RepositoryService {
    /// Loads every table (falling back to defaults on absent or corrupt
    /// data), restores the session and returns the service with its client.
    #[instrument(name = "repository_open", skip_all)]
    pub async fn open(config: &SystemConfig, store: Arc<dyn Store>, clock: SharedClock) -> (Self, RepositoryClient) {
        let (sender, receiver) = mpsc::channel(config.buffer_size.max(1));
        let seeded = config.seed_demo_data;

        let users = Collection::load(store.as_ref(), if seeded { seed::users() } else { Vec::new() }).await;
        let requests = Collection::load(
            store.as_ref(),
            if seeded { seed::requests(clock.utc()) } else { Vec::new() },
        )
        .await;
        let history = Collection::load(store.as_ref(), if seeded { seed::history() } else { Vec::new() }).await;

        let users = Collection::new(users, || format!("user_{}", Uuid::new_v4().simple()));
        let requests = Collection::new(requests, || format!("req_{}", Uuid::new_v4().simple()));

        let last_history_id = Arc::new(AtomicU64::new(history.iter().map(|item| item.id).max().unwrap_or(0)));
        let history_clock = Arc::clone(&clock);
        let history = Collection::new(history, move || {
            next_history_id(&last_history_id, history_clock.utc().timestamp_millis())
        });

        let dismissals = Dismissals::load(store.as_ref()).await;
        let session = SessionManager::restore(store.as_ref(), &users).await;

        info!(
            users = users.len(),
            requests = requests.len(),
            history = history.len(),
            "Repository loaded"
        );

        let service = Self {
            receiver,
            store,
            clock,
            write_attempts: config.write_attempts,
            users,
            requests,
            history,
            dismissals,
            session,
        };
        (service, RepositoryClient::new(sender))
    }

    /// Main actor loop. Delegates each message to its handler and replies.
    #[instrument(name = "repository_service", skip(self))]
    pub async fn run(mut self) {
        info!("RepositoryService starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                RepositoryRequest::Login { email, respond_to } => {
                    let _ = respond_to.send(self.handle_login(email).await);
                }
                RepositoryRequest::Register {
                    registration,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.handle_register(registration).await);
                }
                RepositoryRequest::Logout { respond_to } => {
                    let _ = respond_to.send(self.handle_logout().await);
                }
                RepositoryRequest::CurrentUser { respond_to } => {
                    let _ = respond_to.send(Ok(self.session.current(&self.users).cloned()));
                }
                RepositoryRequest::GetUser { id, respond_to } => {
                    let _ = respond_to.send(Ok(self.users.get(&id).cloned()));
                }
                RepositoryRequest::UpdateUserProfile { id, patch, respond_to } => {
                    let _ = respond_to.send(self.handle_update_user_profile(id, patch).await);
                }
                RepositoryRequest::ListAvailableDonors {
                    blood_group,
                    respond_to,
                } => {
                    let _ = respond_to.send(Ok(self.handle_list_available_donors(blood_group)));
                }
                RepositoryRequest::Eligibility { user_id, respond_to } => {
                    let _ = respond_to.send(self.handle_eligibility(user_id));
                }
                RepositoryRequest::ListRequests { respond_to } => {
                    debug!("Processing list_requests request");
                    let _ = respond_to.send(Ok(self.requests.snapshot()));
                }
                RepositoryRequest::ListRequestsFor { donor_id, respond_to } => {
                    let _ = respond_to.send(self.handle_list_requests_for(donor_id));
                }
                RepositoryRequest::CreateRequest { draft, respond_to } => {
                    let _ = respond_to.send(self.handle_create_request(draft).await);
                }
                RepositoryRequest::AcceptRequest {
                    request_id,
                    donor_id,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.handle_accept_request(request_id, donor_id).await);
                }
                RepositoryRequest::IgnoreRequest {
                    request_id,
                    donor_id,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.handle_ignore_request(request_id, donor_id).await);
                }
                RepositoryRequest::CancelRequest {
                    request_id,
                    requester_id,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.handle_cancel_request(request_id, requester_id).await);
                }
                RepositoryRequest::ListHistory { user_id, respond_to } => {
                    let _ = respond_to.send(Ok(self.handle_list_history(user_id)));
                }
                RepositoryRequest::AddHistoryItem { draft, respond_to } => {
                    let _ = respond_to.send(self.handle_add_history_item(draft).await);
                }
                RepositoryRequest::Shutdown => {
                    info!("RepositoryService shutting down");
                    break;
                }
            }
        }

        info!("RepositoryService stopped");
    }

    fn today(&self) -> NaiveDate {
        self.clock.utc().date_naive()
    }

    // =========================================================================
    // Auth and session
    // =========================================================================

    /// Case-insensitive lookup by email. No credential beyond the email is
    /// checked.
    #[instrument(fields(email = %email), skip(self, email))]
    async fn handle_login(&mut self, email: String) -> Result<Written<User>, RepositoryError> {
        debug!("Processing login request");

        let user = match self.users.find(|user| user.email_matches(&email)) {
            Some(user) => user.clone(),
            None => {
                warn!("No user registered with this email");
                return Err(RepositoryError::UserNotFound(email));
            }
        };

        let session_write = self.session.set(self.store.as_ref(), &user.id, self.write_attempts).await;
        info!(user_id = %user.id, "User logged in");
        Ok(Written::from_writes(user, [session_write]))
    }

    /// Registers and logs in. Rejects an email already held by any user,
    /// compared case-insensitively.
    #[instrument(fields(user_name = %registration.name, user_email = %registration.email), skip(self, registration))]
    async fn handle_register(&mut self, registration: Registration) -> Result<Written<User>, RepositoryError> {
        debug!("Processing register request");

        let email = registration.email.trim().to_string();
        if email.is_empty() {
            error!("Validation failed: empty email");
            return Err(RepositoryError::ValidationError("Email required".to_string()));
        }
        if registration.name.trim().is_empty() {
            error!("Validation failed: empty name");
            return Err(RepositoryError::ValidationError("Name required".to_string()));
        }
        if self.users.find(|user| user.email_matches(&email)).is_some() {
            warn!("Email already registered");
            return Err(RepositoryError::DuplicateEmail(email));
        }

        let user = User::from_registration(self.users.next_id(), registration);
        self.users.push_back(user.clone());

        let users_write = self.users.persist(self.store.as_ref(), self.write_attempts).await;
        let session_write = self.session.set(self.store.as_ref(), &user.id, self.write_attempts).await;

        info!(user_id = %user.id, role = %user.role(), "User registered");
        Ok(Written::from_writes(user, [users_write, session_write]))
    }

    #[instrument(skip(self))]
    async fn handle_logout(&mut self) -> Result<Written<()>, RepositoryError> {
        debug!("Processing logout request");
        let previous = self.session.current_id().map(str::to_string);
        let session_write = self.session.clear(self.store.as_ref(), self.write_attempts).await;
        info!(user_id = ?previous, "User logged out");
        Ok(Written::from_writes((), [session_write]))
    }

    // =========================================================================
    // Profiles
    // =========================================================================

    /// Merges `patch` into the stored user. The session resolves users by id,
    /// so the current user sees the change immediately.
    #[instrument(fields(user_id = %id), skip(self, patch))]
    async fn handle_update_user_profile(
        &mut self,
        id: String,
        patch: UserPatch,
    ) -> Result<Written<User>, RepositoryError> {
        debug!(?patch, "Processing update_user_profile request");

        let user = self
            .users
            .update(&id, patch)
            .inspect_err(|e| error!(error = %e, "Profile update rejected"))?;
        let users_write = self.users.persist(self.store.as_ref(), self.write_attempts).await;

        if self.session.is_current(&id) {
            debug!("Updated user is the session user");
        }
        info!(available = user.is_available(), "Profile updated");
        Ok(Written::from_writes(user, [users_write]))
    }

    /// Donors visible as active: available and not on medical hold.
    #[instrument(skip(self))]
    fn handle_list_available_donors(&self, blood_group: Option<BloodGroup>) -> Vec<User> {
        let donors: Vec<User> = self
            .users
            .iter()
            .filter(|user| user.is_available())
            .filter(|user| blood_group.is_none() || user.blood_group() == blood_group)
            .cloned()
            .collect();
        info!(donor_count = donors.len(), "Listed available donors");
        donors
    }

    #[instrument(fields(user_id = %user_id), skip(self, user_id))]
    fn handle_eligibility(&self, user_id: String) -> Result<Eligibility, RepositoryError> {
        let user = self
            .users
            .get(&user_id)
            .ok_or_else(|| RepositoryError::UserNotFound(user_id.clone()))?;
        let eligibility = user.eligibility(self.today());
        debug!(status = ?eligibility.status, days_remaining = eligibility.days_remaining, "Eligibility computed");
        Ok(eligibility)
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Open requests the donor has not dismissed, newest first. Paused
    /// entirely while the donor is on medical hold.
    #[instrument(fields(donor_id = %donor_id), skip(self, donor_id))]
    fn handle_list_requests_for(&self, donor_id: String) -> Result<Vec<BloodRequest>, RepositoryError> {
        let donor = self
            .users
            .get(&donor_id)
            .ok_or_else(|| RepositoryError::UserNotFound(donor_id.clone()))?;

        if donor.has_allergies {
            info!("Requests paused for medical hold");
            return Ok(Vec::new());
        }

        let visible: Vec<BloodRequest> = self
            .requests
            .iter()
            .filter(|request| request.status == RequestStatus::Open)
            .filter(|request| !self.dismissals.contains(&donor_id, &request.id))
            .cloned()
            .collect();
        debug!(request_count = visible.len(), "Listed requests for donor");
        Ok(visible)
    }

    /// Posts a request at the front of the list and logs an `Open` request
    /// entry in the requester's history, as one step.
    #[instrument(
        fields(
            requester_id = %draft.requester_id,
            blood_group = %draft.blood_group,
            units = draft.units,
            urgency = %draft.urgency
        ),
        skip(self, draft)
    )]
    async fn handle_create_request(&mut self, draft: RequestDraft) -> Result<Written<BloodRequest>, RepositoryError> {
        debug!("Processing create_request request");

        if draft.units < 1 {
            error!("Validation failed: zero units");
            return Err(RepositoryError::ValidationError("At least one unit required".to_string()));
        }
        if draft.hospital_name.trim().is_empty() {
            error!("Validation failed: empty hospital name");
            return Err(RepositoryError::ValidationError("Hospital name required".to_string()));
        }
        let requester_name = match self.users.get(&draft.requester_id) {
            Some(requester) => requester.name.clone(),
            None => {
                error!("Requester not found");
                return Err(RepositoryError::UserNotFound(draft.requester_id));
            }
        };

        let now = self.clock.utc();
        let request = BloodRequest {
            id: self.requests.next_id(),
            requester_id: draft.requester_id,
            requester_name,
            blood_group: draft.blood_group,
            units: draft.units,
            hospital_name: draft.hospital_name,
            location: draft.location,
            urgency: draft.urgency,
            description: draft.description,
            status: RequestStatus::Open,
            created_at: now,
            distance: Some(NEW_REQUEST_DISTANCE.to_string()),
            responder_id: None,
        };
        let entry = HistoryItem::from_draft(
            self.history.next_id(),
            HistoryDraft {
                user_id: request.requester_id.clone(),
                kind: HistoryKind::Request,
                date: now.date_naive(),
                location: request.hospital_name.clone(),
                units: request.units,
                status: "Open".to_string(),
            },
        );

        self.requests.push_front(request.clone());
        self.history.push_front(entry);

        let writes = [
            self.requests.persist(self.store.as_ref(), self.write_attempts).await,
            self.history.persist(self.store.as_ref(), self.write_attempts).await,
        ];
        info!(request_id = %request.id, "Request created");
        Ok(Written::from_writes(request, writes))
    }

    /// Fulfils an open request on behalf of an eligible donor and logs one
    /// `Donation` entry. A request that is no longer open is rejected, so a
    /// repeated accept never logs a second entry.
    #[instrument(fields(request_id = %request_id, donor_id = %donor_id), skip(self, request_id, donor_id))]
    async fn handle_accept_request(
        &mut self,
        request_id: String,
        donor_id: String,
    ) -> Result<Written<Acceptance>, RepositoryError> {
        debug!("Processing accept_request request");

        let status = self
            .requests
            .get(&request_id)
            .map(|request| request.status)
            .ok_or_else(|| RepositoryError::RequestNotFound(request_id.clone()))?;
        if status.is_terminal() {
            warn!(%status, "Request already closed");
            return Err(RepositoryError::RequestNotOpen { id: request_id, status });
        }

        let donor = self
            .users
            .get(&donor_id)
            .ok_or_else(|| RepositoryError::UserNotFound(donor_id.clone()))?;
        if donor.role() != Role::Donor {
            warn!(role = %donor.role(), "Only donors can accept requests");
            return Err(RepositoryError::DonorIneligible(format!(
                "{} is registered as {}",
                donor.name,
                donor.role()
            )));
        }
        let today = self.today();
        let eligibility = donor.eligibility(today);
        if !eligibility.is_eligible() {
            warn!(%eligibility, "Donor not eligible");
            return Err(RepositoryError::DonorIneligible(eligibility.to_string()));
        }

        self.requests.perform(
            &request_id,
            RequestAction::Fulfil {
                donor_id: donor_id.clone(),
            },
        )?;
        let request = self
            .requests
            .get(&request_id)
            .cloned()
            .ok_or_else(|| RepositoryError::RequestNotFound(request_id.clone()))?;

        let history_item = HistoryItem::from_draft(
            self.history.next_id(),
            HistoryDraft {
                user_id: donor_id,
                kind: HistoryKind::Donation,
                date: today,
                location: request.hospital_name.clone(),
                units: request.units,
                status: "Accepted".to_string(),
            },
        );
        self.history.push_front(history_item.clone());

        let writes = [
            self.requests.persist(self.store.as_ref(), self.write_attempts).await,
            self.history.persist(self.store.as_ref(), self.write_attempts).await,
        ];
        info!(history_id = history_item.id, "Request fulfilled");
        Ok(Written::from_writes(Acceptance { request, history_item }, writes))
    }

    /// Hides a request from one donor's view. The shared record is untouched.
    #[instrument(fields(request_id = %request_id, donor_id = %donor_id), skip(self, request_id, donor_id))]
    async fn handle_ignore_request(
        &mut self,
        request_id: String,
        donor_id: String,
    ) -> Result<Written<()>, RepositoryError> {
        debug!("Processing ignore_request request");

        if self.users.get(&donor_id).is_none() {
            return Err(RepositoryError::UserNotFound(donor_id));
        }
        if self.requests.get(&request_id).is_none() {
            return Err(RepositoryError::RequestNotFound(request_id));
        }
        if !self.dismissals.insert(&donor_id, &request_id) {
            debug!("Request already dismissed");
            return Ok(Written::durable(()));
        }

        let write = self.dismissals.persist(self.store.as_ref(), self.write_attempts).await;
        info!("Request dismissed");
        Ok(Written::from_writes((), [write]))
    }

    /// Withdraws an open request. Only its requester or an admin may do so.
    #[instrument(fields(request_id = %request_id, requester_id = %requester_id), skip(self, request_id, requester_id))]
    async fn handle_cancel_request(
        &mut self,
        request_id: String,
        requester_id: String,
    ) -> Result<Written<BloodRequest>, RepositoryError> {
        debug!("Processing cancel_request request");

        let is_admin = self
            .users
            .get(&requester_id)
            .map(|user| user.role() == Role::Admin)
            .ok_or_else(|| RepositoryError::UserNotFound(requester_id.clone()))?;
        let owner = self
            .requests
            .get(&request_id)
            .map(|request| request.requester_id.clone())
            .ok_or_else(|| RepositoryError::RequestNotFound(request_id.clone()))?;
        if owner != requester_id && !is_admin {
            warn!(%owner, "Cancel by non-owner rejected");
            return Err(RepositoryError::NotRequestOwner {
                request_id,
                user_id: requester_id,
            });
        }

        self.requests
            .perform(&request_id, RequestAction::Cancel)
            .inspect_err(|e| warn!(error = %e, "Cancel rejected"))?;
        let request = self
            .requests
            .get(&request_id)
            .cloned()
            .ok_or_else(|| RepositoryError::RequestNotFound(request_id.clone()))?;

        let write = self.requests.persist(self.store.as_ref(), self.write_attempts).await;
        info!("Request cancelled");
        Ok(Written::from_writes(request, [write]))
    }

    // =========================================================================
    // History
    // =========================================================================

    /// The user's entries, most recent date first. Entries sharing a date keep
    /// their stored (newest-first) order.
    #[instrument(fields(user_id = %user_id), skip(self, user_id))]
    fn handle_list_history(&self, user_id: String) -> Vec<HistoryItem> {
        let mut items: Vec<HistoryItem> = self
            .history
            .iter()
            .filter(|item| item.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.date.cmp(&a.date));
        debug!(item_count = items.len(), "Listed history");
        items
    }

    /// Appends an entry. The owner is not validated.
    #[instrument(fields(user_id = %draft.user_id, kind = %draft.kind), skip(self, draft))]
    async fn handle_add_history_item(&mut self, draft: HistoryDraft) -> Result<Written<HistoryItem>, RepositoryError> {
        debug!("Processing add_history_item request");

        let item = HistoryItem::from_draft(self.history.next_id(), draft);
        self.history.push_front(item.clone());

        let write = self.history.persist(self.store.as_ref(), self.write_attempts).await;
        info!(history_id = item.id, "History item added");
        Ok(Written::from_writes(item, [write]))
    }
}

/// Time-based history ids that stay strictly increasing even when the clock
/// stalls or steps back.
fn next_history_id(last: &AtomicU64, now_millis: i64) -> u64 {
    let now = u64::try_from(now_millis).unwrap_or(0);
    let previous = match last.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
        Some(now.max(prev.saturating_add(1)))
    }) {
        Ok(prev) | Err(prev) => prev,
    };
    now.max(previous.saturating_add(1))
}
