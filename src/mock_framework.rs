//! # Mock Framework
//!
//! Test doubles for the repository service and its collaborators.
//!
//! - [`FixedClock`] pins "now" so eligibility and ids are deterministic.
//! - [`FlakyStore`] fails writes on demand.
//! - [`ScriptedGenerator`] and [`PendingGenerator`] stand in for the text backend.
//! - [`create_mock_client`] returns a client plus the receiving end of its
//!   channel. Use the `expect_*` helpers to assert what the client sent and to
//!   reply on the service's behalf.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use mockable::Clock;
use tokio::sync::{mpsc, oneshot};

use crate::assistant::{AssistantError, TextGenerator};
use crate::clients::RepositoryClient;
use crate::domain::User;
use crate::error::{RepositoryError, Written};
use crate::messages::{Acceptance, RepositoryRequest};
use crate::repository::SharedClock;
use crate::store::{MemoryStore, Store, StoreError, StoreResult, Table};

// =============================================================================
// Clock
// =============================================================================

/// Clock frozen at a chosen instant. `advance` moves it forward.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Noon UTC on the given date, shared.
    pub fn on(year: i32, month: u32, day: u32) -> Arc<Self> {
        Arc::new(Self::at(noon(year, month, day)))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock mutex");
        *now += by;
    }

    pub fn shared(self: &Arc<Self>) -> SharedClock {
        Arc::clone(self) as SharedClock
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex")
    }
}

pub fn noon(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).single().expect("valid date")
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

// =============================================================================
// Store
// =============================================================================

/// Memory store whose writes and removes can be made to fail.
///
/// Reads always succeed, so whatever did get written can be loaded back.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    failures_left: AtomicU32,
    always_fail: AtomicBool,
    write_calls: AtomicU32,
}

impl FlakyStore {
    pub fn healthy() -> Self {
        Self::default()
    }

    /// Fails the next `n` writes, then succeeds.
    pub fn failing_next(n: u32) -> Self {
        let store = Self::default();
        store.failures_left.store(n, Ordering::SeqCst);
        store
    }

    pub fn always_failing() -> Self {
        let store = Self::default();
        store.set_failing(true);
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.always_fail.store(failing, Ordering::SeqCst);
    }

    /// Writes and removes attempted so far, failed ones included.
    pub fn write_calls(&self) -> u32 {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// Writes a raw blob, bypassing failure injection.
    pub async fn put_raw(&self, table: Table, blob: &str) {
        self.inner.write(table, blob).await.expect("memory write");
    }

    fn check_write(&self, table: Table) -> StoreResult<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.always_fail.load(Ordering::SeqCst) {
            return Err(StoreError::Io(format!("{table}: disk full")));
        }
        let scheduled = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if scheduled {
            return Err(StoreError::Io(format!("{table}: transient failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for FlakyStore {
    async fn read(&self, table: Table) -> StoreResult<Option<String>> {
        self.inner.read(table).await
    }

    async fn write(&self, table: Table, blob: &str) -> StoreResult<()> {
        self.check_write(table)?;
        self.inner.write(table, blob).await
    }

    async fn remove(&self, table: Table) -> StoreResult<()> {
        self.check_write(table)?;
        self.inner.remove(table).await
    }
}

// =============================================================================
// Text generators
// =============================================================================

/// Returns the same scripted outcome for every prompt and records prompts.
#[derive(Debug)]
pub struct ScriptedGenerator {
    reply: Result<String, AssistantError>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: AssistantError) -> Self {
        Self {
            reply: Err(error),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().expect("prompts mutex").last().cloned()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, AssistantError> {
        self.prompts.lock().expect("prompts mutex").push(prompt.to_string());
        self.reply.clone()
    }
}

/// Never answers.
#[derive(Debug, Clone, Copy)]
pub struct PendingGenerator;

#[async_trait]
impl TextGenerator for PendingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, AssistantError> {
        std::future::pending().await
    }
}

// =============================================================================
// Client
// =============================================================================

/// Creates a client whose requests land on the returned receiver instead of a
/// running service.
pub fn create_mock_client(buffer_size: usize) -> (RepositoryClient, mpsc::Receiver<RepositoryRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (RepositoryClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Login request
pub async fn expect_login(
    receiver: &mut mpsc::Receiver<RepositoryRequest>,
) -> Option<(String, oneshot::Sender<Result<Written<User>, RepositoryError>>)> {
    match receiver.recv().await {
        Some(RepositoryRequest::Login { email, respond_to }) => Some((email, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an AcceptRequest request
pub async fn expect_accept_request(
    receiver: &mut mpsc::Receiver<RepositoryRequest>,
) -> Option<(String, String, oneshot::Sender<Result<Written<Acceptance>, RepositoryError>>)> {
    match receiver.recv().await {
        Some(RepositoryRequest::AcceptRequest {
            request_id,
            donor_id,
            respond_to,
        }) => Some((request_id, donor_id, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_flaky_store_recovers_after_scheduled_failures() {
        let store = FlakyStore::failing_next(1);
        assert!(store.write(Table::Users, "[]").await.is_err());
        assert!(store.write(Table::Users, "[]").await.is_ok());
        assert_eq!(store.read(Table::Users).await.unwrap(), Some("[]".to_string()));
        assert_eq!(store.write_calls(), 2);
    }

    #[test]
    fn test_fixed_clock_advances() {
        let clock = FixedClock::on(2024, 1, 1);
        clock.advance(Duration::days(2));
        assert_eq!(clock.utc().date_naive(), date(2024, 1, 3));
    }

    #[tokio::test]
    async fn test_mock_client_accept_round_trip() {
        let (client, mut receiver) = create_mock_client(4);

        let accept = tokio::spawn(async move { client.accept_request("r1".to_string(), "u1".to_string()).await });

        let (request_id, donor_id, responder) = expect_accept_request(&mut receiver)
            .await
            .expect("Expected AcceptRequest request");
        assert_eq!((request_id.as_str(), donor_id.as_str()), ("r1", "u1"));
        responder
            .send(Err(RepositoryError::RequestNotFound(request_id)))
            .unwrap();

        assert_eq!(
            accept.await.unwrap(),
            Err(RepositoryError::RequestNotFound("r1".to_string()))
        );
    }
}
