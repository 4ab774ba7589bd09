use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use mockable::DefaultClock;
use tracing::{error, info, warn, Instrument};

use cbc::app_system::{setup_tracing, DonationSystem, SystemConfig};
use cbc::assistant::UnconfiguredGenerator;
use cbc::clients::RepositoryClient;
use cbc::domain::{BloodGroup, Registration, RequestDraft, Urgency, User};
use cbc::error::{RepositoryError, Written};
use cbc::store::{FileStore, MemoryStore, Store};

/// Walks a requester and a donor through one request.
#[derive(Debug, Parser)]
#[command(name = "cbc", version, about = "Campus Blood Connect data service demo")]
struct Cli {
    /// Persist tables as JSON files in this directory (in memory if omitted)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Repository mailbox capacity
    #[arg(long)]
    buffer_size: Option<usize>,

    /// Attempts per table write before reporting a failure
    #[arg(long)]
    write_attempts: Option<u32>,

    /// Start from empty tables instead of the demo data
    #[arg(long)]
    no_seed: bool,
}

impl Cli {
    fn config(&self) -> SystemConfig {
        let defaults = SystemConfig::default();
        SystemConfig {
            buffer_size: self.buffer_size.unwrap_or(defaults.buffer_size),
            write_attempts: self.write_attempts.unwrap_or(defaults.write_attempts),
            seed_demo_data: !self.no_seed,
            ..defaults
        }
    }

    fn store(&self) -> Arc<dyn Store> {
        match &self.data_dir {
            Some(dir) => Arc::new(FileStore::new(dir)),
            None => Arc::new(MemoryStore::new()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    // Setup tracing once for the entire application
    setup_tracing();

    let cli = Cli::parse();
    info!(data_dir = ?cli.data_dir, "Starting Campus Blood Connect demo");

    let system = DonationSystem::start(
        cli.config(),
        cli.store(),
        Arc::new(DefaultClock),
        Arc::new(UnconfiguredGenerator),
    )
    .await;
    let repository = &system.repository;

    let span = tracing::info_span!("sign_up");
    let (requester, donor) = async {
        let requester = register_or_login(repository, Registration::requester("Maya Patel", "maya@college.edu")).await?;
        let donor = register_or_login(
            repository,
            Registration::donor("Sam Lee", "sam@college.edu", BloodGroup::APos),
        )
        .await?;
        Ok::<_, RepositoryError>((requester, donor))
    }
    .instrument(span)
    .await
    .map_err(|e| e.to_string())?;

    info!(requester_id = %requester.id, donor_id = %donor.id, "Users ready");

    let description = system
        .assistant
        .compose_emergency_message(BloodGroup::APos, "City General Hospital", Urgency::Urgent, 2)
        .await;

    let span = tracing::info_span!("request_lifecycle");
    let outcome = async {
        let draft = RequestDraft::new(&requester.id, BloodGroup::APos, 2, "City General Hospital")
            .with_urgency(Urgency::Urgent)
            .with_description(description);
        let request = report(repository.create_request(draft).await?);
        info!(request_id = %request.id, "Request posted");

        let visible = repository.list_requests_for(donor.id.clone()).await?;
        info!(visible = visible.len(), "Requests visible to donor");

        let eligibility = repository.eligibility(donor.id.clone()).await?;
        info!(%eligibility, "Donor eligibility");

        let acceptance = report(repository.accept_request(request.id.clone(), donor.id.clone()).await?);
        info!(
            status = %acceptance.request.status,
            history_id = acceptance.history_item.id,
            "Request accepted"
        );

        let history = repository.list_history(donor.id.clone()).await?;
        info!(entries = history.len(), "Donor history");
        Ok::<_, RepositoryError>(())
    }
    .instrument(span)
    .await;

    match outcome {
        Ok(()) => info!("Request lifecycle completed"),
        Err(e) => error!(error = %e, "Request lifecycle failed"),
    }

    let answer = system.assistant.answer_question("How long should I wait between donations?").await;
    info!(%answer, "Assistant answer");

    // Shutdown system gracefully
    system.shutdown().await.map_err(|e| e.to_string())?;

    info!("Application completed successfully");
    Ok(())
}

/// Reruns against a file store find the demo users already registered.
async fn register_or_login(repository: &RepositoryClient, registration: Registration) -> Result<User, RepositoryError> {
    let email = registration.email.clone();
    match repository.register(registration).await {
        Ok(written) => Ok(report(written)),
        Err(RepositoryError::DuplicateEmail(_)) => {
            info!(%email, "Already registered, logging in");
            repository.login(email).await.map(report)
        }
        Err(e) => Err(e),
    }
}

fn report<T>(written: Written<T>) -> T {
    if let Some(failure) = &written.write_failure {
        warn!(%failure, "Change applied but not saved");
    }
    written.into_value()
}
