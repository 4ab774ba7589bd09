use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use crate::app_system::SystemConfig;
use crate::assistant::{Assistant, TextGenerator};
use crate::clients::RepositoryClient;
use crate::error::RepositoryError;
use crate::repository::{RepositoryService, SharedClock};
use crate::store::Store;

/// The application service object.
///
/// Restores persisted state, starts the repository service and hands out its
/// client along with the text assistant. Each instance owns its own state, so
/// tests can run several side by side.
pub struct DonationSystem {
    pub repository: RepositoryClient,
    pub assistant: Assistant,
    handle: JoinHandle<()>,
}

impl DonationSystem {
    #[instrument(name = "donation_system_start", skip_all)]
    pub async fn start(
        config: SystemConfig,
        store: Arc<dyn Store>,
        clock: SharedClock,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        info!(?config, "Starting donation system");

        let (service, repository) = RepositoryService::open(&config, store, clock).await;
        let handle = tokio::spawn(service.run());
        let assistant = Assistant::new(generator, config.assistant_timeout);

        Self {
            repository,
            assistant,
            handle,
        }
    }

    /// Stops the service after the messages already queued and waits for it.
    pub async fn shutdown(self) -> Result<(), RepositoryError> {
        info!("Shutting down system...");

        if let Err(e) = self.repository.shutdown().await {
            warn!(error = %e, "Repository service already stopped");
        }
        drop(self.repository);

        if let Err(e) = self.handle.await {
            error!("Repository task failed: {:?}", e);
            return Err(RepositoryError::ActorCommunicationError(format!(
                "Repository task failed: {e}"
            )));
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
