//! Cron scheduler for the maintenance jobs.

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use haven_core::config::WorkerConfig;
use haven_core::error::AppError;
use haven_core::result::AppResult;

use crate::jobs::CleanupJob;

/// Runs [`CleanupJob`] tasks on the configured cron schedules.
pub struct CronScheduler {
    scheduler: JobScheduler,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Creates the scheduler and registers both maintenance tasks.
    pub async fn new(config: &WorkerConfig, cleanup: CleanupJob) -> AppResult<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        let this = Self { scheduler };
        this.register_invitation_sweep(&config.invitation_sweep_schedule, cleanup.clone())
            .await?;
        this.register_token_purge(&config.token_purge_schedule, cleanup)
            .await?;
        Ok(this)
    }

    /// Starts running the registered schedules.
    pub async fn start(&self) -> AppResult<()> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;
        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Stops the scheduler.
    pub async fn shutdown(&mut self) -> AppResult<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shut down scheduler: {e}")))?;
        tracing::info!("Cron scheduler shut down");
        Ok(())
    }

    async fn register_invitation_sweep(
        &self,
        schedule: &str,
        cleanup: CleanupJob,
    ) -> AppResult<()> {
        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let cleanup = cleanup.clone();
            Box::pin(async move {
                if let Err(error) = cleanup.sweep_invitations().await {
                    tracing::error!(%error, "Invitation sweep failed");
                }
            })
        })
        .map_err(|e| {
            AppError::internal(format!("Invalid invitation sweep schedule {schedule:?}: {e}"))
        })?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add invitation sweep: {e}")))?;

        tracing::info!(schedule, "Registered invitation sweep");
        Ok(())
    }

    async fn register_token_purge(&self, schedule: &str, cleanup: CleanupJob) -> AppResult<()> {
        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let cleanup = cleanup.clone();
            Box::pin(async move {
                if let Err(error) = cleanup.purge_tokens().await {
                    tracing::error!(%error, "Token purge failed");
                }
            })
        })
        .map_err(|e| {
            AppError::internal(format!("Invalid token purge schedule {schedule:?}: {e}"))
        })?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add token purge: {e}")))?;

        tracing::info!(schedule, "Registered token purge");
        Ok(())
    }
}
