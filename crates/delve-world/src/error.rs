use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("failed to spawn generation worker: {0}")]
    SpawnFailed(#[from] std::io::Error),

    #[error("generation worker is no longer running")]
    Disconnected,

    #[error("generation worker panicked")]
    WorkerPanicked,
}
