use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("a run is already in progress")]
    AlreadyRunning,

    #[error("no run is in progress")]
    NotRunning,

    #[error("no pending human-in-the-loop request with id {0}")]
    UnknownHilRequest(Uuid),

    #[error("graph failed: {0}")]
    Graph(#[from] ebs_graph::GraphError),
}
