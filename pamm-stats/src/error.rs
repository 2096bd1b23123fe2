use pamm_types::{ClientType, PammError};
use thiserror::Error;

/// Errors raised while computing statistics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("no events found for client type {0}")]
    MissingClient(ClientType),

    #[error("client mapping is empty")]
    EmptyMapping,

    #[error("spike window must lie inside its context window")]
    SpikeOutsideContext,

    #[error("rolling window must be at least 1")]
    InvalidWindow,

    #[error(transparent)]
    Types(#[from] PammError),
}
