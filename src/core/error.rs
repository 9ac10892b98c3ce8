use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the portfolio core. Each variant maps to a distinct
/// client-facing status at the boundary layer.
#[derive(Debug, Error)]
pub enum Error {
    /// An entity invariant was violated by a mutation.
    #[error("{0}")]
    InvalidArgument(String),

    /// A portfolio with the requested name already exists.
    #[error("{0}")]
    AlreadyExists(String),

    /// The requested portfolio or asset symbol does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request is malformed and was rejected before touching any state.
    #[error("{0}")]
    BadRequest(String),

    /// Every configured pricing source failed to respond with a price.
    #[error("{0}")]
    UpstreamUnavailable(String),
}
