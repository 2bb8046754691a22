use thiserror::Error;

// Custom Result type alias for convenient use across the project
pub type Result<T> = std::result::Result<T, RouteError>;

#[derive(Error, Debug)]
pub enum RouteError {
    /// The request cannot be routed as given (too few usable coordinates, bad body).
    #[error("{0}")]
    Validation(String),

    /// The distance source was unreachable, refused the request or answered garbage.
    #[error("Distance provider error: {0}")]
    Provider(String),

    /// The routing solver produced no feasible route.
    #[error("Route solver error: {0}")]
    Solver(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RouteError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }

    pub fn solver(message: impl Into<String>) -> Self {
        Self::Solver(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the failure was caused by the caller's input rather than a downstream component.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
