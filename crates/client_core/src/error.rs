use thiserror::Error;

/// Failure of a single request to the incident API. Every variant names the
/// operation that failed, e.g. `PUT /incidents/3`.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{operation} failed: network error: {reason}")]
    Network { operation: String, reason: String },
    #[error("{operation} failed: server responded with status {status}")]
    Status { operation: String, status: u16 },
    #[error("{operation} failed: malformed body: {reason}")]
    Malformed { operation: String, reason: String },
}

impl TransportError {
    pub fn operation(&self) -> &str {
        match self {
            Self::Network { operation, .. }
            | Self::Status { operation, .. }
            | Self::Malformed { operation, .. } => operation,
        }
    }

    pub(crate) fn network(operation: &str, reason: impl ToString) -> Self {
        Self::Network {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn malformed(operation: &str, reason: impl ToString) -> Self {
        Self::Malformed {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }
}
