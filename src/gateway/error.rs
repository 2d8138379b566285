use thiserror::Error;

/// Failures talking to the remote document collection.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Query failed: {0}")]
    Query(String),

    /// The in-memory gateway never fails here; remote gateways report
    /// listener-registration failures through this variant.
    #[error("Subscription failed: {0}")]
    Subscribe(String),

    #[error("Update failed for document {id}: {reason}")]
    Update { id: String, reason: String },

    #[error("Batch write failed: {0}")]
    Batch(String),

    #[error("Unauthorized - session may be expired")]
    Unauthorized,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_error_names_the_document() {
        let err = GatewayError::Update {
            id: "123_456A".to_string(),
            reason: "permission denied".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("123_456A"));
        assert!(msg.contains("permission denied"));
    }
}
