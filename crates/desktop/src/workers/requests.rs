use facelens_core::shared::error::ClientError;

/// Runs a blocking service call off the UI thread.
///
/// The HTTP client is synchronous; wrapping it here keeps `update` free to
/// return a `Task` immediately.
pub async fn run_blocking<T, F>(call: F) -> Result<T, ClientError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ClientError> + Send + 'static,
{
    tokio::task::spawn_blocking(call)
        .await
        .map_err(|e| ClientError::Network(format!("background request failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_returns_call_result() {
        let value = run_blocking(|| Ok::<_, ClientError>(42)).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_propagates_call_error() {
        let result: Result<(), _> =
            run_blocking(|| Err(ClientError::Validation("Please select an image".into()))).await;
        assert_eq!(
            result,
            Err(ClientError::Validation("Please select an image".into()))
        );
    }

    #[tokio::test]
    async fn test_panicking_call_becomes_network_error() {
        let result: Result<(), _> = run_blocking(|| panic!("boom")).await;
        assert!(matches!(result, Err(ClientError::Network(_))));
    }
}
