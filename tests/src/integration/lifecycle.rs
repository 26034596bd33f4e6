//! # Intake Lifecycle
//!
//! Shutdown answers every suspended request with 503 and fails the pull
//! side. Handles dropped or answered late never produce a second response.

#[cfg(test)]
mod tests {
    use crate::integration::support::*;
    use lw_pubsub_adapter::{AckError, AdapterError, IntakeConfig};
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_answers_queued_request_with_503() {
        let adapter = start_adapter().await;
        let request = put_json(device_url(&adapter, "14aab0a4"), valid_body());
        wait_for_accepted(&adapter, 1).await;

        adapter.shutdown().await.unwrap();

        let response = request.await.unwrap();
        assert_eq!(response.status(), 503);
        assert_eq!(error_body(response).await["error"], "shutdown");
        assert!(adapter.is_shutdown());
    }

    #[tokio::test]
    async fn test_shutdown_answers_delivered_request_with_503() {
        let adapter = start_adapter().await;
        let request = put_json(device_url(&adapter, "14aab0a4"), valid_body());

        let (_, mut ack) = adapter.next_registration().await.unwrap();
        adapter.shutdown().await.unwrap();

        assert_eq!(request.await.unwrap().status(), 503);
        assert_eq!(ack.ack(), Err(AckError::ResponderGone));
    }

    #[tokio::test]
    async fn test_next_registration_fails_after_shutdown() {
        let adapter = start_adapter().await;
        adapter.shutdown().await.unwrap();

        assert!(matches!(
            adapter.next_registration().await,
            Err(AdapterError::Shutdown)
        ));
        // Idempotent
        adapter.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_wakes_waiting_consumer() {
        let adapter = std::sync::Arc::new(start_adapter().await);

        let consumer = {
            let adapter = adapter.clone();
            tokio::spawn(async move { adapter.next_registration().await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        adapter.shutdown().await.unwrap();
        assert!(matches!(consumer.await.unwrap(), Err(AdapterError::Shutdown)));
    }

    #[tokio::test]
    async fn test_dropped_handle_is_500() {
        let adapter = start_adapter().await;
        let request = put_json(device_url(&adapter, "14aab0a4"), valid_body());

        let (_, ack) = adapter.next_registration().await.unwrap();
        drop(ack);

        let response = request.await.unwrap();
        assert_eq!(response.status(), 500);
        assert_eq!(adapter.metrics().aborted, 1);

        adapter.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_ack_timeout_is_504() {
        let adapter = start_adapter_with(IntakeConfig {
            ack_timeout: Some(Duration::from_millis(100)),
            ..IntakeConfig::default()
        })
        .await;
        let request = put_json(device_url(&adapter, "14aab0a4"), valid_body());

        let (_, mut ack) = adapter.next_registration().await.unwrap();
        let response = request.await.unwrap();
        assert_eq!(response.status(), 504);
        assert_eq!(ack.ack(), Err(AckError::ResponderGone));

        adapter.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_consumers_each_get_one_registration() {
        let adapter = std::sync::Arc::new(start_adapter().await);

        let consumers: Vec<_> = (0..2)
            .map(|_| {
                let adapter = adapter.clone();
                tokio::spawn(async move {
                    let (registration, mut ack) = adapter.next_registration().await.unwrap();
                    ack.ack().unwrap();
                    registration.dev_addr.to_string()
                })
            })
            .collect();

        let first = put_json(device_url(&adapter, "aaaaaaaa"), valid_body());
        let second = put_json(device_url(&adapter, "bbbbbbbb"), valid_body());
        assert_eq!(first.await.unwrap().status(), 200);
        assert_eq!(second.await.unwrap().status(), 200);

        let mut seen = Vec::new();
        for consumer in consumers {
            seen.push(consumer.await.unwrap());
        }
        seen.sort();
        assert_eq!(seen, vec!["aaaaaaaa".to_string(), "bbbbbbbb".to_string()]);

        adapter.shutdown().await.unwrap();
    }
}
