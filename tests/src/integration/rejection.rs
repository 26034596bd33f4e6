//! # Rejected Requests
//!
//! Structural problems (405, 404, 415, 413) are reported before validation
//! problems (400). Nothing rejected ever reaches the consumer.

#[cfg(test)]
mod tests {
    use crate::integration::support::*;
    use lw_pubsub_adapter::{IntakeConfig, PubSubAdapter};
    use reqwest::Method;

    /// Assert the consumer sees nothing for a while.
    async fn assert_nothing_delivered(adapter: &PubSubAdapter) {
        let next = tokio::time::timeout(NO_DELIVERY_WINDOW, adapter.next_registration()).await;
        assert!(next.is_err(), "rejected registration reached the consumer");
        assert_eq!(adapter.metrics().accepted, 0);
    }

    #[tokio::test]
    async fn test_invalid_dev_addr_is_400() {
        let adapter = start_adapter().await;

        let response = put_json(device_url(&adapter, "INVALID"), valid_body())
            .await
            .unwrap();
        assert_eq!(response.status(), 400);

        let body = error_body(response).await;
        assert_eq!(body["error"], "validation");
        assert_eq!(body["field"], "devAddr");

        assert_nothing_delivered(&adapter).await;
        adapter.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_short_nwks_key_is_400() {
        let adapter = start_adapter().await;
        let body = registration_body(APP_ID, APP_URL, "00112233445566778899af");

        let response = put_json(device_url(&adapter, "14aab0a4"), body)
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        assert_eq!(error_body(response).await["field"], "nwks_key");

        assert_nothing_delivered(&adapter).await;
        adapter.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_non_hex_nwks_key_is_400() {
        let adapter = start_adapter().await;
        let body = registration_body(APP_ID, APP_URL, "000102030405060708090a0b0c0d0e0g");

        let response = put_json(device_url(&adapter, "14aab0a4"), body)
            .await
            .unwrap();
        assert_eq!(response.status(), 400);

        let body = error_body(response).await;
        assert_eq!(body["error"], "validation");
        assert_eq!(body["field"], "nwks_key");

        assert_nothing_delivered(&adapter).await;
        adapter.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_app_id_is_400() {
        let adapter = start_adapter().await;
        let body = serde_json::json!({ "app_url": APP_URL, "nwks_key": NWKS_KEY }).to_string();

        let response = put_json(device_url(&adapter, "14aab0a4"), body)
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        assert_eq!(error_body(response).await["field"], "app_id");

        assert_nothing_delivered(&adapter).await;
        adapter.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_post_is_405() {
        let adapter = start_adapter().await;

        let response = send(
            Method::POST,
            device_url(&adapter, "14aab0a4"),
            "application/json",
            valid_body(),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), 405);
        assert_eq!(response.headers()[reqwest::header::ALLOW], "PUT");

        assert_nothing_delivered(&adapter).await;
        adapter.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_method_checked_before_path() {
        let adapter = start_adapter().await;
        let url = format!("http://{}/nowhere", adapter.local_addr());

        let response = send(Method::GET, url, "application/json", String::new())
            .await
            .unwrap();
        assert_eq!(response.status(), 405);

        adapter.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let adapter = start_adapter().await;

        for path in ["/end-devices", "/end-devices/", "/end-devices/14aab0a4/extra", "/devices/14aab0a4"] {
            let url = format!("http://{}{}", adapter.local_addr(), path);
            let response = put_json(url, valid_body()).await.unwrap();
            assert_eq!(response.status(), 404, "path {}", path);
        }

        assert_nothing_delivered(&adapter).await;
        adapter.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_wrong_content_type_is_415() {
        let adapter = start_adapter().await;

        // Invalid devAddr too: the media type is checked first
        let response = send(
            Method::PUT,
            device_url(&adapter, "INVALID"),
            "text/plain",
            valid_body(),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), 415);
        assert_eq!(error_body(response).await["error"], "structural");

        assert_nothing_delivered(&adapter).await;
        adapter.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_oversized_body_is_413() {
        let adapter = start_adapter_with(IntakeConfig {
            max_body_size: 32,
            ..IntakeConfig::default()
        })
        .await;

        let response = put_json(device_url(&adapter, "14aab0a4"), valid_body())
            .await
            .unwrap();
        assert_eq!(response.status(), 413);

        assert_nothing_delivered(&adapter).await;
        adapter.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_structural_errors_win_over_oversized_body() {
        let adapter = start_adapter_with(IntakeConfig {
            max_body_size: 64,
            ..IntakeConfig::default()
        })
        .await;
        let big = "x".repeat(2048);

        let response = send(
            Method::POST,
            device_url(&adapter, "14aab0a4"),
            "application/json",
            big.clone(),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), 405);

        let url = format!("http://{}/nowhere", adapter.local_addr());
        let response = send(Method::PUT, url, "text/plain", big.clone())
            .await
            .unwrap();
        assert_eq!(response.status(), 404);

        let response = send(
            Method::PUT,
            device_url(&adapter, "14aab0a4"),
            "text/plain",
            big,
        )
        .await
        .unwrap();
        assert_eq!(response.status(), 415);

        assert_nothing_delivered(&adapter).await;
        adapter.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_rejections_are_counted() {
        let adapter = start_adapter().await;

        put_json(device_url(&adapter, "INVALID"), valid_body())
            .await
            .unwrap();
        send(
            Method::DELETE,
            device_url(&adapter, "14aab0a4"),
            "application/json",
            String::new(),
        )
        .await
        .unwrap();

        let metrics = adapter.metrics();
        assert_eq!(metrics.requests_total, 2);
        assert_eq!(metrics.validation_rejected, 1);
        assert_eq!(metrics.structural_rejected, 1);
        assert_eq!(metrics.pending, 0);

        adapter.shutdown().await.unwrap();
    }
}
