//! Service-level integration tests: health checks and common headers.

#[cfg(test)]
mod tests {
    use crate::{client, endpoint_url};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_healthy() {
        let resp = client()
            .get(format!("{}/health", endpoint_url()))
            .send()
            .await
            .expect("send request");
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let json: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(json["status"], "running");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_add_request_id_and_server_headers() {
        let resp = client()
            .get(format!("{}/themes", endpoint_url()))
            .send()
            .await
            .expect("send request");
        assert!(resp.headers().contains_key("x-request-id"));
        assert_eq!(resp.headers().get("server").unwrap(), "restgate");
    }
}
