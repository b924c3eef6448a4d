//! Authentication integration tests.

#[cfg(test)]
mod tests {
    use crate::{client, endpoint_url, signed_url};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_authenticate_signed_request() {
        let resp = client()
            .get(signed_url("/profile", &[]))
            .send()
            .await
            .expect("send request");
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        let json: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(json["controller"], "Profile");
        assert_eq!(json["identity"], "42");
        assert_eq!(json["application"], "accounts");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_tampered_token() {
        let mut url = signed_url("/profile", &[]);
        let last = url.pop().expect("non-empty url");
        url.push(if last == '0' { '1' } else { '0' });

        let resp = client().get(url).send().await.expect("send request");
        assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
        let json: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(json["code"], "BadSignature");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_stale_timestamp() {
        let url = format!(
            "{}/profile?username=alice&timestamp=1000&token=00",
            endpoint_url()
        );
        let resp = client().get(url).send().await.expect("send request");
        assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
        let json: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(json["code"], "Expired");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_required_resource_without_query() {
        let resp = client()
            .get(format!("{}/profile", endpoint_url()))
            .send()
            .await
            .expect("send request");
        assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
        let json: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(json["code"], "MissingQuery");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_allow_anonymous_optional_resource() {
        let resp = client()
            .get(format!("{}/articles/intro", endpoint_url()))
            .send()
            .await
            .expect("send request");
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let json: serde_json::Value = resp.json().await.expect("json body");
        assert!(json.get("identity").is_none());
        assert_eq!(json["arguments"]["slug"], "intro");
    }
}
