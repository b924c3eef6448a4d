//! Dispatch and body normalization integration tests.

#[cfg(test)]
mod tests {
    use crate::{client, endpoint_url, signed_url, unique_name};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_answer_not_implemented_for_locales() {
        let resp = client()
            .get(format!("{}/locales/anything", endpoint_url()))
            .send()
            .await
            .expect("send request");
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_IMPLEMENTED);
        let json: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(json["code"], "NotImplemented");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_answer_not_found_for_unknown_resource() {
        let resp = client()
            .get(format!("{}/unknown-resource", endpoint_url()))
            .send()
            .await
            .expect("send request");
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
        let json: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(json["code"], "ResourceNotFound");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_normalize_put_form_body() {
        let resp = client()
            .put(signed_url("/profile", &[]))
            .header("content-type", "application/x-www-form-urlencoded")
            .body("nickname=ally&city=Lisbon")
            .send()
            .await
            .expect("send request");
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        let json: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(json["method"], "Update");
        assert_eq!(json["arguments"]["nickname"], "ally");
        assert_eq!(json["arguments"]["city"], "Lisbon");
        assert_eq!(json["requestMethod"], "PUT");
        assert_eq!(json["effectiveMethod"], "POST");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_store_multipart_upload() {
        let filename = format!("{}.txt", unique_name("upload"));
        let body = format!(
            "--XyZ\r\n\
             Content-Disposition: form-data; name=\"title\"\r\n\
             \r\n\
             notes\r\n\
             --XyZ\r\n\
             Content-Disposition: form-data; name=\"userfile\"; filename=\"{filename}\"\r\n\
             Content-Type: text/plain\r\n\
             \r\n\
             hello upload\r\n\
             --XyZ--\r\n"
        );

        let resp = client()
            .put(signed_url("/files", &[]))
            .header("content-type", "multipart/form-data; boundary=XyZ")
            .body(body)
            .send()
            .await
            .expect("send request");
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        let json: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(json["arguments"]["title"], "notes");
        assert!(json["arguments"].get("userfile").is_none());
        assert_eq!(json["uploads"][0]["filename"], filename.as_str());
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_render_xml_when_requested() {
        let resp = client()
            .get(format!("{}/articles/intro", endpoint_url()))
            .header("accept", "application/xml")
            .send()
            .await
            .expect("send request");
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            "application/xml"
        );
        let text = resp.text().await.expect("text body");
        assert!(text.contains("<Controller>Article</Controller>"));
    }
}
