use super::{OutputKey, OutputWriter};
use crate::error::WriteError;
use crate::message::Message;
use async_trait::async_trait;

/// Firebase Realtime Database writer using the REST API.
///
/// `PUT {database_url}/{path}.json` replaces whatever is stored at the path.
pub struct RtdbWriter {
    client: reqwest::Client,
    database_url: String,
    auth_token: Option<String>,
}

impl RtdbWriter {
    pub fn new(client: reqwest::Client, database_url: String, auth_token: Option<String>) -> Self {
        Self {
            client,
            database_url: database_url.trim_end_matches('/').to_string(),
            auth_token,
        }
    }

    fn url_for(&self, key: &OutputKey) -> String {
        format!("{}/{}.json", self.database_url, key.path())
    }
}

#[async_trait]
impl OutputWriter for RtdbWriter {
    async fn put(&self, key: &OutputKey, payload: &Message) -> Result<(), WriteError> {
        let mut request = self.client.put(self.url_for(key)).json(payload);
        if let Some(token) = &self.auth_token {
            request = request.query(&[("auth", token.as_str())]);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            return Err(WriteError::Rejected { status, body });
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "rtdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{body_json, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn payload() -> Message {
        Message {
            language: Some(serde_json::json!(2)),
            message: Some("hola".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_url_for_trims_trailing_slash() {
        let writer = RtdbWriter::new(
            reqwest::Client::new(),
            "https://chat.firebaseio.com/".to_string(),
            None,
        );
        let key = OutputKey::new("lobby", "m1", "es").unwrap();

        assert_eq!(
            writer.url_for(&key),
            "https://chat.firebaseio.com/room-messages/lobby/OUTPUT/m1-es.json"
        );
    }

    #[tokio::test]
    async fn test_put_sends_payload_with_auth() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/room-messages/lobby/OUTPUT/m1-es.json"))
            .and(query_param("auth", "secret-token"))
            .and(body_json(serde_json::json!({"language": 2, "message": "hola"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "language": 2,
                "message": "hola"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let writer = RtdbWriter::new(
            reqwest::Client::new(),
            mock_server.uri(),
            Some("secret-token".to_string()),
        );

        writer
            .write("lobby", "m1", "es", &payload())
            .await
            .expect("Should succeed");
    }

    #[tokio::test]
    async fn test_put_permission_denied() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_string(r#"{"error": "Permission denied"}"#),
            )
            .mount(&mock_server)
            .await;

        let writer = RtdbWriter::new(reqwest::Client::new(), mock_server.uri(), None);
        let err = writer
            .write("lobby", "m1", "es", &payload())
            .await
            .unwrap_err();

        assert!(matches!(err, WriteError::Rejected { status: 401, .. }));
        assert!(err.to_string().contains("Permission denied"));
    }
}
