use super::{OutputKey, OutputWriter};
use crate::error::WriteError;
use crate::message::Message;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

/// Cloud Firestore writer using the REST API.
///
/// A `PATCH` without an update mask replaces the whole document and creates
/// it when missing.
pub struct FirestoreWriter {
    client: reqwest::Client,
    api_url: String,
    project_id: String,
    auth_token: Option<String>,
}

impl FirestoreWriter {
    pub fn new(
        client: reqwest::Client,
        api_url: String,
        project_id: String,
        auth_token: Option<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            project_id,
            auth_token,
        }
    }

    fn url_for(&self, key: &OutputKey) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}",
            self.api_url,
            self.project_id,
            key.path()
        )
    }
}

/// Encode a JSON value in Firestore's typed value format.
fn to_firestore_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            // int64 values travel as strings
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(to_firestore_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": to_firestore_fields(map) } }),
    }
}

fn to_firestore_fields(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(k, v)| (k.clone(), to_firestore_value(v)))
        .collect()
}

/// Document body for a message.
fn document_for(payload: &Message) -> Result<Value, WriteError> {
    let fields = match serde_json::to_value(payload)? {
        Value::Object(map) => to_firestore_fields(&map),
        _ => Map::new(),
    };
    Ok(json!({ "fields": fields }))
}

#[async_trait]
impl OutputWriter for FirestoreWriter {
    async fn put(&self, key: &OutputKey, payload: &Message) -> Result<(), WriteError> {
        let document = document_for(payload)?;

        let mut request = self.client.patch(self.url_for(key)).json(&document);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
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
        "firestore"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{body_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    #[test]
    fn test_to_firestore_value_scalars() {
        assert_eq!(to_firestore_value(&json!(null)), json!({"nullValue": null}));
        assert_eq!(to_firestore_value(&json!(true)), json!({"booleanValue": true}));
        assert_eq!(to_firestore_value(&json!(42)), json!({"integerValue": "42"}));
        assert_eq!(to_firestore_value(&json!(1.5)), json!({"doubleValue": 1.5}));
        assert_eq!(to_firestore_value(&json!("hi")), json!({"stringValue": "hi"}));
    }

    #[test]
    fn test_to_firestore_value_nested() {
        let value = json!({"tags": ["a", 1], "meta": {"pinned": false}});

        assert_eq!(
            to_firestore_value(&value),
            json!({
                "mapValue": {
                    "fields": {
                        "tags": {
                            "arrayValue": {
                                "values": [{"stringValue": "a"}, {"integerValue": "1"}]
                            }
                        },
                        "meta": {
                            "mapValue": {
                                "fields": {"pinned": {"booleanValue": false}}
                            }
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_document_for_message() {
        let payload = Message {
            language: Some(json!(3)),
            message: Some("olá".to_string()),
            moderated: Some(false),
            ..Default::default()
        };

        let document = document_for(&payload).unwrap();
        assert_eq!(
            document,
            json!({
                "fields": {
                    "language": {"integerValue": "3"},
                    "message": {"stringValue": "olá"},
                    "moderated": {"booleanValue": false}
                }
            })
        );
    }

    #[tokio::test]
    async fn test_put_patches_document() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path(
                "/v1/projects/chat-app/databases/(default)/documents/room-messages/lobby/OUTPUT/m1-pt",
            ))
            .and(header("Authorization", "Bearer firestore-token"))
            .and(body_json(json!({
                "fields": {"message": {"stringValue": "olá"}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let writer = FirestoreWriter::new(
            reqwest::Client::new(),
            format!("{}/v1", mock_server.uri()),
            "chat-app".to_string(),
            Some("firestore-token".to_string()),
        );
        let payload = Message {
            message: Some("olá".to_string()),
            ..Default::default()
        };

        writer
            .write("lobby", "m1", "pt", &payload)
            .await
            .expect("Should succeed");
    }

    #[tokio::test]
    async fn test_put_error_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&mock_server)
            .await;

        let writer = FirestoreWriter::new(
            reqwest::Client::new(),
            mock_server.uri(),
            "chat-app".to_string(),
            None,
        );

        let err = writer
            .write("lobby", "m1", "pt", &Message::default())
            .await
            .unwrap_err();
        assert!(matches!(err, WriteError::Rejected { status: 503, .. }));
    }
}
