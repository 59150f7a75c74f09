//! Public contact form

use reqwest::Method;

use taskman_protocol::ContactMessage;

use crate::client::BaseClient;
use crate::error::{Result, TaskmanError};

const FALLBACK_REPLY: &str = "Message sent!";

pub struct ContactService<'a> {
    http: &'a BaseClient,
}

impl<'a> ContactService<'a> {
    pub fn new(http: &'a BaseClient) -> Self {
        Self { http }
    }

    /// Send a message; no login needed. Returns the acknowledgement text.
    pub async fn send(&self, message: &ContactMessage) -> Result<String> {
        let missing: Vec<&str> = [
            ("name", &message.name),
            ("email", &message.email),
            ("subject", &message.subject),
            ("message", &message.message),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();
        if !missing.is_empty() {
            return Err(TaskmanError::invalid_input(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        let reply: serde_json::Value = self
            .http
            .request(Method::POST, "/api/contact/", Some(message))
            .await?
            .into_result()?;

        Ok(reply
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or(FALLBACK_REPLY)
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::mocks::session_for;
    use serde_json::json;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message() -> ContactMessage {
        ContactMessage {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            subject: "Hello".to_string(),
            message: "Nice app".to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_is_anonymous() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/contact/"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/contact/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Message sent! We will get back to you shortly."
            })))
            .mount(&server)
            .await;

        let session = session_for(&server);
        let reply = ContactService::new(session.http())
            .send(&message())
            .await
            .unwrap();
        assert!(reply.starts_with("Message sent!"));
    }

    #[tokio::test]
    async fn test_blank_fields_rejected() {
        let server = MockServer::start().await;
        let session = session_for(&server);
        let blank = ContactMessage {
            subject: " ".to_string(),
            message: String::new(),
            ..message()
        };

        let err = ContactService::new(session.http())
            .send(&blank)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("subject, message"));
    }
}
