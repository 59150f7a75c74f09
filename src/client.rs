//! HTTP client building blocks for the taskman SDK
//!
//! `ApiRequest` is a replayable description of a request (the authenticated
//! path may send it twice), `ApiResponse` is a fully buffered response, and
//! `BaseClient` turns one into the other.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{Result, TaskmanError};

const JSON_CONTENT_TYPE: &str = "application/json";
const AUTH_REQUIRED_DETAIL: &str = "Authentication required";

/// Body of an outgoing request
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(MultipartBody),
}

/// Multipart form kept as plain data so it can be rebuilt for a retry
#[derive(Debug, Clone, Default)]
pub struct MultipartBody {
    parts: Vec<MultipartPart>,
}

#[derive(Debug, Clone)]
struct MultipartPart {
    name: String,
    content: PartContent,
}

#[derive(Debug, Clone)]
enum PartContent {
    Text(String),
    File {
        filename: String,
        bytes: Vec<u8>,
        mime: Option<String>,
    },
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(MultipartPart {
            name: name.into(),
            content: PartContent::Text(value.into()),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        bytes: Vec<u8>,
        mime: Option<&str>,
    ) -> Self {
        self.parts.push(MultipartPart {
            name: name.into(),
            content: PartContent::File {
                filename: filename.into(),
                bytes,
                mime: mime.map(str::to_string),
            },
        });
        self
    }

    /// Read `path` into a file part, guessing the mime type from the extension
    pub async fn file_from_path(self, name: impl Into<String>, path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            TaskmanError::io_from_error(format!("Failed to read {}", path.display()), e)
        })?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let mime = guess_mime(path);
        Ok(self.file(name, filename, bytes, mime))
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    fn to_form(&self) -> Result<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for part in &self.parts {
            form = match &part.content {
                PartContent::Text(value) => form.text(part.name.clone(), value.clone()),
                PartContent::File {
                    filename,
                    bytes,
                    mime,
                } => {
                    let mut file_part =
                        reqwest::multipart::Part::bytes(bytes.clone()).file_name(filename.clone());
                    if let Some(mime) = mime {
                        file_part = file_part.mime_str(mime).map_err(|e| {
                            TaskmanError::invalid_input(format!("Invalid mime type {}: {}", mime, e))
                        })?;
                    }
                    form.part(part.name.clone(), file_part)
                }
            };
        }
        Ok(form)
    }
}

fn guess_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// A request against the API, relative to the configured base URL
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, payload: &T) -> Result<Self> {
        self.body = RequestBody::Json(serde_json::to_value(payload)?);
        Ok(self)
    }

    pub fn multipart(mut self, form: MultipartBody) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self.body, RequestBody::Multipart(_))
    }
}

/// Buffered HTTP response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    synthetic: bool,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
            synthetic: false,
        }
    }

    /// Local 401 used when no usable token exists; no request was made
    pub fn unauthenticated() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        let body = serde_json::json!({ "detail": AUTH_REQUIRED_DETAIL }).to_string();
        Self {
            status: StatusCode::UNAUTHORIZED,
            headers,
            body: body.into_bytes(),
            synthetic: true,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// True for responses generated locally instead of received
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            TaskmanError::invalid_response(
                self.status.as_u16(),
                format!("Invalid API response: {} ({})", e, self.text()),
            )
        })
    }

    /// Human readable error message from the body
    ///
    /// Understands `{"detail": "..."}` and field error maps such as
    /// `{"email": ["This field is required."]}`.
    pub fn error_message(&self) -> Option<String> {
        let value: serde_json::Value = serde_json::from_slice(&self.body).ok()?;
        if let Some(detail) = value.get("detail").and_then(|d| d.as_str()) {
            return Some(detail.to_string());
        }
        let object = value.as_object()?;
        let messages: Vec<String> = object
            .iter()
            .filter_map(|(field, errors)| {
                let first = match errors {
                    serde_json::Value::Array(items) => items.first()?.as_str()?.to_string(),
                    serde_json::Value::String(s) => s.clone(),
                    _ => return None,
                };
                Some(format!("{}: {}", field, first))
            })
            .collect();
        if messages.is_empty() {
            None
        } else {
            Some(messages.join("; "))
        }
    }

    /// Map the status to the crate error taxonomy, decoding the body on success
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T> {
        self.check_status()?;
        self.json()
    }

    /// Like `into_result` for endpoints whose body is irrelevant
    pub fn into_unit(self) -> Result<()> {
        self.check_status()
    }

    fn check_status(&self) -> Result<()> {
        if self.status.is_success() {
            return Ok(());
        }
        let message = self.error_message();
        let err = match self.status {
            StatusCode::UNAUTHORIZED => TaskmanError::authentication(
                message.unwrap_or_else(|| AUTH_REQUIRED_DETAIL.to_string()),
            ),
            StatusCode::FORBIDDEN => TaskmanError::subscription_required(
                message.unwrap_or_else(|| "Subscription required".to_string()),
            ),
            StatusCode::PAYMENT_REQUIRED => TaskmanError::payment_declined(
                message.unwrap_or_else(|| "Card declined".to_string()),
            ),
            status => TaskmanError::api(
                status.as_u16(),
                message.unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("Unknown API error")
                        .to_string()
                }),
            ),
        };
        Err(err)
    }
}

/// Base HTTP client for API operations
#[derive(Debug, Clone)]
pub struct BaseClient {
    client: Client,
    config: ClientConfig,
}

impl BaseClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut client_builder = Client::builder().timeout(Duration::from_secs(config.timeout));

        if !config.use_proxy {
            client_builder = client_builder.no_proxy();
        }

        let client = client_builder.build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send `request`, optionally as bearer `token`
    ///
    /// Caller headers are kept. `Content-Type: application/json` is added
    /// unless the caller set one or the body is multipart.
    pub async fn send(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<ApiResponse> {
        let url = self.config.endpoint_url(&request.url);
        debug!(method = %request.method, %url, "sending request");

        let mut headers = request.headers.clone();
        if let Some(token) = bearer {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| TaskmanError::authentication("Access token is not a valid header"))?;
            headers.insert(AUTHORIZATION, value);
        }
        if !headers.contains_key(CONTENT_TYPE) && !request.is_multipart() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        }

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .headers(headers);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.body(serde_json::to_vec(value)?),
            RequestBody::Multipart(form) => builder.multipart(form.to_form()?),
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        debug!(%status, bytes = body.len(), "response received");

        Ok(ApiResponse::new(status, headers, body))
    }

    /// Unauthenticated JSON call, e.g. login or the contact form
    pub async fn request<T>(&self, method: Method, endpoint: &str, payload: Option<&T>) -> Result<ApiResponse>
    where
        T: Serialize + ?Sized,
    {
        let mut request = ApiRequest::new(method, endpoint);
        if let Some(data) = payload {
            request = request.json(data)?;
        }
        self.send(&request, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> BaseClient {
        BaseClient::new(ClientConfig {
            api_base: server.uri(),
            ..ClientConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_synthetic_unauthenticated_response() {
        let response = ApiResponse::unauthenticated();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.is_synthetic());
        let body: serde_json::Value = response.json().unwrap();
        assert_eq!(body, json!({"detail": "Authentication required"}));
    }

    #[test]
    fn test_error_message_variants() {
        let detail = ApiResponse::new(
            StatusCode::BAD_REQUEST,
            HeaderMap::new(),
            br#"{"detail":"Invalid credentials."}"#.to_vec(),
        );
        assert_eq!(detail.error_message().as_deref(), Some("Invalid credentials."));

        let fields = ApiResponse::new(
            StatusCode::BAD_REQUEST,
            HeaderMap::new(),
            br#"{"old_password":["Incorrect password"]}"#.to_vec(),
        );
        assert_eq!(
            fields.error_message().as_deref(),
            Some("old_password: Incorrect password")
        );

        let html = ApiResponse::new(StatusCode::BAD_GATEWAY, HeaderMap::new(), b"<html>".to_vec());
        assert!(html.error_message().is_none());
    }

    #[test]
    fn test_status_mapping() {
        let forbidden = ApiResponse::new(
            StatusCode::FORBIDDEN,
            HeaderMap::new(),
            br#"{"detail":"Subscription required. Please subscribe to continue using tasks."}"#
                .to_vec(),
        );
        let err = forbidden.into_unit().unwrap_err();
        assert!(err.is_subscription_required());

        let err = ApiResponse::unauthenticated().into_unit().unwrap_err();
        assert!(err.is_auth_error());

        let declined = ApiResponse::new(
            StatusCode::PAYMENT_REQUIRED,
            HeaderMap::new(),
            br#"{"detail":"Card declined"}"#.to_vec(),
        );
        assert!(matches!(
            declined.into_unit().unwrap_err(),
            TaskmanError::Payment { .. }
        ));

        let missing = ApiResponse::new(StatusCode::NOT_FOUND, HeaderMap::new(), Vec::new());
        match missing.into_unit().unwrap_err() {
            TaskmanError::Api { status, message, .. } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_send_sets_bearer_and_default_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tasks/"))
            .and(query_param("due_date", "2025-03-01"))
            .and(header("authorization", "Bearer A1"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let request = ApiRequest::get("/api/tasks/").query("due_date", "2025-03-01");
        let response = client.send(&request, Some("A1")).await.unwrap();
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn test_send_keeps_caller_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/contact/"))
            .and(header("content-type", "text/plain"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let request = ApiRequest::post("/api/contact/")
            .header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        client.send(&request, None).await.unwrap().into_unit().unwrap();
    }

    #[tokio::test]
    async fn test_request_posts_json_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/password-reset/"))
            .and(body_json(json!({"email": "a@example.com"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"detail": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let response = client
            .request(
                Method::POST,
                "/api/auth/password-reset/",
                Some(&json!({"email": "a@example.com"})),
            )
            .await
            .unwrap();
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn test_multipart_omits_json_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/auth/profile/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let form = MultipartBody::new().file(
            "profile_picture",
            "me.png",
            vec![0x89, 0x50, 0x4e, 0x47],
            Some("image/png"),
        );
        let request = ApiRequest::patch("/api/auth/profile/").multipart(form);
        client.send(&request, Some("A1")).await.unwrap();

        let received = server.received_requests().await.unwrap();
        let content_type = received[0]
            .headers
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(content_type.starts_with("multipart/form-data"));
    }
}
