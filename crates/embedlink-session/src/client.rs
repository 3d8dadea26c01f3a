use std::fmt;

use embedlink_token::{ExecutionContext, Secret};
use reqwest::{Client, Method};
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use crate::config::{AuthStyle, SessionClientConfig, UpdateMethod};
use crate::error::{Result, SessionError};
use crate::params::{AcceptableParameters, CreateSession};

/// A session API call, planned but not sent.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRequest {
    pub method: Method,
    pub url: String,
    pub body: Value,
}

/// A successful session API response.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResponse {
    pub status: u16,
    /// Response body as JSON; a non-JSON body is returned as a string, an
    /// empty one as `Null`.
    pub body: Value,
}

/// Server-side client for the store session API.
///
/// Every call refuses to run in a browser-like [`ExecutionContext`]; unlike
/// token minting there is no override. Requests are sent once, with no
/// retries.
pub struct SessionClient {
    http: Client,
    api_key: Secret,
    config: SessionClientConfig,
    execution: ExecutionContext,
}

impl SessionClient {
    pub fn new(api_key: impl Into<Secret>, config: SessionClientConfig) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(SessionError::EmptyApiKey);
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("embedlink/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_key,
            config,
            execution: ExecutionContext::detect(),
        })
    }

    /// Override the detected execution context.
    pub fn with_execution_context(mut self, execution: ExecutionContext) -> Self {
        self.execution = execution;
        self
    }

    pub fn config(&self) -> &SessionClientConfig {
        &self.config
    }

    /// Plan a session creation.
    pub fn plan_create(&self, request: &CreateSession) -> Result<SessionRequest> {
        self.plan(Method::POST, serde_json::to_value(request)?)
    }

    /// Plan a session data update.
    pub fn plan_update(
        &self,
        session_id: &str,
        data: &AcceptableParameters,
    ) -> Result<SessionRequest> {
        let method = match self.config.update_method {
            UpdateMethod::Patch => Method::PATCH,
            UpdateMethod::Put => Method::PUT,
        };
        self.plan(method, json!({ "sessionId": session_id, "data": data }))
    }

    /// Plan a session revocation.
    pub fn plan_revoke(&self, session_id: &str) -> Result<SessionRequest> {
        self.plan(Method::DELETE, json!({ "sessionId": session_id }))
    }

    /// Create a session.
    pub async fn create(&self, request: &CreateSession) -> Result<SessionResponse> {
        self.execution.ensure_server("session create")?;
        let planned = self.plan_create(request)?;
        self.send(planned).await
    }

    /// Replace a session's data.
    pub async fn update(
        &self,
        session_id: &str,
        data: &AcceptableParameters,
    ) -> Result<SessionResponse> {
        self.execution.ensure_server("session update")?;
        let planned = self.plan_update(session_id, data)?;
        self.send(planned).await
    }

    /// Revoke a session.
    pub async fn revoke(&self, session_id: &str) -> Result<SessionResponse> {
        self.execution.ensure_server("session revoke")?;
        let planned = self.plan_revoke(session_id)?;
        self.send(planned).await
    }

    fn plan(&self, method: Method, body: Value) -> Result<SessionRequest> {
        let endpoint = self.config.endpoint();
        let url = Url::parse(&endpoint).map_err(|source| SessionError::InvalidUrl {
            url: endpoint.clone(),
            source,
        })?;
        Ok(SessionRequest {
            method,
            url: url.into(),
            body,
        })
    }

    async fn send(&self, request: SessionRequest) -> Result<SessionResponse> {
        let builder = self
            .http
            .request(request.method.clone(), &request.url)
            .json(&request.body);
        let builder = match &self.config.auth {
            AuthStyle::Bearer => builder.bearer_auth(self.api_key.expose()),
            AuthStyle::Header(name) => builder.header(name.as_str(), self.api_key.expose()),
        };

        debug!(method = %request.method, url = %request.url, "sending session request");
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(method = %request.method, status = status.as_u16(), "session request rejected");
            return Err(SessionError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        Ok(SessionResponse {
            status: status.as_u16(),
            body,
        })
    }
}

impl fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionClient")
            .field("api_key", &self.api_key)
            .field("config", &self.config)
            .field("execution", &self.execution)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Purchase;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    struct Captured {
        head: String,
        body: Value,
    }

    /// Accept one connection, capture the request, answer with `status` and
    /// `reply`.
    async fn serve_once(status: u16, reply: &'static str) -> (String, JoinHandle<Captured>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            let (head_end, content_length) = loop {
                let n = stream.read(&mut chunk).await.unwrap();
                assert!(n > 0, "client closed before sending headers");
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&buf[..pos]).to_ascii_lowercase();
                    let length = head
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .map(|v| v.trim().parse::<usize>().unwrap())
                        .unwrap_or(0);
                    break (pos + 4, length);
                }
            };
            while buf.len() < head_end + content_length {
                let n = stream.read(&mut chunk).await.unwrap();
                assert!(n > 0, "client closed before sending body");
                buf.extend_from_slice(&chunk[..n]);
            }

            let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
            let body = serde_json::from_slice(&buf[head_end..head_end + content_length])
                .unwrap_or(Value::Null);

            let response = format!(
                "HTTP/1.1 {status} Test\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{reply}",
                reply.len(),
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;
            Captured { head, body }
        });

        (format!("http://{addr}"), handle)
    }

    fn client(base_url: &str, config: SessionClientConfig) -> SessionClient {
        SessionClient::new(
            "hunter2",
            SessionClientConfig {
                base_url: base_url.to_string(),
                ..config
            },
        )
        .unwrap()
        .with_execution_context(ExecutionContext::Server)
    }

    #[test]
    fn plans_match_wire_contract() {
        let client = client("https://api.example/v1", SessionClientConfig::default());

        let create = client
            .plan_create(&CreateSession {
                store_id: Some("s".into()),
                domain: Some("shop.example".into()),
                data: AcceptableParameters {
                    user_id: Some("u".into()),
                    purchases: Some(vec![Purchase::Listing("l".into())]),
                    ..AcceptableParameters::default()
                },
            })
            .unwrap();
        assert_eq!(create.method, Method::POST);
        assert_eq!(create.url, "https://api.example/v1");
        assert_eq!(
            create.body,
            json!({"storeId": "s", "domain": "shop.example", "data": {"userId": "u", "purchases": ["l"]}})
        );

        let update = client
            .plan_update("sess-1", &AcceptableParameters::default())
            .unwrap();
        assert_eq!(update.method, Method::PATCH);
        assert_eq!(update.body, json!({"sessionId": "sess-1", "data": {}}));

        let revoke = client.plan_revoke("sess-1").unwrap();
        assert_eq!(revoke.method, Method::DELETE);
        assert_eq!(revoke.body, json!({"sessionId": "sess-1"}));
    }

    #[test]
    fn put_update_method_is_honoured() {
        let client = client(
            "https://api.example/v1",
            SessionClientConfig {
                update_method: UpdateMethod::Put,
                ..SessionClientConfig::default()
            },
        );
        let update = client
            .plan_update("sess-1", &AcceptableParameters::default())
            .unwrap();
        assert_eq!(update.method, Method::PUT);
    }

    #[test]
    fn invalid_endpoint_is_reported() {
        let client = client("not a url", SessionClientConfig::default());
        assert!(matches!(
            client.plan_revoke("s"),
            Err(SessionError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn empty_api_key_is_rejected() {
        assert!(matches!(
            SessionClient::new("", SessionClientConfig::default()),
            Err(SessionError::EmptyApiKey)
        ));
    }

    #[test]
    fn debug_redacts_api_key() {
        let client = client("https://api.example/v1", SessionClientConfig::default());
        let debug = format!("{client:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted:7 bytes>"));
    }

    #[tokio::test]
    async fn create_posts_json_with_bearer_auth() {
        let (base_url, server) = serve_once(201, r#"{"sessionId":"sess-42"}"#).await;
        let client = client(&base_url, SessionClientConfig::default());

        let response = client
            .create(&CreateSession {
                store_id: Some("store-1".into()),
                domain: None,
                data: AcceptableParameters {
                    user_id: Some("u-1".into()),
                    ..AcceptableParameters::default()
                },
            })
            .await
            .unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.body, json!({"sessionId": "sess-42"}));

        let captured = server.await.unwrap();
        assert!(captured.head.starts_with("POST / HTTP/1.1"));
        assert!(captured
            .head
            .to_ascii_lowercase()
            .contains("authorization: bearer hunter2"));
        assert_eq!(
            captured.body,
            json!({"storeId": "store-1", "data": {"userId": "u-1"}})
        );
    }

    #[tokio::test]
    async fn update_uses_named_header_and_resource_path() {
        let (base_url, server) = serve_once(204, "").await;
        let client = client(
            &base_url,
            SessionClientConfig {
                resource_path: "sessions".into(),
                auth: AuthStyle::Header("x-api-key".into()),
                ..SessionClientConfig::default()
            },
        );

        let response = client
            .update("sess-1", &AcceptableParameters::default())
            .await
            .unwrap();
        assert_eq!(response.status, 204);
        assert_eq!(response.body, Value::Null);

        let captured = server.await.unwrap();
        assert!(captured.head.starts_with("PATCH /sessions HTTP/1.1"));
        assert!(captured.head.to_ascii_lowercase().contains("x-api-key: hunter2"));
        assert_eq!(captured.body, json!({"sessionId": "sess-1", "data": {}}));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let (base_url, server) = serve_once(401, r#"{"error":"bad key"}"#).await;
        let client = client(&base_url, SessionClientConfig::default());

        let err = client.revoke("sess-1").await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Status { status: 401, ref body } if body.contains("bad key")
        ));

        let captured = server.await.unwrap();
        assert!(captured.head.starts_with("DELETE / HTTP/1.1"));
        assert_eq!(captured.body, json!({"sessionId": "sess-1"}));
    }

    #[tokio::test]
    async fn browser_context_is_refused_without_io() {
        let client = client("http://127.0.0.1:9", SessionClientConfig::default())
            .with_execution_context(ExecutionContext::Browser);

        let create = client.create(&CreateSession::default()).await;
        assert!(matches!(create, Err(SessionError::InsecureContext(_))));
        let update = client.update("s", &AcceptableParameters::default()).await;
        assert!(matches!(update, Err(SessionError::InsecureContext(_))));
        let revoke = client.revoke("s").await;
        assert!(matches!(revoke, Err(SessionError::InsecureContext(_))));
    }
}
