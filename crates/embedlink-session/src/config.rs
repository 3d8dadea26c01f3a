use std::time::Duration;

/// Production session API endpoint.
pub const DEFAULT_API_URL: &str = "https://integrations.store/api/v1";

/// How the API key is sent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>`.
    #[default]
    Bearer,
    /// `<name>: <key>`.
    Header(String),
}

/// HTTP method used for session updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMethod {
    #[default]
    Patch,
    Put,
}

/// Controls the session API client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClientConfig {
    /// API root.
    pub base_url: String,
    /// Path of the session resource below `base_url`. Empty means the root.
    pub resource_path: String,
    pub auth: AuthStyle,
    pub update_method: UpdateMethod,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for SessionClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            resource_path: String::new(),
            auth: AuthStyle::default(),
            update_method: UpdateMethod::default(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl SessionClientConfig {
    /// `base_url` joined with `resource_path`.
    pub fn endpoint(&self) -> String {
        if self.resource_path.is_empty() {
            return self.base_url.clone();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.resource_path.trim_start_matches('/')
        )
    }
}
