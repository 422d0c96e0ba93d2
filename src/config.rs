//! Configuration types for report-dispatch

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Main configuration for [`ReportDispatcher`](crate::ReportDispatcher)
///
/// Fields are organized into logical sub-configs:
/// - [`backend`](BackendConfig): school backend (generator, registry, directory)
/// - [`smtp`](SmtpConfig): outgoing mail server (optional)
/// - [`email`](EmailConfig): subject/body templates, send concurrency
/// - [`persistence`](PersistenceConfig): email history database
/// - [`server`](ServerIntegrationConfig): REST API
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// School backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// SMTP settings. When absent, sends fail with a "not configured" reason.
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,

    /// Email content and distribution settings
    #[serde(default)]
    pub email: EmailConfig,

    /// Data storage settings
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// API and external server integration
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Check settings that cannot be expressed through serde defaults
    ///
    /// Rejects an unparseable backend URL, a zero send concurrency, and an SMTP
    /// section without a sender address.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.backend.base_url).map_err(|e| Error::Config {
            message: format!("invalid backend URL '{}': {}", self.backend.base_url, e),
            key: Some("backend.base_url".to_string()),
        })?;

        if self.email.max_concurrent_sends == 0 {
            return Err(Error::Config {
                message: "max_concurrent_sends must be at least 1".to_string(),
                key: Some("email.max_concurrent_sends".to_string()),
            });
        }

        if let Some(smtp) = &self.smtp
            && smtp.from_address.trim().is_empty()
        {
            return Err(Error::Config {
                message: "SMTP sender address is required".to_string(),
                key: Some("smtp.from_address".to_string()),
            });
        }

        Ok(())
    }
}

/// School backend connection settings
///
/// The backend hosts the document generator, the artifact registry and the
/// student directory behind one base URL.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct BackendConfig {
    /// Base URL of the backend REST API (default: "http://localhost:8000/api")
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Bearer token sent with every request
    #[serde(default)]
    pub api_token: Option<String>,

    /// Per-request timeout (default: 60 seconds)
    ///
    /// Generation batches can take a while; the generator is called once per batch.
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Lifetime requested for signed artifact URLs (default: 1 hour)
    #[serde(default = "default_signed_url_ttl", with = "duration_serde")]
    pub signed_url_ttl: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            api_token: None,
            request_timeout: default_request_timeout(),
            signed_url_ttl: default_signed_url_ttl(),
        }
    }
}

/// Outgoing mail server configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SmtpConfig {
    /// SMTP server hostname
    pub host: String,

    /// SMTP port (default: 587)
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// Use implicit TLS (true) or STARTTLS (false, default)
    #[serde(default)]
    pub use_tls: bool,

    /// Username for SMTP authentication
    #[serde(default)]
    pub username: Option<String>,

    /// Password for SMTP authentication
    #[serde(default)]
    pub password: Option<String>,

    /// Sender address
    pub from_address: String,

    /// Sender display name
    #[serde(default)]
    pub from_name: Option<String>,
}

/// Email content and distribution settings
///
/// Templates accept the placeholders `{student_name}`, `{term}`,
/// `{report_kind}` (lowercase label) and `{report_title}` (title case).
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct EmailConfig {
    /// Default subject when the request does not override it
    #[serde(default = "default_subject_template")]
    pub subject_template: String,

    /// Fixed body; the request's addendum is appended after it
    #[serde(default = "default_body_template")]
    pub body_template: String,

    /// Maximum concurrent mailer calls during a bulk send (default: 4)
    #[serde(default = "default_max_concurrent_sends")]
    pub max_concurrent_sends: usize,

    /// Timeout for downloading an artifact to attach (default: 30 seconds)
    #[serde(default = "default_attachment_timeout", with = "duration_serde")]
    pub attachment_timeout: Duration,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            subject_template: default_subject_template(),
            body_template: default_body_template(),
            max_concurrent_sends: default_max_concurrent_sends(),
            attachment_timeout: default_attachment_timeout(),
        }
    }
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PersistenceConfig {
    /// Email history database path (default: "report-dispatch.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// API and external server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:6790)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Optional API key for authentication
    #[serde(default)]
    pub api_key: Option<String>,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            api_key: None,
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

// Default value functions
fn default_backend_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_signed_url_ttl() -> Duration {
    Duration::from_secs(3600)
}

fn default_smtp_port() -> u16 {
    587
}

fn default_subject_template() -> String {
    "{report_title} for {student_name} - {term}".to_string()
}

fn default_body_template() -> String {
    "Dear Parent/Guardian,\n\n\
     Please find attached the {report_kind} for {student_name} for {term}.\n\n\
     If you have any questions, please contact the school office."
        .to_string()
}

fn default_max_concurrent_sends() -> usize {
    4
}

fn default_attachment_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_database_path() -> PathBuf {
    PathBuf::from("report-dispatch.db")
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6790))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let config: Config = serde_json::from_str("{}").expect("deserialize failed");

        assert_eq!(config.backend.base_url, "http://localhost:8000/api");
        assert_eq!(config.backend.request_timeout, Duration::from_secs(60));
        assert!(config.smtp.is_none());
        assert_eq!(config.email.max_concurrent_sends, 4);
        assert_eq!(
            config.persistence.database_path,
            PathBuf::from("report-dispatch.db")
        );
        assert!(config.server.api.cors_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn durations_serialize_as_seconds() {
        let json = r#"{"backend": {"request_timeout": 5, "signed_url_ttl": 120}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.backend.request_timeout, Duration::from_secs(5));
        assert_eq!(config.backend.signed_url_ttl, Duration::from_secs(120));

        let back = serde_json::to_value(&config).unwrap();
        assert_eq!(back["backend"]["request_timeout"], 5);
    }

    #[test]
    fn smtp_section_parses_with_port_default() {
        let json = r#"{"smtp": {"host": "smtp.school.edu", "from_address": "office@school.edu"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        let smtp = config.smtp.unwrap();
        assert_eq!(smtp.port, 587);
        assert!(!smtp.use_tls);
        assert!(smtp.username.is_none());
    }

    #[test]
    fn validate_rejects_bad_backend_url() {
        let mut config = Config::default();
        config.backend.base_url = "not a url".to_string();

        match config.validate() {
            Err(Error::Config { key, .. }) => {
                assert_eq!(key.as_deref(), Some("backend.base_url"))
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.email.max_concurrent_sends = 0;
        assert!(matches!(
            config.validate(),
            Err(Error::Config { key: Some(k), .. }) if k == "email.max_concurrent_sends"
        ));
    }

    #[test]
    fn validate_rejects_smtp_without_sender() {
        let config = Config {
            smtp: Some(SmtpConfig {
                host: "smtp.school.edu".into(),
                port: 587,
                use_tls: false,
                username: None,
                password: None,
                from_address: "  ".into(),
                from_name: None,
            }),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::Config { key: Some(k), .. }) if k == "smtp.from_address"
        ));
    }
}
