use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Gateway configuration for the HTTP surface and local staging
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Bind host (default: "0.0.0.0")
    pub host: String,

    /// Listen port (default: 8080)
    pub port: u16,

    /// Maximum multipart form size in bytes, also the staging limit (default: 10 MB)
    pub max_form_size: usize,

    /// Directory staged uploads are written to (default: OS temp dir)
    pub staging_dir: PathBuf,

    /// Deadline applied to client init, upload and delete (default: 30s)
    pub backend_timeout: Duration,

    /// Directory holding index.html and assets/ (default: "web")
    pub web_root: PathBuf,

    pub s3: S3Config,
}

/// Connection settings for the object-storage backend
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Custom endpoint, e.g. a MinIO instance
    pub endpoint: Option<String>,

    /// Region (default: "us-east-1")
    pub region: String,

    /// Target bucket. Left unset, every request reports a client init error.
    pub bucket: Option<String>,

    pub access_key: Option<String>,
    pub secret_key: Option<String>,

    /// Named AWS profile used when no static credentials are given
    pub profile: Option<String>,

    /// Path-style addressing (default: true)
    pub force_path_style: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: "us-east-1".to_string(),
            bucket: None,
            access_key: None,
            secret_key: None,
            profile: None,
            force_path_style: true,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_form_size: 10 * 1024 * 1024, // 10 MB
            staging_dir: env::temp_dir(),
            backend_timeout: Duration::from_secs(30),
            web_root: PathBuf::from("web"),
            s3: S3Config::default(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            host: env::var("HOST").unwrap_or(default.host),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            max_form_size: env::var("MAX_FORM_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_form_size),

            staging_dir: non_empty_var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.staging_dir),

            backend_timeout: env::var("BACKEND_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.backend_timeout),

            web_root: non_empty_var("WEB_ROOT")
                .map(PathBuf::from)
                .unwrap_or(default.web_root),

            s3: S3Config::from_env(),
        }
    }
}

impl S3Config {
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            endpoint: non_empty_var("S3_ENDPOINT"),
            region: non_empty_var("S3_REGION").unwrap_or(default.region),
            bucket: non_empty_var("S3_BUCKET"),
            access_key: non_empty_var("S3_ACCESS_KEY"),
            secret_key: non_empty_var("S3_SECRET_KEY"),
            profile: non_empty_var("S3_PROFILE"),
            force_path_style: env::var("S3_FORCE_PATH_STYLE")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(default.force_path_style),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
