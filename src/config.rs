use std::path::PathBuf;

use clap::Args;

/// Server settings, from command-line flags or `QUESTLINES_*` environment
/// variables.
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "QUESTLINES_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port for the HTTP API and frontend
    #[arg(short, long, env = "QUESTLINES_PORT", default_value_t = 8080)]
    pub port: u16,

    /// SQLite database file (defaults to the platform data directory)
    #[arg(long, env = "QUESTLINES_DB")]
    pub db: Option<PathBuf>,

    /// Directory holding the built frontend
    #[arg(long, env = "QUESTLINES_STATIC_DIR", default_value = "frontend/dist")]
    pub static_dir: PathBuf,

    /// Path prefix for the JSON API
    #[arg(long, env = "QUESTLINES_API_BASE", default_value = "/api")]
    pub api_base: String,

    /// Allowed CORS origin; repeat for several
    #[arg(
        long = "cors-origin",
        env = "QUESTLINES_CORS_ORIGINS",
        value_delimiter = ','
    )]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            db: None,
            static_dir: PathBuf::from("frontend/dist"),
            api_base: "/api".into(),
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// API prefix with a leading slash and no trailing slash; empty means root.
    pub fn api_prefix(&self) -> String {
        let trimmed = self.api_base.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }

    /// Configured origins, or the dev server and this server when none are set.
    pub fn allowed_origins(&self) -> Vec<String> {
        if !self.cors_origins.is_empty() {
            return self.cors_origins.clone();
        }
        vec![
            "http://localhost:3000".to_string(),
            format!("http://localhost:{}", self.port),
        ]
    }
}
