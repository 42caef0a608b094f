use clap::Parser;
use std::path::PathBuf;

use crate::artifacts::ArtifactPaths;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Server host to bind to
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Server port to bind to
    #[arg(long, env = "PORT", default_value = "8000")]
    pub port: u16,

    /// Directory holding the serialized pipelines and the background dataset
    #[arg(long, env = "MODELS_DIR", default_value = "models")]
    pub models_dir: PathBuf,

    /// Directory holding `templates/index.html` and the `static/` assets
    #[arg(long, env = "WEB_DIR", default_value = ".")]
    pub web_dir: PathBuf,

    /// Largest accepted batch upload, in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value = "10485760")]
    pub max_upload_bytes: usize,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,
}

impl Config {
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::in_dir(&self.models_dir)
    }

    pub fn index_page(&self) -> PathBuf {
        self.web_dir.join("templates").join("index.html")
    }

    pub fn static_dir(&self) -> PathBuf {
        self.web_dir.join("static")
    }
}
