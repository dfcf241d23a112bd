//! Runtime settings.
//!
//! Sources, lowest priority first: built-in defaults, an optional
//! `litreview.toml` next to the binary, then `LITREVIEW_*` environment
//! variables (a `.env` file is loaded into the environment beforehand).

use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Directory uploaded images are written to
    pub media_root: String,
    /// Public URL path the media directory is served under
    pub media_url_prefix: String,
    /// Largest accepted image upload, in bytes
    pub max_upload_bytes: usize,
}

impl Settings {
    pub fn load() -> anyhow::Result<Self> {
        let settings = Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080)?
            .set_default("database_url", "sqlite:litreview.db")?
            .set_default("media_root", "./data/uploads")?
            .set_default("media_url_prefix", "/media")?
            .set_default("max_upload_bytes", 5 * 1024 * 1024)?
            .add_source(File::with_name("litreview").required(false))
            .add_source(Environment::with_prefix("LITREVIEW"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
