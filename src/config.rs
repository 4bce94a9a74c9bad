// src/config.rs - Environment-backed configuration, read once at startup.
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Where the chat client POSTs. Defaults to this service's own /relay
    /// route so a single process is self-contained.
    pub relay_url: String,
    pub model: String,
    /// Upstream provider key, used only by the relay route. When absent the
    /// relay route is not mounted and an external relay must be configured.
    pub openai_api_key: Option<String>,
    pub data_dir: PathBuf,
    pub products_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let relay_url = std::env::var("RELAY_URL")
            .unwrap_or_else(|_| format!("http://127.0.0.1:{}/relay", port));

        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        let data_dir = std::env::var("GLOW_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        let products_path = std::env::var("PRODUCTS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("products.json"));

        Self {
            port,
            relay_url,
            model,
            openai_api_key,
            data_dir,
            products_path,
        }
    }
}
