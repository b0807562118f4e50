use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::ServerConfig;
use crate::storage::StorageConfig;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<StorageConfig>,
    /// Token clients must present; `None` refuses every request
    pub auth_token: Option<Arc<str>>,
    pub cors_origin: Arc<str>,
    /// Serializes writes to the snapshot file
    pub write_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(storage: StorageConfig, server: &ServerConfig) -> Self {
        Self {
            storage: Arc::new(storage),
            auth_token: server
                .auth_token
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(Arc::from),
            cors_origin: Arc::from(server.cors_origin.as_str()),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Whether `presented` matches the configured token.
    pub fn accepts(&self, presented: &str) -> bool {
        matches!(&self.auth_token, Some(expected) if expected.as_ref() == presented)
    }

    #[cfg(test)]
    pub(crate) fn for_tests(data_dir: &std::path::Path, auth_token: Option<&str>) -> Self {
        let server = ServerConfig {
            auth_token: auth_token.map(str::to_string),
            ..ServerConfig::default()
        };
        Self::new(StorageConfig::new(data_dir.to_path_buf()), &server)
    }
}
