use serde::{Deserialize, Serialize};

/// HTTP host settings, read from `modules.api_ingress`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiIngressConfig {
    /// `host:port`; falls back to `server.host:server.port` when unset.
    pub bind_addr: Option<String>,
    pub enable_docs: bool,
    pub cors_enabled: bool,
    pub request_timeout_sec: u64,
    pub body_limit_bytes: usize,
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            bind_addr: None,
            enable_docs: true,
            cors_enabled: false,
            request_timeout_sec: 30,
            body_limit_bytes: 16 * 1024 * 1024,
        }
    }
}

impl ApiIngressConfig {
    pub const MODULE_NAME: &'static str = "api_ingress";

    /// Module section of the app config, or defaults when it is absent.
    pub fn from_app_config(app: &runtime::AppConfig) -> anyhow::Result<Self> {
        Ok(app
            .module_config::<Self>(Self::MODULE_NAME)?
            .unwrap_or_default())
    }

    pub fn resolve_bind_addr(&self, app: &runtime::AppConfig) -> String {
        self.bind_addr
            .clone()
            .unwrap_or_else(|| format!("{}:{}", app.server.host, app.server.port))
    }
}
