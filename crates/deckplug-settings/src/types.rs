//! Runtime settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for one plugin process.
///
/// Field names are camelCase on disk. Missing fields take their default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeSettings {
    /// Host the application listens on.
    pub host: String,
    /// Upper bound on how long `close()` waits for the read loop to finish.
    pub close_timeout_ms: u64,
    /// Per-handler execution bound. Unbounded when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler_timeout_ms: Option<u64>,
    /// Relay handler batch failures to the host's plugin log.
    pub report_handler_errors: bool,
    /// Filter for the stderr subscriber `Client::run` installs when no
    /// dispatch is injected. `RUST_LOG` takes precedence.
    pub log_level: String,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            close_timeout_ms: 1000,
            handler_timeout_ms: None,
            report_handler_errors: true,
            log_level: "warn".to_string(),
        }
    }
}

impl RuntimeSettings {
    /// Close bound as a [`Duration`].
    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }

    /// Handler bound as a [`Duration`], if configured.
    pub fn handler_timeout(&self) -> Option<Duration> {
        self.handler_timeout_ms.map(Duration::from_millis)
    }

    /// WebSocket endpoint for `port`.
    pub fn endpoint(&self, port: u16) -> String {
        format!("ws://{}:{port}", self.host)
    }
}
