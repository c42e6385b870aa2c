use serde::{Deserialize, Serialize};

/// Gateway connection settings as stored in a JSON configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfigFile {
    pub host: String,
    /// Port used by every example unless overridden
    pub default_port: u16,
    /// Port used by the historical-data example unless overridden
    pub historical_data_port: u16,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    1000
}

impl GatewayConfigFile {
    /// Options for a session on the default port
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            host: self.host.clone(),
            port: self.default_port,
            channel_capacity: self.channel_capacity,
        }
    }

    /// Options for a historical-data session
    pub fn historical_session_options(&self) -> SessionOptions {
        SessionOptions {
            port: self.historical_data_port,
            ..self.session_options()
        }
    }
}

/// Immutable settings for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub host: String,
    pub port: u16,
    /// Inbound event buffer size
    pub channel_capacity: usize,
}

impl SessionOptions {
    pub const DEFAULT_HOST: &'static str = "localhost";
    pub const DEFAULT_PORT: u16 = 8194;

    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            channel_capacity: default_channel_capacity(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HOST, Self::DEFAULT_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_options_builders() {
        let options = SessionOptions::default().with_host("gw1").with_port(9000);
        assert_eq!(options.address(), "gw1:9000");
        assert_eq!(SessionOptions::default().address(), "localhost:8194");
    }
}
