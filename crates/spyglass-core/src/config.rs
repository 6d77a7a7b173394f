use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::ProxyError;

/// Account authentication flow used when opening the upstream connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    Mojang,
    Microsoft,
}

#[derive(Debug, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub proxy: ProxySection,
    #[serde(default)]
    pub upstream: UpstreamSection,
    #[serde(default)]
    pub tracking: TrackingSection,
}

#[derive(Debug, Deserialize)]
pub struct ProxySection {
    #[serde(default = "default_listen_port")]
    pub port: u16,
    #[serde(default = "default_auth")]
    pub auth: AuthMode,
}

#[derive(Debug, Deserialize)]
pub struct UpstreamSection {
    #[serde(default = "default_upstream_host")]
    pub host: String,
    #[serde(default = "default_upstream_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct TrackingSection {
    /// Delay before a tab-list add is trusted as a real join, in
    /// milliseconds. Tuned against the upstream's pre-game packet burst.
    #[serde(default = "default_join_delay_ms")]
    pub join_delay_ms: u64,
}

fn default_listen_port() -> u16 {
    25566
}

fn default_auth() -> AuthMode {
    AuthMode::Mojang
}

fn default_upstream_host() -> String {
    "mc.hypixel.net".into()
}

fn default_upstream_port() -> u16 {
    25565
}

fn default_join_delay_ms() -> u64 {
    4
}

impl Default for ProxySection {
    fn default() -> Self {
        Self {
            port: default_listen_port(),
            auth: default_auth(),
        }
    }
}

impl Default for UpstreamSection {
    fn default() -> Self {
        Self {
            host: default_upstream_host(),
            port: default_upstream_port(),
        }
    }
}

impl Default for TrackingSection {
    fn default() -> Self {
        Self {
            join_delay_ms: default_join_delay_ms(),
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            proxy: ProxySection::default(),
            upstream: UpstreamSection::default(),
            tracking: TrackingSection::default(),
        }
    }
}

impl TrackingSection {
    pub fn join_delay(&self) -> Duration {
        Duration::from_millis(self.join_delay_ms)
    }
}

impl ProxyConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ProxyError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
            [proxy]
            port = 25567
            auth = "microsoft"

            [upstream]
            host = "play.example.net"
            port = 25570

            [tracking]
            join_delay_ms = 10
        "#;
        let config: ProxyConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.proxy.port, 25567);
        assert_eq!(config.proxy.auth, AuthMode::Microsoft);
        assert_eq!(config.upstream.host, "play.example.net");
        assert_eq!(config.upstream.port, 25570);
        assert_eq!(config.tracking.join_delay(), Duration::from_millis(10));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: ProxyConfig = toml::from_str("").unwrap();
        assert_eq!(config.proxy.port, 25566);
        assert_eq!(config.proxy.auth, AuthMode::Mojang);
        assert_eq!(config.upstream.host, "mc.hypixel.net");
        assert_eq!(config.upstream.port, 25565);
        assert_eq!(config.tracking.join_delay_ms, 4);
    }

    #[test]
    fn rejects_unknown_auth_mode() {
        let toml_str = r#"
            [proxy]
            auth = "offline"
        "#;
        assert!(toml::from_str::<ProxyConfig>(toml_str).is_err());
    }
}
