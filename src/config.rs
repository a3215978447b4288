//! Server configuration loaded from the command line and environment.
//!
//! The only command-line input is an optional positional port. Everything
//! else comes from environment variables (or a `.env` file via `dotenvy`),
//! and every value falls back to a default when missing or unparseable.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::error::ProbeError;

/// Port used when neither the command line nor `PROBE_PORT` provide one.
pub const DEFAULT_PORT: u16 = 8080;

/// Default connection-lost interval in seconds.
pub const DEFAULT_KEEPALIVE_SECS: u64 = 100;

/// Largest accepted connection-lost interval (one day).
pub const MAX_KEEPALIVE_SECS: u64 = 86_400;

/// Top-level server configuration.
///
/// Loaded once at startup via [`ServerConfig::load`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind on. Defaults to all interfaces.
    pub host: IpAddr,

    /// TCP port to listen on.
    pub port: u16,

    /// Connection-lost check interval. [`Duration::ZERO`] disables it.
    pub keepalive: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            keepalive: Duration::from_secs(DEFAULT_KEEPALIVE_SECS),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from the environment, then applies the
    /// positional port from `args` (program name already stripped).
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Config`] if `PROBE_HOST` is set but is not a
    /// valid IP address.
    pub fn load<I, S>(args: I) -> Result<Self, ProbeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        dotenvy::dotenv().ok();
        Self::from_lookup(args, |key| std::env::var(key).ok())
    }

    /// Builds the configuration from `args` and a variable lookup.
    ///
    /// A valid positional port wins over `PROBE_PORT`, which wins over
    /// [`DEFAULT_PORT`]. `PROBE_KEEPALIVE_SECS` above
    /// [`MAX_KEEPALIVE_SECS`] is treated as invalid.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Config`] if `PROBE_HOST` is set but is not a
    /// valid IP address.
    pub fn from_lookup<I, S, F>(args: I, lookup: F) -> Result<Self, ProbeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&str) -> Option<String>,
    {
        let host = match lookup("PROBE_HOST") {
            Some(raw) => raw
                .parse::<IpAddr>()
                .map_err(|e| ProbeError::Config(format!("PROBE_HOST={raw}: {e}")))?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        let default_port = parse_var(&lookup, "PROBE_PORT").unwrap_or(DEFAULT_PORT);
        let keepalive_secs = parse_var(&lookup, "PROBE_KEEPALIVE_SECS")
            .filter(|secs| *secs <= MAX_KEEPALIVE_SECS)
            .unwrap_or(DEFAULT_KEEPALIVE_SECS);

        Ok(Self {
            host,
            port: port_from_args(args, default_port),
            keepalive: Duration::from_secs(keepalive_secs),
        })
    }

    /// Socket address the listener binds to.
    #[must_use]
    pub const fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Reads the first positional argument as a port, returning `default` when
/// it is absent or not a valid port number.
pub fn port_from_args<I, S>(args: I, default: u16) -> u16
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter()
        .next()
        .and_then(|arg| arg.as_ref().trim().parse().ok())
        .unwrap_or(default)
}

/// Looks up `key` and parses it as `T`, returning `None` on missing or
/// invalid values.
fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load_with(args: &[&str], vars: &[(&str, &str)]) -> Result<ServerConfig, ProbeError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ServerConfig::from_lookup(args.iter().copied(), |key| vars.get(key).cloned())
    }

    fn loaded(args: &[&str], vars: &[(&str, &str)]) -> ServerConfig {
        let Ok(config) = load_with(args, vars) else {
            panic!("config should load for {args:?} {vars:?}");
        };
        config
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = loaded(&[], &[]);
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.keepalive, Duration::from_secs(DEFAULT_KEEPALIVE_SECS));
    }

    #[test]
    fn cli_port_overrides_env_port() {
        assert_eq!(loaded(&["9090"], &[("PROBE_PORT", "7070")]).port, 9090);
    }

    #[test]
    fn unparseable_cli_port_falls_back_to_env_port() {
        assert_eq!(loaded(&["abc"], &[("PROBE_PORT", "7070")]).port, 7070);
        assert_eq!(loaded(&["abc"], &[]).port, DEFAULT_PORT);
    }

    #[test]
    fn unparseable_env_port_falls_back_to_default() {
        assert_eq!(loaded(&[], &[("PROBE_PORT", "nope")]).port, DEFAULT_PORT);
    }

    #[test]
    fn host_is_read_from_env() {
        let config = loaded(&[], &[("PROBE_HOST", "127.0.0.1")]);
        assert_eq!(config.host, IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[test]
    fn invalid_host_is_config_error() {
        assert!(matches!(
            load_with(&[], &[("PROBE_HOST", "not-an-ip")]),
            Err(ProbeError::Config(_))
        ));
    }

    #[test]
    fn zero_keepalive_disables_detection() {
        let config = loaded(&[], &[("PROBE_KEEPALIVE_SECS", "0")]);
        assert!(config.keepalive.is_zero());
    }

    #[test]
    fn keepalive_is_read_from_env() {
        let config = loaded(&[], &[("PROBE_KEEPALIVE_SECS", "30")]);
        assert_eq!(config.keepalive, Duration::from_secs(30));
    }

    #[test]
    fn invalid_keepalive_falls_back_to_default() {
        let default = Duration::from_secs(DEFAULT_KEEPALIVE_SECS);
        for raw in ["soon", "-5", "18446744073709551615", "86401"] {
            let config = loaded(&[], &[("PROBE_KEEPALIVE_SECS", raw)]);
            assert_eq!(config.keepalive, default, "{raw} should fall back");
        }
    }

    #[test]
    fn port_argument_overrides_default() {
        assert_eq!(port_from_args(["9090"], DEFAULT_PORT), 9090);
    }

    #[test]
    fn unparseable_port_falls_back() {
        assert_eq!(port_from_args(["abc"], DEFAULT_PORT), DEFAULT_PORT);
        assert_eq!(port_from_args(["70000"], DEFAULT_PORT), DEFAULT_PORT);
        assert_eq!(port_from_args(["-1"], DEFAULT_PORT), DEFAULT_PORT);
    }

    #[test]
    fn missing_port_falls_back() {
        let none: [&str; 0] = [];
        assert_eq!(port_from_args(none, DEFAULT_PORT), DEFAULT_PORT);
    }

    #[test]
    fn extra_arguments_are_ignored() {
        assert_eq!(port_from_args(["9091", "extra"], DEFAULT_PORT), 9091);
    }

    #[test]
    fn default_config_listens_on_all_interfaces() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.keepalive, Duration::from_secs(100));
    }
}
