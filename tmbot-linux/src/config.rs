//! Load config from file and environment.

use serde::Deserialize;
use std::path::PathBuf;

use tmbot_core::{DEFAULT_TRANSFER_TIMEOUT_TICKS, DEVICE_NAME};

/// Daemon configuration. File: ~/.config/tmbot/config.toml or /etc/tmbot/config.toml.
/// Env overrides: TMBOT_DEVICE_NAME, TMBOT_LISTEN_PORT, TMBOT_TICK_INTERVAL_SECS,
/// TMBOT_TRANSFER_TIMEOUT_TICKS, TMBOT_LOG.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Name logged at startup (default "TMbot").
    #[serde(default = "default_device_name")]
    pub device_name: String,
    /// UDP bridge listen port on loopback (default 45680).
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    /// Seconds between expiry ticks (default 1).
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    /// Idle ticks before an unfinished transfer is dropped; 0 disables (default 60).
    #[serde(default = "default_transfer_timeout_ticks")]
    pub transfer_timeout_ticks: u64,
    /// tracing filter used when RUST_LOG is unset (default "info").
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_device_name() -> String {
    DEVICE_NAME.to_owned()
}
fn default_listen_port() -> u16 {
    45680
}
fn default_tick_interval_secs() -> u64 {
    1
}
fn default_transfer_timeout_ticks() -> u64 {
    DEFAULT_TRANSFER_TIMEOUT_TICKS
}
fn default_log_level() -> String {
    "info".to_owned()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_name: default_device_name(),
            listen_port: default_listen_port(),
            tick_interval_secs: default_tick_interval_secs(),
            transfer_timeout_ticks: default_transfer_timeout_ticks(),
            log_level: default_log_level(),
        }
    }
}

/// Load config: merge default, then config file (if present), then env vars.
pub fn load() -> Config {
    let mut c = load_file().unwrap_or_default();
    apply_env(&mut c, |key| std::env::var(key).ok());
    c
}

fn apply_env(c: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(s) = var("TMBOT_DEVICE_NAME") {
        c.device_name = s;
    }
    if let Some(p) = var("TMBOT_LISTEN_PORT").and_then(|s| s.parse().ok()) {
        c.listen_port = p;
    }
    if let Some(n) = var("TMBOT_TICK_INTERVAL_SECS").and_then(|s| s.parse().ok()) {
        c.tick_interval_secs = n;
    }
    if let Some(n) = var("TMBOT_TRANSFER_TIMEOUT_TICKS").and_then(|s| s.parse().ok()) {
        c.transfer_timeout_ticks = n;
    }
    if let Some(s) = var("TMBOT_LOG") {
        c.log_level = s;
    }
}

fn config_paths() -> Vec<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut out = Vec::new();
    if let Some(h) = home {
        out.push(h.join(".config/tmbot/config.toml"));
    }
    out.push(PathBuf::from("/etc/tmbot/config.toml"));
    out
}

fn load_file() -> Option<Config> {
    for p in config_paths() {
        if p.exists() {
            match std::fs::read_to_string(&p) {
                Ok(s) => match toml::from_str::<Config>(&s) {
                    Ok(c) => return Some(c),
                    Err(e) => eprintln!("tmbot: ignoring {}: {}", p.display(), e),
                },
                Err(e) => eprintln!("tmbot: cannot read {}: {}", p.display(), e),
            }
            break;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_file_is_all_defaults() {
        let c: Config = toml::from_str("").unwrap();
        assert_eq!(c.device_name, "TMbot");
        assert_eq!(c.listen_port, 45680);
        assert_eq!(c.tick_interval_secs, 1);
        assert_eq!(c.transfer_timeout_ticks, DEFAULT_TRANSFER_TIMEOUT_TICKS);
        assert_eq!(c.log_level, "info");
    }

    #[test]
    fn file_values_override_defaults() {
        let c: Config = toml::from_str(
            "listen_port = 5000\ntransfer_timeout_ticks = 0\nlog_level = \"debug\"\n",
        )
        .unwrap();
        assert_eq!(c.listen_port, 5000);
        assert_eq!(c.transfer_timeout_ticks, 0);
        assert_eq!(c.log_level, "debug");
        assert_eq!(c.tick_interval_secs, 1);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<Config>("proxy_port = 3128\n").is_err());
    }

    #[test]
    fn env_overrides_and_ignores_garbage() {
        let env: HashMap<&str, &str> = [
            ("TMBOT_LISTEN_PORT", "6000"),
            ("TMBOT_TICK_INTERVAL_SECS", "soon"),
            ("TMBOT_TRANSFER_TIMEOUT_TICKS", "5"),
            ("TMBOT_DEVICE_NAME", "bench-bot"),
        ]
        .into_iter()
        .collect();
        let mut c = Config::default();
        apply_env(&mut c, |k| env.get(k).map(|v| v.to_string()));
        assert_eq!(c.listen_port, 6000);
        assert_eq!(c.tick_interval_secs, 1);
        assert_eq!(c.transfer_timeout_ticks, 5);
        assert_eq!(c.device_name, "bench-bot");
        assert_eq!(c.log_level, "info");
    }
}
