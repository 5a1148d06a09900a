// src/config.rs

use crate::logging::{PROJECT_NAME, get_data_dir};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use strum::{Display, EnumString};
use tracing::warn;

/// What to do when a target's findings file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExistingOutput {
    /// Run the auditor again and replace the file.
    #[default]
    Overwrite,
    /// Parse the existing file and skip the auditor run.
    Reuse,
}

/// Tunables for one scan run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub binary: String,
    pub extra_args: Vec<String>,
    /// Flag that tells the auditor where to write its JSON findings.
    pub output_flag: String,
    pub output_dir: PathBuf,
    pub task_timeout: Duration,
    /// Advisory; the advisor may lower it.
    pub requested_workers: usize,
    pub monitor_interval: Duration,
    pub existing_output: ExistingOutput,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            binary: "testssl.sh".to_string(),
            extra_args: vec!["--quiet".to_string(), "--color".to_string(), "0".to_string()],
            output_flag: "--jsonfile".to_string(),
            output_dir: get_data_dir().join("scans"),
            task_timeout: Duration::from_secs(300),
            requested_workers: 4,
            monitor_interval: Duration::from_secs(5),
            existing_output: ExistingOutput::Overwrite,
        }
    }
}

impl ScanConfig {
    /// Defaults overridden by `<PROJECT>_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let var = |suffix: &str| {
            let key = format!("{}_{}", PROJECT_NAME.as_str(), suffix);
            lookup(&key).map(|v| (key, v.trim().to_string())).filter(|(_, v)| !v.is_empty())
        };

        if let Some((_, value)) = var("BINARY") {
            config.binary = value;
        }
        if let Some((_, value)) = var("ARGS") {
            config.extra_args = value.split_whitespace().map(String::from).collect();
        }
        if let Some((_, value)) = var("OUTPUT_FLAG") {
            config.output_flag = value;
        }
        if let Some((_, value)) = var("OUTPUT_DIR") {
            config.output_dir = PathBuf::from(value);
        }
        if let Some((key, value)) = var("TIMEOUT_SECS") {
            if let Some(secs) = parse_positive(&key, &value) {
                config.task_timeout = Duration::from_secs(secs);
            }
        }
        if let Some((key, value)) = var("WORKERS") {
            if let Some(workers) = parse_positive(&key, &value) {
                config.requested_workers = workers as usize;
            }
        }
        if let Some((key, value)) = var("MONITOR_SECS") {
            if let Some(secs) = parse_positive(&key, &value) {
                config.monitor_interval = Duration::from_secs(secs);
            }
        }
        if let Some((key, value)) = var("EXISTING") {
            match ExistingOutput::from_str(&value) {
                Ok(policy) => config.existing_output = policy,
                Err(_) => warn!(key = %key, value = %value, "Unknown existing-output policy, keeping default."),
            }
        }
        config
    }
}

fn parse_positive(key: &str, value: &str) -> Option<u64> {
    match value.parse::<u64>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            warn!(key, value, "Expected a positive integer, keeping default.");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_policy() {
        let config = ScanConfig::default();
        assert_eq!(config.task_timeout, Duration::from_secs(300));
        assert_eq!(config.output_flag, "--jsonfile");
        assert_eq!(config.existing_output, ExistingOutput::Overwrite);
    }

    #[test]
    fn environment_overrides_are_applied() {
        let config = ScanConfig::from_lookup(lookup(&[
            ("TLS_SWEEP_BINARY", "/opt/testssl/testssl.sh"),
            ("TLS_SWEEP_ARGS", "--fast  --sneaky"),
            ("TLS_SWEEP_OUTPUT_DIR", "/tmp/out"),
            ("TLS_SWEEP_TIMEOUT_SECS", "90"),
            ("TLS_SWEEP_WORKERS", "6"),
            ("TLS_SWEEP_MONITOR_SECS", "2"),
            ("TLS_SWEEP_EXISTING", "Reuse"),
        ]));
        assert_eq!(config.binary, "/opt/testssl/testssl.sh");
        assert_eq!(config.extra_args, ["--fast", "--sneaky"]);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.task_timeout, Duration::from_secs(90));
        assert_eq!(config.requested_workers, 6);
        assert_eq!(config.monitor_interval, Duration::from_secs(2));
        assert_eq!(config.existing_output, ExistingOutput::Reuse);
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let config = ScanConfig::from_lookup(lookup(&[
            ("TLS_SWEEP_TIMEOUT_SECS", "soon"),
            ("TLS_SWEEP_WORKERS", "0"),
            ("TLS_SWEEP_EXISTING", "append"),
        ]));
        let defaults = ScanConfig::default();
        assert_eq!(config.task_timeout, defaults.task_timeout);
        assert_eq!(config.requested_workers, defaults.requested_workers);
        assert_eq!(config.existing_output, defaults.existing_output);
    }
}
