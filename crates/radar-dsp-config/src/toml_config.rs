//! TOML configuration loading: a reject-unknown-fields, versioned-schema
//! loader that turns a config file into a validated `SharedConfig`.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use toml::Value;

use crate::config::{DspConfig, SharedConfig};
use crate::endpoint::Endpoint;

const EXPECTED_CONFIG_VERSION: &str = "1";

#[derive(Deserialize)]
struct TomlConfigRoot {
    config_version: String,

    main_antenna_count: usize,
    intf_antenna_count: usize,

    max_rx_sample_rate_hz: f64,
    max_output_sample_rate_hz: f64,

    max_filtering_stages: usize,
    max_filter_taps_per_stage: usize,

    ringbuffer_name: String,
    ringbuffer_size_bytes: u64,

    ack_endpoint: String,
    timing_endpoint: String,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

fn sorted_keys(map: &HashMap<String, Value>) -> Vec<&String> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    keys
}

/// Build a `SharedConfig` from a TOML configuration string.
pub fn from_toml_str(toml_str: &str) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let root: TomlConfigRoot = toml::from_str(toml_str)?;

    if root.config_version != EXPECTED_CONFIG_VERSION {
        return Err(format!(
            "unrecognized config_version: {}, expected {}",
            root.config_version, EXPECTED_CONFIG_VERSION
        )
        .into());
    }
    if !root.extra.is_empty() {
        return Err(format!("unrecognized top-level fields: {:?}", sorted_keys(&root.extra)).into());
    }

    let ack_endpoint = Endpoint::parse(&root.ack_endpoint)?;
    let timing_endpoint = Endpoint::parse(&root.timing_endpoint)?;

    let cfg = DspConfig {
        main_antenna_count: root.main_antenna_count,
        intf_antenna_count: root.intf_antenna_count,
        max_rx_sample_rate_hz: root.max_rx_sample_rate_hz,
        max_output_sample_rate_hz: root.max_output_sample_rate_hz,
        max_filtering_stages: root.max_filtering_stages,
        max_filter_taps_per_stage: root.max_filter_taps_per_stage,
        ringbuffer_name: root.ringbuffer_name,
        ringbuffer_size_bytes: root.ringbuffer_size_bytes,
        ack_endpoint,
        timing_endpoint,
    };

    SharedConfig::new(cfg).map_err(|e| e.into())
}

/// Build a `SharedConfig` from any reader.
pub fn from_reader<R: Read>(mut reader: R) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    from_toml_str(&contents)
}

/// Build a `SharedConfig` from a file path.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    from_reader(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
        config_version = "1"
        main_antenna_count = 16
        intf_antenna_count = 4
        max_rx_sample_rate_hz = 5000000.0
        max_output_sample_rate_hz = 10000.0
        max_filtering_stages = 3
        max_filter_taps_per_stage = 2048
        ringbuffer_name = "rx_main"
        ringbuffer_size_bytes = 134217728
        ack_endpoint = "tcp://127.0.0.1:9001"
        timing_endpoint = "tcp://127.0.0.1:9002"
    "#;

    #[test]
    fn loads_valid_config() {
        let shared = from_toml_str(EXAMPLE).unwrap();
        let cfg = shared.config();
        assert_eq!(cfg.main_antenna_count, 16);
        assert_eq!(cfg.intf_antenna_count, 4);
        assert_eq!(cfg.ack_endpoint, Endpoint::Tcp { host: "127.0.0.1".to_string(), port: 9001 });
    }

    #[test]
    fn rejects_wrong_config_version() {
        let bad = EXAMPLE.replacen("\"1\"", "\"2\"", 1);
        assert!(from_toml_str(&bad).is_err());
    }

    #[test]
    fn rejects_unknown_top_level_field() {
        let bad = format!("{}\nbogus_field = 1\n", EXAMPLE);
        assert!(from_toml_str(&bad).is_err());
    }

    #[test]
    fn rejects_invalid_stage_count() {
        let bad = EXAMPLE.replacen("max_filtering_stages = 3", "max_filtering_stages = 2", 1);
        assert!(from_toml_str(&bad).is_err());
    }
}
