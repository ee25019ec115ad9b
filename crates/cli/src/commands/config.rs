use std::env;
use std::fs;
use std::path::Path;

use rfmgrid_core::config::{resolve_config_path, AppConfig, ConfigOverrides};
use serde::Serialize;
use toml::Value;

use crate::commands::{load_config, to_json, CommandResult};

#[derive(Debug, Serialize)]
struct ConfigField {
    key: &'static str,
    value: String,
    source: String,
}

#[derive(Debug, Serialize)]
struct ConfigReport {
    precedence: &'static str,
    config_file: Option<String>,
    fields: Vec<ConfigField>,
}

pub fn run() -> CommandResult {
    let config = match load_config("config", ConfigOverrides::default()) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    to_json("config", &build_report(&config))
}

fn build_report(config: &AppConfig) -> ConfigReport {
    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let field = |key: &'static str, value: String, env_keys: &[&str]| ConfigField {
        key,
        value,
        source: field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref()),
    };

    let thresholds = config
        .scoring
        .thresholds
        .breakpoints()
        .iter()
        .map(f64::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    let fields = vec![
        field(
            "server.bind_address",
            config.server.bind_address.clone(),
            &["RFMGRID_SERVER_BIND_ADDRESS"],
        ),
        field("server.port", config.server.port.to_string(), &["RFMGRID_SERVER_PORT"]),
        field(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["RFMGRID_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        field("dataset.source", config.dataset.source.to_string(), &["RFMGRID_DATASET_SOURCE"]),
        field(
            "dataset.seed",
            config.dataset.seed.map_or_else(|| "<unset>".to_string(), |s| s.to_string()),
            &["RFMGRID_DATASET_SEED"],
        ),
        field("scoring.thresholds", format!("[{thresholds}]"), &[]),
        field(
            "submission.endpoint",
            config.submission.endpoint.clone(),
            &["RFMGRID_SUBMISSION_ENDPOINT"],
        ),
        field(
            "submission.timeout_secs",
            config.submission.timeout_secs.to_string(),
            &["RFMGRID_SUBMISSION_TIMEOUT_SECS"],
        ),
        field(
            "logging.level",
            config.logging.level.clone(),
            &["RFMGRID_LOGGING_LEVEL", "RFMGRID_LOG_LEVEL"],
        ),
        field(
            "logging.format",
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
            &["RFMGRID_LOGGING_FORMAT", "RFMGRID_LOG_FORMAT"],
        ),
    ];

    ConfigReport {
        precedence: "env > file > default",
        config_file: config_file_path.map(|path| path.display().to_string()),
        fields,
    }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}
