pub mod config;
pub mod grid;
pub mod score;
pub mod submit;

use clap::Args;
use rfmgrid_core::config::{AppConfig, ConfigOverrides, DatasetConfig, LoadOptions};
use rfmgrid_core::{
    DashboardState, DataSource, Dimension, DimensionRange, DomainError, ScoreCalculator,
};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Successful command whose output is a report rather than an outcome envelope.
    pub fn report(output: String) -> Self {
        Self { exit_code: 0, output }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) const EXIT_CONFIG: u8 = 2;
pub(crate) const EXIT_RUNTIME: u8 = 3;
pub(crate) const EXIT_INPUT: u8 = 4;

/// Which dataset a command works on. Falls back to `dataset.source` and
/// `dataset.seed` from config.
#[derive(Debug, Clone, Default, Args)]
pub struct DatasetArgs {
    #[arg(long, help = "Data source: fixture or synthetic")]
    pub source: Option<String>,
    #[arg(long, help = "Seed for the synthetic generator")]
    pub seed: Option<u64>,
}

impl DatasetArgs {
    pub fn resolve(&self, configured: &DatasetConfig) -> Result<DataSource, DomainError> {
        let source = match self.source.as_deref() {
            Some(raw) => raw.parse::<DataSource>()?,
            None => configured.source,
        };
        Ok(match source {
            DataSource::Synthetic { seed } => {
                DataSource::Synthetic { seed: self.seed.or(seed).or(configured.seed) }
            }
            DataSource::Fixture => DataSource::Fixture,
        })
    }
}

/// Optional bounds on raw metric values; unset bounds keep the dataset's own range.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    #[arg(long, value_parser = finite_bound)]
    pub recency_min: Option<f64>,
    #[arg(long, value_parser = finite_bound)]
    pub recency_max: Option<f64>,
    #[arg(long, value_parser = finite_bound)]
    pub frequency_min: Option<f64>,
    #[arg(long, value_parser = finite_bound)]
    pub frequency_max: Option<f64>,
    #[arg(long, value_parser = finite_bound)]
    pub monetary_min: Option<f64>,
    #[arg(long, value_parser = finite_bound)]
    pub monetary_max: Option<f64>,
}

fn finite_bound(raw: &str) -> Result<f64, String> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(format!("`{raw}` is not a finite number")),
    }
}

impl FilterArgs {
    fn bounds(&self, dimension: Dimension) -> (Option<f64>, Option<f64>) {
        match dimension {
            Dimension::Recency => (self.recency_min, self.recency_max),
            Dimension::Frequency => (self.frequency_min, self.frequency_max),
            Dimension::Monetary => (self.monetary_min, self.monetary_max),
        }
    }

    pub fn apply(&self, dashboard: &mut DashboardState) {
        let ranges = dashboard.ranges();
        let filters = Dimension::ALL.into_iter().fold(ranges, |filters, dimension| {
            let current = ranges.get(dimension);
            let (min, max) = self.bounds(dimension);
            filters.with(
                dimension,
                DimensionRange::new(min.unwrap_or(current.min), max.unwrap_or(current.max)),
            )
        });
        dashboard.set_filters(filters);
    }
}

pub(crate) fn load_config(
    command: &str,
    overrides: ConfigOverrides,
) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions { overrides, ..LoadOptions::default() }).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            EXIT_CONFIG,
        )
    })
}

/// Loads, scores, and filters the requested dataset.
pub(crate) fn load_dashboard(
    command: &str,
    config: &AppConfig,
    dataset: &DatasetArgs,
    filters: &FilterArgs,
) -> Result<DashboardState, CommandResult> {
    let source = dataset.resolve(&config.dataset).map_err(|error| {
        CommandResult::failure(command, "invalid_argument", error.to_string(), EXIT_INPUT)
    })?;
    let calculator = ScoreCalculator::with_thresholds(config.scoring.thresholds);
    let mut dashboard = DashboardState::load(source, &calculator).map_err(|error| {
        CommandResult::failure(command, "dataset", error.to_string(), EXIT_INPUT)
    })?;
    filters.apply(&mut dashboard);
    Ok(dashboard)
}

pub(crate) fn to_json<T: Serialize>(command: &str, value: &T) -> CommandResult {
    match serde_json::to_string_pretty(value) {
        Ok(output) => CommandResult::report(output),
        Err(error) => CommandResult::failure(command, "serialization", error.to_string(), EXIT_RUNTIME),
    }
}
