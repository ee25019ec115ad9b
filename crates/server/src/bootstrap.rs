use std::sync::Arc;

use rfmgrid_core::config::{AppConfig, ConfigError, LoadOptions};
use rfmgrid_core::{DataSource, DatasetError, ScoreCalculator, ScoredCustomer};
use tera::Tera;
use thiserror::Error;
use tracing::info;

use crate::templates;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub calculator: ScoreCalculator,
    pub fixture: Arc<Vec<ScoredCustomer>>,
    pub templates: Arc<Tera>,
}

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("customer fixture could not be loaded: {0}")]
    Dataset(#[source] DatasetError),
    #[error("dashboard templates could not be compiled: {0}")]
    Templates(#[source] tera::Error),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let calculator = ScoreCalculator::with_thresholds(config.scoring.thresholds);
    let fixture = DataSource::Fixture.load().map_err(BootstrapError::Dataset)?;
    let fixture = calculator.score_all(&fixture);
    info!(
        event_name = "system.bootstrap.fixture_scored",
        correlation_id = "bootstrap",
        customer_count = fixture.len(),
        "customer fixture loaded and scored"
    );

    let templates = templates::load().map_err(BootstrapError::Templates)?;

    let state = AppState {
        config: Arc::new(config.clone()),
        calculator,
        fixture: Arc::new(fixture),
        templates: Arc::new(templates),
    };

    Ok(Application { config, state })
}

#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    match bootstrap_with_config(AppConfig::default()) {
        Ok(app) => app.state,
        Err(error) => panic!("bootstrap with default config should succeed: {error}"),
    }
}
