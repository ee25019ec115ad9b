//! Server-rendered dashboard.
//!
//! The page keeps no server-side session. Its form round-trips the data
//! source, seed, filters, and selection as query parameters, and each action
//! button adds one more parameter naming what changed:
//!
//! - `switch_source=<fixture|synthetic>` reloads and resets everything
//! - `reset_filters` restores the dataset's own ranges
//! - `toggle_cell=<f-m>` toggles every filtered customer in a cell
//! - `toggle=<id>` / `remove=<id>` edit single customers
//! - `clear` empties the selection

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};
use rfmgrid_core::config::DatasetConfig;
use rfmgrid_core::submission::SELECTED_IDS_PATH;
use rfmgrid_core::{
    ApplicationError, DashboardState, DataSource, Dimension, DimensionRange, DomainError,
    GridCellView, RangeFilters, ScoredCustomer, Selection,
};
use serde::{Deserialize, Serialize};
use tera::Context;
use tracing::{error, info};
use uuid::Uuid;

use crate::bootstrap::AppState;
use crate::templates::DASHBOARD_TEMPLATE;

/// Every parameter is optional. Empty strings count as absent.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub source: Option<String>,
    pub seed: Option<String>,
    pub recency_min: Option<String>,
    pub recency_max: Option<String>,
    pub frequency_min: Option<String>,
    pub frequency_max: Option<String>,
    pub monetary_min: Option<String>,
    pub monetary_max: Option<String>,
    pub selected: Option<String>,
    pub switch_source: Option<String>,
    pub reset_filters: Option<String>,
    pub toggle_cell: Option<String>,
    pub toggle: Option<String>,
    pub remove: Option<String>,
    pub clear: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

fn invalid(name: &str, value: &str) -> ApplicationError {
    DomainError::InvalidParameter { name: name.to_string(), value: value.to_string() }.into()
}

impl DashboardQuery {
    fn bounds(&self, dimension: Dimension) -> (Option<&str>, Option<&str>) {
        match dimension {
            Dimension::Recency => (present(&self.recency_min), present(&self.recency_max)),
            Dimension::Frequency => (present(&self.frequency_min), present(&self.frequency_max)),
            Dimension::Monetary => (present(&self.monetary_min), present(&self.monetary_max)),
        }
    }

    fn data_source(&self, configured: &DatasetConfig) -> Result<DataSource, ApplicationError> {
        if let Some(raw) = present(&self.switch_source) {
            return Ok(raw.parse::<DataSource>()?);
        }

        let source = match present(&self.source) {
            Some(raw) => raw.parse::<DataSource>()?,
            None => configured.source,
        };
        match (source, present(&self.seed)) {
            (DataSource::Synthetic { .. }, Some(raw)) => {
                let seed = raw.parse::<u64>().map_err(|_| invalid("seed", raw))?;
                Ok(DataSource::Synthetic { seed: Some(seed) })
            }
            (DataSource::Synthetic { seed }, None) => {
                Ok(DataSource::Synthetic { seed: seed.or(configured.seed) })
            }
            (source, _) => Ok(source),
        }
    }

    /// Starts from `ranges` and overrides the bounds that were supplied.
    fn filters(&self, ranges: RangeFilters) -> Result<RangeFilters, ApplicationError> {
        let parse = |name: String, raw: Option<&str>, fallback: f64| match raw {
            Some(raw) => raw
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| invalid(&name, raw)),
            None => Ok(fallback),
        };

        Dimension::ALL.into_iter().try_fold(ranges, |filters, dimension| {
            let current = ranges.get(dimension);
            let (min, max) = self.bounds(dimension);
            let range = DimensionRange::new(
                parse(format!("{dimension}_min"), min, current.min)?,
                parse(format!("{dimension}_max"), max, current.max)?,
            );
            Ok(filters.with(dimension, range))
        })
    }

    fn selection(&self) -> Selection {
        Selection::from_ids(
            present(&self.selected)
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty()),
        )
    }
}

/// Rebuilds dashboard state from a request and applies its action.
pub fn build_state(
    app: &AppState,
    query: &DashboardQuery,
) -> Result<DashboardState, ApplicationError> {
    let source = query.data_source(&app.config.dataset)?;
    let mut dashboard = match source {
        DataSource::Fixture => DashboardState::from_scored(source, app.fixture.as_ref().clone()),
        DataSource::Synthetic { .. } => DashboardState::load(source, &app.calculator)?,
    };

    if present(&query.switch_source).is_some() {
        return Ok(dashboard);
    }

    if present(&query.reset_filters).is_none() {
        let filters = query.filters(dashboard.ranges())?;
        dashboard.set_filters(filters);
    }

    let mut dashboard = dashboard.with_selection(query.selection());
    if present(&query.clear).is_some() {
        dashboard.selection_mut().clear();
    }
    if let Some(raw) = present(&query.toggle_cell) {
        dashboard.toggle_cell(raw.parse()?);
    }
    if let Some(id) = present(&query.toggle) {
        dashboard.selection_mut().toggle_customer(id);
    }
    if let Some(id) = present(&query.remove) {
        dashboard.selection_mut().remove(id);
    }

    Ok(dashboard)
}

#[derive(Debug, Serialize)]
struct DimensionControl {
    name: &'static str,
    label: &'static str,
    range: DimensionRange,
    filter: DimensionRange,
}

#[derive(Debug, Serialize)]
struct CellContext {
    #[serde(flatten)]
    view: GridCellView,
    tier_class: &'static str,
    fully_selected: bool,
}

fn dimension_label(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Recency => "Recency (days)",
        Dimension::Frequency => "Frequency (purchases)",
        Dimension::Monetary => "Monetary (total spend)",
    }
}

fn page_context(dashboard: &DashboardState) -> Context {
    let ranges = dashboard.ranges();
    let filters = dashboard.filters();
    let dimensions: Vec<DimensionControl> = Dimension::ALL
        .into_iter()
        .map(|dimension| DimensionControl {
            name: dimension.as_str(),
            label: dimension_label(dimension),
            range: ranges.get(dimension),
            filter: filters.get(dimension),
        })
        .collect();

    let rows: Vec<Vec<CellContext>> = dashboard
        .cells()
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|view| CellContext {
                    tier_class: view.tier.css_class(),
                    fully_selected: view.customer_count > 0
                        && view.selected_count == view.customer_count,
                    view,
                })
                .collect()
        })
        .collect();

    let selected_customers: Vec<ScoredCustomer> = dashboard.selected_customers();
    let selected_ids = dashboard.selection().ids();

    let mut context = Context::new();
    context.insert("source_name", dashboard.source().name());
    context.insert("seed", &dashboard.source().seed().map(|seed| seed.to_string()));
    context.insert("counts", &dashboard.counts());
    context.insert("dimensions", &dimensions);
    context.insert("rows", &rows);
    context.insert("selected_customers", &selected_customers);
    context.insert("summary", &dashboard.summary());
    context.insert("selected_ids", selected_ids);
    context.insert("selected_joined", &selected_ids.join(","));
    context.insert("endpoint", SELECTED_IDS_PATH);
    context
}

pub fn router(state: AppState) -> Router {
    Router::new().route("/", get(dashboard_page)).with_state(state)
}

pub async fn dashboard_page(
    State(app): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Html<String>, (StatusCode, Html<String>)> {
    let correlation_id = Uuid::new_v4().to_string();
    let dashboard = build_state(&app, &query).map_err(|error| {
        let interface = error.into_interface(correlation_id.clone());
        let status = crate::api::status_for(&interface);
        let body =
            format!("<h1>{}</h1><p>{}</p>", interface.user_message(), escape(interface.message()));
        (status, Html(body))
    })?;

    let html = app.templates.render(DASHBOARD_TEMPLATE, &page_context(&dashboard)).map_err(|e| {
        error!(
            event_name = "dashboard.render_failed",
            correlation_id = %correlation_id,
            error = %e,
            "dashboard template failed to render"
        );
        (StatusCode::INTERNAL_SERVER_ERROR, Html("<h1>Render Error</h1>".to_string()))
    })?;

    info!(
        event_name = "dashboard.rendered",
        correlation_id = %correlation_id,
        source = dashboard.source().name(),
        filtered = dashboard.counts().filtered,
        selected = dashboard.counts().selected,
        "dashboard rendered"
    );
    Ok(Html(html))
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
