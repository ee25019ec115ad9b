use rfmgrid_core::config::ConfigOverrides;
use rfmgrid_core::{DashboardCounts, DashboardState, GridCellView, RangeFilters};
use serde::Serialize;

use crate::commands::{load_config, load_dashboard, to_json, CommandResult, DatasetArgs, FilterArgs};

#[derive(Debug, Serialize)]
struct GridReport {
    source: &'static str,
    seed: Option<u64>,
    counts: DashboardCounts,
    filters: RangeFilters,
    rows: Vec<Vec<GridCellView>>,
}

pub fn run(dataset: &DatasetArgs, filters: &FilterArgs, json_output: bool) -> CommandResult {
    let config = match load_config("grid", ConfigOverrides::default()) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let dashboard = match load_dashboard("grid", &config, dataset, filters) {
        Ok(dashboard) => dashboard,
        Err(failure) => return failure,
    };

    if json_output {
        let report = GridReport {
            source: dashboard.source().name(),
            seed: dashboard.source().seed(),
            counts: dashboard.counts(),
            filters: dashboard.filters(),
            rows: dashboard.cells(),
        };
        return to_json("grid", &report);
    }

    CommandResult::report(render_table(&dashboard))
}

/// Monetary score on the y axis (5 at the top), frequency score on the x axis.
fn render_table(dashboard: &DashboardState) -> String {
    let counts = dashboard.counts();
    let mut lines = vec![format!(
        "{} of {} customers from {} after filters",
        counts.filtered,
        counts.total,
        dashboard.source()
    )];

    for row in dashboard.cells() {
        let Some(first) = row.first() else { continue };
        let cells: Vec<String> =
            row.iter().map(|cell| format!("{:>5}", cell.customer_count)).collect();
        lines.push(format!("M{} |{}", first.key.monetary, cells.join("")));
    }
    lines.push(format!("   +{}", "-".repeat(25)));
    let axis: String = (1..=5).map(|f| format!("{:>5}", format!("F{f}"))).collect();
    lines.push(format!("    {axis}"));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use rfmgrid_core::{calculate_scores, CustomerMetrics, DashboardState, DataSource};

    use super::render_table;

    #[test]
    fn table_puts_highest_monetary_row_first() {
        let records = vec![
            CustomerMetrics::new("c1", 10.0, 5.0, 100.0),
            CustomerMetrics::new("c2", 100.0, 50.0, 10_000.0),
        ];
        let dashboard = DashboardState::from_scored(DataSource::Fixture, calculate_scores(&records));
        let table = render_table(&dashboard);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "2 of 2 customers from fixture after filters");
        assert!(lines[1].starts_with("M5 |"));
        assert!(lines[5].starts_with("M1 |"));
        assert_eq!(lines[5].split_whitespace().nth(2), Some("1"));
        assert!(lines[7].contains("F5"));
    }
}
