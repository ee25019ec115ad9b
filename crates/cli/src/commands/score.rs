use rfmgrid_core::config::ConfigOverrides;
use rfmgrid_core::{DashboardState, ScoredCustomer};
use serde::Serialize;

use crate::commands::{load_config, load_dashboard, to_json, CommandResult, DatasetArgs, FilterArgs};

#[derive(Debug, Serialize)]
struct ScoreReport<'a> {
    source: &'static str,
    seed: Option<u64>,
    count: usize,
    customers: &'a [ScoredCustomer],
}

pub fn run(dataset: &DatasetArgs, json_output: bool) -> CommandResult {
    let config = match load_config("score", ConfigOverrides::default()) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let dashboard = match load_dashboard("score", &config, dataset, &FilterArgs::default()) {
        Ok(dashboard) => dashboard,
        Err(failure) => return failure,
    };

    if json_output {
        let report = ScoreReport {
            source: dashboard.source().name(),
            seed: dashboard.source().seed(),
            count: dashboard.customers().len(),
            customers: dashboard.customers(),
        };
        return to_json("score", &report);
    }

    CommandResult::report(render_human(&dashboard))
}

fn render_human(dashboard: &DashboardState) -> String {
    let source = dashboard.source();
    let count = dashboard.customers().len();
    let mut lines = vec![match source.seed() {
        Some(seed) => format!("scored {count} customers from {source} (seed {seed}):"),
        None => format!("scored {count} customers from {source}:"),
    }];
    lines.push(format!(
        "{:<16} {:>8} {:>10} {:>10}  R F M",
        "id", "recency", "frequency", "monetary"
    ));
    for customer in dashboard.customers() {
        let metrics = &customer.metrics;
        lines.push(format!(
            "{:<16} {:>8} {:>10} {:>10}  {} {} {}",
            metrics.id,
            metrics.recency,
            metrics.frequency,
            metrics.monetary,
            customer.recency_score,
            customer.frequency_score,
            customer.monetary_score,
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use rfmgrid_core::{calculate_scores, CustomerMetrics, DashboardState, DataSource};

    use super::render_human;

    #[test]
    fn human_output_lists_every_customer_with_scores() {
        let records = vec![
            CustomerMetrics::new("c1", 10.0, 5.0, 100.0),
            CustomerMetrics::new("c2", 100.0, 50.0, 10_000.0),
        ];
        let dashboard = DashboardState::from_scored(DataSource::Fixture, calculate_scores(&records));
        let output = render_human(&dashboard);

        assert!(output.starts_with("scored 2 customers from fixture:"));
        let c1 = output.lines().find(|line| line.starts_with("c1")).expect("c1 row");
        assert!(c1.ends_with("5 1 1"));
        assert_eq!(output.lines().count(), 4);
    }
}
