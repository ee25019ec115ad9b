use std::time::Duration;

use clap::Args;
use rfmgrid_core::config::ConfigOverrides;
use rfmgrid_core::submission::submit_selection;
use rfmgrid_core::{DashboardState, EchoSubmitter, GridKey, SelectionSubmitter, SubmissionError};

use crate::commands::{
    load_config, load_dashboard, CommandResult, DatasetArgs, FilterArgs, EXIT_INPUT, EXIT_RUNTIME,
};
use crate::http::HttpSelectionSubmitter;

const EXIT_EMPTY_SELECTION: u8 = 5;
const EXIT_REJECTED: u8 = 6;
const EXIT_TRANSPORT: u8 = 7;

#[derive(Debug, Clone, Default, Args)]
pub struct SubmitArgs {
    #[arg(long = "id", value_name = "ID", help = "Select a customer by id (repeatable)")]
    pub ids: Vec<String>,
    #[arg(
        long = "cell",
        value_name = "F-M",
        help = "Select every filtered customer in a grid cell (repeatable)"
    )]
    pub cells: Vec<String>,
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    #[arg(long, help = "Override submission.endpoint")]
    pub endpoint: Option<String>,
    #[arg(long, help = "Acknowledge locally instead of calling the endpoint")]
    pub offline: bool,
}

pub fn run(args: &SubmitArgs) -> CommandResult {
    let overrides =
        ConfigOverrides { submission_endpoint: args.endpoint.clone(), ..ConfigOverrides::default() };
    let config = match load_config("submit", overrides) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let mut dashboard = match load_dashboard("submit", &config, &args.dataset, &args.filters) {
        Ok(dashboard) => dashboard,
        Err(failure) => return failure,
    };
    if let Err(message) = select(&mut dashboard, args) {
        return CommandResult::failure("submit", "invalid_argument", message, EXIT_INPUT);
    }

    let submitter: Box<dyn SelectionSubmitter> = if args.offline {
        Box::new(EchoSubmitter)
    } else {
        let timeout = Duration::from_secs(config.submission.timeout_secs);
        match HttpSelectionSubmitter::new(config.submission.endpoint.clone(), timeout) {
            Ok(submitter) => Box::new(submitter),
            Err(error) => return failure(&error),
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "submit",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                EXIT_RUNTIME,
            );
        }
    };

    match runtime.block_on(submit_selection(submitter.as_ref(), dashboard.selection())) {
        Ok(receipt) => CommandResult::success(
            "submit",
            format!("{} ({})", receipt.message, receipt.selected_ids.join(", ")),
        ),
        Err(error) => failure(&error),
    }
}

/// Cells first, then individual ids. Ids must exist in the loaded dataset.
fn select(dashboard: &mut DashboardState, args: &SubmitArgs) -> Result<(), String> {
    let mut keys: Vec<GridKey> = Vec::new();
    for raw in &args.cells {
        let key = raw.parse::<GridKey>().map_err(|error| error.to_string())?;
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    for key in keys {
        let already_full = dashboard
            .grid()
            .get(key)
            .iter()
            .all(|customer| dashboard.selection().contains(customer.id()));
        if !already_full {
            dashboard.toggle_cell(key);
        }
    }

    for id in &args.ids {
        if !dashboard.customers().iter().any(|customer| customer.id() == id) {
            return Err(format!("unknown customer id `{id}` in {} dataset", dashboard.source()));
        }
        if !dashboard.selection().contains(id) {
            dashboard.selection_mut().toggle_customer(id);
        }
    }
    Ok(())
}

fn failure(error: &SubmissionError) -> CommandResult {
    let (error_class, exit_code) = match error {
        SubmissionError::EmptySelection => ("empty_selection", EXIT_EMPTY_SELECTION),
        SubmissionError::Rejected { .. } => ("submission_rejected", EXIT_REJECTED),
        SubmissionError::Transport(_) | SubmissionError::InvalidResponse(_) => {
            ("submission_transport", EXIT_TRANSPORT)
        }
    };
    CommandResult::failure("submit", error_class, error.to_string(), exit_code)
}
