use tera::Tera;
use tracing::debug;

pub const DASHBOARD_TEMPLATE: &str = "dashboard.html";

/// Compiles the embedded templates. `.html` names are autoescaped.
pub fn load() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_template(DASHBOARD_TEMPLATE, include_str!("../templates/dashboard.html"))?;
    debug!(
        event_name = "system.templates.loaded",
        correlation_id = "bootstrap",
        template_count = tera.get_template_names().count(),
        "dashboard templates compiled"
    );
    Ok(tera)
}
