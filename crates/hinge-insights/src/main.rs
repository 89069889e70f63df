mod bootstrap;
mod report;

use anyhow::Result;
use insights_core::error::InsightsError;
use insights_core::settings::{OutputFormat, Settings};
use insights_data::engine::AggregationEngine;
use insights_data::reader::load_export;
use insights_data::stories::generate_stories;

fn main() -> Result<()> {
    let settings = Settings::load();
    bootstrap::setup_logging(&settings.log_level)?;
    settings.validate()?;

    tracing::info!("Hinge Insights v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Export: {}, Timezone: {}, Format: {}",
        settings.export.display(),
        settings.timezone,
        settings.format
    );

    let raw = load_export(&settings.export)?;

    let engine = AggregationEngine::from_timezone_name(&settings.timezone);
    let data = engine.process(&raw).ok_or_else(|| {
        InsightsError::InvalidExport("top-level value is not an array".to_string())
    })?;

    let rendered = match settings.output_format() {
        OutputFormat::Summary => report::render_summary(&data),
        OutputFormat::Json => serde_json::to_string_pretty(&data)?,
        OutputFormat::Stories => serde_json::to_string_pretty(&generate_stories(&data))?,
    };

    bootstrap::write_output(&rendered, settings.output.as_deref())?;

    Ok(())
}
