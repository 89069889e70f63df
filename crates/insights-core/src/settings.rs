use clap::Parser;
use std::path::PathBuf;

use crate::error::{InsightsError, Result};
use crate::time_utils::{get_system_timezone, validate_timezone};

// ── OutputFormat ───────────────────────────────────────────────────────────────

/// What the binary prints after processing an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable overview cards and insights.
    Summary,
    /// The full processed dataset as JSON.
    Json,
    /// The story deck as JSON.
    Stories,
}

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Analyse a Hinge data export
#[derive(Parser, Debug, Clone)]
#[command(
    name = "hinge-insights",
    about = "Analyse a Hinge matches.json data export",
    version
)]
pub struct Settings {
    /// Path to the exported matches.json file
    pub export: PathBuf,

    /// Timezone used for naive timestamps and hour/season buckets
    #[arg(long, env = "HINGE_INSIGHTS_TZ", default_value = "auto")]
    pub timezone: String,

    /// Output format
    #[arg(long, default_value = "summary", value_parser = ["summary", "json", "stories"])]
    pub format: String,

    /// Write output to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "WARNING", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse process arguments and resolve `"auto"` values.
    pub fn load() -> Self {
        Self::resolve_auto_values(Settings::parse())
    }

    /// Same as [`Settings::load`] but from an explicit argument list.
    pub fn try_load_from<I, T>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Settings::try_parse_from(args).map(Self::resolve_auto_values)
    }

    /// Resolve the `"auto"` timezone and apply the `--debug` flag.
    fn resolve_auto_values(mut settings: Settings) -> Settings {
        if settings.timezone.eq_ignore_ascii_case("auto") {
            settings.timezone = get_system_timezone();
        }
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Reject settings that cannot be honoured.
    pub fn validate(&self) -> Result<()> {
        if !validate_timezone(&self.timezone) {
            return Err(InsightsError::Config(format!(
                "unknown timezone \"{}\"",
                self.timezone
            )));
        }
        Ok(())
    }

    pub fn output_format(&self) -> OutputFormat {
        match self.format.as_str() {
            "json" => OutputFormat::Json,
            "stories" => OutputFormat::Stories,
            _ => OutputFormat::Summary,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::try_load_from(["hinge-insights", "matches.json"]).unwrap();
        assert_eq!(settings.export, PathBuf::from("matches.json"));
        assert_eq!(settings.output_format(), OutputFormat::Summary);
        assert_eq!(settings.log_level, "WARNING");
        assert!(settings.output.is_none());
        // "auto" never survives loading.
        assert_ne!(settings.timezone, "auto");
    }

    #[test]
    fn test_explicit_timezone_kept() {
        let settings = Settings::try_load_from([
            "hinge-insights",
            "--timezone",
            "Europe/Berlin",
            "matches.json",
        ])
        .unwrap();
        assert_eq!(settings.timezone, "Europe/Berlin");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_invalid_timezone_fails_validation() {
        let settings = Settings::try_load_from([
            "hinge-insights",
            "--timezone",
            "Mars/Olympus",
            "matches.json",
        ])
        .unwrap();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("Mars/Olympus"));
    }

    #[test]
    fn test_format_values() {
        let json =
            Settings::try_load_from(["hinge-insights", "--format", "json", "x.json"]).unwrap();
        assert_eq!(json.output_format(), OutputFormat::Json);
        let stories =
            Settings::try_load_from(["hinge-insights", "--format", "stories", "x.json"]).unwrap();
        assert_eq!(stories.output_format(), OutputFormat::Stories);
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(Settings::try_load_from(["hinge-insights", "--format", "pdf", "x.json"]).is_err());
    }

    #[test]
    fn test_debug_overrides_log_level() {
        let settings =
            Settings::try_load_from(["hinge-insights", "--debug", "matches.json"]).unwrap();
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_missing_export_is_error() {
        assert!(Settings::try_load_from(["hinge-insights"]).is_err());
    }
}
