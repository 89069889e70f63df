//! Export file discovery and loading.
//!
//! A Hinge data export unpacks to a folder holding `matches.json`; callers
//! may point at either the folder or the file itself.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use insights_core::error::{InsightsError, Result};
use insights_core::models::ProfileRecord;
use serde_json::Value;
use tracing::{debug, warn};

/// File name of the per-profile interaction export.
pub const EXPORT_FILE_NAME: &str = "matches.json";

// ── Public API ────────────────────────────────────────────────────────────────

/// Resolve the export file for `path`.
///
/// A directory is searched for `matches.json` (any letter case), first at
/// its top level and then one level down. Files are returned unchanged.
pub fn resolve_export_path(path: &Path) -> PathBuf {
    if !path.is_dir() {
        return path.to_path_buf();
    }

    // Sorted walk; the shallowest hit wins, then the first by name.
    let found = walkdir::WalkDir::new(path)
        .min_depth(1)
        .max_depth(2)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", path.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_export_name(entry.file_name()))
        .min_by_key(|entry| entry.depth());

    match found {
        Some(entry) => entry.into_path(),
        None => {
            warn!("No {} found under {}", EXPORT_FILE_NAME, path.display());
            path.join(EXPORT_FILE_NAME)
        }
    }
}

/// Parse export text into a JSON value. A leading byte-order mark is ignored.
pub fn parse_export(text: &str) -> Result<Value> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    Ok(serde_json::from_str(text)?)
}

/// Read and parse the export at `path` (file or export folder).
pub fn load_export(path: &Path) -> Result<Value> {
    let file = resolve_export_path(path);
    let text = std::fs::read_to_string(&file).map_err(|source| InsightsError::FileRead {
        path: file.clone(),
        source,
    })?;
    let value = parse_export(&text)?;
    debug!("Loaded export {} ({} bytes)", file.display(), text.len());
    Ok(value)
}

/// Load the export and type every profile record.
///
/// Unlike the engine, which answers a non-array with `None`, this reports
/// [`InsightsError::InvalidExport`].
pub fn load_profiles(path: &Path) -> Result<Vec<ProfileRecord>> {
    let value = load_export(path)?;
    let entries = value.as_array().ok_or_else(|| {
        InsightsError::InvalidExport(format!("expected an array, found {}", kind_of(&value)))
    })?;
    Ok(entries.iter().map(ProfileRecord::from_value).collect())
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn is_export_name(name: &OsStr) -> bool {
    name.to_str()
        .map(|n| n.eq_ignore_ascii_case(EXPORT_FILE_NAME))
        .unwrap_or(false)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    // ── resolve_export_path ───────────────────────────────────────────────────

    #[test]
    fn test_resolve_file_unchanged() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "export.json", "[]");
        assert_eq!(resolve_export_path(&file), file);
    }

    #[test]
    fn test_resolve_directory_finds_matches_json_any_case() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "Matches.json", "[]");
        assert_eq!(resolve_export_path(dir.path()), file);
    }

    #[test]
    fn test_resolve_directory_nested_one_level() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("export-2024");
        std::fs::create_dir_all(&sub).unwrap();
        let file = write(&sub, "matches.json", "[]");
        assert_eq!(resolve_export_path(dir.path()), file);
    }

    #[test]
    fn test_resolve_directory_prefers_top_level() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("a-export");
        std::fs::create_dir_all(&sub).unwrap();
        write(&sub, "matches.json", "[]");
        let top = write(dir.path(), "matches.json", "[]");
        assert_eq!(resolve_export_path(dir.path()), top);
    }

    #[test]
    fn test_resolve_directory_ignores_deeper_levels() {
        let dir = TempDir::new().unwrap();
        let deep = dir.path().join("one").join("two");
        std::fs::create_dir_all(&deep).unwrap();
        write(&deep, "matches.json", "[]");
        assert_eq!(
            resolve_export_path(dir.path()),
            dir.path().join(EXPORT_FILE_NAME)
        );
    }

    #[test]
    fn test_resolve_directory_skips_directory_named_like_export() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("matches.json")).unwrap();
        let sub = dir.path().join("export");
        std::fs::create_dir_all(&sub).unwrap();
        let file = write(&sub, "MATCHES.JSON", "[]");
        assert_eq!(resolve_export_path(dir.path()), file);
    }

    #[test]
    fn test_resolve_directory_without_export() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            resolve_export_path(dir.path()),
            dir.path().join(EXPORT_FILE_NAME)
        );
    }

    // ── parse_export / load_export ────────────────────────────────────────────

    #[test]
    fn test_parse_export_strips_bom() {
        let value = parse_export("\u{feff}[{\"like\": []}]").unwrap();
        assert!(value.is_array());
    }

    #[test]
    fn test_parse_export_malformed_json() {
        let err = parse_export("[{").unwrap_err();
        assert!(matches!(err, InsightsError::JsonParse(_)));
    }

    #[test]
    fn test_load_export_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_export(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, InsightsError::FileRead { .. }));
    }

    #[test]
    fn test_load_export_reads_file() {
        let dir = TempDir::new().unwrap();
        let file = write(
            dir.path(),
            "matches.json",
            r#"[{"match": [{"timestamp": "2023-01-01 10:00:00"}]}]"#,
        );
        let value = load_export(&file).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
    }

    // ── load_profiles ─────────────────────────────────────────────────────────

    #[test]
    fn test_load_profiles_types_records() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "matches.json",
            r#"[{"chats": [{"body": "hi", "timestamp": "2023-01-01 10:00:00"}]}, {}]"#,
        );
        let profiles = load_profiles(dir.path()).unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].chats[0].body, "hi");
        assert_eq!(profiles[1], ProfileRecord::default());
    }

    #[test]
    fn test_load_profiles_rejects_object() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "matches.json", r#"{"matches": []}"#);
        let err = load_profiles(&file).unwrap_err();
        assert_eq!(err.to_string(), "Invalid export: expected an array, found object");
    }
}
