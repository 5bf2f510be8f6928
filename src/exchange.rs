use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::domain::{EXPORT_FILE_NAME, TVError};
use crate::record::Record;

/// Expands `~` and environment variables in a user supplied path.
pub fn expand_path(raw: &str) -> Result<PathBuf, TVError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TVError::InvalidPath("empty path".into()));
    }
    let expanded =
        shellexpand::full(trimmed).map_err(|e| TVError::InvalidPath(e.to_string()))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

fn check_file(path: &Path) -> Result<(), TVError> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => TVError::FileNotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => TVError::PermissionDenied(path.to_path_buf()),
        _ => TVError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(TVError::NotAFile(path.to_path_buf()));
    }
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("JSON") => Ok(()),
        _ => Err(TVError::UnknownFileType(path.to_path_buf())),
    }
}

/// Parses a JSON array of records. Anything else is rejected with the serde error.
/// A leading byte order mark is skipped.
pub fn parse_records(text: &str) -> Result<Vec<Record>, TVError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let records: Vec<Record> = serde_json::from_str(text)?;
    Ok(records)
}

#[instrument]
pub fn import_file(path: &Path) -> Result<Vec<Record>, TVError> {
    check_file(path)?;
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::PermissionDenied => TVError::PermissionDenied(path.to_path_buf()),
        _ => TVError::IoError(e),
    })?;
    let records = parse_records(&text)?;
    info!("Imported {} records", records.len());
    Ok(records)
}

/// The export document: the records pretty printed with two space indentation.
pub fn export_string(records: &[Record]) -> Result<String, TVError> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Writes `spreadsheet_data.json` into `dir` and returns its path.
#[instrument(skip(records), fields(records = records.len()))]
pub fn export_file(records: &[Record], dir: &Path) -> Result<PathBuf, TVError> {
    let path = dir.join(EXPORT_FILE_NAME);
    let text = export_string(records)?;
    debug!("Writing {} bytes", text.len());
    fs::write(&path, text).map_err(|e| match e.kind() {
        ErrorKind::NotFound => TVError::FileNotFound(dir.to_path_buf()),
        ErrorKind::PermissionDenied => TVError::PermissionDenied(path.clone()),
        _ => TVError::IoError(e),
    })?;
    info!("Exported to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::sample_data;

    const FIXTURE: &str = include_str!("../tests/fixtures/jobs_01.json");

    #[test]
    fn fixture_parses_into_records() {
        let records = parse_records(FIXTURE).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].job, "Audit vendor contracts");
        assert_eq!(records[1].submitter.avatar, "N");
        assert_eq!(records[2].status, "");
    }

    #[test]
    fn export_then_import_is_identity() {
        let records = sample_data();
        let text = export_string(&records).unwrap();
        assert_eq!(parse_records(&text).unwrap(), records);

        let again = export_string(&parse_records(FIXTURE).unwrap()).unwrap();
        assert_eq!(again.trim_end(), FIXTURE.trim_end());
    }

    #[test]
    fn export_is_two_space_indented_in_field_order() {
        let text = export_string(&[Record::with_job("a")]).unwrap();
        let expected = r#"[
  {
    "job": "a",
    "date": "",
    "status": "",
    "submitter": {
      "name": "",
      "avatar": ""
    },
    "url": "",
    "assigned": {
      "name": "",
      "avatar": ""
    },
    "priority": "",
    "due": "",
    "value": ""
  }
]"#;
        assert_eq!(text, expected);
    }

    #[test]
    fn empty_array_is_valid() {
        assert!(parse_records("[]").unwrap().is_empty());
    }

    #[test]
    fn malformed_and_mis_shaped_input_is_rejected() {
        assert!(matches!(
            parse_records("[{\"job\": "),
            Err(TVError::JsonError(_))
        ));
        assert!(matches!(
            parse_records("{\"job\": \"x\"}"),
            Err(TVError::JsonError(_))
        ));
        let missing_name = FIXTURE.replacen("\"name\": \"Nina Rossi\",", "", 1);
        let err = parse_records(&missing_name).unwrap_err();
        assert!(err.to_string().contains("name"), "{err}");
        assert!(parse_records("[{\"job\": 1}]").is_err());
    }

    #[test]
    fn import_checks_the_file() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            import_file(&missing),
            Err(TVError::FileNotFound(_))
        ));
        assert!(matches!(import_file(dir.path()), Err(TVError::NotAFile(_))));

        let csv = dir.path().join("data.csv");
        fs::write(&csv, "[]").unwrap();
        assert!(matches!(
            import_file(&csv),
            Err(TVError::UnknownFileType(_))
        ));

        let upper = dir.path().join("DATA.JSON");
        fs::write(&upper, "[]").unwrap();
        assert!(import_file(&upper).unwrap().is_empty());
    }

    #[test]
    fn byte_order_mark_is_skipped() {
        assert!(parse_records("\u{feff}[]").unwrap().is_empty());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bom.json");
        fs::write(&path, format!("\u{feff}{FIXTURE}")).unwrap();
        assert_eq!(import_file(&path).unwrap(), parse_records(FIXTURE).unwrap());
    }

    #[test]
    fn export_file_writes_into_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let records = sample_data();
        let path = export_file(&records, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("spreadsheet_data.json"));
        assert_eq!(import_file(&path).unwrap(), records);
    }

    #[test]
    fn export_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(export_file(&sample_data(), &missing).is_err());
    }

    #[test]
    fn paths_are_expanded() {
        assert!(matches!(expand_path("  "), Err(TVError::InvalidPath(_))));
        assert_eq!(
            expand_path(" data/jobs.json ").unwrap(),
            PathBuf::from("data/jobs.json")
        );
        if let Ok(home) = std::env::var("HOME") {
            assert_eq!(
                expand_path("~/jobs.json").unwrap(),
                PathBuf::from(home).join("jobs.json")
            );
        }
    }
}
