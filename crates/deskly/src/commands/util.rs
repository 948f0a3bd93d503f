//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;

use serde_json::Value;

use crate::cli::PayloadArgs;
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal there is nobody to ask, so `--yes` becomes mandatory.
pub fn confirm(message: &str, yes_flag: bool, action: &str) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file(path: &Path) -> Result<Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// Resolve `--data` / `--from-file` into a JSON object payload.
pub fn read_payload(args: &PayloadArgs) -> Result<Value, CliError> {
    let (field, value) = match (&args.data, &args.from_file) {
        (Some(raw), _) => (
            "data",
            serde_json::from_str(raw).map_err(|e| CliError::Validation {
                field: "data".into(),
                reason: format!("invalid JSON: {e}"),
            })?,
        ),
        (None, Some(path)) => ("from-file", read_json_file(path)?),
        (None, None) => {
            return Err(CliError::Validation {
                field: "data".into(),
                reason: "provide --data or --from-file".into(),
            });
        }
    };
    if value.is_object() {
        Ok(value)
    } else {
        Err(CliError::Validation {
            field: field.into(),
            reason: "payload must be a JSON object".into(),
        })
    }
}

/// Split a `KEY=VALUE` filter argument.
pub fn parse_filter(raw: &str) -> Result<(String, String), CliError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.trim().to_owned()))
        }
        _ => Err(CliError::Validation {
            field: "filter".into(),
            reason: format!("expected KEY=VALUE, got {raw:?}"),
        }),
    }
}

/// Best-effort MIME type from a file extension.
pub fn guess_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    Some(match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        "zip" => "application/zip",
        _ => return None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn filters_split_on_first_equals() {
        assert_eq!(
            parse_filter("status=published").unwrap(),
            ("status".into(), "published".into())
        );
        assert_eq!(
            parse_filter("tags=a=b").unwrap(),
            ("tags".into(), "a=b".into())
        );
        assert!(parse_filter("status").is_err());
        assert!(parse_filter("=x").is_err());
    }

    #[test]
    fn payload_must_be_an_object() {
        let ok = PayloadArgs {
            data: Some(r#"{"title":"Hi"}"#.into()),
            from_file: None,
        };
        assert_eq!(read_payload(&ok).unwrap()["title"], "Hi");

        let array = PayloadArgs {
            data: Some("[1,2]".into()),
            from_file: None,
        };
        assert!(matches!(
            read_payload(&array),
            Err(CliError::Validation { .. })
        ));
    }

    #[test]
    fn payload_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post.json");
        std::fs::write(&path, r#"{"title":"From disk"}"#).unwrap();
        let args = PayloadArgs {
            data: None,
            from_file: Some(path),
        };
        assert_eq!(read_payload(&args).unwrap()["title"], "From disk");
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(guess_mime(&PathBuf::from("a.PNG")), Some("image/png"));
        assert_eq!(guess_mime(&PathBuf::from("cv.pdf")), Some("application/pdf"));
        assert_eq!(guess_mime(&PathBuf::from("noext")), None);
    }
}
