//! Upload command handler.

use tabled::{Table, Tabled, settings::Style};

use deskly_core::{CoreError, UploadFile, UploadedFile};

use crate::cli::{GlobalOpts, OutputFormat, UploadArgs, UploadKind};
use crate::error::CliError;
use crate::output;

use super::{Session, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct UploadRow {
    #[tabled(rename = "File")]
    file_name: String,
    #[tabled(rename = "URL")]
    file_url: String,
    #[tabled(rename = "Size")]
    size: u64,
    #[tabled(rename = "Type")]
    mime_type: String,
}

impl From<&UploadedFile> for UploadRow {
    fn from(f: &UploadedFile) -> Self {
        Self {
            file_name: f.file_name.clone(),
            file_url: f.file_url.clone(),
            size: f.size,
            mime_type: f.mime_type.clone().unwrap_or_else(|| "-".into()),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    args: UploadArgs,
    session: &Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if !args.kind.is_multiple() && args.paths.len() != 1 {
        return Err(CliError::Validation {
            field: "paths".into(),
            reason: format!(
                "{} uploads take exactly one file; use the plural form for several",
                kind_name(args.kind)
            ),
        });
    }

    let mut files = Vec::with_capacity(args.paths.len());
    for path in &args.paths {
        let file = UploadFile::from_path(path).await.map_err(CoreError::from)?;
        files.push(match util::guess_mime(path) {
            Some(mime) => file.with_mime_type(mime),
            None => file,
        });
    }

    let client = &session.client;
    let folder = args.folder.as_deref();
    let uploaded = match args.kind {
        UploadKind::Image | UploadKind::File => {
            let Some(file) = files.pop() else {
                return Err(CliError::Internal("no file to upload".into()));
            };
            let one = if args.kind == UploadKind::Image {
                client.upload_image(file, folder).await
            } else {
                client.upload_file(file, folder).await
            };
            vec![one.map_err(CoreError::from)?]
        }
        UploadKind::Images => client
            .upload_images(files, folder)
            .await
            .map_err(CoreError::from)?,
        UploadKind::Files => client
            .upload_files(files, folder)
            .await
            .map_err(CoreError::from)?,
    };

    if !global.quiet {
        eprintln!("Uploaded {} file(s)", uploaded.len());
    }
    let out = match global.output {
        OutputFormat::Table => {
            let rows: Vec<UploadRow> = uploaded.iter().map(UploadRow::from).collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Plain => uploaded
            .iter()
            .map(|f| f.file_url.clone())
            .collect::<Vec<_>>()
            .join("\n"),
        format => output::render_value(format, &uploaded)?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

fn kind_name(kind: UploadKind) -> &'static str {
    match kind {
        UploadKind::Image => "image",
        UploadKind::Images => "images",
        UploadKind::File => "file",
        UploadKind::Files => "files",
    }
}
