// Upload sub-API consumer.
//
// The upload service is an external collaborator; this module only speaks
// its contract: `multipart/form-data` POSTs to `/upload/image`,
// `/upload/images`, `/upload/file`, `/upload/files` with an optional
// `folder` text field, answering `{ fileUrl, fileName, size, mimeType }`.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::client::CrudClient;
use crate::envelope::unwrap_data;
use crate::error::Error;

/// A file ready to be sent.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }

    /// Read a file from disk; the file name is taken from the path.
    pub async fn from_path(path: &Path) -> Result<Self, Error> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_owned(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(file_name, bytes))
    }

    fn into_part(self) -> Result<Part, Error> {
        let part = Part::bytes(self.bytes).file_name(self.file_name);
        match self.mime_type {
            Some(mime) => part.mime_str(&mime).map_err(|e| Error::InvalidRequest {
                message: format!("invalid mime type {mime:?}: {e}"),
            }),
            None => Ok(part),
        }
    }
}

/// What the upload service reports for each stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub file_url: String,
    pub file_name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl CrudClient {
    /// `POST /upload/image`, form field `image`.
    pub async fn upload_image(
        &self,
        file: UploadFile,
        folder: Option<&str>,
    ) -> Result<UploadedFile, Error> {
        self.upload_one("image", file, folder).await
    }

    /// `POST /upload/images`, repeated form field `images`.
    pub async fn upload_images(
        &self,
        files: Vec<UploadFile>,
        folder: Option<&str>,
    ) -> Result<Vec<UploadedFile>, Error> {
        self.upload_many("images", files, folder).await
    }

    /// `POST /upload/file`, form field `file`.
    pub async fn upload_file(
        &self,
        file: UploadFile,
        folder: Option<&str>,
    ) -> Result<UploadedFile, Error> {
        self.upload_one("file", file, folder).await
    }

    /// `POST /upload/files`, repeated form field `files`.
    pub async fn upload_files(
        &self,
        files: Vec<UploadFile>,
        folder: Option<&str>,
    ) -> Result<Vec<UploadedFile>, Error> {
        self.upload_many("files", files, folder).await
    }

    async fn upload_one(
        &self,
        field: &str,
        file: UploadFile,
        folder: Option<&str>,
    ) -> Result<UploadedFile, Error> {
        let form = with_folder(Form::new().part(field.to_owned(), file.into_part()?), folder);
        let value = self.post_form(field, form).await?;
        let value = match value {
            Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            other => other,
        };
        decode(value)
    }

    async fn upload_many(
        &self,
        field: &str,
        files: Vec<UploadFile>,
        folder: Option<&str>,
    ) -> Result<Vec<UploadedFile>, Error> {
        let mut form = Form::new();
        for file in files {
            form = form.part(field.to_owned(), file.into_part()?);
        }
        let value = self.post_form(field, with_folder(form, folder)).await?;
        match value {
            Value::Array(items) => items.into_iter().map(decode).collect(),
            single => Ok(vec![decode(single)?]),
        }
    }

    async fn post_form(&self, kind: &str, form: Form) -> Result<Value, Error> {
        let url = self.url("upload", &[kind])?;
        debug!("POST {url} (multipart)");

        let resp = self.send(self.http().post(url).multipart(form)).await?;
        let body = self.body_text(resp).await?;
        let value: Value = serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: body.clone(),
        })?;
        let value = unwrap_data(value)?;
        // Some deployments wrap file lists as `{ files: [...] }`.
        Ok(match value {
            Value::Object(mut obj) if obj.contains_key("files") && !obj.contains_key("fileUrl") => {
                obj.remove("files").unwrap_or(Value::Null)
            }
            other => other,
        })
    }
}

fn with_folder(form: Form, folder: Option<&str>) -> Form {
    match folder {
        Some(f) => form.text("folder", f.to_owned()),
        None => form,
    }
}

fn decode(value: Value) -> Result<UploadedFile, Error> {
    let body = value.to_string();
    serde_json::from_value(value).map_err(|e| Error::Deserialization {
        message: format!("unexpected upload response: {e}"),
        body,
    })
}
