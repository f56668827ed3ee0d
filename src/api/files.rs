//! File system endpoints

use super::client::ApiClient;
use super::types::{DownloadedFile, FileRecord, FileSystemItem, Folder, FolderCreate, ItemKind};
use crate::error::{DocchatError, Result};

use reqwest::multipart::{Form, Part};
use reqwest::Method;
use std::path::Path;

impl ApiClient {
    /// `GET /files/browse`; `None` lists the root.
    pub async fn browse(&self, folder_id: Option<i64>) -> Result<Vec<FileSystemItem>> {
        let path = "/files/browse";
        let mut builder = self.request(Method::GET, path);
        if let Some(id) = folder_id {
            builder = builder.query(&[("folder_id", id)]);
        }
        let response = self.execute(path, builder).await?;
        Ok(response.json().await.map_err(DocchatError::Http)?)
    }

    /// `GET /files/folders/{id}`
    pub async fn folder(&self, folder_id: i64) -> Result<Folder> {
        self.get_json(&format!("/files/folders/{}", folder_id)).await
    }

    /// `POST /files/folders`
    pub async fn create_folder(&self, name: &str, parent_id: Option<i64>) -> Result<Folder> {
        self.send_json(
            Method::POST,
            "/files/folders",
            &FolderCreate { name, parent_id },
        )
        .await
    }

    /// `POST /files/upload` as multipart form data.
    pub async fn upload(&self, file: &Path, folder_id: Option<i64>) -> Result<FileRecord> {
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                DocchatError::Validation(format!("Not a file path: {}", file.display()))
            })?
            .to_string();
        let bytes = tokio::fs::read(file).await?;
        tracing::info!("Uploading {} ({} bytes)", file_name, bytes.len());

        let mut form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        if let Some(id) = folder_id {
            form = form.text("folder_id", id.to_string());
        }

        let path = "/files/upload";
        let builder = self.request(Method::POST, path).multipart(form);
        let response = self.execute(path, builder).await?;
        Ok(response.json().await.map_err(DocchatError::Http)?)
    }

    /// `GET /files/download/{id}`
    ///
    /// The file name comes from the `Content-Disposition` header when the
    /// backend sends one.
    pub async fn download(&self, file_id: i64) -> Result<DownloadedFile> {
        let path = format!("/files/download/{}", file_id);
        let response = self.execute(&path, self.request(Method::GET, &path)).await?;
        let filename = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_filename);
        let bytes = response.bytes().await.map_err(DocchatError::Http)?;
        Ok(DownloadedFile {
            filename,
            bytes: bytes.to_vec(),
        })
    }

    /// `DELETE /files/files/{id}` or `DELETE /files/folders/{id}`.
    ///
    /// Deleting a folder soft-deletes everything beneath it.
    pub async fn delete_item(&self, kind: ItemKind, id: i64) -> Result<()> {
        let path = format!("/files/{}/{}", kind.route_segment(), id);
        self.send_unit(self.request(Method::DELETE, &path), &path)
            .await
    }
}

/// `attachment; filename="report.pdf"` → `report.pdf`
fn disposition_filename(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_filename() {
        assert_eq!(
            disposition_filename(r#"attachment; filename="report.pdf""#).as_deref(),
            Some("report.pdf")
        );
        assert_eq!(
            disposition_filename("attachment; filename=notes.txt").as_deref(),
            Some("notes.txt")
        );
        assert_eq!(disposition_filename("inline"), None);
    }
}
