//! Spool multipart uploads into request-scoped temporary files.
//!
//! Every file part is written to a fresh `TempDir` owned by the returned
//! [`UploadBatch`]; dropping the batch at the end of the request removes
//! every spooled file. Downstream stages only ever see paths, which keeps
//! the extraction strategies (subprocess OCR in particular) uniform.

use crate::error::ServiceError;
use axum::extract::Multipart;
use std::path::PathBuf;
use tempfile::TempDir;
use tracing::debug;

/// One uploaded file, spooled to disk.
#[derive(Debug)]
pub struct UploadedFile {
    /// Client-supplied name, sanitized to a bare file name.
    pub original_name: String,
    /// Location of the spooled bytes inside the batch scratch directory.
    pub temp_path: PathBuf,
    pub size_bytes: u64,
}

/// All files of one request, in upload order.
///
/// The scratch directory lives exactly as long as this value.
pub struct UploadBatch {
    pub files: Vec<UploadedFile>,
    _scratch: TempDir,
}

impl UploadBatch {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Drain the multipart stream, writing each file part to the scratch
/// directory. Non-file form fields are skipped. Part order is preserved.
pub async fn spool_multipart(mut multipart: Multipart) -> Result<UploadBatch, ServiceError> {
    let scratch = TempDir::new().map_err(|source| ServiceError::UploadSpool { source })?;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::UploadStream(e.to_string()))?
    {
        let original_name = match field.file_name() {
            Some(name) => sanitize_name(name),
            None => continue,
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServiceError::UploadStream(e.to_string()))?;

        // Index prefix keeps two uploads with the same name apart.
        let temp_path = scratch
            .path()
            .join(format!("{:03}-{original_name}", files.len()));
        tokio::fs::write(&temp_path, &bytes)
            .await
            .map_err(|source| ServiceError::UploadSpool { source })?;

        debug!(file = %original_name, size_bytes = bytes.len(), "spooled upload");
        files.push(UploadedFile {
            original_name,
            temp_path,
            size_bytes: bytes.len() as u64,
        });
    }

    Ok(UploadBatch {
        files,
        _scratch: scratch,
    })
}

/// Reduce a client-supplied file name to a bare name: no path components,
/// no empty result.
fn sanitize_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();
    if base.is_empty() {
        "upload".to_string()
    } else {
        base.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_pass_through() {
        assert_eq!(sanitize_name("notes.txt"), "notes.txt");
    }

    #[test]
    fn path_components_are_stripped() {
        assert_eq!(sanitize_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_name("C:\\Users\\mallory\\scan.png"), "scan.png");
        assert_eq!(sanitize_name("/tmp/evil.pdf"), "evil.pdf");
    }

    #[test]
    fn empty_names_get_a_fallback() {
        assert_eq!(sanitize_name(""), "upload");
        assert_eq!(sanitize_name("dir/"), "upload");
        assert_eq!(sanitize_name("   "), "upload");
    }
}
