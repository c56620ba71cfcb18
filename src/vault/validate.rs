use std::path::Path;

use crate::api::{ClientError, Result};

/// Default upload ceiling: 10 MB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Extensions the backend can chunk.
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["pdf", "txt", "docx"];

/// A file that passed the type check, ready for the multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadKind {
    pub file_name: String,
    pub mime_type: &'static str,
}

/// Check the file type from its name alone. Runs before the file is touched.
pub fn check_type(path: &Path) -> Result<UploadKind> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ClientError::validation("Choose a file to upload"))?;

    let ext = extension(file_name);
    if !ext
        .as_deref()
        .is_some_and(|e| ALLOWED_EXTENSIONS.contains(&e))
    {
        return Err(ClientError::validation(
            "Only PDF, TXT, and DOCX files are supported",
        ));
    }

    Ok(UploadKind {
        file_name: file_name.to_string(),
        mime_type: guess_mime_type(file_name),
    })
}

/// Reject files over `max_bytes`. Exactly `max_bytes` is allowed.
pub fn check_size(size: u64, max_bytes: u64) -> Result<()> {
    if size > max_bytes {
        return Err(ClientError::validation(format!(
            "File size must be less than {}",
            human_size(max_bytes)
        )));
    }
    Ok(())
}

/// Guess MIME type from filename extension.
pub fn guess_mime_type(file_name: &str) -> &'static str {
    match extension(file_name).as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        _ => "application/octet-stream",
    }
}

/// Short kind label for listings.
pub fn kind_label(file_name: &str) -> &'static str {
    match extension(file_name).as_deref() {
        Some("pdf") => "PDF",
        Some("docx") => "DOCX",
        Some("txt") => "TXT",
        _ => "FILE",
    }
}

fn extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn human_size(bytes: u64) -> String {
    const MB: u64 = 1024 * 1024;
    if bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else {
        format!("{:.1}MB", bytes as f64 / MB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_extensions_case_insensitively() {
        let kind = check_type(Path::new("/tmp/Report.PDF")).unwrap();
        assert_eq!(kind.file_name, "Report.PDF");
        assert_eq!(kind.mime_type, "application/pdf");
        assert!(check_type(Path::new("notes.txt")).is_ok());
        assert!(check_type(Path::new("Contract.DocX")).is_ok());
    }

    #[test]
    fn rejects_other_types() {
        for name in ["photo.png", "archive.pdf.zip", "README", ".pdf", "doc."] {
            let err = check_type(Path::new(name)).unwrap_err();
            assert_eq!(err.to_string(), "Only PDF, TXT, and DOCX files are supported");
        }
    }

    #[test]
    fn size_limit_is_inclusive() {
        assert!(check_size(DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_MAX_UPLOAD_BYTES).is_ok());
        let err = check_size(DEFAULT_MAX_UPLOAD_BYTES + 1, DEFAULT_MAX_UPLOAD_BYTES).unwrap_err();
        assert_eq!(err.to_string(), "File size must be less than 10MB");
    }

    #[test]
    fn kind_labels() {
        assert_eq!(kind_label("a.pdf"), "PDF");
        assert_eq!(kind_label("a.docx"), "DOCX");
        assert_eq!(kind_label("a.txt"), "TXT");
        assert_eq!(kind_label("Unknown"), "FILE");
    }
}
