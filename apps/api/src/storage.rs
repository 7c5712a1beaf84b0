//! Resume storage: PDF validation, S3 upload and text extraction.

use anyhow::Result;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use tracing::{info, warn};
use uuid::Uuid;

pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Rejects empty, oversized and non-PDF uploads. Returns the reason on failure.
pub fn validate_resume(bytes: &[u8], content_type: Option<&str>) -> Result<(), String> {
    if bytes.is_empty() {
        return Err("Resume file is empty".to_string());
    }
    if bytes.len() > MAX_RESUME_BYTES {
        return Err(format!(
            "Resume exceeds the {} MiB limit",
            MAX_RESUME_BYTES / (1024 * 1024)
        ));
    }
    if let Some(ct) = content_type {
        if ct != "application/pdf" && ct != "application/octet-stream" {
            return Err(format!("Resume must be a PDF, got {ct}"));
        }
    }
    if !bytes.starts_with(PDF_MAGIC) {
        return Err("Resume must be a PDF".to_string());
    }
    Ok(())
}

pub fn resume_key(student_id: Uuid) -> String {
    format!("resumes/{}/{}.pdf", student_id, Uuid::new_v4())
}

pub async fn upload_resume(s3: &S3Client, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<()> {
    let size = bytes.len();
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(bytes))
        .content_type("application/pdf")
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("S3 upload failed: {e}"))?;

    info!("Uploaded resume to s3://{bucket}/{key} ({size} bytes)");
    Ok(())
}

/// Extracts plain text. A PDF that cannot be parsed yields an empty string.
pub fn extract_resume_text(bytes: &[u8]) -> String {
    match pdf_extract::extract_text_from_mem(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!("Resume text extraction failed, skipping skill detection: {e}");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_resume_accepts_pdf() {
        assert!(validate_resume(b"%PDF-1.7\n...", Some("application/pdf")).is_ok());
        assert!(validate_resume(b"%PDF-1.4", None).is_ok());
    }

    #[test]
    fn test_validate_resume_rejects_bad_input() {
        assert!(validate_resume(b"", None).is_err());
        assert!(validate_resume(b"PK\x03\x04", None).is_err());
        assert!(validate_resume(b"%PDF-1.7", Some("image/png")).is_err());

        let oversized = vec![b'a'; MAX_RESUME_BYTES + 1];
        let err = validate_resume(&oversized, None).unwrap_err();
        assert!(err.contains("5 MiB"));
    }

    #[test]
    fn test_resume_key_layout() {
        let id = Uuid::from_u128(7);
        let key = resume_key(id);
        assert!(key.starts_with(&format!("resumes/{id}/")));
        assert!(key.ends_with(".pdf"));
    }
}
