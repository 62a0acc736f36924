use bytes::Bytes;

use crate::errors::AppError;

/// Extracts plain text from an uploaded PDF on the blocking pool.
pub async fn extract_text(pdf: Bytes) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&pdf))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF extraction task failed: {e}")))?
        .map_err(|e| AppError::UnprocessableEntity(format!("Could not read PDF: {e}")))
}
