//! Upload validation: content-type and extension whitelists applied to the
//! whole batch before any extraction starts.

use crate::resumes::models::UploadedFile;

pub const ALLOWED_MIME_TYPES: &[&str] = &["application/pdf", "image/png", "image/jpeg"];
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg"];

/// Lowercased extension of `filename`, if it has one.
pub fn file_extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Checks one file against both whitelists. A missing filename or content
/// type fails here too, since neither can match its whitelist.
pub fn validate_upload(file: &UploadedFile) -> Result<(), String> {
    if !ALLOWED_MIME_TYPES.contains(&file.content_type.as_str()) {
        return Err(format!(
            "Unsupported file type '{}' for file '{}'. Allowed types: {}",
            file.content_type,
            file.file_name,
            ALLOWED_MIME_TYPES.join(", ")
        ));
    }

    match file_extension(&file.file_name) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(format!(
            "Unsupported file extension for file '{}'",
            file.file_name
        )),
    }
}

/// Validates every file before anything is processed. The first offender
/// aborts the whole request.
pub fn validate_uploads(files: &[UploadedFile]) -> Result<(), String> {
    for file in files {
        validate_upload(file)?;
    }
    Ok(())
}
