//! # Evidence References
//!
//! Opaque pointers to proof material (images, documents, videos) uploaded
//! through the platform's object storage. The engine stores the locator
//! and declared metadata and passes them through — it never fetches,
//! parses, or validates file contents.

use serde::{Deserialize, Serialize};

use soko_core::{Timestamp, UserId, ValidationError};

/// An opaque reference to an externally stored evidence file.
///
/// Immutable after creation. The declared media type and size are taken at
/// the uploader's word; verification against the stored object is the
/// storage collaborator's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRef {
    /// Storage locator (URL or storage key). Never dereferenced by the
    /// engine.
    pub locator: String,
    /// Declared media type (e.g. `image/jpeg`).
    pub media_type: String,
    /// Declared size in bytes.
    pub size_bytes: u64,
    /// The user who uploaded the file.
    pub uploaded_by: UserId,
    /// When the reference was recorded.
    pub uploaded_at: Timestamp,
}

impl EvidenceRef {
    /// Create an evidence reference, validating the declared metadata.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyField`] when the locator or media
    /// type is empty, and [`ValidationError::NonPositiveAmount`] when the
    /// declared size is zero.
    pub fn new(
        locator: impl Into<String>,
        media_type: impl Into<String>,
        size_bytes: u64,
        uploaded_by: UserId,
        uploaded_at: Timestamp,
    ) -> Result<Self, ValidationError> {
        let locator = locator.into();
        let media_type = media_type.into();
        if locator.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "locator" });
        }
        if media_type.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "media_type" });
        }
        if size_bytes == 0 {
            return Err(ValidationError::NonPositiveAmount(0));
        }
        Ok(Self {
            locator,
            media_type,
            size_bytes,
            uploaded_by,
            uploaded_at,
        })
    }
}
