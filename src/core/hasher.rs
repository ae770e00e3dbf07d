//! Upload digests with BLAKE3.
//!
//! Digests are only used to correlate audit records for the same image; the
//! image itself is never logged.

use crate::core::input::ImageUpload;
use crate::core::types::FileHash;

/// Computes content digests for uploads.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileHasher;

impl FileHasher {
    /// Creates a new hasher.
    pub fn new() -> Self {
        Self
    }

    /// Computes the digest of raw bytes.
    pub fn hash_bytes(&self, data: &[u8]) -> FileHash {
        FileHash::new(blake3::hash(data).to_hex().to_string())
    }

    /// Computes the digest of an upload's bytes.
    pub fn hash_upload(&self, upload: &ImageUpload) -> FileHash {
        self.hash_bytes(upload.bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_and_content_addressed() {
        let hasher = FileHasher::new();
        let a = hasher.hash_bytes(b"same bytes");
        let b = hasher.hash_upload(&ImageUpload::new(b"same bytes".to_vec()).with_file_name("x"));
        let c = hasher.hash_bytes(b"other bytes");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.blake3.len(), 64);
    }
}
