//! Uploaded image abstraction.

/// An image received from a client, held in memory.
///
/// The HTTP layer bounds the size of the upload before one of these is
/// built.
///
/// # Examples
///
/// ```rust
/// use vision_shield::core::ImageUpload;
///
/// let upload = ImageUpload::new(vec![0xFF, 0xD8, 0xFF])
///     .with_file_name("receipt.jpg")
///     .with_content_type("image/jpeg");
/// assert_eq!(upload.size(), 3);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    data: Vec<u8>,
    file_name: String,
    content_type: String,
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("data_len", &self.data.len())
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .finish()
    }
}

impl ImageUpload {
    /// Creates an upload from raw bytes with unknown name and type.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            file_name: "upload".to_string(),
            content_type: "application/octet-stream".to_string(),
        }
    }

    /// Sets the original file name.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Sets the declared MIME type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Raw image bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Original file name as given by the client.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Declared MIME type.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Returns `true` if the upload carries no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Vec<u8>> for ImageUpload {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}
