//! Loader trait

use crate::listing::ListingDocument;
use crate::memory::Buffer;

/// An executable's name and raw bytes, as handed to a loader factory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadRequest {
    filename: String,
    data: Vec<u8>,
}

impl LoadRequest {
    pub fn new(filename: &str, data: Vec<u8>) -> Self {
        LoadRequest {
            filename: filename.to_string(),
            data,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_parts(self) -> (String, Vec<u8>) {
        (self.filename, self.data)
    }
}

/// Trait to represent an executable format.
///
/// A loader owns the mapped image and knows how to turn it into the starting
/// listing for analysis: segments, entry point, and whatever symbols the
/// format carries.
pub trait Loader: Send + Sync {
    /// Identity string the loader is registered under.
    fn id(&self) -> &str;

    fn buffer(&self) -> &Buffer;

    /// Build a fresh listing from the image alone.
    fn create_document(&self) -> ListingDocument;
}
