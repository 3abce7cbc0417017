//! Flat binary images

use crate::listing::{ListingDocument, Symbol, SymbolKind, Visibility};
use crate::memory::Buffer;
use crate::platform::{LoadRequest, Loader};
use log::warn;

/// Identity string of the flat binary loader.
pub const ID: &str = "binary";

/// Maps the whole file at address 0 as one executable segment, starting
/// execution at its first byte.
///
/// The mapping depends on nothing but the file, so a saved session can always
/// rebuild it.
#[derive(Clone, Debug)]
pub struct BinaryLoader {
    buffer: Buffer,
}

impl BinaryLoader {
    pub fn new(request: LoadRequest) -> Self {
        let (_, data) = request.into_parts();

        BinaryLoader {
            buffer: Buffer::flat(data, 0),
        }
    }

    /// Loader factory for the registry.
    pub fn boxed(request: LoadRequest) -> Box<dyn Loader> {
        Box::new(Self::new(request))
    }
}

impl Loader for BinaryLoader {
    fn id(&self) -> &str {
        ID
    }

    fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    fn create_document(&self) -> ListingDocument {
        let mut doc = ListingDocument::new();

        for segment in self.buffer.segments() {
            doc.mark_unexplored(segment.address(), segment.size());

            if segment.is_executable() && doc.entry_point().is_none() {
                doc.set_entry_point(segment.address());

                if let Err(e) = doc.insert_symbol(Symbol::new(
                    segment.address(),
                    "start",
                    SymbolKind::Function,
                    Visibility::Exported,
                )) {
                    warn!("Cannot name the entry point: {}", e);
                }
            }
        }

        doc
    }
}
