//! One disassembly task: an image, its plugins, and the analysis so far.

use crate::analysis::{self, Outcome, Pipeline, ReferenceTable};
use crate::arch::Assembler;
use crate::listing::ListingDocument;
use crate::memory::Buffer;
use crate::platform::Loader;
use crate::Address;
use log::info;
use std::fmt;

/// The complete analysis state for one image.
///
/// The session owns the loader, and through it the buffer. The listing and
/// reference table refer into the image by address only.
pub struct Session {
    filename: String,
    loader: Box<dyn Loader>,
    assembler: Box<dyn Assembler>,
    document: ListingDocument,
    references: ReferenceTable,
}

impl Session {
    /// Start a session from the loader's view of the image.
    pub fn new(filename: &str, loader: Box<dyn Loader>, assembler: Box<dyn Assembler>) -> Self {
        let document = loader.create_document();

        Session {
            filename: filename.to_string(),
            loader,
            assembler,
            document,
            references: ReferenceTable::new(),
        }
    }

    /// Discard the current analysis in favor of a saved one.
    pub fn restore(&mut self, document: ListingDocument, references: ReferenceTable) {
        self.document = document;
        self.references = references;
    }

    /// Decode everything reachable from the entry point and from every known
    /// function. Returns the number of instructions added.
    pub fn disassemble(&mut self) -> usize {
        let starts: Vec<Address> = self
            .document
            .entry_point()
            .into_iter()
            .chain(self.document.functions().map(|sym| sym.address()))
            .collect();

        let decoded: usize = starts
            .into_iter()
            .map(|start| {
                analysis::disassemble_from(
                    self.assembler.as_ref(),
                    self.loader.buffer(),
                    &mut self.document,
                    &mut self.references,
                    start,
                )
            })
            .sum();

        info!("{}: decoded {} instructions", self.filename, decoded);

        decoded
    }

    /// Follow code flow as `disassemble` does, then decode whatever is left in
    /// the executable segments front to back.
    pub fn sweep(&mut self) -> usize {
        let mut decoded = self.disassemble();

        for segment in self.loader.buffer().segments().filter(|s| s.is_executable()) {
            decoded += analysis::disassemble_linear(
                self.assembler.as_ref(),
                self.loader.buffer(),
                &mut self.document,
                &mut self.references,
                segment.address()..segment.end_address(),
            );
        }

        decoded
    }

    pub fn analyze(&mut self, pipeline: &Pipeline) -> Vec<Outcome> {
        pipeline.run(
            &mut self.document,
            self.loader.buffer(),
            &mut self.references,
        )
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn buffer(&self) -> &Buffer {
        self.loader.buffer()
    }

    pub fn loader(&self) -> &dyn Loader {
        self.loader.as_ref()
    }

    pub fn assembler(&self) -> &dyn Assembler {
        self.assembler.as_ref()
    }

    pub fn loader_id(&self) -> &str {
        self.loader.id()
    }

    pub fn assembler_id(&self) -> &str {
        self.assembler.id()
    }

    pub fn document(&self) -> &ListingDocument {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut ListingDocument {
        &mut self.document
    }

    pub fn references(&self) -> &ReferenceTable {
        &self.references
    }

    pub fn references_mut(&mut self) -> &mut ReferenceTable {
        &mut self.references
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("filename", &self.filename)
            .field("loader", &self.loader.id())
            .field("assembler", &self.assembler.id())
            .field("instructions", &self.document.instruction_count())
            .field("symbols", &self.document.symbol_count())
            .field("references", &self.references.len())
            .finish()
    }
}
