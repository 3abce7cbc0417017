//! Ordered analyzer passes

use crate::analysis::{CallTargetAnalyzer, Convention, LibcMainAnalyzer, ReferenceTable};
use crate::listing::ListingDocument;
use crate::memory::Buffer;
use crate::Address;
use log::info;

/// Result of one analyzer pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The pass identified what it was looking for at this address.
    Found(Address),

    /// The heuristic did not apply. The listing is unchanged.
    NotFound,
}

impl Outcome {
    pub fn is_found(self) -> bool {
        matches!(self, Outcome::Found(_))
    }
}

/// A heuristic that refines the listing after decoding.
///
/// Passes must not fail: when their heuristic does not apply they leave the
/// listing alone and report `NotFound`.
pub trait Analyzer: Send + Sync {
    fn name(&self) -> &str;

    fn analyze(
        &self,
        document: &mut ListingDocument,
        buffer: &Buffer,
        references: &mut ReferenceTable,
    ) -> Outcome;
}

/// A fixed sequence of analyzer passes.
///
/// Each pass runs exactly once, in the order it was pushed. Later passes may
/// rely on what earlier ones added, but nothing is ever re-run.
#[derive(Default)]
pub struct Pipeline {
    passes: Vec<Box<dyn Analyzer>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// The passes for a dynamically linked ELF executable.
    pub fn elf_default(convention: Convention) -> Self {
        let mut pipeline = Self::new();

        pipeline
            .push(CallTargetAnalyzer)
            .push(LibcMainAnalyzer::new(convention));

        pipeline
    }

    pub fn push<A>(&mut self, pass: A) -> &mut Self
    where
        A: Analyzer + 'static,
    {
        self.passes.push(Box::new(pass));
        self
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.passes.iter().map(|pass| pass.name())
    }

    /// Run every pass over the listing, returning each pass's outcome.
    pub fn run(
        &self,
        document: &mut ListingDocument,
        buffer: &Buffer,
        references: &mut ReferenceTable,
    ) -> Vec<Outcome> {
        self.passes
            .iter()
            .map(|pass| {
                let outcome = pass.analyze(document, buffer, references);

                match outcome {
                    Outcome::Found(address) => info!("{}: found {:#x}", pass.name(), address),
                    Outcome::NotFound => info!("{}: nothing found", pass.name()),
                }

                outcome
            })
            .collect()
    }
}
