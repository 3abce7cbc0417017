//! Promote call targets to functions

use crate::analysis::{Analyzer, Outcome, ReferenceKind, ReferenceTable};
use crate::listing::{ListingDocument, Symbol, SymbolKind};
use crate::memory::Buffer;
use log::debug;
use std::collections::BTreeSet;

/// Makes every called address a `Function` symbol.
///
/// Jump targets that later turn out to be called keep a real name if they
/// have one and otherwise trade their `loc_` placeholder for a `sub_` one.
/// Imports are left alone. Reports the lowest promoted address.
#[derive(Copy, Clone, Debug, Default)]
pub struct CallTargetAnalyzer;

impl Analyzer for CallTargetAnalyzer {
    fn name(&self) -> &str {
        "call targets"
    }

    fn analyze(
        &self,
        document: &mut ListingDocument,
        _buffer: &Buffer,
        references: &mut ReferenceTable,
    ) -> Outcome {
        let targets: BTreeSet<_> = references
            .of_kind(ReferenceKind::Call)
            .map(|r| r.to())
            .collect();
        let mut first = None;

        for target in targets {
            let promoted = match document.symbol(target) {
                Some(sym) if sym.is_function() || sym.kind() == SymbolKind::Import => continue,
                Some(sym) if !sym.is_placeholder() => {
                    let name = sym.name().to_string();

                    document.rename_symbol(target, &name, SymbolKind::Function)
                }
                _ => document.insert_symbol(Symbol::placeholder(target, SymbolKind::Function)),
            };

            match promoted {
                Ok(()) => {
                    debug!("Promoted {:#x} to a function", target);
                    first = first.or(Some(target));
                }
                Err(e) => debug!("Cannot promote {:#x}: {}", target, e),
            }
        }

        first.map_or(Outcome::NotFound, Outcome::Found)
    }
}
