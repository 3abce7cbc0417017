//! Cross-references between addresses

use crate::Address;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::iter::FromIterator;
use std::{fmt, slice, str};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReferenceKind {
    Call,
    Jump,
    Read,
    Write,
}

impl str::FromStr for ReferenceKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_ref() {
            "call" => Ok(ReferenceKind::Call),
            "jump" => Ok(ReferenceKind::Jump),
            "read" => Ok(ReferenceKind::Read),
            "write" => Ok(ReferenceKind::Write),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Call => write!(f, "call"),
            ReferenceKind::Jump => write!(f, "jump"),
            ReferenceKind::Read => write!(f, "read"),
            ReferenceKind::Write => write!(f, "write"),
        }
    }
}

derive_deserialize_from_str!(ReferenceKind, "valid reference kind");
derive_serialize_from_display!(ReferenceKind);

/// A directed edge from the instruction at `from` to the address `to`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Reference {
    from: Address,
    to: Address,
    kind: ReferenceKind,
}

impl Reference {
    pub fn new(from: Address, to: Address, kind: ReferenceKind) -> Self {
        Reference { from, to, kind }
    }

    pub fn from(&self) -> Address {
        self.from
    }

    pub fn to(&self) -> Address {
        self.to
    }

    pub fn kind(&self) -> ReferenceKind {
        self.kind
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x} -{}-> {:#x}", self.from, self.kind, self.to)
    }
}

/// Every reference known in an image, indexed by both endpoints.
///
/// Persisted as the flat list of references in insertion order. The
/// per-address indexes are rebuilt on load.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReferenceTable {
    references: Vec<Reference>,

    #[serde(skip)]
    outgoing: BTreeMap<Address, BTreeSet<Reference>>,

    #[serde(skip)]
    incoming: BTreeMap<Address, BTreeSet<Reference>>,
}

impl<'de> Deserialize<'de> for ReferenceTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let references = Vec::<Reference>::deserialize(deserializer)?;

        Ok(references.into_iter().collect())
    }
}

impl FromIterator<Reference> for ReferenceTable {
    fn from_iter<I: IntoIterator<Item = Reference>>(iter: I) -> Self {
        let mut table = ReferenceTable::new();

        for reference in iter {
            table.insert(reference);
        }

        table
    }
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reference. Returns false if it was already known.
    pub fn insert(&mut self, reference: Reference) -> bool {
        let outgoing = self.outgoing.entry(reference.from).or_default();

        if !outgoing.insert(reference) {
            return false;
        }

        self.incoming
            .entry(reference.to)
            .or_default()
            .insert(reference);
        self.references.push(reference);

        true
    }

    /// References made by the instruction at `address`.
    pub fn from(&self, address: Address) -> impl Iterator<Item = &Reference> {
        self.outgoing.get(&address).into_iter().flatten()
    }

    /// References pointing at `address`.
    pub fn to(&self, address: Address) -> impl Iterator<Item = &Reference> {
        self.incoming.get(&address).into_iter().flatten()
    }

    /// All references in the order they were recorded.
    pub fn references(&self) -> slice::Iter<'_, Reference> {
        self.references.iter()
    }

    pub fn of_kind(&self, kind: ReferenceKind) -> impl Iterator<Item = &Reference> {
        self.references.iter().filter(move |r| r.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}
