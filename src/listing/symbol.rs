//! Named addresses

use crate::Address;
use serde::{Deserialize, Serialize};
use std::{fmt, str};

/// What a symbol names.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Function,
    Data,
    Import,
    Label,
}

impl SymbolKind {
    /// Prefix of the placeholder name given to an unnamed address of this
    /// kind.
    pub fn placeholder_prefix(self) -> &'static str {
        match self {
            SymbolKind::Function => "sub",
            SymbolKind::Data => "data",
            SymbolKind::Import => "imp",
            SymbolKind::Label => "loc",
        }
    }
}

impl str::FromStr for SymbolKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_ref() {
            "function" => Ok(SymbolKind::Function),
            "data" => Ok(SymbolKind::Data),
            "import" => Ok(SymbolKind::Import),
            "label" => Ok(SymbolKind::Label),
            _ => Err(()),
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Function => write!(f, "function"),
            SymbolKind::Data => write!(f, "data"),
            SymbolKind::Import => write!(f, "import"),
            SymbolKind::Label => write!(f, "label"),
        }
    }
}

derive_deserialize_from_str!(SymbolKind, "valid symbol kind");
derive_serialize_from_display!(SymbolKind);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Visibility {
    Local,
    Exported,
}

impl str::FromStr for Visibility {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_ref() {
            "local" => Ok(Visibility::Local),
            "exported" => Ok(Visibility::Exported),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Local => write!(f, "local"),
            Visibility::Exported => write!(f, "exported"),
        }
    }
}

derive_deserialize_from_str!(Visibility, "valid symbol visibility");
derive_serialize_from_display!(Visibility);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    address: Address,
    name: String,
    kind: SymbolKind,
    visibility: Visibility,

    /// Generated from the address rather than taken from the image or given
    /// by an analyst. Placeholders yield to any real name.
    #[serde(default)]
    placeholder: bool,
}

impl Symbol {
    pub fn new(address: Address, name: &str, kind: SymbolKind, visibility: Visibility) -> Self {
        Symbol {
            address,
            name: name.to_string(),
            kind,
            visibility,
            placeholder: false,
        }
    }

    /// A generated `sub_XXXX`-style name for an address nothing has named yet.
    pub fn placeholder(address: Address, kind: SymbolKind) -> Self {
        Symbol {
            address,
            name: format!("{}_{:X}", kind.placeholder_prefix(), address),
            kind,
            visibility: Visibility::Local,
            placeholder: true,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    pub fn is_function(&self) -> bool {
        self.kind == SymbolKind::Function
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} @ {:#x}", self.kind, self.name, self.address)
    }
}
