//! Address-ordered listing of everything known about an image

use crate::ast::Instruction;
use crate::listing::{Error, Result, Symbol, SymbolKind, Visibility};
use crate::Address;
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// One entry of the listing, covering `size` bytes from its address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingItem {
    Instruction(Instruction),
    Data { size: usize },

    /// Bytes nothing has claimed, including those the decoder rejected.
    Unexplored { size: usize },
}

impl ListingItem {
    pub fn size(&self) -> usize {
        match self {
            ListingItem::Instruction(instr) => instr.size(),
            ListingItem::Data { size } => *size,
            ListingItem::Unexplored { size } => *size,
        }
    }

    pub fn is_unexplored(&self) -> bool {
        matches!(self, ListingItem::Unexplored { .. })
    }

    pub fn as_instruction(&self) -> Option<&Instruction> {
        match self {
            ListingItem::Instruction(instr) => Some(instr),
            _ => None,
        }
    }
}

/// The analysis state of one image.
///
/// Entries never overlap. Instructions and data items own their bytes
/// outright; unexplored entries only fill gaps and give way to anything that
/// is inserted over them. Each address carries at most one symbol, and each
/// symbol name is bound to at most one address.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ListingDocument {
    items: BTreeMap<Address, ListingItem>,
    symbols: BTreeMap<Address, Symbol>,
    entry_point: Option<Address>,

    #[serde(skip)]
    names: HashMap<String, Address>,
}

#[derive(Deserialize)]
#[serde(field_identifier, rename_all = "snake_case")]
enum DocumentField {
    Items,
    Symbols,
    EntryPoint,
}

struct DocumentVisitor;

impl<'dw> Visitor<'dw> for DocumentVisitor {
    type Value = ListingDocument;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("struct ListingDocument")
    }

    fn visit_seq<V>(self, mut seq: V) -> std::result::Result<ListingDocument, V::Error>
    where
        V: SeqAccess<'dw>,
    {
        let mut doc = ListingDocument::new();

        doc.items = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        doc.symbols = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        doc.entry_point = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(2, &self))?;

        Ok(doc)
    }

    fn visit_map<V>(self, mut map: V) -> std::result::Result<ListingDocument, V::Error>
    where
        V: MapAccess<'dw>,
    {
        let mut items = None;
        let mut symbols = None;
        let mut entry_point = None;

        while let Some(key) = map.next_key()? {
            match key {
                DocumentField::Items => {
                    if items.is_some() {
                        return Err(de::Error::duplicate_field("items"));
                    }

                    items = Some(map.next_value()?);
                }
                DocumentField::Symbols => {
                    if symbols.is_some() {
                        return Err(de::Error::duplicate_field("symbols"));
                    }

                    symbols = Some(map.next_value()?);
                }
                DocumentField::EntryPoint => {
                    if entry_point.is_some() {
                        return Err(de::Error::duplicate_field("entry_point"));
                    }

                    entry_point = Some(map.next_value()?);
                }
            }
        }

        let mut doc = ListingDocument::new();

        doc.items = items.ok_or_else(|| de::Error::missing_field("items"))?;
        doc.symbols = symbols.ok_or_else(|| de::Error::missing_field("symbols"))?;
        doc.entry_point = entry_point.unwrap_or_default();

        Ok(doc)
    }
}

impl<'dw> Deserialize<'dw> for ListingDocument {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'dw>,
    {
        let mut mine = deserializer.deserialize_struct(
            "ListingDocument",
            &["items", "symbols", "entry_point"],
            DocumentVisitor,
        )?;

        mine.update_indexes();

        Ok(mine)
    }
}

impl ListingDocument {
    pub fn new() -> Self {
        ListingDocument {
            items: BTreeMap::new(),
            symbols: BTreeMap::new(),
            entry_point: None,
            names: HashMap::new(),
        }
    }

    /// Rebuild the name index from the symbol list.
    pub fn update_indexes(&mut self) {
        self.names = self
            .symbols
            .values()
            .map(|sym| (sym.name().to_string(), sym.address()))
            .collect();
    }

    /// Number of entries, of any kind.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = (Address, &ListingItem)> {
        self.items.iter().map(|(addr, item)| (*addr, item))
    }

    /// Find the entry covering `address`, with the address it starts at.
    pub fn item_at(&self, address: Address) -> Option<(Address, &ListingItem)> {
        let (start, item) = self.items.range(..=address).next_back()?;

        if address < *start + item.size() as Address {
            Some((*start, item))
        } else {
            None
        }
    }

    /// The instruction starting exactly at `address`.
    pub fn instruction(&self, address: Address) -> Option<&Instruction> {
        self.items.get(&address)?.as_instruction()
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.items.values().filter_map(ListingItem::as_instruction)
    }

    /// Walk instructions in address order, starting at `address`.
    pub fn instructions_from(&self, address: Address) -> impl Iterator<Item = &Instruction> {
        self.items
            .range(address..)
            .filter_map(|(_, item)| item.as_instruction())
    }

    pub fn instruction_count(&self) -> usize {
        self.instructions().count()
    }

    /// Start address, size and explored-ness of every entry sharing bytes
    /// with `start..end`.
    fn overlapping(&self, start: Address, end: Address) -> Vec<(Address, usize, bool)> {
        let first = match self.items.range(..start).next_back() {
            Some((addr, item)) if *addr + item.size() as Address > start => *addr,
            _ => start,
        };

        self.items
            .range(first..end)
            .map(|(addr, item)| (*addr, item.size(), item.is_unexplored()))
            .collect()
    }

    /// Take `size` bytes at `start` away from unexplored coverage.
    ///
    /// Fails without changing anything if any of the bytes already belong to
    /// an instruction or data item.
    fn claim(&mut self, start: Address, size: usize) -> Result<()> {
        if size == 0 {
            return Err(Error::Empty(start));
        }

        let end = start + size as Address;
        let overlapping = self.overlapping(start, end);

        if let Some((existing, _, _)) = overlapping.iter().find(|(_, _, unexplored)| !unexplored) {
            return Err(Error::Overlap {
                start,
                end,
                existing: *existing,
            });
        }

        for (addr, size, _) in overlapping {
            let item_end = addr + size as Address;

            self.items.remove(&addr);

            if addr < start {
                self.items.insert(
                    addr,
                    ListingItem::Unexplored {
                        size: (start - addr) as usize,
                    },
                );
            }

            if item_end > end {
                self.items.insert(
                    end,
                    ListingItem::Unexplored {
                        size: (item_end - end) as usize,
                    },
                );
            }
        }

        Ok(())
    }

    pub fn insert_instruction(&mut self, instr: Instruction) -> Result<()> {
        self.claim(instr.address(), instr.size())?;
        self.items
            .insert(instr.address(), ListingItem::Instruction(instr));

        Ok(())
    }

    pub fn insert_data(&mut self, address: Address, size: usize) -> Result<()> {
        self.claim(address, size)?;
        self.items.insert(address, ListingItem::Data { size });

        Ok(())
    }

    /// Record `size` bytes at `address` as unexplored, wherever nothing else
    /// covers them yet.
    pub fn mark_unexplored(&mut self, address: Address, size: usize) {
        let end = address + size as Address;
        let mut cursor = address;

        for (addr, size, _) in self.overlapping(address, end) {
            if addr > cursor {
                self.items.insert(
                    cursor,
                    ListingItem::Unexplored {
                        size: (addr - cursor) as usize,
                    },
                );
            }

            cursor = cursor.max(addr + size as Address);
        }

        if cursor < end {
            self.items.insert(
                cursor,
                ListingItem::Unexplored {
                    size: (end - cursor) as usize,
                },
            );
        }
    }

    /// Annotate the instruction at `address`. Returns false if there is none.
    pub fn add_comment(&mut self, address: Address, comment: &str) -> bool {
        match self.items.get_mut(&address) {
            Some(ListingItem::Instruction(instr)) => {
                instr.add_comment(comment);
                true
            }
            _ => false,
        }
    }

    /// Bind a symbol to its address.
    ///
    /// A real name replaces whatever symbol the address had. A placeholder
    /// never replaces a real name, and inserting one over a real name is not
    /// an error.
    pub fn insert_symbol(&mut self, symbol: Symbol) -> Result<()> {
        if let Some(bound) = self.names.get(symbol.name()) {
            if *bound != symbol.address() {
                return Err(Error::NameTaken {
                    name: symbol.name().to_string(),
                    address: *bound,
                });
            }
        }

        if let Some(existing) = self.symbols.get(&symbol.address()) {
            if symbol.is_placeholder() && !existing.is_placeholder() {
                return Ok(());
            }

            self.names.remove(existing.name());
        }

        self.names
            .insert(symbol.name().to_string(), symbol.address());
        self.symbols.insert(symbol.address(), symbol);

        Ok(())
    }

    /// Name `address` after its kind unless something already names it.
    ///
    /// Returns true if a placeholder was created.
    pub fn insert_placeholder(&mut self, address: Address, kind: SymbolKind) -> bool {
        if self.symbols.contains_key(&address) {
            return false;
        }

        self.insert_symbol(Symbol::placeholder(address, kind)).is_ok()
    }

    /// Give `address` a real name, creating the symbol if needed.
    ///
    /// An existing symbol keeps its visibility.
    pub fn rename_symbol(&mut self, address: Address, name: &str, kind: SymbolKind) -> Result<()> {
        let visibility = self
            .symbols
            .get(&address)
            .map_or(Visibility::Local, Symbol::visibility);

        self.insert_symbol(Symbol::new(address, name, kind, visibility))
    }

    pub fn symbol(&self, address: Address) -> Option<&Symbol> {
        self.symbols.get(&address)
    }

    pub fn symbol_by_name(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(self.names.get(name)?)
    }

    /// All symbols in address order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    pub fn functions(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values().filter(|sym| sym.is_function())
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn entry_point(&self) -> Option<Address> {
        self.entry_point
    }

    pub fn set_entry_point(&mut self, address: Address) {
        self.entry_point = Some(address);
    }
}
