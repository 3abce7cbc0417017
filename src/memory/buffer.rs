//! Raw image bytes plus the segment map that places them in memory.

use crate::Address;
use num_traits::{NumCast, PrimInt, Unsigned};
use std::mem;

/// A contiguous run of the image mapped at a fixed address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    name: String,

    /// First address covered by this segment.
    address: Address,

    /// Offset of the segment's first byte within the image.
    offset: usize,

    size: usize,
    executable: bool,
}

impl Segment {
    pub fn new(
        name: &str,
        address: Address,
        offset: usize,
        size: usize,
        executable: bool,
    ) -> Self {
        Segment {
            name: name.to_string(),
            address,
            offset,
            size,
            executable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_executable(&self) -> bool {
        self.executable
    }

    /// The first address past the end of the segment.
    pub fn end_address(&self) -> Address {
        self.address + self.size as Address
    }

    pub fn contains_address(&self, address: Address) -> bool {
        self.address <= address && address < self.end_address()
    }

    pub fn contains_offset(&self, offset: usize) -> bool {
        self.offset <= offset && offset < self.offset + self.size
    }
}

/// A read-only, addressable view over an executable's bytes.
///
/// The buffer owns the image exactly as it was read from disk. Addresses are
/// resolved into image offsets through the segment list; bytes that no
/// segment covers are not addressable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Buffer {
    data: Vec<u8>,
    segments: Vec<Segment>,
}

impl Buffer {
    /// Wrap image bytes without mapping any of them.
    pub fn new(data: Vec<u8>) -> Self {
        Buffer {
            data,
            segments: Vec::new(),
        }
    }

    /// Map the entire image as a single executable segment at `base`.
    pub fn flat(data: Vec<u8>, base: Address) -> Self {
        let size = data.len();
        let mut buffer = Self::new(data);

        buffer.add_segment(Segment::new("image", base, 0, size, true));

        buffer
    }

    /// Map part of the image into memory.
    ///
    /// Segments extending past the end of the image are clipped to it.
    pub fn add_segment(&mut self, mut segment: Segment) {
        let available = self.data.len().saturating_sub(segment.offset);

        segment.size = segment.size.min(available);
        self.segments.push(segment);
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    pub fn segment_containing(&self, address: Address) -> Option<&Segment> {
        self.segments.iter().find(|s| s.contains_address(address))
    }

    pub fn is_mapped(&self, address: Address) -> bool {
        self.segment_containing(address).is_some()
    }

    /// Translate an absolute address into an image offset.
    pub fn offset_of(&self, address: Address) -> Option<usize> {
        let segment = self.segment_containing(address)?;

        Some(segment.offset + (address - segment.address) as usize)
    }

    /// Translate an image offset into an absolute address.
    pub fn address_of(&self, offset: usize) -> Option<Address> {
        let segment = self.segments.iter().find(|s| s.contains_offset(offset))?;

        Some(segment.address + (offset - segment.offset) as Address)
    }

    /// Borrow up to `len` bytes starting at `address`.
    ///
    /// The window never crosses the end of the segment holding `address`, so
    /// it may be shorter than requested. Unmapped addresses yield `None`.
    pub fn window(&self, address: Address, len: usize) -> Option<&[u8]> {
        let segment = self.segment_containing(address)?;
        let start = segment.offset + (address - segment.address) as usize;
        let end = (segment.offset + segment.size).min(start.saturating_add(len));

        self.data.get(start..end)
    }

    /// Read one little-endian code unit of type `U` at `address`.
    pub fn read_unit<U>(&self, address: Address) -> Option<U>
    where
        U: PrimInt + Unsigned,
    {
        let width = mem::size_of::<U>();
        let bytes = self.window(address, width)?;

        if bytes.len() < width {
            return None;
        }

        bytes
            .iter()
            .enumerate()
            .try_fold(U::zero(), |acc, (i, byte)| {
                Some(acc | (<U as NumCast>::from(*byte)? << (8 * i)))
            })
    }
}
