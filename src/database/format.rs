//! Byte layout of a session database
//!
//! ```text
//! signature     4 bytes, SIGNATURE
//! version       u32
//! filename      u32 length, bytes XORed with OBFUSCATION_KEY
//! loader id     u32 length, UTF-8
//! assembler id  u32 length, UTF-8
//! image         u64 length, zlib stream
//! listing       u64 length, JSON
//! references    u64 length, JSON
//! ```
//!
//! All integers are little-endian.

use crate::database::{Error, Result};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

pub const SIGNATURE: &[u8; 4] = b"RDB\0";
pub const SIGNATURE_SIZE: usize = 4;

/// Bumped on every layout change. Other versions are refused outright.
pub const VERSION: u32 = 1;

/// Cycling XOR key applied to the stored filename.
///
/// This only keeps the name from showing up in a hex dump.
pub const OBFUSCATION_KEY: &[u8] = b"RLDB";

/// Size of the signature and version fields.
pub const HEADER_SIZE: usize = 8;

/// Toggle filename obfuscation. Applying it twice restores the input.
pub fn obfuscate(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .zip(OBFUSCATION_KEY.iter().cycle())
        .map(|(byte, key)| byte ^ key)
        .collect()
}

pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());

    encoder
        .write_all(data)
        .map_err(Error::CompressionFailure)?;
    encoder.finish().map_err(Error::CompressionFailure)
}

pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut image = Vec::new();

    ZlibDecoder::new(data)
        .read_to_end(&mut image)
        .map_err(Error::DecompressionFailure)?;

    Ok(image)
}

pub fn header() -> [u8; HEADER_SIZE] {
    let mut header = [0; HEADER_SIZE];

    header[..SIGNATURE_SIZE].copy_from_slice(SIGNATURE);
    header[SIGNATURE_SIZE..].copy_from_slice(&VERSION.to_le_bytes());

    header
}

pub fn check_signature(bytes: &[u8]) -> Result<()> {
    if bytes.get(..SIGNATURE_SIZE) != Some(&SIGNATURE[..]) {
        return Err(Error::SignatureMismatch);
    }

    Ok(())
}

/// Check the version field of a header whose signature already passed.
pub fn check_version(header: &[u8]) -> Result<()> {
    let version = header
        .get(SIGNATURE_SIZE..HEADER_SIZE)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or(Error::Malformed("version"))?;

    if version != VERSION {
        return Err(Error::VersionMismatch {
            found: version,
            expected: VERSION,
        });
    }

    Ok(())
}

/// Validate the signature, then the version.
///
/// Accepts a short slice so that a truncated file reports the first field it
/// fails on.
pub fn check_header(header: &[u8]) -> Result<()> {
    check_signature(header)?;
    check_version(header)
}

/// Appends length-prefixed fields to a byte buffer.
#[derive(Default)]
pub struct Writer {
    bytes: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn string(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes
            .extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn section(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes
            .extend_from_slice(&(bytes.len() as u64).to_le_bytes());
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Reads length-prefixed fields back out of a byte slice.
pub struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes }
    }

    fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8]> {
        if len > self.bytes.len() {
            return Err(Error::Malformed(field));
        }

        let (taken, rest) = self.bytes.split_at(len);
        self.bytes = rest;

        Ok(taken)
    }

    fn fixed<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N]> {
        self.take(N, field)?
            .try_into()
            .map_err(|_| Error::Malformed(field))
    }

    pub fn string(&mut self, field: &'static str) -> Result<&'a [u8]> {
        let len = u32::from_le_bytes(self.fixed(field)?);

        self.take(len as usize, field)
    }

    pub fn utf8(&mut self, field: &'static str) -> Result<String> {
        String::from_utf8(self.string(field)?.to_vec()).map_err(|_| Error::Malformed(field))
    }

    pub fn section(&mut self, field: &'static str) -> Result<&'a [u8]> {
        let len = u64::from_le_bytes(self.fixed(field)?);
        let len = usize::try_from(len).map_err(|_| Error::Malformed(field))?;

        self.take(len, field)
    }
}
