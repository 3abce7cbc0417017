//! Session database: a single file holding everything needed to resume an
//! analysis session.
//!
//! The file records the original image and the analysis state, but not the
//! plugins themselves. Those are named by identity string and looked up in a
//! `Registry` on load. See `format` for the byte layout.

mod error;
mod format;

pub use error::{Error, Result};
pub use format::{obfuscate, HEADER_SIZE, OBFUSCATION_KEY, SIGNATURE, VERSION};

use crate::analysis::ReferenceTable;
use crate::listing::ListingDocument;
use crate::platform::LoadRequest;
use crate::registry::Registry;
use crate::session::Session;
use format::{Reader, Writer};
use log::{info, warn};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::RwLock;
use tempfile::NamedTempFile;

/// Serialize a session into the database format.
pub fn encode(session: &Session) -> Result<Vec<u8>> {
    let (image, (document, references)) = rayon::join(
        || format::compress(session.buffer().data()),
        || {
            (
                serde_json::to_vec(session.document()),
                serde_json::to_vec(session.references()),
            )
        },
    );

    let mut writer = Writer::new();

    writer
        .string(&obfuscate(session.filename().as_bytes()))
        .string(session.loader_id().as_bytes())
        .string(session.assembler_id().as_bytes())
        .section(&image?)
        .section(&document?)
        .section(&references?);

    let mut bytes = format::header().to_vec();
    bytes.extend(writer.into_bytes());

    Ok(bytes)
}

/// Everything after the header.
fn decode_body(body: &[u8], registry: &Registry) -> Result<Session> {
    let mut reader = Reader::new(body);

    let filename = String::from_utf8(obfuscate(reader.string("filename")?))
        .map_err(|_| Error::Malformed("filename"))?;
    let loader_id = reader.utf8("loader identity")?;
    let assembler_id = reader.utf8("assembler identity")?;
    let image = format::decompress(reader.section("image")?)?;

    let loader = registry
        .resolve_loader(&loader_id)
        .ok_or(Error::UnresolvedLoader(loader_id))?;
    let assembler = registry
        .resolve_assembler(&assembler_id)
        .ok_or(Error::UnresolvedAssembler(assembler_id))?;

    // The loader's fresh listing is replaced wholesale by the saved one.
    let mut session = Session::new(
        &filename,
        loader(LoadRequest::new(&filename, image)),
        assembler(),
    );

    let document: ListingDocument = serde_json::from_slice(reader.section("listing")?)?;
    let references: ReferenceTable = serde_json::from_slice(reader.section("references")?)?;

    session.restore(document, references);

    Ok(session)
}

/// Rebuild a session from bytes produced by `encode`.
pub fn decode(bytes: &[u8], registry: &Registry) -> Result<Session> {
    format::check_header(bytes)?;

    decode_body(&bytes[HEADER_SIZE..], registry)
}

/// Read a session field by field, so a foreign file is rejected after its
/// signature and a future one after its version.
fn read<R: Read>(mut source: R, registry: &Registry) -> Result<Session> {
    let mut header = Vec::with_capacity(HEADER_SIZE);
    source
        .by_ref()
        .take(format::SIGNATURE_SIZE as u64)
        .read_to_end(&mut header)?;

    format::check_signature(&header)?;

    source
        .by_ref()
        .take((HEADER_SIZE - format::SIGNATURE_SIZE) as u64)
        .read_to_end(&mut header)?;

    format::check_version(&header)?;

    let mut body = Vec::new();
    source.read_to_end(&mut body)?;

    decode_body(&body, registry)
}

/// Write a session database to `path`.
///
/// The file is written to a temporary sibling and renamed into place, so a
/// failed save never leaves a partial database behind.
pub fn save<P: AsRef<Path>>(session: &Session, path: P) -> Result<()> {
    let path = path.as_ref();
    let cannot_open = |source: io::Error| Error::CannotOpen {
        path: path.to_path_buf(),
        source,
    };

    info!("Saving {} to {}", session.filename(), path.display());

    let bytes = encode(session)?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(cannot_open)?;
    file.write_all(&bytes)?;
    file.persist(path).map_err(|e| cannot_open(e.error))?;

    info!("Saved {} bytes to {}", bytes.len(), path.display());

    Ok(())
}

/// Save a session that other threads may be using.
///
/// The read lock is held until the file is complete, so the saved state is a
/// consistent snapshot.
pub fn save_shared<P: AsRef<Path>>(session: &RwLock<Session>, path: P) -> Result<()> {
    let session = session.read().map_err(|_| Error::Poisoned)?;

    save(&session, path)
}

/// Load a session database from `path`, resolving its plugins in `registry`.
pub fn load<P: AsRef<Path>>(path: P, registry: &Registry) -> Result<Session> {
    let path = path.as_ref();

    info!("Loading {}", path.display());

    let file = File::open(path).map_err(|source| Error::CannotOpen {
        path: path.to_path_buf(),
        source,
    })?;

    match read(file, registry) {
        Ok(session) => {
            info!(
                "Loaded {} ({} instructions, {} references)",
                session.filename(),
                session.document().instruction_count(),
                session.references().len()
            );

            Ok(session)
        }
        Err(e) => {
            warn!("Cannot load {}: {}", path.display(), e);

            Err(e)
        }
    }
}

#[cfg(test)]
mod tests;
