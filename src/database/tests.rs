use crate::analysis::{CallTargetAnalyzer, Pipeline};
use crate::arch::avr8::Avr8;
use crate::arch::Assembler;
use crate::database::format::{self, Writer};
use crate::database::{self, Error, HEADER_SIZE, SIGNATURE, VERSION};
use crate::listing::SymbolKind;
use crate::platform::{BinaryLoader, LoadRequest};
use crate::registry::Registry;
use crate::session::Session;
use std::fs;
use std::io::Cursor;
use std::sync::{Arc, RwLock};
use std::thread;

fn analyzed(filename: &str) -> Session {
    // 0: rcall 6; 2: rjmp 2; 4: invalid; 6: ret
    let image = vec![0x02, 0xD0, 0xFF, 0xCF, 0xFF, 0xFF, 0x08, 0x95];
    let loader = BinaryLoader::new(LoadRequest::new(filename, image));
    let mut session = Session::new(filename, Box::new(loader), Box::new(Avr8));
    let mut pipeline = Pipeline::new();
    pipeline.push(CallTargetAnalyzer);

    session.sweep();
    session.analyze(&pipeline);
    session
        .document_mut()
        .rename_symbol(6, "delay", SymbolKind::Function)
        .unwrap();
    session.document_mut().add_comment(2, "spin forever");

    session
}

fn assert_same(restored: &Session, original: &Session) {
    assert_eq!(restored.filename(), original.filename());
    assert_eq!(restored.loader_id(), original.loader_id());
    assert_eq!(restored.assembler_id(), original.assembler_id());
    assert_eq!(restored.buffer(), original.buffer());
    assert_eq!(restored.document(), original.document());
    assert_eq!(restored.references(), original.references());
}

#[test]
fn save_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blink.rdb");
    let session = analyzed("blink.bin");

    database::save(&session, &path).unwrap();
    let restored = database::load(&path, &Registry::with_builtins()).unwrap();

    assert_same(&restored, &session);
    assert_eq!(restored.document().symbol_by_name("delay").map(|s| s.address()), Some(6));
    assert_eq!(
        restored.document().instruction(2).unwrap().comments(),
        ["spin forever".to_string()]
    );
    assert_eq!(restored.references().to(6).count(), 1);
}

#[test]
fn filename_is_obfuscated_and_recovered() {
    let name = "firmware/révision-2.bin";
    let bytes = database::encode(&analyzed(name)).unwrap();

    assert!(!bytes
        .windows(name.len())
        .any(|window| window == name.as_bytes()));
    assert_eq!(database::obfuscate(&database::obfuscate(b"blink")), b"blink");

    let restored = database::decode(&bytes, &Registry::with_builtins()).unwrap();
    assert_eq!(restored.filename(), name);
}

#[test]
fn header_layout() {
    let bytes = database::encode(&analyzed("a")).unwrap();

    assert_eq!(&bytes[..4], SIGNATURE);
    assert_eq!(&bytes[4..HEADER_SIZE], &VERSION.to_le_bytes());
    assert_eq!(&bytes[HEADER_SIZE..HEADER_SIZE + 4], &1u32.to_le_bytes());
}

#[test]
fn version_guard() {
    let mut bytes = format::header().to_vec();
    bytes[4..HEADER_SIZE].copy_from_slice(&(VERSION + 1).to_le_bytes());
    bytes.extend_from_slice(b"anything at all");

    let err = database::decode(&bytes, &Registry::with_builtins()).unwrap_err();
    assert!(matches!(
        err,
        Error::VersionMismatch { found, expected } if found == VERSION + 1 && expected == VERSION
    ));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.rdb");
    fs::write(&path, &bytes).unwrap();

    assert!(matches!(
        database::load(&path, &Registry::with_builtins()),
        Err(Error::VersionMismatch { .. })
    ));
}

#[test]
fn header_is_read_field_by_field() {
    let registry = Registry::with_builtins();

    let mut foreign = Cursor::new(b"\x7fELF\x02\x01\x01\x00 and the rest".to_vec());
    assert!(matches!(
        database::read(&mut foreign, &registry),
        Err(Error::SignatureMismatch)
    ));
    assert_eq!(foreign.position(), 4);

    let mut future = format::header().to_vec();
    future[4..HEADER_SIZE].copy_from_slice(&(VERSION + 1).to_le_bytes());
    future.extend_from_slice(b"and the rest");

    let mut future = Cursor::new(future);
    assert!(matches!(
        database::read(&mut future, &registry),
        Err(Error::VersionMismatch { .. })
    ));
    assert_eq!(future.position(), HEADER_SIZE as u64);
}

#[test]
fn signature_guard() {
    let registry = Registry::with_builtins();

    assert!(matches!(
        database::decode(b"\x7fELF\x01\x01\x01\x00", &registry),
        Err(Error::SignatureMismatch)
    ));
    assert!(matches!(
        database::decode(b"", &registry),
        Err(Error::SignatureMismatch)
    ));
    assert!(matches!(
        database::decode(SIGNATURE, &registry),
        Err(Error::Malformed("version"))
    ));
}

#[test]
fn unknown_identity_guard() {
    let bytes = database::encode(&analyzed("blink.bin")).unwrap();

    let err = database::decode(&bytes, &Registry::new()).unwrap_err();
    assert!(matches!(&err, Error::UnresolvedLoader(id) if id == "binary"));
    assert!(err.to_string().contains("binary"));

    let mut loaders_only = Registry::new();
    loaders_only.register_loader("binary", BinaryLoader::boxed);

    let err = database::decode(&bytes, &loaders_only).unwrap_err();
    assert!(matches!(&err, Error::UnresolvedAssembler(id) if id == "avr8"));
    assert_eq!(err.to_string(), "no assembler is registered as \"avr8\"");
}

#[test]
fn corrupt_image_is_reported() {
    let mut writer = Writer::new();
    writer
        .string(&database::obfuscate(b"x.bin"))
        .string(b"binary")
        .string(b"avr8")
        .section(b"not a zlib stream");

    let mut bytes = format::header().to_vec();
    bytes.extend(writer.into_bytes());

    assert!(matches!(
        database::decode(&bytes, &Registry::with_builtins()),
        Err(Error::DecompressionFailure(_))
    ));
}

#[test]
fn truncated_file_is_reported() {
    let bytes = database::encode(&analyzed("blink.bin")).unwrap();

    assert!(matches!(
        database::decode(&bytes[..bytes.len() - 1], &Registry::with_builtins()),
        Err(Error::Malformed("references"))
    ));
}

#[test]
fn unopenable_paths_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing").join("blink.rdb");

    assert!(matches!(
        database::load(&missing, &Registry::with_builtins()),
        Err(Error::CannotOpen { .. })
    ));
    assert!(matches!(
        database::save(&analyzed("blink.bin"), &missing),
        Err(Error::CannotOpen { .. })
    ));
    assert!(!missing.exists());
}

#[test]
fn save_shared_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.rdb");
    let shared = Arc::new(RwLock::new(analyzed("blink.bin")));

    let saver = {
        let shared = Arc::clone(&shared);
        let path = path.clone();

        thread::spawn(move || database::save_shared(&shared, &path))
    };
    saver.join().unwrap().unwrap();

    let restored = database::load(&path, &Registry::with_builtins()).unwrap();
    let original = shared.read().unwrap();

    assert_same(&restored, &original);
}

#[test]
fn restored_session_keeps_decoding() {
    // 0: rcall 6; 2: rjmp 2; 4: invalid; 6: ret; 8: nop (unreached)
    let image = vec![0x02, 0xD0, 0xFF, 0xCF, 0xFF, 0xFF, 0x08, 0x95, 0x00, 0x00];
    let loader = BinaryLoader::new(LoadRequest::new("blink.bin", image));
    let mut original = Session::new("blink.bin", Box::new(loader), Box::new(Avr8));
    original.disassemble();

    let bytes = database::encode(&original).unwrap();
    let mut restored = database::decode(&bytes, &Registry::with_builtins()).unwrap();

    assert_same(&restored, &original);
    assert_eq!(
        restored
            .assembler()
            .decode(restored.buffer(), 6)
            .map(|instr| instr.mnemonic().to_string()),
        Ok("ret".to_string())
    );

    assert_eq!(restored.sweep(), original.sweep());
    assert!(restored.document().instruction(8).is_some());
    assert_same(&restored, &original);
}
