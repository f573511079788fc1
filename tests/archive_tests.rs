//! Tests for archive save and load
//!
//! These tests verify:
//! - Round trips across every compression algorithm, plain and encrypted
//! - Path normalization and atomic replacement of existing archives
//! - Per-layer failure kinds: format, integrity, authentication, compression
//! - Block-level corruption reporting
//! - Header metadata exposed through inspect

use std::fs;
use std::path::PathBuf;

use pakkit::archive;
use pakkit::{Codec, Compression, Namespace, PakError, SaveOptions, Value, MAX_DEPTH};
use tempfile::TempDir;

// ============================================================================
// Helper Functions
// ============================================================================

/// Creates a temp directory and a path for an archive inside it.
fn setup_archive_path() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("save.pak");
    (dir, path)
}

/// Creates a namespace exercising every value kind.
fn sample_namespace() -> Namespace {
    let mut ns = Namespace::new();
    ns.set("name", "Ada").unwrap();
    ns.set("level", 42).unwrap();
    ns.set("health", 99.5).unwrap();
    ns.set("hardcore", true).unwrap();
    ns.set("icon", vec![0u8, 1, 2, 3, 255]).unwrap();
    ns.set("tags", vec![Value::from("hero"), Value::from(7)]).unwrap();
    let inventory = ns.get_or_create("inventory").unwrap();
    inventory.set("gold", 130).unwrap();
    inventory.set("potions", 3).unwrap();
    ns
}

/// Options writing the payload verbatim: no compression, no encryption.
fn raw_options(block_size: u32) -> SaveOptions {
    SaveOptions::builder()
        .compression(Compression::None)
        .block_size(block_size)
        .build()
}

/// Encryption options with a small KDF round count so tests stay fast.
fn encrypted_options(password: &str) -> SaveOptions {
    SaveOptions::builder()
        .password(password)
        .kdf_rounds(1_000)
        .build()
}

/// Inverts the byte at `offset` in the file.
fn flip_byte(path: &PathBuf, offset: usize) {
    let mut bytes = fs::read(path).unwrap();
    bytes[offset] ^= 0xFF;
    fs::write(path, bytes).unwrap();
}

// ============================================================================
// Round Trip Tests
// ============================================================================

#[test]
fn test_round_trip_plain_across_compressions() {
    let (_dir, path) = setup_archive_path();
    let ns = sample_namespace();

    for compression in [Compression::None, Compression::Lz4, Compression::Zstd] {
        let options = SaveOptions::builder().compression(compression).build();
        pakkit::save(&ns, &path, &options).unwrap();

        let loaded = pakkit::load(&path, None).unwrap();
        assert_eq!(loaded, ns, "mismatch under {compression:?}");
    }
}

#[test]
fn test_round_trip_encrypted_across_compressions() {
    let (_dir, path) = setup_archive_path();
    let ns = sample_namespace();

    for compression in [Compression::None, Compression::Lz4, Compression::Zstd] {
        let options = SaveOptions::builder()
            .compression(compression)
            .password("hunter2")
            .kdf_rounds(1_000)
            .build();
        pakkit::save(&ns, &path, &options).unwrap();

        let loaded = pakkit::load(&path, Some("hunter2")).unwrap();
        assert_eq!(loaded, ns, "mismatch under {compression:?}");
    }
}

#[test]
fn test_round_trip_empty_namespace() {
    let (_dir, path) = setup_archive_path();
    let ns = Namespace::new();

    pakkit::save(&ns, &path, &SaveOptions::default()).unwrap();
    let loaded = pakkit::load(&path, None).unwrap();

    assert!(loaded.is_empty());
}

#[test]
fn test_round_trip_large_payload() {
    let (_dir, path) = setup_archive_path();
    let mut ns = Namespace::new();
    ns.set("blob", vec![0xABu8; 64 * 1024]).unwrap();
    for i in 0..500 {
        ns.set(format!("entry_{i}"), i).unwrap();
    }

    pakkit::save(&ns, &path, &SaveOptions::default()).unwrap();
    let loaded = pakkit::load(&path, None).unwrap();

    assert_eq!(loaded, ns);
}

#[test]
fn test_compression_shrinks_repetitive_payload() {
    let dir = TempDir::new().unwrap();
    let mut ns = Namespace::new();
    ns.set("blob", vec![0x42u8; 32 * 1024]).unwrap();

    let raw = dir.path().join("raw.pak");
    let packed = dir.path().join("packed.pak");
    pakkit::save(&ns, &raw, &raw_options(4096)).unwrap();
    pakkit::save(&ns, &packed, &SaveOptions::default()).unwrap();

    let raw_len = fs::metadata(&raw).unwrap().len();
    let packed_len = fs::metadata(&packed).unwrap().len();
    assert!(packed_len < raw_len / 2, "{packed_len} vs {raw_len}");
}

// ============================================================================
// Path Handling Tests
// ============================================================================

#[test]
fn test_default_extension_appended() {
    let dir = TempDir::new().unwrap();
    let bare = dir.path().join("slot1");

    pakkit::save(&sample_namespace(), &bare, &SaveOptions::default()).unwrap();

    assert!(!bare.exists());
    assert!(dir.path().join("slot1.pak").exists());
    // Loading through the bare path resolves the same way
    assert_eq!(pakkit::load(&bare, None).unwrap(), sample_namespace());
}

#[test]
fn test_explicit_extension_respected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("world.sav");

    pakkit::save(&sample_namespace(), &path, &SaveOptions::default()).unwrap();

    assert!(path.exists());
    assert!(!dir.path().join("world.sav.pak").exists());
}

#[test]
fn test_parent_directories_created() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("saves").join("profile_a").join("slot.pak");

    pakkit::save(&sample_namespace(), &path, &SaveOptions::default()).unwrap();

    assert_eq!(pakkit::load(&path, None).unwrap(), sample_namespace());
}

#[test]
fn test_atomic_save_replaces_existing_archive() {
    let (_dir, path) = setup_archive_path();
    let mut first = Namespace::new();
    first.set("generation", 1).unwrap();
    let mut second = Namespace::new();
    second.set("generation", 2).unwrap();

    pakkit::save(&first, &path, &SaveOptions::default()).unwrap();
    pakkit::save(&second, &path, &SaveOptions::default()).unwrap();

    assert_eq!(pakkit::load(&path, None).unwrap(), second);
}

#[test]
fn test_stale_temp_file_is_harmless() {
    let (_dir, path) = setup_archive_path();
    let ns = sample_namespace();
    pakkit::save(&ns, &path, &SaveOptions::default()).unwrap();

    // Simulate a crash that left a half-written temp file behind
    let tmp = PathBuf::from(format!("{}.tmp", path.display()));
    fs::write(&tmp, b"half-written garbage").unwrap();

    assert_eq!(pakkit::load(&path, None).unwrap(), ns);

    // The next save consumes the temp path and replaces the archive
    let mut updated = ns.clone();
    updated.set("level", 43).unwrap();
    pakkit::save(&updated, &path, &SaveOptions::default()).unwrap();

    assert!(!tmp.exists());
    assert_eq!(pakkit::load(&path, None).unwrap(), updated);
}

// ============================================================================
// Format Validation Tests
// ============================================================================

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = pakkit::load(dir.path().join("absent.pak"), None);

    assert!(matches!(result, Err(PakError::Io(_))));
}

#[test]
fn test_load_rejects_non_archive_file() {
    let (_dir, path) = setup_archive_path();
    fs::write(&path, b"definitely not an archive, just some text").unwrap();

    let result = pakkit::load(&path, None);
    assert!(matches!(result, Err(PakError::ArchiveFormat(_))));
}

#[test]
fn test_load_rejects_truncated_archive() {
    let (_dir, path) = setup_archive_path();
    pakkit::save(&sample_namespace(), &path, &SaveOptions::default()).unwrap();

    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..8]).unwrap();

    let result = pakkit::load(&path, None);
    assert!(matches!(result, Err(PakError::ArchiveFormat(_))));
}

#[test]
fn test_header_corruption_caught_by_crc() {
    let (_dir, path) = setup_archive_path();
    pakkit::save(&sample_namespace(), &path, &raw_options(4096)).unwrap();

    // Byte 7 is the first schema byte; every field check passes and only
    // the trailing CRC can catch the damage
    flip_byte(&path, 7);

    let result = pakkit::load(&path, None);
    assert!(matches!(result, Err(PakError::ArchiveFormat(_))));
}

#[test]
fn test_zero_block_size_rejected() {
    let (_dir, path) = setup_archive_path();
    let options = SaveOptions::builder().block_size(0).build();

    let result = pakkit::save(&sample_namespace(), &path, &options);
    assert!(matches!(result, Err(PakError::ArchiveFormat(_))));
    assert!(!path.exists());
}

#[test]
fn test_excessive_kdf_rounds_rejected() {
    let (_dir, path) = setup_archive_path();
    let options = SaveOptions::builder()
        .password("pw")
        .kdf_rounds(u32::MAX)
        .build();

    let result = pakkit::save(&sample_namespace(), &path, &options);
    assert!(matches!(result, Err(PakError::ArchiveFormat(_))));
}

// ============================================================================
// Integrity Tests
// ============================================================================

#[test]
fn test_bit_flip_reports_containing_block() {
    let (_dir, path) = setup_archive_path();
    pakkit::save(&sample_namespace(), &path, &raw_options(32)).unwrap();

    let info = archive::inspect(&path).unwrap();
    let file_len = fs::metadata(&path).unwrap().len() as usize;

    // Uncompressed and unencrypted, so the payload is stored verbatim at
    // the tail of the file
    flip_byte(&path, file_len - 1);

    let expected = ((info.payload_len - 1) / 32) as usize;
    let result = pakkit::load(&path, None);
    assert!(
        matches!(result, Err(PakError::Integrity { block }) if block == expected),
        "got {result:?}, expected block {expected}"
    );
}

#[test]
fn test_bit_flip_in_first_block() {
    let (_dir, path) = setup_archive_path();
    pakkit::save(&sample_namespace(), &path, &raw_options(32)).unwrap();

    let info = archive::inspect(&path).unwrap();
    let file_len = fs::metadata(&path).unwrap().len() as usize;
    let payload_offset = file_len - info.payload_len as usize;

    flip_byte(&path, payload_offset);

    let result = pakkit::load(&path, None);
    assert!(matches!(result, Err(PakError::Integrity { block: 0 })));
}

#[test]
fn test_truncated_payload_reports_first_affected_block() {
    let (_dir, path) = setup_archive_path();
    pakkit::save(&sample_namespace(), &path, &raw_options(32)).unwrap();

    let bytes = fs::read(&path).unwrap();
    // Drop the final 40 bytes of payload; the cut lands in the block at
    // the new payload end
    fs::write(&path, &bytes[..bytes.len() - 40]).unwrap();

    let info = archive::inspect(&path).unwrap();
    let expected = (info.payload_len as usize - 40) / 32;
    let result = pakkit::load(&path, None);
    assert!(
        matches!(result, Err(PakError::Integrity { block }) if block == expected),
        "got {result:?}, expected block {expected}"
    );
}

#[test]
fn test_corrupted_compressed_stream() {
    let (_dir, path) = setup_archive_path();
    let options = SaveOptions::builder().compression(Compression::Lz4).build();
    pakkit::save(&sample_namespace(), &path, &options).unwrap();

    let file_len = fs::metadata(&path).unwrap().len() as usize;
    flip_byte(&path, file_len - 1);

    // Either the stream fails to decompress or it inflates to wrong bytes
    // that the digests then catch
    let result = pakkit::load(&path, None);
    assert!(
        matches!(
            result,
            Err(PakError::Compression(_)) | Err(PakError::Integrity { .. })
        ),
        "got {result:?}"
    );
}

// ============================================================================
// Encryption Tests
// ============================================================================

#[test]
fn test_wrong_password_fails_authentication() {
    let (_dir, path) = setup_archive_path();
    pakkit::save(&sample_namespace(), &path, &encrypted_options("correct")).unwrap();

    let result = pakkit::load(&path, Some("incorrect"));
    assert!(matches!(result, Err(PakError::Authentication)));
}

#[test]
fn test_missing_password_fails_authentication() {
    let (_dir, path) = setup_archive_path();
    pakkit::save(&sample_namespace(), &path, &encrypted_options("correct")).unwrap();

    let result = pakkit::load(&path, None);
    assert!(matches!(result, Err(PakError::Authentication)));
}

#[test]
fn test_password_against_plaintext_archive_fails_authentication() {
    let (_dir, path) = setup_archive_path();
    pakkit::save(&sample_namespace(), &path, &SaveOptions::default()).unwrap();

    // A stripped encryption layer must not be readable as if it were intact
    let result = pakkit::load(&path, Some("correct"));
    assert!(matches!(result, Err(PakError::Authentication)));
}

#[test]
fn test_tampered_ciphertext_fails_authentication() {
    let (_dir, path) = setup_archive_path();
    pakkit::save(&sample_namespace(), &path, &encrypted_options("correct")).unwrap();

    let file_len = fs::metadata(&path).unwrap().len() as usize;
    flip_byte(&path, file_len - 1);

    let result = pakkit::load(&path, Some("correct"));
    assert!(matches!(result, Err(PakError::Authentication)));
}

#[test]
fn test_kdf_rounds_read_from_header_not_caller() {
    let (_dir, path) = setup_archive_path();
    let options = SaveOptions::builder()
        .password("pw")
        .kdf_rounds(2_000)
        .build();
    pakkit::save(&sample_namespace(), &path, &options).unwrap();

    assert_eq!(archive::inspect(&path).unwrap().kdf_rounds, Some(2_000));
    // The loader needs no kdf configuration; the header carries it
    assert_eq!(pakkit::load(&path, Some("pw")).unwrap(), sample_namespace());
}

#[test]
fn test_identical_saves_produce_distinct_ciphertexts() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.pak");
    let b = dir.path().join("b.pak");
    let ns = sample_namespace();

    pakkit::save(&ns, &a, &encrypted_options("pw")).unwrap();
    pakkit::save(&ns, &b, &encrypted_options("pw")).unwrap();

    // Fresh salt and nonce per save
    assert_ne!(fs::read(&a).unwrap(), fs::read(&b).unwrap());
}

// ============================================================================
// Inspect Tests
// ============================================================================

#[test]
fn test_inspect_reports_header_metadata() {
    let (_dir, path) = setup_archive_path();
    let options = SaveOptions::builder()
        .compression(Compression::Zstd)
        .block_size(64)
        .schema_version(7)
        .build();
    pakkit::save(&sample_namespace(), &path, &options).unwrap();

    let info = archive::inspect(&path).unwrap();
    assert_eq!(info.format_version, 1);
    assert_eq!(info.schema_version, 7);
    assert_eq!(info.compression, Compression::Zstd);
    assert!(!info.encrypted);
    assert_eq!(info.kdf_rounds, None);
    assert_eq!(info.block_size, 64);
    assert_eq!(info.block_count as u64, info.payload_len.div_ceil(64));
    assert!(info.payload_len > 0);
}

#[test]
fn test_inspect_encrypted_archive_needs_no_password() {
    let (_dir, path) = setup_archive_path();
    pakkit::save(&sample_namespace(), &path, &encrypted_options("secret")).unwrap();

    let info = archive::inspect(&path).unwrap();
    assert!(info.encrypted);
    assert_eq!(info.kdf_rounds, Some(1_000));
}

// ============================================================================
// Depth Enforcement Tests
// ============================================================================

#[test]
fn test_tree_grown_past_depth_limit_rejected_at_save() {
    let (_dir, path) = setup_archive_path();
    let mut root = Namespace::new();
    {
        // Grown top-down one level at a time, each mutation passes its own
        // local check; only the whole-tree validation at save sees the total
        let mut current = root.get_or_create("d").unwrap();
        for _ in 0..MAX_DEPTH {
            current = current.get_or_create("d").unwrap();
        }
    }

    let result = pakkit::save(&root, &path, &SaveOptions::default());
    assert!(matches!(result, Err(PakError::CycleDetected { .. })));
    assert!(!path.exists());
}

#[test]
fn test_tree_at_depth_limit_round_trips() {
    let (_dir, path) = setup_archive_path();
    let mut root = Namespace::new();
    {
        let mut current = root.get_or_create("d").unwrap();
        for _ in 0..MAX_DEPTH - 2 {
            current = current.get_or_create("d").unwrap();
        }
        current.set("leaf", 1).unwrap();
    }

    pakkit::save(&root, &path, &SaveOptions::default()).unwrap();
    assert_eq!(pakkit::load(&path, None).unwrap(), root);
}

// ============================================================================
// Custom Codec Tests
// ============================================================================

/// Bincode with the byte order reversed, enough to prove the codec seam
/// is honored end to end.
#[derive(Debug, Clone, Copy, Default)]
struct ReversedCodec;

impl Codec for ReversedCodec {
    fn name(&self) -> &'static str {
        "reversed"
    }

    fn encode(&self, namespace: &Namespace) -> pakkit::Result<Vec<u8>> {
        let mut bytes = pakkit::BincodeCodec.encode(namespace)?;
        bytes.reverse();
        Ok(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> pakkit::Result<Namespace> {
        let mut bytes = bytes.to_vec();
        bytes.reverse();
        pakkit::BincodeCodec.decode(&bytes)
    }
}

#[test]
fn test_custom_codec_round_trip() {
    let (_dir, path) = setup_archive_path();
    let ns = sample_namespace();

    archive::write_with_codec(&ns, &path, &SaveOptions::default(), &ReversedCodec).unwrap();
    let (loaded, _) = archive::read_with_codec(&path, None, &ReversedCodec).unwrap();
    assert_eq!(loaded, ns);

    // The default codec cannot decode what the custom codec wrote
    let result = pakkit::load(&path, None);
    assert!(matches!(result, Err(PakError::Codec(_))));
}
