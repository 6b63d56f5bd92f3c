//! Tests for the WAL
//!
//! These tests verify:
//! - Entry encoding and checksum validation
//! - Append / read round trips
//! - Recovery truncating torn or corrupted tails
//! - Log rewrites for checkpoints

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use catalogdb::config::WalSyncStrategy;
use catalogdb::wal::{WalEntry, WalIterator, WalReader, WalRecovery, WalWriter, HEADER_SIZE};
use catalogdb::{CatalogError, StoreOp};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_wal_path() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("wal.log");
    (temp_dir, path)
}

fn zadd(member: &str, score: f64) -> StoreOp {
    StoreOp::ZAdd {
        key: "seq".to_string(),
        score,
        member: member.to_string(),
    }
}

fn write_entries(path: &Path, count: usize) {
    let mut writer = WalWriter::open(path, WalSyncStrategy::EveryWrite, 0).unwrap();
    for i in 0..count {
        writer.append(&[zadd(&format!("m{}", i), i as f64)]).unwrap();
    }
}

// =============================================================================
// Entry Tests
// =============================================================================

#[test]
fn test_entry_encode_layout() {
    let entry = WalEntry::new(7, vec![zadd("a", 1.0)]);

    let bytes = entry.encode().unwrap();

    assert_eq!(&bytes[0..8], &7u64.to_be_bytes());
    let len = u32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]) as usize;
    assert_eq!(bytes.len(), HEADER_SIZE + len);
    let crc = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    assert_eq!(crc, WalEntry::compute_crc(&bytes[HEADER_SIZE..]));
}

#[test]
fn test_entry_decode_round_trip() {
    let entry = WalEntry::new(3, vec![zadd("a", 1.0), StoreOp::Del { key: "h".to_string() }]);
    let bytes = entry.encode().unwrap();
    let crc = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);

    let decoded = WalEntry::decode(3, crc, &bytes[HEADER_SIZE..]).unwrap();

    assert_eq!(decoded, entry);
}

#[test]
fn test_entry_decode_detects_crc_mismatch() {
    let bytes = WalEntry::new(1, vec![zadd("a", 1.0)]).encode().unwrap();
    let crc = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    let mut data = bytes[HEADER_SIZE..].to_vec();
    let last = data.len() - 1;
    data[last] ^= 0xFF;

    let result = WalEntry::decode(1, crc, &data);

    assert!(matches!(result, Err(CatalogError::WalCorruption(_))));
}

#[test]
fn test_entry_decode_detects_lsn_mismatch() {
    let bytes = WalEntry::new(1, vec![zadd("a", 1.0)]).encode().unwrap();
    let crc = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);

    let result = WalEntry::decode(2, crc, &bytes[HEADER_SIZE..]);

    assert!(matches!(result, Err(CatalogError::WalCorruption(_))));
}

// =============================================================================
// Writer / Reader Tests
// =============================================================================

#[test]
fn test_writer_assigns_increasing_lsns() {
    let (_temp, path) = setup_wal_path();
    let mut writer = WalWriter::open(&path, WalSyncStrategy::EveryWrite, 0).unwrap();

    assert_eq!(writer.append(&[zadd("a", 0.0)]).unwrap(), 1);
    assert_eq!(writer.append(&[zadd("b", 1.0)]).unwrap(), 2);
    assert_eq!(writer.current_lsn(), 2);
    assert_eq!(writer.path(), path.as_path());
}

#[test]
fn test_writer_continues_from_last_lsn() {
    let (_temp, path) = setup_wal_path();
    let mut writer = WalWriter::open(&path, WalSyncStrategy::EveryWrite, 41).unwrap();

    assert_eq!(writer.append(&[zadd("a", 0.0)]).unwrap(), 42);
}

#[test]
fn test_reader_returns_entries_in_order() {
    let (_temp, path) = setup_wal_path();
    write_entries(&path, 5);

    let entries: Vec<WalEntry> = WalReader::open(&path)
        .unwrap()
        .entries()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(entries.len(), 5);
    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry.lsn, i as u64 + 1);
        assert_eq!(entry.ops, vec![zadd(&format!("m{}", i), i as f64)]);
    }
}

#[test]
fn test_batched_sync_strategy_still_readable() {
    let (_temp, path) = setup_wal_path();
    {
        let mut writer =
            WalWriter::open(&path, WalSyncStrategy::EveryNEntries { count: 10 }, 0).unwrap();
        for i in 0..3 {
            writer.append(&[zadd(&format!("m{}", i), 0.0)]).unwrap();
        }
    }

    let (entries, _) = WalRecovery::recover(&path).unwrap();

    assert_eq!(entries.len(), 3);
}

#[test]
fn test_iterator_stops_after_first_error() {
    let (_temp, path) = setup_wal_path();
    write_entries(&path, 2);
    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&[0xFF; HEADER_SIZE + 3]).unwrap();
    drop(file);

    let mut iter: WalIterator = WalReader::open(&path).unwrap().entries();

    assert_eq!(iter.next().unwrap().unwrap().lsn, 1);
    assert_eq!(iter.next().unwrap().unwrap().lsn, 2);
    assert!(matches!(iter.next(), Some(Err(CatalogError::WalCorruption(_)))));
    assert!(iter.next().is_none());
}

#[test]
fn test_reader_position_tracks_good_entries() {
    let (_temp, path) = setup_wal_path();
    write_entries(&path, 2);
    let file_len = fs::metadata(&path).unwrap().len();

    let mut reader = WalReader::open(&path).unwrap();
    reader.next_entry().unwrap().unwrap();
    reader.next_entry().unwrap().unwrap();

    assert!(reader.next_entry().unwrap().is_none());
    assert_eq!(reader.position(), file_len);
}

// =============================================================================
// Recovery Tests
// =============================================================================

#[test]
fn test_recover_missing_file() {
    let (_temp, path) = setup_wal_path();

    let (entries, result) = WalRecovery::recover(&path).unwrap();

    assert!(entries.is_empty());
    assert_eq!(result.last_lsn, 0);
    assert!(!result.was_truncated);
}

#[test]
fn test_recover_clean_log() {
    let (_temp, path) = setup_wal_path();
    write_entries(&path, 4);

    let (entries, result) = WalRecovery::recover(&path).unwrap();

    assert_eq!(entries.len(), 4);
    assert_eq!(result.entries_recovered, 4);
    assert_eq!(result.entries_corrupted, 0);
    assert_eq!(result.last_lsn, 4);
    assert!(!result.was_truncated);
}

#[test]
fn test_recover_truncates_torn_entry() {
    let (_temp, path) = setup_wal_path();
    write_entries(&path, 3);
    let good_len = fs::metadata(&path).unwrap().len();

    // Header promising more data than follows
    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&4u64.to_be_bytes()).unwrap();
    file.write_all(&0u32.to_be_bytes()).unwrap();
    file.write_all(&100u32.to_be_bytes()).unwrap();
    file.write_all(&[1, 2, 3]).unwrap();
    drop(file);

    let (entries, result) = WalRecovery::recover(&path).unwrap();

    assert_eq!(entries.len(), 3);
    assert_eq!(result.entries_corrupted, 1);
    assert!(result.was_truncated);
    assert_eq!(fs::metadata(&path).unwrap().len(), good_len);
}

#[test]
fn test_recover_stops_at_corrupted_entry() {
    let (_temp, path) = setup_wal_path();
    write_entries(&path, 3);

    // Flip the last byte of the last entry's data
    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    let result = WalRecovery::verify(&path).unwrap();
    assert_eq!(result.entries_recovered, 2);
    assert_eq!(result.entries_corrupted, 1);
    assert!(!result.was_truncated);

    let (entries, result) = WalRecovery::recover(&path).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(result.last_lsn, 2);
    assert!(result.was_truncated);

    // A second pass finds a clean log
    let result = WalRecovery::verify(&path).unwrap();
    assert_eq!(result.entries_corrupted, 0);
}

#[test]
fn test_recover_rejects_lsn_going_backwards() {
    let (_temp, path) = setup_wal_path();
    write_entries(&path, 2);

    // A writer that forgot where the log left off
    let mut writer = WalWriter::open(&path, WalSyncStrategy::EveryWrite, 0).unwrap();
    writer.append(&[zadd("stale", 0.0)]).unwrap();
    drop(writer);

    let (entries, result) = WalRecovery::recover(&path).unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(result.last_lsn, 2);
    assert!(result.was_truncated);
}

// =============================================================================
// Rewrite Tests
// =============================================================================

#[test]
fn test_rewrite_replaces_log_with_snapshot() {
    let (_temp, path) = setup_wal_path();
    let mut writer = WalWriter::open(&path, WalSyncStrategy::EveryWrite, 0).unwrap();
    for i in 0..10 {
        writer.append(&[zadd("same", i as f64)]).unwrap();
    }

    let lsn = writer.rewrite(&[zadd("same", 9.0)]).unwrap();
    assert_eq!(lsn, 11);
    assert_eq!(writer.append(&[zadd("next", 0.0)]).unwrap(), 12);
    drop(writer);

    let (entries, result) = WalRecovery::recover(&path).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].lsn, 11);
    assert_eq!(entries[0].ops, vec![zadd("same", 9.0)]);
    assert_eq!(result.last_lsn, 12);
    assert!(!path.with_extension("log.tmp").exists());
}

#[test]
fn test_rewrite_with_nothing_empties_log() {
    let (_temp, path) = setup_wal_path();
    let mut writer = WalWriter::open(&path, WalSyncStrategy::EveryWrite, 0).unwrap();
    writer.append(&[zadd("a", 0.0)]).unwrap();

    writer.rewrite(&[]).unwrap();

    assert_eq!(fs::metadata(&path).unwrap().len(), 0);
}
