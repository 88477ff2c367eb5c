//! Integration tests for the in-memory temp storage.

use doctemp_storage::{MemoryStorage, StorageConfig, StorageError, TempStorage};
use proptest::prelude::*;
use std::collections::HashSet;
use std::io::{Read, Write};
use std::sync::Arc;
use std::thread;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn round_trip_through_reopen() {
    init_tracing();
    let storage = MemoryStorage::new();
    let data: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();

    let mut file = storage.temp_file("word/media", "image").unwrap();
    file.write_all(&data).unwrap();
    file.close().unwrap();

    let mut reopened = storage.open(file.name()).unwrap();
    let mut out = Vec::new();
    let mut chunk = [0u8; 333];
    loop {
        let n = reopened.read(&mut chunk).unwrap();
        if n == 0 {
            break;
        }
        out.extend_from_slice(&chunk[..n]);
    }
    assert_eq!(out, data);
}

#[test]
fn eof_after_full_read() {
    let storage = MemoryStorage::new();
    let name = storage.write_temp("dir", "eof", b"0123456789").unwrap();

    let mut file = storage.open(&name).unwrap();
    let mut buf = [0u8; 10];
    assert_eq!(file.read(&mut buf).unwrap(), 10);
    assert_eq!(file.read(&mut buf).unwrap(), 0);
}

#[test]
fn sequential_writes_concatenate() {
    let storage = MemoryStorage::new();
    let mut file = storage.temp_file("dir", "ab").unwrap();
    file.write_all(b"AAAA").unwrap();
    file.write_all(b"BB").unwrap();

    assert_eq!(storage.read_to_vec(file.name()).unwrap(), b"AAAABB");
}

#[test]
fn ten_thousand_temp_names_are_distinct() {
    let storage = MemoryStorage::new();
    let names: HashSet<String> = (0..10_000)
        .map(|_| storage.temp_file("dir", "prefix").unwrap().name().to_owned())
        .collect();

    assert_eq!(names.len(), 10_000);
    assert_eq!(storage.len(), 10_000);
}

#[test]
fn remove_all_clears_outside_dir_too() {
    init_tracing();
    let storage = MemoryStorage::new();
    storage.add_bytes("dir/x", b"x".to_vec());
    storage.add_bytes("other/y", b"y".to_vec());

    storage.remove_all("dir").unwrap();

    assert!(storage.is_empty());
    assert!(storage.open("other/y").unwrap_err().is_not_found());
}

#[test]
fn open_missing_on_empty_store() {
    let storage = MemoryStorage::new();
    match storage.open("missing") {
        Err(StorageError::NotFound { path }) => assert_eq!(path, "missing"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn concurrent_temp_files() {
    let storage = Arc::new(MemoryStorage::new());

    let handles: Vec<_> = (0..100u32)
        .map(|i| {
            let storage = Arc::clone(&storage);
            thread::spawn(move || {
                let mut file = storage.temp_file("dir", "worker").unwrap();
                file.write_all(&i.to_le_bytes()).unwrap();
                (file.name().to_owned(), i)
            })
        })
        .collect();

    let results: Vec<(String, u32)> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let names: HashSet<&String> = results.iter().map(|(name, _)| name).collect();
    assert_eq!(names.len(), 100);
    assert_eq!(storage.len(), 100);

    for (name, i) in &results {
        assert_eq!(storage.read_to_vec(name).unwrap(), i.to_le_bytes());
    }
}

#[test]
fn concurrent_writes_to_one_file_keep_every_chunk() {
    let storage = Arc::new(MemoryStorage::new());
    let name = storage.temp_file("dir", "shared").unwrap().name().to_owned();

    let handles: Vec<_> = (0..8u8)
        .map(|i| {
            let storage = Arc::clone(&storage);
            let name = name.clone();
            thread::spawn(move || {
                let mut file = storage.open(&name).unwrap();
                for _ in 0..100 {
                    file.write_all(&[i; 16]).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let content = storage.read_to_vec(&name).unwrap();
    assert_eq!(content.len(), 8 * 100 * 16);
    // Each 16-byte chunk is written whole, never interleaved.
    for chunk in content.chunks(16) {
        assert!(chunk.iter().all(|b| *b == chunk[0]));
    }
}

#[test]
fn writes_visible_to_other_handles() {
    let storage = StorageConfig::memory().build();
    let mut writer = storage.temp_file("dir", "w").unwrap();
    let mut reader = storage.open(writer.name()).unwrap();

    writer.write_all(b"first").unwrap();
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).unwrap();
    assert_eq!(buf, b"first");

    writer.write_all(b"second").unwrap();
    buf.clear();
    reader.read_to_end(&mut buf).unwrap();
    assert_eq!(buf, b"second");
}

proptest! {
    #[test]
    fn prop_chunked_writes_round_trip(
        chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..256), 0..16),
        read_size in 1usize..512,
    ) {
        let storage = MemoryStorage::new();
        let mut file = storage.temp_file("prop", "chunk").unwrap();
        for chunk in &chunks {
            file.write_all(chunk).unwrap();
        }

        let mut reopened = storage.open(file.name()).unwrap();
        let mut out = Vec::new();
        let mut buf = vec![0u8; read_size];
        loop {
            let n = reopened.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }

        let expected: Vec<u8> = chunks.concat();
        prop_assert_eq!(storage.size_of(file.name()), Some(expected.len() as u64));
        prop_assert_eq!(out, expected);
    }
}
