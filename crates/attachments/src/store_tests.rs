use super::*;
use quorum_core::FakeClock;
use std::io::Cursor;

fn store() -> (tempfile::TempDir, AttachmentStore<FakeClock>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = AttachmentStore::with_clock(AttachmentConfig { root: dir.path().to_path_buf() }, FakeClock::new());
    (dir, store)
}

#[test]
fn save_then_resolve_round_trips_bytes_and_metadata() {
    let (_dir, store) = store();
    let attachment = store.save(OwnerType::Chat, "cht-abc", Cursor::new(b"hello world".to_vec()), "notes.txt").expect("save");
    assert_eq!(attachment.name, "notes.txt");
    assert_eq!(attachment.size, 11);
    assert_eq!(attachment.content_type, "text/plain");

    let (resolved, path) = store.resolve(OwnerType::Chat, "cht-abc", attachment.id.as_str()).expect("resolve");
    assert_eq!(resolved.id, attachment.id);
    assert_eq!(std::fs::read(path).expect("read data"), b"hello world");
}

#[test]
fn save_over_size_limit_fails_with_too_large() {
    let (_dir, store) = store();
    let oversized = vec![0u8; (MAX_ATTACHMENT_SIZE_BYTES + 1) as usize];
    let err = store.save(OwnerType::Chat, "cht-abc", Cursor::new(oversized), "big.bin").unwrap_err();
    assert!(matches!(err, AttachmentError::TooLarge(_)));
}

#[test]
fn list_enumerates_saved_attachments() {
    let (_dir, store) = store();
    store.save(OwnerType::Workflows, "wfl-xyz", Cursor::new(b"a".to_vec()), "a.txt").unwrap();
    store.save(OwnerType::Workflows, "wfl-xyz", Cursor::new(b"b".to_vec()), "b.txt").unwrap();
    let mut names: Vec<String> = store.list(OwnerType::Workflows, "wfl-xyz").unwrap().into_iter().map(|a| a.name).collect();
    names.sort();
    assert_eq!(names, vec!["a.txt", "b.txt"]);
}

#[test]
fn list_on_missing_owner_returns_empty() {
    let (_dir, store) = store();
    assert!(store.list(OwnerType::Chat, "cht-missing").unwrap().is_empty());
}

#[test]
fn list_skips_corrupt_meta_entries() {
    let (dir, store) = store();
    let attachment = store.save(OwnerType::Chat, "cht-abc", Cursor::new(b"ok".to_vec()), "ok.txt").unwrap();
    // Corrupt a second entry's meta.json directly on disk.
    let corrupt_dir = dir.path().join(".quorum").join("attachments").join("chat").join("cht-abc").join("att-corrupt00000000000");
    std::fs::create_dir_all(&corrupt_dir).unwrap();
    std::fs::write(corrupt_dir.join("meta.json"), b"not json").unwrap();

    let found = store.list(OwnerType::Chat, "cht-abc").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, attachment.id);
}

#[test]
fn resolve_missing_attachment_is_not_found() {
    let (_dir, store) = store();
    let err = store.resolve(OwnerType::Chat, "cht-abc", "att-doesnotexist0000").unwrap_err();
    assert!(matches!(err, AttachmentError::NotFound(_)));
}

#[test]
fn delete_then_resolve_is_not_found() {
    let (_dir, store) = store();
    let attachment = store.save(OwnerType::Chat, "cht-abc", Cursor::new(b"x".to_vec()), "x.txt").unwrap();
    store.delete(OwnerType::Chat, "cht-abc", attachment.id.as_str()).unwrap();
    assert!(store.resolve(OwnerType::Chat, "cht-abc", attachment.id.as_str()).is_err());
}

#[test]
fn delete_nonexistent_attachment_is_a_no_op() {
    let (_dir, store) = store();
    store.delete(OwnerType::Chat, "cht-abc", "att-neverexisted0000").expect("no-op delete succeeds");
}

#[test]
fn delete_all_removes_every_attachment_for_owner() {
    let (_dir, store) = store();
    store.save(OwnerType::Chat, "cht-abc", Cursor::new(b"1".to_vec()), "1.txt").unwrap();
    store.save(OwnerType::Chat, "cht-abc", Cursor::new(b"2".to_vec()), "2.txt").unwrap();
    store.delete_all(OwnerType::Chat, "cht-abc").unwrap();
    assert!(store.list(OwnerType::Chat, "cht-abc").unwrap().is_empty());
}

#[test]
fn delete_all_on_missing_owner_is_a_no_op() {
    let (_dir, store) = store();
    store.delete_all(OwnerType::Chat, "cht-neverexisted").expect("no-op");
}

#[test]
fn owner_id_with_path_separator_is_rejected() {
    let (_dir, store) = store();
    let err = store.save(OwnerType::Chat, "../escape", Cursor::new(b"x".to_vec()), "x.txt").unwrap_err();
    assert!(matches!(err, AttachmentError::Io(_)));
}

#[test]
fn content_type_is_sniffed_from_bytes() {
    let (_dir, store) = store();
    let png_magic = b"\x89PNG\r\n\x1a\nrestofdata".to_vec();
    let attachment = store.save(OwnerType::Chat, "cht-abc", Cursor::new(png_magic), "image.bin").unwrap();
    assert_eq!(attachment.content_type, "image/png");
}
