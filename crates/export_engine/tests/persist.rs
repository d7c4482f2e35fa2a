use std::fs;

use export_core::OutputRecord;
use export_engine::{ensure_directory, write_file, write_output_record, FilesystemError};
use tempfile::TempDir;

#[test]
fn creates_missing_directory_with_parents() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("out").join("2024-01-01-post");
    assert!(!new_dir.exists());
    ensure_directory(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn existing_directory_is_a_no_op() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("out");
    ensure_directory(&dir).unwrap();
    fs::write(dir.join("keep.txt"), "x").unwrap();

    ensure_directory(&dir).unwrap();
    assert_eq!(fs::read_to_string(dir.join("keep.txt")).unwrap(), "x");
}

#[test]
fn file_in_place_of_directory_is_an_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let err = ensure_directory(&file_path).unwrap_err();
    assert!(matches!(err, FilesystemError::NotADirectory { .. }));
}

#[test]
fn write_replaces_existing_content() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("index.md");

    write_file(&target, "hello").unwrap();
    assert_eq!(fs::read_to_string(&target).unwrap(), "hello");

    write_file(&target, "world").unwrap();
    assert_eq!(fs::read_to_string(&target).unwrap(), "world");
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let result = write_file(&file_path.join("index.md"), "data");
    assert!(matches!(result, Err(FilesystemError::Write { .. })));
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn output_record_lands_in_index_md() {
    let temp = TempDir::new().unwrap();
    let record = OutputRecord::new(
        temp.path().join("2024-01-01-post-a"),
        "---\ntitle: A\n---\nbody\n".to_string(),
    );

    let written = write_output_record(&record).unwrap();
    assert_eq!(written, temp.path().join("2024-01-01-post-a").join("index.md"));
    assert_eq!(
        fs::read_to_string(written).unwrap(),
        "---\ntitle: A\n---\nbody\n"
    );
}
