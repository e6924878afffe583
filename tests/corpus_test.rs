//! Tests for word list loading and game-id generation.

use codenames_server::{Corpus, EvictionPolicy, SessionStore};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_lines(lines: impl IntoIterator<Item = String>) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    for line in lines {
        writeln!(file, "{line}").expect("write");
    }
    file
}

fn load() -> Corpus {
    let ids = write_lines(["# animals", "owl", "Otter", "", "heron"].map(String::from));
    let words = write_lines((0..30).map(|i| format!("word{i}")));
    Corpus::load(ids.path(), words.path()).expect("valid corpus")
}

#[test]
fn test_load_from_files() {
    let corpus = load();
    assert_eq!(corpus.game_ids(), ["otter", "heron"]);
    assert_eq!(corpus.default_words().len(), 30);
    assert!(corpus.default_words().words().iter().all(|w| w.starts_with("WORD")));
}

#[test]
fn test_missing_file_is_an_error() {
    let words = write_lines((0..30).map(|i| format!("word{i}")));
    let err = Corpus::load("/definitely/not/here.txt", words.path()).unwrap_err();
    assert!(err.message.contains("Failed to read"));
}

#[tokio::test]
async fn test_autogenerate_skips_resident_ids() {
    let corpus = load();
    let store = SessionStore::new(corpus.default_words().clone(), EvictionPolicy::default());
    store.resolve_or_new("otter", None);

    for _ in 0..20 {
        assert_eq!(corpus.autogenerate_id(&store), "heron");
    }
}

#[tokio::test]
async fn test_autogenerate_falls_back_to_suffix() {
    let corpus = load();
    let store = SessionStore::new(corpus.default_words().clone(), EvictionPolicy::default());
    store.resolve_or_new("otter", None);
    store.resolve_or_new("heron", None);

    let id = corpus.autogenerate_id(&store);
    let (base, suffix) = id.rsplit_once('-').expect("numbered id");
    assert!(["otter", "heron"].contains(&base));
    assert!(suffix.parse::<u32>().is_ok());
    assert!(!store.contains(&id));
}
