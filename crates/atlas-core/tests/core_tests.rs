use std::fs;
use std::io::Write;
use tempfile::TempDir;

use atlas_core::config::{Config, SearchLimits};
use atlas_core::data_processor::{content_hash, ChunkingConfig, DataProcessor};
use atlas_core::{Distance, Score};
use figment::providers::{Format, Toml};
use figment::Figment;

#[test]
fn process_directory_single_small_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    let file_path = dir.join("a.txt");
    let mut f = fs::File::create(&file_path).unwrap();
    writeln!(f, "Short text").unwrap();

    let processor = DataProcessor::new();
    let docs = processor.process_directory(dir).expect("process");

    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].title, "a");
    assert_eq!(docs[0].chunks, vec!["Short text".to_string()]);
    assert_eq!(docs[0].content_hash, content_hash("Short text"));
}

#[test]
fn empty_files_are_skipped() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("blank.txt"), "   \n\n ").unwrap();
    fs::write(tmp.path().join("notes.md"), "not a txt file").unwrap();

    let docs = DataProcessor::new().process_directory(tmp.path()).unwrap();
    assert!(docs.is_empty());
}

#[test]
fn same_text_same_hash_regardless_of_whitespace() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("a.txt"), "alpha  bravo\ncharlie").unwrap();
    fs::write(tmp.path().join("b.txt"), "alpha bravo charlie\n").unwrap();

    let docs = DataProcessor::new().process_directory(tmp.path()).unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].content_hash, docs[1].content_hash);
}

#[test]
fn windows_overlap_and_cover_every_word() {
    let processor = DataProcessor::with_chunking(ChunkingConfig { window_words: 4, overlap_words: 1 });
    let text = (0..10).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
    let chunks = processor.split_words(&text);

    assert_eq!(chunks, vec!["w0 w1 w2 w3", "w3 w4 w5 w6", "w6 w7 w8 w9"]);
}

#[test]
fn default_window_is_300_words_with_50_overlap() {
    let processor = DataProcessor::new();
    let text = (0..400).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
    let chunks = processor.split_words(&text);

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].split_whitespace().count(), 300);
    assert!(chunks[1].starts_with("w250 "));
    assert!(chunks[1].ends_with("w399"));
}

#[test]
fn settings_fall_back_to_defaults() {
    let config = Config::from_figment(Figment::new());
    let settings = config.settings().unwrap();
    assert_eq!(settings.search.max_top_docs, 50);
    assert_eq!(settings.search.max_top_chunks, 20);
    assert_eq!(settings.search.min_chunk_pool, 10);
    assert_eq!(settings.search.max_chunk_pool, 2000);
    assert_eq!(settings.data.table, "chunks");
    assert_eq!(settings.data.tantivy_dir, "data/indexes/tantivy");
    settings.validate().unwrap();
}

#[test]
fn settings_merge_toml_overrides() {
    let figment = Figment::new().merge(Toml::string(
        r#"
        [search]
        default_top_docs = 8
        [data]
        graph_snapshot = "graph.json"
        tantivy_dir = "/tmp/kw"
        "#,
    ));
    let config = Config::from_figment(figment);
    let settings = config.settings().unwrap();
    assert_eq!(settings.search.default_top_docs, 8);
    assert_eq!(settings.search.max_top_docs, 50);
    assert_eq!(settings.data.graph_snapshot.as_deref(), Some("graph.json"));
    assert_eq!(settings.data.tantivy_dir, "/tmp/kw");
    assert_eq!(settings.data.table, "chunks");
}

#[test]
fn inconsistent_limits_are_rejected() {
    let limits = SearchLimits { default_top_docs: 60, ..SearchLimits::default() };
    assert!(limits.validate().is_err());
    let limits = SearchLimits { flatten_multiplier: 0, ..SearchLimits::default() };
    assert!(limits.validate().is_err());
}

#[test]
fn score_reverses_distance_order() {
    let near = Distance::new(0.1);
    let far = Distance::new(0.7);
    assert!(near.total_cmp(&far).is_lt());
    assert!(Score::from(near).total_cmp(&Score::from(far)).is_gt());
    assert_eq!(Score::from(far).value(), -0.7);
}

#[test]
fn distance_mean_clamping_and_nan() {
    let mean = Distance::mean([Distance::new(0.1), Distance::new(0.2)]).unwrap();
    assert!((mean.value() - 0.15).abs() < 1e-12);
    assert!(Distance::mean(Vec::new()).is_none());
    assert_eq!(Distance::new(-1.0).value(), 0.0);
    assert_eq!(Distance::new(f64::NAN).value(), f64::INFINITY);
    assert!(Distance::new(f64::NAN).total_cmp(&Distance::new(1e9)).is_gt());
    assert!(Score::from(Distance::from(f32::NAN)).value() < Score::from(Distance::new(5.0)).value());
}
