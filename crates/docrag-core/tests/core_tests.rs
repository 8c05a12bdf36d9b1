use std::fs;
use std::io::Write;
use tempfile::TempDir;

use docrag_core::api::QueryRequest;
use docrag_core::chunker::{chunk, chunk_document};
use docrag_core::config::{expand_path, resolve_with_base, Config, Settings};
use docrag_core::data_processor::DataProcessor;
use docrag_core::types::{EventKind, StreamEvent};
use docrag_core::Error;
use figment::providers::{Format, Toml};
use figment::Figment;

#[test]
fn chunks_reconstruct_original_text() {
    let text = "Authentication requires an API key in the X-API-Key header. ".repeat(40);
    for max in [1usize, 7, 64, 1000, 5000] {
        let pieces = chunk(&text, max);
        assert_eq!(pieces.concat(), text, "max={max}");
        assert_eq!(pieces.len(), text.chars().count().div_ceil(max), "chunk count = ceil(len/max) for max={max}");
        assert!(pieces.iter().all(|p| p.chars().count() <= max));
    }
}

#[test]
fn empty_text_has_no_chunks_short_text_has_one() {
    assert!(chunk("", 10).is_empty());
    assert_eq!(chunk("short", 10), vec!["short"]);
}

#[test]
fn chunk_document_assigns_sequence_ids() {
    let chunks = chunk_document("abcdefghij", "doc", 4);
    let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["doc:0", "doc:1", "doc:2"]);
    assert_eq!(chunks[2].text, "ij");
    assert!(chunks.iter().all(|c| c.source_document_id == "doc"));
}

#[test]
fn load_directory_single_small_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    let mut f = fs::File::create(dir.join("auth.txt")).unwrap();
    writeln!(f, "Short text").unwrap();
    fs::write(dir.join("ignored.md"), "not a txt file").unwrap();

    let docs = DataProcessor::new().load_directory(dir).expect("load");

    assert_eq!(docs.len(), 1, "only .txt files are read");
    assert_eq!(docs[0].text.trim(), "Short text");
    assert_eq!(docs[0].metadata.get("source").map(String::as_str), Some("auth"));
    assert_eq!(docs[0].metadata.get("category").map(String::as_str), Some("misc"));
}

#[test]
fn load_directory_limited_and_categorised() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir_all(dir.join("api")).unwrap();
    fs::write(dir.join("api/a.txt"), "alpha bravo").unwrap();
    fs::write(dir.join("api/b.txt"), "charlie delta").unwrap();

    let docs = DataProcessor::with_limit(1).load_directory(dir).expect("load limited");
    assert_eq!(docs.len(), 1, "limited to one source document");
    assert_eq!(docs[0].metadata.get("category").map(String::as_str), Some("api"));
}

#[test]
fn settings_defaults_are_valid() {
    let settings = Settings::default();
    settings.validate().expect("defaults validate");
    assert_eq!(settings.retrieval.top_k, 3);
    assert_eq!(settings.chunking.max_chunk_size, 1000);
    assert!(!settings.session.progress_notices);
}

#[test]
fn settings_merge_toml_over_defaults() {
    let config = Config::from_figment(Figment::from(Toml::string(
        r#"
        [retrieval]
        top_k = 5

        [embedding]
        provider = "fake"
        dimension = 64
        "#,
    )));
    let settings = config.settings().expect("settings");
    assert_eq!(settings.retrieval.top_k, 5);
    assert_eq!(settings.embedding.provider, "fake");
    assert_eq!(settings.embedding.dimension, 64);
    assert_eq!(settings.completion.timeout_secs, 60, "untouched keys keep defaults");
    let top_k: usize = config.get("retrieval.top_k").expect("get");
    assert_eq!(top_k, 5);
}

#[test]
fn zero_top_k_is_rejected() {
    let config = Config::from_figment(Figment::from(Toml::string("[retrieval]\ntop_k = 0\n")));
    let settings = config.settings().expect("settings");
    assert!(matches!(settings.validate(), Err(Error::InvalidConfig(_))));
}

#[test]
fn query_request_validation() {
    assert_eq!(QueryRequest::new("  how?  ").validated_query().unwrap(), "how?");
    assert!(matches!(QueryRequest::new("   ").validated_query(), Err(Error::InvalidQuery(_))));
    assert!(matches!(QueryRequest::default().validated_query(), Err(Error::InvalidQuery(_))));

    let req: QueryRequest = serde_json::from_str(r#"{"query":"x","request_type":"inform","top_k":0}"#).unwrap();
    assert!(req.validated_top_k(3).is_err());
    let req: QueryRequest = serde_json::from_str(r#"{"query":"x"}"#).unwrap();
    assert_eq!(req.validated_top_k(3).unwrap(), 3);
}

#[test]
fn stream_event_wire_shape() {
    let event = StreamEvent::Content { chunk: "Hello. ".to_string() };
    assert_eq!(event.kind(), EventKind::Content);
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["event"], "content");
    assert_eq!(json["data"]["chunk"], "Hello. ");
    assert_eq!(event.to_sse_frame(), "event: content\ndata: {\"chunk\":\"Hello. \"}\n\n");
    assert!(StreamEvent::End { complete: true }.kind().is_terminal());
    assert!(!StreamEvent::Sources { sources: vec![] }.kind().is_terminal());
}

#[test]
fn relative_paths_resolve_against_base() {
    let base = std::path::Path::new("/srv/docrag");
    assert_eq!(resolve_with_base(base, "cache/embeddings.json"), base.join("cache/embeddings.json"));
    assert_eq!(resolve_with_base(base, "/tmp/x.json"), std::path::PathBuf::from("/tmp/x.json"));
    assert_eq!(expand_path("plain.json"), std::path::PathBuf::from("plain.json"));
}
