//! Wire protocol behavior through the public API: framing, request
//! handling, and response shapes.

use phrase_engine::server::protocol::{scan_frame, split_xref, FrameScan};
use phrase_engine::server::process_request;
use phrase_engine::{EngineOptions, MatchContext, PhraseIndex};

fn build_index() -> PhraseIndex {
    let options = EngineOptions::default();
    let mut index = PhraseIndex::new();
    index
        .add_pattern("hello world\tH1\tgreetings\textra", &options)
        .unwrap();
    index.prepare_for_matching().unwrap();
    index
}

fn respond(json: &str) -> serde_json::Value {
    let index = build_index();
    let options = EngineOptions::new().with_matching_substring(true);
    let mut ctx = MatchContext::new();
    let response = process_request(&index, &options, &mut ctx, json).unwrap();
    serde_json::from_str(&response).unwrap()
}

#[test]
fn test_framing_ignores_braces_in_strings() {
    let buffer = br#"{"id":"x","query":"braces { in } strings"} trailing"#;
    match scan_frame(buffer) {
        FrameScan::Complete { start, end } => {
            assert_eq!(start, 0);
            let frame = std::str::from_utf8(&buffer[start..end]).unwrap();
            assert!(serde_json::from_str::<serde_json::Value>(frame).is_ok());
        }
        other => panic!("expected complete frame, got {other:?}"),
    }
}

#[test]
fn test_framing_waits_for_closing_brace() {
    assert_eq!(
        scan_frame(br#"{"id":"x","query":"unfinished"#),
        FrameScan::Partial { start: 0 }
    );
}

#[test]
fn test_framing_discards_garbage_before_object() {
    assert_eq!(scan_frame(b"garbage only, no object"), FrameScan::Empty);

    let buffer = br#"noise{"id":"x"}"#;
    assert_eq!(
        scan_frame(buffer),
        FrameScan::Complete {
            start: 5,
            end: buffer.len()
        }
    );
}

#[test]
fn test_xref_category_extraction() {
    // id before the first tab, category between the first and second.
    assert_eq!(split_xref("H1\tgreetings\textra"), ("H1", "greetings"));
    assert_eq!(split_xref("H1\tgreetings"), ("H1", "greetings"));
    assert_eq!(split_xref("H1"), ("H1", ""));
}

#[test]
fn test_response_carries_id_and_category() {
    let response = respond(r#"{"id":"r1","query":"hello world"}"#);
    assert_eq!(response["status"], 200);
    assert_eq!(response["id"], "r1");

    let result = &response["results"][0];
    assert_eq!(result["id"], "H1");
    assert_eq!(result["category"], "greetings");
    assert_eq!(result["pattern"], "hello world");
    assert_eq!(result["match"], "hello world");
}

#[test]
fn test_statuses() {
    assert_eq!(respond(r#"{"id":"a","query":"hello world"}"#)["status"], 200);
    assert_eq!(respond(r#"{"id":"b","query":"no match"}"#)["status"], 404);
    assert_eq!(respond(r#"{"id":"c"}"#)["status"], 400);
    assert_eq!(respond(r#"not json at all"#)["status"], 400);
}

#[test]
fn test_batch_response_indexes_follow_request_order() {
    let response =
        respond(r#"{"id":"b","queries":["miss","hello world","miss again","hello world"]}"#);
    assert_eq!(response["status"], 200);

    let results = response["results"].as_array().unwrap();
    assert_eq!(results.len(), 4);
    for (i, entry) in results.iter().enumerate() {
        assert_eq!(entry["index"], i);
    }
    assert!(results[0]["matches"].as_array().unwrap().is_empty());
    assert_eq!(results[1]["matches"][0]["id"], "H1");
    assert_eq!(results[3]["matches"][0]["id"], "H1");
}
