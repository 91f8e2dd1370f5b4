use serde_json::json;

use mission_catalog_sync::payload::{assets_prefix, slugify, MissionPayload};

fn resolve(path: &str, value: serde_json::Value) -> MissionPayload {
    MissionPayload::resolve(path, &serde_json::to_vec(&value).unwrap())
        .expect("payload should parse")
}

#[test]
fn slugify_collapses_and_trims() {
    assert_eq!(slugify("Intro to Loops!"), "intro-to-loops");
    assert_eq!(slugify("--Weird__  Name--"), "weird-name");
    assert_eq!(slugify("M3"), "m3");
    assert_eq!(slugify("###"), "");
}

#[test]
fn assets_prefix_is_deterministic() {
    assert_eq!(assets_prefix("intro-to-loops"), "MINTRO-TO-LOOPS/");
    assert_eq!(assets_prefix("m3"), "M3/");
    assert_eq!(assets_prefix("loops"), "MLOOPS/");
}

#[test]
fn order_fields_resolve_in_documented_precedence() {
    let payload = resolve(
        "anything.json",
        json!({"order": 1, "order_no": 2, "orderNo": 3, "index": 4}),
    );
    assert_eq!(payload.order_hint, Some(1.0));

    let payload = resolve("anything.json", json!({"orderNo": 3, "index": 4}));
    assert_eq!(payload.order_hint, Some(3.0));

    let payload = resolve("anything.json", json!({"index": 4}));
    assert_eq!(payload.order_hint, Some(4.0));
}

#[test]
fn numeric_filename_stem_is_the_last_order_candidate() {
    let payload = resolve("missions/7.json", json!({"title": "Loops"}));
    assert_eq!(payload.order_hint, Some(7.0));

    let payload = resolve("missions/7.json", json!({"order": 2}));
    assert_eq!(payload.order_hint, Some(2.0), "a declared order beats the stem");

    let payload = resolve("missions/intro.json", json!({"title": "Intro"}));
    assert_eq!(payload.order_hint, None, "non-numeric stem yields no candidate");
}

#[test]
fn non_numeric_order_fields_are_ignored() {
    let payload = resolve("9.json", json!({"order": "three"}));
    assert_eq!(payload.order_hint, Some(9.0));
}

#[test]
fn title_falls_back_to_filename_stem() {
    let payload = resolve("a/b/getting-started.json", json!({}));
    assert_eq!(payload.title, "getting-started");

    let payload = resolve("a/b/getting-started.json", json!({"title": ""}));
    assert_eq!(payload.title, "getting-started", "empty title is treated as absent");

    let payload = resolve("a/b/getting-started.json", json!({"title": "Getting Started"}));
    assert_eq!(payload.title, "Getting Started");
}

#[test]
fn identity_fields_resolve_in_documented_precedence() {
    let payload = resolve(
        "x.json",
        json!({"mission_uid": "First", "missionUid": "second", "uid": "third"}),
    );
    assert_eq!(payload.slug, "first");

    let payload = resolve("x.json", json!({"missionUid": "Second", "uid": "third"}));
    assert_eq!(payload.slug, "second");

    let payload = resolve("x.json", json!({"uid": "Third Choice"}));
    assert_eq!(payload.slug, "third-choice");
}

#[test]
fn empty_identity_fields_are_skipped() {
    let payload = resolve("x.json", json!({"mission_uid": "", "uid": "fallback"}));
    assert_eq!(payload.slug, "fallback");
}

#[test]
fn identity_falls_back_to_title() {
    let payload = resolve("x.json", json!({"title": "Intro to Loops"}));
    assert_eq!(payload.slug, "intro-to-loops");
}

#[test]
fn unsluggable_identity_gets_a_unique_fallback() {
    let first = resolve("x.json", json!({"title": "###"}));
    let second = resolve("x.json", json!({"title": "###"}));
    assert!(first.slug.starts_with("mission-"));
    assert_ne!(first.slug, second.slug, "fallback slugs never collide");
}

#[test]
fn invalid_json_is_an_error() {
    assert!(MissionPayload::resolve("x.json", b"{oops").is_err());
}

#[test]
fn raw_document_is_kept_for_embedding() {
    let doc = json!({"title": "Loops", "steps": [1, 2, 3]});
    let payload = resolve("7.json", doc.clone());
    assert_eq!(payload.raw, doc);
}
