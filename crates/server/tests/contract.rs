//! Contract tests for the files the server bundles or depends on at runtime.
//!
//! `postforge-server` is a binary crate (no lib.rs), so these check the data
//! files and JSON shapes directly. Tests against a running server are
//! `#[ignore]`d; run them with `cargo test -p postforge-server -- --ignored`.

use std::path::{Path, PathBuf};

/// Resolve a path relative to the cargo workspace root.
fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir)
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .to_path_buf()
}

fn read(rel: &str) -> String {
    let path = workspace_root().join(rel);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}

// ── Bundled files ────────────────────────────────────────────────

#[test]
fn prompt_template_has_one_style_placeholder() {
    let template = read("data/prompts/post-writer-system.md");
    assert_eq!(template.matches("<<<style>>>").count(), 1);
    assert!(template.contains("3000"), "template should state the character limit");
}

#[test]
fn scoring_weights_cover_all_components() {
    let yaml: serde_yaml::Value = serde_yaml::from_str(&read("data/scoring/engagement.yml")).unwrap();
    for key in ["length", "line_breaks", "hashtags", "punctuation", "call_to_action"] {
        assert!(yaml.get(key).is_some(), "missing section {key}");
    }
    let keywords = yaml["call_to_action"]["keywords"].as_sequence().unwrap();
    assert!(!keywords.is_empty());
}

#[test]
fn migration_creates_every_table() {
    let sql = read("migrations/0001_init.sql");
    for table in ["profiles", "usage_counters", "writing_styles", "posts", "post_versions"] {
        assert!(
            sql.contains(&format!("CREATE TABLE IF NOT EXISTS {table} (")),
            "missing table {table}"
        );
    }
}

#[test]
fn migration_check_constraints_match_wire_values() {
    let sql = read("migrations/0001_init.sql");
    assert!(sql.contains("('free', 'pro', 'business')"));
    assert!(sql.contains("('draft', 'published', 'archived')"));
    assert!(sql.contains("('generated', 'edited', 'regenerated', 'restored')"));
}

#[test]
fn style_constraints_are_named() {
    // the style store tells these two unique violations apart by name
    let sql = read("migrations/0001_init.sql");
    assert!(sql.contains("CONSTRAINT writing_styles_user_name UNIQUE (user_id, name)"));
    assert!(sql.contains("CREATE UNIQUE INDEX IF NOT EXISTS writing_styles_one_default"));
}

// ── Running server (ignored by default) ──────────────────────────

fn base_url() -> String {
    std::env::var("POSTFORGE_TEST_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

#[ignore]
#[tokio::test]
async fn live_score_endpoint() {
    let resp = reqwest::Client::new()
        .post(format!("{}/api/score", base_url()))
        .json(&serde_json::json!({ "content": "Big news!\n\nWhat do you think? #career" }))
        .send()
        .await
        .expect("failed to reach server");
    assert!(resp.status().is_success(), "score returned {}", resp.status());

    let body: serde_json::Value = resp.json().await.unwrap();
    let total = body["total"].as_u64().unwrap();
    assert!(total <= 100);
    assert!(["low", "fair", "good", "excellent"].contains(&body["grade"].as_str().unwrap()));
}

#[ignore]
#[tokio::test]
async fn live_usage_requires_auth() {
    let resp = reqwest::get(format!("{}/api/usage", base_url()))
        .await
        .expect("failed to reach server");
    assert_eq!(resp.status().as_u16(), 401);
}
