//! Integration tests for the catalog translator
//!
//! These tests run the whole pipeline (load, translate, back up, save)
//! against a temporary catalog file and a mocked chat completions endpoint.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::{
    matchers::{body_string_contains, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use xcstrings_translator::{
    catalog::{Catalog, TranslationState},
    config::{Config, Overrides},
    env_file::Settings,
    persistence::backup_path,
};

// ==================== Test Helpers ====================

const GREETING_CATALOG: &str = r#"{
  "sourceLanguage" : "en",
  "strings" : {
    "greeting" : {
      "localizations" : {
        "en" : {
          "stringUnit" : {
            "state" : "translated",
            "value" : "Hello"
          }
        }
      }
    }
  },
  "version" : "1.0"
}
"#;

fn create_test_config(api_host: &str, languages: &[&str]) -> Config {
    let overrides = Overrides {
        languages: languages.iter().map(|l| l.to_string()).collect(),
        api_key: Some("test-openai-key".to_string()),
        host: Some(api_host.to_string()),
        ..Overrides::default()
    };
    Config::resolve(overrides, &Settings::default()).expect("valid config")
}

fn write_catalog(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("Localizable.xcstrings");
    fs::write(&path, content).expect("Failed to write catalog");
    path
}

fn create_openai_response(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }
        ]
    })
}

fn value_of(catalog: &Catalog, key: &str, lang: &str) -> (TranslationState, String) {
    let unit = catalog.strings[key]
        .unit(lang)
        .and_then(|u| u.string_unit())
        .expect("plain unit");
    (unit.state, unit.value.clone())
}

// ==================== End-to-End Scenarios ====================

#[tokio::test]
async fn test_adds_missing_language() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer test-openai-key"))
        .and(body_string_contains("<target_language>fr</target_language>"))
        .respond_with(ResponseTemplate::new(200).set_body_json(create_openai_response("Bonjour")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("temp dir");
    let input = write_catalog(&dir, GREETING_CATALOG);
    let config = create_test_config(&mock_server.uri(), &["fr"]);

    let summary = xcstrings_translator::run(&config, &input).await.expect("run");
    assert_eq!(summary.translated, 1);

    let saved = Catalog::load(&input).expect("reload");
    assert_eq!(
        value_of(&saved, "greeting", "fr"),
        (TranslationState::Translated, "Bonjour".to_string())
    );
    assert_eq!(
        value_of(&saved, "greeting", "en"),
        (TranslationState::Translated, "Hello".to_string())
    );
    assert_eq!(saved.extra.get("version"), Some(&serde_json::Value::from("1.0")));

    let backup = fs::read_to_string(backup_path(&input)).expect("backup written");
    assert_eq!(backup, GREETING_CATALOG);
}

#[tokio::test]
async fn test_source_language_target_is_noop() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(create_openai_response("unused")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("temp dir");
    let input = write_catalog(&dir, GREETING_CATALOG);
    let config = create_test_config(&mock_server.uri(), &["en"]);

    let summary = xcstrings_translator::run(&config, &input).await.expect("run");

    assert_eq!(summary.changed(), 0);
    assert_eq!(fs::read_to_string(&input).expect("read"), GREETING_CATALOG);
    assert!(!backup_path(&input).exists());
}

#[tokio::test]
async fn test_remote_failure_marks_error_and_continues() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("<target_language>de</target_language>"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("<target_language>fr</target_language>"))
        .respond_with(ResponseTemplate::new(200).set_body_json(create_openai_response("Bonjour")))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("temp dir");
    let input = write_catalog(&dir, GREETING_CATALOG);
    let config = create_test_config(&mock_server.uri(), &["de", "fr"]);

    let summary = xcstrings_translator::run(&config, &input).await.expect("run");
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.translated, 1);

    let saved = Catalog::load(&input).expect("reload");
    assert_eq!(
        value_of(&saved, "greeting", "de"),
        (TranslationState::Error, "Hello".to_string())
    );
    assert_eq!(
        value_of(&saved, "greeting", "fr"),
        (TranslationState::Translated, "Bonjour".to_string())
    );
}

#[tokio::test]
async fn test_mixed_catalog_without_checkpoints_or_backup() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("<context>Title of the settings screen</context>"))
        .respond_with(ResponseTemplate::new(200).set_body_json(create_openai_response("Réglages")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("temp dir");
    let input = write_catalog(
        &dir,
        r#"{
            "sourceLanguage": "en",
            "strings": {
                "Settings": { "comment": "Title of the settings screen" },
                "GitHub": { "shouldTranslate": false },
                "•": {},
                "%lld files": {
                    "localizations": {
                        "fr": { "variations": { "plural": {
                            "one": { "stringUnit": { "state": "translated", "value": "%lld fichier" } },
                            "other": { "stringUnit": { "state": "translated", "value": "%lld fichiers" } }
                        } } }
                    }
                }
            }
        }"#,
    );
    let original = Catalog::load(&input).expect("load");

    let mut config = create_test_config(&mock_server.uri(), &["fr"]);
    config.skip_backup = true;
    config.checkpoint = false;

    let summary = xcstrings_translator::run(&config, &input).await.expect("run");
    assert_eq!(summary.translated, 1);
    assert_eq!(summary.verbatim, 2);
    assert_eq!(summary.unsupported, 1);

    let saved = Catalog::load(&input).expect("reload");
    assert_eq!(value_of(&saved, "Settings", "fr").1, "Réglages");
    assert_eq!(value_of(&saved, "GitHub", "fr").1, "GitHub");
    assert_eq!(value_of(&saved, "•", "fr").1, "•");
    assert_eq!(
        saved.strings["%lld files"],
        original.strings["%lld files"]
    );
    assert!(!backup_path(&input).exists());
}

#[tokio::test]
async fn test_output_is_sorted_xcode_layout() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(create_openai_response("Hallo")))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("temp dir");
    let input = write_catalog(
        &dir,
        r#"{"version":"1.0","strings":{"b/c":{},"a":{}},"sourceLanguage":"en"}"#,
    );
    let config = create_test_config(&mock_server.uri(), &["de"]);

    xcstrings_translator::run(&config, &input).await.expect("run");

    let written = fs::read_to_string(&input).expect("read");
    assert!(written.starts_with("{\n  \"sourceLanguage\" : \"en\",\n  \"strings\" : {\n    \"a\" : {"));
    assert!(written.contains("\"b/c\" : {"));
    assert!(written.ends_with("\"version\" : \"1.0\"\n}\n"));
}

// ==================== Failure Scenarios ====================

#[tokio::test]
async fn test_malformed_catalog_is_fatal() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_catalog(&dir, "{ this is not json");
    let config = create_test_config("http://127.0.0.1:9", &["fr"]);

    let result = xcstrings_translator::run(&config, &input).await;

    assert!(result.is_err());
    assert_eq!(fs::read_to_string(&input).expect("read"), "{ this is not json");
}

#[tokio::test]
async fn test_missing_catalog_is_fatal() {
    let dir = TempDir::new().expect("temp dir");
    let config = create_test_config("http://127.0.0.1:9", &["fr"]);

    let result = xcstrings_translator::run(&config, &dir.path().join("absent.xcstrings")).await;

    assert!(result.unwrap_err().to_string().contains("Failed to load catalog"));
}
