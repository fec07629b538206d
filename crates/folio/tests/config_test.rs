use folio::{EmbeddingProviderKind, FolioConfig};
use std::io::Write;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_file_overrides_bundled_defaults() {
    let file = write_config(
        r#"
[llm]
model = "local-model"
base_url = "http://localhost:8080/v1"

[prompt]
retrieval_k = 6

[defaults]
num_chapters = 5
"#,
    );

    let config = FolioConfig::from_file(file.path()).unwrap();
    assert_eq!(config.llm().model(), "local-model");
    assert_eq!(config.llm().base_url(), "http://localhost:8080/v1");
    assert_eq!(config.llm().max_tokens(), 4096);
    assert_eq!(config.prompt().retrieval_k(), 6);
    assert_eq!(config.prompt().max_prompt_chars(), 24_000);
    assert_eq!(config.defaults().num_chapters(), 5);
    assert_eq!(config.defaults().genre(), "Fantasy");
}

#[test]
fn test_validation_reports_every_problem() {
    let file = write_config(
        r#"
[llm]
api_key_env = "FOLIO_TEST_UNSET_LLM_KEY"
model = ""
temperature = 3.5

[embedding]
provider = "hashing"

[defaults]
num_chapters = 0
"#,
    );

    let config = FolioConfig::from_file(file.path()).unwrap();
    let err = config.validate().unwrap_err();
    assert_eq!(err.code(), "config_error");
    let message = err.to_string();
    assert!(message.contains("llm.api_key"));
    assert!(message.contains("llm.model"));
    assert!(message.contains("llm.temperature"));
    assert!(message.contains("num_chapters"));
    assert!(!message.contains("embedding."));
}

#[test]
fn test_malformed_file_is_a_config_error() {
    let file = write_config("[llm\nmodel = ");
    let err = FolioConfig::from_file(file.path()).unwrap_err();
    assert_eq!(err.code(), "config_error");
}

#[tokio::test]
async fn test_build_workspace_with_local_embeddings() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_config(&format!(
        r#"
[workspace]
projects_dir = "{}"

[llm]
api_key = "sk-test"

[embedding]
provider = "hashing"
dimensions = 64
"#,
        dir.path().join("projects").display()
    ));

    let config = FolioConfig::from_file(file.path()).unwrap();
    assert_eq!(config.embedding().provider(), EmbeddingProviderKind::Hashing);

    let workspace = config.build_workspace().unwrap();
    let health = workspace.health().await.unwrap();
    assert_eq!(health.llm_provider, "openai");
    assert_eq!(health.llm_model, "gpt-4o-mini");
    assert_eq!(health.embedding_provider, "hashing");
    assert!(health.projects.is_empty());
    assert!(dir.path().join("projects").is_dir());
}
