use assert_cmd::Command;
use predicates::prelude::*;

fn recipe_extractor() -> Command {
    let mut cmd = Command::cargo_bin("recipe-extractor").unwrap();
    cmd.env_remove("OPENAI_API_KEY").env_remove("RUST_LOG");
    cmd
}

#[test]
fn missing_url_prints_usage_and_fails() {
    recipe_extractor()
        .env("OPENAI_API_KEY", "sk-test")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn missing_api_key_is_fatal() {
    let dir = tempfile::tempdir().unwrap();

    recipe_extractor()
        .current_dir(dir.path())
        .arg("https://www.youtube.com/watch?v=abc")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("OPENAI_API_KEY"));

    assert!(!dir.path().join("recipe.json").exists());
}

#[test]
fn api_key_is_read_from_dotenv_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".env"), "OPENAI_API_KEY=sk-from-dotenv\n").unwrap();
    let config = dir.path().join("bad.yaml");
    std::fs::write(&config, "openai:\n  api_base: ftp://nowhere\n").unwrap();

    // Getting past the credential check means the config error is reported instead
    recipe_extractor()
        .current_dir(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("https://youtu.be/abc")
        .assert()
        .code(1)
        .stderr(
            predicate::str::contains("HTTP or HTTPS")
                .and(predicate::str::contains("OPENAI_API_KEY").not()),
        );
}

#[test]
fn blank_api_key_is_fatal() {
    recipe_extractor()
        .env("OPENAI_API_KEY", "   ")
        .arg("--server")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
}

#[test]
fn invalid_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    std::fs::write(&config, "openai:\n  api_base: ftp://nowhere\n").unwrap();

    recipe_extractor()
        .env("OPENAI_API_KEY", "sk-test")
        .arg("--config")
        .arg(&config)
        .arg("https://youtu.be/abc")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("HTTP or HTTPS"));
}

#[test]
fn help_lists_delivery_modes() {
    recipe_extractor()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--server")
                .and(predicate::str::contains("--mcp"))
                .and(predicate::str::contains("--save-transcript")),
        );
}
