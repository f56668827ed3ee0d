use docchat::api::ApiClient;
use docchat::config::ApiConfig;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Client pointed at a mock server, signed in with `token`.
#[allow(dead_code)]
pub fn client_for(uri: &str, token: Option<&str>) -> ApiClient {
    let config = ApiConfig {
        base_url: uri.to_string(),
        timeout_seconds: 5,
    };
    ApiClient::new(&config)
        .expect("client builds")
        .with_token(token.map(str::to_string))
}

#[allow(dead_code)]
pub fn user_json(id: i64, username: &str, is_admin: bool) -> Value {
    json!({
        "id": id,
        "username": username,
        "email": format!("{}@example.com", username),
        "is_active": true,
        "is_admin": is_admin,
        "created_at": "2024-03-01T10:00:00",
        "updated_at": null
    })
}
