use super::*;

use std::collections::HashMap;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_bind_locally_without_api_key() {
    let settings = Settings::default();
    assert_eq!(settings.server_bind, "127.0.0.1:7110");
    assert_eq!(settings.image_model, "gpt-image-1");
    assert!(settings.openai_config().is_none());
}

#[test]
fn file_config_overrides_defaults() {
    let mut settings = Settings::default();
    apply_file_config(
        &mut settings,
        r#"
bind_addr = "0.0.0.0:9000"
image_model = "dall-e-3"
image_size = "512x512"
"#,
    );
    assert_eq!(settings.server_bind, "0.0.0.0:9000");
    assert_eq!(settings.image_model, "dall-e-3");
    assert_eq!(settings.image_size, "512x512");
}

#[test]
fn malformed_file_config_is_ignored() {
    let mut settings = Settings::default();
    apply_file_config(&mut settings, "bind_addr = [");
    assert_eq!(settings.server_bind, Settings::default().server_bind);
}

#[test]
fn app_prefixed_env_wins_over_plain_env() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        env_from(&[
            ("SERVER_BIND", "127.0.0.1:1"),
            ("APP__BIND_ADDR", "127.0.0.1:2"),
            ("OPENAI_API_KEY", "sk-plain"),
            ("APP__OPENAI_API_KEY", "sk-app"),
            ("APP__MAX_PROMPT_BODY_BYTES", "2048"),
        ]),
    );
    assert_eq!(settings.server_bind, "127.0.0.1:2");
    assert_eq!(settings.max_prompt_body_bytes, 2048);

    let openai = settings.openai_config().expect("configured");
    assert_eq!(openai.api_key, "sk-app");
    assert_eq!(openai.api_base, "https://api.openai.com/v1");
}

#[test]
fn blank_api_key_counts_as_missing() {
    let mut settings = Settings::default();
    apply_env(&mut settings, env_from(&[("OPENAI_API_KEY", "   ")]));
    assert!(settings.openai_config().is_none());
}

#[test]
fn unparseable_body_limit_keeps_default() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        env_from(&[("APP__MAX_PROMPT_BODY_BYTES", "lots")]),
    );
    assert_eq!(settings.max_prompt_body_bytes, 64 * 1024);
}
