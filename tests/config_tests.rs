//! Tests for configuration layering.

use std::collections::HashMap;
use std::path::PathBuf;

use pretty_assertions::assert_eq;

use threadline::agent_loop::{AgentEngine, EngineOptions};
use threadline::config::{EngineConfig, ToolCallPolicy};
use threadline::error::ThreadlineError;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn toml_overrides_defaults() {
    let config = EngineConfig::from_toml(
        r#"
        model = "llama-3.1-70b-versatile"
        max_cycles = 8
        tool_call_policy = "first_only"
        api_tokens = ["a", "b"]

        [tools]
        wikipedia = "http://localhost:9000/wiki"
        "#,
    )
    .unwrap();

    assert_eq!(config.model, "llama-3.1-70b-versatile");
    assert_eq!(config.max_cycles, 8);
    assert_eq!(config.tool_call_policy, ToolCallPolicy::FirstOnly);
    assert_eq!(config.api_tokens, vec!["a", "b"]);
    assert_eq!(config.tools.wikipedia, "http://localhost:9000/wiki");
    // Unset keys keep their defaults.
    assert_eq!(config.history_budget, 4000);
    assert_eq!(config.tools.comments, "https://jsonplaceholder.typicode.com");
}

#[test]
fn environment_overrides_file() {
    let mut config = EngineConfig::from_toml("max_cycles = 8\nbind = \"0.0.0.0:80\"").unwrap();
    config
        .apply_env(env(&[
            ("GROQ_API_KEY", "gsk_test"),
            ("THREADLINE_MAX_CYCLES", "12"),
            ("THREADLINE_HISTORY_BUDGET", "900"),
            ("THREADLINE_TOOL_CALL_POLICY", "first_only"),
            ("THREADLINE_CHECKPOINT_DIR", "/var/lib/threadline"),
            ("THREADLINE_API_TOKENS", " one, ,two "),
        ]))
        .unwrap();

    assert_eq!(config.groq_api_key.as_deref(), Some("gsk_test"));
    assert_eq!(config.max_cycles, 12);
    assert_eq!(config.history_budget, 900);
    assert_eq!(config.tool_call_policy, ToolCallPolicy::FirstOnly);
    assert_eq!(
        config.checkpoint_dir,
        Some(PathBuf::from("/var/lib/threadline"))
    );
    assert_eq!(config.api_tokens, vec!["one", "two"]);
    assert_eq!(config.bind, "0.0.0.0:80");
}

#[test]
fn blank_variables_are_ignored() {
    let mut config = EngineConfig::default();
    config
        .apply_env(env(&[("THREADLINE_MODEL", "  "), ("GROQ_API_KEY", "")]))
        .unwrap();
    assert_eq!(config.model, "llama3-8b-8192");
    assert_eq!(config.groq_api_key, None);
}

#[test]
fn malformed_numbers_are_configuration_errors() {
    let mut config = EngineConfig::default();
    let err = config
        .apply_env(env(&[("THREADLINE_MAX_CYCLES", "many")]))
        .unwrap_err();
    assert!(matches!(err, ThreadlineError::Configuration(ref msg) if msg.contains("THREADLINE_MAX_CYCLES")));
}

#[test]
fn zero_cycles_fail_validation() {
    let config = EngineConfig {
        max_cycles: 0,
        ..EngineConfig::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ThreadlineError::Configuration(_))
    ));
}

#[test]
fn config_file_is_read_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("threadline.toml");
    std::fs::write(&path, "history_budget = 1234\n").unwrap();

    let config = EngineConfig::from_file(&path).unwrap();
    assert_eq!(config.history_budget, 1234);
    assert!(EngineConfig::from_file(&dir.path().join("missing.toml")).is_err());
}

#[test]
fn engine_options_follow_config() {
    let config = EngineConfig {
        max_cycles: 3,
        tool_call_policy: ToolCallPolicy::FirstOnly,
        tool_timeout_secs: 0,
        ..EngineConfig::default()
    };
    let options = EngineOptions::from(&config);
    assert_eq!(options.max_cycles, 3);
    assert_eq!(options.tool_call_policy, ToolCallPolicy::FirstOnly);
    assert_eq!(options.tool_timeout, None);
    assert_eq!(options.generation.temperature, Some(0.7));
}

#[test]
fn engine_requires_an_api_key() {
    let err = AgentEngine::from_config(&EngineConfig::default())
        .err()
        .expect("missing key is rejected");
    assert!(matches!(err, ThreadlineError::Configuration(_)));
}

#[test]
fn engine_from_config_registers_builtin_tools() {
    let config = EngineConfig {
        groq_api_key: Some("gsk_test".into()),
        ..EngineConfig::default()
    };
    let engine = AgentEngine::from_config(&config).unwrap();
    assert_eq!(engine.registry().len(), 6);
    assert_eq!(engine.tool_definitions()[0].name, "help");
}
