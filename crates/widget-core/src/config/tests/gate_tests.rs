use serde_json::json;

use crate::config::{ConfigData, ConfigError, ConfigGate};

fn sample_config(port: u16) -> ConfigData {
    ConfigData::from_value(json!({
        "port": port,
        "secret": "my_ninja_cat",
        "rootDir": "/srv/app",
        "middleware": { "enableForms": false }
    }))
    .expect("sample config should be an object")
}

#[test]
fn test_set_twice_fails_and_keeps_first_payload() {
    let mut gate = ConfigGate::new();
    assert!(!gate.is_set());

    gate.set(sample_config(3000)).expect("first set should succeed");
    let second = gate.set(sample_config(4000));

    assert!(matches!(second, Err(ConfigError::AlreadySet)), "Second set must fail, got {:?}", second);
    assert_eq!(gate.get("port"), Some(&json!(3000)), "Second payload must not overwrite the first");
    assert_eq!(gate.require().unwrap().port, 3000);
}

#[test]
fn test_require_before_set_fails() {
    let gate = ConfigGate::new();
    assert!(matches!(gate.require(), Err(ConfigError::NotSet)));
    assert!(gate.get("port").is_none());
}

#[test]
fn test_denylisted_keys_read_as_absent() {
    let mut gate = ConfigGate::with_denylist(["secret"]);
    gate.set(sample_config(3000)).unwrap();

    assert!(gate.get("secret").is_none(), "Denylisted key should be hidden");
    assert!(gate.is_denied("secret"));
    assert_eq!(gate.get("rootDir"), Some(&json!("/srv/app")));
    // The typed view still carries the value for kernel use
    assert_eq!(gate.require().unwrap().secret.as_deref(), Some("my_ninja_cat"));
}

#[test]
fn test_update_ignores_keys_absent_at_set_time() {
    let mut gate = ConfigGate::new();
    gate.set(sample_config(3000)).unwrap();

    let updated = gate.update("maxAge", 10).expect("update should not error");
    assert!(!updated, "Unknown key must be ignored");
    assert!(gate.get("maxAge").is_none(), "update must never introduce new keys");
}

#[test]
fn test_update_existing_key_refreshes_typed_view() {
    let mut gate = ConfigGate::new();
    gate.set(sample_config(3000)).unwrap();

    assert!(gate.update("port", 8080).unwrap());
    assert_eq!(gate.get("port"), Some(&json!(8080)));
    assert_eq!(gate.require().unwrap().port, 8080);
}

#[test]
fn test_update_with_invalid_value_restores_previous() {
    let mut gate = ConfigGate::new();
    gate.set(sample_config(3000)).unwrap();

    let result = gate.update("port", "not-a-port");
    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })), "got {:?}", result);
    assert_eq!(gate.get("port"), Some(&json!(3000)));
}

#[test]
fn test_update_before_set_fails() {
    let mut gate = ConfigGate::new();
    assert!(matches!(gate.update("port", 1), Err(ConfigError::NotSet)));
}

#[test]
fn test_invalid_payload_leaves_gate_unset() {
    let mut gate = ConfigGate::new();
    let bad = ConfigData::from_value(json!({ "port": "three thousand" })).unwrap();

    assert!(matches!(gate.set(bad), Err(ConfigError::Parse { .. })));
    assert!(!gate.is_set(), "A rejected payload must not count as the one-time set");
    assert!(gate.set(sample_config(3000)).is_ok());
}
