use mcp_toolbridge::config::{load_services, parse_services, ConfigError, ServiceDescriptor};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_absent_or_empty_path_yields_no_services() {
    assert!(load_services(None).unwrap().is_empty());
    assert!(load_services(Some(Path::new(""))).unwrap().is_empty());
}

#[test]
fn test_missing_or_empty_mcp_servers_yields_no_services() {
    for doc in [r#"{}"#, r#"{"mcpServers": {}}"#, r#"{"mcpServers": null}"#, r#"{"other": 1}"#] {
        assert!(parse_services(doc).unwrap().is_empty(), "{doc}");
    }
}

#[test]
fn test_loads_entries_in_document_order() {
    let file = write_config(
        r#"{
            "mcpServers": {
                "zeta": { "command": "zeta-server" },
                "alpha": { "command": "npx", "args": ["-y", "alpha"], "env": { "TOKEN": "x" } }
            }
        }"#,
    );

    let services = load_services(Some(file.path())).unwrap();
    assert_eq!(services.len(), 2);

    assert_eq!(services[0].name, "zeta");
    assert_eq!(services[0].command, "zeta-server");
    assert!(services[0].args.is_empty());
    assert_eq!(services[0].env, None);

    assert_eq!(services[1].name, "alpha");
    assert_eq!(services[1].args, vec!["-y".to_string(), "alpha".to_string()]);
    assert_eq!(
        services[1].env,
        Some(HashMap::from([("TOKEN".to_string(), "x".to_string())]))
    );
    assert_eq!(services[1].to_string(), "npx -y alpha");
}

#[test]
fn test_empty_env_means_inherit() {
    let services =
        parse_services(r#"{"mcpServers": {"s": {"command": "srv", "env": {}}}}"#).unwrap();
    assert_eq!(services[0].env, None);
}

#[test]
fn test_malformed_json_is_a_config_error() {
    let file = write_config("{ not json");
    let err = load_services(Some(file.path())).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));

    assert!(matches!(
        parse_services(r#"{"mcpServers": []}"#),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(parse_services("[]"), Err(ConfigError::Parse(_))));
}

#[test]
fn test_missing_command_names_the_server() {
    let err = parse_services(r#"{"mcpServers": {"broken": {"args": ["x"]}}}"#).unwrap_err();
    match err {
        ConfigError::InvalidEntry { server, message } => {
            assert_eq!(server, "broken");
            assert!(message.contains("command"), "{message}");
        }
        other => panic!("Expected InvalidEntry, got {other:?}"),
    }

    assert!(matches!(
        parse_services(r#"{"mcpServers": {"blank": {"command": "  "}}}"#),
        Err(ConfigError::InvalidEntry { .. })
    ));
}

#[test]
fn test_unreadable_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.json");
    assert!(matches!(
        load_services(Some(&missing)),
        Err(ConfigError::Read { .. })
    ));
}

#[test]
fn test_descriptor_builder() {
    let service = ServiceDescriptor::new("srv")
        .with_name("local")
        .with_args(["--stdio"])
        .with_env("A", "1");

    assert_eq!(service.to_string(), "srv --stdio");
    assert_eq!(service.env.unwrap().get("A").map(String::as_str), Some("1"));
}

#[test]
fn test_identity_ignores_entry_name() {
    let services = parse_services(
        r#"{
            "mcpServers": {
                "first": { "command": "srv", "args": ["--stdio"] },
                "second": { "command": "srv", "args": ["--stdio"] },
                "third": { "command": "srv", "args": ["--stdio"], "env": { "A": "1" } }
            }
        }"#,
    )
    .unwrap();

    assert_ne!(services[0].name, services[1].name);
    assert_eq!(services[0], services[1]);
    assert_ne!(services[0], services[2]);
}
