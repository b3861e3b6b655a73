use std::io::Write;

use chipper_voice::{ChipperConfig, StreamerError};

#[test]
fn default_endpoints() {
    let config = ChipperConfig::default();
    assert_eq!(config.url, "wss://chipper.api.anki.com:443");
    assert_eq!(config.check_host, "conncheck.global.anki-services.com/ok");
    assert!(!config.require_token);
}

#[test]
fn default_probe_timeout_is_eight_seconds() {
    let config = ChipperConfig::default();
    assert_eq!(config.probe.timeout_ms, 8000);
    assert_eq!(config.probe.client_name, "Victor-CCHECK");
}

#[test]
fn default_transport_is_secure() {
    let config = ChipperConfig::default();
    assert!(!config.transport.insecure);
    assert_eq!(config.transport.connect_timeout_ms, Some(10_000));
    assert!(config.transport.headers.is_empty());
}

#[test]
fn empty_toml_uses_defaults() {
    let config: ChipperConfig = toml::from_str("").unwrap();
    assert_eq!(config.url, ChipperConfig::default().url);
    assert_eq!(config.probe.timeout_ms, 8000);
}

#[test]
fn partial_sections_parse() {
    let toml_str = r#"
url = "wss://chipper-dev.example.com:443"
require_token = true

[probe]
timeout_ms = 3000

[transport]
insecure = true
headers = { "x-region" = "eu" }

[device]
esn = "00e20100"
app_version = "1.8.0"
"#;
    let config: ChipperConfig = toml::from_str(toml_str).unwrap();
    assert_eq!(config.url, "wss://chipper-dev.example.com:443");
    assert!(config.require_token);
    assert_eq!(config.probe.timeout_ms, 3000);
    assert_eq!(config.probe.client_name, "Victor-CCHECK");
    assert!(config.transport.insecure);
    assert_eq!(config.transport.headers["x-region"], "eu");
    assert_eq!(config.device.esn, "00e20100");
    assert_eq!(config.device.os_version, "");
}

#[test]
fn validate_flags_scheme_in_check_host() {
    let mut config = ChipperConfig::default();
    config.device.app_version = "1.8.0".into();
    assert!(config.validate().is_empty());

    config.check_host = "https://conncheck.example.com".into();
    let issues = config.validate();
    assert_eq!(issues.len(), 1);
    assert!(issues[0].contains("scheme"));
}

#[test]
fn load_reads_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "check_host = \"conncheck.example.com/ok\"").unwrap();
    let config = ChipperConfig::load(file.path()).unwrap();
    assert_eq!(config.check_host, "conncheck.example.com/ok");
}

#[test]
fn load_reports_missing_file() {
    let err = ChipperConfig::load("/nonexistent/chipper.toml").unwrap_err();
    assert!(matches!(err, StreamerError::ConfigFile { .. }));
}

#[test]
fn load_reports_bad_toml() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "url = [").unwrap();
    let err = ChipperConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, StreamerError::ConfigParse(_)));
}
