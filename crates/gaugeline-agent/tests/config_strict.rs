#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;

use gaugeline_agent::config::{self, MetricsConfig, PushEncoding, DEFAULT_BUCKETS};

fn code_of(yaml: &str) -> &'static str {
    config::load_from_str(yaml).expect_err("must fail").code().as_str()
}

#[test]
fn deny_unknown_fields_top_level() {
    assert_eq!(code_of("version: 1\nnamespce: app\n"), "CONFIG");
}

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
push:
  url: "https://example.test/push"
  intervl_secs: 5 # typo should fail
"#;
    assert_eq!(code_of(bad), "CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.service_name, "app");
    assert_eq!(cfg.namespace, "app");
    assert_eq!(cfg.subsystem, "");
    assert_eq!(cfg.listen, "0.0.0.0:9100");
    assert_eq!(cfg.histogram_buckets, DEFAULT_BUCKETS.to_vec());
    assert!(cfg.http.enabled);
    assert!(cfg.http.metrics_endpoint);
    assert!(cfg.http.health_endpoint);
    assert_eq!(cfg.push.interval_secs, 15);
    assert_eq!(cfg.push.timeout_secs, 10);
    assert_eq!(cfg.push.encoding, PushEncoding::RemoteWrite);
    assert!(!cfg.push.is_enabled());
}

#[test]
fn default_matches_minimal_parse() {
    let parsed = config::load_from_str("version: 1\n").unwrap();
    let built = MetricsConfig::default();
    assert!(built.validate().is_ok());
    assert_eq!(parsed.namespace, built.namespace);
    assert_eq!(parsed.listen, built.listen);
    assert_eq!(parsed.histogram_buckets, built.histogram_buckets);
    assert_eq!(parsed.push.interval_secs, built.push.interval_secs);
    assert_eq!(parsed.push.encoding, built.push.encoding);
}

#[test]
fn full_config_parses() {
    let ok = r#"
version: 1
service_name: matchmaker
namespace: game
subsystem: lobby
const_labels:
  env: staging
histogram_buckets: [0.1, 1, 10]
listen: "127.0.0.1:9200"
http:
  enabled: false
  buckets: [0.01, 0.1]
push:
  url: "https://prom.example.test/api/prom/push"
  user: "12345"
  api_key: "secret"
  interval_secs: 30
  timeout_secs: 5
  encoding: text
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.const_labels.get("env").map(String::as_str), Some("staging"));
    assert_eq!(cfg.histogram_buckets, vec![0.1, 1.0, 10.0]);
    assert!(!cfg.http.enabled);
    assert!(cfg.push.is_enabled());
    assert_eq!(cfg.push.encoding, PushEncoding::Text);
    assert_eq!(cfg.push.interval().as_secs(), 30);
    assert_eq!(cfg.push.timeout().as_secs(), 5);
}

#[test]
fn unsupported_version() {
    assert_eq!(code_of("version: 2\n"), "UNSUPPORTED_VERSION");
}

#[test]
fn push_ranges_enforced() {
    assert_eq!(code_of("version: 1\npush:\n  interval_secs: 0\n"), "CONFIG");
    assert_eq!(code_of("version: 1\npush:\n  interval_secs: 3601\n"), "CONFIG");
    assert_eq!(code_of("version: 1\npush:\n  timeout_secs: 0\n"), "CONFIG");
    // timeout may not outlast the interval
    assert_eq!(
        code_of("version: 1\npush:\n  interval_secs: 5\n  timeout_secs: 10\n"),
        "CONFIG"
    );
}

#[test]
fn push_url_must_be_http() {
    assert_eq!(code_of("version: 1\npush:\n  url: \"ftp://host/push\"\n"), "CONFIG");
}

#[test]
fn buckets_must_increase() {
    assert_eq!(code_of("version: 1\nhistogram_buckets: [1, 1, 2]\n"), "CONFIG");
    assert_eq!(code_of("version: 1\nhistogram_buckets: []\n"), "CONFIG");
    assert_eq!(code_of("version: 1\nhttp:\n  buckets: [2, 1]\n"), "CONFIG");
}

#[test]
fn names_are_checked() {
    assert_eq!(code_of("version: 1\nnamespace: \"1app\"\n"), "CONFIG");
    assert_eq!(code_of("version: 1\nsubsystem: \"a-b\"\n"), "CONFIG");
    assert_eq!(code_of("version: 1\nconst_labels:\n  __env: x\n"), "CONFIG");
    assert!(config::load_from_str("version: 1\nnamespace: \"\"\n").is_ok());
}

#[test]
fn listen_must_be_socket_addr() {
    assert_eq!(code_of("version: 1\nlisten: \"localhost\"\n"), "CONFIG");
}

#[test]
fn env_overrides_enable_push() {
    let mut cfg = config::load_from_str("version: 1\n").unwrap();
    let env: HashMap<&str, &str> = [
        (config::ENV_PUSH_URL, "https://prom.example.test/push"),
        (config::ENV_PUSH_USER, "42"),
        (config::ENV_PUSH_API_KEY, "k"),
    ]
    .into_iter()
    .collect();

    config::apply_env_overrides(&mut cfg, |k| env.get(k).map(|v| v.to_string()));

    assert!(cfg.push.is_enabled());
    assert_eq!(cfg.push.user, "42");
    assert!(cfg.validate().is_ok());
}

#[test]
fn empty_env_values_are_ignored() {
    let mut cfg = config::load_from_str("version: 1\npush:\n  user: file-user\n").unwrap();
    config::apply_env_overrides(&mut cfg, |_| Some(String::new()));
    assert_eq!(cfg.push.user, "file-user");
    assert!(!cfg.push.is_enabled());
}

#[test]
fn push_needs_url_and_key() {
    let only_url = config::load_from_str("version: 1\npush:\n  url: \"http://h/p\"\n").unwrap();
    assert!(!only_url.push.is_enabled());

    let blank_key =
        config::load_from_str("version: 1\npush:\n  url: \"http://h/p\"\n  api_key: \"  \"\n").unwrap();
    assert!(!blank_key.push.is_enabled());
}

#[test]
fn missing_file_is_config_error() {
    let err = config::load_from_file("/nonexistent/gaugeline.yaml").expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIG");
}

#[test]
fn skip_paths_must_be_absolute() {
    assert_eq!(code_of("version: 1\nhttp:\n  skip_paths: [\"health\"]\n"), "CONFIG");
    let cfg = config::load_from_str("version: 1\nhttp:\n  skip_paths: [\"/internal/ping\"]\n").unwrap();
    assert_eq!(cfg.http.skip_paths, vec!["/internal/ping".to_string()]);
}
