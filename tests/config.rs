use std::fs;
use std::time::Duration;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use catalogos_capes::config::{Config, ConfigLoader};
use catalogos_capes::error::CatalogError;
use catalogos_capes::retry::{RetryPolicy, RetrySettings};

#[test]
fn parse_config_overrides() {
    let config = Config {
        api_base: Some("http://portal.test/api/3/action".to_string()),
        query: None,
        rows: Some(50),
        dataset_name: Some("Programas".to_string()),
        format: Some("CSV".to_string()),
        dest_dir: Some("/tmp/capes".to_string()),
        timeout_secs: Some(5),
        retry: RetrySettings {
            max_attempts: Some(2),
            base_delay_ms: Some(10),
            max_delay_ms: Some(100),
            multiplier: Some(3.0),
        },
    };

    let resolved = ConfigLoader::resolve_config(config);
    assert_eq!(resolved.catalog.api_base, "http://portal.test/api/3/action");
    assert_eq!(resolved.catalog.query, "catalogo-de-teses-e-dissertacoes");
    assert_eq!(resolved.catalog.rows, 50);
    assert_eq!(resolved.catalog.timeout, Duration::from_secs(5));
    assert_eq!(resolved.dataset_name, "Programas");
    assert_eq!(resolved.format.as_deref(), Some("CSV"));
    assert_eq!(resolved.dest_dir, Utf8PathBuf::from("/tmp/capes"));
    assert_eq!(
        resolved.retry,
        RetryPolicy::new(
            2,
            Duration::from_millis(10),
            Duration::from_millis(100),
            3.0
        )
    );

    let options = resolved.batch_options(true);
    assert_eq!(options.dataset_name, "Programas");
    assert!(options.dry_run);
}

#[test]
fn blank_format_means_all_formats() {
    let config = Config {
        format: Some("  ".to_string()),
        ..Config::default()
    };
    assert_eq!(ConfigLoader::resolve_config(config).format, None);
}

#[test]
fn resolve_reads_json_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("catalogos-capes.json");
    fs::write(
        &path,
        r#"{"rows": 25, "format": "XLSX", "retry": {"max_attempts": 1}}"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.catalog.rows, 25);
    assert_eq!(resolved.format.as_deref(), Some("XLSX"));
    assert_eq!(resolved.retry.max_attempts(), 1);
}

#[test]
fn explicit_missing_file_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, CatalogError::MissingConfig(_));
}

#[test]
fn malformed_file_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("broken.json");
    fs::write(&path, "{ rows: ").unwrap();
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, CatalogError::ConfigParse(_));
}
