use serial_test::serial;
use snippet_runner::load_config::{
    dry_run_enabled, load_config, load_config_from, load_importer_config_from,
};
use snippet_runner_core::SnippetError;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

const RUNNER_ENV: [(&str, &str); 4] = [
    ("ATL_URL", "https://example.atlassian.net/gateway/api/graphql"),
    ("ATL_USERNAME", "me@example.com"),
    ("ATL_PASSWORD", "api-token"),
    ("ATL_SNIPPET_PATH", "./snippets"),
];

const IMPORTER_ENV: [(&str, &str); 6] = [
    ("BITBUCKET_URL", "https://bitbucket.example.com"),
    ("BITBUCKET_TOKEN", "bb-token"),
    ("ATLASSIAN_EMAIL", "me@example.com"),
    ("ATLASSIAN_API_TOKEN", "api-token"),
    ("ATLASSIAN_SUBDOMAIN", "example"),
    ("COMPASS_CLOUD_ID", "cloud-1"),
];

#[test]
#[serial]
fn test_load_config_reads_process_environment() {
    for (key, value) in RUNNER_ENV {
        env::set_var(key, value);
    }

    let config = load_config().expect("Config should load");

    assert_eq!(
        config.client.url().as_str(),
        "https://example.atlassian.net/gateway/api/graphql"
    );
    assert_eq!(config.client.username(), "me@example.com");
    assert_eq!(config.client.password(), "api-token");
    assert_eq!(config.snippet_root, PathBuf::from("./snippets"));

    for (key, _) in RUNNER_ENV {
        env::remove_var(key);
    }
}

struct TestCase {
    name: &'static str,
    missing: &'static str,
    blank: bool,
}

#[test]
fn test_each_missing_runner_variable_is_a_configuration_error() {
    let test_cases = vec![
        TestCase {
            name: "no url",
            missing: "ATL_URL",
            blank: false,
        },
        TestCase {
            name: "no username",
            missing: "ATL_USERNAME",
            blank: false,
        },
        TestCase {
            name: "blank password",
            missing: "ATL_PASSWORD",
            blank: true,
        },
        TestCase {
            name: "no snippet path",
            missing: "ATL_SNIPPET_PATH",
            blank: false,
        },
    ];

    for case in test_cases {
        let pairs: Vec<(&str, &str)> = RUNNER_ENV
            .iter()
            .filter(|(k, _)| *k != case.missing)
            .copied()
            .chain(case.blank.then_some((case.missing, "   ")))
            .collect();

        match load_config_from(lookup(&pairs)) {
            Err(SnippetError::Configuration(msg)) => assert!(
                msg.contains(case.missing),
                "case '{}': message {msg:?} should name {}",
                case.name,
                case.missing
            ),
            other => panic!("case '{}': expected configuration error, got {other:?}", case.name),
        }
    }
}

#[test]
fn test_invalid_url_is_a_configuration_error() {
    let mut pairs = RUNNER_ENV.to_vec();
    pairs[0] = ("ATL_URL", "not a url");
    assert!(matches!(
        load_config_from(lookup(&pairs)),
        Err(SnippetError::Configuration(_))
    ));
}

#[test]
fn test_importer_config_defaults_and_gateway() {
    let config =
        load_importer_config_from(lookup(&IMPORTER_ENV)).expect("Importer config should load");

    assert!(!config.dry_run);
    assert!(config.exclude.is_empty());
    assert_eq!(config.bitbucket_url.as_str(), "https://bitbucket.example.com/");
    assert_eq!(
        config.graphql_endpoint(),
        "https://example.atlassian.net/gateway/api/graphql"
    );
    let debug = format!("{config:?}");
    assert!(!debug.contains("bb-token"));
    assert!(!debug.contains("api-token"));
}

#[test]
fn test_importer_config_optional_settings() {
    let mut pairs = IMPORTER_ENV.to_vec();
    pairs.push(("DRY_RUN", "1"));
    pairs.push(("IMPORT_EXCLUDE", "ARCHIVE, PLAT/legacy ,,"));
    pairs.push(("ATLASSIAN_GRAPHQL_URL", "http://localhost:4000/graphql"));

    let config = load_importer_config_from(lookup(&pairs)).unwrap();
    assert!(config.dry_run);
    assert_eq!(config.exclude, vec!["ARCHIVE", "PLAT/legacy"]);
    assert_eq!(config.graphql_endpoint(), "http://localhost:4000/graphql");
}

#[test]
fn test_importer_config_requires_every_credential() {
    for (missing, _) in IMPORTER_ENV {
        let pairs: Vec<(&str, &str)> = IMPORTER_ENV
            .iter()
            .copied()
            .filter(|(k, _)| *k != missing)
            .collect();
        assert!(
            matches!(
                load_importer_config_from(lookup(&pairs)),
                Err(SnippetError::Configuration(msg)) if msg.contains(missing)
            ),
            "expected {missing} to be required"
        );
    }
}

#[test]
fn test_dry_run_flag_values() {
    assert!(dry_run_enabled(Some("1")));
    assert!(dry_run_enabled(Some("true")));
    assert!(dry_run_enabled(Some(" TRUE ")));
    assert!(!dry_run_enabled(Some("0")));
    assert!(!dry_run_enabled(Some("")));
    assert!(!dry_run_enabled(None));
}
