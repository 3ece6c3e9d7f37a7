//! Loading configuration files and driving a simulation from them.

use std::io::Write;

use linkagg::config::Config;
use linkagg::hashing::HashPolicy;
use linkagg::sim::Simulation;
use linkagg::Error;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_and_run() {
    let file = write_config(
        r#"
        [bundle]
        max_supported_links = 16
        active_links = 3
        hash_policy = "layer34"

        [traffic]
        flows = 300
        elephant_flows = 1
        elephant_frames = 500
        seed = 11

        [simulation]
        workers = 2
        chunk_size = 50
        "#,
    );

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.bundle.max_supported_links, 16);
    assert_eq!(config.bundle.hash_policy, HashPolicy::Layer34);

    let report = Simulation::from_config(&config).unwrap().run().unwrap();
    assert_eq!(report.uniform.tally.links(), 3);
    assert_eq!(report.uniform.tally.total(), 300);
    assert_eq!(report.elephant.tally.total(), 800);
    assert_eq!(report.seed, 11);
}

#[test]
fn test_example_config_loads() {
    let file = write_config(&Config::example().to_toml().unwrap());
    let config = Config::load(file.path()).unwrap();
    assert_eq!(config, Config::example());
}

#[test]
fn test_invalid_config_rejected() {
    let file = write_config(
        r#"
        [bundle]
        max_supported_links = 4
        active_links = 8
        "#,
    );
    assert!(matches!(
        Config::load(file.path()),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn test_malformed_config_rejected() {
    let file = write_config("[bundle\nactive_links = ");
    assert!(matches!(Config::load(file.path()), Err(Error::Config(_))));

    assert!(matches!(
        Config::load("/nonexistent/linkagg.toml"),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_all_links_down_fails_at_run_time() {
    let file = write_config(
        r#"
        [bundle]
        active_links = 0
        "#,
    );
    let config = Config::load(file.path()).unwrap();
    let err = Simulation::from_config(&config).unwrap().run().unwrap_err();
    assert!(matches!(err, Error::NoAvailableLinks));
    assert!(err.is_operational());
}
