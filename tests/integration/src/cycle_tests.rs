//! Agent lifecycle tests
//!
//! Drive a `PluginAgent` through successive server archives the way the
//! agent sees them in production: config file on disk, archive replaced
//! between cycles, listeners informed after each mutating cycle.

use std::fs;
use std::sync::{Arc, Mutex};

use plugin_fs::{EntryKey, PluginCategory};
use plugin_sync::{AgentConfig, ChangeNotice, CompareMode, CycleOutcome, PluginAgent};
use plugin_test_utils::{AgentDir, PluginArchive};

fn key(s: &str) -> EntryKey {
    EntryKey::new(s).unwrap()
}

fn recording_agent(config: AgentConfig) -> (PluginAgent, Arc<Mutex<Vec<ChangeNotice>>>) {
    let notices = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&notices);
    let mut agent = PluginAgent::new(config);
    agent.add_listener(move |notice: &ChangeNotice| sink.lock().unwrap().push(notice.clone()));
    (agent, notices)
}

fn default_config(dir: &AgentDir) -> AgentConfig {
    AgentConfig {
        plugins_dir: dir.plugins_dir(),
        archive: dir.archive_path(),
        ..AgentConfig::default()
    }
}

// =============================================================================
// Successive archives
// =============================================================================

#[test]
fn test_agent_follows_server_across_cycles() {
    let dir = AgentDir::new();
    let (agent, notices) = recording_agent(default_config(&dir));

    // First contact: empty agent receives both categories
    PluginArchive::standard()
        .with_bundled("yum.jar", "v1")
        .with_external("docker.jar", "v1")
        .write_zip(&dir.archive_path());
    assert!(agent.run_cycle().unwrap().is_success());
    assert_eq!(dir.list("bundled"), vec!["yum.jar"]);
    assert_eq!(dir.list("external"), vec!["docker.jar"]);

    // Server upgrades one plugin and drops the other
    PluginArchive::standard()
        .with_bundled("yum.jar", "v2")
        .write_zip(&dir.archive_path());
    let report = agent.run_cycle().unwrap();
    assert!(report.is_success());
    assert_eq!(dir.read("bundled/yum.jar"), "v2");
    assert!(dir.list("external").is_empty());

    // Same archive again: nothing to do
    let idle = agent.run_cycle().unwrap();
    assert!(!idle.has_drift());

    let notices = notices.lock().unwrap();
    assert_eq!(notices.len(), 2);
    let second = &notices[1];
    assert_eq!(second.cycle_id, report.cycle_id);
    let bundled = second
        .changes
        .iter()
        .find(|c| c.category == PluginCategory::Bundled)
        .unwrap();
    assert_eq!(bundled.replaced, vec![key("yum.jar")]);
    let external = second
        .changes
        .iter()
        .find(|c| c.category == PluginCategory::External)
        .unwrap();
    assert_eq!(external.removed, vec![key("docker.jar")]);
}

#[test]
fn test_check_between_cycles_tracks_drift() {
    let dir = AgentDir::new();
    let (agent, notices) = recording_agent(default_config(&dir));
    PluginArchive::standard()
        .with_bundled("p1.jar", "p1")
        .write_zip(&dir.archive_path());

    assert!(agent.check().unwrap().has_drift());
    agent.run_cycle().unwrap();
    assert!(!agent.check().unwrap().has_drift());

    // Someone drops a jar into the live tree by hand
    dir.seed_external("manual.jar", "not from the server");
    let drift = agent.check().unwrap();
    assert!(drift.has_drift());
    let plan = &drift.category(PluginCategory::External).unwrap().plan;
    assert!(plan.to_remove.contains(&key("manual.jar")));

    // Checks never notify
    assert_eq!(notices.lock().unwrap().len(), 1);
}

#[test]
fn test_aborted_cycle_does_not_notify_and_next_cycle_recovers() {
    let dir = AgentDir::new();
    dir.seed_bundled("p1.jar", "OLD");
    let (agent, notices) = recording_agent(default_config(&dir));

    // Archive not delivered yet
    let aborted = agent.run_cycle().unwrap();
    assert_eq!(aborted.outcome, CycleOutcome::Aborted);
    assert_eq!(dir.read("bundled/p1.jar"), "OLD");
    assert!(notices.lock().unwrap().is_empty());

    PluginArchive::standard()
        .with_bundled("p1.jar", "NEW")
        .write_zip(&dir.archive_path());
    assert!(agent.run_cycle().unwrap().is_success());
    assert_eq!(dir.read("bundled/p1.jar"), "NEW");
    assert_eq!(notices.lock().unwrap().len(), 1);
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_agent_from_yaml_config_with_staging_dir() {
    let dir = AgentDir::new();
    let staging = dir.root().join("staging");
    let config_path = dir.root().join("agent.yaml");
    fs::write(
        &config_path,
        format!(
            "plugins_dir: {}\narchive: {}\nstaging_dir: {}\ncompare: sha256\n",
            dir.plugins_dir().display(),
            dir.archive_path().display(),
            staging.display()
        ),
    )
    .unwrap();
    PluginArchive::standard()
        .with_external("p2.jar", "p2")
        .write_zip(&dir.archive_path());

    let config = AgentConfig::load(&config_path).unwrap();
    assert_eq!(config.compare, CompareMode::Sha256);
    let agent = PluginAgent::new(config);

    assert!(agent.run_cycle().unwrap().is_success());
    assert_eq!(dir.read("external/p2.jar"), "p2");
    // Staging trees are removed after each cycle
    assert_eq!(fs::read_dir(&staging).unwrap().count(), 0);
}

#[test]
fn test_report_serializes_for_operators() {
    let dir = AgentDir::new();
    dir.seed_bundled("stale.jar", "stale");
    PluginArchive::standard().write_zip(&dir.archive_path());
    let agent = PluginAgent::new(default_config(&dir));

    let report = agent.run_cycle().unwrap();
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["outcome"], "success");
    assert_eq!(value["ignored_entries"], 1);
    assert_eq!(value["categories"][0]["category"], "bundled");
    assert_eq!(value["categories"][0]["applied"]["removed"][0], "stale.jar");
}
