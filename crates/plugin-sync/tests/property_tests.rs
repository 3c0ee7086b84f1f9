//! Property-based tests for convergence and idempotence

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use plugin_sync::{CompareMode, PluginCategory, ReconcileEngine, SyncOptions};
use plugin_test_utils::{AgentDir, PluginArchive};
use proptest::prelude::*;

type Tree = BTreeMap<String, Vec<u8>>;

/// Flat and nested names, non-ASCII names and names at NAME_MAX. A flat
/// name may match a directory of the other tree.
fn name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-e]{1,3}\\.jar",
        "lib/[a-c]{1,2}\\.jar",
        "[a-c]{1,2}",
        "[a-c]/[a-c]{1,2}\\.jar",
        "[äöü日本 ]{1,4}\\.jar",
        "p{247,251}\\.jar",
    ]
}

/// True when one name is a directory of another, which no tree can hold
fn has_file_dir_conflict(tree: &Tree) -> bool {
    tree.keys().any(|name| {
        let dir = format!("{name}/");
        tree.keys().any(|other| other.starts_with(&dir))
    })
}

fn tree_strategy() -> impl Strategy<Value = Tree> {
    prop::collection::btree_map(name_strategy(), prop::collection::vec(any::<u8>(), 0..64), 0..6)
        .prop_filter("a name is both a file and a directory", |tree| {
            !has_file_dir_conflict(tree)
        })
}

fn seed(agent: &AgentDir, category: &str, tree: &Tree) {
    for (name, content) in tree {
        agent.seed(&format!("{category}/{name}"), content);
    }
}

fn read_tree(root: &Path) -> Tree {
    let mut out = Tree::new();
    for entry in walkdir::WalkDir::new(root).min_depth(1) {
        let entry = entry.unwrap();
        if entry.file_type().is_file() {
            let key = entry
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            out.insert(key, fs::read(entry.path()).unwrap());
        }
    }
    out
}

fn archive_for(bundled: Option<&Tree>, external: Option<&Tree>) -> PluginArchive {
    let mut archive = PluginArchive::new().with_file("dummy.txt", "filler");
    if let Some(tree) = bundled {
        archive = archive.with_dir("bundled");
        for (name, content) in tree {
            archive = archive.with_bundled(name, content);
        }
    }
    if let Some(tree) = external {
        archive = archive.with_dir("external");
        for (name, content) in tree {
            archive = archive.with_external(name, content);
        }
    }
    archive
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_live_tree_converges_to_archive(
        live_bundled in tree_strategy(),
        live_external in tree_strategy(),
        want_bundled in prop::option::of(tree_strategy()),
        want_external in prop::option::of(tree_strategy()),
        sha in any::<bool>(),
    ) {
        let agent = AgentDir::new();
        seed(&agent, "bundled", &live_bundled);
        seed(&agent, "external", &live_external);
        let archive = archive_for(want_bundled.as_ref(), want_external.as_ref())
            .write_zip(&agent.archive_path());

        let compare = if sha { CompareMode::Sha256 } else { CompareMode::Bytes };
        let engine = ReconcileEngine::new(SyncOptions { compare, ..SyncOptions::default() });
        let report = engine.run(&archive, &agent.plugins_dir());

        prop_assert!(report.is_success(), "failures: {:?}", report.failures());
        let empty = Tree::new();
        prop_assert_eq!(
            read_tree(&agent.plugins_dir().join(PluginCategory::Bundled.dir_name())),
            want_bundled.clone().unwrap_or_else(|| empty.clone())
        );
        prop_assert_eq!(
            read_tree(&agent.plugins_dir().join(PluginCategory::External.dir_name())),
            want_external.clone().unwrap_or(empty)
        );

        // Idempotence: a second run plans nothing
        let second = engine.run(&archive, &agent.plugins_dir());
        prop_assert!(!second.has_drift());
        prop_assert!(second.changes().is_empty());
    }

    #[test]
    fn prop_dry_run_never_mutates(
        live in tree_strategy(),
        want in tree_strategy(),
    ) {
        let agent = AgentDir::new();
        seed(&agent, "external", &live);
        let before = agent.fingerprint();
        let archive = archive_for(Some(&want), None).write_zip(&agent.archive_path());

        let report = ReconcileEngine::new(SyncOptions::dry_run())
            .run(&archive, &agent.plugins_dir());

        prop_assert!(report.changes().is_empty());
        prop_assert_eq!(agent.fingerprint(), before);
    }
}
