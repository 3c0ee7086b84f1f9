//! What a concurrently running plugin loader observes during a cycle

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use plugin_sync::{AgentConfig, ChangeNotice, PluginAgent};
use plugin_test_utils::{AgentDir, PluginArchive};

const SIZE: usize = 256 * 1024;

#[test]
fn test_loader_never_sees_missing_or_partial_plugin() {
    let dir = AgentDir::new();
    let old = vec![b'a'; SIZE];
    let new = vec![b'b'; SIZE];
    dir.seed_bundled("core.jar", &old);

    let path = dir.plugins_dir().join("bundled/core.jar");
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let path = path.clone();
        let done = Arc::clone(&done);
        let (old, new) = (old.clone(), new.clone());
        thread::spawn(move || {
            let mut reads = 0usize;
            while !done.load(Ordering::Acquire) {
                let bytes = fs::read(&path).expect("plugin vanished during replacement");
                assert!(bytes == old || bytes == new, "observed a partial plugin");
                reads += 1;
            }
            reads
        })
    };

    let agent = PluginAgent::new(AgentConfig {
        plugins_dir: dir.plugins_dir(),
        archive: dir.archive_path(),
        ..AgentConfig::default()
    });
    for content in [&new, &old, &new] {
        PluginArchive::standard()
            .with_bundled("core.jar", content)
            .write_zip(&dir.archive_path());
        assert!(agent.run_cycle().unwrap().is_success());
    }

    done.store(true, Ordering::Release);
    let reads = reader.join().unwrap();
    assert!(reads > 0);
    assert_eq!(fs::read(&path).unwrap(), new);
}

#[test]
fn test_notified_loader_sees_final_state() {
    let dir = AgentDir::new();
    dir.seed_external("old.jar", "old");
    PluginArchive::standard()
        .with_external("new.jar", "new")
        .write_zip(&dir.archive_path());

    let plugins_dir = dir.plugins_dir();
    let observed = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = Arc::clone(&observed);

    let mut agent = PluginAgent::new(AgentConfig {
        plugins_dir: dir.plugins_dir(),
        archive: dir.archive_path(),
        ..AgentConfig::default()
    });
    // A loader rescans the category directory when told it changed
    agent.add_listener(move |notice: &ChangeNotice| {
        for change in &notice.changes {
            let category_dir = plugins_dir.join(change.category.dir_name());
            let mut names: Vec<String> = fs::read_dir(&category_dir)
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            sink.lock().unwrap().push((change.category, names));
        }
    });

    agent.run_cycle().unwrap();

    let observed = observed.lock().unwrap();
    assert_eq!(observed.len(), 1);
    assert_eq!(observed[0].1, vec!["new.jar".to_string()]);
}
