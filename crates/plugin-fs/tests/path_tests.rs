use plugin_fs::{EntryKey, Error};
use rstest::rstest;
use std::path::Path;

#[rstest]
#[case("plugin.jar", "plugin.jar")]
#[case("lib/plugin.jar", "lib/plugin.jar")]
#[case("lib\\plugin.jar", "lib/plugin.jar")]
#[case("./lib//plugin.jar", "lib/plugin.jar")]
#[case("lib/./plugin.jar/", "lib/plugin.jar")]
fn test_normalizes_valid_keys(#[case] raw: &str, #[case] expected: &str) {
    let key = EntryKey::new(raw).unwrap();
    assert_eq!(key.as_str(), expected);
}

#[rstest]
#[case("")]
#[case("./")]
#[case("/etc/passwd")]
#[case("\\\\server\\share")]
#[case("C:\\plugins\\p.jar")]
#[case("../outside.jar")]
#[case("lib/../../outside.jar")]
fn test_rejects_unsafe_keys(#[case] raw: &str) {
    let result = EntryKey::new(raw);
    assert!(
        matches!(result, Err(Error::InvalidEntryPath { .. })),
        "expected rejection for {raw:?}, got {result:?}"
    );
}

#[test]
fn test_from_relative_path() {
    let key = EntryKey::from_relative(Path::new("lib").join("plugin.jar").as_path()).unwrap();
    assert_eq!(key.as_str(), "lib/plugin.jar");
}

#[test]
fn test_from_relative_rejects_parent() {
    assert!(EntryKey::from_relative(Path::new("../plugin.jar")).is_err());
}

#[cfg(unix)]
#[test]
fn test_from_relative_rejects_non_utf8_names() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let name = Path::new(OsStr::from_bytes(b"lib/\xffstale.jar"));
    let result = EntryKey::from_relative(name);
    assert!(matches!(result, Err(Error::InvalidEntryPath { .. })), "got {result:?}");
}

#[test]
fn test_under_resolves_below_root() {
    let key = EntryKey::new("lib/plugin.jar").unwrap();
    let native = key.under(Path::new("/plugins/bundled"));
    assert_eq!(native, Path::new("/plugins/bundled").join("lib").join("plugin.jar"));
}

#[test]
fn test_segments() {
    let key = EntryKey::new("bundled/lib/plugin.jar").unwrap();
    assert_eq!(key.first_segment(), "bundled");
    assert_eq!(key.file_name(), "plugin.jar");

    let rest = key.strip_first_segment().unwrap();
    assert_eq!(rest.as_str(), "lib/plugin.jar");

    let leaf = EntryKey::new("dummy.txt").unwrap();
    assert!(leaf.strip_first_segment().is_none());
    assert_eq!(leaf.first_segment(), "dummy.txt");
}

#[test]
fn test_serde_round_trip_validates() {
    let key: EntryKey = serde_json::from_str("\"lib/p.jar\"").unwrap();
    assert_eq!(key.as_str(), "lib/p.jar");
    assert_eq!(serde_json::to_string(&key).unwrap(), "\"lib/p.jar\"");

    let bad: Result<EntryKey, _> = serde_json::from_str("\"../p.jar\"");
    assert!(bad.is_err());
}
