use gmscope_core::index::{CACHE_FILE_NAME, GmlIndex, SymbolFilter};
use gmscope_core::{BuildStatus, GmlScanner, ScanOutput, SourceScanner, SymbolKind};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn names<'a>(symbols: impl IntoIterator<Item = &'a gmscope_core::Symbol>) -> Vec<String> {
    symbols.into_iter().map(|s| s.name.clone()).collect()
}

/// Delegates to the real scanner and counts how many files it was handed.
struct CountingScanner {
    calls: Arc<AtomicUsize>,
}

impl SourceScanner for CountingScanner {
    fn scan_content(&self, content: &str, file_path: &Path) -> ScanOutput {
        self.calls.fetch_add(1, Ordering::SeqCst);
        GmlScanner::new().scan_content(content, file_path)
    }
}

/// Deletes `victim` the first time it is asked to scan `trigger`, so a file
/// that was discovered is gone by the time the index reads it.
struct DeletingScanner {
    trigger: &'static str,
    victim: PathBuf,
}

impl SourceScanner for DeletingScanner {
    fn scan_content(&self, content: &str, file_path: &Path) -> ScanOutput {
        if file_path.ends_with(self.trigger) && self.victim.exists() {
            fs::remove_file(&self.victim).unwrap();
        }
        GmlScanner::new().scan_content(content, file_path)
    }
}

fn cached_keys(root: &Path) -> Vec<String> {
    let cache: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.join(CACHE_FILE_NAME)).unwrap()).unwrap();
    cache["file_mtimes_ns"]
        .as_object()
        .unwrap()
        .keys()
        .cloned()
        .collect()
}

fn counting_index(root: &Path) -> (GmlIndex, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let index = GmlIndex::with_scanner(
        root,
        Box::new(CountingScanner {
            calls: calls.clone(),
        }),
    );
    (index, calls)
}

#[test]
fn fresh_build_of_single_script() {
    let dir = tempdir().unwrap();
    write(dir.path(), "scripts/foo/foo.gml", "function foo() {\n    bar();\n}\n");

    let mut index = GmlIndex::new(dir.path());
    let report = index.build(true);

    assert_eq!(report.status, BuildStatus::Built);
    assert_eq!((report.symbols, report.references, report.files), (1, 1, 1));
    assert!(report.added_files.is_none());

    let defs = index.find_definition("foo");
    assert_eq!(defs.len(), 1);
    assert_eq!(defs[0].name, "foo");
    assert!(index.find_definition("bar").is_empty());
    assert_eq!(index.find_references("bar").len(), 1);
    assert!(dir.path().join(CACHE_FILE_NAME).exists());
}

#[test]
fn second_build_is_served_from_cache() {
    let dir = tempdir().unwrap();
    write(dir.path(), "scripts/a/a.gml", "function a() { b(); }\n");
    write(dir.path(), "objects/o_player/Step_0.gml", "a();\nshow_debug_message(1);\n");

    let (mut index, calls) = counting_index(dir.path());
    let first = index.build(false);
    assert_eq!(first.status, BuildStatus::Built);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let cache_before = fs::read(dir.path().join(CACHE_FILE_NAME)).unwrap();
    let second = index.build(false);

    assert_eq!(second.status, BuildStatus::Cached);
    assert_eq!(second.symbols, first.symbols);
    assert_eq!(second.references, first.references);
    assert_eq!(second.files, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2, "cached build must not rescan");
    assert_eq!(fs::read(dir.path().join(CACHE_FILE_NAME)).unwrap(), cache_before);
}

#[test]
fn new_instance_round_trips_through_cache() {
    let dir = tempdir().unwrap();
    write(dir.path(), "scripts/a/a.gml", "function Zebra() {}\nfunction apple() { Banana(); }\n");
    write(dir.path(), "scripts/b/b.gml", "function Banana() {}\nenum Dir { left, right }\n");

    let mut original = GmlIndex::new(dir.path());
    original.build(true);
    let listed_before = names(original.list_symbols(&SymbolFilter::new()));
    let refs_before = original.find_references("Banana").to_vec();
    let defs_before = original.find_definition("Banana").to_vec();

    let (mut reloaded, calls) = counting_index(dir.path());
    let report = reloaded.build(false);

    assert_eq!(report.status, BuildStatus::Cached);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(names(reloaded.list_symbols(&SymbolFilter::new())), listed_before);
    assert_eq!(reloaded.find_references("Banana"), refs_before.as_slice());
    assert_eq!(reloaded.find_definition("Banana"), defs_before.as_slice());
}

#[test]
fn queries_build_on_first_use() {
    let dir = tempdir().unwrap();
    write(dir.path(), "scripts/a/a.gml", "function a() {}\n");

    let mut index = GmlIndex::new(dir.path());
    assert!(!index.is_built());
    assert_eq!(index.find_definition("a").len(), 1);
    assert!(index.is_built());
}

#[test]
fn changed_file_is_rescanned_alone() {
    let dir = tempdir().unwrap();
    write(dir.path(), "scripts/a/a.gml", "function keep_me() { helper(); }\n");
    write(dir.path(), "scripts/b/b.gml", "function old_name() {}\n");

    let (mut index, calls) = counting_index(dir.path());
    index.build(false);
    let a_before = index.find_definition("keep_me").to_vec();

    write(
        dir.path(),
        "scripts/b/b.gml",
        "function new_name(x, y) {\n    return x + y;\n}\n",
    );
    let report = index.build(false);

    assert_eq!(report.status, BuildStatus::Incremental);
    assert_eq!(report.changed_files, Some(1));
    assert_eq!(report.added_files, Some(0));
    assert_eq!(report.removed_files, Some(0));
    assert_eq!(report.files, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    assert!(index.find_definition("old_name").is_empty());
    let new_defs = index.find_definition("new_name");
    assert_eq!(new_defs.len(), 1);
    assert_eq!(new_defs[0].parameters, vec!["x", "y"]);
    assert_eq!(index.find_definition("keep_me"), a_before.as_slice());
    assert_eq!(index.find_references("helper").len(), 1);
}

#[test]
fn removed_file_is_purged() {
    let dir = tempdir().unwrap();
    write(dir.path(), "scripts/a/a.gml", "function a() { b(); }\n");
    write(dir.path(), "scripts/b/b.gml", "function b() { a(); }\n");

    let mut index = GmlIndex::new(dir.path());
    index.build(false);
    assert_eq!(index.find_references("a").len(), 1);

    fs::remove_file(dir.path().join("scripts/b/b.gml")).unwrap();
    let report = index.build(false);

    assert_eq!(report.status, BuildStatus::Incremental);
    assert_eq!(report.removed_files, Some(1));
    assert_eq!(report.files, 0);
    assert_eq!((report.symbols, report.references), (1, 1));
    assert!(index.find_definition("b").is_empty());
    assert!(index.find_references("a").is_empty());
    assert_eq!(index.find_definition("a").len(), 1);
    assert_eq!(index.find_references("b").len(), 1);
}

#[test]
fn added_file_is_picked_up() {
    let dir = tempdir().unwrap();
    write(dir.path(), "scripts/a/a.gml", "function a() {}\n");

    let mut index = GmlIndex::new(dir.path());
    index.build(false);

    write(dir.path(), "rooms/rm_start/RoomCreationCode.gml", "a();\n");
    let report = index.build(false);

    assert_eq!(report.status, BuildStatus::Incremental);
    assert_eq!(report.added_files, Some(1));
    assert_eq!(report.files, 1);
    assert_eq!(index.find_references("a").len(), 1);
}

#[test]
fn list_symbols_orders_case_insensitively_and_filters() {
    let dir = tempdir().unwrap();
    write(dir.path(), "scripts/z/z.gml", "function Zebra() {}\n");
    write(dir.path(), "scripts/a/a.gml", "function apple() {}\n#macro APPLE_COUNT 3\n");
    write(dir.path(), "objects/o_b/Create_0.gml", "function Banana() {}\n");

    let mut index = GmlIndex::new(dir.path());
    let functions = index.list_symbols(&SymbolFilter::new().kind(SymbolKind::Function));
    assert_eq!(names(functions), vec!["apple", "Banana", "Zebra"]);

    let apples = index.list_symbols(&SymbolFilter::new().name("APPLE"));
    assert_eq!(names(apples), vec!["apple", "APPLE_COUNT"]);

    let in_objects = index.list_symbols(&SymbolFilter::new().file("OBJECTS"));
    assert_eq!(names(in_objects), vec!["Banana"]);
}

#[test]
fn symbols_in_file_are_sorted_by_line() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "scripts/util/util.gml",
        "function zeta() {}\n\nfunction alpha() {}\n#macro MID 1\n",
    );
    write(dir.path(), "scripts/other/other.gml", "function other() {}\n");

    let mut index = GmlIndex::new(dir.path());
    let absolute = dir.path().join("scripts/util/util.gml");
    let lines: Vec<_> = index
        .get_symbols_in_file(&absolute)
        .iter()
        .map(|s| (s.name.clone(), s.location.line))
        .collect();
    assert_eq!(
        lines,
        vec![
            ("zeta".to_string(), 1),
            ("alpha".to_string(), 3),
            ("MID".to_string(), 4)
        ]
    );

    let relative = index.get_symbols_in_file(Path::new("scripts/util/util.gml"));
    assert_eq!(relative.len(), 3);
    assert!(index.get_symbols_in_file(Path::new("scripts/none.gml")).is_empty());
}

#[test]
fn dangling_references_are_kept() {
    let dir = tempdir().unwrap();
    write(dir.path(), "objects/o_hud/Draw_64.gml", "draw_text(10, 10, \"hp\");\n");

    let mut index = GmlIndex::new(dir.path());
    assert!(index.find_definition("draw_text").is_empty());
    let refs = index.find_references("draw_text");
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].location.line, 1);
}

#[test]
fn stale_schema_version_forces_full_build() {
    for body in [
        r#"{"version": 1, "file_mtimes_ns": {}, "file_sizes": {}, "definitions": [], "references": []}"#,
        r#"{"file_mtimes_ns": {}, "file_sizes": {}}"#,
        "{ truncated",
    ] {
        let dir = tempdir().unwrap();
        write(dir.path(), "scripts/a/a.gml", "function a() {}\n");
        fs::write(dir.path().join(CACHE_FILE_NAME), body).unwrap();

        let mut index = GmlIndex::new(dir.path());
        let report = index.build(false);
        assert_eq!(report.status, BuildStatus::Built, "cache body: {body}");
        assert_eq!(report.symbols, 1);

        let rewritten: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(CACHE_FILE_NAME)).unwrap()).unwrap();
        assert_eq!(rewritten["version"], 2);
    }
}

#[test]
fn force_ignores_valid_cache() {
    let dir = tempdir().unwrap();
    write(dir.path(), "scripts/a/a.gml", "function a() {}\n");

    let (mut index, calls) = counting_index(dir.path());
    index.build(false);
    let report = index.build(true);

    assert_eq!(report.status, BuildStatus::Built);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(index.find_definition("a").len(), 1);
}

#[test]
fn empty_or_missing_root_gives_empty_index() {
    let dir = tempdir().unwrap();
    let mut index = GmlIndex::new(dir.path().join("does-not-exist"));
    let report = index.build(false);

    assert_eq!(report.status, BuildStatus::Built);
    assert_eq!((report.symbols, report.references, report.files), (0, 0, 0));
    assert!(index.list_symbols(&SymbolFilter::new()).is_empty());
}

#[test]
fn clear_cache_removes_file_and_state() {
    let dir = tempdir().unwrap();
    write(dir.path(), "scripts/a/a.gml", "function a() {}\n");

    let mut index = GmlIndex::new(dir.path());
    index.build(false);
    assert!(index.clear_cache().unwrap());
    assert!(!dir.path().join(CACHE_FILE_NAME).exists());
    assert!(!index.is_built());
    assert!(!index.clear_cache().unwrap());

    assert_eq!(index.build(false).status, BuildStatus::Built);
}

#[test]
fn unwritable_cache_does_not_fail_build() {
    let dir = tempdir().unwrap();
    write(dir.path(), "scripts/a/a.gml", "function a() { b(); }\n");
    fs::create_dir(dir.path().join(CACHE_FILE_NAME)).unwrap();

    let mut index = GmlIndex::new(dir.path());
    for _ in 0..2 {
        let report = index.build(false);
        assert_eq!(report.status, BuildStatus::Built);
        assert_eq!((report.symbols, report.references, report.files), (1, 1, 1));
    }
    assert!(dir.path().join(CACHE_FILE_NAME).is_dir());
    assert_eq!(index.find_definition("a").len(), 1);
}

#[test]
fn file_vanishing_mid_build_is_skipped() {
    let dir = tempdir().unwrap();
    write(dir.path(), "scripts/a/a.gml", "function a() {}\n");
    write(dir.path(), "scripts/b/b.gml", "function b() {}\n");

    let mut index = GmlIndex::with_scanner(
        dir.path(),
        Box::new(DeletingScanner {
            trigger: "a.gml",
            victim: dir.path().join("scripts/b/b.gml"),
        }),
    );
    let report = index.build(true);

    assert_eq!(report.status, BuildStatus::Built);
    assert_eq!(report.files, 1);
    assert_eq!(report.symbols, 1);
    assert_eq!(index.find_definition("a").len(), 1);
    assert!(index.find_definition("b").is_empty());
    assert_eq!(cached_keys(dir.path()), vec!["scripts/a/a.gml"]);
}

#[test]
fn changed_file_that_fails_rescan_is_dropped() {
    let dir = tempdir().unwrap();
    write(dir.path(), "scripts/a/a.gml", "function a() {}\n");
    write(dir.path(), "scripts/b/b.gml", "function b() { a(); }\n");
    GmlIndex::new(dir.path()).build(true);
    assert_eq!(cached_keys(dir.path()), vec!["scripts/a/a.gml", "scripts/b/b.gml"]);

    write(dir.path(), "scripts/a/a.gml", "function a_renamed() {}\n");
    write(dir.path(), "scripts/b/b.gml", "function b_renamed() { a(); a(); }\n");

    let mut index = GmlIndex::with_scanner(
        dir.path(),
        Box::new(DeletingScanner {
            trigger: "a.gml",
            victim: dir.path().join("scripts/b/b.gml"),
        }),
    );
    let report = index.build(false);

    assert_eq!(report.status, BuildStatus::Incremental);
    assert_eq!(report.changed_files, Some(2));
    assert_eq!(report.files, 1);
    assert_eq!((report.symbols, report.references), (1, 0));
    assert!(index.find_definition("b").is_empty());
    assert!(index.find_definition("b_renamed").is_empty());
    assert!(index.find_references("a").is_empty());
    assert_eq!(index.find_definition("a_renamed").len(), 1);
    assert_eq!(cached_keys(dir.path()), vec!["scripts/a/a.gml"]);
}

#[cfg(unix)]
#[test]
fn linked_script_is_indexed() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("real.txt"), "function linked() {}\n").unwrap();
    fs::create_dir_all(dir.path().join("scripts/a")).unwrap();
    std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("scripts/a/a.gml")).unwrap();

    let mut index = GmlIndex::new(dir.path());
    let report = index.build(true);

    assert_eq!((report.symbols, report.files), (1, 1));
    assert_eq!(index.find_definition("linked").len(), 1);
}
