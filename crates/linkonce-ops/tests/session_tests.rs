use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use linkonce_ops::{
    LinkMaterializer, LinkState, SaveStage, Session, SessionConfig, SessionError, StateStore,
};
use tempfile::TempDir;

struct Fixture {
    _temp: TempDir,
    source: PathBuf,
    dest: PathBuf,
    state_file: PathBuf,
}

impl Fixture {
    /// Source tree and outputs side by side.
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("src");
        fs::create_dir_all(source.join("sub")).unwrap();
        fs::write(source.join("a.txt"), "alpha").unwrap();
        fs::write(source.join("sub/b.txt"), "beta").unwrap();

        Self {
            dest: temp.path().join("out"),
            state_file: temp.path().join(".linkonce"),
            source,
            _temp: temp,
        }
    }

    /// Destination and state file inside the source tree, like running
    /// `linkonce -d out` from the tree itself.
    fn nested() -> Self {
        let temp = TempDir::new().unwrap();
        let source = temp.path().to_path_buf();
        fs::create_dir_all(source.join("sub")).unwrap();
        fs::write(source.join("a.txt"), "alpha").unwrap();
        fs::write(source.join("sub/b.txt"), "beta").unwrap();

        Self {
            dest: source.join("out"),
            state_file: source.join(".linkonce"),
            source,
            _temp: temp,
        }
    }

    fn config(&self) -> SessionConfig {
        SessionConfig::builder()
            .source_root(&self.source)
            .dest_root(&self.dest)
            .state_file(&self.state_file)
            .build()
            .unwrap()
    }

    fn session(&self) -> Session {
        Session::new(self.config())
    }

    fn persisted(&self) -> HashSet<PathBuf> {
        StateStore::new(&self.state_file)
            .load()
            .iter()
            .map(Path::to_path_buf)
            .collect()
    }
}

fn paths(items: &[&str]) -> HashSet<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}

#[cfg(unix)]
fn same_inode(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    let a = fs::metadata(a).unwrap();
    let b = fs::metadata(b).unwrap();
    a.dev() == b.dev() && a.ino() == b.ino()
}

#[test]
fn test_first_run_links_everything() {
    let fx = Fixture::new();

    let summary = fx.session().run().unwrap();

    assert_eq!(summary.walk.linked, 2);
    assert_eq!(summary.walk.skipped, 0);
    assert_eq!(summary.state_before, 0);
    assert_eq!(summary.state_after, 2);
    assert_eq!(fs::read_to_string(fx.dest.join("a.txt")).unwrap(), "alpha");
    assert_eq!(fs::read_to_string(fx.dest.join("sub/b.txt")).unwrap(), "beta");
    assert_eq!(fx.persisted(), paths(&["a.txt", "sub/b.txt"]));
}

#[cfg(unix)]
#[test]
fn test_links_share_inode_with_source() {
    let fx = Fixture::new();

    fx.session().run().unwrap();

    assert!(same_inode(&fx.source.join("a.txt"), &fx.dest.join("a.txt")));
    assert!(same_inode(
        &fx.source.join("sub/b.txt"),
        &fx.dest.join("sub/b.txt")
    ));
}

#[test]
fn test_second_run_over_unchanged_tree_links_nothing() {
    let fx = Fixture::new();

    fx.session().run().unwrap();
    let summary = fx.session().run().unwrap();

    assert_eq!(summary.walk.linked, 0);
    assert_eq!(summary.walk.skipped, 2);
    assert_eq!(summary.state_before, 2);
    assert_eq!(summary.state_after, 2);
}

#[test]
fn test_rerun_links_only_new_file() {
    let fx = Fixture::new();
    fx.session().run().unwrap();

    fs::write(fx.source.join("sub/c.txt"), "gamma").unwrap();
    let summary = fx.session().run().unwrap();

    assert_eq!(summary.walk.linked, 1);
    assert_eq!(summary.walk.skipped, 2);
    assert_eq!(fs::read_to_string(fx.dest.join("sub/c.txt")).unwrap(), "gamma");
    assert_eq!(fx.persisted(), paths(&["a.txt", "sub/b.txt", "sub/c.txt"]));
}

#[test]
fn test_nested_outputs_are_not_mirrored() {
    let fx = Fixture::nested();

    fx.session().run().unwrap();
    assert_eq!(fx.persisted(), paths(&["a.txt", "sub/b.txt"]));

    fs::write(fx.source.join("sub/c.txt"), "gamma").unwrap();
    let summary = fx.session().run().unwrap();

    assert_eq!(summary.walk.linked, 1);
    assert_eq!(fx.persisted(), paths(&["a.txt", "sub/b.txt", "sub/c.txt"]));
    assert!(!fx.dest.join("out").exists());
    assert!(!fx.dest.join(".linkonce").exists());
}

#[test]
fn test_leftover_save_temporary_is_not_mirrored() {
    let fx = Fixture::nested();
    fx.session().run().unwrap();

    // What a save killed before its rename leaves behind.
    fs::write(fx.source.join(".linkonceK3j9Qx.tmp"), b"a.txt\0").unwrap();
    let summary = fx.session().run().unwrap();

    assert_eq!(summary.walk.linked, 0);
    assert_eq!(fx.persisted(), paths(&["a.txt", "sub/b.txt"]));
    assert!(!fx.dest.join(".linkonceK3j9Qx.tmp").exists());
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_aborts_before_save() {
    use std::os::unix::fs::PermissionsExt;

    let fx = Fixture::new();
    fx.session().run().unwrap();
    let before = fs::read(&fx.state_file).unwrap();

    let locked = fx.source.join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("secret.txt"), "s").unwrap();
    fs::write(fx.source.join("z.txt"), "z").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Permission bits do not apply to root.
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = fx.session().run();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(matches!(result, Err(SessionError::Walk { .. })));
    assert_eq!(fs::read(&fx.state_file).unwrap(), before);
    assert!(!fx.dest.join("z.txt").exists());
}

#[test]
fn test_destination_root_is_created() {
    let mut fx = Fixture::new();
    fx.dest = fx.dest.join("deep/er");

    fx.session().run().unwrap();

    assert!(fx.dest.join("a.txt").exists());
}

#[test]
fn test_deleted_source_file_stays_in_state() {
    let fx = Fixture::new();
    fx.session().run().unwrap();

    fs::remove_file(fx.source.join("a.txt")).unwrap();
    let summary = fx.session().run().unwrap();

    assert_eq!(summary.walk.linked, 0);
    assert_eq!(summary.walk.skipped, 1);
    assert!(fx.persisted().contains(Path::new("a.txt")));
}

#[cfg(unix)]
#[test]
fn test_crash_before_save_is_recovered() {
    let fx = Fixture::new();

    // Links made by a session that died before saving its state.
    let materializer = LinkMaterializer::new(&fx.source, &fx.dest);
    materializer.materialize(Path::new("a.txt")).unwrap();
    materializer.materialize(Path::new("sub/b.txt")).unwrap();
    assert!(!fx.state_file.exists());
    assert!(fx.dest.join("a.txt").exists());

    let summary = fx.session().run().unwrap();

    assert_eq!(summary.walk.linked, 2);
    assert_eq!(fx.persisted(), paths(&["a.txt", "sub/b.txt"]));
}

#[cfg(unix)]
#[test]
fn test_abort_mid_walk_keeps_previous_state() {
    let fx = Fixture::new();
    fx.session().run().unwrap();
    let before = fs::read(&fx.state_file).unwrap();

    // c.txt links fine, d.txt collides with an unrelated file.
    fs::write(fx.source.join("sub/c.txt"), "gamma").unwrap();
    fs::write(fx.source.join("sub/d.txt"), "delta").unwrap();
    fs::write(fx.dest.join("sub/d.txt"), "unrelated").unwrap();

    let result = fx.session().run();

    assert!(matches!(result, Err(SessionError::Link { .. })));
    assert_eq!(fs::read(&fx.state_file).unwrap(), before);
    assert!(fx.dest.join("sub/c.txt").exists());

    fs::remove_file(fx.dest.join("sub/d.txt")).unwrap();
    let summary = fx.session().run().unwrap();

    assert_eq!(summary.walk.linked, 2);
    assert_eq!(
        fx.persisted(),
        paths(&["a.txt", "sub/b.txt", "sub/c.txt", "sub/d.txt"])
    );
}

#[test]
fn test_unwritable_state_location_fails_after_walk() {
    let mut fx = Fixture::new();
    fx.state_file = fx.source.join("missing-dir/.linkonce");

    let result = fx.session().run();

    assert!(matches!(
        result,
        Err(SessionError::StateWrite {
            stage: SaveStage::Create,
            ..
        })
    ));
    // Linking itself completed before the save failed.
    assert!(fx.dest.join("sub/b.txt").exists());
}

#[test]
fn test_missing_source_root_aborts() {
    let mut fx = Fixture::new();
    fx.source = fx.source.join("nope");

    let result = fx.session().run();

    assert!(matches!(result, Err(SessionError::Walk { .. })));
    assert!(!fx.state_file.exists());
}

#[test]
fn test_state_round_trip_through_files() {
    let temp = TempDir::new().unwrap();
    let store = StateStore::new(temp.path().join(".linkonce"));

    for size in [0usize, 1, 20_000] {
        let original: LinkState = (0..size)
            .map(|i| format!("dir{}/file-{i}.dat", i % 97))
            .collect();

        store.save(&original).unwrap();
        let loaded = store.load();
        store.save(&loaded).unwrap();
        let reloaded = store.load();

        assert_eq!(reloaded.len(), size);
        assert_eq!(reloaded, original);
    }
}

#[test]
fn test_unterminated_state_file_keeps_last_entry() {
    let fx = Fixture::new();
    fs::write(&fx.state_file, b"a.txt\0sub/b.txt").unwrap();

    let summary = fx.session().run().unwrap();

    assert_eq!(summary.walk.linked, 0);
    assert_eq!(summary.walk.skipped, 2);
}
