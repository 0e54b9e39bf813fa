//! TreeWalker - runs a per-file action over a whole directory tree
//!
//! Regular files go to a fixed-size worker pool built for each call, so at
//! most `max_parallel_files` actions run at once no matter how deep the tree
//! is. Every subdirectory gets its own scoped thread, outside that bound.
//! `process_tree` returns once all of them, transitively, have finished.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::thread;

use log::{debug, warn};

use crate::error::{Error, Result};

use super::config::WalkerConfig;
use super::filter::EntryFilter;
use super::source::{DirEntry, DirectorySource, FsSource};

/// A file or directory that could not be processed.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: Error,
}

/// Outcome of a whole traversal.
#[derive(Debug)]
pub struct WalkSummary<R> {
    /// Successful actions, sorted by path
    pub completed: Vec<(PathBuf, R)>,
    /// Failed actions and unreadable directories
    pub failed: Vec<FileFailure>,
    /// Subdirectories entered (the root is not counted)
    pub directories: usize,
}

impl<R> WalkSummary<R> {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn from_events(events: impl Iterator<Item = Event<R>>) -> Self {
        let mut summary = Self {
            completed: Vec::new(),
            failed: Vec::new(),
            directories: 0,
        };
        for event in events {
            match event {
                Event::Done(path, report) => summary.completed.push((path, report)),
                Event::Failed(path, error) => summary.failed.push(FileFailure { path, error }),
                Event::Entered => summary.directories += 1,
            }
        }
        summary.completed.sort_by(|a, b| a.0.cmp(&b.0));
        summary.failed.sort_by(|a, b| a.path.cmp(&b.path));
        summary
    }
}

/// Reported back by tasks over the summary channel.
enum Event<R> {
    Done(PathBuf, R),
    Failed(PathBuf, Error),
    Entered,
}

/// Walks a directory tree, applying an action to every regular file.
pub struct TreeWalker<S = FsSource> {
    config: WalkerConfig,
    filter: EntryFilter,
    source: S,
}

impl TreeWalker<FsSource> {
    pub fn new(config: WalkerConfig) -> Result<Self> {
        let filter = EntryFilter::new(&config.ignore_patterns)?;
        Ok(Self {
            config,
            filter,
            source: FsSource,
        })
    }
}

impl<S: DirectorySource> TreeWalker<S> {
    /// Enumerate directories through `source` instead of the file system.
    pub fn with_source<T: DirectorySource>(self, source: T) -> TreeWalker<T> {
        TreeWalker {
            config: self.config,
            filter: self.filter,
            source,
        }
    }

    pub fn config(&self) -> &WalkerConfig {
        &self.config
    }

    /// Run `action` once on every regular file below `root`.
    ///
    /// Only failing to start the pool or to open `root` itself is an error.
    /// Anything that goes wrong further down is recorded in the summary and
    /// never stops sibling files or directories.
    pub fn process_tree<A, R>(&self, root: &Path, action: A) -> Result<WalkSummary<R>>
    where
        A: Fn(&Path) -> Result<R> + Sync,
        R: Send,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_parallel_files)
            .thread_name(|i| format!("kryptr-file-{}", i))
            .build()?;
        let entries = self.source.open(root).map_err(|e| Error::io(root, e))?;

        let (events, received) = mpsc::channel();
        let dispatch = Dispatch {
            source: &self.source,
            filter: &self.filter,
            action: &action,
            events,
        };

        pool.in_place_scope(|files| {
            thread::scope(|dirs| dispatch.walk_entries(root, entries, files, dirs));
        });
        // Last sender goes away, so the receiver drains and ends
        drop(dispatch);

        Ok(WalkSummary::from_events(received.into_iter()))
    }
}

/// State shared by every task of one traversal.
struct Dispatch<'w, S, A, R> {
    source: &'w S,
    filter: &'w EntryFilter,
    action: &'w A,
    events: Sender<Event<R>>,
}

impl<S, A, R> Dispatch<'_, S, A, R>
where
    S: DirectorySource,
    A: Fn(&Path) -> Result<R> + Sync,
    R: Send,
{
    /// Dispatch every entry of one open directory. The handle is dropped
    /// when this returns, before any of its descendants need to finish.
    fn walk_entries<'r, 's, 'e>(
        &'r self,
        dir: &Path,
        entries: S::Entries,
        files: &'s rayon::Scope<'r>,
        dirs: &'s thread::Scope<'s, 'e>,
    ) {
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    self.fail(dir.to_path_buf(), Error::io(dir, e));
                    continue;
                }
            };
            let name = entry.name();
            if name == "." || name == ".." || self.filter.is_ignored(name) {
                continue;
            }
            let path = dir.join(name);

            match entry {
                DirEntry::File(_) => {
                    debug!("dispatching {}", path.display());
                    files.spawn(move |_| self.run_action(path));
                }
                DirEntry::Dir(_) => {
                    dirs.spawn(move || self.enter_dir(path, files, dirs));
                }
            }
        }
    }

    fn enter_dir<'r, 's, 'e>(
        &'r self,
        dir: PathBuf,
        files: &'s rayon::Scope<'r>,
        dirs: &'s thread::Scope<'s, 'e>,
    ) {
        match self.source.open(&dir) {
            Ok(entries) => {
                debug!("entering {}", dir.display());
                self.send(Event::Entered);
                self.walk_entries(&dir, entries, files, dirs);
            }
            Err(e) => {
                let error = Error::io(&dir, e);
                self.fail(dir, error);
            }
        }
    }

    fn run_action(&self, path: PathBuf) {
        match (self.action)(&path) {
            Ok(report) => self.send(Event::Done(path, report)),
            Err(error) => self.fail(path, error),
        }
    }

    fn fail(&self, path: PathBuf, error: Error) {
        warn!("{}", error);
        self.send(Event::Failed(path, error));
    }

    fn send(&self, event: Event<R>) {
        // The receiver outlives every task, so this cannot fail
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestTree;
    use std::collections::{HashMap, HashSet};
    use std::ffi::OsString;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type Log = Arc<Mutex<Vec<String>>>;

    /// In-memory directory tree that logs when handles are closed.
    struct MemorySource {
        dirs: HashMap<PathBuf, Vec<DirEntry>>,
        opened: AtomicUsize,
        log: Log,
    }

    impl MemorySource {
        fn new(dirs: &[(&str, Vec<DirEntry>)]) -> Self {
            Self {
                dirs: dirs
                    .iter()
                    .map(|(path, entries)| (PathBuf::from(path), entries.clone()))
                    .collect(),
                opened: AtomicUsize::new(0),
                log: Log::default(),
            }
        }
    }

    struct MemoryEntries {
        entries: std::vec::IntoIter<DirEntry>,
        dir: PathBuf,
        log: Log,
    }

    impl Iterator for MemoryEntries {
        type Item = io::Result<DirEntry>;

        fn next(&mut self) -> Option<Self::Item> {
            self.entries.next().map(Ok)
        }
    }

    impl Drop for MemoryEntries {
        fn drop(&mut self) {
            self.log
                .lock()
                .unwrap()
                .push(format!("close {}", self.dir.display()));
        }
    }

    impl DirectorySource for MemorySource {
        type Entries = MemoryEntries;

        fn open(&self, dir: &Path) -> io::Result<MemoryEntries> {
            let entries = self
                .dirs
                .get(dir)
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such directory"))?
                .clone();
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(MemoryEntries {
                entries: entries.into_iter(),
                dir: dir.to_path_buf(),
                log: Arc::clone(&self.log),
            })
        }
    }

    fn file(name: &str) -> DirEntry {
        DirEntry::File(OsString::from(name))
    }

    fn dir(name: &str) -> DirEntry {
        DirEntry::Dir(OsString::from(name))
    }

    fn walker_with(config: WalkerConfig, source: MemorySource) -> TreeWalker<MemorySource> {
        TreeWalker::new(config).unwrap().with_source(source)
    }

    #[test]
    fn test_every_file_visited_exactly_once() {
        let tree = TestTree::new();
        let mut expected = HashSet::new();
        for path in [
            "top.txt",
            "a/one.txt",
            "a/two.txt",
            "a/b/three.txt",
            "a/b/c/d/four.txt",
            "e/five.txt",
            "e/f/six.txt",
        ] {
            expected.insert(tree.add_file(path, path));
        }
        tree.add_dir("empty/nested");

        let calls = AtomicUsize::new(0);
        let seen = Mutex::new(HashSet::new());
        let walker = TreeWalker::new(WalkerConfig::default()).unwrap();
        let summary = walker
            .process_tree(tree.path(), |path| {
                calls.fetch_add(1, Ordering::SeqCst);
                seen.lock().unwrap().insert(path.to_path_buf());
                Ok(())
            })
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), expected.len());
        assert_eq!(seen.into_inner().unwrap(), expected);
        assert_eq!(summary.completed.len(), expected.len());
        assert!(summary.is_success());
        // a, a/b, a/b/c, a/b/c/d, e, e/f, empty, empty/nested
        assert_eq!(summary.directories, 8);
    }

    #[test]
    fn test_returns_only_after_all_actions_finish() {
        let tree = TestTree::new();
        for i in 0..10 {
            tree.add_file(&format!("d{}/deep/file{}.txt", i % 3, i), "x");
        }

        let finished = AtomicUsize::new(0);
        let walker = TreeWalker::new(WalkerConfig {
            max_parallel_files: 2,
            ..Default::default()
        })
        .unwrap();
        walker
            .process_tree(tree.path(), |_| {
                std::thread::sleep(Duration::from_millis(20));
                finished.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();

        assert_eq!(finished.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_parallel_file_actions_are_bounded() {
        let tree = TestTree::new();
        for i in 0..60 {
            tree.add_file(&format!("l{}/m{}/f{}.bin", i % 4, i % 7, i), "data");
        }

        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let walker = TreeWalker::new(WalkerConfig {
            max_parallel_files: 4,
            ..Default::default()
        })
        .unwrap();
        let summary = walker
            .process_tree(tree.path(), |_| {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(5));
                active.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();

        assert_eq!(summary.completed.len(), 60);
        let peak = peak.load(Ordering::SeqCst);
        assert!(peak <= 4, "observed {} concurrent file actions", peak);
        assert!(peak >= 2, "file actions never overlapped");
    }

    #[test]
    fn test_dot_entries_are_skipped() {
        let source = MemorySource::new(&[
            ("/mem", vec![dir("."), dir(".."), file("a"), dir("sub")]),
            ("/mem/sub", vec![dir("."), file("b"), dir("..")]),
        ]);
        let summary = walker_with(WalkerConfig::default(), source)
            .process_tree(Path::new("/mem"), |_| Ok(()))
            .unwrap();

        let paths: Vec<&Path> = summary.completed.iter().map(|(p, _)| p.as_path()).collect();
        assert_eq!(paths, vec![Path::new("/mem/a"), Path::new("/mem/sub/b")]);
        assert!(summary.failed.is_empty());
        assert_eq!(summary.directories, 1);
    }

    #[test]
    fn test_handles_closed_once_before_descendants_finish() {
        let source = MemorySource::new(&[
            ("/mem", vec![dir("sub")]),
            ("/mem/sub", vec![file("slow")]),
        ]);
        let log = Arc::clone(&source.log);
        let walker = walker_with(WalkerConfig::default(), source);

        walker
            .process_tree(Path::new("/mem"), |path| {
                std::thread::sleep(Duration::from_millis(100));
                log.lock().unwrap().push(format!("done {}", path.display()));
                Ok(())
            })
            .unwrap();

        let log = log.lock().unwrap().clone();
        let position = |line: &str| {
            let found: Vec<usize> = log
                .iter()
                .enumerate()
                .filter(|(_, l)| l.as_str() == line)
                .map(|(i, _)| i)
                .collect();
            assert_eq!(found.len(), 1, "{:?} should appear once in {:?}", line, log);
            found[0]
        };
        let done = position("done /mem/sub/slow");
        assert!(position("close /mem") < done);
        assert!(position("close /mem/sub") < done);
        assert_eq!(walker.source.opened.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failures_do_not_stop_siblings() {
        let source = MemorySource::new(&[
            (
                "/mem",
                vec![file("bad"), file("good"), dir("missing"), dir("ok")],
            ),
            ("/mem/ok", vec![file("bad"), file("fine")]),
        ]);
        let summary = walker_with(WalkerConfig::default(), source)
            .process_tree(Path::new("/mem"), |path| {
                if path.ends_with("bad") {
                    Err(Error::InvalidConfig("refused".to_string()))
                } else {
                    Ok(path.to_string_lossy().len())
                }
            })
            .unwrap();

        let completed: Vec<&Path> = summary.completed.iter().map(|(p, _)| p.as_path()).collect();
        assert_eq!(
            completed,
            vec![Path::new("/mem/good"), Path::new("/mem/ok/fine")]
        );
        let failed: Vec<&Path> = summary.failed.iter().map(|f| f.path.as_path()).collect();
        assert_eq!(
            failed,
            vec![
                Path::new("/mem/bad"),
                Path::new("/mem/missing"),
                Path::new("/mem/ok/bad")
            ]
        );
        assert!(matches!(
            summary.failed[1].error,
            Error::Io { ref source, .. } if source.kind() == io::ErrorKind::NotFound
        ));
        assert!(!summary.is_success());
    }

    #[test]
    fn test_ignore_patterns_skip_files_and_directories() {
        let tree = TestTree::new();
        tree.add_file("keep.txt", "k");
        tree.add_file("debug.log", "l");
        tree.add_file("target/skip.txt", "s");
        tree.add_file("src/lib.rs", "r");

        let walker = TreeWalker::new(WalkerConfig {
            ignore_patterns: vec!["*.log".to_string(), "target".to_string()],
            ..Default::default()
        })
        .unwrap();
        let summary = walker.process_tree(tree.path(), |_| Ok(())).unwrap();

        let names: Vec<String> = summary
            .completed
            .iter()
            .map(|(p, _)| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["keep.txt", "lib.rs"]);
    }

    #[test]
    fn test_missing_root_is_error() {
        let tree = TestTree::new();
        let walker = TreeWalker::new(WalkerConfig::default()).unwrap();
        let err = walker
            .process_tree(&tree.path().join("nope"), |_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_empty_root_completes() {
        let tree = TestTree::new();
        let walker = TreeWalker::new(WalkerConfig::default()).unwrap();
        let summary = walker.process_tree(tree.path(), |_| Ok(())).unwrap();
        assert!(summary.completed.is_empty());
        assert_eq!(summary.directories, 0);
    }
}
