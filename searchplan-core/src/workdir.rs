//! Per-run working directory and cross-worker coordination.
//!
//! The run directory lives at `<base>/<hash>` where the hash covers the
//! positional filenames and every option value, so repeating an invocation
//! reuses (and resumes in) the same directory. Only the leader worker touches
//! the filesystem; all workers meet at the barrier before any of them emits a
//! plan.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier, Mutex, PoisonError};
use xxhash_rust::xxh64::Xxh64;

use crate::error::{PlanError, PlanResult};
use crate::options::SearchConfig;
use crate::params::{ParameterGroup, StageParameters};

/// Name of the alias that points at the most recent run directory.
pub const LATEST_ALIAS: &str = "latest";

/// Cooperating workers sharing one invocation
pub trait WorkerGroup {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    /// Block until every worker of the group has arrived.
    ///
    /// The leader passes its own failure, if any. Every follower then returns
    /// [`PlanError::Barrier`] carrying that message instead of proceeding.
    fn barrier(&self, leader_failure: Option<String>) -> PlanResult<()>;

    /// The worker that performs filesystem side effects.
    fn is_leader(&self) -> bool {
        self.rank() == 0
    }
}

/// A group of one; the barrier is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleWorker;

impl WorkerGroup for SingleWorker {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn barrier(&self, _leader_failure: Option<String>) -> PlanResult<()> {
        Ok(())
    }
}

/// Workers running as threads of one process.
#[derive(Debug, Clone)]
pub struct LocalWorkerGroup {
    rank: usize,
    size: usize,
    barrier: Arc<Barrier>,
    leader_failure: Arc<Mutex<Option<String>>>,
}

impl LocalWorkerGroup {
    /// One handle per rank, all sharing a barrier.
    pub fn create(size: usize) -> Vec<LocalWorkerGroup> {
        let size = size.max(1);
        let barrier = Arc::new(Barrier::new(size));
        let leader_failure = Arc::new(Mutex::new(None));
        (0..size)
            .map(|rank| LocalWorkerGroup {
                rank,
                size,
                barrier: Arc::clone(&barrier),
                leader_failure: Arc::clone(&leader_failure),
            })
            .collect()
    }
}

impl WorkerGroup for LocalWorkerGroup {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn barrier(&self, leader_failure: Option<String>) -> PlanResult<()> {
        // the slot only ever holds a plain string, so a poisoned lock is still usable
        if self.is_leader() {
            *self.leader_failure.lock().unwrap_or_else(PoisonError::into_inner) = leader_failure;
        }
        self.barrier.wait();

        if self.is_leader() {
            return Ok(());
        }
        match self.leader_failure.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            Some(message) => Err(PlanError::Barrier(format!("leader failed: {}", message))),
            None => Ok(()),
        }
    }
}

/// Stable hash of the invocation.
pub fn invocation_hash(filenames: &[PathBuf], config: &SearchConfig) -> u64 {
    let mut hasher = Xxh64::new(0);
    for name in filenames {
        hasher.update(name.to_string_lossy().as_bytes());
        hasher.update(&[0]);
    }
    let workflow = StageParameters::full(config, ParameterGroup::Workflow);
    hasher.update(workflow.render().as_bytes());
    hasher.digest()
}

pub fn run_directory(base: &Path, hash: u64) -> PathBuf {
    base.join(hash.to_string())
}

/// Outcome of [`prepare_working_directory`] for one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedDirectory {
    pub path: PathBuf,
    /// This worker created the run directory.
    pub created: bool,
}

/// Create `<base>/<hash>` and the `latest` alias on the leader, then wait for
/// the whole group.
pub fn prepare_working_directory(
    base: &Path,
    hash: u64,
    group: &dyn WorkerGroup,
) -> PlanResult<PreparedDirectory> {
    let path = run_directory(base, hash);
    log::debug!("Worker {}/{} preparing {}", group.rank() + 1, group.size(), path.display());

    // the leader always reaches the barrier, even when its own setup failed
    let outcome = if group.is_leader() {
        create_run_directory(base, &path)
    } else {
        Ok(false)
    };
    group.barrier(outcome.as_ref().err().map(|err| err.to_string()))?;

    Ok(PreparedDirectory {
        path,
        created: outcome?,
    })
}

/// Leader-side setup; returns whether the run directory was new.
fn create_run_directory(base: &Path, path: &Path) -> PlanResult<bool> {
    let mut created = false;
    if !base.is_dir() {
        log::info!("Tmp {} folder does not exist or is not a directory", base.display());
        std::fs::create_dir_all(base).map_err(|source| PlanError::TmpDir {
            path: base.to_path_buf(),
            source,
        })?;
        log::info!("Created dir {}", base.display());
    }
    if !path.is_dir() {
        std::fs::create_dir(path).map_err(|source| PlanError::TmpDir {
            path: path.to_path_buf(),
            source,
        })?;
        created = true;
        log::debug!("Created run directory {}", path.display());
    }
    link_latest(base, path)?;
    Ok(created)
}

/// Point `<base>/latest` at `run_dir`, replacing an older link.
#[cfg(unix)]
fn link_latest(base: &Path, run_dir: &Path) -> PlanResult<()> {
    let alias = base.join(LATEST_ALIAS);
    let to_error = |source| PlanError::TmpDir {
        path: alias.clone(),
        source,
    };

    if let Ok(meta) = std::fs::symlink_metadata(&alias) {
        if meta.file_type().is_symlink() || meta.is_file() {
            std::fs::remove_file(&alias).map_err(to_error)?;
        } else {
            log::warn!("{} is a directory; not updating the alias", alias.display());
            return Ok(());
        }
    }

    // relative target keeps the alias valid when the base directory moves
    let target = run_dir.file_name().map(PathBuf::from).unwrap_or_else(|| run_dir.to_path_buf());
    std::os::unix::fs::symlink(&target, &alias).map_err(to_error)
}

#[cfg(not(unix))]
fn link_latest(base: &Path, _run_dir: &Path) -> PlanResult<()> {
    log::warn!("Symbolic links are unsupported here; {} not updated", base.join(LATEST_ALIAS).display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OptionId;
    use tempfile::TempDir;

    fn filenames(tmp: &Path) -> Vec<PathBuf> {
        vec![
            PathBuf::from("query"),
            PathBuf::from("target"),
            PathBuf::from("result"),
            tmp.to_path_buf(),
        ]
    }

    #[test]
    fn test_hash_is_stable_and_sensitive_to_options() {
        let names = filenames(Path::new("/tmp/x"));
        let config = SearchConfig::default();
        assert_eq!(invocation_hash(&names, &config), invocation_hash(&names, &config));

        let changed = SearchConfig::builder()
            .set(OptionId::Sensitivity, |o| o.sensitivity = 7.5)
            .build()
            .unwrap();
        assert_ne!(invocation_hash(&names, &config), invocation_hash(&names, &changed));

        let other_names = filenames(Path::new("/tmp/y"));
        assert_ne!(invocation_hash(&names, &config), invocation_hash(&other_names, &config));
    }

    #[test]
    fn test_single_worker_creates_directory_and_alias() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("nested").join("tmp");
        let prepared = prepare_working_directory(&base, 42, &SingleWorker).unwrap();
        assert!(prepared.created);
        assert_eq!(prepared.path, base.join("42"));
        assert!(prepared.path.is_dir());

        #[cfg(unix)]
        {
            let link = std::fs::read_link(base.join(LATEST_ALIAS)).unwrap();
            assert_eq!(link, PathBuf::from("42"));
        }

        // second run reuses the directory and moves the alias
        let again = prepare_working_directory(&base, 42, &SingleWorker).unwrap();
        assert!(!again.created);
        let other = prepare_working_directory(&base, 7, &SingleWorker).unwrap();
        assert!(other.created);
        #[cfg(unix)]
        assert_eq!(std::fs::read_link(base.join(LATEST_ALIAS)).unwrap(), PathBuf::from("7"));
    }

    #[test]
    fn test_only_leader_creates() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().to_path_buf();
        let handles: Vec<_> = LocalWorkerGroup::create(4)
            .into_iter()
            .map(|group| {
                let base = base.clone();
                std::thread::spawn(move || prepare_working_directory(&base, 99, &group).unwrap())
            })
            .collect();
        let results: Vec<PreparedDirectory> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results.iter().filter(|r| r.created).count(), 1);
        assert!(results.iter().all(|r| r.path == base.join("99")));
    }

    #[test]
    fn test_leader_failure_releases_followers() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let base = blocker.join("tmp");

        let (sender, receiver) = std::sync::mpsc::channel();
        for group in LocalWorkerGroup::create(3) {
            let base = base.clone();
            let sender = sender.clone();
            std::thread::spawn(move || {
                let result = prepare_working_directory(&base, 5, &group);
                sender.send((group.rank(), result)).unwrap();
            });
        }
        drop(sender);

        let mut results = Vec::new();
        for _ in 0..3 {
            let finished = receiver.recv_timeout(std::time::Duration::from_secs(10));
            results.push(finished.expect("worker blocked at the barrier"));
        }
        results.sort_by_key(|(rank, _)| *rank);

        assert!(matches!(results[0].1, Err(PlanError::TmpDir { .. })));
        for (_, result) in &results[1..] {
            match result {
                Err(PlanError::Barrier(message)) => assert!(message.contains("leader failed")),
                other => panic!("expected a barrier error, got {:?}", other),
            }
        }
        assert!(!base.exists());
    }

    #[test]
    fn test_unwritable_base_is_a_resource_error() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let err = prepare_working_directory(&blocker.join("tmp"), 1, &SingleWorker).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Resource);
    }
}
