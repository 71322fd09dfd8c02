//! In-memory version control for testing
//!
//! These are test utilities - not all may be used in current tests but are
//! available for future test development.

#![allow(dead_code)]

use super::CallLog;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use webroot_git::error::{Error, Result};
use webroot_git::types::{CommandOutput, MergeOutcome};
use webroot_git::vcs::{PushRequest, VersionControl};

/// State of one simulated checkout
#[derive(Debug, Clone, Default)]
pub struct RepoState {
    /// Checked-out branch, `None` when detached
    pub branch: Option<String>,
    /// Commit at HEAD
    pub head: String,
    /// Local branches and remote-tracking refs (`origin/main`) to commits
    pub refs: HashMap<String, String>,
    /// Remote name to URL
    pub remotes: HashMap<String, String>,
    /// Unstaged working-tree changes
    pub dirty: bool,
    /// Staged paths
    pub staged: Vec<String>,
    /// Submodule path to the commit recorded in this repository's index
    pub gitlinks: HashMap<String, String>,
    /// Submodule paths whose checkout moved off the recorded commit
    pub moved_submodules: Vec<String>,
    /// Submodule name to URL in `.gitmodules`
    pub gitmodules: HashMap<String, String>,
    /// Base ref to commit count ahead; unlisted refs are even
    pub ahead: HashMap<String, usize>,
    /// Messages of commits made
    pub commits: Vec<String>,
}

impl RepoState {
    /// Checkout on `main` at `head`, tracking `origin/main`
    pub fn on_main(head: &str, origin: &str) -> Self {
        let mut state = Self {
            branch: Some("main".to_string()),
            head: head.to_string(),
            ..Self::default()
        };
        state.refs.insert("main".to_string(), head.to_string());
        state.refs.insert("origin/main".to_string(), head.to_string());
        state.remotes.insert("origin".to_string(), origin.to_string());
        state
    }

    fn resolve(&self, rev: &str) -> Option<String> {
        self.refs.get(rev).cloned()
    }
}

/// Simulated git for testing the engine without touching disk
///
/// Repositories are keyed by path. Commit timestamps and ancestry are
/// global, keyed by commit hash. Push results can be scripted per
/// repository; unscripted pushes succeed.
pub struct MockVcs {
    log: CallLog,
    repos: Mutex<HashMap<PathBuf, RepoState>>,
    timestamps: Mutex<HashMap<String, i64>>,
    ancestry: Mutex<HashSet<(String, String)>>,
    merge_results: Mutex<HashMap<(PathBuf, String), MergeOutcome>>,
    push_responses: Mutex<HashMap<PathBuf, VecDeque<CommandOutput>>>,
    next_commit: AtomicU64,
    submodule_update_ok: Mutex<bool>,
}

impl MockVcs {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            repos: Mutex::new(HashMap::new()),
            timestamps: Mutex::new(HashMap::new()),
            ancestry: Mutex::new(HashSet::new()),
            merge_results: Mutex::new(HashMap::new()),
            push_responses: Mutex::new(HashMap::new()),
            next_commit: AtomicU64::new(1),
            submodule_update_ok: Mutex::new(true),
        }
    }

    // === Setup ===

    pub fn add_repo(&self, path: &Path, state: RepoState) {
        self.repos.lock().unwrap().insert(path.to_path_buf(), state);
    }

    /// Author timestamp (unix seconds) for a commit
    pub fn set_timestamp(&self, commit: &str, secs: i64) {
        self.timestamps
            .lock()
            .unwrap()
            .insert(commit.to_string(), secs);
    }

    /// Declare `ancestor` reachable from `descendant`
    pub fn set_ancestor(&self, ancestor: &str, descendant: &str) {
        self.ancestry
            .lock()
            .unwrap()
            .insert((ancestor.to_string(), descendant.to_string()));
    }

    /// Script the result of merging `rev` in `path`
    pub fn set_merge_result(&self, path: &Path, rev: &str, outcome: MergeOutcome) {
        self.merge_results
            .lock()
            .unwrap()
            .insert((path.to_path_buf(), rev.to_string()), outcome);
    }

    /// Queue a push result for `path`; consumed in order
    pub fn queue_push(&self, path: &Path, output: CommandOutput) {
        self.push_responses
            .lock()
            .unwrap()
            .entry(path.to_path_buf())
            .or_default()
            .push_back(output);
    }

    /// Queue `n` copies of the same failing push
    pub fn queue_push_failures(&self, path: &Path, stderr: &str, n: usize) {
        for _ in 0..n {
            self.queue_push(path, CommandOutput::failed(stderr));
        }
    }

    pub fn set_ahead(&self, path: &Path, base: &str, count: usize) {
        self.with_repo(path, |s| {
            s.ahead.insert(base.to_string(), count);
        });
    }

    pub fn fail_submodule_update(&self) {
        *self.submodule_update_ok.lock().unwrap() = false;
    }

    // === Inspection ===

    pub fn state(&self, path: &Path) -> RepoState {
        self.repos
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_else(|| panic!("no mock repo at {}", path.display()))
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }

    fn with_repo<T>(&self, path: &Path, f: impl FnOnce(&mut RepoState) -> T) -> T {
        let mut repos = self.repos.lock().unwrap();
        let state = repos
            .get_mut(path)
            .unwrap_or_else(|| panic!("no mock repo at {}", path.display()));
        f(state)
    }

    fn try_repo<T>(&self, path: &Path, f: impl FnOnce(&mut RepoState) -> T) -> Result<T> {
        let mut repos = self.repos.lock().unwrap();
        match repos.get_mut(path) {
            Some(state) => Ok(f(state)),
            None => Err(Error::Git {
                command: "rev-parse".to_string(),
                message: format!("not a git repository: {}", path.display()),
            }),
        }
    }

    fn record(&self, path: &Path, entry: &str) {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        self.log.record(format!("git:{name} {entry}"));
    }

    fn resolve(&self, path: &Path, rev: &str) -> Option<String> {
        let known = self.timestamps.lock().unwrap().contains_key(rev);
        let repos = self.repos.lock().unwrap();
        let state = repos.get(path)?;
        state
            .resolve(rev)
            .or_else(|| (known || state.head == rev).then(|| rev.to_string()))
    }
}

fn pushed_branch(state: &RepoState, request: &PushRequest) -> Option<String> {
    match &request.refspec {
        Some(spec) => Some(
            spec.rsplit_once("refs/heads/")
                .map_or(spec.as_str(), |(_, b)| b)
                .to_string(),
        ),
        None => state.branch.clone(),
    }
}

#[async_trait]
impl VersionControl for MockVcs {
    async fn is_repository(&self, dir: &Path) -> bool {
        self.repos.lock().unwrap().contains_key(dir)
    }

    async fn toplevel(&self, dir: &Path) -> Result<PathBuf> {
        self.try_repo(dir, |_| dir.to_path_buf())
    }

    async fn current_branch(&self, dir: &Path) -> Result<Option<String>> {
        self.try_repo(dir, |s| s.branch.clone())
    }

    async fn head_commit(&self, dir: &Path) -> Result<String> {
        self.try_repo(dir, |s| s.head.clone())
    }

    async fn rev_parse(&self, dir: &Path, rev: &str) -> Result<Option<String>> {
        Ok(self.resolve(dir, rev))
    }

    async fn commit_timestamp(&self, _dir: &Path, rev: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .timestamps
            .lock()
            .unwrap()
            .get(rev)
            .and_then(|secs| Utc.timestamp_opt(*secs, 0).single()))
    }

    async fn submodule_commit(&self, parent: &Path, path: &str) -> Result<Option<String>> {
        self.try_repo(parent, |s| s.gitlinks.get(path).cloned())
    }

    async fn checkout(&self, dir: &Path, rev: &str) -> Result<()> {
        self.record(dir, &format!("checkout {rev}"));
        let target = self.resolve(dir, rev).ok_or_else(|| Error::Git {
            command: format!("checkout {rev}"),
            message: "unknown revision".to_string(),
        })?;
        self.with_repo(dir, |s| {
            s.branch = s.refs.contains_key(rev).then(|| rev.to_string());
            s.head = target;
        });
        Ok(())
    }

    async fn branch_exists(&self, dir: &Path, branch: &str) -> Result<bool> {
        self.try_repo(dir, |s| s.refs.contains_key(branch))
    }

    async fn is_ancestor(&self, dir: &Path, ancestor: &str, descendant: &str) -> Result<bool> {
        let descendant = self
            .resolve(dir, descendant)
            .unwrap_or_else(|| descendant.to_string());
        Ok(ancestor == descendant
            || self
                .ancestry
                .lock()
                .unwrap()
                .contains(&(ancestor.to_string(), descendant)))
    }

    async fn merge(&self, dir: &Path, rev: &str) -> Result<MergeOutcome> {
        self.record(dir, &format!("merge {rev}"));
        let scripted = self
            .merge_results
            .lock()
            .unwrap()
            .get(&(dir.to_path_buf(), rev.to_string()))
            .cloned();
        if let Some(outcome) = scripted {
            return Ok(outcome);
        }
        Ok(if self.resolve(dir, rev).is_some() {
            MergeOutcome::UpToDate
        } else {
            MergeOutcome::MissingRevision
        })
    }

    async fn fetch(&self, dir: &Path, remote: &str) -> Result<CommandOutput> {
        self.record(dir, &format!("fetch {remote}"));
        Ok(CommandOutput::ok(""))
    }

    async fn remote_url(&self, dir: &Path, remote: &str) -> Result<Option<String>> {
        self.try_repo(dir, |s| s.remotes.get(remote).cloned())
    }

    async fn set_remote_url(&self, dir: &Path, remote: &str, url: &str) -> Result<()> {
        self.record(dir, &format!("remote {remote} {url}"));
        self.try_repo(dir, |s| {
            s.remotes.insert(remote.to_string(), url.to_string());
        })
    }

    async fn has_changes(&self, dir: &Path) -> Result<bool> {
        self.try_repo(dir, |s| {
            s.dirty || !s.staged.is_empty() || !s.moved_submodules.is_empty()
        })
    }

    async fn has_staged_changes(&self, dir: &Path) -> Result<bool> {
        self.try_repo(dir, |s| !s.staged.is_empty())
    }

    async fn stage_all(&self, dir: &Path, exclude: &[&str]) -> Result<()> {
        self.record(dir, "add -A");
        self.try_repo(dir, |s| {
            if s.dirty {
                s.staged.push(".".to_string());
                s.dirty = false;
            }
            let (kept, staged): (Vec<String>, Vec<String>) = s
                .moved_submodules
                .drain(..)
                .partition(|path| exclude.contains(&path.as_str()));
            s.moved_submodules = kept;
            s.staged.extend(staged);
        })
    }

    async fn stage_paths(&self, dir: &Path, paths: &[&str]) -> Result<()> {
        self.record(dir, &format!("add {}", paths.join(" ")));
        self.try_repo(dir, |s| {
            s.staged.extend(paths.iter().map(ToString::to_string));
        })
    }

    async fn commit(&self, dir: &Path, message: &str) -> Result<String> {
        self.record(dir, "commit");
        let hash = format!("c{:039}", self.next_commit.fetch_add(1, Ordering::SeqCst));
        self.with_repo(dir, |s| {
            if s.staged.is_empty() {
                return Err(Error::Git {
                    command: "commit".to_string(),
                    message: "nothing to commit".to_string(),
                });
            }
            s.staged.clear();
            s.head.clone_from(&hash);
            s.commits.push(message.to_string());
            if let Some(branch) = s.branch.clone() {
                s.refs.insert(branch.clone(), hash.clone());
                *s.ahead.entry(format!("origin/{branch}")).or_insert(0) += 1;
                *s.ahead.entry(format!("upstream/{branch}")).or_insert(0) += 1;
            }
            Ok(hash.clone())
        })
    }

    async fn push(&self, dir: &Path, request: &PushRequest) -> Result<CommandOutput> {
        let mut entry = format!("push {}", request.remote);
        if let Some(refspec) = &request.refspec {
            entry.push(' ');
            entry.push_str(refspec);
        }
        if request.force_with_lease {
            entry.push_str(" --force-with-lease");
        }
        if request.set_upstream {
            entry.push_str(" --set-upstream");
        }
        self.record(dir, &entry);

        let output = self
            .push_responses
            .lock()
            .unwrap()
            .get_mut(dir)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| CommandOutput::ok(""));

        if output.success {
            self.with_repo(dir, |s| {
                if let Some(branch) = pushed_branch(s, request) {
                    let tracking = format!("{}/{branch}", request.remote);
                    s.ahead.insert(tracking.clone(), 0);
                    let head = s.head.clone();
                    s.refs.insert(tracking, head);
                }
            });
        }
        Ok(output)
    }

    async fn commits_ahead(&self, dir: &Path, base: &str) -> Result<Option<usize>> {
        self.try_repo(dir, |s| Some(s.ahead.get(base).copied().unwrap_or(0)))
    }

    async fn submodule_update_remote(
        &self,
        parent: &Path,
        paths: &[&str],
    ) -> Result<CommandOutput> {
        self.record(parent, &format!("submodule update --remote {}", paths.join(" ")));
        if !*self.submodule_update_ok.lock().unwrap() {
            return Ok(CommandOutput::failed("fatal: unable to fetch submodules"));
        }

        let mut repos = self.repos.lock().unwrap();
        for (path, state) in repos.iter_mut() {
            let Some(name) = path
                .strip_prefix(parent)
                .ok()
                .and_then(|rel| rel.to_str())
                .filter(|rel| !rel.is_empty())
            else {
                continue;
            };
            if !paths.is_empty() && !paths.contains(&name) {
                continue;
            }
            let branch = state.branch.clone().unwrap_or_else(|| "main".to_string());
            if let Some(tip) = state.refs.get(&format!("origin/{branch}")).cloned() {
                state.refs.insert(branch, tip.clone());
                state.head = tip;
            }
        }
        Ok(CommandOutput::ok(""))
    }

    async fn set_submodule_url(&self, parent: &Path, name: &str, url: &str) -> Result<()> {
        self.record(parent, &format!("submodule-url {name} {url}"));
        self.try_repo(parent, |s| {
            s.gitmodules.insert(name.to_string(), url.to_string());
        })
    }
}
