//! Commit metadata model
//!
//! [`GitContext`] holds an ordered sequence of [`GitCommit`] plus
//! repository-level metadata. Commits backed by a local repository load
//! their metadata (author, date, parents, branches, changed files) on first
//! access and cache it per instance. Commits built purely from a message
//! string never touch git.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{DateTime, FixedOffset, Local, Timelike};
use indexmap::IndexMap;
use once_cell::unsync::OnceCell;

use crate::error::GitContextError;
use crate::shell::Git;

/// Git's default date format: "2023-01-30 15:12:17 +0100"
const GIT_TIMEFORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Log format packing author/date/parents on one NUL-separated line,
/// followed by the raw commit message
const GIT_LOG_FORMAT: &str = "--pretty=%aN%x00%aE%x00%ai%x00%P%n%B";

/// A parsed commit message
///
/// `full` is `original` stripped of comment lines and anything at or below
/// the scissors cut line; `title` is the first line of `full` and `body` the
/// remaining lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommitMessage {
    pub original: String,
    pub full: String,
    pub title: String,
    pub body: Vec<String>,
}

impl GitCommitMessage {
    /// Parse a raw commit message, dropping comment lines and the cut line
    /// plus everything after it
    pub fn from_full_message(commentchar: &str, original: &str) -> Self {
        let cutline = format!("{commentchar} ------------------------ >8 ------------------------");
        let lines: Vec<&str> = original
            .split('\n')
            .take_while(|line| *line != cutline)
            .filter(|line| !line.starts_with(commentchar))
            .collect();
        let full = lines.join("\n");
        let title = lines.first().copied().unwrap_or("").to_string();
        let body = lines.iter().skip(1).map(|l| l.to_string()).collect();
        Self {
            original: original.to_string(),
            full,
            title,
            body,
        }
    }

    /// Recompute `full` from the current title and body. Configuration
    /// rules that rewrite the body call this to keep the parts consistent.
    pub fn sync_full(&mut self) {
        if self.body.is_empty() {
            self.full = self.title.clone();
        } else {
            self.full = format!("{}\n{}", self.title, self.body.join("\n"));
        }
    }
}

impl fmt::Display for GitCommitMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

/// Addition/deletion counts for one changed file. Counts are unset for
/// binary files, which git reports as `-`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitChangedFileStats {
    pub filepath: PathBuf,
    pub additions: Option<u64>,
    pub deletions: Option<u64>,
}

impl fmt::Display for GitChangedFileStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let additions = self
            .additions
            .map_or_else(|| "-".to_string(), |a| a.to_string());
        let deletions = self
            .deletions
            .map_or_else(|| "-".to_string(), |d| d.to_string());
        write!(
            f,
            "{}: {} additions, {} deletions",
            self.filepath.display(),
            additions,
            deletions
        )
    }
}

/// Parse `git diff --numstat` output
fn parse_changed_file_stats(
    raw: &str,
) -> Result<IndexMap<String, GitChangedFileStats>, GitContextError> {
    let mut stats = IndexMap::new();
    for line in raw.split('\n').filter(|l| !l.is_empty()) {
        let mut parts = line.splitn(3, '\t');
        let (additions, deletions, filepath) =
            match (parts.next(), parts.next(), parts.next()) {
                (Some(a), Some(d), Some(p)) => (a, d, p),
                _ => {
                    return Err(GitContextError::invalid_output(format!(
                        "malformed numstat line: '{line}'"
                    )));
                }
            };
        let parse = |field: &str| -> Result<Option<u64>, GitContextError> {
            if field == "-" {
                return Ok(None);
            }
            field.parse().map(Some).map_err(|_| {
                GitContextError::invalid_output(format!("malformed numstat line: '{line}'"))
            })
        };
        stats.insert(
            filepath.to_string(),
            GitChangedFileStats {
                filepath: PathBuf::from(filepath),
                additions: parse(additions)?,
                deletions: parse(deletions)?,
            },
        );
    }
    Ok(stats)
}

/// Handle to a local git repository with cached repository-level metadata
#[derive(Clone)]
pub struct Repository {
    pub path: PathBuf,
    git: Rc<dyn Git>,
    commentchar: OnceCell<String>,
    current_branch: OnceCell<String>,
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.path)
            .field("commentchar", &self.commentchar)
            .field("current_branch", &self.current_branch)
            .finish()
    }
}

impl Repository {
    pub fn new(path: impl Into<PathBuf>, git: Rc<dyn Git>) -> Self {
        Self {
            path: path.into(),
            git,
            commentchar: OnceCell::new(),
            current_branch: OnceCell::new(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<String, GitContextError> {
        self.git.run(&self.path, args)
    }

    /// The configured comment character, defaulting to `#` when git reports
    /// it unset (exit code 1)
    pub fn commentchar(&self) -> Result<&str, GitContextError> {
        self.commentchar
            .get_or_try_init(|| {
                let output = self.git.run_with_ok_codes(
                    &self.path,
                    &["config", "--get", "core.commentchar"],
                    &[0, 1],
                )?;
                if output.exit_code == 1 {
                    return Ok("#".to_string());
                }
                Ok(output.stdout.replace('\n', ""))
            })
            .map(String::as_str)
    }

    /// Name of the currently checked out branch
    pub fn current_branch(&self) -> Result<&str, GitContextError> {
        self.current_branch
            .get_or_try_init(|| {
                match self.run(&["rev-parse", "--abbrev-ref", "HEAD"]) {
                    Ok(branch) => Ok(branch.trim().to_string()),
                    // Empty repos have no HEAD to abbreviate (needs git 2.22+)
                    Err(_) => Ok(self.run(&["branch", "--show-current"])?.trim().to_string()),
                }
            })
            .map(String::as_str)
    }
}

/// How a commit was materialized, which determines how lazy fields load
#[derive(Debug, Clone, PartialEq, Eq)]
enum CommitKind {
    /// Built from a message string only, no repository backing
    Detached,
    /// An existing commit in a local repository, loaded lazily by sha
    Local,
    /// A staged (not yet created) commit in a local repository
    Staged,
}

/// A single commit under inspection
///
/// Metadata accessors return `Result` because repository-backed commits
/// fetch on first access. Detached commits return unset metadata instead of
/// erroring.
#[derive(Debug, Clone)]
pub struct GitCommit {
    kind: CommitKind,
    repository: Option<Rc<Repository>>,
    pub sha: Option<String>,
    message: OnceCell<GitCommitMessage>,
    author_name: OnceCell<String>,
    author_email: OnceCell<String>,
    date: OnceCell<DateTime<FixedOffset>>,
    parents: OnceCell<Vec<String>>,
    branches: OnceCell<Vec<String>>,
    changed_files_stats: OnceCell<IndexMap<String, GitChangedFileStats>>,
    /// Free-form fields attached by configuration rules for later rules to
    /// read
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl GitCommit {
    fn empty(kind: CommitKind, repository: Option<Rc<Repository>>) -> Self {
        Self {
            kind,
            repository,
            sha: None,
            message: OnceCell::new(),
            author_name: OnceCell::new(),
            author_email: OnceCell::new(),
            date: OnceCell::new(),
            parents: OnceCell::new(),
            branches: OnceCell::new(),
            changed_files_stats: OnceCell::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Commit built purely from a message string
    pub fn from_commit_msg(message: GitCommitMessage) -> Self {
        let commit = Self::empty(CommitKind::Detached, None);
        let _ = commit.message.set(message);
        commit
    }

    /// Staged commit: the message is known, everything else is derived from
    /// the repository's current state
    pub fn staged(message: GitCommitMessage, repository: Rc<Repository>) -> Self {
        let commit = Self::empty(CommitKind::Staged, Some(repository));
        let _ = commit.message.set(message);
        commit
    }

    /// Existing local commit, loaded lazily by sha
    pub fn local(sha: impl Into<String>, repository: Rc<Repository>) -> Self {
        let mut commit = Self::empty(CommitKind::Local, Some(repository));
        commit.sha = Some(sha.into());
        commit
    }

    fn repository(&self) -> Result<&Repository, GitContextError> {
        self.repository
            .as_deref()
            .ok_or_else(|| GitContextError::invalid_output("commit has no backing repository"))
    }

    /// Path of the backing repository, if the commit has one
    pub fn repository_path(&self) -> Option<&Path> {
        self.repository.as_deref().map(|repo| repo.path.as_path())
    }

    /// Single `git log` call filling message, author, date and parents
    fn load_log(&self) -> Result<(), GitContextError> {
        let repository = self.repository()?;
        let sha = self
            .sha
            .as_deref()
            .ok_or_else(|| GitContextError::invalid_output("local commit without sha"))?;
        let raw = repository.run(&["log", sha, "-1", GIT_LOG_FORMAT])?;

        let (header, message) = raw
            .split_once('\n')
            .ok_or_else(|| GitContextError::invalid_output("truncated git log output"))?;
        let fields: Vec<&str> = header.split('\x00').collect();
        let [name, email, date, parents] = fields[..] else {
            return Err(GitContextError::invalid_output(format!(
                "malformed git log header: '{header}'"
            )));
        };

        let date = DateTime::parse_from_str(date, GIT_TIMEFORMAT).map_err(|err| {
            GitContextError::invalid_output(format!("unparseable commit date '{date}': {err}"))
        })?;
        let parents: Vec<String> = if parents.is_empty() {
            Vec::new()
        } else {
            parents.split(' ').map(str::to_string).collect()
        };
        let commentchar = repository.commentchar()?.to_string();

        let _ = self
            .message
            .set(GitCommitMessage::from_full_message(&commentchar, message));
        let _ = self.author_name.set(name.to_string());
        let _ = self.author_email.set(email.to_string());
        let _ = self.date.set(date);
        let _ = self.parents.set(parents);
        Ok(())
    }

    pub fn message(&self) -> Result<&GitCommitMessage, GitContextError> {
        if let Some(message) = self.message.get() {
            return Ok(message);
        }
        self.load_log()?;
        self.message
            .get()
            .ok_or_else(|| GitContextError::invalid_output("commit message failed to load"))
    }

    /// Mutable access for configuration rules that rewrite the message
    pub fn message_mut(&mut self) -> Result<&mut GitCommitMessage, GitContextError> {
        self.message()?;
        self.message
            .get_mut()
            .ok_or_else(|| GitContextError::invalid_output("commit message failed to load"))
    }

    pub fn author_name(&self) -> Result<Option<&str>, GitContextError> {
        match self.kind {
            CommitKind::Detached => Ok(None),
            CommitKind::Local => {
                if self.author_name.get().is_none() {
                    self.load_log()?;
                }
                Ok(self.author_name.get().map(String::as_str))
            }
            CommitKind::Staged => self
                .staged_config_value(&self.author_name, "user.name")
                .map(Some),
        }
    }

    pub fn author_email(&self) -> Result<Option<&str>, GitContextError> {
        match self.kind {
            CommitKind::Detached => Ok(None),
            CommitKind::Local => {
                if self.author_email.get().is_none() {
                    self.load_log()?;
                }
                Ok(self.author_email.get().map(String::as_str))
            }
            CommitKind::Staged => self
                .staged_config_value(&self.author_email, "user.email")
                .map(Some),
        }
    }

    fn staged_config_value<'a>(
        &self,
        cell: &'a OnceCell<String>,
        key: &str,
    ) -> Result<&'a str, GitContextError> {
        cell.get_or_try_init(|| {
            match self.repository()?.run(&["config", "--get", key]) {
                Ok(value) => Ok(value.trim().to_string()),
                Err(GitContextError::ExitCode { .. }) => Err(GitContextError::MissingGitConfig {
                    key: key.to_string(),
                }),
                Err(err) => Err(err),
            }
        })
        .map(String::as_str)
    }

    pub fn date(&self) -> Result<Option<DateTime<FixedOffset>>, GitContextError> {
        match self.kind {
            CommitKind::Detached => Ok(None),
            CommitKind::Local => {
                if self.date.get().is_none() {
                    self.load_log()?;
                }
                Ok(self.date.get().copied())
            }
            // The commit doesn't exist yet; use the current time at the
            // same second precision git records
            CommitKind::Staged => self
                .date
                .get_or_try_init(|| {
                    let now = Local::now().fixed_offset();
                    Ok(now.with_nanosecond(0).unwrap_or(now))
                })
                .map(|date| Some(*date)),
        }
    }

    pub fn parents(&self) -> Result<&[String], GitContextError> {
        match self.kind {
            // Parents cannot be known before the commit exists
            CommitKind::Detached | CommitKind::Staged => {
                Ok(self.parents.get_or_init(Vec::new).as_slice())
            }
            CommitKind::Local => {
                if self.parents.get().is_none() {
                    self.load_log()?;
                }
                self.parents
                    .get()
                    .map(Vec::as_slice)
                    .ok_or_else(|| GitContextError::invalid_output("commit parents failed to load"))
            }
        }
    }

    /// Branches containing this commit. For a staged commit this is the
    /// current branch; detached commits belong to no branch.
    pub fn branches(&self) -> Result<&[String], GitContextError> {
        self.branches
            .get_or_try_init(|| match self.kind {
                CommitKind::Detached => Ok(Vec::new()),
                CommitKind::Staged => {
                    let branch = self.repository()?.current_branch()?.to_string();
                    Ok(vec![branch])
                }
                CommitKind::Local => {
                    let repository = self.repository()?;
                    let sha = self.sha.as_deref().ok_or_else(|| {
                        GitContextError::invalid_output("local commit without sha")
                    })?;
                    let raw = repository.run(&["branch", "--contains", sha])?;
                    // Strip the '*' current-branch marker; '*' cannot occur
                    // in a valid branch name
                    Ok(raw
                        .split('\n')
                        .filter(|l| !l.is_empty())
                        .map(|l| l.replace('*', "").trim().to_string())
                        .collect())
                }
            })
            .map(Vec::as_slice)
    }

    pub fn changed_files_stats(
        &self,
    ) -> Result<&IndexMap<String, GitChangedFileStats>, GitContextError> {
        self.changed_files_stats.get_or_try_init(|| match self.kind {
            CommitKind::Detached => Ok(IndexMap::new()),
            CommitKind::Staged => {
                let raw = self
                    .repository()?
                    .run(&["diff", "--staged", "--numstat", "-r"])?;
                parse_changed_file_stats(&raw)
            }
            CommitKind::Local => {
                let repository = self.repository()?;
                let sha = self
                    .sha
                    .as_deref()
                    .ok_or_else(|| GitContextError::invalid_output("local commit without sha"))?;
                let raw = repository.run(&[
                    "diff-tree",
                    "--no-commit-id",
                    "--numstat",
                    "-r",
                    "--root",
                    sha,
                ])?;
                parse_changed_file_stats(&raw)
            }
        })
    }

    /// Paths of all changed files, in git output order
    pub fn changed_files(&self) -> Result<Vec<String>, GitContextError> {
        Ok(self.changed_files_stats()?.keys().cloned().collect())
    }

    pub fn is_merge_commit(&self) -> Result<bool, GitContextError> {
        Ok(self.message()?.title.starts_with("Merge"))
    }

    pub fn is_fixup_commit(&self) -> Result<bool, GitContextError> {
        Ok(self.message()?.title.starts_with("fixup!"))
    }

    pub fn is_squash_commit(&self) -> Result<bool, GitContextError> {
        Ok(self.message()?.title.starts_with("squash!"))
    }

    pub fn is_fixup_amend_commit(&self) -> Result<bool, GitContextError> {
        Ok(self.message()?.title.starts_with("amend!"))
    }

    pub fn is_revert_commit(&self) -> Result<bool, GitContextError> {
        Ok(self.message()?.title.starts_with("Revert"))
    }
}

/// The git context a lint run operates on: an ordered sequence of commits
/// plus an optional backing repository
#[derive(Debug, Clone, Default)]
pub struct GitContext {
    pub repository: Option<Rc<Repository>>,
    pub commits: Vec<GitCommit>,
}

impl GitContext {
    /// Context for a bare commit message, with no repository backing.
    /// Uses `#` as comment character.
    pub fn from_commit_msg(commit_msg: &str) -> Self {
        let message = GitCommitMessage::from_full_message("#", commit_msg);
        Self {
            repository: None,
            commits: vec![GitCommit::from_commit_msg(message)],
        }
    }

    /// Context for a staged (pre-commit) message in a local repository
    pub fn from_staged_commit(
        commit_msg: &str,
        repository_path: &Path,
        git: Rc<dyn Git>,
    ) -> Result<Self, GitContextError> {
        let repository = Rc::new(Repository::new(repository_path, git));
        let message = GitCommitMessage::from_full_message(repository.commentchar()?, commit_msg);
        let commit = GitCommit::staged(message, Rc::clone(&repository));
        Ok(Self {
            repository: Some(repository),
            commits: vec![commit],
        })
    }

    /// Context for one or more existing commits in a local repository.
    ///
    /// `refspec` takes precedence over `commit_hashes`; with neither, the
    /// last commit on the current branch is used. Hashes are resolved
    /// through `git log` so short hashes expand to full shas and invalid
    /// ones fail early.
    pub fn from_local_repository(
        repository_path: &Path,
        refspec: Option<&str>,
        commit_hashes: &[String],
        git: Rc<dyn Git>,
    ) -> Result<Self, GitContextError> {
        let repository = Rc::new(Repository::new(repository_path, git));

        let sha_list: Vec<String> = if let Some(refspec) = refspec {
            repository
                .run(&["rev-list", refspec])?
                .split_whitespace()
                .map(str::to_string)
                .collect()
        } else if !commit_hashes.is_empty() {
            let mut shas = Vec::with_capacity(commit_hashes.len());
            for hash in commit_hashes {
                let sha = repository
                    .run(&["log", "-1", hash, "--pretty=%H"])?
                    .replace('\n', "");
                shas.push(sha);
            }
            shas
        } else {
            vec![repository.run(&["log", "-1", "--pretty=%H"])?.replace('\n', "")]
        };

        let commits = sha_list
            .into_iter()
            .map(|sha| GitCommit::local(sha, Rc::clone(&repository)))
            .collect();
        Ok(Self {
            repository: Some(repository),
            commits,
        })
    }
}
