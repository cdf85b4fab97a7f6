//! Test-only collaborators: scripted model, fake git, recording host.
//!
//! All fakes share a [`Journal`] so tests can assert the cross-collaborator
//! order of calls (for example: model, then `git add -A`, then commit, push).

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::process::Command;
use std::rc::Rc;

use anyhow::{Context, Result, anyhow};
use serde_json::json;

use crate::core::repo_id::RepoId;
use crate::core::types::InvocationRequest;
use crate::dispatch::Dispatcher;
use crate::io::config::{AgentConfig, Credentials, Settings};
use crate::io::git::{Git, VersionControl};
use crate::io::github::{HostResponse, IssueRequest, PullRequestDraft, RepositoryHost};
use crate::io::llm::{ChatRequest, LanguageModel, ModelReply};
use crate::io::prompt::PromptEngine;
use crate::operations::Toolbox;

/// Ordered record of collaborator calls.
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    /// Entries that start with one of `prefixes`, in call order.
    pub fn filtered(&self, prefixes: &[&str]) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter(|entry| prefixes.iter().any(|prefix| entry.starts_with(prefix)))
            .cloned()
            .collect()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.0.borrow().iter().any(|e| e == entry)
    }
}

/// In-memory [`VersionControl`] with configurable answers.
#[derive(Debug)]
pub struct FakeVcs {
    journal: Journal,
    pub working_diff: String,
    /// What `git diff --cached` shows once `stage_all` has run.
    pub staged_diff: String,
    pub range_diff: String,
    pub log: String,
    pub branch: Option<String>,
    pub remote: String,
    pub files: Vec<(String, Option<String>)>,
    /// What `commit` reports: whether anything was staged.
    pub has_changes: bool,
    pub push_error: Option<String>,
    pub sha: String,
}

impl FakeVcs {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            working_diff: "diff --git a/src/lib.rs b/src/lib.rs\n+pub fn added() {}\n".to_string(),
            staged_diff: "diff --git a/src/new.rs b/src/new.rs\n+pub fn fresh() {}\n"
                .to_string(),
            range_diff: "diff --git a/README.md b/README.md\n+More docs\n".to_string(),
            log: "Add flag\nFix crash".to_string(),
            branch: Some("feature".to_string()),
            remote: "git@github.com:acme/widgets.git".to_string(),
            files: Vec::new(),
            has_changes: true,
            push_error: None,
            sha: "abc1234".to_string(),
        }
    }
}

impl VersionControl for FakeVcs {
    fn diff(&self, range: Option<&str>) -> Result<String> {
        match range {
            Some(range) => {
                self.journal.record(format!("git diff {range}"));
                Ok(self.range_diff.clone())
            }
            None => {
                self.journal.record("git diff");
                Ok(self.working_diff.clone())
            }
        }
    }

    fn staged_diff(&self) -> Result<String> {
        self.journal.record("git diff --cached");
        Ok(self.staged_diff.clone())
    }

    fn log(&self, range: &str, format: &str) -> Result<String> {
        self.journal.record(format!("git log {range} {format}"));
        Ok(self.log.clone())
    }

    fn current_branch(&self) -> Result<String> {
        self.journal.record("git branch");
        self.branch.clone().ok_or_else(|| anyhow!("detached HEAD"))
    }

    fn remote_url(&self) -> Result<String> {
        self.journal.record("git remote");
        Ok(self.remote.clone())
    }

    fn stage_all(&self) -> Result<()> {
        self.journal.record("git add -A");
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<bool> {
        self.journal.record(format!("git commit {message}"));
        Ok(self.has_changes)
    }

    fn push(&self) -> Result<()> {
        self.journal.record("git push");
        match &self.push_error {
            Some(err) => Err(anyhow!("{err}")),
            None => Ok(()),
        }
    }

    fn head_short_sha(&self) -> Result<String> {
        self.journal.record("git sha");
        Ok(self.sha.clone())
    }

    fn list_tracked_files(&self) -> Result<Vec<String>> {
        self.journal.record("git ls-files");
        Ok(self.files.iter().map(|(path, _)| path.clone()).collect())
    }

    fn read_file(&self, path: &str) -> Result<Option<String>> {
        self.journal.record(format!("read {path}"));
        Ok(self
            .files
            .iter()
            .find(|(candidate, _)| candidate == path)
            .and_then(|(_, contents)| contents.clone()))
    }
}

/// [`LanguageModel`] that replays queued replies and records every request.
#[derive(Debug)]
pub struct ScriptedModel {
    journal: Journal,
    replies: RefCell<VecDeque<Result<ModelReply, String>>>,
    requests: RefCell<Vec<ChatRequest>>,
}

impl ScriptedModel {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            replies: RefCell::new(VecDeque::new()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn push_text(&self, text: &str) {
        self.replies
            .borrow_mut()
            .push_back(Ok(ModelReply::Text(text.to_string())));
    }

    /// Queue a tool-call reply of `(operation name, raw arguments)` pairs.
    pub fn push_calls(&self, calls: &[(&str, &str)]) {
        let requests = calls
            .iter()
            .map(|(name, args)| InvocationRequest::new(*name, *args))
            .collect();
        self.replies
            .borrow_mut()
            .push_back(Ok(ModelReply::Invocations(requests)));
    }

    pub fn push_error(&self, message: &str) {
        self.replies.borrow_mut().push_back(Err(message.to_string()));
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.borrow().clone()
    }
}

impl LanguageModel for ScriptedModel {
    fn complete(&self, request: &ChatRequest) -> Result<ModelReply> {
        self.journal.record("model");
        self.requests.borrow_mut().push(request.clone());
        match self.replies.borrow_mut().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(anyhow!("{message}")),
            None => Err(anyhow!("scripted model has no replies left")),
        }
    }
}

/// [`RepositoryHost`] that records drafts and answers with queued responses.
///
/// With nothing queued it answers `201` with a numbered `html_url`.
#[derive(Debug)]
pub struct RecordingHost {
    journal: Journal,
    responses: RefCell<VecDeque<HostResponse>>,
    pull_requests: RefCell<Vec<PullRequestDraft>>,
    issues: RefCell<Vec<IssueRequest>>,
}

impl RecordingHost {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            responses: RefCell::new(VecDeque::new()),
            pull_requests: RefCell::new(Vec::new()),
            issues: RefCell::new(Vec::new()),
        }
    }

    pub fn respond_with(&self, status: u16, body: serde_json::Value) {
        self.responses
            .borrow_mut()
            .push_back(HostResponse { status, body });
    }

    pub fn pull_requests(&self) -> Vec<PullRequestDraft> {
        self.pull_requests.borrow().clone()
    }

    pub fn issues(&self) -> Vec<IssueRequest> {
        self.issues.borrow().clone()
    }

    fn next_response(&self, repo: &RepoId, kind: &str) -> HostResponse {
        self.responses.borrow_mut().pop_front().unwrap_or_else(|| {
            let number = self.pull_requests.borrow().len() + self.issues.borrow().len();
            HostResponse {
                status: 201,
                body: json!({
                    "number": number,
                    "html_url": format!("https://github.com/{repo}/{kind}/{number}"),
                }),
            }
        })
    }
}

impl RepositoryHost for RecordingHost {
    fn create_pull_request(
        &self,
        repo: &RepoId,
        draft: &PullRequestDraft,
    ) -> Result<HostResponse> {
        self.journal.record(format!("host pull_request {repo}"));
        self.pull_requests.borrow_mut().push(draft.clone());
        Ok(self.next_response(repo, "pull"))
    }

    fn create_issue(&self, repo: &RepoId, issue: &IssueRequest) -> Result<HostResponse> {
        self.journal.record(format!("host issue {repo}"));
        self.issues.borrow_mut().push(issue.clone());
        Ok(self.next_response(repo, "issues"))
    }
}

/// Settings for `acme/widgets` with placeholder credentials.
pub fn settings() -> Settings {
    Settings {
        config: AgentConfig::default(),
        credentials: Credentials {
            github_token: "ghp_test".to_string(),
            openai_api_key: "sk-test".to_string(),
        },
        repo: RepoId {
            owner: "acme".to_string(),
            name: "widgets".to_string(),
        },
    }
}

/// All fakes wired together, ready to hand out a [`Toolbox`].
pub struct Harness {
    pub journal: Journal,
    pub vcs: FakeVcs,
    pub model: ScriptedModel,
    pub host: RecordingHost,
    pub settings: Settings,
    pub prompts: PromptEngine,
}

impl Harness {
    pub fn new() -> Self {
        let journal = Journal::default();
        let settings = settings();
        let prompts = PromptEngine::new(settings.config.prompt_input_limit_bytes);
        Self {
            vcs: FakeVcs::new(&journal),
            model: ScriptedModel::new(&journal),
            host: RecordingHost::new(&journal),
            journal,
            settings,
            prompts,
        }
    }

    pub fn toolbox(&self) -> Toolbox<'_> {
        Toolbox {
            settings: &self.settings,
            vcs: &self.vcs,
            model: &self.model,
            host: &self.host,
            prompts: &self.prompts,
        }
    }

    pub fn dispatcher(&self) -> Dispatcher<'_> {
        Dispatcher::new(self.toolbox())
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// A scratch git repository with a bare `origin` it can push to.
pub struct TestRepo {
    temp: tempfile::TempDir,
}

impl TestRepo {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        let origin = temp.path().join("widgets.git");
        let work = temp.path().join("work");
        run_git(temp.path(), &["init", "--bare", "-b", "main", "widgets.git"])?;
        run_git(temp.path(), &["init", "-b", "main", "work"])?;
        run_git(&work, &["config", "user.email", "devagent@example.com"])?;
        run_git(&work, &["config", "user.name", "devagent"])?;
        run_git(&work, &["config", "commit.gpgsign", "false"])?;
        let origin_url = origin.to_string_lossy().into_owned();
        run_git(&work, &["remote", "add", "origin", &origin_url])?;
        std::fs::write(work.join("README.md"), "# widgets\n").context("write README")?;
        run_git(&work, &["add", "-A"])?;
        run_git(&work, &["commit", "-m", "initial"])?;
        run_git(&work, &["push", "-u", "origin", "main"])?;
        Ok(Self { temp })
    }

    /// Working tree root.
    pub fn path(&self) -> std::path::PathBuf {
        self.temp.path().join("work")
    }

    pub fn git(&self) -> Git {
        Git::new(self.path(), AgentConfig::default().git_limits())
    }

    pub fn write(&self, relative: &str, contents: &str) -> Result<()> {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        std::fs::write(&path, contents).with_context(|| format!("write {}", path.display()))
    }

    /// Run git in the working tree and return trimmed stdout.
    pub fn capture(&self, args: &[&str]) -> Result<String> {
        capture_git(&self.path(), args)
    }

    /// Run git inside the bare origin and return trimmed stdout.
    pub fn capture_origin(&self, args: &[&str]) -> Result<String> {
        capture_git(&self.temp.path().join("widgets.git"), args)
    }
}

fn run_git(dir: &Path, args: &[&str]) -> Result<()> {
    capture_git(dir, args).map(|_| ())
}

fn capture_git(dir: &Path, args: &[&str]) -> Result<String> {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .with_context(|| format!("spawn git {}", args.join(" ")))?;
    if !out.status.success() {
        return Err(anyhow!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&out.stderr).trim()
        ));
    }
    Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
}
