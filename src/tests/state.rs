use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::async_trait;
use derive_builder::Builder;

use crate::bot::event::{BotEvent, PullRequestComment, PullRequestEvent};
use crate::bot::{handle_bot_event, BotContext, Comment, FileContent, RepositoryClient};
use crate::config::{BotConfig, RepositoryConfig};
use crate::github::{GithubRepoName, GithubUser, PullRequest, PullRequestNumber};
use crate::permissions::PermissionResolver;
use crate::tests::event::default_user;
use crate::tests::github::create_user;

pub fn test_bot_user() -> GithubUser {
    create_user("<test-bot>")
}

pub fn default_repo_name() -> GithubRepoName {
    GithubRepoName::new("openeuler", "kernel")
}

pub fn default_config() -> String {
    r#"
[[repositories]]
repos = ["openeuler"]
"#
    .to_string()
}

pub struct TestBot {
    ctx: Arc<BotContext<TestRepositoryClient>>,
    permissions: Arc<TestPermissionResolver>,
}

impl TestBot {
    /// Returns the test client
    pub fn client(&self) -> &TestRepositoryClient {
        &self.ctx.client
    }

    pub fn context(&self) -> Arc<BotContext<TestRepositoryClient>> {
        Arc::clone(&self.ctx)
    }

    pub fn permissions(&self) -> &TestPermissionResolver {
        &self.permissions
    }

    /// Execute an event.
    pub async fn event(&self, event: BotEvent) -> anyhow::Result<()> {
        handle_bot_event(event, Arc::clone(&self.ctx)).await
    }

    pub async fn comment<T: Into<PullRequestComment>>(&self, comment: T) -> anyhow::Result<()> {
        self.event(BotEvent::Comment(comment.into())).await
    }

    pub async fn pr_event<T: Into<PullRequestEvent>>(&self, event: T) -> anyhow::Result<()> {
        self.event(BotEvent::PullRequest(event.into())).await
    }
}

#[derive(Builder)]
#[builder(pattern = "owned")]
pub struct Bot {
    #[builder(default = "default_config()")]
    config: String,
    /// Nobody is allowed to run commands.
    #[builder(default)]
    deny_all: bool,
    /// Permission checks end with an error.
    #[builder(default)]
    permission_error: bool,
}

impl BotBuilder {
    pub fn no_permissions(self) -> Self {
        self.deny_all(true)
    }

    pub fn failing_permissions(self) -> Self {
        self.permission_error(true)
    }

    pub fn create(self) -> TestBot {
        let Bot {
            config,
            deny_all,
            permission_error,
        } = self.build().unwrap();
        let mut allowed_users = HashSet::new();
        if !deny_all {
            allowed_users.insert(default_user().username);
        }

        let permissions = Arc::new(TestPermissionResolver {
            allowed_users,
            fail: permission_error,
            requests: Default::default(),
        });
        let config: BotConfig = config.parse().unwrap();
        let ctx = BotContext::new(
            TestRepositoryClient::default(),
            Box::new(Arc::clone(&permissions)),
            config,
        );
        TestBot {
            ctx: Arc::new(ctx),
            permissions,
        }
    }
}

pub struct TestPermissionResolver {
    allowed_users: HashSet<String>,
    fail: bool,
    // (username, require owner)
    requests: Mutex<Vec<(String, bool)>>,
}

impl TestPermissionResolver {
    pub fn check_requests(&self, requests: &[(&str, bool)]) {
        assert_eq!(
            *self.requests.lock().unwrap(),
            requests
                .iter()
                .map(|(user, owner)| (user.to_string(), *owner))
                .collect::<Vec<_>>()
        );
    }
}

#[async_trait]
impl PermissionResolver for Arc<TestPermissionResolver> {
    async fn has_permission(
        &self,
        _repo: &GithubRepoName,
        username: &str,
        require_owner: bool,
        _pr: &PullRequest,
        _config: &RepositoryConfig,
    ) -> anyhow::Result<bool> {
        self.requests
            .lock()
            .unwrap()
            .push((username.to_string(), require_owner));
        if self.fail {
            return Err(anyhow::anyhow!("Cannot load permissions of {username}"));
        }
        Ok(self.allowed_users.contains(username))
    }
}

#[derive(Default)]
pub struct TestRepositoryClient {
    comments: Mutex<HashMap<u64, Vec<String>>>,
    added_labels: Mutex<HashMap<u64, Vec<String>>>,
    // Each removal call is stored separately
    removed_labels: Mutex<HashMap<u64, Vec<Vec<String>>>>,
    // "<owner>/<name>@<ref>:<path>" -> base64 content
    path_contents: Mutex<HashMap<String, String>>,
    loaded_paths: Mutex<Vec<String>>,
    fail_comments: Mutex<bool>,
    fail_label_removal: Mutex<bool>,
}

fn path_key(repo: &GithubRepoName, path: &str, git_ref: &str) -> String {
    format!("{repo}@{git_ref}:{path}")
}

impl TestRepositoryClient {
    // Setters
    /// Stores a file in the master branch of the community repository.
    pub fn set_path_content(&self, path: &str, content: &str) {
        let community = GithubRepoName::new("openeuler", "community");
        self.path_contents
            .lock()
            .unwrap()
            .insert(path_key(&community, path, "master"), content.to_string());
    }

    pub fn fail_comments(&self) {
        *self.fail_comments.lock().unwrap() = true;
    }

    pub fn fail_label_removal(&self) {
        *self.fail_label_removal.lock().unwrap() = true;
    }

    // Checks
    pub fn check_comments(&self, pr_number: u64, comments: &[&str]) -> &Self {
        assert_eq!(
            self.comments
                .lock()
                .unwrap()
                .get(&pr_number)
                .cloned()
                .unwrap_or_default(),
            comments
                .iter()
                .map(|&s| String::from(s))
                .collect::<Vec<_>>()
        );
        self
    }

    pub fn check_added_labels(&self, pr: u64, added: &[&str]) -> &Self {
        assert_eq!(
            self.added_labels
                .lock()
                .unwrap()
                .get(&pr)
                .cloned()
                .unwrap_or_default(),
            added
        );
        self
    }

    pub fn check_removed_labels(&self, pr: u64, removed: &[&str]) -> &Self {
        assert_eq!(
            self.removed_labels
                .lock()
                .unwrap()
                .get(&pr)
                .cloned()
                .unwrap_or_default()
                .concat(),
            removed
        );
        self
    }

    pub fn check_remove_label_calls(&self, pr: u64, count: usize) -> &Self {
        assert_eq!(
            self.removed_labels
                .lock()
                .unwrap()
                .get(&pr)
                .map(|calls| calls.len())
                .unwrap_or_default(),
            count
        );
        self
    }

    pub fn check_loaded_paths(&self, paths: &[&str]) -> &Self {
        assert_eq!(*self.loaded_paths.lock().unwrap(), paths);
        self
    }

    /// Make sure that no comment was posted and no label was changed.
    pub fn check_no_mutations(&self) {
        assert!(self.comments.lock().unwrap().is_empty());
        assert!(self.added_labels.lock().unwrap().is_empty());
        assert!(self.removed_labels.lock().unwrap().is_empty());
    }
}

#[async_trait]
impl RepositoryClient for TestRepositoryClient {
    fn is_comment_internal(&self, comment: &PullRequestComment) -> bool {
        comment.author == test_bot_user()
    }

    async fn post_comment(
        &self,
        _repo: &GithubRepoName,
        pr: PullRequestNumber,
        comment: Comment,
    ) -> anyhow::Result<()> {
        if *self.fail_comments.lock().unwrap() {
            return Err(anyhow::anyhow!("Cannot post comment to PR {pr}"));
        }
        self.comments
            .lock()
            .unwrap()
            .entry(pr.0)
            .or_default()
            .push(comment.render().to_string());
        Ok(())
    }

    async fn add_labels(
        &self,
        _repo: &GithubRepoName,
        pr: PullRequestNumber,
        labels: &[String],
    ) -> anyhow::Result<()> {
        self.added_labels
            .lock()
            .unwrap()
            .entry(pr.0)
            .or_default()
            .extend(labels.to_vec());
        Ok(())
    }

    async fn remove_labels(
        &self,
        _repo: &GithubRepoName,
        pr: PullRequestNumber,
        labels: &[String],
    ) -> anyhow::Result<()> {
        if *self.fail_label_removal.lock().unwrap() {
            return Err(anyhow::anyhow!("Cannot remove label(s) from PR {pr}"));
        }
        self.removed_labels
            .lock()
            .unwrap()
            .entry(pr.0)
            .or_default()
            .push(labels.to_vec());
        Ok(())
    }

    async fn get_path_content(
        &self,
        repo: &GithubRepoName,
        path: &str,
        git_ref: &str,
    ) -> anyhow::Result<FileContent> {
        let key = path_key(repo, path, git_ref);
        self.loaded_paths.lock().unwrap().push(key.clone());
        match self.path_contents.lock().unwrap().get(&key) {
            Some(content) => Ok(FileContent {
                content: content.clone(),
            }),
            None => Err(anyhow::anyhow!("File {key} not found")),
        }
    }
}
