use axum::async_trait;

use crate::bot::event::PullRequestComment;
use crate::config::BotConfig;
use crate::github::{GithubRepoName, PullRequestNumber};
use crate::permissions::PermissionResolver;

mod command;
mod comment;
pub mod event;
mod handlers;
mod merge_method;

pub use command::{BotCommand, MergeStrategy};
pub use comment::Comment;
pub use handlers::handle_bot_event;
pub use merge_method::{resolve_merge_method, DEFAULT_MERGE_METHOD};

/// Content of a file stored in a repository.
#[derive(Clone, Debug)]
pub struct FileContent {
    /// Base64 encoded file content.
    pub content: String,
}

/// Provides functionality for working with remote repositories.
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    /// Was the comment created by the bot?
    fn is_comment_internal(&self, comment: &PullRequestComment) -> bool;

    /// Post a comment to the pull request with the given number.
    async fn post_comment(
        &self,
        repo: &GithubRepoName,
        pr: PullRequestNumber,
        comment: Comment,
    ) -> anyhow::Result<()>;

    /// Add a set of labels to a PR.
    async fn add_labels(
        &self,
        repo: &GithubRepoName,
        pr: PullRequestNumber,
        labels: &[String],
    ) -> anyhow::Result<()>;

    /// Remove a set of labels from a PR.
    /// Removing a label that is not present on the PR is not an error.
    async fn remove_labels(
        &self,
        repo: &GithubRepoName,
        pr: PullRequestNumber,
        labels: &[String],
    ) -> anyhow::Result<()>;

    /// Load the file at `path` of the given repository at `git_ref`.
    async fn get_path_content(
        &self,
        repo: &GithubRepoName,
        path: &str,
        git_ref: &str,
    ) -> anyhow::Result<FileContent>;
}

/// Everything needed to handle bot events.
pub struct BotContext<Client: RepositoryClient> {
    pub client: Client,
    pub permission_resolver: Box<dyn PermissionResolver>,
    pub config: BotConfig,
}

impl<Client: RepositoryClient> BotContext<Client> {
    pub fn new(
        client: Client,
        permission_resolver: Box<dyn PermissionResolver>,
        config: BotConfig,
    ) -> Self {
        Self {
            client,
            permission_resolver,
            config,
        }
    }
}
