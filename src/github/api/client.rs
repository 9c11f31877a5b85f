use anyhow::Context;
use axum::async_trait;
use octocrab::{Error, Octocrab};

use crate::bot::event::PullRequestComment;
use crate::bot::{Comment, FileContent, RepositoryClient};
use crate::github::api::api_path;
use crate::github::{GithubRepoName, GithubUser, PullRequestNumber};

/// Provides access to repositories using the GitHub API.
pub struct GithubClient {
    client: Octocrab,
    /// The user that the bot acts as.
    bot_user: GithubUser,
}

impl GithubClient {
    pub fn new(client: Octocrab, bot_user: GithubUser) -> Self {
        Self { client, bot_user }
    }
}

fn format_pr(repo: &GithubRepoName, pr: PullRequestNumber) -> String {
    format!("{}/{}/{}", repo.owner(), repo.name(), pr)
}

fn issue_route(
    repo: &GithubRepoName,
    pr: PullRequestNumber,
    rest: &[&str],
) -> anyhow::Result<String> {
    let number = pr.to_string();
    let mut segments = vec!["repos", repo.owner(), repo.name(), "issues", number.as_str()];
    segments.extend_from_slice(rest);
    api_path(&segments)
}

#[derive(serde::Deserialize)]
struct ContentResponse {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl RepositoryClient for GithubClient {
    fn is_comment_internal(&self, comment: &PullRequestComment) -> bool {
        comment.author.html_url == self.bot_user.html_url
    }

    /// The comment will be posted as the user of the bot.
    async fn post_comment(
        &self,
        repo: &GithubRepoName,
        pr: PullRequestNumber,
        comment: Comment,
    ) -> anyhow::Result<()> {
        let _: serde_json::Value = self
            .client
            .post(
                issue_route(repo, pr, &["comments"])?,
                Some(&serde_json::json!({ "body": comment.render() })),
            )
            .await
            .with_context(|| format!("Cannot post comment to {}", format_pr(repo, pr)))?;
        Ok(())
    }

    async fn add_labels(
        &self,
        repo: &GithubRepoName,
        pr: PullRequestNumber,
        labels: &[String],
    ) -> anyhow::Result<()> {
        if labels.is_empty() {
            return Ok(());
        }
        let _: serde_json::Value = self
            .client
            .post(
                issue_route(repo, pr, &["labels"])?,
                Some(&serde_json::json!({ "labels": labels })),
            )
            .await
            .with_context(|| format!("Cannot add label(s) to {}", format_pr(repo, pr)))?;
        Ok(())
    }

    async fn remove_labels(
        &self,
        repo: &GithubRepoName,
        pr: PullRequestNumber,
        labels: &[String],
    ) -> anyhow::Result<()> {
        // The GitHub API only allows removing labels one by one, so we remove all of them in
        // parallel to speed it up a little.
        let routes = labels
            .iter()
            .map(|label| issue_route(repo, pr, &["labels", label.as_str()]))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let labels_to_remove_futures = routes
            .iter()
            .map(|route| self.client.delete::<serde_json::Value, _, ()>(route, None));
        futures::future::join_all(labels_to_remove_futures)
            .await
            .into_iter()
            .filter(|result| match result {
                Ok(_) => false,
                Err(error) => match error {
                    // This error is returned if we try to remove a label that does not exist on the issue.
                    // This should be a no-op, rather than an error, therefore we swallow this error.
                    Error::GitHub { source, .. }
                        if source.message.contains("Label does not exist") =>
                    {
                        tracing::trace!(
                            "Trying to remove label which does not exist on PR {}",
                            format_pr(repo, pr)
                        );
                        false
                    }
                    _ => true,
                },
            })
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Cannot remove label(s) from {}", format_pr(repo, pr)))?;

        Ok(())
    }

    async fn get_path_content(
        &self,
        repo: &GithubRepoName,
        path: &str,
        git_ref: &str,
    ) -> anyhow::Result<FileContent> {
        let mut segments = vec!["repos", repo.owner(), repo.name(), "contents"];
        segments.extend(path.split('/'));
        let response: ContentResponse = self
            .client
            .get(api_path(&segments)?, Some(&[("ref", git_ref)]))
            .await
            .with_context(|| format!("Cannot load {path} from {repo}@{git_ref}"))?;

        // GitHub wraps the base64 content into multiple lines.
        let content = response
            .content
            .unwrap_or_default()
            .split_ascii_whitespace()
            .collect();
        Ok(FileContent { content })
    }
}
