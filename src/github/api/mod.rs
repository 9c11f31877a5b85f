use anyhow::Context;
use octocrab::Octocrab;
use url::Url;

use crate::github::GithubUser;

pub mod client;

pub fn base_github_url() -> &'static str {
    "https://api.github.com"
}

/// Creates an API client authenticated with a personal access token.
/// `api_url` allows talking to GitHub Enterprise or to a mock server in tests.
pub fn create_github_client(token: String, api_url: &str) -> anyhow::Result<Octocrab> {
    Octocrab::builder()
        .personal_token(token)
        .base_uri(api_url)
        .context("Invalid GitHub API URL")?
        .build()
        .context("Could not create octocrab builder")
}

/// Loads the user that the bot is authenticated as, to recognize its own comments.
pub async fn load_bot_user(client: &Octocrab) -> anyhow::Result<GithubUser> {
    let user = client
        .current()
        .user()
        .await
        .context("Could not load the bot user")?;
    Ok(GithubUser {
        username: user.login,
        html_url: user.html_url,
    })
}

/// Builds an API route from path segments, percent-encoding each segment.
/// Label names such as `rebase/merge` contain a slash that must not split the path.
pub(crate) fn api_path(segments: &[&str]) -> anyhow::Result<String> {
    let mut url = Url::parse(base_github_url()).context("Cannot parse base GitHub URL")?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("Base GitHub URL cannot be a base"))?
        .clear()
        .extend(segments);
    Ok(url.path().to_string())
}
