use anyhow::Context;
use axum::async_trait;
use octocrab::Octocrab;

use crate::config::RepositoryConfig;
use crate::github::api::api_path;
use crate::github::{GithubRepoName, PullRequest};

/// Decides whether a user is allowed to run commands on a pull request.
#[async_trait]
pub trait PermissionResolver: Send + Sync {
    /// Returns `Ok(false)` when the user is not allowed, and an error only when the
    /// permission could not be determined.
    async fn has_permission(
        &self,
        repo: &GithubRepoName,
        username: &str,
        require_owner: bool,
        pr: &PullRequest,
        config: &RepositoryConfig,
    ) -> anyhow::Result<bool>;
}

/// Resolves permissions from the collaborator permission level of the user in the repository.
pub struct CollaboratorPermissionResolver {
    client: Octocrab,
}

impl CollaboratorPermissionResolver {
    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }
}

#[derive(serde::Deserialize)]
struct CollaboratorPermissionResponse {
    permission: String,
}

#[async_trait]
impl PermissionResolver for CollaboratorPermissionResolver {
    async fn has_permission(
        &self,
        repo: &GithubRepoName,
        username: &str,
        require_owner: bool,
        _pr: &PullRequest,
        _config: &RepositoryConfig,
    ) -> anyhow::Result<bool> {
        let username = username.to_lowercase();
        // https://docs.github.com/en/rest/collaborators/collaborators#get-repository-permissions-for-a-user
        let route = api_path(&[
            "repos",
            repo.owner(),
            repo.name(),
            "collaborators",
            &username,
            "permission",
        ])?;
        let response: CollaboratorPermissionResponse = self
            .client
            .get(route, None::<&()>)
            .await
            .with_context(|| format!("Cannot load permissions of {username} in {repo}"))?;

        let allowed = is_permission_sufficient(&response.permission, require_owner);
        tracing::debug!(
            "User {username} has permission `{}` in {repo} (require owner: {require_owner}): allowed={allowed}",
            response.permission
        );
        Ok(allowed)
    }
}

/// Repository admins are always allowed. Users with write access are allowed unless an owner
/// is required.
fn is_permission_sufficient(permission: &str, require_owner: bool) -> bool {
    match permission {
        "admin" => true,
        "maintain" | "write" => !require_owner,
        _ => false,
    }
}
