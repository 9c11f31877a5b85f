//! Resolves how a pull request should be merged.
//!
//! The merge method comes either from a `<strategy>/merge` label on the pull request, or from
//! the configuration of the repository in the community repository, which is located through
//! the `sig/<name>` label of the pull request.
use base64::Engine;
use serde::Deserialize;

use crate::bot::{FileContent, RepositoryClient};
use crate::config::{
    COMMUNITY_REPO_BRANCH, COMMUNITY_REPO_NAME, COMMUNITY_REPO_OWNER, SIG_LABEL_PREFIX,
};
use crate::github::GithubRepoName;

pub const DEFAULT_MERGE_METHOD: &str = "merge";

const MERGE_LABEL_SUFFIX: &str = "/merge";

/// Configuration of a repository stored in the community repository.
#[derive(Deserialize, Debug, Default)]
struct RepositoryMergeConfig {
    #[serde(rename = "MergeMethod", default)]
    merge_method: Option<String>,
}

#[derive(thiserror::Error, Debug)]
enum MergeConfigError {
    #[error("Cannot decode file content: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Cannot parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Returns the merge method of a pull request with the given `labels` in `repo`.
///
/// The configuration path is built from the owner and name of `repo` in the case in which
/// GitHub delivered them.
///
/// This never fails: every problem (missing labels, missing or broken configuration file)
/// results in [`DEFAULT_MERGE_METHOD`].
///
/// Labels are examined in the order in which they are stored on the pull request, so if more
/// `*/merge` labels are present, the first one wins.
pub async fn resolve_merge_method<Client: RepositoryClient + ?Sized>(
    client: &Client,
    labels: &[String],
    repo: &GithubRepoName,
) -> String {
    if let Some(label) = labels.iter().find(|l| l.ends_with(MERGE_LABEL_SUFFIX)) {
        return merge_method_from_label(label);
    }

    let Some(sig) = labels
        .iter()
        .find(|l| l.starts_with(SIG_LABEL_PREFIX))
        .and_then(|l| l.split('/').nth(1))
        .filter(|sig| !sig.is_empty())
    else {
        return DEFAULT_MERGE_METHOD.to_string();
    };
    let (org, repo) = (repo.owner(), repo.name());
    let Some(first_char) = repo.chars().next() else {
        return DEFAULT_MERGE_METHOD.to_string();
    };

    let path = format!("sig/{sig}/{org}/{first_char}/{repo}.yaml");
    let community = GithubRepoName::new(COMMUNITY_REPO_OWNER, COMMUNITY_REPO_NAME);
    let content = match client
        .get_path_content(&community, &path, COMMUNITY_REPO_BRANCH)
        .await
    {
        Ok(content) => content,
        Err(error) => {
            tracing::info!("Cannot load configuration of {org}/{repo} from {path}: {error:?}");
            return DEFAULT_MERGE_METHOD.to_string();
        }
    };

    match decode_merge_config(&content) {
        Ok(Some(method)) => method,
        Ok(None) => DEFAULT_MERGE_METHOD.to_string(),
        Err(error) => {
            tracing::error!("Cannot decode configuration of {org}/{repo} at {path}: {error}");
            DEFAULT_MERGE_METHOD.to_string()
        }
    }
}

/// `flattened/merge` means squash, every other `<strategy>/merge` label names the method
/// directly.
fn merge_method_from_label(label: &str) -> String {
    match label.split('/').next() {
        Some("flattened") => "squash".to_string(),
        Some(strategy) if !strategy.is_empty() => strategy.to_string(),
        _ => DEFAULT_MERGE_METHOD.to_string(),
    }
}

fn decode_merge_config(content: &FileContent) -> Result<Option<String>, MergeConfigError> {
    let bytes = base64::prelude::BASE64_STANDARD.decode(&content.content)?;
    let config: RepositoryMergeConfig = serde_yaml::from_slice(&bytes)?;
    Ok(config.merge_method.filter(|method| !method.is_empty()))
}

#[cfg(test)]
mod tests {
    use base64::Engine;

    use super::*;
    use crate::tests::state::TestRepositoryClient;

    const CONFIG_PATH: &str = "sig/Kernel/openeuler/k/kernel.yaml";
    const LOADED_PATH: &str = "openeuler/community@master:sig/Kernel/openeuler/k/kernel.yaml";

    fn labels(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|l| l.to_string()).collect()
    }

    fn encode(text: &str) -> String {
        base64::prelude::BASE64_STANDARD.encode(text)
    }

    async fn resolve(client: &TestRepositoryClient, pr_labels: &[&str]) -> String {
        let repo = GithubRepoName::new("openeuler", "kernel");
        resolve_merge_method(client, &labels(pr_labels), &repo).await
    }

    #[tokio::test]
    async fn flattened_label_is_squash() {
        let client = TestRepositoryClient::default();
        assert_eq!(resolve(&client, &["flattened/merge"]).await, "squash");
    }

    #[tokio::test]
    async fn rebase_label_is_rebase() {
        let client = TestRepositoryClient::default();
        assert_eq!(resolve(&client, &["rebase/merge"]).await, "rebase");
    }

    #[tokio::test]
    async fn merge_label_wins_over_sig() {
        let client = TestRepositoryClient::default();
        client.set_path_content(CONFIG_PATH, &encode("MergeMethod: squash"));
        assert_eq!(resolve(&client, &["sig/Kernel", "rebase/merge"]).await, "rebase");
        client.check_loaded_paths(&[]);
    }

    #[tokio::test]
    async fn first_merge_label_wins() {
        let client = TestRepositoryClient::default();
        assert_eq!(resolve(&client, &["rebase/merge", "flattened/merge"]).await, "rebase");
    }

    #[tokio::test]
    async fn no_labels() {
        let client = TestRepositoryClient::default();
        assert_eq!(resolve(&client, &[]).await, DEFAULT_MERGE_METHOD);
        client.check_loaded_paths(&[]);
    }

    #[tokio::test]
    async fn unrelated_labels() {
        let client = TestRepositoryClient::default();
        assert_eq!(resolve(&client, &["lgtm", "approved"]).await, DEFAULT_MERGE_METHOD);
    }

    #[tokio::test]
    async fn sig_config() {
        let client = TestRepositoryClient::default();
        client.set_path_content(CONFIG_PATH, &encode("name: kernel\nMergeMethod: squash\n"));
        assert_eq!(resolve(&client, &["sig/Kernel"]).await, "squash");
        client.check_loaded_paths(&[LOADED_PATH]);
    }

    #[tokio::test]
    async fn sig_config_missing() {
        let client = TestRepositoryClient::default();
        assert_eq!(resolve(&client, &["sig/Kernel"]).await, DEFAULT_MERGE_METHOD);
        client.check_loaded_paths(&[LOADED_PATH]);
    }

    #[tokio::test]
    async fn sig_config_invalid_base64() {
        let client = TestRepositoryClient::default();
        client.set_path_content(CONFIG_PATH, "not base64!");
        assert_eq!(resolve(&client, &["sig/Kernel"]).await, DEFAULT_MERGE_METHOD);
    }

    #[tokio::test]
    async fn sig_config_invalid_yaml() {
        let client = TestRepositoryClient::default();
        client.set_path_content(CONFIG_PATH, &encode("MergeMethod: [squash"));
        assert_eq!(resolve(&client, &["sig/Kernel"]).await, DEFAULT_MERGE_METHOD);
    }

    #[tokio::test]
    async fn sig_config_without_merge_method() {
        let client = TestRepositoryClient::default();
        client.set_path_content(CONFIG_PATH, &encode("name: kernel\n"));
        assert_eq!(resolve(&client, &["sig/Kernel"]).await, DEFAULT_MERGE_METHOD);
    }

    #[tokio::test]
    async fn sig_config_with_empty_merge_method() {
        let client = TestRepositoryClient::default();
        client.set_path_content(CONFIG_PATH, &encode("MergeMethod: ''\n"));
        assert_eq!(resolve(&client, &["sig/Kernel"]).await, DEFAULT_MERGE_METHOD);
    }

    #[tokio::test]
    async fn empty_sig_name() {
        let client = TestRepositoryClient::default();
        assert_eq!(resolve(&client, &["sig/"]).await, DEFAULT_MERGE_METHOD);
        client.check_loaded_paths(&[]);
    }

    #[test]
    fn label_strategies() {
        assert_eq!(merge_method_from_label("flattened/merge"), "squash");
        assert_eq!(merge_method_from_label("rebase/merge"), "rebase");
        assert_eq!(merge_method_from_label("squash/merge"), "squash");
        assert_eq!(merge_method_from_label("/merge"), DEFAULT_MERGE_METHOD);
    }

    #[tokio::test]
    async fn config_path_keeps_repository_case() {
        let client = TestRepositoryClient::default();
        client.set_path_content(
            "sig/A-Tune/openeuler/A/A-Tune.yaml",
            &encode("MergeMethod: squash\n"),
        );
        let repo = GithubRepoName::new("openeuler", "A-Tune");
        assert_eq!(
            resolve_merge_method(&client, &labels(&["sig/A-Tune"]), &repo).await,
            "squash"
        );
        client.check_loaded_paths(&[
            "openeuler/community@master:sig/A-Tune/openeuler/A/A-Tune.yaml",
        ]);
    }

    #[tokio::test]
    async fn empty_repository_name() {
        let client = TestRepositoryClient::default();
        let repo = GithubRepoName::new("openeuler", "");
        assert_eq!(
            resolve_merge_method(&client, &labels(&["sig/Kernel"]), &repo).await,
            DEFAULT_MERGE_METHOD
        );
        client.check_loaded_paths(&[]);
    }
}
