use std::path::Path;

use serde::Deserialize;

use crate::github::GithubRepoName;

/// Label removed by `/cla cancel`.
pub const CLA_YES_LABEL: &str = "openeuler-cla/yes";
/// Merge strategy label set by `/rebase`.
pub const REBASE_MERGE_LABEL: &str = "rebase/merge";
/// Merge strategy label set by `/flattened`.
pub const FLATTENED_MERGE_LABEL: &str = "flattened/merge";
pub const APPROVED_LABEL: &str = "approved";
/// Labels whose last `/`-separated segment starts with this prefix are LGTM labels.
pub const LGTM_LABEL_PREFIX: &str = "lgtm";
pub const SIG_LABEL_PREFIX: &str = "sig/";

/// Repository that stores the sig configuration of all managed repositories.
pub const COMMUNITY_REPO_OWNER: &str = "openeuler";
pub const COMMUNITY_REPO_NAME: &str = "community";
pub const COMMUNITY_REPO_BRANCH: &str = "master";

/// Returns true if the label marks an LGTM given by some reviewer, e.g. `lgtm`,
/// `lgtm-alice` or `ci/lgtm-sig-a`.
pub fn is_lgtm_label(label: &str) -> bool {
    label
        .rsplit('/')
        .next()
        .is_some_and(|segment| segment.starts_with(LGTM_LABEL_PREFIX))
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration of the bot, loaded from a TOML file at start-up.
#[derive(Deserialize, Debug, Default)]
pub struct BotConfig {
    #[serde(default)]
    pub repositories: Vec<RepositoryConfig>,
}

/// Configuration shared by a set of repositories.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct RepositoryConfig {
    /// Either `org` (all repositories of an organization) or `org/repo`.
    pub repos: Vec<String>,
    #[serde(default)]
    pub excluded_repos: Vec<String>,
    /// Do not remind authors of new pull requests to set a reviewer.
    #[serde(default)]
    pub unable_checking_reviewer_for_pr: bool,
}

impl BotConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// Finds the configuration that applies to `repo`.
    /// An item that names the repository explicitly takes precedence over an item that
    /// only names its organization.
    pub fn config_for(&self, repo: &GithubRepoName) -> Option<&RepositoryConfig> {
        let full_name = repo.to_string();
        let applicable = || {
            self.repositories.iter().filter(|config| {
                !config
                    .excluded_repos
                    .iter()
                    .any(|excluded| excluded.eq_ignore_ascii_case(&full_name))
            })
        };

        applicable()
            .find(|config| {
                config
                    .repos
                    .iter()
                    .any(|r| r.eq_ignore_ascii_case(&full_name))
            })
            .or_else(|| {
                applicable().find(|config| {
                    config
                        .repos
                        .iter()
                        .any(|r| r.eq_ignore_ascii_case(repo.owner()))
                })
            })
    }
}

impl std::str::FromStr for BotConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}
