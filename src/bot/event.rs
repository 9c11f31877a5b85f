use crate::github::{GithubRepoName, GithubUser, PullRequest};

#[derive(Debug)]
pub enum BotEvent {
    /// Something has happened to a pull request (opened, pushed to, ...).
    PullRequest(PullRequestEvent),
    /// A comment was posted on a pull request.
    Comment(PullRequestComment),
}

impl BotEvent {
    pub fn repository(&self) -> &GithubRepoName {
        match self {
            BotEvent::PullRequest(event) => &event.repository,
            BotEvent::Comment(comment) => &comment.repository,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PullRequestAction {
    Opened,
    /// New commits were pushed to the source branch of the pull request.
    SourceBranchChanged,
    Other(String),
}

#[derive(Debug)]
pub struct PullRequestEvent {
    pub repository: GithubRepoName,
    pub action: PullRequestAction,
    pub pull_request: PullRequest,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommentAction {
    Created,
    Other(String),
}

#[derive(Debug)]
pub struct PullRequestComment {
    pub repository: GithubRepoName,
    pub author: GithubUser,
    pub action: CommentAction,
    pub pull_request: PullRequest,
    pub text: String,
}
