use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use url::Url;

use crate::bot::event::{
    BotEvent, CommentAction, PullRequestAction, PullRequestComment, PullRequestEvent,
};
use crate::github::server::ServerStateRef;
use crate::github::{GithubRepoName, GithubUser, PullRequest, PullRequestState};

/// GitHub does not send webhook payloads larger than 25 MB.
const MAX_WEBHOOK_BODY_SIZE: usize = 25 * 1024 * 1024;

#[derive(serde::Deserialize, Debug)]
struct WebhookAccount {
    login: String,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookUser {
    login: String,
    html_url: Url,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookLabel {
    name: String,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookRepository {
    name: String,
    owner: WebhookAccount,
}

/// Fields shared by pull requests and the issues backing them.
#[derive(serde::Deserialize, Debug)]
struct WebhookPullRequest {
    number: u64,
    user: WebhookAccount,
    state: String,
    #[serde(default)]
    labels: Vec<WebhookLabel>,
    #[serde(default)]
    assignees: Vec<WebhookAccount>,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookPullRequestEvent {
    action: String,
    pull_request: WebhookPullRequest,
    repository: WebhookRepository,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookIssue {
    #[serde(flatten)]
    pull_request_fields: WebhookPullRequest,
    /// Only present when the issue is a pull request.
    pull_request: Option<serde_json::Value>,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookComment {
    user: WebhookUser,
    body: Option<String>,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookIssueCommentEvent {
    action: String,
    issue: WebhookIssue,
    comment: WebhookComment,
    repository: WebhookRepository,
}

/// axum extractor for GitHub webhook events.
#[derive(Debug)]
pub struct GitHubWebhook(pub BotEvent);

/// Extracts a webhook event from a HTTP request.
#[async_trait]
impl FromRequest<ServerStateRef> for GitHubWebhook {
    type Rejection = StatusCode;

    async fn from_request(
        request: Request,
        state: &ServerStateRef,
    ) -> Result<Self, Self::Rejection> {
        let (parts, body) = request.into_parts();

        // Eagerly load body
        let body: Bytes = axum::body::to_bytes(body, MAX_WEBHOOK_BODY_SIZE)
            .await
            .map_err(|error| {
                tracing::error!("Parsing webhook body failed: {error:?}");
                StatusCode::BAD_REQUEST
            })?;

        // Verify that the request is valid
        if !verify_gh_signature(&parts.headers, &body, state.get_webhook_secret()) {
            tracing::error!("Webhook request failed, could not authenticate webhook");
            return Err(StatusCode::BAD_REQUEST);
        }

        // Parse webhook content
        match parse_webhook_event(parts, &body) {
            Ok(Some(event)) => Ok(GitHubWebhook(event)),
            Ok(None) => Err(StatusCode::OK),
            Err(error) => {
                tracing::error!("Cannot parse webhook event: {error:?}");
                Err(StatusCode::BAD_REQUEST)
            }
        }
    }
}

fn parse_webhook_event(request: Parts, body: &[u8]) -> anyhow::Result<Option<BotEvent>> {
    let Some(event_type) = request.headers.get("x-github-event") else {
        return Err(anyhow::anyhow!("x-github-event header not found"));
    };

    match event_type.as_bytes() {
        b"pull_request" => {
            let payload: WebhookPullRequestEvent = serde_json::from_slice(body)?;
            Ok(Some(BotEvent::PullRequest(parse_pr_event(payload))))
        }
        b"issue_comment" => {
            let payload: WebhookIssueCommentEvent = serde_json::from_slice(body)?;
            Ok(parse_pr_comment(payload).map(BotEvent::Comment))
        }
        _ => {
            tracing::debug!("Ignoring unknown event type {:?}", event_type.to_str());
            Ok(None)
        }
    }
}

fn parse_pr_event(payload: WebhookPullRequestEvent) -> PullRequestEvent {
    let action = match payload.action.as_str() {
        "opened" => PullRequestAction::Opened,
        "synchronize" => PullRequestAction::SourceBranchChanged,
        _ => PullRequestAction::Other(payload.action),
    };
    PullRequestEvent {
        repository: parse_repository_name(&payload.repository),
        action,
        pull_request: parse_pr(payload.pull_request),
    }
}

fn parse_pr_comment(payload: WebhookIssueCommentEvent) -> Option<PullRequestComment> {
    // We only care about pull request comments
    if payload.issue.pull_request.is_none() {
        tracing::debug!(
            "Ignoring comment on issue {} because it does not belong to a pull request",
            payload.issue.pull_request_fields.number
        );
        return None;
    }

    let action = match payload.action.as_str() {
        "created" => CommentAction::Created,
        _ => CommentAction::Other(payload.action),
    };
    let author = GithubUser {
        username: payload.comment.user.login,
        html_url: payload.comment.user.html_url,
    };

    Some(PullRequestComment {
        repository: parse_repository_name(&payload.repository),
        author,
        action,
        pull_request: parse_pr(payload.issue.pull_request_fields),
        text: payload.comment.body.unwrap_or_default(),
    })
}

fn parse_pr(pr: WebhookPullRequest) -> PullRequest {
    let state = match pr.state.as_str() {
        "open" => PullRequestState::Open,
        _ => PullRequestState::Closed,
    };
    PullRequest {
        number: pr.number.into(),
        author: pr.user.login,
        state,
        labels: pr.labels.into_iter().map(|label| label.name).collect(),
        assignees: pr.assignees.into_iter().map(|user| user.login).collect(),
    }
}

fn parse_repository_name(repository: &WebhookRepository) -> GithubRepoName {
    GithubRepoName::new(&repository.owner.login, &repository.name)
}

type HmacSha256 = Hmac<Sha256>;

/// Verifies that the request is properly signed by GitHub with SHA-256 and the passed `secret`.
fn verify_gh_signature(
    headers: &HeaderMap<HeaderValue>,
    body: &[u8],
    secret: &WebhookSecret,
) -> bool {
    let Some(signature) = headers.get("x-hub-signature-256").map(|v| v.as_bytes()) else {
        return false;
    };
    let Some(signature) = signature
        .strip_prefix(b"sha256=")
        .and_then(|v| hex::decode(v).ok())
    else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose().as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&signature).is_ok()
}

/// Wrapper for a secret which is zeroed on drop and can be exposed only through the [`WebhookSecret::expose`] method.
pub struct WebhookSecret(SecretString);

impl WebhookSecret {
    pub fn new(secret: String) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret().as_str()
    }
}
