use crate::bot::comment::{labels_cleared_comment, retest_comment, reviewer_missing_comment};
use crate::bot::event::{PullRequestAction, PullRequestEvent};
use crate::bot::{BotContext, RepositoryClient};
use crate::config::{is_lgtm_label, RepositoryConfig, APPROVED_LABEL};

/// Asks CI to test the new commits of the PR.
pub(super) async fn retest_on_push<Client: RepositoryClient>(
    ctx: &BotContext<Client>,
    event: &PullRequestEvent,
) -> anyhow::Result<()> {
    if event.action != PullRequestAction::SourceBranchChanged {
        return Ok(());
    }

    ctx.client
        .post_comment(&event.repository, event.pull_request.number, retest_comment())
        .await
}

/// Reminds the author of a newly opened PR to set a reviewer.
pub(super) async fn check_reviewer<Client: RepositoryClient>(
    ctx: &BotContext<Client>,
    config: &RepositoryConfig,
    event: &PullRequestEvent,
) -> anyhow::Result<()> {
    if config.unable_checking_reviewer_for_pr || event.action != PullRequestAction::Opened {
        return Ok(());
    }

    let pr = &event.pull_request;
    if !pr.assignees.is_empty() {
        tracing::debug!("PR has reviewers {:?}", pr.assignees);
        return Ok(());
    }

    ctx.client
        .post_comment(
            &event.repository,
            pr.number,
            reviewer_missing_comment(&pr.author),
        )
        .await
}

/// Approvals given to previous commits of the PR do not apply to the new ones.
pub(super) async fn clear_labels_on_push<Client: RepositoryClient>(
    ctx: &BotContext<Client>,
    event: &PullRequestEvent,
) -> anyhow::Result<()> {
    if event.action != PullRequestAction::SourceBranchChanged {
        return Ok(());
    }

    let pr = &event.pull_request;
    let mut labels: Vec<String> = pr
        .labels
        .iter()
        .filter(|label| is_lgtm_label(label))
        .cloned()
        .collect();
    if pr.has_label(APPROVED_LABEL) {
        labels.push(APPROVED_LABEL.to_string());
    }
    if labels.is_empty() {
        return Ok(());
    }

    tracing::info!("Removing label(s) {labels:?}");
    ctx.client
        .remove_labels(&event.repository, pr.number, &labels)
        .await?;
    ctx.client
        .post_comment(&event.repository, pr.number, labels_cleared_comment(&labels))
        .await
}
