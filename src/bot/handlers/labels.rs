use crate::bot::comment::merge_strategy_conflict_comment;
use crate::bot::event::PullRequestComment;
use crate::bot::{BotContext, MergeStrategy, RepositoryClient};
use crate::config::CLA_YES_LABEL;

/// Removes the CLA label, so that the CLA check is performed again.
pub(super) async fn command_cancel_cla<Client: RepositoryClient>(
    ctx: &BotContext<Client>,
    comment: &PullRequestComment,
) -> anyhow::Result<()> {
    tracing::info!("Removing label {CLA_YES_LABEL}");
    ctx.client
        .remove_labels(
            &comment.repository,
            comment.pull_request.number,
            &[CLA_YES_LABEL.to_string()],
        )
        .await
}

/// Marks the PR with the label of the requested merge strategy, unless the other strategy
/// has already been requested.
pub(super) async fn command_set_merge_strategy<Client: RepositoryClient>(
    ctx: &BotContext<Client>,
    comment: &PullRequestComment,
    strategy: MergeStrategy,
) -> anyhow::Result<()> {
    let pr = &comment.pull_request;
    let conflicting = strategy.conflicting();
    if pr.has_label(conflicting.label()) {
        tracing::info!(
            "Cannot set {}, PR already has {}",
            strategy.label(),
            conflicting.label()
        );
        return ctx
            .client
            .post_comment(
                &comment.repository,
                pr.number,
                merge_strategy_conflict_comment(conflicting, strategy),
            )
            .await;
    }

    tracing::info!("Adding label {}", strategy.label());
    ctx.client
        .add_labels(
            &comment.repository,
            pr.number,
            &[strategy.label().to_string()],
        )
        .await
}

pub(super) async fn command_cancel_merge_strategy<Client: RepositoryClient>(
    ctx: &BotContext<Client>,
    comment: &PullRequestComment,
    strategy: MergeStrategy,
) -> anyhow::Result<()> {
    tracing::info!("Removing label {}", strategy.label());
    ctx.client
        .remove_labels(
            &comment.repository,
            comment.pull_request.number,
            &[strategy.label().to_string()],
        )
        .await
}
