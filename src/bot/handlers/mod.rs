use std::sync::Arc;

use itertools::Itertools;
use tracing::Instrument;

use crate::bot::command::BotCommand;
use crate::bot::event::{BotEvent, CommentAction, PullRequestComment, PullRequestEvent};
use crate::bot::handlers::labels::{
    command_cancel_cla, command_cancel_merge_strategy, command_set_merge_strategy,
};
use crate::bot::handlers::pr_events::{check_reviewer, clear_labels_on_push, retest_on_push};
use crate::bot::{BotContext, RepositoryClient};
use crate::config::RepositoryConfig;

mod labels;
mod pr_events;

/// This function executes a single bot event.
pub async fn handle_bot_event<Client: RepositoryClient>(
    event: BotEvent,
    ctx: Arc<BotContext<Client>>,
) -> anyhow::Result<()> {
    let Some(config) = ctx.config.config_for(event.repository()) else {
        tracing::debug!(
            "Ignoring event for repository {} without configuration",
            event.repository()
        );
        return Ok(());
    };

    match event {
        BotEvent::Comment(comment) => {
            // We want to ignore comments made by this bot
            if ctx.client.is_comment_internal(&comment) {
                tracing::trace!("Ignoring comment {comment:?} because it was authored by this bot");
                return Ok(());
            }

            let span = tracing::info_span!(
                "Comment",
                pr = format!("{}#{}", comment.repository, comment.pull_request.number),
                author = comment.author.username
            );
            handle_comment(&ctx, config, &comment).instrument(span).await?;
        }
        BotEvent::PullRequest(event) => {
            let span = tracing::info_span!(
                "Pull request",
                pr = format!("{}#{}", event.repository, event.pull_request.number),
                action = ?event.action
            );
            handle_pull_request(&ctx, config, &event).instrument(span).await?;
        }
    }
    Ok(())
}

async fn handle_comment<Client: RepositoryClient>(
    ctx: &BotContext<Client>,
    config: &RepositoryConfig,
    comment: &PullRequestComment,
) -> anyhow::Result<()> {
    if !comment.pull_request.is_open() || comment.action != CommentAction::Created {
        tracing::trace!(
            "Ignoring comment (action={:?}, PR state={:?})",
            comment.action,
            comment.pull_request.state
        );
        return Ok(());
    }

    let Some(command) = BotCommand::parse(&comment.text) else {
        tracing::trace!("Comment does not contain a command: {}", comment.text);
        return Ok(());
    };
    tracing::debug!("Command: {command:?}");

    let allowed = ctx
        .permission_resolver
        .has_permission(
            &comment.repository,
            &comment.author.username,
            false,
            &comment.pull_request,
            config,
        )
        .await?;
    if !allowed {
        tracing::info!(
            "User {} is not allowed to run {command:?}",
            comment.author.username
        );
        return Ok(());
    }

    match command {
        BotCommand::CancelCla => command_cancel_cla(ctx, comment).await,
        BotCommand::SetMergeStrategy(strategy) => {
            command_set_merge_strategy(ctx, comment, strategy).await
        }
        BotCommand::CancelMergeStrategy(strategy) => {
            command_cancel_merge_strategy(ctx, comment, strategy).await
        }
    }
}

/// Runs every pull request rule, even if some of them fail.
async fn handle_pull_request<Client: RepositoryClient>(
    ctx: &BotContext<Client>,
    config: &RepositoryConfig,
    event: &PullRequestEvent,
) -> anyhow::Result<()> {
    let results = [
        clear_labels_on_push(ctx, event).await,
        retest_on_push(ctx, event).await,
        check_reviewer(ctx, config, event).await,
    ];

    let mut errors: Vec<anyhow::Error> = results.into_iter().filter_map(Result::err).collect();
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        count => Err(anyhow::anyhow!(
            "{count} pull request rules have failed:\n{}",
            errors.iter().map(|error| format!("{error:?}")).join("\n")
        )),
    }
}
