use crate::config::{FLATTENED_MERGE_LABEL, REBASE_MERGE_LABEL};

/// Command that can be given to the bot through a pull request comment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BotCommand {
    /// `/cla cancel`: remove the CLA label.
    CancelCla,
    /// `/rebase` or `/flattened`: request a merge strategy.
    SetMergeStrategy(MergeStrategy),
    /// `/rebase cancel` or `/flattened cancel`.
    CancelMergeStrategy(MergeStrategy),
}

impl BotCommand {
    /// Recognizes a command. The whole comment has to match the command text exactly.
    pub fn parse(text: &str) -> Option<Self> {
        let command = match text {
            "/cla cancel" => BotCommand::CancelCla,
            "/rebase" => BotCommand::SetMergeStrategy(MergeStrategy::Rebase),
            "/flattened" => BotCommand::SetMergeStrategy(MergeStrategy::Flattened),
            "/rebase cancel" => BotCommand::CancelMergeStrategy(MergeStrategy::Rebase),
            "/flattened cancel" => BotCommand::CancelMergeStrategy(MergeStrategy::Flattened),
            _ => return None,
        };
        Some(command)
    }
}

/// Merge strategies that can be requested through a comment.
/// At most one of them may be active on a pull request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeStrategy {
    Rebase,
    Flattened,
}

impl MergeStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            MergeStrategy::Rebase => REBASE_MERGE_LABEL,
            MergeStrategy::Flattened => FLATTENED_MERGE_LABEL,
        }
    }

    pub fn command(&self) -> &'static str {
        match self {
            MergeStrategy::Rebase => "/rebase",
            MergeStrategy::Flattened => "/flattened",
        }
    }

    pub fn cancel_command(&self) -> &'static str {
        match self {
            MergeStrategy::Rebase => "/rebase cancel",
            MergeStrategy::Flattened => "/flattened cancel",
        }
    }

    pub fn conflicting(&self) -> MergeStrategy {
        match self {
            MergeStrategy::Rebase => MergeStrategy::Flattened,
            MergeStrategy::Flattened => MergeStrategy::Rebase,
        }
    }
}
