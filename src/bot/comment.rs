use itertools::Itertools;

use crate::bot::command::MergeStrategy;

/// A comment that can be posted to a pull request.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    text: String,
}

impl Comment {
    pub fn new(text: String) -> Self {
        Self { text }
    }

    pub fn render(&self) -> &str {
        &self.text
    }
}

/// Asks CI to run the tests of the pull request again.
pub fn retest_comment() -> Comment {
    Comment::new("/retest".to_string())
}

pub fn reviewer_missing_comment(author: &str) -> Comment {
    Comment::new(format!(
        "**@{author}** Thank you for submitting a PullRequest. It is detected that you have not set a reviewer, please set a one."
    ))
}

pub fn labels_cleared_comment(labels: &[String]) -> Comment {
    Comment::new(format!(
        "New code changes of the pull request are detected, and the following labels have been removed: **{}**.",
        labels.iter().join(", ")
    ))
}

/// `requested` cannot be set while `existing` is present on the pull request.
pub fn merge_strategy_conflict_comment(
    existing: MergeStrategy,
    requested: MergeStrategy,
) -> Comment {
    Comment::new(format!(
        "Please use **{}** to remove **{}** label, and try **{}** again",
        existing.cancel_command(),
        existing.label(),
        requested.command()
    ))
}
