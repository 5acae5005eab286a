use std::fmt;

/// Terminal result of offering one card for posting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOutcome {
    Skipped,
    /// Archive the Trello card without posting anything.
    Archived,
    /// Posted; carries the issue URL, or the project URL for note cards.
    Posted(String),
    Failed,
}

impl PostOutcome {
    pub fn reference(&self) -> Option<&str> {
        match self {
            PostOutcome::Posted(url) => Some(url),
            _ => None,
        }
    }

    pub fn archives_source(&self) -> bool {
        !matches!(self, PostOutcome::Skipped)
    }
}

impl fmt::Display for PostOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostOutcome::Skipped => write!(f, "Skipped"),
            PostOutcome::Archived => write!(f, "Archived"),
            PostOutcome::Posted(url) => write!(f, "Posted ({url})"),
            PostOutcome::Failed => write!(f, "Failed"),
        }
    }
}
