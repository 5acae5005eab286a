use std::fmt;

use crate::error::Result;
use crate::model::outcome::PostOutcome;
use crate::providers::{CardSource, IssueDestination};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationSummary {
    pub posted: usize,
    pub archived: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl MigrationSummary {
    fn record(&mut self, outcome: &PostOutcome) {
        match outcome {
            PostOutcome::Posted(_) => self.posted += 1,
            PostOutcome::Archived => self.archived += 1,
            PostOutcome::Skipped => self.skipped += 1,
            PostOutcome::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.posted + self.archived + self.skipped + self.failed
    }
}

impl fmt::Display for MigrationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cards: {} posted, {} archived without posting, {} skipped, {} failed",
            self.total(),
            self.posted,
            self.archived,
            self.skipped,
            self.failed
        )
    }
}

/// Offer every open card to `destination`, one at a time, and archive it in
/// `source` unless the operator skipped it.
pub async fn migrate(
    source: &dyn CardSource,
    destination: &mut dyn IssueDestination,
) -> Result<MigrationSummary> {
    let cards = source.get_open_cards().await?;
    log::info!(
        "Offering {} open {} cards to {}",
        cards.len(),
        source.name(),
        destination.name()
    );

    let mut summary = MigrationSummary::default();
    for card in cards {
        let checklists = if card.has_checklist {
            source.get_checklists(&card.id).await?
        } else {
            Vec::new()
        };
        let attachments = if card.has_attachments {
            source.get_attachments(&card.id).await?
        } else {
            Vec::new()
        };

        let outcome = destination
            .post(&card.title, &card.body, &checklists, &attachments)
            .await?;
        log::info!("{}: {outcome}", card.title);
        summary.record(&outcome);

        if outcome.archives_source() {
            source.archive_card(&card.id, outcome.reference()).await?;
        }
    }

    Ok(summary)
}
