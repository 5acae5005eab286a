pub mod api;
pub mod github;
pub mod trello;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::card::{Attachment, Card, Checklist};
use crate::model::outcome::PostOutcome;

/// Where cards come from, and where they are archived once handled.
#[async_trait]
pub trait CardSource: Send + Sync {
    fn name(&self) -> &str;
    async fn get_open_cards(&self) -> Result<Vec<Card>>;
    async fn get_checklists(&self, card_id: &str) -> Result<Vec<Checklist>>;
    async fn get_attachments(&self, card_id: &str) -> Result<Vec<Attachment>>;
    /// Comment with `reference` when present, then close the card.
    async fn archive_card(&self, card_id: &str, reference: Option<&str>) -> Result<()>;
}

/// Where cards are posted after the operator confirms them.
#[async_trait]
pub trait IssueDestination: Send {
    fn name(&self) -> &str;
    async fn post(
        &mut self,
        title: &str,
        body: &str,
        checklists: &[Checklist],
        attachments: &[Attachment],
    ) -> Result<PostOutcome>;
}
