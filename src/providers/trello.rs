use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::Deserialize;

use super::api::ApiClient;
use super::CardSource;
use crate::error::{Error, Result};
use crate::model::card::{Attachment, Card, Checklist, ChecklistItem};
use crate::model::token::AuthToken;
use crate::ui::prompt::Prompter;

pub const API_ROOT: &str = "https://api.trello.com/1/";

#[derive(Debug, Clone)]
pub struct TrelloSettings {
    pub api_key: String,
    pub username: String,
    pub board: String,
    pub list: String,
    pub token: Option<String>,
    pub api_root: String,
}

pub struct TrelloClient {
    api: ApiClient,
    token: AuthToken,
    list_id: String,
}

#[derive(Deserialize)]
struct Named {
    id: String,
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrelloCard {
    id: String,
    name: String,
    #[serde(default)]
    desc: String,
    #[serde(default)]
    id_checklists: Vec<String>,
    #[serde(default)]
    badges: Option<Badges>,
}

#[derive(Deserialize)]
struct Badges {
    #[serde(default)]
    attachments: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrelloChecklist {
    name: String,
    #[serde(default)]
    check_items: Vec<CheckItem>,
}

#[derive(Deserialize)]
struct CheckItem {
    name: String,
    state: String,
    #[serde(default)]
    pos: f64,
}

#[derive(Deserialize)]
struct TrelloAttachment {
    url: String,
}

impl From<TrelloCard> for Card {
    fn from(card: TrelloCard) -> Self {
        Card {
            id: card.id,
            title: card.name,
            body: card.desc,
            has_checklist: !card.id_checklists.is_empty(),
            has_attachments: card.badges.map(|b| b.attachments > 0).unwrap_or(false),
        }
    }
}

impl From<TrelloChecklist> for Checklist {
    fn from(checklist: TrelloChecklist) -> Self {
        let mut raw = checklist.check_items;
        raw.sort_by(|a, b| a.pos.total_cmp(&b.pos));
        let items = raw
            .into_iter()
            .map(|item| ChecklistItem {
                completed: item.state == "complete",
                name: item.name,
            })
            .collect();
        Checklist::new(checklist.name, items)
    }
}

pub fn authorize_url(api_key: &str) -> String {
    format!(
        "https://trello.com/1/authorize?expiration=1day&name=trello2github\
         &scope=read,write&response_type=token&key={}",
        urlencoding::encode(api_key)
    )
}

fn acquire_token(api_key: &str, prompter: &mut Prompter) -> Result<AuthToken> {
    prompter.say("Go to the following url")?;
    prompter.say(&format!(" {}", authorize_url(api_key)))?;
    prompter.say("Copy the token, paste it here, and press return.")?;
    let value = prompter.single_line("Token: ", None)?;
    Ok(AuthToken::acquired(value))
}

/// First entry whose id or name equals `identifier` exactly.
fn find_matching(entries: Vec<Named>, identifier: &str) -> Option<String> {
    entries
        .into_iter()
        .find(|e| e.id == identifier || e.name == identifier)
        .map(|e| e.id)
}

impl TrelloClient {
    /// Resolve a token, then the board and list the cards come from.
    pub async fn connect(settings: &TrelloSettings, prompter: &mut Prompter) -> Result<Self> {
        let token = match &settings.token {
            Some(value) => AuthToken::supplied(value.clone()),
            None => acquire_token(&settings.api_key, prompter)?,
        };

        let mut api = ApiClient::new("Trello", settings.api_root.clone());
        api.set_base_param("key", &settings.api_key);
        api.set_base_param("token", token.value());

        let mut client = Self {
            api,
            token,
            list_id: String::new(),
        };
        // A token created above must still be revoked if resolution fails.
        let resolved = client
            .resolve_list(&settings.username, &settings.board, &settings.list)
            .await;
        match resolved {
            Ok(list_id) => {
                client.list_id = list_id;
                Ok(client)
            }
            Err(err) => {
                if let Err(close_err) = client.close().await {
                    log::warn!("Failed to revoke Trello token: {close_err}");
                }
                Err(err)
            }
        }
    }

    pub async fn resolve_list(
        &self,
        username: &str,
        board_identifier: &str,
        list_identifier: &str,
    ) -> Result<String> {
        let boards: Vec<Named> = self.api.get(&format!("members/{username}/boards")).await?;
        let board_id = find_matching(boards, board_identifier).ok_or_else(|| Error::NotFound {
            kind: "board",
            identifier: board_identifier.to_string(),
        })?;

        let lists: Vec<Named> = self.api.get(&format!("boards/{board_id}/lists")).await?;
        let list_id = find_matching(lists, list_identifier).ok_or_else(|| Error::NotFound {
            kind: "list",
            identifier: list_identifier.to_string(),
        })?;

        log::info!("Migrating cards from Trello list {list_id} on board {board_id}");
        Ok(list_id)
    }

    #[cfg(test)]
    pub fn list_id(&self) -> &str {
        &self.list_id
    }

    /// Revoke the token if this run created it.
    pub async fn close(self) -> Result<()> {
        if self.token.is_owned() {
            log::debug!("Revoking Trello token");
            self.api
                .request(
                    Method::DELETE,
                    &format!("tokens/{}/", self.token.value()),
                    HeaderMap::new(),
                    &[],
                    None,
                )
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl CardSource for TrelloClient {
    fn name(&self) -> &str {
        "Trello"
    }

    async fn get_open_cards(&self) -> Result<Vec<Card>> {
        let cards: Vec<TrelloCard> = self
            .api
            .get(&format!("lists/{}/cards/open", self.list_id))
            .await?;
        Ok(cards.into_iter().map(Card::from).collect())
    }

    async fn get_checklists(&self, card_id: &str) -> Result<Vec<Checklist>> {
        let checklists: Vec<TrelloChecklist> =
            self.api.get(&format!("cards/{card_id}/checklists")).await?;
        Ok(checklists.into_iter().map(Checklist::from).collect())
    }

    async fn get_attachments(&self, card_id: &str) -> Result<Vec<Attachment>> {
        let attachments: Vec<TrelloAttachment> =
            self.api.get(&format!("cards/{card_id}/attachments")).await?;
        Ok(attachments
            .into_iter()
            .map(|a| Attachment { url: a.url })
            .collect())
    }

    async fn archive_card(&self, card_id: &str, reference: Option<&str>) -> Result<()> {
        if let Some(reference) = reference {
            log::debug!("Commenting on Trello card {card_id}");
            let text = format!("Migrated to GitHub issue {reference}");
            self.api
                .request(
                    Method::POST,
                    &format!("cards/{card_id}/actions/comments"),
                    HeaderMap::new(),
                    &[("text", text.as_str())],
                    None,
                )
                .await?;
        }

        log::debug!("Archiving Trello card {card_id}");
        self.api
            .request(
                Method::PUT,
                &format!("cards/{card_id}/closed"),
                HeaderMap::new(),
                &[("value", "true")],
                None,
            )
            .await?;
        Ok(())
    }
}
