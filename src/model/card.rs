use serde::Deserialize;

/// Snapshot of an open Trello card. Never mutated after it is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Card {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub has_checklist: bool,
    #[serde(default)]
    pub has_attachments: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Checklist {
    pub name: String,
    /// Incomplete items first, then completed ones.
    pub items: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChecklistItem {
    pub name: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Attachment {
    pub url: String,
}

impl Checklist {
    /// Builds a checklist with items ordered incomplete-before-completed,
    /// keeping the incoming order within each group.
    pub fn new(name: impl Into<String>, mut items: Vec<ChecklistItem>) -> Self {
        items.sort_by_key(|item| item.completed);
        Self {
            name: name.into(),
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, completed: bool) -> ChecklistItem {
        ChecklistItem {
            name: name.into(),
            completed,
        }
    }

    #[test]
    fn completed_items_sort_after_incomplete() {
        let list = Checklist::new(
            "Launch",
            vec![
                item("write docs", true),
                item("cut release", false),
                item("tag", true),
                item("announce", false),
            ],
        );
        let names: Vec<&str> = list.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["cut release", "announce", "write docs", "tag"]);
    }

    #[test]
    fn card_body_defaults_to_empty() {
        let card: Card = serde_json::from_str(r#"{"id":"c1","title":"Fix"}"#).unwrap();
        assert_eq!(card.body, "");
        assert!(!card.has_checklist);
        assert!(!card.has_attachments);
    }
}
