use serde::Deserialize;

/// A GitHub project or project column as returned by the projects API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Resource {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub html_url: Option<String>,
}
