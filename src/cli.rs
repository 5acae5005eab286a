use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::providers::github::{self, GitHubSettings};
use crate::providers::trello::{self, TrelloSettings};

/// Move open cards from a Trello list to GitHub issues, one card at a time.
#[derive(Debug, Parser)]
#[command(name = "trello2github", version)]
pub struct Cli {
    /// Trello API key
    #[arg(long, env = "TRELLO_API_KEY")]
    pub trello_api_key: Option<String>,

    /// Trello username that owns the board
    #[arg(long)]
    pub trello_user: Option<String>,

    /// Board name or id
    #[arg(long)]
    pub board: Option<String>,

    /// List name or id
    #[arg(long)]
    pub list: Option<String>,

    /// Trello token; prompted for when absent
    #[arg(long, env = "TRELLO_TOKEN", hide_env_values = true)]
    pub trello_token: Option<String>,

    /// GitHub user or organization
    #[arg(long)]
    pub github_owner: Option<String>,

    /// Repository to post issues to; omit to post notes to an org project
    #[arg(long)]
    pub github_repo: Option<String>,

    /// GitHub access token; prompted for when absent
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Extra title prefix to strip (repeatable)
    #[arg(long = "strip-prefix")]
    pub strip_prefixes: Vec<String>,

    /// Config file (default ~/.trello2github/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// -v for info, -vv for debug
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug)]
pub struct RunSettings {
    pub trello: TrelloSettings,
    pub github: GitHubSettings,
    pub editor: Option<String>,
}

fn required(flag: Option<String>, file: Option<String>, name: &str) -> Result<String> {
    match flag.or(file).filter(|v| !v.trim().is_empty()) {
        Some(value) => Ok(value),
        None => bail!("Missing {name}. Pass it on the command line or set it in the config file"),
    }
}

impl Cli {
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }

    /// Merge flags over the config file. Flags win.
    pub fn resolve(self, config: AppConfig) -> Result<RunSettings> {
        let AppConfig {
            trello: t,
            github: g,
            editor,
        } = config;

        let trello = TrelloSettings {
            api_key: required(self.trello_api_key, t.api_key, "Trello API key (--trello-api-key)")?,
            username: required(self.trello_user, t.username, "Trello username (--trello-user)")?,
            board: required(self.board, t.board, "Trello board (--board)")?,
            list: required(self.list, t.list, "Trello list (--list)")?,
            token: self.trello_token.or(t.token),
            api_root: t.api_root.unwrap_or_else(|| trello::API_ROOT.to_string()),
        };

        let mut strip_prefixes = g.strip_prefixes;
        strip_prefixes.extend(self.strip_prefixes);

        let github = GitHubSettings {
            owner: required(self.github_owner, g.owner, "GitHub owner (--github-owner)")?,
            repo: self.github_repo.or(g.repo).filter(|r| !r.trim().is_empty()),
            token: self.github_token.or(g.token),
            strip_prefixes,
            api_root: g.api_root.unwrap_or_else(|| github::API_ROOT.to_string()),
        };

        Ok(RunSettings {
            trello,
            github,
            editor: editor.command,
        })
    }
}
