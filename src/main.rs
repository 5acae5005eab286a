mod cli;
mod config;
mod error;
mod migrate;
mod model;
mod providers;
mod ui;
mod util;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, RunSettings};
use providers::github::GitHubClient;
use providers::trello::TrelloClient;
use ui::editor::ExternalEditor;
use ui::prompt::Prompter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if is_quit(&err) => {
            println!("\nGood Bye");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn is_quit(err: &anyhow::Error) -> bool {
    err.downcast_ref::<error::Error>()
        .is_some_and(error::Error::is_quit)
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::load_config(cli.config.as_deref())?;
    let RunSettings {
        trello,
        github,
        editor,
    } = cli.resolve(config)?;

    let mut prompter = Prompter::stdio();
    let source = TrelloClient::connect(&trello, &mut prompter).await?;

    let editor = ExternalEditor::from_env(editor);
    log::debug!("Editing with '{}'", editor.command());
    let editor = Box::new(editor);
    let mut destination = match GitHubClient::connect(&github, prompter, editor).await {
        Ok(client) => client,
        Err(err) => {
            close_source(source).await;
            return Err(err.into());
        }
    };

    println!(
        "Posting to GitHub project '{}', column '{}'",
        destination.project().name,
        destination.column().name
    );
    let result = migrate::migrate(&source, &mut destination).await;

    destination.close().await;
    close_source(source).await;

    let summary = result?;
    println!("{summary}");
    Ok(())
}

async fn close_source(source: TrelloClient) {
    if let Err(err) = source.close().await {
        log::warn!("Failed to revoke Trello token: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_signal_survives_anyhow_conversion() {
        assert!(is_quit(&anyhow::Error::from(error::Error::Quit)));
    }

    #[test]
    fn other_errors_are_not_quit() {
        assert!(!is_quit(&anyhow::Error::from(error::Error::InputClosed)));
        assert!(!is_quit(&anyhow::anyhow!("Missing Trello API key")));
    }
}
