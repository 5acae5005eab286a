use std::io::Write;
use std::process::Command;

use crate::error::{Error, Result};

pub const FALLBACK_EDITOR: &str = "vi";

/// Something that lets the operator rewrite a text field.
pub trait TextEditor: Send + Sync {
    fn edit(&mut self, field_name: &str, initial: &str) -> Result<String>;
}

/// Opens the field in an external editor on a scratch file.
pub struct ExternalEditor {
    command: String,
}

impl ExternalEditor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Configured command, else `$VISUAL`, else `$EDITOR`, else `vi`.
    pub fn from_env(configured: Option<String>) -> Self {
        let command = configured
            .or_else(|| std::env::var("VISUAL").ok())
            .or_else(|| std::env::var("EDITOR").ok())
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_EDITOR.to_string());
        Self::new(command)
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl TextEditor for ExternalEditor {
    fn edit(&mut self, field_name: &str, initial: &str) -> Result<String> {
        let mut file = tempfile::Builder::new()
            .prefix("trello2github-")
            .suffix(".md")
            .tempfile()?;
        file.write_all(editor_buffer(field_name, initial).as_bytes())?;
        file.flush()?;

        let mut parts = self.command.split_whitespace();
        let program = parts.next().unwrap_or(FALLBACK_EDITOR);
        log::debug!("Editing {field_name} with {}", self.command);
        let status = Command::new(program)
            .args(parts)
            .arg(file.path())
            .status()?;
        if !status.success() {
            return Err(Error::Editor {
                command: self.command.clone(),
                status: status.to_string(),
            });
        }

        // Editors may replace the file rather than write in place.
        let contents = std::fs::read_to_string(file.path())?;
        Ok(parse_edited(&contents))
    }
}

/// Scratch-file contents: a removable header, a blank line, then the value.
pub fn editor_buffer(field_name: &str, value: &str) -> String {
    format!("---- {field_name} ----\n\n{value}\n")
}

/// Recover the edited value: drop the header line and any blank lines before
/// the content, keep everything after that as typed.
pub fn parse_edited(contents: &str) -> String {
    let mut lines = contents.lines().peekable();
    if lines.peek().is_some_and(|l| l.starts_with("---- ")) {
        lines.next();
    }
    let kept: Vec<&str> = lines.skip_while(|l| l.trim().is_empty()).collect();
    kept.join("\n").trim_end().to_string()
}
