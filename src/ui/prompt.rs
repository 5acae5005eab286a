use std::io::{self, BufRead, BufReader, Write};

use crate::error::{Error, Result};

pub const QUIT_KEY: &str = "q";

/// What a line typed at a menu resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    Key(String),
    Quit,
}

/// Resolve one input line against a menu. `None` means ask again.
pub fn parse_choice(options: &[(String, String)], line: &str) -> Option<Choice> {
    let line = line.trim();
    if line == QUIT_KEY {
        return Some(Choice::Quit);
    }
    options
        .iter()
        .find(|(key, _)| key == line)
        .map(|(key, _)| Choice::Key(key.clone()))
}

/// Line-oriented prompts over any reader/writer pair.
pub struct Prompter {
    input: Box<dyn BufRead + Send + Sync>,
    output: Box<dyn Write + Send + Sync>,
}

impl Prompter {
    pub fn new(
        input: impl BufRead + Send + Sync + 'static,
        output: impl Write + Send + Sync + 'static,
    ) -> Self {
        Self {
            input: Box::new(input),
            output: Box::new(output),
        }
    }

    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }

    pub fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{text}")?;
        self.output.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(Error::InputClosed);
        }
        Ok(line.trim().to_string())
    }

    /// Ask until a non-empty answer arrives, optionally restricted to `allowed`.
    pub fn single_line(&mut self, prompt: &str, allowed: Option<&[&str]>) -> Result<String> {
        loop {
            write!(self.output, "{prompt}")?;
            self.output.flush()?;
            let answer = self.read_line()?;
            if answer.is_empty() {
                continue;
            }
            match allowed {
                Some(values) if !values.contains(&answer.as_str()) => continue,
                _ => return Ok(answer),
            }
        }
    }

    pub fn single_line_with_confirmation(&mut self, prompt: &str) -> Result<String> {
        loop {
            let answer = self.single_line(prompt, None)?;
            let confirm = format!("Use '{answer}'? [y,n]: ");
            if self.single_line(&confirm, Some(&["y", "n"]))? == "y" {
                return Ok(answer);
            }
        }
    }

    /// Show a menu and return the chosen key. Picking `q` yields
    /// [`Error::Quit`], which callers propagate up to `main`.
    pub fn multiple_choice(&mut self, prompt: &str, options: &[(String, String)]) -> Result<String> {
        writeln!(self.output, "\n{prompt}\n")?;
        writeln!(self.output, "Choose one of the following:")?;
        for (key, label) in options {
            writeln!(self.output, "  {key}) {label}")?;
        }
        writeln!(self.output, "  {QUIT_KEY}) quit (exit)")?;

        let mut keys: Vec<&str> = options.iter().map(|(k, _)| k.as_str()).collect();
        keys.push(QUIT_KEY);
        let ask = format!("[{}]: ", keys.join(","));

        loop {
            let line = self.single_line(&ask, None)?;
            match parse_choice(options, &line) {
                Some(Choice::Key(key)) => return Ok(key),
                Some(Choice::Quit) => return Err(Error::Quit),
                None => continue,
            }
        }
    }
}

/// Build menu options from borrowed `(key, label)` pairs.
pub fn options(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, l)| (k.to_string(), l.to_string()))
        .collect()
}
