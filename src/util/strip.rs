use regex::Regex;

/// Removes configured prefixes such as `MyRepo:` from the start of card titles.
///
/// Every prefix matches an optional run of word characters around it followed
/// by a colon, case-insensitively. All prefixes are folded into a single
/// anchored pattern that may repeat, so `MyRepo: WIP: x` loses both.
#[derive(Debug, Clone)]
pub struct TitleStripper {
    pattern: Option<Regex>,
}

impl TitleStripper {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternatives: Vec<String> = prefixes
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .map(|p| format!(r"\w*{}\w*", regex::escape(&p)))
            .collect();

        if alternatives.is_empty() {
            return Self { pattern: None };
        }

        let source = format!(r"(?i)^(?:\s*(?:{})\s*:)+", alternatives.join("|"));
        // Every piece is escaped, so the pattern always compiles.
        let pattern = Regex::new(&source).ok();
        Self { pattern }
    }

    pub fn strip(&self, title: &str) -> String {
        match &self.pattern {
            Some(re) => re.replace(title, "").trim().to_string(),
            None => title.trim().to_string(),
        }
    }
}
