use crate::model::card::{Attachment, Checklist};

pub const MIGRATION_FOOTER: &str = "***(Programatically migrated from Trello)***";

/// Render checklists as markdown task lists. Empty input renders to "".
pub fn render_checklists(checklists: &[Checklist]) -> String {
    if checklists.is_empty() {
        return String::new();
    }

    let mut out = String::from("## Checklists\n\n");
    for checklist in checklists {
        out.push_str(&format!("### {}\n\n", checklist.name));
        for item in &checklist.items {
            let mark = if item.completed { "x" } else { " " };
            out.push_str(&format!("- [{mark}] {}\n", item.name));
        }
        out.push('\n');
    }
    out.push_str("***\n\n");
    out
}

/// Render attachment URLs as a bullet list. Empty input renders to "".
pub fn render_attachments(attachments: &[Attachment]) -> String {
    if attachments.is_empty() {
        return String::new();
    }

    let mut out = String::from("\n\n***\n\n## Attachments\n\n");
    for attachment in attachments {
        out.push_str(&format!("- {}\n", attachment.url));
    }
    out
}

pub fn compose_body(body: &str, checklists: &[Checklist], attachments: &[Attachment]) -> String {
    format!(
        "{}{}{}",
        render_checklists(checklists),
        body,
        render_attachments(attachments)
    )
}

pub fn with_footer(body: &str) -> String {
    if body.trim().is_empty() {
        MIGRATION_FOOTER.to_string()
    } else {
        format!("{body}\n\n{MIGRATION_FOOTER}")
    }
}

/// Text shown above the post/edit/skip/archive menu.
pub fn preview(title: &str, body: &str) -> String {
    let rule = "*".repeat(80);
    let body = if body.is_empty() { " (no body) " } else { body };
    format!(
        "Would you like to post the following issue to GitHub\n\n\
         {rule}\n* Title\n\n{title}\n\n{rule}\n* Body\n\n{body}\n\n{rule}"
    )
}
