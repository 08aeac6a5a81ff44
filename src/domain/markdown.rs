//! Discord-flavoured markdown helpers used when rendering posts and reports.

pub const DEFAULT_TRUNCATE: usize = 500;

pub fn heading(text: &str, level: usize) -> String {
    format!("{} {}", "#".repeat(level.clamp(1, 3)), text)
}

pub fn hyperlink(text: &str, url: &str) -> String {
    format!("[{}]({})", text, url)
}

pub fn bold(text: &str) -> String {
    format!("**{}**", text)
}

pub fn role_mention(role_id: &str) -> String {
    format!("<@&{}>", role_id)
}

pub fn code_block(text: &str) -> String {
    format!("```\n{}\n```", text)
}

/// Heading that links to `link` when one is known.
pub fn linked_heading(title: &str, link: Option<&str>, level: usize) -> String {
    match link {
        Some(url) => heading(&hyperlink(title, url), level),
        None => heading(title, level),
    }
}

/// Cut `s` to at most `max_len` characters, ending with "..." when shortened.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let keep = max_len.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Post body text, or the placeholder used when a page has no description.
pub fn description_or_placeholder(content: &str) -> String {
    if content.is_empty() {
        "Нема опис.".to_string()
    } else {
        truncate(content, DEFAULT_TRUNCATE)
    }
}
