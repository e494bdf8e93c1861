//! Plain-text and HTML views of a digest.

use crate::digest::{Digest, Entry};

/// Render one `**repo**` section per repository, blank-line separated.
pub fn render_plain(digest: &Digest) -> String {
    digest
        .groups()
        .map(|(repo, entries)| {
            let mut section = format!("**{repo}**");
            for entry in entries {
                section.push('\n');
                section.push_str(&plain_line(entry));
            }
            section
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn plain_line(entry: &Entry) -> String {
    match entry {
        Entry::Item(item) => {
            let activity = item.activity();
            format!(
                "- {} #{}: {} <{}>",
                item.label(),
                activity.number,
                activity.title,
                activity.url
            )
        }
        Entry::Commit(commit) => format!(
            "- Commit {}: {} <{}>",
            commit.short_sha(),
            commit.message_title,
            commit.html_url
        ),
    }
}

/// Render the digest as a single HTML fragment suitable for an email body.
pub fn render_html(digest: &Digest) -> String {
    if digest.is_empty() {
        return String::new();
    }

    let mut out = String::from(r#"<div dir="ltr">"#);

    for (index, (repo, entries)) in digest.groups().enumerate() {
        if index > 0 {
            out.push_str("<div><br></div>");
        }
        out.push_str(&format!("<div><b>{}</b></div>", html_escape(repo)));

        for entry in entries {
            out.push_str(&html_line(entry));
        }
    }

    out.push_str("</div>");
    out
}

fn html_line(entry: &Entry) -> String {
    match entry {
        Entry::Item(item) => {
            let activity = item.activity();
            let count = item.conversation_count();
            let suffix = if count > 0 {
                format!(" <i>({count} comments)</i>")
            } else {
                String::new()
            };
            format!(
                r#"<div>- <a href="{}">{} #{}</a>: {}{}</div>"#,
                html_escape(&activity.url),
                item.label(),
                activity.number,
                html_escape(&activity.title),
                suffix
            )
        }
        Entry::Commit(commit) => format!(
            r#"<div>- <a href="{}">Commit {}</a>: {}</div>"#,
            html_escape(&commit.html_url),
            html_escape(commit.short_sha()),
            html_escape(&commit.message_title)
        ),
    }
}

/// Escape text for HTML element content and quoted attributes.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
