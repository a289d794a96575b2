//! HTML mention helpers for user-facing replies.

use crate::dispatch::Author;

/// Inline mention of a user, safe to embed in an HTML-mode message.
#[must_use]
pub fn mention(author: &Author) -> String {
    if let Some(username) = &author.username {
        return format!("@{username}");
    }
    format!(
        "<a href=\"tg://user?id={}\">{}</a>",
        author.id,
        html_escape::encode_text(&author.first_name)
    )
}

/// User-provided text escaped for HTML mode.
#[must_use]
pub fn escaped(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_wins_over_link() {
        let author = Author {
            id: 7,
            username: Some("someone".to_string()),
            first_name: "Someone".to_string(),
        };
        assert_eq!(mention(&author), "@someone");
    }

    #[test]
    fn test_nameless_user_gets_escaped_link() {
        let author = Author {
            id: 7,
            username: None,
            first_name: "<Bad> & Co".to_string(),
        };
        let text = mention(&author);
        assert!(text.starts_with("<a href=\"tg://user?id=7\">"));
        assert!(text.contains("&lt;Bad&gt; &amp; Co"));
    }
}
