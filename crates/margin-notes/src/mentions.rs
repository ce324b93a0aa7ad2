//! `@login` mentions in note content.

use std::sync::LazyLock;

use regex::Regex;

static MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\w@.])@([A-Za-z0-9_][A-Za-z0-9_.-]*)").expect("valid mention pattern")
});

/// Returns the logins mentioned in `content`, first occurrence first.
///
/// A trailing period belongs to the sentence, not the login. Email
/// addresses are not mentions.
///
/// ```
/// use margin_notes::mentions::parse;
///
/// assert_eq!(parse("@ada can you check this? cc @grace."), ["ada", "grace"]);
/// assert!(parse("mail ada@example.com").is_empty());
/// ```
#[must_use]
pub fn parse(content: &str) -> Vec<String> {
    let mut logins: Vec<String> = Vec::new();
    for capture in MENTION.captures_iter(content) {
        let login = capture[1].trim_end_matches('.');
        if !login.is_empty() && !logins.iter().any(|l| l == login) {
            logins.push(login.to_string());
        }
    }
    logins
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dedups_in_order() {
        assert_eq!(parse("@bob @ada @bob"), ["bob", "ada"]);
    }

    #[test]
    fn test_parse_positions() {
        assert_eq!(parse("(@ada) and\n@j.doe-2, done"), ["ada", "j.doe-2"]);
        assert!(parse("no mentions here").is_empty());
        assert!(parse("@@ada").is_empty());
    }
}
