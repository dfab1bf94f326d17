//! Name helpers.
//!
//! Field, group and action names must be identifiers because they become
//! segments of dotted submission keys; labels default to a title-cased
//! rendering of the name.

use regex::Regex;
use std::sync::OnceLock;

/// Returns `true` if `name` is a valid field/group identifier
/// (`[a-zA-Z_][a-zA-Z0-9_]*`).
///
/// # Examples
///
/// ```
/// use formal_core::utils::text::valid_identifier;
///
/// assert!(valid_identifier("first_name"));
/// assert!(valid_identifier("_private"));
/// assert!(!valid_identifier("1st"));
/// assert!(!valid_identifier("address.street"));
/// assert!(!valid_identifier(""));
/// ```
pub fn valid_identifier(name: &str) -> bool {
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();

    let re = IDENTIFIER.get_or_init(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap());
    re.is_match(name)
}

/// Derives a human-readable title from an identifier.
///
/// Underscores become word breaks, a lower-to-upper case change starts a
/// new word, and the first letter of every word is upper-cased.
///
/// # Examples
///
/// ```
/// use formal_core::utils::text::title_from_name;
///
/// assert_eq!(title_from_name("first_name"), "First Name");
/// assert_eq!(title_from_name("dateOfBirth"), "Date Of Birth");
/// assert_eq!(title_from_name("submit"), "Submit");
/// assert_eq!(title_from_name("URL"), "URL");
/// ```
pub fn title_from_name(name: &str) -> String {
    let mut title = String::with_capacity(name.len() + 4);
    let mut last: Option<char> = None;

    for ch in name.chars() {
        if ch == '_' {
            if !matches!(last, Some('_') | None) {
                title.push(' ');
            }
        } else if matches!(last, None | Some('_')) {
            title.extend(ch.to_uppercase());
        } else if ch.is_uppercase() && last.is_some_and(|l| !l.is_uppercase()) {
            title.push(' ');
            title.push(ch);
        } else {
            title.push(ch);
        }
        last = Some(ch);
    }

    title.trim_end().to_string()
}
