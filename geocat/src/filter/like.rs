use regex::Regex;

/// Wildcard matching any run of characters.
pub const WILDCARD_MULTI: char = '*';
/// Wildcard matching exactly one character.
pub const WILDCARD_SINGLE: char = '?';
/// Escape character making the next character literal.
pub const ESCAPE: char = '\\';

/// Translates a LIKE pattern into an unanchored regular expression body.
///
/// `*` becomes `.*`, `?` becomes `.`, `\x` is the literal `x` and every
/// other character is escaped. The body carries no anchors so callers can
/// use it with engines that match whole terms implicitly.
pub fn wildcard_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            WILDCARD_MULTI => regex.push_str(".*"),
            WILDCARD_SINGLE => regex.push('.'),
            ESCAPE => match chars.next() {
                Some(escaped) => regex.push_str(&regex::escape(&escaped.to_string())),
                None => regex.push_str(&regex::escape("\\")),
            },
            other => regex.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex
}

/// Compiles a LIKE pattern into an anchored regex.
///
/// Returns `None` and logs when the pattern cannot be compiled, in which case
/// the owning filter matches nothing.
pub(crate) fn compile_like(pattern: &str, match_case: bool) -> Option<Regex> {
    let body = wildcard_to_regex(pattern);
    let source = if match_case {
        format!("^{}$", body)
    } else {
        format!("(?i)^{}$", body)
    };
    match Regex::new(&source) {
        Ok(regex) => Some(regex),
        Err(e) => {
            log::error!("Invalid LIKE pattern '{}': {}", pattern, e);
            None
        }
    }
}

/// Strips leading and trailing multi-wildcards, returning the literal core.
///
/// Used for log messages and to detect match-everything patterns.
pub fn strip_wildcards(pattern: &str) -> &str {
    pattern.trim_matches(WILDCARD_MULTI)
}
