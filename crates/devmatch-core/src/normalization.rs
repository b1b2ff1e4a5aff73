//! Name and email normalization
//!
//! Every function here is total: missing or malformed input degrades to
//! empty strings instead of failing.

use lazy_static::lazy_static;
use regex::Regex;
use unidecode::unidecode;

lazy_static! {
    static ref NON_NAME_CHARS: Regex = Regex::new(r"[^\w\s\-]").unwrap();
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
    static ref ADDRESS_COMMENT: Regex = Regex::new(r"\([^()]*\)").unwrap();
}

/// Domains that get Gmail-style local part canonicalization
const GMAIL_DOMAINS: [&str; 2] = ["gmail.com", "googlemail.com"];

/// First and last name tokens of a full name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameParts {
    pub first: String,
    /// Empty for single-token names
    pub last: String,
}

/// Canonical email address split into its parts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedEmail {
    /// `local@domain`, or the cleaned input when there is no `@`
    pub full: String,
    pub local: String,
    pub domain: String,
}

impl NormalizedEmail {
    fn without_domain(cleaned: String) -> Self {
        Self {
            full: cleaned.clone(),
            local: cleaned,
            domain: String::new(),
        }
    }
}

/// Normalize a person name for comparison
///
/// - Transliterates to ASCII (`José` -> `jose`)
/// - Lowercases
/// - Turns `.` into a space so initials split apart
/// - Drops punctuation other than `-` and `_`
/// - Collapses whitespace
pub fn normalize_name(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let folded = unidecode(raw).to_lowercase();
    let spaced = folded.trim().replace('.', " ");
    let stripped = NON_NAME_CHARS.replace_all(&spaced, "");
    WHITESPACE_RUN
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}

/// Split a full name into first and last tokens, dropping middle names
pub fn split_name(full: &str) -> NameParts {
    let tokens: Vec<&str> = full.split_whitespace().collect();
    match tokens.as_slice() {
        [] => NameParts::default(),
        [only] => NameParts {
            first: only.to_string(),
            last: String::new(),
        },
        [first, .., last] => NameParts {
            first: first.to_string(),
            last: last.to_string(),
        },
    }
}

/// Normalize an email address
///
/// Accepts bare addresses and `Display Name <addr>` forms. Gmail and
/// Googlemail addresses are folded to one canonical mailbox: `+tag` suffixes
/// and dots in the local part are removed.
pub fn normalize_email(raw: &str) -> NormalizedEmail {
    if raw.is_empty() {
        return NormalizedEmail::default();
    }

    let addr = extract_address(raw).to_lowercase();

    if !addr.contains('@') {
        return NormalizedEmail::without_domain(addr.replace(' ', ""));
    }

    let (local, domain) = match addr.split_once('@') {
        Some(parts) => parts,
        None => return NormalizedEmail::without_domain(addr),
    };

    let (local, domain) = if GMAIL_DOMAINS.contains(&domain) {
        let untagged = local.split_once('+').map_or(local, |(head, _)| head);
        (untagged.replace('.', ""), "gmail.com".to_string())
    } else {
        (local.to_string(), domain.to_string())
    };

    NormalizedEmail {
        full: format!("{local}@{domain}"),
        local,
        domain,
    }
}

/// Pull the address out of `Name <addr>` or `addr (Name)`
///
/// Parenthesized comments are dropped and a missing closing `>` is
/// tolerated. Anything else is returned trimmed.
fn extract_address(raw: &str) -> String {
    let uncommented = ADDRESS_COMMENT.replace_all(raw, " ");
    if let Some(open) = uncommented.rfind('<') {
        let rest = &uncommented[open + 1..];
        let inner = rest.split_once('>').map_or(rest, |(inner, _)| inner).trim();
        if !inner.is_empty() {
            return inner.to_string();
        }
    }
    uncommented.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name_basic() {
        assert_eq!(normalize_name("  Dr. John Smith "), "dr john smith");
    }

    #[test]
    fn test_normalize_name_with_accents() {
        assert_eq!(normalize_name("José María-López"), "jose maria-lopez");
        assert_eq!(normalize_name("François Müller"), "francois muller");
    }

    #[test]
    fn test_normalize_name_with_symbols() {
        assert_eq!(normalize_name("A_B*C@D!"), "a_bcd");
    }

    #[test]
    fn test_normalize_name_initials() {
        assert_eq!(normalize_name("J.R.R. Tolkien"), "j r r tolkien");
    }

    #[test]
    fn test_normalize_name_empty() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("   "), "");
        assert_eq!(normalize_name("!!!"), "");
    }

    #[test]
    fn test_split_name() {
        assert_eq!(
            split_name("Alice Smith"),
            NameParts {
                first: "Alice".into(),
                last: "Smith".into()
            }
        );
        assert_eq!(
            split_name("Alice"),
            NameParts {
                first: "Alice".into(),
                last: String::new()
            }
        );
        assert_eq!(
            split_name("  Alice   B.  Smith  "),
            NameParts {
                first: "Alice".into(),
                last: "Smith".into()
            }
        );
        assert_eq!(split_name(""), NameParts::default());
    }

    #[test]
    fn test_normalize_email_standard() {
        let email = normalize_email("John.Smith@Example.COM");
        assert_eq!(email.full, "john.smith@example.com");
        assert_eq!(email.local, "john.smith");
        assert_eq!(email.domain, "example.com");
    }

    #[test]
    fn test_normalize_email_with_display_name() {
        let email = normalize_email("John Smith <john.smith@example.com>");
        assert_eq!(email.full, "john.smith@example.com");
        assert_eq!(email.local, "john.smith");
        assert_eq!(email.domain, "example.com");
    }

    #[test]
    fn test_normalize_email_trailing_comment() {
        let email = normalize_email("john@x.com (John Doe)");
        assert_eq!(email.full, "john@x.com");
        assert_eq!(email.domain, "x.com");
    }

    #[test]
    fn test_normalize_email_unclosed_angle() {
        let email = normalize_email("Jane <jane@x.io");
        assert_eq!(email.full, "jane@x.io");
        assert_eq!(email.local, "jane");
    }

    #[test]
    fn test_normalize_email_gmail_rules() {
        let email = normalize_email("John.Doe+spam@Gmail.COM");
        assert_eq!(email.full, "johndoe@gmail.com");
        assert_eq!(email.local, "johndoe");
        assert_eq!(email.domain, "gmail.com");
    }

    #[test]
    fn test_normalize_email_googlemail_alias() {
        let email = normalize_email("user.name@googlemail.com");
        assert_eq!(email.full, "username@gmail.com");
        assert_eq!(email.domain, "gmail.com");
    }

    #[test]
    fn test_plus_tag_kept_outside_gmail() {
        let email = normalize_email("user+tag@example.com");
        assert_eq!(email.local, "user+tag");
    }

    #[test]
    fn test_normalize_email_missing_at() {
        let email = normalize_email("invalid email");
        assert_eq!(email.full, "invalidemail");
        assert_eq!(email.local, "invalidemail");
        assert_eq!(email.domain, "");
    }

    #[test]
    fn test_normalize_email_multiple_at() {
        let email = normalize_email("a@b@c.com");
        assert_eq!(email.full, "a@b@c.com");
        assert_eq!(email.local, "a");
        assert_eq!(email.domain, "b@c.com");
    }

    #[test]
    fn test_normalize_email_empty() {
        assert_eq!(normalize_email(""), NormalizedEmail::default());
        assert_eq!(normalize_email("   ").full, "");
    }
}
