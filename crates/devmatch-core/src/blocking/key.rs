//! Bucket key construction

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DevmatchError, Result};

/// Local parts under this domain look like `<id>+<handle>`
pub const GITHUB_NOREPLY_DOMAIN: &str = "users.noreply.github.com";

/// Large providers whose domain says nothing about who owns the mailbox
pub const DEFAULT_COMMON_DOMAINS: [&str; 14] = [
    "gmail.com",
    "googlemail.com",
    "yahoo.com",
    "outlook.com",
    "hotmail.com",
    "qq.com",
    "163.com",
    "proton.me",
    "protonmail.com",
    "icloud.com",
    "gmx.com",
    "gmx.de",
    "yandex.ru",
    "yandex.com",
];

/// One segment of a bucket key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyComponent {
    /// Email domain, blanked for common providers when configured
    Domain,
    /// First character of the last name
    LastnameInitial,
    /// First character of the GitHub handle, else of the email local part
    PrefixInitial,
    /// Handle parsed from a GitHub noreply address
    GhHandle,
}

impl KeyComponent {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyComponent::Domain => "domain",
            KeyComponent::LastnameInitial => "lastname_initial",
            KeyComponent::PrefixInitial => "prefix_initial",
            KeyComponent::GhHandle => "gh_handle",
        }
    }
}

impl fmt::Display for KeyComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyComponent {
    type Err = DevmatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "domain" => Ok(KeyComponent::Domain),
            "lastname_initial" => Ok(KeyComponent::LastnameInitial),
            "prefix_initial" => Ok(KeyComponent::PrefixInitial),
            "gh_handle" => Ok(KeyComponent::GhHandle),
            other => Err(DevmatchError::UnknownKeyComponent(other.to_string())),
        }
    }
}

/// What to do with component names that are not recognized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaPolicy {
    /// Keep the slot as an always-empty segment
    #[default]
    Lenient,
    /// Reject the schema
    Strict,
}

/// A key slot: a known component, or a name kept only for its empty segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Known(KeyComponent),
    Unrecognized(String),
}

/// Ordered list of components that make up a bucket key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    segments: Vec<Segment>,
}

impl KeySchema {
    pub fn new(components: impl IntoIterator<Item = KeyComponent>) -> Self {
        Self {
            segments: components.into_iter().map(Segment::Known).collect(),
        }
    }

    /// Parse component names under the given policy
    ///
    /// Under [`SchemaPolicy::Lenient`] an unknown name still occupies its
    /// position and always yields an empty segment, so bucket keys keep the
    /// same number of `|` separators as the schema has names.
    pub fn parse<S: AsRef<str>>(names: &[S], policy: SchemaPolicy) -> Result<Self> {
        let mut segments = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            match (name.parse::<KeyComponent>(), policy) {
                (Ok(component), _) => segments.push(Segment::Known(component)),
                (Err(err), SchemaPolicy::Strict) => return Err(err),
                (Err(_), SchemaPolicy::Lenient) => {
                    tracing::warn!("Unknown key component '{}', using empty segment", name);
                    segments.push(Segment::Unrecognized(name.to_string()));
                }
            }
        }
        Ok(Self { segments })
    }

    pub(crate) fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Component names, unknown ones included, for logs and reports
    pub fn names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Known(component) => component.as_str(),
                Segment::Unrecognized(name) => name.as_str(),
            })
            .collect()
    }

    /// The four passes `merge_candidates` runs, most precise first
    pub fn default_passes() -> Vec<KeySchema> {
        use KeyComponent::*;
        vec![
            KeySchema::new([Domain, LastnameInitial]),
            KeySchema::new([GhHandle]),
            KeySchema::new([Domain, PrefixInitial]),
            KeySchema::new([LastnameInitial]),
        ]
    }
}

impl fmt::Display for KeySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.names().join(","))
    }
}

/// Extract the handle from a GitHub noreply local part (`12345+octocat`)
pub fn parse_gh_handle<'a>(local: &'a str, domain: &str) -> &'a str {
    parse_handle_for(local, domain, GITHUB_NOREPLY_DOMAIN)
}

pub(crate) fn parse_handle_for<'a>(local: &'a str, domain: &str, noreply_domain: &str) -> &'a str {
    if domain != noreply_domain {
        return "";
    }
    local.split_once('+').map_or("", |(_, handle)| handle)
}

/// First character as a string, or empty
pub(crate) fn initial(s: &str) -> String {
    s.chars().next().map(String::from).unwrap_or_default()
}
