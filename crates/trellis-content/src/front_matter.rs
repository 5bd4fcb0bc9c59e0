//! Front matter parsing for content files.
//!
//! Content files may start with a `---`-fenced YAML block:
//!
//! ```text
//! ---
//! title: Quarterly Reports
//! sort_order: 2
//! ---
//! Body text...
//! ```
//!
//! All fields are optional; unknown keys are ignored. A malformed block is a
//! parse error — the caller skips the file rather than guessing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Parsed front matter of a content file.
///
/// When a field is `None`, it was not explicitly set and the page model
/// applies its path-derived default.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontMatter {
    /// Page title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Navigation label (falls back to `title`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav_title: Option<String>,

    /// Page description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Artifact type override (marks the page as a listing page).
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,

    /// Provider query filter, passed through unvalidated.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filter: BTreeMap<String, String>,

    /// Sibling sort key (ascending, default 0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,

    /// Navigation visibility override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_in_nav: Option<bool>,

    /// Access level (`public`, `member`, `premium`, ...). Interpreted only
    /// by the router.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_level: Option<String>,
}

/// Error type for front matter parsing.
#[derive(Debug, thiserror::Error)]
pub enum FrontMatterError {
    /// Opening fence without a closing fence.
    #[error("unterminated front matter block")]
    Unterminated,
    /// YAML parsing error.
    #[error("invalid front matter: {0}")]
    Parse(String),
}

impl FrontMatter {
    /// Split a raw content file into front matter and body.
    ///
    /// A file without an opening `---` fence has no front matter; the whole
    /// input is the body.
    ///
    /// # Errors
    ///
    /// Returns an error if the block is unterminated or the YAML is
    /// malformed.
    pub fn split(raw: &str) -> Result<(Self, &str), FrontMatterError> {
        let Some(rest) = raw.strip_prefix("---\n").or_else(|| raw.strip_prefix("---\r\n")) else {
            return Ok((Self::default(), raw));
        };

        let Some(end) = rest.find("\n---").map(|i| i + 1) else {
            return Err(FrontMatterError::Unterminated);
        };
        let yaml = &rest[..end];
        let body = rest[end + 3..].trim_start_matches(['\r', '\n']);

        let matter = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)
                .map_err(|e| FrontMatterError::Parse(e.to_string()))?
        };

        Ok((matter, body))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_split_no_front_matter() {
        let (matter, body) = FrontMatter::split("# Just a body\n").unwrap();
        assert_eq!(matter, FrontMatter::default());
        assert_eq!(body, "# Just a body\n");
    }

    #[test]
    fn test_split_all_fields() {
        let raw = "---\n\
                   title: Reports\n\
                   nav_title: All Reports\n\
                   description: Quarterly reports\n\
                   artifact_type: report\n\
                   filter:\n\
                   \x20 year: \"2026\"\n\
                   sort_order: 3\n\
                   show_in_nav: false\n\
                   access_level: member\n\
                   ---\n\
                   Body here.\n";
        let (matter, body) = FrontMatter::split(raw).unwrap();

        assert_eq!(matter.title.as_deref(), Some("Reports"));
        assert_eq!(matter.nav_title.as_deref(), Some("All Reports"));
        assert_eq!(matter.description.as_deref(), Some("Quarterly reports"));
        assert_eq!(matter.artifact_type.as_deref(), Some("report"));
        assert_eq!(matter.filter.get("year").map(String::as_str), Some("2026"));
        assert_eq!(matter.sort_order, Some(3));
        assert_eq!(matter.show_in_nav, Some(false));
        assert_eq!(matter.access_level.as_deref(), Some("member"));
        assert_eq!(body, "Body here.\n");
    }

    #[test]
    fn test_split_type_alias() {
        let raw = "---\ntype: book\n---\n";
        let (matter, _) = FrontMatter::split(raw).unwrap();
        assert_eq!(matter.artifact_type.as_deref(), Some("book"));
    }

    #[test]
    fn test_split_empty_block() {
        let raw = "---\n\n---\nBody\n";
        let (matter, body) = FrontMatter::split(raw).unwrap();
        assert_eq!(matter, FrontMatter::default());
        assert_eq!(body, "Body\n");
    }

    #[test]
    fn test_split_unterminated_block() {
        let raw = "---\ntitle: Oops\nno closing fence";
        assert!(matches!(
            FrontMatter::split(raw),
            Err(FrontMatterError::Unterminated)
        ));
    }

    #[test]
    fn test_split_malformed_yaml() {
        let raw = "---\ntitle: [unclosed\n---\nBody";
        assert!(matches!(
            FrontMatter::split(raw),
            Err(FrontMatterError::Parse(_))
        ));
    }

    #[test]
    fn test_split_unknown_keys_ignored() {
        let raw = "---\ntitle: Page\nunknown_key: value\n---\nBody";
        let (matter, _) = FrontMatter::split(raw).unwrap();
        assert_eq!(matter.title.as_deref(), Some("Page"));
    }

    #[test]
    fn test_split_crlf_fences() {
        let raw = "---\r\ntitle: Page\r\n---\r\nBody";
        let (matter, body) = FrontMatter::split(raw).unwrap();
        assert_eq!(matter.title.as_deref(), Some("Page"));
        assert_eq!(body, "Body");
    }
}
