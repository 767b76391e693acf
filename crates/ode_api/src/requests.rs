//! API request types
//!
//! Write endpoints take `application/x-www-form-urlencoded` bodies, so every
//! field arrives as an optional string and is interpreted by the handler.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Body of `POST /tutorials/like/`
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct LikeForm {
    pub token: Option<String>,
    pub tutorial_id: Option<String>,
}

/// Body of `POST /series/bookmark/`
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct BookmarkForm {
    pub token: Option<String>,
    pub series_id: Option<String>,
}

/// Body of `POST /authors/auth/`
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AuthForm {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Body of `POST /blog/new/`
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct NewPostForm {
    pub token: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
    pub thumbnail: Option<String>,
    pub draft: Option<String>,
}

/// Body of `POST /tutorials/new/`
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct NewTutorialForm {
    pub token: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub series_id: Option<String>,
    pub number: Option<String>,
    pub draft: Option<String>,
}

/// Body of `POST /series/new/`
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct NewSeriesForm {
    pub token: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub type_of: Option<String>,
}

/// Body of the delete endpoints, which only need a credential
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TokenForm {
    pub token: Option<String>,
}

/// `?page=` on listing endpoints
///
/// Kept as text so a malformed value never rejects the request; anything that
/// is not a positive integer reads as the first page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PageQuery {
    /// Page number (1-indexed)
    pub page: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1)
    }
}

/// `?name=` on `GET /series/is_available/`
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AvailabilityQuery {
    pub name: Option<String>,
}

/// Read a checkbox-style form value; absent means `false`
pub fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("true" | "on" | "1" | "yes")
    )
}

/// Treat blank form values as absent
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some(" On ")));
        assert!(parse_flag(Some("1")));
        assert!(!parse_flag(Some("false")));
        assert!(!parse_flag(Some("")));
        assert!(!parse_flag(None));
    }

    #[test]
    fn test_page_defaults_to_first() {
        assert_eq!(PageQuery::default().page(), 1);
        let page = |raw: &str| {
            PageQuery {
                page: Some(raw.to_string()),
            }
            .page()
        };
        assert_eq!(page("3"), 3);
        assert_eq!(page(" 2 "), 2);
        assert_eq!(page("0"), 1);
        assert_eq!(page("-1"), 1);
        assert_eq!(page("abc"), 1);
        assert_eq!(page(""), 1);
    }
}
