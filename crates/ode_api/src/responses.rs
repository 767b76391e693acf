//! API response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ode_core::engagement::{ToggleAction, ToggleOutcome};
use ode_core::{Author, Post, Series, SeriesType, Tutorial};

/// Render a timestamp the way every response shows dates, e.g. `05th Mar, 2024`
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%dth %b, %Y").to_string()
}

/// Author as shown in listings: the username stands in for the account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub user: String,
    pub bio: String,
    pub authenticated: bool,
}

impl From<&Author> for AuthorSummary {
    fn from(author: &Author) -> Self {
        Self {
            user: author.username.clone(),
            bio: author.bio.clone(),
            authenticated: author.authenticated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDetail {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub date_joined: String,
}

/// Author with the nested account details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorDetail {
    pub user: UserDetail,
    pub bio: String,
    pub authenticated: bool,
}

impl From<&Author> for AuthorDetail {
    fn from(author: &Author) -> Self {
        Self {
            user: UserDetail {
                id: author.id.value(),
                first_name: author.first_name.clone(),
                last_name: author.last_name.clone(),
                username: author.username.clone(),
                date_joined: format_timestamp(&author.date_joined),
            },
            bio: author.bio.clone(),
            authenticated: author.authenticated,
        }
    }
}

/// Response of `POST /authors/auth/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub author: AuthorDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub timestamp: String,
    pub thumbnail: Option<String>,
    pub author: String,
    /// Number of likes
    pub num_vote_up: u64,
}

impl PostSummary {
    pub fn new(post: &Post, num_vote_up: u64) -> Self {
        Self {
            id: post.id.value(),
            title: post.title.clone(),
            slug: post.slug.clone(),
            description: post.description.clone(),
            timestamp: format_timestamp(&post.timestamp),
            thumbnail: post.thumbnail.clone(),
            author: post.author_username.clone(),
            num_vote_up,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetail {
    pub id: i64,
    pub author: AuthorDetail,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub body: String,
    pub thumbnail: Option<String>,
    pub draft: bool,
    pub uuid: uuid::Uuid,
    pub timestamp: String,
    pub num_vote_up: u64,
}

impl PostDetail {
    pub fn new(post: &Post, author: &Author, num_vote_up: u64) -> Self {
        Self {
            id: post.id.value(),
            author: author.into(),
            title: post.title.clone(),
            slug: post.slug.clone(),
            description: post.description.clone(),
            body: post.body.clone(),
            thumbnail: post.thumbnail.clone(),
            draft: post.draft,
            uuid: post.uuid,
            timestamp: format_timestamp(&post.timestamp),
            num_vote_up,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorialSummary {
    pub id: i64,
    pub timestamp: String,
    pub title: String,
    /// Series name, if the tutorial belongs to one
    pub series: Option<String>,
    pub author: String,
    pub slug: String,
    pub description: String,
    pub draft: bool,
}

impl From<&Tutorial> for TutorialSummary {
    fn from(tutorial: &Tutorial) -> Self {
        Self {
            id: tutorial.id.value(),
            timestamp: format_timestamp(&tutorial.timestamp),
            title: tutorial.title.clone(),
            series: tutorial.series_name.clone(),
            author: tutorial.author_username.clone(),
            slug: tutorial.slug.clone(),
            description: tutorial.description.clone(),
            draft: tutorial.draft,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorialDetail {
    pub id: i64,
    pub author: AuthorDetail,
    pub series: Option<String>,
    pub timestamp: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: String,
    pub draft: bool,
    pub number: i64,
    pub uuid: uuid::Uuid,
    pub likes: u64,
}

impl TutorialDetail {
    pub fn new(tutorial: &Tutorial, author: &Author, likes: u64) -> Self {
        Self {
            id: tutorial.id.value(),
            author: author.into(),
            series: tutorial.series_name.clone(),
            timestamp: format_timestamp(&tutorial.timestamp),
            title: tutorial.title.clone(),
            slug: tutorial.slug.clone(),
            description: tutorial.description.clone(),
            content: tutorial.content.clone(),
            draft: tutorial.draft,
            number: tutorial.number,
            uuid: tutorial.uuid,
            likes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub creator: String,
    pub type_of: SeriesType,
    pub timestamp: String,
    pub tutorial_count: u64,
}

impl From<&Series> for SeriesSummary {
    fn from(series: &Series) -> Self {
        Self {
            id: series.id.value(),
            name: series.name.clone(),
            slug: series.slug.clone(),
            creator: series.creator_username.clone(),
            type_of: series.type_of,
            timestamp: format_timestamp(&series.timestamp),
            tutorial_count: series.tutorial_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesDetail {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub creator: String,
    pub type_of: SeriesType,
    pub description: String,
    pub tutorial_count: u64,
    /// Detail paths of the published tutorials, in series order
    pub tutorials: Vec<String>,
}

impl SeriesDetail {
    pub fn new(series: &Series, tutorials: &[Tutorial]) -> Self {
        Self {
            id: series.id.value(),
            name: series.name.clone(),
            slug: series.slug.clone(),
            creator: series.creator_username.clone(),
            type_of: series.type_of,
            description: series.description.clone(),
            tutorial_count: series.tutorial_count,
            tutorials: tutorials
                .iter()
                .map(|t| format!("/api/tutorials/detail/{}/", t.slug))
                .collect(),
        }
    }
}

/// One entry of `GET /series/names/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesName {
    pub id: i64,
    pub name: String,
}

/// Result of a like toggle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikeResponse {
    pub action: i8,
    pub voted: String,
    pub count: u64,
}

impl From<ToggleOutcome> for LikeResponse {
    fn from(outcome: ToggleOutcome) -> Self {
        let voted = match outcome.action {
            ToggleAction::Engaged => "Liked by user.",
            ToggleAction::Disengaged => "Unliked by user.",
        };
        Self {
            action: outcome.action.value(),
            voted: voted.to_string(),
            count: outcome.count,
        }
    }
}

/// Result of a bookmark toggle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmarkResponse {
    pub action: i8,
    pub bookmarked: String,
    pub count: u64,
}

impl From<ToggleOutcome> for BookmarkResponse {
    fn from(outcome: ToggleOutcome) -> Self {
        let bookmarked = match outcome.action {
            ToggleAction::Engaged => "Bookmarked by user.",
            ToggleAction::Disengaged => "Unbookmarked by user.",
        };
        Self {
            action: outcome.action.value(),
            bookmarked: bookmarked.to_string(),
            count: outcome.count,
        }
    }
}

/// Wrapper for a freshly created resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedResponse<T> {
    pub details: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

/// Everything the calling author owns, drafts included
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorContentResponse {
    pub posts: Vec<PostSummary>,
    pub tutorials: Vec<TutorialSummary>,
    pub series: Vec<SeriesSummary>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_timestamp_format() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();
        assert_eq!(format_timestamp(&ts), "05th Mar, 2024");
    }

    #[test]
    fn test_toggle_bodies() {
        let like = LikeResponse::from(ToggleOutcome {
            action: ToggleAction::Engaged,
            count: 3,
        });
        assert_eq!(
            serde_json::to_value(&like).unwrap(),
            serde_json::json!({"action": 1, "voted": "Liked by user.", "count": 3})
        );

        let bookmark = BookmarkResponse::from(ToggleOutcome {
            action: ToggleAction::Disengaged,
            count: 0,
        });
        assert_eq!(
            serde_json::to_value(&bookmark).unwrap(),
            serde_json::json!({"action": -1, "bookmarked": "Unbookmarked by user.", "count": 0})
        );
    }
}
