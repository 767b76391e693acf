//! Posts, tutorials and series

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::author::Author;
use crate::db;
use crate::engagement::{ContentKind, ContentRef};
use crate::error::{CoreError, Result};
use crate::id::{AuthorId, PostId, SeriesId, TutorialId};
use crate::pagination::{Page, PageRequest};
use crate::slug::slugify;

const TITLE_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 250;
const SERIES_NAME_MAX: usize = 160;
const SERIES_DESCRIPTION_MAX: usize = 300;
const TUTORIAL_NUMBER_MAX: i64 = 32767;

/// Number of tutorials shown on the "recent" listing
pub const RECENT_TUTORIALS: u32 = 12;

/// Subject area of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesType {
    Design,
    Language,
    Algorithms,
    Technology,
    Miscellaneous,
    DataStructures,
}

impl SeriesType {
    pub const ALL: [SeriesType; 6] = [
        SeriesType::Design,
        SeriesType::Language,
        SeriesType::Algorithms,
        SeriesType::Technology,
        SeriesType::Miscellaneous,
        SeriesType::DataStructures,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesType::Design => "design",
            SeriesType::Language => "language",
            SeriesType::Algorithms => "algorithms",
            SeriesType::Technology => "technology",
            SeriesType::Miscellaneous => "miscellaneous",
            SeriesType::DataStructures => "data_structures",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SeriesType::Design => "Design",
            SeriesType::Language => "Language",
            SeriesType::Algorithms => "Algorithms",
            SeriesType::Technology => "Technology",
            SeriesType::Miscellaneous => "Miscellaneous",
            SeriesType::DataStructures => "Data Structures",
        }
    }
}

impl fmt::Display for SeriesType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeriesType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        SeriesType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                CoreError::validation(
                    "type_of",
                    format!(
                        "'{}' is not one of {}",
                        s,
                        SeriesType::ALL.map(|t| t.as_str()).join(", ")
                    ),
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub draft: bool,
    pub uuid: Uuid,
    pub timestamp: DateTime<Utc>,
    pub author_id: AuthorId,
    pub author_username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tutorial {
    pub id: TutorialId,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub description: String,
    pub draft: bool,
    /// Position inside its series
    pub number: i64,
    pub uuid: Uuid,
    pub timestamp: DateTime<Utc>,
    pub series_id: Option<SeriesId>,
    pub series_name: Option<String>,
    pub author_id: AuthorId,
    pub author_username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: SeriesId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub type_of: SeriesType,
    pub timestamp: DateTime<Utc>,
    pub creator_id: AuthorId,
    pub creator_username: String,
    /// Published tutorials in the series
    pub tutorial_count: u64,
}

#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub description: String,
    pub body: String,
    pub thumbnail: Option<String>,
    pub draft: bool,
}

#[derive(Debug, Clone)]
pub struct NewTutorial {
    pub title: String,
    pub description: String,
    pub content: String,
    pub series_id: Option<SeriesId>,
    pub number: i64,
    pub draft: bool,
}

impl Default for NewTutorial {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            content: String::new(),
            series_id: None,
            number: 1,
            draft: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewSeries {
    pub name: String,
    pub description: String,
    pub type_of: SeriesType,
}

fn require_text(field: &str, value: &str, max: Option<usize>) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CoreError::validation(field, "may not be blank"));
    }
    if let Some(max) = max {
        if value.chars().count() > max {
            return Err(CoreError::validation(
                field,
                format!("must be at most {} characters", max),
            ));
        }
    }
    Ok(())
}

impl NewPost {
    pub fn validate(&self) -> Result<()> {
        require_text("title", &self.title, Some(TITLE_MAX))?;
        require_text("description", &self.description, Some(DESCRIPTION_MAX))?;
        require_text("body", &self.body, None)?;
        if let Some(thumbnail) = &self.thumbnail {
            if !(thumbnail.starts_with("http://") || thumbnail.starts_with("https://")) {
                return Err(CoreError::validation("thumbnail", "must be an http(s) URL"));
            }
        }
        Ok(())
    }
}

impl NewTutorial {
    pub fn validate(&self) -> Result<()> {
        require_text("title", &self.title, Some(TITLE_MAX))?;
        require_text("description", &self.description, Some(DESCRIPTION_MAX))?;
        require_text("content", &self.content, None)?;
        if self.number < 1 || self.number > TUTORIAL_NUMBER_MAX {
            return Err(CoreError::validation(
                "number",
                format!("must be between 1 and {}", TUTORIAL_NUMBER_MAX),
            ));
        }
        Ok(())
    }
}

impl NewSeries {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name, Some(SERIES_NAME_MAX))?;
        require_text(
            "description",
            &self.description,
            Some(SERIES_DESCRIPTION_MAX),
        )?;
        Ok(())
    }
}

/// Ordering of a content listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListOrder {
    /// `timestamp DESC, id DESC`
    #[default]
    Newest,
    /// Most recently created id first
    IdDesc,
    /// Creation order
    IdAsc,
    /// Reading order inside a series
    InSeries,
}

impl ListOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ListOrder::Newest => "timestamp DESC, id DESC",
            ListOrder::IdDesc => "id DESC",
            ListOrder::IdAsc => "id ASC",
            ListOrder::InSeries => "number ASC, id ASC",
        }
    }
}

/// Filters for a content listing; the default lists published items only
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentQuery {
    pub author: Option<AuthorId>,
    pub include_drafts: bool,
    pub series: Option<SeriesId>,
    pub series_type: Option<SeriesType>,
    pub order: ListOrder,
}

impl ContentQuery {
    pub fn published() -> Self {
        Self::default()
    }

    pub fn by_author(mut self, author: AuthorId) -> Self {
        self.author = Some(author);
        self
    }

    pub fn with_drafts(mut self) -> Self {
        self.include_drafts = true;
        self
    }

    pub fn in_series(mut self, series: SeriesId) -> Self {
        self.series = Some(series);
        self
    }

    pub fn of_type(mut self, series_type: SeriesType) -> Self {
        self.series_type = Some(series_type);
        self
    }

    pub fn ordered(mut self, order: ListOrder) -> Self {
        self.order = order;
        self
    }
}

/// Content persistence
///
/// Inserts take the slug separately so callers decide how it is derived;
/// a clashing slug fails with [`db::DatabaseError::Conflict`].
pub trait ContentStore {
    fn content_exists(&self, content: ContentRef) -> impl Future<Output = db::Result<bool>> + Send;

    fn slug_taken(
        &self,
        kind: ContentKind,
        slug: &str,
    ) -> impl Future<Output = db::Result<bool>> + Send;

    fn insert_post(
        &self,
        author: AuthorId,
        post: &NewPost,
        slug: &str,
    ) -> impl Future<Output = db::Result<Post>> + Send;

    fn get_post(
        &self,
        slug: &str,
        include_drafts: bool,
    ) -> impl Future<Output = db::Result<Option<Post>>> + Send;

    fn list_posts(
        &self,
        query: &ContentQuery,
        page: PageRequest,
    ) -> impl Future<Output = db::Result<Page<Post>>> + Send;

    fn insert_tutorial(
        &self,
        author: AuthorId,
        tutorial: &NewTutorial,
        slug: &str,
    ) -> impl Future<Output = db::Result<Tutorial>> + Send;

    fn get_tutorial(
        &self,
        slug: &str,
        include_drafts: bool,
    ) -> impl Future<Output = db::Result<Option<Tutorial>>> + Send;

    fn list_tutorials(
        &self,
        query: &ContentQuery,
        page: PageRequest,
    ) -> impl Future<Output = db::Result<Page<Tutorial>>> + Send;

    /// Deletes the tutorial and every engagement pointing at it
    fn delete_tutorial(&self, id: TutorialId) -> impl Future<Output = db::Result<()>> + Send;

    fn insert_series(
        &self,
        creator: AuthorId,
        series: &NewSeries,
        slug: &str,
    ) -> impl Future<Output = db::Result<Series>> + Send;

    fn get_series(&self, slug: &str) -> impl Future<Output = db::Result<Option<Series>>> + Send;

    fn list_series(
        &self,
        query: &ContentQuery,
        page: PageRequest,
    ) -> impl Future<Output = db::Result<Page<Series>>> + Send;

    /// Every series as `(id, name)`, newest first
    fn series_names(&self) -> impl Future<Output = db::Result<Vec<(SeriesId, String)>>> + Send;

    /// Deletes the series, its tutorials and every engagement pointing at them
    fn delete_series(&self, id: SeriesId) -> impl Future<Output = db::Result<()>> + Send;
}

fn slug_for(kind: ContentKind, title: &str) -> Result<String> {
    let slug = slugify(title);
    if slug.is_empty() {
        let field = if kind == ContentKind::Series { "name" } else { "title" };
        return Err(CoreError::validation(
            field,
            "must contain at least one letter or digit",
        ));
    }
    Ok(slug)
}

fn slug_conflict(kind: ContentKind, slug: String) -> impl FnOnce(db::DatabaseError) -> CoreError {
    move |e| {
        if e.is_conflict() {
            CoreError::DuplicateSlug { kind, slug }
        } else {
            e.into()
        }
    }
}

/// Validate and store a new blog post
pub async fn publish_post<S: ContentStore>(store: &S, author: &Author, post: NewPost) -> Result<Post> {
    post.validate()?;
    let slug = slug_for(ContentKind::Post, &post.title)?;

    let post = store
        .insert_post(author.id, &post, &slug)
        .await
        .map_err(slug_conflict(ContentKind::Post, slug))?;
    tracing::info!("{} published post {}", author.username, post.slug);
    Ok(post)
}

/// Validate and store a new tutorial
pub async fn publish_tutorial<S: ContentStore>(
    store: &S,
    author: &Author,
    tutorial: NewTutorial,
) -> Result<Tutorial> {
    tutorial.validate()?;
    let slug = slug_for(ContentKind::Tutorial, &tutorial.title)?;

    if let Some(series) = tutorial.series_id {
        if !store.content_exists(series.into()).await? {
            return Err(CoreError::validation(
                "series_id",
                format!("series {} does not exist", series),
            ));
        }
    }

    let tutorial = store
        .insert_tutorial(author.id, &tutorial, &slug)
        .await
        .map_err(slug_conflict(ContentKind::Tutorial, slug))?;
    tracing::info!("{} published tutorial {}", author.username, tutorial.slug);
    Ok(tutorial)
}

/// Validate and store a new series
pub async fn create_series<S: ContentStore>(
    store: &S,
    creator: &Author,
    series: NewSeries,
) -> Result<Series> {
    series.validate()?;
    let slug = slug_for(ContentKind::Series, &series.name)?;

    let series = store
        .insert_series(creator.id, &series, &slug)
        .await
        .map_err(slug_conflict(ContentKind::Series, slug))?;
    tracing::info!("{} created series {}", creator.username, series.slug);
    Ok(series)
}

/// Whether a series called `name` could be created
pub async fn series_name_available<S: ContentStore>(store: &S, name: &str) -> Result<bool> {
    let slug = slugify(name);
    if slug.is_empty() {
        return Ok(false);
    }
    Ok(!store.slug_taken(ContentKind::Series, &slug).await?)
}

/// Delete a tutorial owned by `author`
pub async fn remove_tutorial<S: ContentStore>(store: &S, author: &Author, slug: &str) -> Result<()> {
    let tutorial = store
        .get_tutorial(slug, true)
        .await?
        .ok_or_else(|| CoreError::content_not_found(ContentKind::Tutorial, slug))?;

    if tutorial.author_id != author.id {
        return Err(CoreError::Forbidden {
            username: author.username.clone(),
            action: format!("delete tutorial '{}'", slug),
        });
    }

    store.delete_tutorial(tutorial.id).await?;
    tracing::info!("{} deleted tutorial {}", author.username, slug);
    Ok(())
}

/// Delete a series created by `author`, together with its tutorials
pub async fn remove_series<S: ContentStore>(store: &S, author: &Author, slug: &str) -> Result<()> {
    let series = store
        .get_series(slug)
        .await?
        .ok_or_else(|| CoreError::content_not_found(ContentKind::Series, slug))?;

    if series.creator_id != author.id {
        return Err(CoreError::Forbidden {
            username: author.username.clone(),
            action: format!("delete series '{}'", slug),
        });
    }

    store.delete_series(series.id).await?;
    tracing::info!("{} deleted series {}", author.username, slug);
    Ok(())
}
