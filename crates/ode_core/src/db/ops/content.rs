//! Post, tutorial and series persistence

use surrealdb::RecordId;
use surrealdb::engine::any::Any;
use surrealdb::method::Query;
use uuid::Uuid;

use super::{check_write, next_id, total};
use crate::content::{
    ContentQuery, ContentStore, NewPost, NewSeries, NewTutorial, Post, Series, Tutorial,
};
use crate::db::models::{CountRow, DbPost, DbSeries, DbTutorial, convert_all};
use crate::db::schema::ENGAGEMENT_TABLE;
use crate::db::{DatabaseError, Db, Result};
use crate::engagement::{ContentKind, ContentRef};
use crate::id::{AuthorId, AuthorIdType, IdType, SeriesId, SeriesIdType, TutorialId};
use crate::pagination::{Page, PageRequest};

const AUTHOR: &str = AuthorIdType::PREFIX;
const SERIES: &str = SeriesIdType::PREFIX;

/// Projection for each content table, with the owner's username joined in
fn projection(kind: ContentKind) -> String {
    match kind {
        ContentKind::Post => "*, author.username AS author_username".to_string(),
        ContentKind::Tutorial => {
            "*, author.username AS author_username, series.name AS series_name".to_string()
        }
        ContentKind::Series => format!(
            "*, creator.username AS creator_username, \
             count((SELECT VALUE id FROM {} WHERE series = $parent.id AND draft = false)) AS tutorial_count",
            ContentKind::Tutorial.as_str()
        ),
    }
}

/// `WHERE` clause for a listing; every placeholder it uses is bound by [`bind_filter`]
fn where_clause(kind: ContentKind, query: &ContentQuery) -> String {
    let mut conditions: Vec<String> = Vec::new();

    match kind {
        ContentKind::Post | ContentKind::Tutorial => {
            if !query.include_drafts {
                conditions.push("draft = false".to_string());
            }
            if query.author.is_some() {
                conditions.push(format!("author = type::thing('{}', $author)", AUTHOR));
            }
            if kind == ContentKind::Tutorial && query.series.is_some() {
                conditions.push(format!("series = type::thing('{}', $series)", SERIES));
            }
        }
        ContentKind::Series => {
            if query.author.is_some() {
                conditions.push(format!("creator = type::thing('{}', $author)", AUTHOR));
            }
            if query.series_type.is_some() {
                conditions.push("type_of = $type_of".to_string());
            }
        }
    }

    if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    }
}

fn bind_filter<'r>(mut q: Query<'r, Any>, query: &ContentQuery) -> Query<'r, Any> {
    if let Some(author) = query.author {
        q = q.bind(("author", author.value()));
    }
    if let Some(series) = query.series {
        q = q.bind(("series", series.value()));
    }
    if let Some(series_type) = query.series_type {
        q = q.bind(("type_of", series_type.as_str()));
    }
    q
}

async fn list<D, T>(
    db: &Db,
    kind: ContentKind,
    query: &ContentQuery,
    page: PageRequest,
) -> Result<Page<T>>
where
    D: serde::de::DeserializeOwned,
    T: TryFrom<D, Error = DatabaseError>,
{
    let filter = where_clause(kind, query);
    let sql = format!(
        "SELECT count() AS total FROM {t}{filter} GROUP ALL;
         SELECT {fields} FROM {t}{filter} ORDER BY {order} LIMIT $limit START $start;",
        t = kind.as_str(),
        fields = projection(kind),
        order = query.order.as_sql(),
    );

    let mut response = bind_filter(db.query(sql), query)
        .bind(("limit", page.size()))
        .bind(("start", page.offset()))
        .await
        .map_err(DatabaseError::QueryFailed)?;

    let counts: Vec<CountRow> = response.take(0).map_err(DatabaseError::QueryFailed)?;
    let rows: Vec<D> = response.take(1).map_err(DatabaseError::QueryFailed)?;

    Ok(Page::new(total(counts), convert_all(rows)?))
}

async fn by_slug<D, T>(db: &Db, kind: ContentKind, slug: &str, include_drafts: bool) -> Result<Option<T>>
where
    D: serde::de::DeserializeOwned,
    T: TryFrom<D, Error = DatabaseError>,
{
    let draft_filter = if include_drafts || kind == ContentKind::Series {
        ""
    } else {
        " AND draft = false"
    };
    let rows: Vec<D> = db
        .query(format!(
            "SELECT {} FROM {} WHERE slug = $slug{} LIMIT 1",
            projection(kind),
            kind.as_str(),
            draft_filter
        ))
        .bind(("slug", slug.to_string()))
        .await
        .map_err(DatabaseError::QueryFailed)?
        .take(0)
        .map_err(DatabaseError::QueryFailed)?;

    rows.into_iter().next().map(T::try_from).transpose()
}

/// Read back the record selected by the second statement of a `CREATE; SELECT` pair
fn fetch_created<D, T>(
    response: surrealdb::Response,
    kind: ContentKind,
    slug: &str,
) -> Result<T>
where
    D: serde::de::DeserializeOwned,
    T: TryFrom<D, Error = DatabaseError>,
{
    let mut response = check_write(response, format!("{} {}", kind, slug))?;
    let rows: Vec<D> = response.take(1).map_err(DatabaseError::QueryFailed)?;

    rows.into_iter()
        .next()
        .map(T::try_from)
        .transpose()?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: format!("{} {}", kind, slug),
        })
}

impl ContentStore for Db {
    async fn content_exists(&self, content: ContentRef) -> Result<bool> {
        let ids: Vec<RecordId> = self
            .query("SELECT VALUE id FROM type::thing($table, $id)")
            .bind(("table", content.kind.as_str()))
            .bind(("id", content.id))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;

        Ok(!ids.is_empty())
    }

    async fn slug_taken(&self, kind: ContentKind, slug: &str) -> Result<bool> {
        let counts: Vec<CountRow> = self
            .query(format!(
                "SELECT count() AS total FROM {} WHERE slug = $slug GROUP ALL",
                kind.as_str()
            ))
            .bind(("slug", slug.to_string()))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;

        Ok(total(counts) > 0)
    }

    async fn insert_post(&self, author: AuthorId, post: &NewPost, slug: &str) -> Result<Post> {
        let kind = ContentKind::Post;
        let id = next_id(self, kind.as_str()).await?;

        let mut fields = vec![
            "title = $title",
            "slug = $slug",
            "body = $body",
            "description = $description",
            "draft = $draft",
            "uuid = $uuid",
            "timestamp = time::now()",
        ];
        if post.thumbnail.is_some() {
            fields.push("thumbnail = $thumbnail");
        }
        let sql = format!(
            "CREATE type::thing('{t}', $id) SET {fields}, author = type::thing('{a}', $author);
             SELECT {projection} FROM type::thing('{t}', $id);",
            t = kind.as_str(),
            a = AUTHOR,
            fields = fields.join(", "),
            projection = projection(kind),
        );

        let mut q = self
            .query(sql)
            .bind(("id", id))
            .bind(("author", author.value()))
            .bind(("title", post.title.clone()))
            .bind(("slug", slug.to_string()))
            .bind(("body", post.body.clone()))
            .bind(("description", post.description.clone()))
            .bind(("draft", post.draft))
            .bind(("uuid", Uuid::new_v4().to_string()));
        if let Some(thumbnail) = &post.thumbnail {
            q = q.bind(("thumbnail", thumbnail.clone()));
        }

        let response = q.await.map_err(DatabaseError::QueryFailed)?;
        fetch_created::<DbPost, Post>(response, kind, slug)
    }

    async fn get_post(&self, slug: &str, include_drafts: bool) -> Result<Option<Post>> {
        by_slug::<DbPost, Post>(self, ContentKind::Post, slug, include_drafts).await
    }

    async fn list_posts(&self, query: &ContentQuery, page: PageRequest) -> Result<Page<Post>> {
        list::<DbPost, Post>(self, ContentKind::Post, query, page).await
    }

    async fn insert_tutorial(
        &self,
        author: AuthorId,
        tutorial: &NewTutorial,
        slug: &str,
    ) -> Result<Tutorial> {
        let kind = ContentKind::Tutorial;
        let id = next_id(self, kind.as_str()).await?;

        let series = match tutorial.series_id {
            Some(_) => format!(", series = type::thing('{}', $series)", SERIES),
            None => String::new(),
        };
        let sql = format!(
            "CREATE type::thing('{t}', $id) SET
                title = $title,
                slug = $slug,
                content = $content,
                description = $description,
                draft = $draft,
                number = $number,
                uuid = $uuid,
                timestamp = time::now(),
                author = type::thing('{a}', $author){series};
             SELECT {projection} FROM type::thing('{t}', $id);",
            t = kind.as_str(),
            a = AUTHOR,
            projection = projection(kind),
        );

        let mut q = self
            .query(sql)
            .bind(("id", id))
            .bind(("author", author.value()))
            .bind(("title", tutorial.title.clone()))
            .bind(("slug", slug.to_string()))
            .bind(("content", tutorial.content.clone()))
            .bind(("description", tutorial.description.clone()))
            .bind(("draft", tutorial.draft))
            .bind(("number", tutorial.number))
            .bind(("uuid", Uuid::new_v4().to_string()));
        if let Some(series) = tutorial.series_id {
            q = q.bind(("series", series.value()));
        }

        let response = q.await.map_err(DatabaseError::QueryFailed)?;
        fetch_created::<DbTutorial, Tutorial>(response, kind, slug)
    }

    async fn get_tutorial(&self, slug: &str, include_drafts: bool) -> Result<Option<Tutorial>> {
        by_slug::<DbTutorial, Tutorial>(self, ContentKind::Tutorial, slug, include_drafts).await
    }

    async fn list_tutorials(
        &self,
        query: &ContentQuery,
        page: PageRequest,
    ) -> Result<Page<Tutorial>> {
        list::<DbTutorial, Tutorial>(self, ContentKind::Tutorial, query, page).await
    }

    async fn delete_tutorial(&self, id: TutorialId) -> Result<()> {
        let response = self
            .query(format!(
                "BEGIN TRANSACTION;
                 DELETE {e} WHERE content_kind = 'tutorial' AND content_id = $id;
                 DELETE type::thing('{t}', $id);
                 COMMIT TRANSACTION;",
                e = ENGAGEMENT_TABLE,
                t = ContentKind::Tutorial.as_str(),
            ))
            .bind(("id", id.value()))
            .await
            .map_err(DatabaseError::QueryFailed)?;
        check_write(response, format!("{:?}", id))?;
        Ok(())
    }

    async fn insert_series(
        &self,
        creator: AuthorId,
        series: &NewSeries,
        slug: &str,
    ) -> Result<Series> {
        let kind = ContentKind::Series;
        let id = next_id(self, kind.as_str()).await?;

        let sql = format!(
            "CREATE type::thing('{t}', $id) SET
                name = $name,
                slug = $slug,
                description = $description,
                type_of = $type_of,
                timestamp = time::now(),
                creator = type::thing('{a}', $creator);
             SELECT {projection} FROM type::thing('{t}', $id);",
            t = kind.as_str(),
            a = AUTHOR,
            projection = projection(kind),
        );

        let response = self
            .query(sql)
            .bind(("id", id))
            .bind(("creator", creator.value()))
            .bind(("name", series.name.clone()))
            .bind(("slug", slug.to_string()))
            .bind(("description", series.description.clone()))
            .bind(("type_of", series.type_of.as_str()))
            .await
            .map_err(DatabaseError::QueryFailed)?;
        fetch_created::<DbSeries, Series>(response, kind, slug)
    }

    async fn get_series(&self, slug: &str) -> Result<Option<Series>> {
        by_slug::<DbSeries, Series>(self, ContentKind::Series, slug, true).await
    }

    async fn list_series(&self, query: &ContentQuery, page: PageRequest) -> Result<Page<Series>> {
        list::<DbSeries, Series>(self, ContentKind::Series, query, page).await
    }

    async fn series_names(&self) -> Result<Vec<(SeriesId, String)>> {
        #[derive(serde::Deserialize)]
        struct NameRow {
            id: RecordId,
            name: String,
        }

        let rows: Vec<NameRow> = self
            .query(format!(
                "SELECT id, name, timestamp FROM {} ORDER BY timestamp DESC, id DESC",
                SERIES
            ))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;

        rows.into_iter()
            .map(|row| {
                let id = SeriesId::from_record(&row.id)
                    .map_err(|e| DatabaseError::Other(e.to_string()))?;
                Ok((id, row.name))
            })
            .collect()
    }

    async fn delete_series(&self, id: SeriesId) -> Result<()> {
        let response = self
            .query(format!(
                "BEGIN TRANSACTION;
                 LET $tutorials = (SELECT VALUE record::id(id) FROM {t} WHERE series = type::thing('{s}', $id));
                 DELETE {e} WHERE (content_kind = 'tutorial' AND content_id IN $tutorials)
                     OR (content_kind = 'series' AND content_id = $id);
                 DELETE {t} WHERE series = type::thing('{s}', $id);
                 DELETE type::thing('{s}', $id);
                 COMMIT TRANSACTION;",
                t = ContentKind::Tutorial.as_str(),
                s = SERIES,
                e = ENGAGEMENT_TABLE,
            ))
            .bind(("id", id.value()))
            .await
            .map_err(DatabaseError::QueryFailed)?;
        check_write(response, format!("{:?}", id))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ListOrder, SeriesType};
    use crate::db::client;
    use crate::author::{AuthorStore, NewAuthor};
    use pretty_assertions::assert_eq;

    fn where_sql(kind: ContentKind, query: ContentQuery) -> String {
        where_clause(kind, &query)
    }

    #[test]
    fn test_where_clause_shapes() {
        assert_eq!(
            where_sql(ContentKind::Post, ContentQuery::published()),
            " WHERE draft = false"
        );
        assert_eq!(
            where_sql(ContentKind::Post, ContentQuery::published().with_drafts()),
            ""
        );
        assert_eq!(
            where_sql(
                ContentKind::Tutorial,
                ContentQuery::published().in_series(SeriesId::new(3))
            ),
            " WHERE draft = false AND series = type::thing('series', $series)"
        );
        assert_eq!(
            where_sql(
                ContentKind::Series,
                ContentQuery::published()
                    .by_author(AuthorId::new(1))
                    .of_type(SeriesType::Design)
            ),
            " WHERE creator = type::thing('author', $author) AND type_of = $type_of"
        );
    }

    async fn seed_author(db: &Db) -> AuthorId {
        let (author, _) = db
            .create_author(NewAuthor::new("ada", "$argon2id$fake"))
            .await
            .unwrap();
        author.id
    }

    fn post(title: &str, draft: bool) -> NewPost {
        NewPost {
            title: title.into(),
            description: "d".into(),
            body: "b".into(),
            thumbnail: None,
            draft,
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch_post() {
        let db = client::create_test_db().await.unwrap();
        let author = seed_author(&db).await;

        let created = db.insert_post(author, &post("Hello", false), "hello").await.unwrap();
        assert_eq!(created.author_username, "ada");
        assert_eq!(created.slug, "hello");
        assert!(db.content_exists(created.id.into()).await.unwrap());

        let fetched = db.get_post("hello", false).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflicts() {
        let db = client::create_test_db().await.unwrap();
        let author = seed_author(&db).await;

        db.insert_post(author, &post("Hello", false), "hello").await.unwrap();
        let err = db
            .insert_post(author, &post("Hello", false), "hello")
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert!(db.slug_taken(ContentKind::Post, "hello").await.unwrap());
    }

    #[tokio::test]
    async fn test_listing_hides_drafts_and_pages() {
        let db = client::create_test_db().await.unwrap();
        let author = seed_author(&db).await;

        for i in 0..5 {
            db.insert_post(author, &post(&format!("Post {}", i), false), &format!("post-{}", i))
                .await
                .unwrap();
        }
        db.insert_post(author, &post("Draft", true), "draft").await.unwrap();

        let query = ContentQuery::published();
        let first = db.list_posts(&query, PageRequest::new(1, 2)).await.unwrap();
        assert_eq!(first.count, 5);
        let slugs: Vec<_> = first.results.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["post-4", "post-3"]);

        let last = db.list_posts(&query, PageRequest::new(3, 2)).await.unwrap();
        assert_eq!(last.results.len(), 1);

        let beyond = db.list_posts(&query, PageRequest::new(9, 2)).await.unwrap();
        assert_eq!(beyond.count, 5);
        assert!(beyond.results.is_empty());

        let mine = db
            .list_posts(
                &ContentQuery::published().by_author(author).with_drafts(),
                PageRequest::new(1, 12),
            )
            .await
            .unwrap();
        assert_eq!(mine.count, 6);
        assert!(db.get_post("draft", false).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_series_counts_published_tutorials() {
        let db = client::create_test_db().await.unwrap();
        let author = seed_author(&db).await;

        let series = db
            .insert_series(
                author,
                &NewSeries {
                    name: "Rust".into(),
                    description: "All about Rust".into(),
                    type_of: SeriesType::Language,
                },
                "rust",
            )
            .await
            .unwrap();
        assert_eq!(series.tutorial_count, 0);

        for (slug, draft) in [("one", false), ("two", false), ("three", true)] {
            db.insert_tutorial(
                author,
                &NewTutorial {
                    title: slug.into(),
                    description: "d".into(),
                    content: "c".into(),
                    series_id: Some(series.id),
                    draft,
                    ..Default::default()
                },
                slug,
            )
            .await
            .unwrap();
        }

        let series = db.get_series("rust").await.unwrap().unwrap();
        assert_eq!(series.tutorial_count, 2);

        let tutorials = db
            .list_tutorials(
                &ContentQuery::published()
                    .in_series(series.id)
                    .ordered(ListOrder::IdAsc),
                PageRequest::new(1, 12),
            )
            .await
            .unwrap();
        assert_eq!(tutorials.count, 2);
        assert_eq!(tutorials.results[0].slug, "one");
        assert_eq!(tutorials.results[0].series_name.as_deref(), Some("Rust"));

        let names = db.series_names().await.unwrap();
        assert_eq!(names, vec![(series.id, "Rust".to_string())]);

        db.delete_series(series.id).await.unwrap();
        assert!(db.get_series("rust").await.unwrap().is_none());
        assert!(db.get_tutorial("one", true).await.unwrap().is_none());
    }
}
