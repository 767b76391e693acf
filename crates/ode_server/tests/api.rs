use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use ode_core::author::{Author, NewAuthor, Token, register_author};
use ode_core::content::{
    NewPost, NewSeries, NewTutorial, SeriesType, Tutorial, create_series, publish_post,
    publish_tutorial,
};
use ode_core::db::{Db, client};
use ode_core::engagement::{EngagementKind, EngagementStore};
use ode_server::auth::hash_password;
use ode_server::{AppState, ServerConfig, build_router};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;

struct Fixture {
    db: Db,
    author: Author,
    token: Token,
    tutorial: Tutorial,
}

impl Fixture {
    async fn new() -> Self {
        let db = client::create_test_db().await.unwrap();
        let hash = hash_password("difference engine").unwrap();
        let (author, token) = register_author(&db, NewAuthor::new("ada", hash))
            .await
            .unwrap();

        let tutorial = publish_tutorial(
            &db,
            &author,
            NewTutorial {
                title: "Note G".into(),
                description: "Bernoulli numbers".into(),
                content: "...".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        Self {
            db,
            author,
            token,
            tutorial,
        }
    }

    fn app(&self) -> Router {
        build_router(AppState::with_db(ServerConfig::default(), self.db.clone()))
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }
}

fn form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_as(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Token {}", token))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_like_then_unlike() {
    let fx = Fixture::new().await;
    let body = format!("token={}&tutorial_id={}", fx.token.key, fx.tutorial.id.value());

    let (status, liked) = fx.send(form("/api/tutorials/like/", &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        liked,
        json!({"action": 1, "voted": "Liked by user.", "count": 1})
    );

    let (status, unliked) = fx.send(form("/api/tutorials/like/", &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        unliked,
        json!({"action": -1, "voted": "Unliked by user.", "count": 0})
    );
}

#[tokio::test]
async fn test_like_through_session_header() {
    let fx = Fixture::new().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/tutorials/like/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::AUTHORIZATION, format!("Token {}", fx.token.key))
        .body(Body::from(format!("tutorial_id={}", fx.tutorial.id.value())))
        .unwrap();

    let (status, body) = fx.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], json!(1));

    let (_, liked) = fx
        .send(get_as("/api/authors/liked/tutorials/", &fx.token.key))
        .await;
    assert_eq!(liked, json!([fx.tutorial.id.value()]));
}

#[tokio::test]
async fn test_like_rejections() {
    let fx = Fixture::new().await;

    let (status, body) = fx
        .send(form("/api/tutorials/like/", "tutorial_id=1"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Unauthorized to view response."}));

    let (status, body) = fx
        .send(form(
            "/api/tutorials/like/",
            &format!("token={}", fx.token.key),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Tutorial id not provided."}));

    let expected = json!({"error": "Invalid auth token provided or tutorial does not exist."});
    for body in [
        format!("token={}&tutorial_id=999", fx.token.key),
        format!("token={}&tutorial_id=abc", fx.token.key),
        format!("token=nobody&tutorial_id={}", fx.tutorial.id.value()),
    ] {
        let (status, response) = fx.send(form("/api/tutorials/like/", &body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(response, expected);
    }

    // An empty body is an empty form, not a parse failure
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/tutorials/like/")
        .body(Body::empty())
        .unwrap();
    let (status, body) = fx.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Unauthorized to view response."}));
}

#[tokio::test]
async fn test_get_on_toggles_is_not_allowed() {
    let fx = Fixture::new().await;

    let (status, body) = fx.send(get("/api/tutorials/like/")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        body,
        json!({"detail": "Method \"GET\" not allowed. Provide a token and a tutorial id number."})
    );

    let (status, body) = fx.send(get("/api/series/bookmark/")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        body,
        json!({"detail": "Method \"GET\" not allowed. Provide a token and a series id number."})
    );
}

#[tokio::test]
async fn test_bookmark_series() {
    let fx = Fixture::new().await;
    let series = create_series(
        &fx.db,
        &fx.author,
        NewSeries {
            name: "Engines".into(),
            description: "Analytical ones".into(),
            type_of: SeriesType::Technology,
        },
    )
    .await
    .unwrap();
    let body = format!("token={}&series_id={}", fx.token.key, series.id.value());

    let (status, response) = fx.send(form("/api/series/bookmark/", &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        response,
        json!({"action": 1, "bookmarked": "Bookmarked by user.", "count": 1})
    );

    let (_, ids) = fx
        .send(get_as("/api/authors/bookmarked/series/", &fx.token.key))
        .await;
    assert_eq!(ids, json!([series.id.value()]));

    let (_, response) = fx.send(form("/api/series/bookmark/", &body)).await;
    assert_eq!(response["action"], json!(-1));
    assert_eq!(response["count"], json!(0));
}

#[tokio::test]
async fn test_page_beyond_last_is_empty() {
    let fx = Fixture::new().await;
    for title in ["First", "Second"] {
        publish_post(
            &fx.db,
            &fx.author,
            NewPost {
                title: title.into(),
                description: "d".into(),
                body: "b".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    let (status, body) = fx.send(get("/api/blog/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(2));
    assert_eq!(body["results"][0]["title"], json!("Second"));

    let (status, body) = fx.send(get("/api/blog/?page=9")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"count": 2, "results": []}));
}

#[tokio::test]
async fn test_malformed_page_reads_as_first() {
    let fx = Fixture::new().await;
    publish_post(
        &fx.db,
        &fx.author,
        NewPost {
            title: "Only".into(),
            description: "d".into(),
            body: "b".into(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    for query in ["abc", "-1", "0", ""] {
        let (status, body) = fx.send(get(&format!("/api/blog/?page={}", query))).await;
        assert_eq!(status, StatusCode::OK, "page={}", query);
        assert_eq!(body["count"], json!(1));
        assert_eq!(body["results"][0]["title"], json!("Only"));
    }

    let (status, body) = fx.send(get("/api/series/?page=two")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"count": 0, "results": []}));
}

#[tokio::test]
async fn test_login() {
    let fx = Fixture::new().await;

    let (status, body) = fx
        .send(form(
            "/api/authors/auth/",
            "username=ada&password=difference+engine",
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token"], json!(fx.token.key));
    assert_eq!(body["author"]["user"]["username"], json!("ada"));

    let (status, body) = fx
        .send(form("/api/authors/auth/", "username=ada&password=nope"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Invalid credentials."}));

    let (status, body) = fx.send(form("/api/authors/auth/", "username=ada")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, json!({"error": "Password not provided."}));
}

#[tokio::test]
async fn test_author_listing_is_staff_only() {
    let fx = Fixture::new().await;

    let (status, _) = fx.send(get("/api/authors/")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = fx.send(get_as("/api/authors/", &fx.token.key)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body,
        json!({"error": "You do not have permission to perform this action."})
    );

    let (_, staff_token) = register_author(
        &fx.db,
        NewAuthor {
            is_staff: true,
            ..NewAuthor::new("charles", "$argon2id$fake")
        },
    )
    .await
    .unwrap();
    let (status, body) = fx.send(get_as("/api/authors/", &staff_token.key)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(2));
}

#[tokio::test]
async fn test_unknown_content_is_not_found() {
    let fx = Fixture::new().await;

    let (status, _) = fx.send(get("/api/tutorials/detail/no-such-thing/")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = fx.send(get("/api/authors/detail/nobody/posts/")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = fx.send(get("/api/authors/detail/ada/posts/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"count": 0, "results": []}));
}

#[tokio::test]
async fn test_only_the_owner_deletes() {
    let fx = Fixture::new().await;
    let (_, other) = register_author(&fx.db, NewAuthor::new("charles", "$argon2id$fake"))
        .await
        .unwrap();
    let uri = format!("/api/tutorials/delete/{}/", fx.tutorial.slug);

    let (status, _) = fx
        .send(form(&uri, &format!("token={}", other.key)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = fx
        .send(form(&uri, &format!("token={}", fx.token.key)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"deleted": true}));

    let (status, _) = fx
        .send(get(&format!("/api/tutorials/detail/{}/", fx.tutorial.slug)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let fx = Fixture::new().await;
    let (status, body) = fx.send(get("/api/health/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["database"], json!("ok"));
}

#[tokio::test]
async fn test_create_post() {
    let fx = Fixture::new().await;

    let (status, body) = fx
        .send(form(
            "/api/blog/new/",
            &format!(
                "token={}&title=Sketch+of+the+Engine&description=Menabrea&body=Notes",
                fx.token.key
            ),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["details"]["slug"], json!("sketch-of-the-engine"));
    assert_eq!(body["details"]["author"]["user"]["username"], json!("ada"));
    assert_eq!(body["details"]["num_vote_up"], json!(0));

    let (status, body) = fx
        .send(form(
            "/api/blog/new/",
            &format!("token={}&title=+&description=d&body=b", fx.token.key),
        ))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, json!({"error": "Invalid title: may not be blank"}));

    let (status, _) = fx
        .send(form("/api/blog/new/", "title=Anonymous&description=d&body=b"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_tutorial() {
    let fx = Fixture::new().await;
    let series = create_series(
        &fx.db,
        &fx.author,
        NewSeries {
            name: "Engines".into(),
            description: "Analytical ones".into(),
            type_of: SeriesType::Technology,
        },
    )
    .await
    .unwrap();

    let (status, body) = fx
        .send(form(
            "/api/tutorials/new/",
            &format!(
                "token={}&title=Punched+Cards&description=Input&content=...&series_id={}&number=2",
                fx.token.key,
                series.id.value()
            ),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["details"]["series"], json!("Engines"));
    assert_eq!(body["details"]["number"], json!(2));
    assert_eq!(body["details"]["likes"], json!(0));

    let (status, body) = fx
        .send(form(
            "/api/tutorials/new/",
            &format!(
                "token={}&title=Orphan&description=d&content=c&series_id=999",
                fx.token.key
            ),
        ))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body,
        json!({"error": "Invalid series_id: series 999 does not exist"})
    );

    let (status, _) = fx
        .send(form(
            "/api/tutorials/new/",
            &format!(
                "token={}&title=Counted&description=d&content=c&number=first",
                fx.token.key
            ),
        ))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_create_series_and_names() {
    let fx = Fixture::new().await;

    let (status, body) = fx.send(get("/api/series/is_available/?name=Trees")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"available": true}));

    let (status, body) = fx
        .send(form(
            "/api/series/new/",
            &format!(
                "token={}&name=Trees&description=Balanced+ones&type_of=data_structures",
                fx.token.key
            ),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["details"]["slug"], json!("trees"));
    assert_eq!(body["details"]["type_of"], json!("data_structures"));
    assert_eq!(body["details"]["creator"], json!("ada"));
    let id = body["details"]["id"].clone();

    let (_, body) = fx.send(get("/api/series/is_available/?name=trees")).await;
    assert_eq!(body, json!({"available": false}));

    let (status, body) = fx.send(get("/api/series/is_available/")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, json!({"error": "Name not provided."}));

    let (status, body) = fx.send(get("/api/series/names/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"id": id, "name": "Trees"}]));

    let (status, body) = fx.send(get("/api/series/type/data_structures/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(1));
    assert_eq!(body["results"][0]["name"], json!("Trees"));

    let (status, body) = fx.send(get("/api/series/type/technology/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"count": 0, "results": []}));

    let (status, _) = fx.send(get("/api/series/type/cooking/")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = fx
        .send(form(
            "/api/series/new/",
            &format!(
                "token={}&name=Trees&description=Again&type_of=algorithms",
                fx.token.key
            ),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_series_tutorials_follow_numbering() {
    let fx = Fixture::new().await;
    let series = create_series(
        &fx.db,
        &fx.author,
        NewSeries {
            name: "Engines".into(),
            description: "Analytical ones".into(),
            type_of: SeriesType::Technology,
        },
    )
    .await
    .unwrap();

    for (title, number, draft) in [
        ("Third", 3, false),
        ("First", 1, false),
        ("Unfinished", 2, true),
        ("Second", 2, false),
    ] {
        publish_tutorial(
            &fx.db,
            &fx.author,
            NewTutorial {
                title: title.into(),
                description: "d".into(),
                content: "c".into(),
                series_id: Some(series.id),
                number,
                draft,
            },
        )
        .await
        .unwrap();
    }

    let (status, body) = fx.send(get("/api/series/detail/engines/tutorials/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(3));
    let titles: Vec<&str> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["First", "Second", "Third"]);

    let (status, body) = fx.send(get("/api/series/detail/engines/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["tutorials"],
        json!([
            "/api/tutorials/detail/first/",
            "/api/tutorials/detail/second/",
            "/api/tutorials/detail/third/",
        ])
    );

    let (status, _) = fx.send(get("/api/series/detail/boilers/tutorials/")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_series_takes_tutorials_and_engagements() {
    let fx = Fixture::new().await;
    let series = create_series(
        &fx.db,
        &fx.author,
        NewSeries {
            name: "Engines".into(),
            description: "Analytical ones".into(),
            type_of: SeriesType::Technology,
        },
    )
    .await
    .unwrap();
    let chapter = publish_tutorial(
        &fx.db,
        &fx.author,
        NewTutorial {
            title: "Mill and Store".into(),
            description: "d".into(),
            content: "c".into(),
            series_id: Some(series.id),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let (_, liked) = fx
        .send(form(
            "/api/tutorials/like/",
            &format!("token={}&tutorial_id={}", fx.token.key, chapter.id.value()),
        ))
        .await;
    assert_eq!(liked["count"], json!(1));
    let (_, bookmarked) = fx
        .send(form(
            "/api/series/bookmark/",
            &format!("token={}&series_id={}", fx.token.key, series.id.value()),
        ))
        .await;
    assert_eq!(bookmarked["count"], json!(1));

    let (_, other) = register_author(&fx.db, NewAuthor::new("charles", "$argon2id$fake"))
        .await
        .unwrap();
    let (status, _) = fx
        .send(form(
            "/api/series/delete/engines/",
            &format!("token={}", other.key),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = fx
        .send(form(
            "/api/series/delete/engines/",
            &format!("token={}", fx.token.key),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"deleted": true}));

    let (status, _) = fx.send(get("/api/series/detail/engines/")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = fx.send(get("/api/tutorials/detail/mill-and-store/")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The tutorial outside the series survives
    let (status, _) = fx
        .send(get(&format!("/api/tutorials/detail/{}/", fx.tutorial.slug)))
        .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(
        fx.db
            .count_for(chapter.id.into(), EngagementKind::Like)
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        fx.db
            .count_for(series.id.into(), EngagementKind::Bookmark)
            .await
            .unwrap(),
        0
    );
    let (_, ids) = fx
        .send(get_as("/api/authors/liked/tutorials/", &fx.token.key))
        .await;
    assert_eq!(ids, json!([]));
}

#[tokio::test]
async fn test_authenticate_by_secret_key() {
    let fx = Fixture::new().await;
    assert!(!fx.author.authenticated);
    let uri = format!("/api/authors/authenticate/{}/", fx.author.secret_key);

    for _ in 0..2 {
        let (status, body) = fx.send(get(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"], json!("ada"));
        assert_eq!(body["authenticated"], json!(true));
    }

    let (status, _) = fx
        .send(get(&format!(
            "/api/authors/authenticate/{}/",
            uuid::Uuid::new_v4()
        )))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = fx.send(get("/api/authors/authenticate/not-a-key/")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_own_content_includes_drafts() {
    let fx = Fixture::new().await;
    publish_post(
        &fx.db,
        &fx.author,
        NewPost {
            title: "Draft Post".into(),
            description: "d".into(),
            body: "b".into(),
            draft: true,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    publish_tutorial(
        &fx.db,
        &fx.author,
        NewTutorial {
            title: "Draft Tutorial".into(),
            description: "d".into(),
            content: "c".into(),
            draft: true,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let (_, other) = register_author(&fx.db, NewAuthor::new("charles", "$argon2id$fake"))
        .await
        .unwrap();

    let (status, _) = fx.send(get("/api/authors/content/")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = fx
        .send(get_as("/api/authors/content/", &fx.token.key))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["posts"][0]["title"], json!("Draft Post"));
    let mut tutorials: Vec<(&str, bool)> = body["tutorials"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| (t["title"].as_str().unwrap(), t["draft"].as_bool().unwrap()))
        .collect();
    tutorials.sort();
    assert_eq!(tutorials, [("Draft Tutorial", true), ("Note G", false)]);
    assert_eq!(body["series"], json!([]));

    // Drafts stay out of the public listings
    let (_, body) = fx.send(get("/api/blog/")).await;
    assert_eq!(body, json!({"count": 0, "results": []}));

    let (_, body) = fx.send(get_as("/api/authors/content/", &other.key)).await;
    assert_eq!(body, json!({"posts": [], "tutorials": [], "series": []}));
}

#[tokio::test]
async fn test_recent_tutorials_skip_drafts() {
    let fx = Fixture::new().await;
    publish_tutorial(
        &fx.db,
        &fx.author,
        NewTutorial {
            title: "Half Written".into(),
            description: "d".into(),
            content: "c".into(),
            draft: true,
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let (status, body) = fx.send(get("/api/tutorials/recent/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(1));
    assert_eq!(body["results"][0]["title"], json!("Note G"));
}
