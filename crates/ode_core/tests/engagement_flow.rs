use ode_core::author::register_author;
use ode_core::content::{create_series, publish_tutorial, remove_tutorial};
use ode_core::db::client;
use ode_core::engagement::{toggle, toggle_engagement};
use ode_core::prelude::*;
use ode_core::{
    NewAuthor, NewSeries, NewTutorial, SeriesType, Token, ToggleAction, ToggleError,
    ToggleRequest,
};

async fn setup() -> (Db, Author, Token, Tutorial, Series) {
    let db = client::create_test_db().await.unwrap();

    let (author, token) = register_author(&db, NewAuthor::new("ada", "$argon2id$fake"))
        .await
        .unwrap();
    let series = create_series(
        &db,
        &author,
        NewSeries {
            name: "Engines".into(),
            description: "Analytical ones".into(),
            type_of: SeriesType::Technology,
        },
    )
    .await
    .unwrap();
    let tutorial = publish_tutorial(
        &db,
        &author,
        NewTutorial {
            title: "Note G".into(),
            description: "Bernoulli numbers".into(),
            content: "...".into(),
            series_id: Some(series.id),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    (db, author, token, tutorial, series)
}

fn like(token: &str, item: &str) -> ToggleRequest {
    ToggleRequest {
        credentials: Credentials::token(token),
        item_id: Some(item.to_string()),
        content_kind: ContentKind::Tutorial,
        kind: EngagementKind::Like,
    }
}

#[tokio::test]
async fn test_like_toggles_pair_up() {
    let (db, _, token, tutorial, _) = setup().await;
    let id = tutorial.id.to_string();

    let first = toggle(&db, like(&token.key, &id)).await.unwrap();
    assert_eq!(first.action, ToggleAction::Engaged);
    assert_eq!(first.count, 1);

    let second = toggle(&db, like(&token.key, &id)).await.unwrap();
    assert_eq!(second.action, ToggleAction::Disengaged);
    assert_eq!(second.count, 0);

    let third = toggle(&db, like(&token.key, &id)).await.unwrap();
    assert_eq!(third.action, ToggleAction::Engaged);
    assert_eq!(third.count, 1);
}

#[tokio::test]
async fn test_likes_from_two_authors_accumulate() {
    let (db, _, token, tutorial, _) = setup().await;
    let (_, other) = register_author(&db, NewAuthor::new("charles", "$argon2id$fake"))
        .await
        .unwrap();
    let id = tutorial.id.to_string();

    toggle(&db, like(&token.key, &id)).await.unwrap();
    let outcome = toggle(&db, like(&other.key, &id)).await.unwrap();
    assert_eq!(outcome.count, 2);
}

#[tokio::test]
async fn test_bookmark_lists_series() {
    let (db, author, token, _, series) = setup().await;

    let outcome = toggle(
        &db,
        ToggleRequest {
            credentials: Credentials::new(None, Some(token.key.clone())),
            item_id: Some(series.id.to_string()),
            content_kind: ContentKind::Series,
            kind: EngagementKind::Bookmark,
        },
    )
    .await
    .unwrap();
    assert_eq!(outcome.action, ToggleAction::Engaged);

    let ids = db
        .content_ids_for(author.id, ContentKind::Series, EngagementKind::Bookmark)
        .await
        .unwrap();
    assert_eq!(ids, vec![series.id.value()]);
}

#[tokio::test]
async fn test_toggle_rejections() {
    let (db, _, token, tutorial, _) = setup().await;
    let id = tutorial.id.to_string();

    let err = toggle(
        &db,
        ToggleRequest {
            credentials: Credentials::default(),
            ..like("", &id)
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ToggleError::Unauthenticated));

    let err = toggle(&db, like(&token.key, "  ")).await.unwrap_err();
    assert!(matches!(err, ToggleError::MissingItemId(ContentKind::Tutorial)));
    assert_eq!(err.to_string(), "Tutorial id not provided");

    for item in ["999", "abc", "0"] {
        let err = toggle(&db, like(&token.key, item)).await.unwrap_err();
        assert!(
            matches!(err, ToggleError::InvalidTokenOrMissingItem(_)),
            "{} gave {:?}",
            item,
            err
        );
    }

    let err = toggle(&db, like("not-a-token", &id)).await.unwrap_err();
    assert!(matches!(err, ToggleError::InvalidTokenOrMissingItem(_)));

    // nothing was written by any of the rejected requests
    let count = db
        .count_for(tutorial.id.into(), EngagementKind::Like)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_deleting_a_tutorial_drops_its_likes() {
    let (db, author, token, tutorial, _) = setup().await;
    toggle(&db, like(&token.key, &tutorial.id.to_string()))
        .await
        .unwrap();

    remove_tutorial(&db, &author, &tutorial.slug).await.unwrap();

    let count = db
        .count_for(tutorial.id.into(), EngagementKind::Like)
        .await
        .unwrap();
    assert_eq!(count, 0);
    assert!(!db.content_exists(tutorial.id.into()).await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_leave_one_record() {
    let (db, author, _, tutorial, _) = setup().await;
    let author = author.id;
    let target = ContentRef::from(tutorial.id);

    let tasks: Vec<_> = (0..32)
        .map(|_| {
            let db = db.clone();
            tokio::spawn(async move { db.add(author, target, EngagementKind::Like).await })
        })
        .collect();

    let mut created = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(()) => created += 1,
            Err(e) => assert!(e.is_conflict(), "lost race surfaced as {:?}", e),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(db.count_for(target, EngagementKind::Like).await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_toggles_by_one_author_never_fail() {
    let (db, author, _, tutorial, _) = setup().await;
    let author = author.id;
    let target = ContentRef::from(tutorial.id);

    for round in 0..4 {
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let db = db.clone();
                tokio::spawn(async move {
                    toggle_engagement(&db, author, target, EngagementKind::Like).await
                })
            })
            .collect();

        for task in tasks {
            let outcome = task.await.unwrap();
            assert!(outcome.is_ok(), "round {}: {:?}", round, outcome);
        }

        let count = db.count_for(target, EngagementKind::Like).await.unwrap();
        let exists = db
            .exists(author, target, EngagementKind::Like)
            .await
            .unwrap();
        assert!(count <= 1, "round {}: {} likes from one author", round, count);
        assert_eq!(exists, count == 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_likes_from_many_authors_all_count() {
    let (db, _, _, tutorial, _) = setup().await;
    let id = tutorial.id.to_string();

    let mut tokens = Vec::new();
    for n in 0..8 {
        let reader = NewAuthor::new(format!("reader{}", n), "$argon2id$fake");
        let (_, token) = register_author(&db, reader).await.unwrap();
        tokens.push(token.key);
    }

    let tasks: Vec<_> = tokens
        .into_iter()
        .map(|key| {
            let db = db.clone();
            let request = like(&key, &id);
            tokio::spawn(async move { toggle(&db, request).await })
        })
        .collect();

    for task in tasks {
        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome.action, ToggleAction::Engaged);
    }

    let count = db
        .count_for(tutorial.id.into(), EngagementKind::Like)
        .await
        .unwrap();
    assert_eq!(count, 8);
}
