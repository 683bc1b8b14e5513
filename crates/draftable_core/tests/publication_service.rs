use chrono::{Duration, TimeZone, Utc};
use draftable_core::db::open_db_in_memory;
use draftable_core::{
    ArticleListQuery, FixedClock, PublicationError, PublicationService, PublicationState,
    SqliteArticleRepository, Timestamp, Visibility,
};

fn base_time() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap()
}

#[test]
fn created_draft_is_only_visible_through_opt_outs() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(base_time());
    let service = PublicationService::new(SqliteArticleRepository::new(&conn), &clock);

    let article = service.create_draft("hello", "world", None).unwrap();
    assert_eq!(service.state_of(&article), PublicationState::Draft);

    assert!(service.list_published().unwrap().is_empty());
    assert_eq!(service.list_only_drafts().unwrap().len(), 1);
    assert_eq!(service.list_with_drafts().unwrap().len(), 1);
}

#[test]
fn scheduled_publish_flips_visibility_when_clock_advances() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(base_time());
    let service = PublicationService::new(SqliteArticleRepository::new(&conn), &clock);

    let mut article = service.create_draft("embargoed", "", None).unwrap();
    service.publish_at(&mut article, "+1 hour").unwrap();
    assert!(matches!(
        service.state_of(&article),
        PublicationState::Scheduled { .. }
    ));
    assert!(service.list_published().unwrap().is_empty());

    clock.advance(Duration::hours(1));
    assert!(service.state_of(&article).is_published());
    let visible = service.list_published().unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].uuid, article.uuid);
}

#[test]
fn publish_is_idempotent_for_already_published_article() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(base_time());
    let service = PublicationService::new(SqliteArticleRepository::new(&conn), &clock);

    let mut article = service.create_draft("stable", "", None).unwrap();
    service.publish(&mut article).unwrap();
    let first = article.published_at;
    assert_eq!(first, Some(base_time()));

    clock.advance(Duration::days(1));
    service.publish(&mut article).unwrap();
    assert_eq!(article.published_at, first);

    let stored = service
        .get_article(article.uuid, Visibility::Published)
        .unwrap()
        .unwrap();
    assert_eq!(stored.published_at, first);
}

#[test]
fn draft_unpublishes_and_persists() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(base_time());
    let service = PublicationService::new(SqliteArticleRepository::new(&conn), &clock);

    let mut article = service.create_draft("flip", "", None).unwrap();
    service.publish(&mut article).unwrap();
    service.draft(&mut article).unwrap();

    assert_eq!(article.published_at, None);
    assert!(service
        .get_article(article.uuid, Visibility::Published)
        .unwrap()
        .is_none());
    assert_eq!(service.list_only_drafts().unwrap().len(), 1);
}

#[test]
fn invalid_date_is_rejected_before_persisting() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(base_time());
    let service = PublicationService::new(SqliteArticleRepository::new(&conn), &clock);

    let mut article = service.create_draft("typo", "", None).unwrap();
    let err = service.publish_at(&mut article, "31/12/2020").unwrap_err();
    assert!(matches!(err, PublicationError::InvalidTimestamp(_)));
    assert_eq!(article.published_at, None);

    let err = service
        .publish_at(&mut article, "+999999999 weeks")
        .unwrap_err();
    assert!(matches!(err, PublicationError::InvalidTimestamp(_)));
    assert_eq!(article.published_at, None);

    let stored = service
        .get_article(article.uuid, Visibility::WithDrafts)
        .unwrap()
        .unwrap();
    assert_eq!(stored.published_at, None);
}

#[test]
fn author_listings_respect_visibility_and_pagination() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(base_time());
    let service = PublicationService::new(SqliteArticleRepository::new(&conn), &clock);

    let author = service.create_author("Grace").unwrap();
    for index in 0..3 {
        let mut article = service
            .create_draft(format!("post {index}"), "", Some(&author))
            .unwrap();
        service
            .publish_at(&mut article, base_time() - Duration::days(index + 1))
            .unwrap();
    }
    service
        .create_draft("unfinished", "", Some(&author))
        .unwrap();
    service.create_draft("orphan", "", None).unwrap();

    let published = service
        .list_by_author(author.uuid, Visibility::Published)
        .unwrap();
    assert_eq!(published.len(), 3);
    assert_eq!(published[0].title, "post 0");

    let everything = service
        .list_by_author(author.uuid, Visibility::WithDrafts)
        .unwrap();
    assert_eq!(everything.len(), 4);

    let by_name = service
        .list_by_author_name("Grace", Visibility::OnlyDrafts)
        .unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].title, "unfinished");

    let page = service
        .list_articles(&ArticleListQuery {
            visibility: Visibility::Published,
            author_uuid: Some(author.uuid),
            limit: Some(1),
            offset: 1,
        })
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].title, "post 1");
}
