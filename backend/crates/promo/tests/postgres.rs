//! Live integration tests for `PgPromoRepository` using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database. The `migrations`
//! path is relative to the crate root (`backend/crates/promo/`).

use promo::PgPromoRepository;
use promo::domain::entities::{ConsumeOutcome, ImpressionCounts, ValidationToken};
use promo::domain::repository::{ImpressionRepository, PromotionRepository, TokenStore};
use promo::domain::value_objects::{
    CounterKind, CountryCode, DisplayType, FilterType, ProjectSlug, PromoId, TokenHash,
    TrackedEvent,
};
use sqlx::PgPool;

const HOUR_MS: i64 = 3_600_000;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Insert a promotion row and return its id
async fn insert_promotion(pool: &PgPool, name: &str, live: bool) -> PromoId {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO promotions (name, slug, text, link, image, display_type, live) \
         VALUES ($1, $2, 'Try it', $3, $4, 'doc', $5) RETURNING promo_id",
    )
    .bind(name)
    .bind(format!("{name}-slug"))
    .bind(format!("https://example.com/{name}"))
    .bind(format!("https://cdn.example.com/{name}.png"))
    .bind(live)
    .fetch_one(pool)
    .await
    .unwrap_or_else(|e| panic!("insert_promotion failed for '{name}': {e}"));

    PromoId::new(id).unwrap()
}

async fn insert_geo_filter(
    pool: &PgPool,
    promo_id: PromoId,
    position: i32,
    kind: &str,
    codes: &[&str],
) {
    sqlx::query(
        "INSERT INTO promo_geo_filters (promo_id, position, filter_type, country_codes) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(promo_id.get())
    .bind(position)
    .bind(kind)
    .bind(codes.iter().map(|c| c.to_string()).collect::<Vec<_>>())
    .execute(pool)
    .await
    .unwrap();
}

async fn token_rows(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM promo_validation_tokens")
        .fetch_one(pool)
        .await
        .unwrap()
}

fn slug(s: &str) -> ProjectSlug {
    ProjectSlug::parse(s).unwrap()
}

// ---------------------------------------------------------------------------
// Token store
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../../database/migrations")]
async fn token_lifecycle(pool: PgPool) {
    let repo = PgPromoRepository::new(pool);
    let id = PromoId::new(1).unwrap();
    let hash = TokenHash::generate();

    repo.issue(&ValidationToken::new(id, hash.clone(), Some(slug("docs")), HOUR_MS))
        .await
        .unwrap();

    let first = repo.consume(id, &hash, TrackedEvent::View).await.unwrap();
    assert_eq!(first, ConsumeOutcome::Fresh { project: Some(slug("docs")) });

    let second = repo.consume(id, &hash, TrackedEvent::View).await.unwrap();
    assert_eq!(second, ConsumeOutcome::AlreadyUsed);

    let click = repo.consume(id, &hash, TrackedEvent::Click).await.unwrap();
    assert_eq!(click, ConsumeOutcome::Fresh { project: Some(slug("docs")) });

    let other_promo = repo
        .consume(PromoId::new(2).unwrap(), &hash, TrackedEvent::View)
        .await
        .unwrap();
    assert_eq!(other_promo, ConsumeOutcome::Invalid);

    let never_issued = TokenHash::parse("never-issued").unwrap();
    let outcome = repo.consume(id, &never_issued, TrackedEvent::View).await.unwrap();
    assert_eq!(outcome, ConsumeOutcome::Invalid);
}

#[sqlx::test(migrations = "../../../database/migrations")]
async fn token_without_project_context(pool: PgPool) {
    let repo = PgPromoRepository::new(pool);
    let id = PromoId::new(1).unwrap();
    let hash = TokenHash::generate();

    repo.issue(&ValidationToken::new(id, hash.clone(), None, HOUR_MS))
        .await
        .unwrap();

    let outcome = repo.consume(id, &hash, TrackedEvent::Click).await.unwrap();
    assert_eq!(outcome, ConsumeOutcome::Fresh { project: None });
}

#[sqlx::test(migrations = "../../../database/migrations")]
async fn expired_token_is_invalid_and_swept(pool: PgPool) {
    let repo = PgPromoRepository::new(pool.clone());
    let id = PromoId::new(1).unwrap();
    let expired = TokenHash::generate();
    let live = TokenHash::generate();

    repo.issue(&ValidationToken::new(id, expired.clone(), Some(slug("docs")), -1_000))
        .await
        .unwrap();
    repo.issue(&ValidationToken::new(id, live.clone(), None, HOUR_MS))
        .await
        .unwrap();
    assert_eq!(token_rows(&pool).await, 6);

    let outcome = repo.consume(id, &expired, TrackedEvent::View).await.unwrap();
    assert_eq!(outcome, ConsumeOutcome::Invalid);

    assert_eq!(repo.cleanup_expired().await.unwrap(), 3);
    assert_eq!(token_rows(&pool).await, 3);

    let outcome = repo.consume(id, &live, TrackedEvent::View).await.unwrap();
    assert_eq!(outcome, ConsumeOutcome::Fresh { project: None });
}

#[sqlx::test(migrations = "../../../database/migrations")]
async fn reissue_resets_uses(pool: PgPool) {
    let repo = PgPromoRepository::new(pool);
    let id = PromoId::new(1).unwrap();
    let hash = TokenHash::generate();
    let token = ValidationToken::new(id, hash.clone(), None, HOUR_MS);

    repo.issue(&token).await.unwrap();
    repo.consume(id, &hash, TrackedEvent::View).await.unwrap();
    repo.issue(&token).await.unwrap();

    let outcome = repo.consume(id, &hash, TrackedEvent::View).await.unwrap();
    assert_eq!(outcome, ConsumeOutcome::Fresh { project: None });
}

#[sqlx::test(migrations = "../../../database/migrations")]
async fn concurrent_consume_has_single_winner(pool: PgPool) {
    const CALLERS: usize = 16;

    let repo = PgPromoRepository::new(pool);
    let id = PromoId::new(1).unwrap();
    let hash = TokenHash::generate();
    repo.issue(&ValidationToken::new(id, hash.clone(), Some(slug("docs")), HOUR_MS))
        .await
        .unwrap();

    let mut handles = Vec::with_capacity(CALLERS);
    for _ in 0..CALLERS {
        let repo = repo.clone();
        let hash = hash.clone();
        handles.push(tokio::spawn(async move {
            repo.consume(id, &hash, TrackedEvent::Click).await
        }));
    }

    let mut fresh = 0;
    let mut already_used = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            ConsumeOutcome::Fresh { .. } => fresh += 1,
            ConsumeOutcome::AlreadyUsed => already_used += 1,
            ConsumeOutcome::Invalid => panic!("issued token reported invalid"),
        }
    }

    assert_eq!(fresh, 1);
    assert_eq!(already_used, CALLERS - 1);
}

// ---------------------------------------------------------------------------
// Impression counters
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../../database/migrations")]
async fn counters_global_and_per_project(pool: PgPool) {
    let id = insert_promotion(&pool, "counted", true).await;
    let repo = PgPromoRepository::new(pool);

    assert_eq!(repo.counts(id).await.unwrap(), ImpressionCounts::default());

    repo.increment(id, CounterKind::Offer).await.unwrap();
    repo.increment(id, CounterKind::Offer).await.unwrap();
    repo.increment(id, CounterKind::View).await.unwrap();
    repo.increment(id, CounterKind::Click).await.unwrap();

    repo.increment_for_project(id, &slug("docs"), CounterKind::Offer)
        .await
        .unwrap();
    repo.increment_for_project(id, &slug("docs"), CounterKind::View)
        .await
        .unwrap();
    repo.increment_for_project(id, &slug("blog"), CounterKind::Offer)
        .await
        .unwrap();

    assert_eq!(
        repo.counts(id).await.unwrap(),
        ImpressionCounts {
            offers: 2,
            views: 1,
            clicks: 1
        }
    );
    assert_eq!(
        repo.project_counts(id, &slug("docs")).await.unwrap(),
        ImpressionCounts {
            offers: 1,
            views: 1,
            clicks: 0
        }
    );
    assert_eq!(repo.project_counts(id, &slug("blog")).await.unwrap().offers, 1);
    assert_eq!(
        repo.project_counts(id, &slug("none")).await.unwrap(),
        ImpressionCounts::default()
    );
}

#[sqlx::test(migrations = "../../../database/migrations")]
async fn concurrent_increments_are_not_lost(pool: PgPool) {
    const WRITERS: i64 = 20;

    let id = insert_promotion(&pool, "busy", true).await;
    let repo = PgPromoRepository::new(pool);

    let mut handles = Vec::new();
    for _ in 0..WRITERS {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            repo.increment(id, CounterKind::View).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(repo.counts(id).await.unwrap().views, WRITERS);
}

// ---------------------------------------------------------------------------
// Promotions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../../database/migrations")]
async fn promotions_load_with_ordered_filters(pool: PgPool) {
    let targeted = insert_promotion(&pool, "targeted", true).await;
    let gold = insert_promotion(&pool, "gold-user", true).await;
    let retired = insert_promotion(&pool, "retired", false).await;
    insert_geo_filter(&pool, targeted, 2, "exclude", &["MX"]).await;
    insert_geo_filter(&pool, targeted, 1, "include", &["us", "CA", "MX"]).await;

    let repo = PgPromoRepository::new(pool);

    let live = repo.find_live(DisplayType::Doc).await.unwrap();
    let ids: Vec<PromoId> = live.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![targeted, gold]);

    let promo = &live[0];
    assert_eq!(promo.geo_filters.len(), 2);
    assert_eq!(promo.geo_filters[0].filter_type, FilterType::Include);
    assert_eq!(promo.geo_filters[1].filter_type, FilterType::Exclude);
    assert!(promo.is_shown_in(&CountryCode::parse("US").unwrap()));
    assert!(!promo.is_shown_in(&CountryCode::parse("MX").unwrap()));

    let named = repo.find_live_by_name("gold-user").await.unwrap();
    assert_eq!(named.map(|p| p.id), Some(gold));
    assert!(repo.find_live_by_name("retired").await.unwrap().is_none());

    let by_id = repo.find_by_id(retired).await.unwrap().unwrap();
    assert!(!by_id.live);
    assert_eq!(by_id.image, "https://cdn.example.com/retired.png");

    assert!(
        repo.find_by_id(PromoId::new(9_999).unwrap())
            .await
            .unwrap()
            .is_none()
    );
    assert!(repo.find_live(DisplayType::SiteFooter).await.unwrap().is_empty());
}
