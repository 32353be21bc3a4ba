//! PostgreSQL Repository Implementations

use std::collections::HashMap;

use chrono::Utc;
use sqlx::PgPool;

use crate::domain::entities::{
    ConsumeOutcome, GeoFilter, ImpressionCounts, Promotion, ValidationToken,
};
use crate::domain::repository::{ImpressionRepository, PromotionRepository, TokenStore};
use crate::domain::value_objects::{
    CounterKind, CountryCode, DisplayType, FilterType, ProjectSlug, PromoId, TokenHash, TokenKind,
    TrackedEvent,
};
use crate::error::{PromoError, PromoResult};

const PROMOTION_COLUMNS: &str = r#"
    promo_id,
    name,
    slug,
    text,
    link,
    image,
    display_type,
    live
"#;

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgPromoRepository {
    pool: PgPool,
}

impl PgPromoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load geo filters for the given rows and build entities
    async fn with_filters(&self, rows: Vec<PromotionRow>) -> PromoResult<Vec<Promotion>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|r| r.promo_id).collect();

        let filter_rows = sqlx::query_as::<_, GeoFilterRow>(
            r#"
            SELECT promo_id, filter_type, country_codes
            FROM promo_geo_filters
            WHERE promo_id = ANY($1)
            ORDER BY promo_id, position, geo_filter_id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut filters: HashMap<i64, Vec<GeoFilter>> = HashMap::new();
        for row in filter_rows {
            let promo_id = row.promo_id;
            filters
                .entry(promo_id)
                .or_default()
                .push(row.into_geo_filter()?);
        }

        rows.into_iter()
            .map(|row| {
                let geo_filters = filters.remove(&row.promo_id).unwrap_or_default();
                row.into_promotion(geo_filters)
            })
            .collect()
    }
}

impl PromotionRepository for PgPromoRepository {
    async fn find_by_id(&self, promo_id: PromoId) -> PromoResult<Option<Promotion>> {
        let row = sqlx::query_as::<_, PromotionRow>(&format!(
            "SELECT {PROMOTION_COLUMNS} FROM promotions WHERE promo_id = $1"
        ))
        .bind(promo_id.get())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.with_filters(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_live(&self, display_type: DisplayType) -> PromoResult<Vec<Promotion>> {
        let rows = sqlx::query_as::<_, PromotionRow>(&format!(
            "SELECT {PROMOTION_COLUMNS} FROM promotions \
             WHERE live AND display_type = $1 ORDER BY promo_id"
        ))
        .bind(display_type.code())
        .fetch_all(&self.pool)
        .await?;

        self.with_filters(rows).await
    }

    async fn find_live_by_name(&self, name: &str) -> PromoResult<Option<Promotion>> {
        let row = sqlx::query_as::<_, PromotionRow>(&format!(
            "SELECT {PROMOTION_COLUMNS} FROM promotions \
             WHERE live AND name = $1 ORDER BY promo_id LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.with_filters(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

impl ImpressionRepository for PgPromoRepository {
    async fn increment(&self, promo_id: PromoId, kind: CounterKind) -> PromoResult<()> {
        let column = kind.column();
        sqlx::query(&format!(
            r#"
            INSERT INTO promo_impressions (promo_id, {column})
            VALUES ($1, 1)
            ON CONFLICT (promo_id)
            DO UPDATE SET {column} = promo_impressions.{column} + 1
            "#
        ))
        .bind(promo_id.get())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn increment_for_project(
        &self,
        promo_id: PromoId,
        project: &ProjectSlug,
        kind: CounterKind,
    ) -> PromoResult<()> {
        let column = kind.column();
        sqlx::query(&format!(
            r#"
            INSERT INTO promo_project_impressions (promo_id, project_slug, {column})
            VALUES ($1, $2, 1)
            ON CONFLICT (promo_id, project_slug)
            DO UPDATE SET {column} = promo_project_impressions.{column} + 1
            "#
        ))
        .bind(promo_id.get())
        .bind(project.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn counts(&self, promo_id: PromoId) -> PromoResult<ImpressionCounts> {
        let row = sqlx::query_as::<_, CountsRow>(
            "SELECT offers, views, clicks FROM promo_impressions WHERE promo_id = $1",
        )
        .bind(promo_id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CountsRow::into_counts).unwrap_or_default())
    }

    async fn project_counts(
        &self,
        promo_id: PromoId,
        project: &ProjectSlug,
    ) -> PromoResult<ImpressionCounts> {
        let row = sqlx::query_as::<_, CountsRow>(
            r#"
            SELECT offers, views, clicks
            FROM promo_project_impressions
            WHERE promo_id = $1 AND project_slug = $2
            "#,
        )
        .bind(promo_id.get())
        .bind(project.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CountsRow::into_counts).unwrap_or_default())
    }
}

impl TokenStore for PgPromoRepository {
    async fn issue(&self, token: &ValidationToken) -> PromoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO promo_validation_tokens (
                promo_id,
                token_hash,
                token_kind,
                uses,
                context_slug,
                expires_at_ms
            ) VALUES
                ($1, $2, $3, 0, NULL, $6),
                ($1, $2, $4, 0, NULL, $6),
                ($1, $2, $5, 0, $7, $6)
            ON CONFLICT (promo_id, token_hash, token_kind)
            DO UPDATE SET
                uses = 0,
                context_slug = EXCLUDED.context_slug,
                expires_at_ms = EXCLUDED.expires_at_ms
            "#,
        )
        .bind(token.promo_id.get())
        .bind(token.hash.as_str())
        .bind(TokenKind::View.code())
        .bind(TokenKind::Click.code())
        .bind(TokenKind::ProjectContext.code())
        .bind(token.expires_at_ms)
        .bind(token.project.as_ref().map(|p| p.as_str()))
        .execute(&self.pool)
        .await?;

        tracing::debug!(promo_id = %token.promo_id, "Validation token issued");

        Ok(())
    }

    async fn consume(
        &self,
        promo_id: PromoId,
        hash: &TokenHash,
        event: TrackedEvent,
    ) -> PromoResult<ConsumeOutcome> {
        let now_ms = Utc::now().timestamp_millis();
        let kind = TokenKind::from(event).code();

        // Row lock + re-check of `uses = 0` lets exactly one caller through
        let spent = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE promo_validation_tokens
            SET uses = uses + 1
            WHERE promo_id = $1
              AND token_hash = $2
              AND token_kind = $3
              AND expires_at_ms > $4
              AND uses = 0
            RETURNING uses
            "#,
        )
        .bind(promo_id.get())
        .bind(hash.as_str())
        .bind(kind)
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;

        if spent.is_some() {
            let context = sqlx::query_scalar::<_, Option<String>>(
                r#"
                SELECT context_slug
                FROM promo_validation_tokens
                WHERE promo_id = $1
                  AND token_hash = $2
                  AND token_kind = $3
                  AND expires_at_ms > $4
                "#,
            )
            .bind(promo_id.get())
            .bind(hash.as_str())
            .bind(TokenKind::ProjectContext.code())
            .bind(now_ms)
            .fetch_optional(&self.pool)
            .await?
            .flatten();

            let project = context.and_then(|slug| match ProjectSlug::parse(&slug) {
                Ok(project) => Some(project),
                Err(e) => {
                    tracing::warn!(promo_id = %promo_id, error = %e, "Stored project slug is invalid");
                    None
                }
            });

            return Ok(ConsumeOutcome::Fresh { project });
        }

        // Tell a spent token from one that never existed or expired
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM promo_validation_tokens
                WHERE promo_id = $1
                  AND token_hash = $2
                  AND token_kind = $3
                  AND expires_at_ms > $4
            )
            "#,
        )
        .bind(promo_id.get())
        .bind(hash.as_str())
        .bind(kind)
        .bind(now_ms)
        .fetch_one(&self.pool)
        .await?;

        Ok(if exists {
            ConsumeOutcome::AlreadyUsed
        } else {
            ConsumeOutcome::Invalid
        })
    }
    async fn cleanup_expired(&self) -> PromoResult<u64> {
        let now_ms = Utc::now().timestamp_millis();

        let tokens_deleted =
            sqlx::query("DELETE FROM promo_validation_tokens WHERE expires_at_ms <= $1")
                .bind(now_ms)
                .execute(&self.pool)
                .await?
                .rows_affected();

        tracing::debug!(tokens = tokens_deleted, "Cleaned up expired validation tokens");

        Ok(tokens_deleted)
    }
}

// Internal row types for sqlx mapping
#[derive(sqlx::FromRow)]
struct PromotionRow {
    promo_id: i64,
    name: String,
    slug: String,
    text: String,
    link: String,
    image: String,
    display_type: String,
    live: bool,
}

impl PromotionRow {
    fn into_promotion(self, geo_filters: Vec<GeoFilter>) -> PromoResult<Promotion> {
        let id = PromoId::new(self.promo_id)
            .ok_or_else(|| PromoError::Internal(format!("Invalid promo_id {}", self.promo_id)))?;
        let display_type = DisplayType::from_code(&self.display_type).ok_or_else(|| {
            PromoError::Internal(format!("Unknown display_type {:?}", self.display_type))
        })?;

        Ok(Promotion {
            id,
            name: self.name,
            slug: self.slug,
            text: self.text,
            link: self.link,
            image: self.image,
            display_type,
            live: self.live,
            geo_filters,
        })
    }
}

#[derive(sqlx::FromRow)]
struct GeoFilterRow {
    promo_id: i64,
    filter_type: String,
    country_codes: Vec<String>,
}

impl GeoFilterRow {
    fn into_geo_filter(self) -> PromoResult<GeoFilter> {
        let filter_type = FilterType::from_code(&self.filter_type).ok_or_else(|| {
            PromoError::Internal(format!("Unknown filter_type {:?}", self.filter_type))
        })?;

        let countries = self
            .country_codes
            .iter()
            .filter_map(|code| {
                let parsed = CountryCode::parse(code);
                if parsed.is_none() {
                    tracing::warn!(promo_id = self.promo_id, code = %code, "Skipping invalid country code");
                }
                parsed
            })
            .collect();

        Ok(GeoFilter {
            filter_type,
            countries,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CountsRow {
    offers: i64,
    views: i64,
    clicks: i64,
}

impl CountsRow {
    fn into_counts(self) -> ImpressionCounts {
        ImpressionCounts {
            offers: self.offers,
            views: self.views,
            clicks: self.clicks,
        }
    }
}
