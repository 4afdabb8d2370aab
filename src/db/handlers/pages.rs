//! Database repository for site pages.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;
use uuid::Uuid;

use crate::db::errors::{DbError, Result};
use crate::db::handlers::Repository;
use crate::db::models::pages::{Page, PageCreateDBRequest, PageFilter, PageUpdateDBRequest};

/// Repository for page operations.
pub struct Pages<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Pages<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Look up a page by slug, falling back to ID. Public page URLs use the
    /// slug while the admin console addresses rows by ID.
    #[instrument(skip(self), err)]
    pub async fn get_by_slug_or_id(&mut self, key: &str) -> Result<Option<Page>> {
        let page = sqlx::query_as::<_, Page>("SELECT * FROM pages WHERE slug = ? OR id = ?")
            .bind(key)
            .bind(key)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(page)
    }
}

#[async_trait::async_trait]
impl Repository for Pages<'_> {
    type CreateRequest = PageCreateDBRequest;
    type UpdateRequest = PageUpdateDBRequest;
    type Response = Page;
    type Id = String;
    type Filter = PageFilter;

    #[instrument(skip_all, fields(slug = %request.slug), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Page> {
        let now = Utc::now();
        let published_at = request.published.then_some(now);

        let page = sqlx::query_as::<_, Page>(
            r#"
            INSERT INTO pages (id, title, slug, content, page_type, excerpt, cover_image,
                               published, published_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&request.title)
        .bind(&request.slug)
        .bind(&request.content)
        .bind(&request.page_type)
        .bind(&request.excerpt)
        .bind(&request.cover_image)
        .bind(request.published)
        .bind(published_at)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(page)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: String) -> Result<Option<Page>> {
        let page = sqlx::query_as::<_, Page>("SELECT * FROM pages WHERE id = ?")
            .bind(&id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(page)
    }

    #[instrument(skip_all, err)]
    async fn list(&mut self, filter: &PageFilter) -> Result<Vec<Page>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM pages WHERE 1 = 1");
        if filter.published_only {
            qb.push(" AND published = 1");
        }
        if let Some(page_type) = &filter.page_type {
            qb.push(" AND page_type = ").push_bind(page_type);
        }
        qb.push(" ORDER BY published_at DESC NULLS LAST, created_at DESC");

        let pages = qb.build_query_as::<Page>().fetch_all(&mut *self.db).await?;
        Ok(pages)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: String) -> Result<bool> {
        let result = sqlx::query("DELETE FROM pages WHERE id = ?")
            .bind(&id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Sparse update. Setting `published = true` re-stamps `published_at`
    /// every time, so re-publishing bumps a page to the top of date-ordered
    /// listings.
    #[instrument(skip_all, err)]
    async fn update(&mut self, id: String, request: &Self::UpdateRequest) -> Result<Page> {
        let now = Utc::now();

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE pages SET updated_at = ");
        qb.push_bind(now);
        if let Some(title) = &request.title {
            qb.push(", title = ").push_bind(title);
        }
        if let Some(slug) = &request.slug {
            qb.push(", slug = ").push_bind(slug);
        }
        if let Some(content) = &request.content {
            qb.push(", content = ").push_bind(content);
        }
        if let Some(page_type) = &request.page_type {
            qb.push(", page_type = ").push_bind(page_type);
        }
        if let Some(excerpt) = &request.excerpt {
            qb.push(", excerpt = ").push_bind(excerpt);
        }
        if let Some(cover_image) = &request.cover_image {
            qb.push(", cover_image = ").push_bind(cover_image);
        }
        if let Some(published) = request.published {
            qb.push(", published = ").push_bind(published);
            if published {
                qb.push(", published_at = ").push_bind(now);
            }
        }
        qb.push(" WHERE id = ").push_bind(&id);

        let result = qb.build().execute(&mut *self.db).await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        let page = sqlx::query_as::<_, Page>("SELECT * FROM pages WHERE id = ?")
            .bind(&id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    fn request(slug: &str, published: bool) -> PageCreateDBRequest {
        PageCreateDBRequest {
            title: format!("Page {slug}"),
            slug: slug.to_string(),
            content: "# Hello".to_string(),
            page_type: "page".to_string(),
            excerpt: None,
            cover_image: None,
            published,
        }
    }

    #[sqlx::test]
    async fn create_published_page_stamps_published_at(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Pages::new(&mut conn);

        let page = repo.create(&request("about", true)).await.unwrap();
        assert!(page.published);
        assert!(page.published_at.is_some());

        let draft = repo.create(&request("draft", false)).await.unwrap();
        assert!(!draft.published);
        assert!(draft.published_at.is_none());
    }

    #[sqlx::test]
    async fn slug_is_unique(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Pages::new(&mut conn);

        repo.create(&request("about", false)).await.unwrap();
        let err = repo.create(&request("about", false)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[sqlx::test]
    async fn lookup_by_slug_or_id(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Pages::new(&mut conn);

        let page = repo.create(&request("about", true)).await.unwrap();

        let by_slug = repo.get_by_slug_or_id("about").await.unwrap().unwrap();
        assert_eq!(by_slug.id, page.id);

        let by_id = repo.get_by_slug_or_id(&page.id).await.unwrap().unwrap();
        assert_eq!(by_id.slug, "about");

        assert!(repo.get_by_slug_or_id("missing").await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn public_listing_hides_drafts(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Pages::new(&mut conn);

        repo.create(&request("published", true)).await.unwrap();
        repo.create(&request("draft", false)).await.unwrap();

        let public = repo
            .list(&PageFilter {
                published_only: true,
                page_type: None,
            })
            .await
            .unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].slug, "published");

        let all = repo.list(&PageFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[sqlx::test]
    async fn listing_orders_by_publish_date_then_creation(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Pages::new(&mut conn);

        let older = repo.create(&request("older", true)).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        repo.create(&request("newer", true)).await.unwrap();
        repo.create(&request("draft", false)).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        // Re-publishing surfaces the page at the top
        repo.update(
            older.id.clone(),
            &PageUpdateDBRequest {
                published: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let all = repo.list(&PageFilter::default()).await.unwrap();
        let slugs: Vec<&str> = all.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["older", "newer", "draft"]);
    }

    #[sqlx::test]
    async fn republishing_restamps_published_at(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Pages::new(&mut conn);

        let page = repo.create(&request("about", true)).await.unwrap();
        let first_stamp = page.published_at.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let updated = repo
            .update(
                page.id.clone(),
                &PageUpdateDBRequest {
                    published: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(updated.published_at.unwrap() > first_stamp);
    }

    #[sqlx::test]
    async fn unpublishing_keeps_the_old_stamp(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Pages::new(&mut conn);

        let page = repo.create(&request("about", true)).await.unwrap();
        let stamp = page.published_at.unwrap();

        let updated = repo
            .update(
                page.id.clone(),
                &PageUpdateDBRequest {
                    published: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(!updated.published);
        assert_eq!(updated.published_at.unwrap(), stamp);
    }

    #[sqlx::test]
    async fn sparse_update_leaves_other_fields(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Pages::new(&mut conn);

        let page = repo.create(&request("about", false)).await.unwrap();

        let updated = repo
            .update(
                page.id.clone(),
                &PageUpdateDBRequest {
                    title: Some("New title".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "New title");
        assert_eq!(updated.slug, page.slug);
        assert_eq!(updated.content, page.content);
    }

    #[sqlx::test]
    async fn update_missing_page_is_not_found(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Pages::new(&mut conn);

        let err = repo
            .update(
                "missing".to_string(),
                &PageUpdateDBRequest {
                    title: Some("x".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }
}
