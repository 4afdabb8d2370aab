//! Database repository for page content blocks.
//!
//! Blocks within a page carry a `sort_order` that this repository keeps
//! contiguous from zero: inserts shift later blocks up, deletes compact the
//! gap, and moves rotate the affected range. Callers run each mutating
//! operation inside a transaction so concurrent edits cannot interleave the
//! shift and the write.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;
use uuid::Uuid;

use crate::db::errors::{DbError, Result};
use crate::db::models::blocks::{Block, BlockCreateDBRequest, BlockUpdateDBRequest};

/// Repository for block operations.
pub struct Blocks<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Blocks<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: &str) -> Result<Option<Block>> {
        let block = sqlx::query_as::<_, Block>("SELECT * FROM blocks WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(block)
    }

    /// List a page's blocks in display order.
    #[instrument(skip(self), err)]
    pub async fn list_for_page(&mut self, page_id: &str) -> Result<Vec<Block>> {
        let blocks = sqlx::query_as::<_, Block>("SELECT * FROM blocks WHERE page_id = ? ORDER BY sort_order ASC")
            .bind(page_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(blocks)
    }

    /// Number of blocks on a page. Valid move targets are `0..count`.
    #[instrument(skip(self), err)]
    pub async fn count_for_page(&mut self, page_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blocks WHERE page_id = ?")
            .bind(page_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }

    /// Insert a block. With `after_id` resolving to order `k`, the new block
    /// lands at `k + 1` and everything at or past that position shifts up by
    /// one. Without `after_id`, or when the reference has since been deleted,
    /// the block appends at the end.
    #[instrument(skip_all, fields(page_id = %request.page_id), err)]
    pub async fn create(&mut self, request: &BlockCreateDBRequest) -> Result<Block> {
        let after_order: Option<i64> = match &request.after_id {
            Some(after_id) => {
                sqlx::query_scalar("SELECT sort_order FROM blocks WHERE id = ? AND page_id = ?")
                    .bind(after_id)
                    .bind(&request.page_id)
                    .fetch_optional(&mut *self.db)
                    .await?
            }
            None => None,
        };

        let sort_order = match after_order {
            Some(k) => {
                let new_order = k + 1;
                sqlx::query("UPDATE blocks SET sort_order = sort_order + 1 WHERE page_id = ? AND sort_order >= ?")
                    .bind(&request.page_id)
                    .bind(new_order)
                    .execute(&mut *self.db)
                    .await?;
                new_order
            }
            None => {
                sqlx::query_scalar::<_, i64>("SELECT COALESCE(MAX(sort_order) + 1, 0) FROM blocks WHERE page_id = ?")
                    .bind(&request.page_id)
                    .fetch_one(&mut *self.db)
                    .await?
            }
        };

        let now = Utc::now();
        let block = sqlx::query_as::<_, Block>(
            r#"
            INSERT INTO blocks (id, page_id, block_type, content, sort_order, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&request.page_id)
        .bind(&request.block_type)
        .bind(&request.content)
        .bind(sort_order)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(block)
    }

    /// Sparse content/type update; does not touch ordering.
    #[instrument(skip_all, err)]
    pub async fn update(&mut self, id: &str, request: &BlockUpdateDBRequest) -> Result<Block> {
        let now = Utc::now();

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE blocks SET updated_at = ");
        qb.push_bind(now);
        if let Some(block_type) = &request.block_type {
            qb.push(", block_type = ").push_bind(block_type);
        }
        if let Some(content) = &request.content {
            qb.push(", content = ").push_bind(content);
        }
        qb.push(" WHERE id = ").push_bind(id);

        let result = qb.build().execute(&mut *self.db).await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        let block = sqlx::query_as::<_, Block>("SELECT * FROM blocks WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(block)
    }

    /// Move a block to a new position within its page. Moving toward the
    /// front shifts the displaced range up; moving toward the back shifts it
    /// down. The caller validates that `new_order` is within `0..count`.
    #[instrument(skip(self), err)]
    pub async fn move_to(&mut self, id: &str, new_order: i64) -> Result<Block> {
        let block = self.get_by_id(id).await?.ok_or(DbError::NotFound)?;
        let current = block.sort_order;

        if new_order < current {
            // Everything in [new_order, current) moves up by one
            sqlx::query("UPDATE blocks SET sort_order = sort_order + 1 WHERE page_id = ? AND sort_order >= ? AND sort_order < ?")
                .bind(&block.page_id)
                .bind(new_order)
                .bind(current)
                .execute(&mut *self.db)
                .await?;
        } else if new_order > current {
            // Everything in (current, new_order] moves down by one
            sqlx::query("UPDATE blocks SET sort_order = sort_order - 1 WHERE page_id = ? AND sort_order > ? AND sort_order <= ?")
                .bind(&block.page_id)
                .bind(current)
                .bind(new_order)
                .execute(&mut *self.db)
                .await?;
        } else {
            return Ok(block);
        }

        let moved = sqlx::query_as::<_, Block>("UPDATE blocks SET sort_order = ?, updated_at = ? WHERE id = ? RETURNING *")
            .bind(new_order)
            .bind(Utc::now())
            .bind(id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(moved)
    }

    /// Delete a block and close the gap it leaves behind.
    #[instrument(skip(self), err)]
    pub async fn delete(&mut self, id: &str) -> Result<bool> {
        let Some(block) = self.get_by_id(id).await? else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM blocks WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        sqlx::query("UPDATE blocks SET sort_order = sort_order - 1 WHERE page_id = ? AND sort_order > ?")
            .bind(&block.page_id)
            .bind(block.sort_order)
            .execute(&mut *self.db)
            .await?;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::{Pages, Repository as _};
    use crate::db::models::pages::PageCreateDBRequest;
    use sqlx::SqlitePool;

    async fn create_page(conn: &mut SqliteConnection) -> String {
        let mut pages = Pages::new(conn);
        let page = pages
            .create(&PageCreateDBRequest {
                title: "Host".to_string(),
                slug: "host".to_string(),
                content: String::new(),
                page_type: "page".to_string(),
                excerpt: None,
                cover_image: None,
                published: true,
            })
            .await
            .unwrap();
        page.id
    }

    async fn append_block(conn: &mut SqliteConnection, page_id: &str, label: &str) -> Block {
        let mut blocks = Blocks::new(conn);
        blocks
            .create(&BlockCreateDBRequest {
                page_id: page_id.to_string(),
                block_type: "text".to_string(),
                content: format!(r#"{{"label":"{label}"}}"#),
                after_id: None,
            })
            .await
            .unwrap()
    }

    /// Asserts the per-page invariant: sort orders are exactly 0..n-1.
    async fn assert_contiguous(conn: &mut SqliteConnection, page_id: &str) -> Vec<Block> {
        let mut blocks = Blocks::new(conn);
        let listed = blocks.list_for_page(page_id).await.unwrap();
        for (i, block) in listed.iter().enumerate() {
            assert_eq!(block.sort_order, i as i64, "hole or duplicate at position {i}");
        }
        listed
    }

    #[sqlx::test]
    async fn appends_are_zero_based_and_contiguous(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let page_id = create_page(&mut conn).await;

        let first = append_block(&mut conn, &page_id, "a").await;
        assert_eq!(first.sort_order, 0);
        append_block(&mut conn, &page_id, "b").await;
        append_block(&mut conn, &page_id, "c").await;

        assert_contiguous(&mut conn, &page_id).await;
    }

    #[sqlx::test]
    async fn insert_after_shifts_later_blocks(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let page_id = create_page(&mut conn).await;

        // Four blocks at orders 0..4
        let labels = ["a", "b", "c", "d"];
        let mut ids = Vec::new();
        for label in labels {
            ids.push(append_block(&mut conn, &page_id, label).await.id);
        }

        // Insert after the block at order 2: new block gets 3, old order-3 moves to 4
        let mut blocks = Blocks::new(&mut conn);
        let inserted = blocks
            .create(&BlockCreateDBRequest {
                page_id: page_id.clone(),
                block_type: "text".to_string(),
                content: r#"{"label":"x"}"#.to_string(),
                after_id: Some(ids[2].clone()),
            })
            .await
            .unwrap();
        assert_eq!(inserted.sort_order, 3);

        let displaced = blocks.get_by_id(&ids[3]).await.unwrap().unwrap();
        assert_eq!(displaced.sort_order, 4);

        assert_contiguous(&mut conn, &page_id).await;
    }

    #[sqlx::test]
    async fn insert_after_vanished_reference_appends(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let page_id = create_page(&mut conn).await;

        append_block(&mut conn, &page_id, "a").await;
        append_block(&mut conn, &page_id, "b").await;

        let mut blocks = Blocks::new(&mut conn);
        let inserted = blocks
            .create(&BlockCreateDBRequest {
                page_id: page_id.clone(),
                block_type: "text".to_string(),
                content: "{}".to_string(),
                after_id: Some("deleted-long-ago".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(inserted.sort_order, 2);
        assert_contiguous(&mut conn, &page_id).await;
    }

    #[sqlx::test]
    async fn delete_compacts_the_sequence(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let page_id = create_page(&mut conn).await;

        let a = append_block(&mut conn, &page_id, "a").await;
        let b = append_block(&mut conn, &page_id, "b").await;
        let c = append_block(&mut conn, &page_id, "c").await;

        let mut blocks = Blocks::new(&mut conn);
        assert!(blocks.delete(&b.id).await.unwrap());

        let listed = assert_contiguous(&mut conn, &page_id).await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, a.id);
        assert_eq!(listed[1].id, c.id);
    }

    #[sqlx::test]
    async fn move_toward_front_and_back(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let page_id = create_page(&mut conn).await;

        let mut ids = Vec::new();
        for label in ["a", "b", "c", "d"] {
            ids.push(append_block(&mut conn, &page_id, label).await.id);
        }

        // d (order 3) to the front
        let mut blocks = Blocks::new(&mut conn);
        let moved = blocks.move_to(&ids[3], 0).await.unwrap();
        assert_eq!(moved.sort_order, 0);

        let listed = assert_contiguous(&mut conn, &page_id).await;
        let order: Vec<&str> = listed.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(order, vec![&ids[3], &ids[0], &ids[1], &ids[2]]);

        // Back again: move-to-front then move-to-back restores the original order
        let mut blocks = Blocks::new(&mut conn);
        blocks.move_to(&ids[3], 3).await.unwrap();

        let listed = assert_contiguous(&mut conn, &page_id).await;
        let order: Vec<&str> = listed.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(order, vec![&ids[0], &ids[1], &ids[2], &ids[3]]);
    }

    #[sqlx::test]
    async fn move_to_same_position_is_a_noop(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let page_id = create_page(&mut conn).await;

        append_block(&mut conn, &page_id, "a").await;
        let b = append_block(&mut conn, &page_id, "b").await;

        let mut blocks = Blocks::new(&mut conn);
        let moved = blocks.move_to(&b.id, 1).await.unwrap();
        assert_eq!(moved.sort_order, 1);
        assert_contiguous(&mut conn, &page_id).await;
    }

    #[sqlx::test]
    async fn ordering_is_isolated_per_page(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let first_page = create_page(&mut conn).await;

        let mut pages = Pages::new(&mut conn);
        let second_page = pages
            .create(&PageCreateDBRequest {
                title: "Other".to_string(),
                slug: "other".to_string(),
                content: String::new(),
                page_type: "page".to_string(),
                excerpt: None,
                cover_image: None,
                published: true,
            })
            .await
            .unwrap()
            .id;

        append_block(&mut conn, &first_page, "a").await;
        append_block(&mut conn, &first_page, "b").await;
        let other = append_block(&mut conn, &second_page, "x").await;

        // Starts from zero on its own page
        assert_eq!(other.sort_order, 0);

        // Mutating the first page leaves the second untouched
        let mut blocks = Blocks::new(&mut conn);
        let first_blocks = blocks.list_for_page(&first_page).await.unwrap();
        blocks.delete(&first_blocks[0].id).await.unwrap();

        assert_contiguous(&mut conn, &first_page).await;
        assert_contiguous(&mut conn, &second_page).await;
    }
}
