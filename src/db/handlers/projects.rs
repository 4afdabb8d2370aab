//! Database repository for portfolio projects.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;
use uuid::Uuid;

use crate::db::errors::{DbError, Result};
use crate::db::handlers::Repository;
use crate::db::models::projects::{Project, ProjectCreateDBRequest, ProjectFilter, ProjectUpdateDBRequest};

/// Repository for project operations. Unlike blocks, `sort_order` here is
/// caller-supplied display metadata, not a maintained contiguous sequence.
pub struct Projects<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Projects<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl Repository for Projects<'_> {
    type CreateRequest = ProjectCreateDBRequest;
    type UpdateRequest = ProjectUpdateDBRequest;
    type Response = Project;
    type Id = String;
    type Filter = ProjectFilter;

    #[instrument(skip_all, fields(slug = %request.slug), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Project> {
        let now = Utc::now();

        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (id, name, slug, url, description, long_description, color,
                                  status, screenshots, technologies, featured, sort_order,
                                  created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&request.name)
        .bind(&request.slug)
        .bind(&request.url)
        .bind(&request.description)
        .bind(&request.long_description)
        .bind(&request.color)
        .bind(&request.status)
        .bind(&request.screenshots)
        .bind(&request.technologies)
        .bind(request.featured)
        .bind(request.sort_order)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(project)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: String) -> Result<Option<Project>> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?")
            .bind(&id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(project)
    }

    /// Public listing hides archived projects and floats featured ones.
    #[instrument(skip_all, err)]
    async fn list(&mut self, filter: &ProjectFilter) -> Result<Vec<Project>> {
        let projects = if filter.include_archived {
            sqlx::query_as::<_, Project>("SELECT * FROM projects ORDER BY sort_order ASC, created_at DESC")
                .fetch_all(&mut *self.db)
                .await?
        } else {
            sqlx::query_as::<_, Project>(
                r#"
                SELECT * FROM projects
                WHERE status != 'archived'
                ORDER BY featured DESC, sort_order ASC, created_at DESC
                "#,
            )
            .fetch_all(&mut *self.db)
            .await?
        };

        Ok(projects)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: String) -> Result<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(&id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip_all, err)]
    async fn update(&mut self, id: String, request: &Self::UpdateRequest) -> Result<Project> {
        let now = Utc::now();

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE projects SET updated_at = ");
        qb.push_bind(now);
        if let Some(name) = &request.name {
            qb.push(", name = ").push_bind(name);
        }
        if let Some(slug) = &request.slug {
            qb.push(", slug = ").push_bind(slug);
        }
        if let Some(url) = &request.url {
            qb.push(", url = ").push_bind(url);
        }
        if let Some(description) = &request.description {
            qb.push(", description = ").push_bind(description);
        }
        if let Some(long_description) = &request.long_description {
            qb.push(", long_description = ").push_bind(long_description);
        }
        if let Some(color) = &request.color {
            qb.push(", color = ").push_bind(color);
        }
        if let Some(status) = &request.status {
            qb.push(", status = ").push_bind(status);
        }
        if let Some(screenshots) = &request.screenshots {
            qb.push(", screenshots = ").push_bind(screenshots);
        }
        if let Some(technologies) = &request.technologies {
            qb.push(", technologies = ").push_bind(technologies);
        }
        if let Some(featured) = request.featured {
            qb.push(", featured = ").push_bind(featured);
        }
        if let Some(sort_order) = request.sort_order {
            qb.push(", sort_order = ").push_bind(sort_order);
        }
        qb.push(" WHERE id = ").push_bind(&id);

        let result = qb.build().execute(&mut *self.db).await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?")
            .bind(&id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(project)
    }
}
