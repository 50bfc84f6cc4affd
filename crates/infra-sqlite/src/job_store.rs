// SQLite JobStore Implementation

use async_trait::async_trait;
use jobscout_core::domain::{Job, JobId, JobStatus};
use jobscout_core::error::{AppError, Result};
use jobscout_core::port::{JobPage, JobSearchFilter, JobStore, StoreStats};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::str::FromStr;

// Helper to convert sqlx::Error to AppError with structured information
fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();

                // SQLite error codes: https://www.sqlite.org/rescode.html
                match code_str {
                    "2067" | "1555" => {
                        // UNIQUE constraint failed; the dedup arbiter fired
                        AppError::Conflict(format!(
                            "Unique constraint violation: {} ({})",
                            db_err.message(),
                            code_str
                        ))
                    }
                    "5" => {
                        // SQLITE_BUSY - database is locked
                        AppError::Database(format!(
                            "Database locked (SQLITE_BUSY): {}",
                            db_err.message()
                        ))
                    }
                    "13" => {
                        // SQLITE_FULL - database or disk is full
                        AppError::Database(format!("Database full: {}", db_err.message()))
                    }
                    _ => AppError::Database(format!(
                        "Database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                AppError::Database(format!("Database error: {}", db_err.message()))
            }
        }
        sqlx::Error::RowNotFound => AppError::Database("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => {
            AppError::Database(format!("Column not found: {col}"))
        }
        _ => AppError::Database(err.to_string()),
    }
}

pub struct SqliteJobStore {
    pool: SqlitePool,
}

impl SqliteJobStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Escape LIKE metacharacters so the location filter does true substring
/// matching ('%' and '_' in user input are literals, not wildcards).
fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn push_filters<'a>(builder: &mut QueryBuilder<'a, Sqlite>, filter: &'a JobSearchFilter) {
    builder
        .push(" WHERE status = ")
        .push_bind(filter.status.to_string());
    if let Some(batch_id) = &filter.batch_id {
        builder.push(" AND batch_id = ").push_bind(batch_id);
    }
    if let Some(site) = &filter.source_site {
        builder.push(" AND source_site = ").push_bind(site);
    }
    if let Some(location) = &filter.location {
        builder
            .push(" AND LOWER(location) LIKE LOWER(")
            .push_bind(format!("%{}%", escape_like(location)))
            .push(") ESCAPE '\\'");
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn insert(&self, job: &Job) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO jobs (
                id, title, company, location, job_url,
                description, is_remote, date_posted, source_site,
                search_title, search_location,
                status, batch_id, fetched_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&job.id)
        .bind(&job.title)
        .bind(&job.company)
        .bind(&job.location)
        .bind(&job.job_url)
        .bind(&job.description)
        .bind(if job.is_remote { 1 } else { 0 })
        .bind(&job.date_posted)
        .bind(&job.source_site)
        .bind(&job.search_title)
        .bind(&job.search_location)
        .bind(job.status.to_string())
        .bind(&job.batch_id)
        .bind(job.fetched_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_by_dedup_key(&self, key: &str) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE job_url = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(JobRow::into_job).transpose()
    }

    async fn find_by_id(&self, id: &JobId) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(JobRow::into_job).transpose()
    }

    async fn update_status(&self, id: &JobId, status: JobStatus) -> Result<()> {
        let result = sqlx::query("UPDATE jobs SET status = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Job {id} not found")));
        }
        Ok(())
    }

    async fn delete(&self, id: &JobId) -> Result<()> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Job {id} not found")));
        }
        Ok(())
    }

    async fn clear_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM jobs")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn search(&self, filter: &JobSearchFilter) -> Result<JobPage> {
        let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM jobs");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let mut page_query = QueryBuilder::new("SELECT * FROM jobs");
        push_filters(&mut page_query, filter);
        page_query
            .push(" ORDER BY fetched_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        let rows: Vec<JobRow> = page_query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let jobs = rows
            .into_iter()
            .map(JobRow::into_job)
            .collect::<Result<Vec<_>>>()?;

        Ok(JobPage {
            jobs,
            total,
            limit: filter.limit,
            offset: filter.offset,
        })
    }

    async fn stats(&self) -> Result<StoreStats> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM jobs GROUP BY status")
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        let mut stats = StoreStats::default();
        for (status, count) in rows {
            stats.total += count;
            match JobStatus::from_str(&status) {
                Ok(JobStatus::New) => stats.new = count,
                Ok(JobStatus::Saved) => stats.saved = count,
                Ok(JobStatus::Rejected) => stats.rejected = count,
                Err(_) => {
                    return Err(AppError::Database(format!(
                        "Unknown status in jobs table: {status}"
                    )))
                }
            }
        }
        Ok(stats)
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: String,
    title: String,
    company: String,
    location: String,
    job_url: String,
    description: String,
    is_remote: i64,
    date_posted: String,
    source_site: String,
    search_title: String,
    search_location: String,
    status: String,
    batch_id: String,
    fetched_at: i64,
}

impl JobRow {
    fn into_job(self) -> Result<Job> {
        let status = JobStatus::from_str(&self.status)
            .map_err(|e| AppError::Database(format!("Corrupt jobs row {}: {e}", self.id)))?;
        Ok(Job {
            id: self.id,
            title: self.title,
            company: self.company,
            location: self.location,
            job_url: self.job_url,
            description: self.description,
            is_remote: self.is_remote != 0,
            date_posted: self.date_posted,
            source_site: self.source_site,
            search_title: self.search_title,
            search_location: self.search_location,
            status,
            batch_id: self.batch_id,
            fetched_at: self.fetched_at,
        })
    }
}
