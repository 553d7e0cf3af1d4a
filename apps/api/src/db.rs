use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS job_postings (
        id          BIGSERIAL PRIMARY KEY,
        title       TEXT NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS resumes (
        id                  UUID PRIMARY KEY,
        job_posting_id      BIGINT NOT NULL REFERENCES job_postings(id),
        candidate_name      TEXT NOT NULL,
        candidate_email     TEXT NOT NULL,
        candidate_phone     TEXT,
        file_name           TEXT NOT NULL,
        file_path           TEXT NOT NULL,
        file_size           BIGINT NOT NULL,
        content_type        TEXT,
        extracted_text      TEXT NOT NULL,
        years_of_experience INTEGER,
        skills              TEXT,
        education           TEXT,
        work_experience     TEXT,
        certifications      TEXT,
        status              TEXT NOT NULL,
        submission_date     TIMESTAMPTZ NOT NULL,
        created_at          TIMESTAMPTZ NOT NULL,
        updated_at          TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS resumes_candidate_email_job_posting_id_key
        ON resumes (candidate_email, job_posting_id)
    "#,
];

/// Creates the tables and the duplicate-application index if they are missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("Failed to apply database schema")?;
    }
    info!("Database schema ready");
    Ok(())
}
