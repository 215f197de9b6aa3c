use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{Client, ProgressRecord};
use crate::source;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let clients = vec![
        (
            Uuid::parse_str("3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2")?,
            "C-001",
            "Avery Lee",
        ),
        (
            Uuid::parse_str("0c22f1f1-9184-4fd4-9b21-28c68a6a89dc")?,
            "C-002",
            "Jules Moreno",
        ),
        (
            Uuid::parse_str("d5a0a1a2-2a3c-44c2-8f73-60b7897a9dd2")?,
            "C-003",
            "Kiara Patel",
        ),
    ];

    for (id, code, name) in clients {
        sqlx::query(
            r#"
            INSERT INTO engagement_risk.clients (id, client_code, full_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (client_code) DO UPDATE
            SET full_name = EXCLUDED.full_name
            "#,
        )
        .bind(id)
        .bind(code)
        .bind(name)
        .execute(pool)
        .await?;
    }

    // (source_key, client_code, date, progress, sentiment, quality, note)
    let records = vec![
        ("seed-001", "C-001", (2026, 1, 12), 4.0, Some(0.6), Some(4), "Joined group activity"),
        ("seed-002", "C-001", (2026, 1, 26), 4.0, Some(0.5), Some(4), "Completed task list"),
        ("seed-003", "C-001", (2026, 2, 16), 2.5, Some(0.1), Some(3), "Left session early"),
        ("seed-004", "C-002", (2026, 1, 14), 3.0, Some(0.2), Some(3), "Settling in"),
        ("seed-005", "C-002", (2026, 2, 11), 3.5, Some(0.4), Some(4), "Improved focus"),
        ("seed-006", "C-002", (2026, 2, 25), 3.5, None, None, "Awaiting analysis"),
        ("seed-007", "C-003", (2026, 1, 8), 3.5, Some(0.3), Some(4), "Regular attendance"),
    ];

    for (source_key, code, (y, m, d), progress, sentiment, quality, note) in records {
        let assessment_date = NaiveDate::from_ymd_opt(y, m, d).context("invalid date")?;
        let client_id: Uuid = sqlx::query(
            "SELECT id FROM engagement_risk.clients WHERE client_code = $1",
        )
        .bind(code)
        .fetch_one(pool)
        .await?
        .get("id");

        sqlx::query(
            r#"
            INSERT INTO engagement_risk.progress_records
            (id, client_id, assessment_date, progress_score, sentiment_score, quality_score, notes, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(client_id)
        .bind(assessment_date)
        .bind(progress)
        .bind(sentiment)
        .bind(quality)
        .bind(note)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn fetch_clients(pool: &PgPool) -> anyhow::Result<Vec<Client>> {
    let rows = sqlx::query(
        "SELECT id, client_code, full_name FROM engagement_risk.clients ORDER BY client_code",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Client {
            client_id: row.get("id"),
            client_code: row.get("client_code"),
            full_name: row.get("full_name"),
        })
        .collect())
}

/// Records on or after `since`, oldest first.
pub async fn fetch_records(pool: &PgPool, since: NaiveDate) -> anyhow::Result<Vec<ProgressRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT client_id, staff_id, assessment_date, progress_score,
               sentiment_score, quality_score, notes
        FROM engagement_risk.progress_records
        WHERE assessment_date >= $1
        ORDER BY assessment_date, id
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| ProgressRecord {
            client_id: row.get("client_id"),
            staff_id: row.get("staff_id"),
            assessment_date: row.get("assessment_date"),
            progress_score: row.get("progress_score"),
            sentiment_score: row.get("sentiment_score"),
            quality_score: row.get("quality_score"),
            notes: row.get("notes"),
        })
        .collect())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let rows = source::read_rows(file)?;
    let mut inserted = 0usize;

    for row in rows {
        let client_id: Uuid = sqlx::query(
            r#"
            INSERT INTO engagement_risk.clients (id, client_code, full_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (client_code) DO UPDATE
            SET full_name = EXCLUDED.full_name
            RETURNING id
            "#,
        )
        .bind(row.resolved_client_id())
        .bind(&row.client_code)
        .bind(&row.full_name)
        .fetch_one(pool)
        .await?
        .get("id");

        let source_key = row
            .source_key
            .clone()
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO engagement_risk.progress_records
            (id, client_id, staff_id, assessment_date, progress_score, sentiment_score, quality_score, notes, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(client_id)
        .bind(row.staff_id)
        .bind(row.assessment_date)
        .bind(row.progress_score)
        .bind(row.sentiment_score)
        .bind(row.quality_score)
        .bind(&row.notes)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}
