use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use uuid::Uuid;

use crate::error::DashboardError;
use crate::models::{
    AcademicRecord, Alert, AlertKind, AttendanceRecord, AttendanceStatus, EngagementRecord,
    Severity, Student,
};

/// The narrow storage interface the dashboard pipeline reads through.
/// Empty record sets are Ok; only an unknown student code is an error.
#[async_trait]
pub trait StudentStore: Send + Sync {
    async fn resolve_student(&self, code: &str) -> Result<Student, DashboardError>;

    async fn academic_records(
        &self,
        student_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<AcademicRecord>, DashboardError>;

    async fn attendance_records(
        &self,
        student_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, DashboardError>;

    async fn engagement_records(
        &self,
        student_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<EngagementRecord>, DashboardError>;
}

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url {url}"))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("failed to open the SQLite database")?;
        Ok(SqliteStore { pool })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn upsert_student(&self, code: &str, full_name: &str, email: &str) -> anyhow::Result<Uuid> {
        let row = sqlx::query(
            r#"
            INSERT INTO students (id, code, full_name, email)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (code) DO UPDATE
            SET full_name = excluded.full_name, email = excluded.email
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(code)
        .bind(full_name)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        let id: String = row.get("id");
        Uuid::parse_str(&id).context("malformed student id in storage")
    }

    async fn insert_academic(
        &self,
        student_id: Uuid,
        subject: &str,
        score: f64,
        assessment_date: NaiveDate,
        source_key: &str,
    ) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO academic_scores (id, student_id, subject, score, assessment_date, source_key)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(student_id.to_string())
        .bind(subject)
        .bind(score)
        .bind(assessment_date)
        .bind(source_key)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_attendance(
        &self,
        student_id: Uuid,
        date: NaiveDate,
        status: AttendanceStatus,
        source_key: &str,
    ) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_records (id, student_id, date, status, source_key)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(student_id.to_string())
        .bind(date)
        .bind(status.as_str())
        .bind(source_key)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_engagement(
        &self,
        student_id: Uuid,
        date: NaiveDate,
        logins: u32,
        assignments_submitted: u32,
        assignments_total: u32,
        source_key: &str,
    ) -> anyhow::Result<u64> {
        if assignments_submitted > assignments_total {
            anyhow::bail!(
                "assignments_submitted ({assignments_submitted}) exceeds assignments_total \
                 ({assignments_total}) for {date}"
            );
        }
        let result = sqlx::query(
            r#"
            INSERT INTO engagement_logs
            (id, student_id, date, logins, assignments_submitted, assignments_total, source_key)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(student_id.to_string())
        .bind(date)
        .bind(logins)
        .bind(assignments_submitted)
        .bind(assignments_total)
        .bind(source_key)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Insert three demo students with thirty days of records: one steady,
    /// one middling, one at risk across all three domains.
    pub async fn seed(&self) -> anyhow::Result<()> {
        let today = Utc::now().date_naive();
        let subjects = ["Mathematics", "Science", "English", "History"];

        let alice = self
            .upsert_student("STU001", "Alice Johnson", "alice.johnson@newbridge.edu")
            .await?;
        let noah = self
            .upsert_student("STU002", "Noah Ramirez", "noah.ramirez@newbridge.edu")
            .await?;
        let maya = self
            .upsert_student("STU003", "Maya Chen", "maya.chen@newbridge.edu")
            .await?;

        // Alice: strong scores, near-perfect attendance, steady engagement.
        for (subject_idx, subject) in subjects.iter().enumerate() {
            for k in 0..7i64 {
                let days_ago = 2 + 4 * k;
                let score = 84.0 + subject_idx as f64 * 1.5 + (k % 3) as f64;
                self.insert_academic(
                    alice,
                    subject,
                    score,
                    today - Duration::days(days_ago),
                    &format!("seed-STU001-aca-{subject_idx}-{k}"),
                )
                .await?;
            }
        }
        for days_ago in 1..=30i64 {
            let status = if days_ago % 9 == 0 {
                AttendanceStatus::Late
            } else if days_ago == 5 || days_ago == 20 {
                AttendanceStatus::Absent
            } else {
                AttendanceStatus::Present
            };
            self.insert_attendance(
                alice,
                today - Duration::days(days_ago),
                status,
                &format!("seed-STU001-att-{days_ago}"),
            )
            .await?;

            let logins = if days_ago % 6 == 0 { 2 } else { 1 };
            let (total, submitted) = if days_ago % 3 == 0 {
                (1, u32::from(days_ago != 30))
            } else {
                (0, 0)
            };
            self.insert_engagement(
                alice,
                today - Duration::days(days_ago),
                logins,
                submitted,
                total,
                &format!("seed-STU001-eng-{days_ago}"),
            )
            .await?;
        }

        // Noah: passing grades and fine attendance, but assignments slip.
        for (subject_idx, subject) in subjects.iter().enumerate() {
            for k in 0..7i64 {
                let days_ago = 2 + 4 * k;
                let score = 72.0 + subject_idx as f64 * 1.5 + (k % 2) as f64;
                self.insert_academic(
                    noah,
                    subject,
                    score,
                    today - Duration::days(days_ago),
                    &format!("seed-STU002-aca-{subject_idx}-{k}"),
                )
                .await?;
            }
        }
        for days_ago in 1..=30i64 {
            let status = if days_ago % 15 == 0 {
                AttendanceStatus::Absent
            } else if days_ago % 7 == 0 {
                AttendanceStatus::Late
            } else {
                AttendanceStatus::Present
            };
            self.insert_attendance(
                noah,
                today - Duration::days(days_ago),
                status,
                &format!("seed-STU002-att-{days_ago}"),
            )
            .await?;

            let logins = u32::from(days_ago % 5 != 0);
            let (total, submitted) = if days_ago % 3 == 0 {
                (1, u32::from(days_ago % 9 != 0))
            } else {
                (0, 0)
            };
            self.insert_engagement(
                noah,
                today - Duration::days(days_ago),
                logins,
                submitted,
                total,
                &format!("seed-STU002-eng-{days_ago}"),
            )
            .await?;
        }

        // Maya: sliding scores, heavy absences, little platform activity.
        for (subject_idx, subject) in subjects.iter().enumerate() {
            for k in 0..7i64 {
                let days_ago = 2 + 4 * k;
                let score = 51.0 + subject_idx as f64 * 1.5 + k as f64;
                self.insert_academic(
                    maya,
                    subject,
                    score,
                    today - Duration::days(days_ago),
                    &format!("seed-STU003-aca-{subject_idx}-{k}"),
                )
                .await?;
            }
        }
        for days_ago in 1..=30i64 {
            let status = if days_ago % 2 == 0 || days_ago == 5 {
                AttendanceStatus::Absent
            } else {
                AttendanceStatus::Present
            };
            self.insert_attendance(
                maya,
                today - Duration::days(days_ago),
                status,
                &format!("seed-STU003-att-{days_ago}"),
            )
            .await?;

            let logins = u32::from(days_ago % 4 == 0);
            let (total, submitted) = if days_ago % 3 == 0 {
                (1, u32::from(days_ago % 6 == 0))
            } else {
                (0, 0)
            };
            self.insert_engagement(
                maya,
                today - Duration::days(days_ago),
                logins,
                submitted,
                total,
                &format!("seed-STU003-eng-{days_ago}"),
            )
            .await?;
        }

        Ok(())
    }

    pub async fn import_academic_csv(&self, csv_path: &Path) -> anyhow::Result<usize> {
        #[derive(serde::Deserialize)]
        struct CsvRow {
            code: String,
            full_name: String,
            email: String,
            subject: String,
            score: f64,
            assessment_date: NaiveDate,
            source_key: Option<String>,
        }

        let mut reader = csv::Reader::from_path(csv_path)?;
        let mut inserted = 0usize;

        for result in reader.deserialize::<CsvRow>() {
            let row = result?;
            if !(0.0..=100.0).contains(&row.score) {
                anyhow::bail!(
                    "score {} out of range 0-100 for {} on {}",
                    row.score,
                    row.code,
                    row.assessment_date
                );
            }
            let student_id = self
                .upsert_student(&row.code, &row.full_name, &row.email)
                .await?;
            let source_key = row
                .source_key
                .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));
            inserted += self
                .insert_academic(
                    student_id,
                    &row.subject,
                    row.score,
                    row.assessment_date,
                    &source_key,
                )
                .await? as usize;
        }

        Ok(inserted)
    }

    pub async fn import_attendance_csv(&self, csv_path: &Path) -> anyhow::Result<usize> {
        #[derive(serde::Deserialize)]
        struct CsvRow {
            code: String,
            full_name: String,
            email: String,
            date: NaiveDate,
            status: String,
            source_key: Option<String>,
        }

        let mut reader = csv::Reader::from_path(csv_path)?;
        let mut inserted = 0usize;

        for result in reader.deserialize::<CsvRow>() {
            let row = result?;
            let status = AttendanceStatus::parse(&row.status).with_context(|| {
                format!("unknown attendance status {:?} for {}", row.status, row.code)
            })?;
            let student_id = self
                .upsert_student(&row.code, &row.full_name, &row.email)
                .await?;
            let source_key = row
                .source_key
                .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));
            inserted += self
                .insert_attendance(student_id, row.date, status, &source_key)
                .await? as usize;
        }

        Ok(inserted)
    }

    pub async fn import_engagement_csv(&self, csv_path: &Path) -> anyhow::Result<usize> {
        #[derive(serde::Deserialize)]
        struct CsvRow {
            code: String,
            full_name: String,
            email: String,
            date: NaiveDate,
            logins: u32,
            assignments_submitted: u32,
            assignments_total: u32,
            source_key: Option<String>,
        }

        let mut reader = csv::Reader::from_path(csv_path)?;
        let mut inserted = 0usize;

        for result in reader.deserialize::<CsvRow>() {
            let row = result?;
            let student_id = self
                .upsert_student(&row.code, &row.full_name, &row.email)
                .await?;
            let source_key = row
                .source_key
                .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));
            inserted += self
                .insert_engagement(
                    student_id,
                    row.date,
                    row.logins,
                    row.assignments_submitted,
                    row.assignments_total,
                    &source_key,
                )
                .await? as usize;
        }

        Ok(inserted)
    }

    pub async fn save_alerts(&self, alerts: &[Alert]) -> anyhow::Result<()> {
        for alert in alerts {
            sqlx::query(
                r#"
                INSERT INTO alerts
                (id, student_id, kind, severity, message, created_at, resolved, resolved_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(alert.id.to_string())
            .bind(alert.student_id.to_string())
            .bind(alert.kind.as_str())
            .bind(alert.severity.as_str())
            .bind(&alert.message)
            .bind(alert.created_at)
            .bind(alert.resolved)
            .bind(alert.resolved_at)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    pub async fn list_alerts(
        &self,
        student_id: Uuid,
        include_resolved: bool,
    ) -> anyhow::Result<Vec<Alert>> {
        let mut query = String::from(
            "SELECT id, student_id, kind, severity, message, created_at, resolved, resolved_at \
             FROM alerts WHERE student_id = ?1",
        );
        if !include_resolved {
            query.push_str(" AND resolved = 0");
        }
        query.push_str(" ORDER BY created_at DESC");

        let rows = sqlx::query(&query)
            .bind(student_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        let mut alerts = Vec::new();
        for row in rows {
            let id: String = row.get("id");
            let stored_student: String = row.get("student_id");
            let kind: String = row.get("kind");
            let severity: String = row.get("severity");
            alerts.push(Alert {
                id: Uuid::parse_str(&id).context("malformed alert id in storage")?,
                student_id: Uuid::parse_str(&stored_student)
                    .context("malformed student id in storage")?,
                kind: AlertKind::parse(&kind)
                    .with_context(|| format!("unknown alert kind {kind:?}"))?,
                severity: Severity::parse(&severity)
                    .with_context(|| format!("unknown severity {severity:?}"))?,
                message: row.get("message"),
                created_at: row.get("created_at"),
                resolved: row.get("resolved"),
                resolved_at: row.get("resolved_at"),
            });
        }

        Ok(alerts)
    }

    /// Returns false when the alert does not exist or was already resolved.
    pub async fn resolve_alert(&self, alert_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE alerts SET resolved = 1, resolved_at = ?1 WHERE id = ?2 AND resolved = 0",
        )
        .bind(Utc::now())
        .bind(alert_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn parse_stored_uuid(value: &str) -> Result<Uuid, DashboardError> {
    Uuid::parse_str(value)
        .map_err(|err| DashboardError::Internal(format!("malformed uuid in storage: {err}")))
}

#[async_trait]
impl StudentStore for SqliteStore {
    async fn resolve_student(&self, code: &str) -> Result<Student, DashboardError> {
        let row = sqlx::query("SELECT id, code, full_name, email FROM students WHERE code = ?1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DashboardError::StudentNotFound(code.to_string()))?;

        let id: String = row.get("id");
        Ok(Student {
            id: parse_stored_uuid(&id)?,
            code: row.get("code"),
            full_name: row.get("full_name"),
            email: row.get("email"),
        })
    }

    async fn academic_records(
        &self,
        student_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<AcademicRecord>, DashboardError> {
        let rows = sqlx::query(
            "SELECT subject, score, assessment_date FROM academic_scores \
             WHERE student_id = ?1 AND assessment_date >= ?2 \
             ORDER BY assessment_date ASC",
        )
        .bind(student_id.to_string())
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| AcademicRecord {
                subject: row.get("subject"),
                score: row.get("score"),
                assessment_date: row.get("assessment_date"),
            })
            .collect())
    }

    async fn attendance_records(
        &self,
        student_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, DashboardError> {
        let rows = sqlx::query(
            "SELECT date, status FROM attendance_records \
             WHERE student_id = ?1 AND date >= ?2 \
             ORDER BY date ASC",
        )
        .bind(student_id.to_string())
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::new();
        for row in rows {
            let status: String = row.get("status");
            records.push(AttendanceRecord {
                date: row.get("date"),
                status: AttendanceStatus::parse(&status).ok_or_else(|| {
                    DashboardError::Internal(format!("unknown attendance status {status:?}"))
                })?,
            });
        }
        Ok(records)
    }

    async fn engagement_records(
        &self,
        student_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<EngagementRecord>, DashboardError> {
        let rows = sqlx::query(
            "SELECT date, logins, assignments_submitted, assignments_total FROM engagement_logs \
             WHERE student_id = ?1 AND date >= ?2 \
             ORDER BY date ASC",
        )
        .bind(student_id.to_string())
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| EngagementRecord {
                date: row.get("date"),
                logins: row.get("logins"),
                assignments_submitted: row.get("assignments_submitted"),
                assignments_total: row.get("assignments_total"),
            })
            .collect())
    }
}
