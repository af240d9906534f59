use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct Student {
    pub id: Uuid,
    pub code: String,
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademicRecord {
    pub subject: String,
    pub score: f64,
    pub assessment_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

impl AttendanceStatus {
    /// Late arrivals still count as attended; only absences do not.
    pub fn attended(self) -> bool {
        matches!(self, AttendanceStatus::Present | AttendanceStatus::Late)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "present" => Some(AttendanceStatus::Present),
            "absent" => Some(AttendanceStatus::Absent),
            "late" => Some(AttendanceStatus::Late),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementRecord {
    pub date: NaiveDate,
    pub logins: u32,
    pub assignments_submitted: u32,
    pub assignments_total: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Declining => "declining",
            Trend::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AcademicSummary {
    pub per_subject_average: BTreeMap<String, f64>,
    pub overall_average: f64,
    pub trend: Trend,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceSummary {
    pub rate: f64,
    pub absences_last_30_days: u32,
    pub trend: Trend,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngagementSummary {
    pub logins_last_30_days: u32,
    pub submission_rate: f64,
    pub trend: Trend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    LowAttendance,
    LowAcademic,
    LowEngagement,
    MissingAssignments,
    DecliningTrend,
}

impl AlertKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertKind::LowAttendance => "low_attendance",
            AlertKind::LowAcademic => "low_academic",
            AlertKind::LowEngagement => "low_engagement",
            AlertKind::MissingAssignments => "missing_assignments",
            AlertKind::DecliningTrend => "declining_trend",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low_attendance" => Some(AlertKind::LowAttendance),
            "low_academic" => Some(AlertKind::LowAcademic),
            "low_engagement" => Some(AlertKind::LowEngagement),
            "missing_assignments" => Some(AlertKind::MissingAssignments),
            "declining_trend" => Some(AlertKind::DecliningTrend),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "info" => Some(Severity::Info),
            "warning" => Some(Severity::Warning),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub id: Uuid,
    pub student_id: Uuid,
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Alert {
    pub fn new(
        student_id: Uuid,
        kind: AlertKind,
        severity: Severity,
        message: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Alert {
            id: Uuid::new_v4(),
            student_id,
            kind,
            severity,
            message,
            created_at,
            resolved: false,
            resolved_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Good,
    AttentionNeeded,
    Critical,
}

impl OverallStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OverallStatus::Good => "good",
            OverallStatus::AttentionNeeded => "attention_needed",
            OverallStatus::Critical => "critical",
        }
    }
}

/// The payload assembled by one dashboard run. Built fresh per request and
/// returned by value; never shared across runs.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub student: Student,
    pub window_days: i64,
    pub academic: AcademicSummary,
    pub attendance: AttendanceSummary,
    pub engagement: EngagementSummary,
    pub alerts: Vec<Alert>,
    pub insights: Vec<String>,
    pub overall_status: OverallStatus,
}
