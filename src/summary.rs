//! Per-domain summarizers. Each one reduces a single record set to its
//! summary independently; none reads another domain's data.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, Utc};

use crate::error::DashboardError;
use crate::models::{
    AcademicRecord, AcademicSummary, AttendanceRecord, AttendanceSummary, EngagementRecord,
    EngagementSummary, Trend,
};

pub const DEFAULT_WINDOW_DAYS: i64 = 30;

// Trend tolerances are sized to each domain's metric scale.
const ACADEMIC_TREND_TOLERANCE: f64 = 2.0;
const ATTENDANCE_TREND_TOLERANCE: f64 = 0.05;
const ENGAGEMENT_TREND_TOLERANCE: f64 = 0.5;

/// A lookback window ending on a fixed date (normally today).
#[derive(Debug, Clone, Copy)]
pub struct Window {
    days: i64,
    end: NaiveDate,
}

impl Window {
    pub fn ending(days: i64, end: NaiveDate) -> Result<Self, DashboardError> {
        if days <= 0 {
            return Err(DashboardError::InvalidWindow(days));
        }
        Ok(Window { days, end })
    }

    pub fn ending_today(days: i64) -> Result<Self, DashboardError> {
        Self::ending(days, Utc::now().date_naive())
    }

    pub fn days(&self) -> i64 {
        self.days
    }

    pub fn start(&self) -> NaiveDate {
        self.end - Duration::days(self.days)
    }

    /// Split point between the earlier and the recent half of the window.
    pub fn midpoint(&self) -> NaiveDate {
        self.end - Duration::days(self.days / 2)
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Compare the recent half of the window against the earlier half. A half
/// with no records gives no signal, so the trend stays stable.
fn classify_trend(earlier: Option<f64>, recent: Option<f64>, tolerance: f64) -> Trend {
    match (earlier, recent) {
        (Some(earlier), Some(recent)) if recent > earlier + tolerance => Trend::Improving,
        (Some(earlier), Some(recent)) if recent < earlier - tolerance => Trend::Declining,
        _ => Trend::Stable,
    }
}

pub fn summarize_academic(records: &[AcademicRecord], window: &Window) -> AcademicSummary {
    let start = window.start();
    let midpoint = window.midpoint();

    let mut per_subject: BTreeMap<String, (f64, u32)> = BTreeMap::new();
    let mut earlier = Vec::new();
    let mut recent = Vec::new();

    for record in records.iter().filter(|r| r.assessment_date >= start) {
        let entry = per_subject.entry(record.subject.clone()).or_insert((0.0, 0));
        entry.0 += record.score;
        entry.1 += 1;

        if record.assessment_date >= midpoint {
            recent.push(record.score);
        } else {
            earlier.push(record.score);
        }
    }

    let per_subject_average: BTreeMap<String, f64> = per_subject
        .into_iter()
        .map(|(subject, (total, count))| (subject, total / count as f64))
        .collect();

    let subject_averages: Vec<f64> = per_subject_average.values().copied().collect();
    let overall_average = mean(&subject_averages).unwrap_or(0.0);
    let trend = classify_trend(mean(&earlier), mean(&recent), ACADEMIC_TREND_TOLERANCE);

    AcademicSummary {
        per_subject_average,
        overall_average,
        trend,
    }
}

pub fn summarize_attendance(records: &[AttendanceRecord], window: &Window) -> AttendanceSummary {
    let start = window.start();
    let midpoint = window.midpoint();

    let mut attended = 0u32;
    let mut absences = 0u32;
    let mut total = 0u32;
    let mut earlier = Vec::new();
    let mut recent = Vec::new();

    for record in records.iter().filter(|r| r.date >= start) {
        total += 1;
        let indicator = if record.status.attended() {
            attended += 1;
            1.0
        } else {
            absences += 1;
            0.0
        };

        if record.date >= midpoint {
            recent.push(indicator);
        } else {
            earlier.push(indicator);
        }
    }

    let rate = if total == 0 {
        0.0
    } else {
        f64::from(attended) / f64::from(total)
    };
    let trend = classify_trend(mean(&earlier), mean(&recent), ATTENDANCE_TREND_TOLERANCE);

    AttendanceSummary {
        rate,
        absences_last_30_days: absences,
        trend,
    }
}

pub fn summarize_engagement(records: &[EngagementRecord], window: &Window) -> EngagementSummary {
    let start = window.start();
    let midpoint = window.midpoint();

    let mut logins = 0u32;
    let mut submitted = 0u32;
    let mut assigned = 0u32;
    let mut earlier = Vec::new();
    let mut recent = Vec::new();

    for record in records.iter().filter(|r| r.date >= start) {
        logins += record.logins;
        submitted += record.assignments_submitted;
        assigned += record.assignments_total;

        if record.date >= midpoint {
            recent.push(f64::from(record.logins));
        } else {
            earlier.push(f64::from(record.logins));
        }
    }

    let submission_rate = if assigned == 0 {
        0.0
    } else {
        f64::from(submitted) / f64::from(assigned)
    };
    let trend = classify_trend(mean(&earlier), mean(&recent), ENGAGEMENT_TREND_TOLERANCE);

    EngagementSummary {
        logins_last_30_days: logins,
        submission_rate,
        trend,
    }
}
