use std::fmt::Write;

use crate::models::Dashboard;

pub fn build_report(dashboard: &Dashboard) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Student Progress Report");
    let _ = writeln!(
        output,
        "Generated for {} ({}) over the last {} days",
        dashboard.student.full_name, dashboard.student.code, dashboard.window_days
    );
    let _ = writeln!(
        output,
        "Overall status: {}",
        dashboard.overall_status.as_str()
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Academic");
    let _ = writeln!(
        output,
        "Overall average {:.1}% ({})",
        dashboard.academic.overall_average,
        dashboard.academic.trend.as_str()
    );
    if dashboard.academic.per_subject_average.is_empty() {
        let _ = writeln!(output, "No assessments recorded for this window.");
    } else {
        for (subject, average) in dashboard.academic.per_subject_average.iter() {
            let _ = writeln!(output, "- {subject}: {average:.1}%");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Attendance");
    let _ = writeln!(
        output,
        "Rate {:.1}% with {} absences ({})",
        dashboard.attendance.rate * 100.0,
        dashboard.attendance.absences_last_30_days,
        dashboard.attendance.trend.as_str()
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Engagement");
    let _ = writeln!(
        output,
        "{} logins, {:.0}% of assignments submitted ({})",
        dashboard.engagement.logins_last_30_days,
        dashboard.engagement.submission_rate * 100.0,
        dashboard.engagement.trend.as_str()
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Alerts");
    if dashboard.alerts.is_empty() {
        let _ = writeln!(output, "No active alerts.");
    } else {
        for alert in dashboard.alerts.iter() {
            let _ = writeln!(
                output,
                "- [{}] {}: {}",
                alert.severity.as_str(),
                alert.kind.as_str(),
                alert.message
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Insights");
    for insight in dashboard.insights.iter() {
        let _ = writeln!(output, "- {insight}");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use chrono::Utc;
    use uuid::Uuid;

    use crate::models::{
        AcademicSummary, Alert, AlertKind, AttendanceSummary, EngagementSummary, OverallStatus,
        Severity, Student, Trend,
    };

    fn sample_dashboard(alerts: Vec<Alert>) -> Dashboard {
        let mut per_subject = BTreeMap::new();
        per_subject.insert("Mathematics".to_string(), 82.5);
        per_subject.insert("Science".to_string(), 77.5);

        Dashboard {
            student: Student {
                id: Uuid::new_v4(),
                code: "STU001".to_string(),
                full_name: "Alice Johnson".to_string(),
                email: "alice.johnson@newbridge.edu".to_string(),
            },
            window_days: 30,
            academic: AcademicSummary {
                per_subject_average: per_subject,
                overall_average: 80.0,
                trend: Trend::Stable,
            },
            attendance: AttendanceSummary {
                rate: 0.9,
                absences_last_30_days: 3,
                trend: Trend::Stable,
            },
            engagement: EngagementSummary {
                logins_last_30_days: 22,
                submission_rate: 0.85,
                trend: Trend::Improving,
            },
            alerts,
            insights: vec!["Attendance is excellent at 90.0%".to_string()],
            overall_status: OverallStatus::Good,
        }
    }

    #[test]
    fn report_lists_subjects_and_insights() {
        let report = build_report(&sample_dashboard(Vec::new()));

        assert!(report.contains("# Student Progress Report"));
        assert!(report.contains("Alice Johnson (STU001)"));
        assert!(report.contains("- Mathematics: 82.5%"));
        assert!(report.contains("No active alerts."));
        assert!(report.contains("- Attendance is excellent at 90.0%"));
    }

    #[test]
    fn report_renders_alert_lines() {
        let alert = Alert::new(
            Uuid::new_v4(),
            AlertKind::LowEngagement,
            Severity::Warning,
            "Only 4 logins recorded in the last 30 days".to_string(),
            Utc::now(),
        );
        let report = build_report(&sample_dashboard(vec![alert]));

        assert!(report.contains("- [warning] low_engagement: Only 4 logins"));
        assert!(!report.contains("No active alerts."));
    }
}
