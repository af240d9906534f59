//! Rule evaluation over the three domain summaries. Pure: no I/O, no clock
//! reads, no hidden state. All rules run on every evaluation and the alert
//! list preserves rule order.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::Thresholds;
use crate::models::{
    AcademicSummary, Alert, AlertKind, AttendanceSummary, EngagementSummary, OverallStatus,
    Severity, Trend,
};

pub fn evaluate(
    student_id: Uuid,
    academic: &AcademicSummary,
    attendance: &AttendanceSummary,
    engagement: &EngagementSummary,
    thresholds: &Thresholds,
    now: DateTime<Utc>,
) -> (Vec<Alert>, Vec<String>) {
    let mut alerts = Vec::new();

    if attendance.rate < thresholds.min_attendance_rate {
        let severity = if attendance.rate < thresholds.critical_attendance_rate {
            Severity::Critical
        } else {
            Severity::Warning
        };
        alerts.push(Alert::new(
            student_id,
            AlertKind::LowAttendance,
            severity,
            format!(
                "Attendance is {:.1}%, below the {:.0}% threshold",
                attendance.rate * 100.0,
                thresholds.min_attendance_rate * 100.0
            ),
            now,
        ));
    }

    if academic.overall_average < thresholds.min_overall_average {
        let severity = if academic.overall_average < thresholds.critical_overall_average {
            Severity::Critical
        } else {
            Severity::Warning
        };
        alerts.push(Alert::new(
            student_id,
            AlertKind::LowAcademic,
            severity,
            format!(
                "Average score is {:.1}%, below the {:.0}% threshold",
                academic.overall_average, thresholds.min_overall_average
            ),
            now,
        ));
    }

    if engagement.logins_last_30_days < thresholds.min_logins {
        alerts.push(Alert::new(
            student_id,
            AlertKind::LowEngagement,
            Severity::Warning,
            format!(
                "Only {} logins recorded in the last 30 days",
                engagement.logins_last_30_days
            ),
            now,
        ));
    }

    if engagement.submission_rate < thresholds.min_submission_rate {
        alerts.push(Alert::new(
            student_id,
            AlertKind::MissingAssignments,
            Severity::Warning,
            format!(
                "Assignment submission rate is {:.0}%, below the {:.0}% target",
                engagement.submission_rate * 100.0,
                thresholds.min_submission_rate * 100.0
            ),
            now,
        ));
    }

    let declining = [
        (academic.trend, "Academic performance"),
        (attendance.trend, "Attendance"),
        (engagement.trend, "Engagement"),
    ];
    for (trend, domain) in declining {
        if trend == Trend::Declining {
            alerts.push(Alert::new(
                student_id,
                AlertKind::DecliningTrend,
                Severity::Info,
                format!("{domain} is declining compared to the earlier part of the window"),
                now,
            ));
        }
    }

    let insights = build_insights(academic, attendance, engagement, thresholds);

    (alerts, insights)
}

fn build_insights(
    academic: &AcademicSummary,
    attendance: &AttendanceSummary,
    engagement: &EngagementSummary,
    thresholds: &Thresholds,
) -> Vec<String> {
    let mut insights = Vec::new();

    if academic.overall_average < thresholds.min_overall_average {
        insights.push(format!(
            "Academic performance is below expectations (average {:.1}%)",
            academic.overall_average
        ));
    } else if academic.overall_average < 80.0 {
        insights.push("Academic performance is satisfactory but has room to improve".to_string());
    } else {
        insights.push(format!(
            "Academic performance is strong (average {:.1}%)",
            academic.overall_average
        ));
    }

    if attendance.rate < thresholds.min_attendance_rate {
        insights.push(format!(
            "Attendance needs attention at {:.1}%, with {} absences in the window",
            attendance.rate * 100.0,
            attendance.absences_last_30_days
        ));
    } else if attendance.rate < 0.85 {
        insights.push("Attendance is acceptable but could be better".to_string());
    } else {
        insights.push(format!(
            "Attendance is excellent at {:.1}%",
            attendance.rate * 100.0
        ));
    }

    if engagement.logins_last_30_days < thresholds.min_logins {
        insights.push(format!(
            "Login activity is low: {} logins in the last 30 days",
            engagement.logins_last_30_days
        ));
    } else if engagement.submission_rate < thresholds.min_submission_rate {
        insights.push(format!(
            "Assignment submissions are lagging at {:.0}%",
            engagement.submission_rate * 100.0
        ));
    } else {
        insights.push(format!(
            "Engagement looks healthy: {} logins, {:.0}% of assignments submitted",
            engagement.logins_last_30_days,
            engagement.submission_rate * 100.0
        ));
    }

    for (trend, domain) in [
        (academic.trend, "Academic performance"),
        (attendance.trend, "Attendance"),
        (engagement.trend, "Engagement"),
    ] {
        match trend {
            Trend::Declining => insights.push(format!("{domain} is showing a declining trend")),
            Trend::Improving => insights.push(format!("{domain} is improving")),
            Trend::Stable => {}
        }
    }

    insights.push(format!(
        "Academic average {:.1}% | Attendance {:.1}% | {} logins",
        academic.overall_average,
        attendance.rate * 100.0,
        engagement.logins_last_30_days
    ));

    insights
}

/// Severity roll-up for the dashboard header. Info-only alert lists do not
/// demand attention on their own.
pub fn overall_status(alerts: &[Alert]) -> OverallStatus {
    match alerts.iter().map(|alert| alert.severity).max() {
        Some(Severity::Critical) => OverallStatus::Critical,
        Some(Severity::Warning) => OverallStatus::AttentionNeeded,
        _ => OverallStatus::Good,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn good_academic() -> AcademicSummary {
        let mut per_subject = BTreeMap::new();
        per_subject.insert("Mathematics".to_string(), 85.0);
        AcademicSummary {
            per_subject_average: per_subject,
            overall_average: 85.0,
            trend: Trend::Stable,
        }
    }

    fn good_attendance() -> AttendanceSummary {
        AttendanceSummary {
            rate: 0.95,
            absences_last_30_days: 1,
            trend: Trend::Stable,
        }
    }

    fn good_engagement() -> EngagementSummary {
        EngagementSummary {
            logins_last_30_days: 20,
            submission_rate: 0.9,
            trend: Trend::Stable,
        }
    }

    fn student() -> Uuid {
        Uuid::new_v4()
    }

    fn now() -> DateTime<Utc> {
        "2026-03-31T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn all_good_summaries_produce_no_alerts_but_insights() {
        let (alerts, insights) = evaluate(
            student(),
            &good_academic(),
            &good_attendance(),
            &good_engagement(),
            &Thresholds::default(),
            now(),
        );

        assert!(alerts.is_empty());
        assert!(!insights.is_empty());
    }

    #[test]
    fn attendance_sixty_percent_is_a_single_warning() {
        let attendance = AttendanceSummary {
            rate: 0.60,
            absences_last_30_days: 12,
            trend: Trend::Stable,
        };

        let (alerts, _) = evaluate(
            student(),
            &good_academic(),
            &attendance,
            &good_engagement(),
            &Thresholds::default(),
            now(),
        );

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::LowAttendance);
        assert_eq!(alerts[0].severity, Severity::Warning);
    }

    #[test]
    fn attendance_forty_percent_escalates_to_critical() {
        let attendance = AttendanceSummary {
            rate: 0.40,
            absences_last_30_days: 18,
            trend: Trend::Stable,
        };

        let (alerts, _) = evaluate(
            student(),
            &good_academic(),
            &attendance,
            &good_engagement(),
            &Thresholds::default(),
            now(),
        );

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::LowAttendance);
        assert_eq!(alerts[0].severity, Severity::Critical);
    }

    #[test]
    fn low_average_and_low_submissions_fire_in_rule_order() {
        let academic = AcademicSummary {
            overall_average: 65.0,
            ..good_academic()
        };
        let engagement = EngagementSummary {
            submission_rate: 0.5,
            ..good_engagement()
        };

        let (alerts, _) = evaluate(
            student(),
            &academic,
            &good_attendance(),
            &engagement,
            &Thresholds::default(),
            now(),
        );

        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].kind, AlertKind::LowAcademic);
        assert_eq!(alerts[0].severity, Severity::Warning);
        assert_eq!(alerts[1].kind, AlertKind::MissingAssignments);
        assert_eq!(alerts[1].severity, Severity::Warning);
    }

    #[test]
    fn academic_below_fifty_is_critical() {
        let academic = AcademicSummary {
            overall_average: 42.0,
            ..good_academic()
        };

        let (alerts, _) = evaluate(
            student(),
            &academic,
            &good_attendance(),
            &good_engagement(),
            &Thresholds::default(),
            now(),
        );

        assert_eq!(alerts[0].kind, AlertKind::LowAcademic);
        assert_eq!(alerts[0].severity, Severity::Critical);
    }

    #[test]
    fn few_logins_raise_a_low_engagement_warning() {
        let engagement = EngagementSummary {
            logins_last_30_days: 4,
            ..good_engagement()
        };

        let (alerts, _) = evaluate(
            student(),
            &good_academic(),
            &good_attendance(),
            &engagement,
            &Thresholds::default(),
            now(),
        );

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::LowEngagement);
        assert_eq!(alerts[0].severity, Severity::Warning);
    }

    #[test]
    fn one_declining_trend_alert_per_declining_domain() {
        let academic = AcademicSummary {
            trend: Trend::Declining,
            ..good_academic()
        };
        let engagement = EngagementSummary {
            trend: Trend::Declining,
            ..good_engagement()
        };

        let (alerts, _) = evaluate(
            student(),
            &academic,
            &good_attendance(),
            &engagement,
            &Thresholds::default(),
            now(),
        );

        let declining: Vec<&Alert> = alerts
            .iter()
            .filter(|a| a.kind == AlertKind::DecliningTrend)
            .collect();
        assert_eq!(declining.len(), 2);
        assert!(declining.iter().all(|a| a.severity == Severity::Info));
        assert!(declining[0].message.starts_with("Academic"));
        assert!(declining[1].message.starts_with("Engagement"));
    }

    #[test]
    fn evaluation_is_deterministic_and_order_stable() {
        let academic = AcademicSummary {
            overall_average: 48.0,
            trend: Trend::Declining,
            ..good_academic()
        };
        let attendance = AttendanceSummary {
            rate: 0.55,
            absences_last_30_days: 10,
            trend: Trend::Declining,
        };
        let engagement = EngagementSummary {
            logins_last_30_days: 3,
            submission_rate: 0.2,
            trend: Trend::Declining,
        };

        let id = student();
        let (first, first_insights) = evaluate(
            id,
            &academic,
            &attendance,
            &engagement,
            &Thresholds::default(),
            now(),
        );
        let (second, second_insights) = evaluate(
            id,
            &academic,
            &attendance,
            &engagement,
            &Thresholds::default(),
            now(),
        );

        let kinds: Vec<AlertKind> = first.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                AlertKind::LowAttendance,
                AlertKind::LowAcademic,
                AlertKind::LowEngagement,
                AlertKind::MissingAssignments,
                AlertKind::DecliningTrend,
                AlertKind::DecliningTrend,
                AlertKind::DecliningTrend,
            ]
        );
        assert_eq!(
            first.iter().map(|a| a.kind).collect::<Vec<_>>(),
            second.iter().map(|a| a.kind).collect::<Vec<_>>()
        );
        assert_eq!(
            first.iter().map(|a| &a.message).collect::<Vec<_>>(),
            second.iter().map(|a| &a.message).collect::<Vec<_>>()
        );
        assert_eq!(first_insights, second_insights);
    }

    #[test]
    fn changing_one_summary_leaves_other_rules_alone() {
        let attendance_bad = AttendanceSummary {
            rate: 0.40,
            absences_last_30_days: 18,
            trend: Trend::Stable,
        };
        let engagement = EngagementSummary {
            submission_rate: 0.5,
            ..good_engagement()
        };

        let (with_good_attendance, _) = evaluate(
            student(),
            &good_academic(),
            &good_attendance(),
            &engagement,
            &Thresholds::default(),
            now(),
        );
        let (with_bad_attendance, _) = evaluate(
            student(),
            &good_academic(),
            &attendance_bad,
            &engagement,
            &Thresholds::default(),
            now(),
        );

        let engagement_alerts = |alerts: &[Alert]| {
            alerts
                .iter()
                .filter(|a| a.kind == AlertKind::MissingAssignments)
                .count()
        };
        assert_eq!(
            engagement_alerts(&with_good_attendance),
            engagement_alerts(&with_bad_attendance)
        );
    }

    #[test]
    fn custom_thresholds_shift_the_cutoffs() {
        let mut thresholds = Thresholds::default();
        thresholds.min_attendance_rate = 0.99;

        let (alerts, _) = evaluate(
            student(),
            &good_academic(),
            &good_attendance(),
            &good_engagement(),
            &thresholds,
            now(),
        );

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::LowAttendance);
    }

    #[test]
    fn overall_status_follows_severity_precedence() {
        let id = student();
        let info = Alert::new(id, AlertKind::DecliningTrend, Severity::Info, "i".into(), now());
        let warning = Alert::new(id, AlertKind::LowEngagement, Severity::Warning, "w".into(), now());
        let critical = Alert::new(id, AlertKind::LowAttendance, Severity::Critical, "c".into(), now());

        assert_eq!(overall_status(&[]), OverallStatus::Good);
        assert_eq!(overall_status(&[info.clone()]), OverallStatus::Good);
        assert_eq!(
            overall_status(&[info.clone(), warning.clone()]),
            OverallStatus::AttentionNeeded
        );
        assert_eq!(
            overall_status(&[info, warning, critical]),
            OverallStatus::Critical
        );
    }
}
