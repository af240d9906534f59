//! One dashboard run: fan the three record fetches out against storage,
//! join, then hand the summaries to the rule evaluator. The run owns its
//! dashboard value exclusively until it returns.

use chrono::Utc;
use tracing::{debug, error};

use crate::analysis;
use crate::config::Thresholds;
use crate::db::StudentStore;
use crate::error::DashboardError;
use crate::models::Dashboard;
use crate::summary::{self, Window};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Fetching,
    Analyzing,
    Done,
    Failed,
}

/// Build the dashboard payload for one student. Any fetch failure fails the
/// whole run; there are no partial dashboards and no retries here.
pub async fn build_dashboard<S>(
    store: &S,
    student_code: &str,
    window_days: i64,
    thresholds: &Thresholds,
) -> Result<Dashboard, DashboardError>
where
    S: StudentStore + ?Sized,
{
    let window = Window::ending_today(window_days)?;
    let mut state = RunState::Fetching;
    debug!(student = student_code, days = window.days(), ?state, "dashboard run started");

    let student = match store.resolve_student(student_code).await {
        Ok(student) => student,
        Err(err) => {
            state = RunState::Failed;
            error!(student = student_code, ?state, %err, "dashboard run failed");
            return Err(err);
        }
    };

    // The three fetches are independent; join semantics, not first-to-finish.
    let since = window.start();
    let fetched = tokio::try_join!(
        async {
            let records = store.academic_records(student.id, since).await?;
            Ok::<_, DashboardError>(summary::summarize_academic(&records, &window))
        },
        async {
            let records = store.attendance_records(student.id, since).await?;
            Ok::<_, DashboardError>(summary::summarize_attendance(&records, &window))
        },
        async {
            let records = store.engagement_records(student.id, since).await?;
            Ok::<_, DashboardError>(summary::summarize_engagement(&records, &window))
        },
    );

    let (academic, attendance, engagement) = match fetched {
        Ok(summaries) => summaries,
        Err(err) => {
            state = RunState::Failed;
            error!(student = %student.code, ?state, %err, "dashboard run failed");
            return Err(err);
        }
    };

    state = RunState::Analyzing;
    debug!(student = %student.code, ?state, "summaries ready");

    let (alerts, insights) = analysis::evaluate(
        student.id,
        &academic,
        &attendance,
        &engagement,
        thresholds,
        Utc::now(),
    );
    let overall_status = analysis::overall_status(&alerts);

    state = RunState::Done;
    debug!(student = %student.code, ?state, alerts = alerts.len(), "dashboard run complete");

    Ok(Dashboard {
        student,
        window_days: window.days(),
        academic,
        attendance,
        engagement,
        alerts,
        insights,
        overall_status,
    })
}
