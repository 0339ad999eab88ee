//! Headline statistics for the insights view.

use crate::models::{Medication, Prediction, Symptom, SummaryStats};
use chrono::{DateTime, Datelike, Utc};

/// Compute the summary cards shown above the charts.
pub fn summary_stats(
    symptoms: &[Symptom],
    medications: &[Medication],
    predictions: &[Prediction],
    now: DateTime<Utc>,
) -> SummaryStats {
    let this_month = month_key(now);
    let last_month = previous_month(this_month);

    let logged_this_month = count_in_month(symptoms.iter().map(|s| s.created_at), this_month);
    let logged_last_month = count_in_month(symptoms.iter().map(|s| s.created_at), last_month);

    SummaryStats {
        total_symptoms: symptoms.len(),
        symptom_change_pct: percent_change(logged_last_month, logged_this_month),
        active_medications: medications.len(),
        insights_this_month: count_in_month(predictions.iter().map(|p| p.created_at), this_month),
    }
}

fn month_key(at: DateTime<Utc>) -> (i32, u32) {
    (at.year(), at.month())
}

fn previous_month((year, month): (i32, u32)) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

fn count_in_month<I>(timestamps: I, month: (i32, u32)) -> usize
where
    I: Iterator<Item = Option<DateTime<Utc>>>,
{
    timestamps.flatten().filter(|t| month_key(*t) == month).count()
}

/// Rounded percentage change; `None` when there is no baseline.
fn percent_change(previous: usize, current: usize) -> Option<i64> {
    if previous == 0 {
        return None;
    }
    let change = (current as f64 - previous as f64) / previous as f64 * 100.0;
    Some(change.round() as i64)
}
