use chrono::{DateTime, Utc};

use crate::model::{AnalyticsState, QuizRecord};

/// Number of recent exam results averaged for the performance factor.
const RECENT_EXAM_WINDOW: usize = 3;
/// Trailing window, in days, for the consistency factor.
const CONSISTENCY_WINDOW_DAYS: i64 = 7;
/// Pieces studied inside the window that count as full consistency.
const CONSISTENCY_TARGET: f64 = 10.0;

/// Composite readiness estimate with its weighted factors.
///
/// Factors are each in `[0, 1]`; `score` is the weighted combination
/// scaled to `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadinessReport {
    pub score: u8,
    pub coverage: f64,
    pub performance: f64,
    pub consistency: f64,
}

/// Estimate exam preparedness from listening and exam history.
///
/// - coverage: distinct pieces listened to over the dataset size (40%),
/// - performance: mean percentage of the three most recent exams (40%),
/// - consistency: pieces studied in the last week against a target of
///   ten (20%).
///
/// Every factor clamps to `[0, 1]` before weighting and the result
/// clamps to `0..=100`; no history at all yields 0.
#[must_use]
pub fn readiness(
    analytics: &AnalyticsState,
    total_piece_count: usize,
    now: DateTime<Utc>,
) -> ReadinessReport {
    let coverage = if total_piece_count == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let ratio = analytics.distinct_listened() as f64 / total_piece_count as f64;
        ratio.clamp(0.0, 1.0)
    };

    let recent = analytics.recent_exams(RECENT_EXAM_WINDOW);
    let performance = if recent.is_empty() {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let avg = recent.iter().map(|exam| f64::from(exam.percentage)).sum::<f64>()
            / recent.len() as f64;
        (avg / 100.0).clamp(0.0, 1.0)
    };

    #[allow(clippy::cast_precision_loss)]
    let studied = analytics.studied_within_days(CONSISTENCY_WINDOW_DAYS, now) as f64;
    let consistency = (studied / CONSISTENCY_TARGET).clamp(0.0, 1.0);

    let weighted = coverage * 0.4 + performance * 0.4 + consistency * 0.2;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = (weighted * 100.0).round().clamp(0.0, 100.0) as u8;

    ReadinessReport {
        score,
        coverage,
        performance,
        consistency,
    }
}

/// Aggregate view over persisted quiz records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressOverview {
    pub total_quizzes: usize,
    pub average_percentage: u32,
    pub best_percentage: u32,
}

impl ProgressOverview {
    /// Summarize a quiz history; an empty history is all zeros.
    #[must_use]
    pub fn from_records(records: &[QuizRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let sum: u32 = records.iter().map(|record| record.percentage).sum();
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let average = (f64::from(sum) / records.len() as f64).round() as u32;
        let best = records
            .iter()
            .map(|record| record.percentage)
            .max()
            .unwrap_or(0);

        Self {
            total_quizzes: records.len(),
            average_percentage: average,
            best_percentage: best,
        }
    }
}
