use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::PieceKey;
use crate::scoring::Difficulty;

//
// ─── QUIZ / FLASHCARD PROGRESS ─────────────────────────────────────────────────
//

/// Persisted summary of one completed quiz session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizRecord {
    pub date: DateTime<Utc>,
    pub score: f64,
    pub max_score: f64,
    pub percentage: u32,
    pub difficulty: Difficulty,
    pub question_count: usize,
}

/// Persisted summary of one completed flashcard session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardRecord {
    pub date: DateTime<Utc>,
    pub total: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub accuracy: u32,
}

//
// ─── EXAM ANALYTICS ────────────────────────────────────────────────────────────
//

/// Per-piece slice of a persisted exam result, kept for weak-area views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamAnswerSummary {
    pub piece_key: PieceKey,
    pub title: String,
    pub composer: String,
    pub genre: String,
    pub identification: u8,
    pub analysis: u8,
}

impl ExamAnswerSummary {
    /// Combined points for this piece, out of 5.
    #[must_use]
    pub fn total_points(&self) -> u8 {
        self.identification + self.analysis
    }
}

/// Persisted summary of one exam simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamRecord {
    pub date: DateTime<Utc>,
    pub total_score: u32,
    pub max_score: u32,
    pub percentage: u32,
    pub identification_score: u32,
    pub analysis_score: u32,
    pub time_used_seconds: u32,
    pub answers: Vec<ExamAnswerSummary>,
}

impl ExamRecord {
    /// Answers that scored below the review threshold of 3 points.
    #[must_use]
    pub fn weak_answers(&self) -> Vec<&ExamAnswerSummary> {
        self.answers.iter().filter(|a| a.total_points() < 3).collect()
    }
}

//
// ─── LISTENING ANALYTICS ───────────────────────────────────────────────────────
//

/// Play statistics for one piece.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListeningStats {
    pub count: u32,
    pub last_played: DateTime<Utc>,
}

/// The whole persisted analytics state: listening history plus exam log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsState {
    #[serde(default)]
    pub listening_frequency: BTreeMap<PieceKey, ListeningStats>,
    #[serde(default)]
    pub exam_results: Vec<ExamRecord>,
    #[serde(default)]
    pub last_study_date: BTreeMap<PieceKey, DateTime<Utc>>,
}

impl AnalyticsState {
    /// Record one listen of a piece at the given time.
    pub fn record_listen(&mut self, key: PieceKey, now: DateTime<Utc>) {
        let stats = self
            .listening_frequency
            .entry(key.clone())
            .or_insert(ListeningStats {
                count: 0,
                last_played: now,
            });
        stats.count += 1;
        stats.last_played = now;
        self.last_study_date.insert(key, now);
    }

    /// Number of distinct pieces with at least one recorded listen.
    #[must_use]
    pub fn distinct_listened(&self) -> usize {
        self.listening_frequency.len()
    }

    /// Pieces played within the trailing `days` window ending at `now`.
    #[must_use]
    pub fn studied_within_days(&self, days: i64, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::days(days);
        self.listening_frequency
            .values()
            .filter(|stats| stats.last_played >= cutoff)
            .count()
    }

    /// Up to `n` most recent exam results, newest first.
    #[must_use]
    pub fn recent_exams(&self, n: usize) -> Vec<&ExamRecord> {
        self.exam_results.iter().rev().take(n).collect()
    }

    /// Most recent exam result, if any.
    #[must_use]
    pub fn latest_exam(&self) -> Option<&ExamRecord> {
        self.exam_results.last()
    }

    /// Pieces ordered by descending play count, capped at `n`.
    #[must_use]
    pub fn top_listened(&self, n: usize) -> Vec<(&PieceKey, &ListeningStats)> {
        let mut entries: Vec<_> = self.listening_frequency.iter().collect();
        entries.sort_by(|(_, a), (_, b)| b.count.cmp(&a.count));
        entries.truncate(n);
        entries
    }
}
