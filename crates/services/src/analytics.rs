use std::sync::Arc;

use tracing::debug;

use quiz_core::Clock;
use quiz_core::model::{ExamAnswerSummary, ExamRecord, ListeningStats, Piece, PieceKey};
use quiz_core::readiness::{ProgressOverview, ReadinessReport, readiness};
use storage::repository::{AnalyticsRepository, ProgressRepository};

use crate::error::AnalyticsError;

/// Listening, exam-history and readiness queries over the persisted
/// analytics snapshot.
///
/// Owns the time source and repository access; produces plain data for
/// the rendering shell.
#[derive(Clone)]
pub struct AnalyticsService {
    clock: Clock,
    analytics: Arc<dyn AnalyticsRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl AnalyticsService {
    #[must_use]
    pub fn new(
        clock: Clock,
        analytics: Arc<dyn AnalyticsRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            analytics,
            progress,
        }
    }

    /// Record one listen of a piece and stamp its study date.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Storage` on repository failures.
    pub async fn track_listen(&self, piece: &Piece) -> Result<(), AnalyticsError> {
        let mut state = self.analytics.load_analytics().await?;
        state.record_listen(piece.key(), self.clock.now());
        self.analytics.store_analytics(&state).await?;
        debug!(piece = %piece.key(), "listen tracked");
        Ok(())
    }

    /// Composite readiness estimate against the full dataset size.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Storage` on repository failures.
    pub async fn readiness(
        &self,
        total_piece_count: usize,
    ) -> Result<ReadinessReport, AnalyticsError> {
        let state = self.analytics.load_analytics().await?;
        Ok(readiness(&state, total_piece_count, self.clock.now()))
    }

    /// Most-played pieces, descending, capped at `n`.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Storage` on repository failures.
    pub async fn top_listened(
        &self,
        n: usize,
    ) -> Result<Vec<(PieceKey, ListeningStats)>, AnalyticsError> {
        let state = self.analytics.load_analytics().await?;
        Ok(state
            .top_listened(n)
            .into_iter()
            .map(|(key, stats)| (key.clone(), stats.clone()))
            .collect())
    }

    /// Full exam history, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Storage` on repository failures.
    pub async fn exam_results(&self) -> Result<Vec<ExamRecord>, AnalyticsError> {
        let state = self.analytics.load_analytics().await?;
        Ok(state.exam_results)
    }

    /// Weak answers from the most recent exam, empty when none exists.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Storage` on repository failures.
    pub async fn latest_weak_pieces(&self) -> Result<Vec<ExamAnswerSummary>, AnalyticsError> {
        let state = self.analytics.load_analytics().await?;
        Ok(state
            .latest_exam()
            .map(|exam| exam.weak_answers().into_iter().cloned().collect())
            .unwrap_or_default())
    }

    /// Aggregate view over the persisted quiz history.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Storage` on repository failures.
    pub async fn progress_overview(&self) -> Result<ProgressOverview, AnalyticsError> {
        let records = self.progress.list_quizzes().await?;
        Ok(ProgressOverview::from_records(&records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_support::catalog;
    use quiz_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    fn service(repo: &Arc<InMemoryRepository>) -> AnalyticsService {
        AnalyticsService::new(fixed_clock(), repo.clone(), repo.clone())
    }

    #[tokio::test]
    async fn track_listen_accumulates_counts() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = service(&repo);
        let catalog = catalog();
        let piece = &catalog.pieces()[0];

        service.track_listen(piece).await.unwrap();
        service.track_listen(piece).await.unwrap();

        let top = service.top_listened(5).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].0, piece.key());
        assert_eq!(top[0].1.count, 2);
    }

    #[tokio::test]
    async fn readiness_starts_at_zero_and_grows_with_history() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = service(&repo);
        let catalog = catalog();

        let report = service.readiness(catalog.pieces().len()).await.unwrap();
        assert_eq!(report.score, 0);

        for piece in catalog.pieces() {
            service.track_listen(piece).await.unwrap();
        }

        let report = service.readiness(catalog.pieces().len()).await.unwrap();
        assert!(report.score > 0);
        assert!(report.score <= 100);
        assert!((report.coverage - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn latest_weak_pieces_reads_the_newest_exam() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = service(&repo);

        assert!(service.latest_weak_pieces().await.unwrap().is_empty());

        let mut state = repo.load_analytics().await.unwrap();
        state.exam_results.push(ExamRecord {
            date: fixed_now(),
            total_score: 5,
            max_score: 25,
            percentage: 20,
            identification_score: 4,
            analysis_score: 1,
            time_used_seconds: 600,
            answers: vec![ExamAnswerSummary {
                piece_key: PieceKey::new("1b_leonin_viderunt_omnes"),
                title: "Viderunt Omnes".into(),
                composer: "Leonin".into(),
                genre: "two-part organum".into(),
                identification: 1,
                analysis: 0,
            }],
        });
        repo.store_analytics(&state).await.unwrap();

        let weak = service.latest_weak_pieces().await.unwrap();
        assert_eq!(weak.len(), 1);
        assert_eq!(weak[0].title, "Viderunt Omnes");
    }
}
