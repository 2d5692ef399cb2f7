// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Dream Analysis Pipeline
//!
//! Entry point used by the journaling front end after a dream is saved:
//!
//! 1. validate the submission
//! 2. call the extraction service (or accept a pre-computed result)
//! 3. build and upsert the pattern record
//! 4. trigger a profile recomputation, awaited or detached
//!
//! An extraction failure aborts before anything is written. Once the record
//! is stored the submission counts as analyzed, whatever the recomputation
//! reports.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::application::pattern_builder::{build_pattern_record, DreamSubmission};
use crate::application::profile_service::{spawn_recompute, ProfileService};
use crate::application::EventBus;
use crate::domain::repository::PatternRepository;
use crate::domain::{
    ExtractionError, ExtractionRequest, ExtractionResult, PatternExtractor, PatternRecord, ProfileError,
    ProfileEvent, UnconsciousProfile,
};

/// How the pipeline waits for the profile recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecomputeMode {
    /// Wait for the recomputation and report its result.
    #[default]
    Await,
    /// Spawn the recomputation and return as soon as the record is stored.
    Detached,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecomputeOutcome {
    Updated(UnconsciousProfile),
    InsufficientData { found: usize, required: usize },
    Scheduled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub record: PatternRecord,
    pub profile: RecomputeOutcome,
}

pub struct DreamAnalysisService {
    pattern_repo: Arc<dyn PatternRepository>,
    profile_service: Arc<dyn ProfileService>,
    event_bus: Arc<dyn EventBus>,
    extractor: Option<Arc<dyn PatternExtractor>>,
}

impl DreamAnalysisService {
    pub fn new(
        pattern_repo: Arc<dyn PatternRepository>,
        profile_service: Arc<dyn ProfileService>,
        event_bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            pattern_repo,
            profile_service,
            event_bus,
            extractor: None,
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn PatternExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Run the full pipeline for one dream.
    pub async fn analyze_dream(
        &self,
        submission: &DreamSubmission,
        mode: RecomputeMode,
    ) -> Result<AnalysisOutcome, ProfileError> {
        let dream = submission.validate()?;
        let extractor = self.extractor.as_ref().ok_or(ExtractionError::NotConfigured)?;

        debug!(dream_id = %dream.dream_id, "Requesting pattern extraction");
        let request = ExtractionRequest {
            text: dream.text.clone(),
            interpretation: dream.interpretation.clone(),
        };
        let extraction = match extractor.extract(&request).await {
            Ok(extraction) => extraction,
            Err(e) => {
                metrics::counter!("somnia_patterns_recorded_total", "outcome" => "extraction_failed")
                    .increment(1);
                warn!(dream_id = %dream.dream_id, "Pattern extraction failed: {}", e);
                return Err(e.into());
            }
        };

        self.ingest_pattern(submission, extraction, mode).await
    }

    /// Store a record built from an extraction result obtained elsewhere
    /// and trigger the recomputation.
    pub async fn ingest_pattern(
        &self,
        submission: &DreamSubmission,
        extraction: ExtractionResult,
        mode: RecomputeMode,
    ) -> Result<AnalysisOutcome, ProfileError> {
        let dream = submission.validate()?;
        let record = build_pattern_record(&dream, &extraction, Utc::now());

        self.pattern_repo.upsert(&record).await?;
        metrics::counter!("somnia_patterns_recorded_total", "outcome" => "stored").increment(1);
        info!(
            dream_id = %record.dream_id,
            user_id = %record.user_id,
            symbols = record.symbols.len(),
            emotions = record.emotions.len(),
            "Pattern recorded"
        );

        let event = ProfileEvent::PatternRecorded {
            dream_id: record.dream_id.clone(),
            user_id: record.user_id.clone(),
            symbol_count: record.symbols.len(),
            emotion_count: record.emotions.len(),
            timestamp: record.analyzed_at,
        };
        if let Err(e) = self.event_bus.publish(event).await {
            warn!("Failed to publish pattern_recorded event: {}", e);
        }

        let profile = match mode {
            RecomputeMode::Detached => {
                spawn_recompute(self.profile_service.clone(), record.user_id.clone());
                RecomputeOutcome::Scheduled
            }
            RecomputeMode::Await => match self.profile_service.recompute(&record.user_id).await {
                Ok(profile) => RecomputeOutcome::Updated(profile),
                Err(ProfileError::InsufficientData { found, required }) => {
                    RecomputeOutcome::InsufficientData { found, required }
                }
                Err(e) => return Err(e),
            },
        };

        Ok(AnalysisOutcome { record, profile })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::profile_service::StandardProfileService;
    use crate::domain::repository::ProfileRepository;
    use crate::domain::{Archetype, DreamId, UserId};
    use crate::infrastructure::repositories::{InMemoryPatternRepository, InMemoryProfileRepository};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MockEventBus {
        events: Mutex<Vec<ProfileEvent>>,
    }

    #[async_trait]
    impl EventBus for MockEventBus {
        async fn publish(&self, event: ProfileEvent) -> anyhow::Result<()> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    struct FixedExtractor {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PatternExtractor for FixedExtractor {
        async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(!request.text.is_empty());
            Ok(ExtractionResult::from(json!({
                "symbols": ["ocean", "door"],
                "emotions": ["awe"],
                "archetype_hints": {"explorer": 0.9, "sage": 0.4},
                "vividness_score": 0.8,
                "abstractness_score": 0.2
            })))
        }
    }

    struct FailingExtractor;

    #[async_trait]
    impl PatternExtractor for FailingExtractor {
        async fn extract(&self, _request: &ExtractionRequest) -> Result<ExtractionResult, ExtractionError> {
            Err(ExtractionError::Status {
                status: 503,
                body: "overloaded".to_string(),
            })
        }
    }

    struct Fixture {
        patterns: Arc<InMemoryPatternRepository>,
        profiles: Arc<InMemoryProfileRepository>,
        events: Arc<MockEventBus>,
        service: DreamAnalysisService,
    }

    fn fixture(extractor: Option<Arc<dyn PatternExtractor>>) -> Fixture {
        let patterns = Arc::new(InMemoryPatternRepository::new());
        let profiles = Arc::new(InMemoryProfileRepository::new());
        let events = Arc::new(MockEventBus {
            events: Mutex::new(Vec::new()),
        });
        let profile_service = Arc::new(StandardProfileService::new(
            patterns.clone(),
            profiles.clone(),
            events.clone(),
        ));
        let mut service = DreamAnalysisService::new(patterns.clone(), profile_service, events.clone());
        if let Some(extractor) = extractor {
            service = service.with_extractor(extractor);
        }
        Fixture { patterns, profiles, events, service }
    }

    #[tokio::test]
    async fn test_analyze_dream_records_pattern() {
        let extractor = Arc::new(FixedExtractor {
            calls: AtomicUsize::new(0),
        });
        let f = fixture(Some(extractor.clone()));

        let outcome = f
            .service
            .analyze_dream(
                &DreamSubmission::new("d1", "u1", "I opened a door onto the ocean"),
                RecomputeMode::Await,
            )
            .await
            .unwrap();

        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.record.symbols, vec!["ocean", "door"]);
        assert_eq!(outcome.record.text_length, 30);
        assert_eq!(
            outcome.profile,
            RecomputeOutcome::InsufficientData { found: 1, required: 5 }
        );
        let stored = f.patterns.find_by_dream(&DreamId::new("d1")).await.unwrap();
        assert_eq!(stored, Some(outcome.record));
    }

    #[tokio::test]
    async fn test_fifth_dream_produces_full_profile() {
        let f = fixture(Some(Arc::new(FixedExtractor {
            calls: AtomicUsize::new(0),
        })));

        let mut last = None;
        for i in 0..5 {
            let submission = DreamSubmission::new(format!("d{}", i), "u1", "a recurring ocean");
            last = Some(f.service.analyze_dream(&submission, RecomputeMode::Await).await.unwrap());
        }

        let RecomputeOutcome::Updated(profile) = last.unwrap().profile else {
            panic!("expected a full profile after five dreams");
        };
        assert_eq!(profile.primary_archetype, Archetype::Explorer);
        assert_eq!(profile.secondary_archetype, Archetype::Sage);
        assert_eq!(profile.total_dreams_analyzed, 5);
        assert_eq!(profile.recurring_symbols[0].count, 5);
    }

    #[tokio::test]
    async fn test_reanalysis_replaces_record() {
        let f = fixture(None);
        let submission = DreamSubmission::new("d1", "u1", "first telling");
        f.service
            .ingest_pattern(&submission, ExtractionResult::from(json!({"symbols": ["cat"]})), RecomputeMode::Await)
            .await
            .unwrap();
        f.service
            .ingest_pattern(&submission, ExtractionResult::from(json!({"symbols": ["dog"]})), RecomputeMode::Await)
            .await
            .unwrap();

        assert_eq!(f.patterns.count_for_user(&UserId::new("u1")).await.unwrap(), 1);
        let stored = f.patterns.find_by_dream(&DreamId::new("d1")).await.unwrap().unwrap();
        assert_eq!(stored.symbols, vec!["dog"]);
    }

    #[tokio::test]
    async fn test_extraction_failure_writes_nothing() {
        let f = fixture(Some(Arc::new(FailingExtractor)));

        let err = f
            .service
            .analyze_dream(&DreamSubmission::new("d1", "u1", "text"), RecomputeMode::Await)
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::Extraction(ExtractionError::Status { status: 503, .. })));
        assert!(f.patterns.find_by_dream(&DreamId::new("d1")).await.unwrap().is_none());
        assert!(f.events.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_extractor_is_reported() {
        let f = fixture(None);
        let err = f
            .service
            .analyze_dream(&DreamSubmission::new("d1", "u1", "text"), RecomputeMode::Await)
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::Extraction(ExtractionError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_invalid_submission_is_rejected_before_extraction() {
        let extractor = Arc::new(FixedExtractor {
            calls: AtomicUsize::new(0),
        });
        let f = fixture(Some(extractor.clone()));

        let err = f
            .service
            .analyze_dream(&DreamSubmission::new("d1", "", "text"), RecomputeMode::Await)
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::InvalidInput(_)));
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_detached_recompute_completes() {
        let f = fixture(None);
        for i in 0..4 {
            let submission = DreamSubmission::new(format!("d{}", i), "u1", "text");
            f.service
                .ingest_pattern(&submission, ExtractionResult::default(), RecomputeMode::Await)
                .await
                .unwrap();
        }

        let outcome = f
            .service
            .ingest_pattern(
                &DreamSubmission::new("d4", "u1", "text"),
                ExtractionResult::from(json!({"archetype_hints": {"ruler": 1.0}})),
                RecomputeMode::Detached,
            )
            .await
            .unwrap();
        assert_eq!(outcome.profile, RecomputeOutcome::Scheduled);

        let user = UserId::new("u1");
        let mut profile = None;
        for _ in 0..50 {
            profile = f.profiles.find_by_user(&user).await.unwrap();
            if profile.is_some() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        let profile = profile.expect("detached recomputation should store a profile");
        assert_eq!(profile.primary_archetype, Archetype::Ruler);
        assert_eq!(profile.total_dreams_analyzed, 5);
    }
}
