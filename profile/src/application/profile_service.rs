// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # ProfileService - Profile Recomputation Orchestrator
//!
//! Decides whether a user's profile can be recomputed, folds the full
//! pattern history and writes the result as one whole-document upsert.
//!
//! ## States
//!
//! - **Quick**: seeded by [`ProfileService::seed_quick_profile`] from the
//!   onboarding quiz.
//! - **Full**: produced by [`ProfileService::recompute`] once the user has
//!   at least [`MIN_DREAMS_FOR_FULL_PROFILE`] pattern records. Below the
//!   threshold recompute is a no-op returning `InsufficientData` and any
//!   stored profile is left untouched.
//!
//! The engine never aggregates incrementally: each recompute re-reads and
//! re-folds the entire history, so edits and deletes are always reflected.
//!
//! ## Concurrency
//!
//! Two dreams analyzed back to back trigger two recomputations for the same
//! user. Recomputations and quick writes are serialized per user through an
//! async mutex keyed by user id, so each one reads the history left by the
//! previous and the stored profile always matches the latest history. A
//! user's lock entry is dropped as soon as nobody holds or awaits it. The
//! lock is process-local; deployments running several engine processes
//! against one database must route a user's requests to a single process.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::aggregation::fold_profile;
use crate::application::EventBus;
use crate::domain::repository::{PatternRepository, ProfileRepository};
use crate::domain::{
    ProfileError, ProfileEvent, QuizResult, UnconsciousProfile, UserId, MIN_DREAMS_FOR_FULL_PROFILE,
};

/// ProfileService interface
#[async_trait]
pub trait ProfileService: Send + Sync {
    /// Fold every pattern record of the user into a full profile and store it.
    /// Returns `InsufficientData` below the sample threshold without writing.
    async fn recompute(&self, user_id: &UserId) -> Result<UnconsciousProfile, ProfileError>;

    /// Store a quiz-seeded profile unless the full profile has latched.
    async fn seed_quick_profile(
        &self,
        user_id: &UserId,
        quiz: &QuizResult,
    ) -> Result<UnconsciousProfile, ProfileError>;

    /// Current profile for read-only consumers
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<UnconsciousProfile>, ProfileError>;
}

/// Standard implementation of ProfileService
pub struct StandardProfileService {
    pattern_repo: Arc<dyn PatternRepository>,
    profile_repo: Arc<dyn ProfileRepository>,
    event_bus: Arc<dyn EventBus>,
    user_locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl StandardProfileService {
    pub fn new(
        pattern_repo: Arc<dyn PatternRepository>,
        profile_repo: Arc<dyn ProfileRepository>,
        event_bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            pattern_repo,
            profile_repo,
            event_bus,
            user_locks: DashMap::new(),
        }
    }

    async fn lock_user(&self, user_id: &UserId) -> UserLockGuard<'_> {
        let lock = self
            .user_locks
            .entry(user_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        UserLockGuard {
            guard: Some(lock.lock_owned().await),
            locks: &self.user_locks,
            user_id: user_id.clone(),
        }
    }

    async fn publish(&self, event: ProfileEvent) {
        let event_type = event.event_type();
        if let Err(e) = self.event_bus.publish(event).await {
            warn!("Failed to publish {} event: {}", event_type, e);
        }
    }

    async fn recompute_locked(&self, user_id: &UserId) -> Result<UnconsciousProfile, ProfileError> {
        let mut records = self.pattern_repo.list_for_user(user_id).await?;

        if records.len() < MIN_DREAMS_FOR_FULL_PROFILE {
            debug!(
                user_id = %user_id,
                found = records.len(),
                required = MIN_DREAMS_FOR_FULL_PROFILE,
                "Skipping profile recomputation below sample threshold"
            );
            self.publish(ProfileEvent::RecomputeSkipped {
                user_id: user_id.clone(),
                found: records.len(),
                required: MIN_DREAMS_FOR_FULL_PROFILE,
                timestamp: Utc::now(),
            })
            .await;
            return Err(ProfileError::InsufficientData {
                found: records.len(),
                required: MIN_DREAMS_FOR_FULL_PROFILE,
            });
        }

        // Store order is unspecified; a fixed fold order keeps float sums
        // bit-identical across recomputations of the same history.
        records.sort_by(|a, b| a.dream_id.cmp(&b.dream_id));

        let profile = fold_profile(user_id.clone(), &records, Utc::now());
        self.profile_repo.save(&profile).await?;

        info!(
            user_id = %user_id,
            primary = %profile.primary_archetype,
            secondary = %profile.secondary_archetype,
            total_dreams = profile.total_dreams_analyzed,
            "Profile recomputed"
        );
        self.publish(ProfileEvent::ProfileRecomputed {
            user_id: user_id.clone(),
            primary_archetype: profile.primary_archetype,
            secondary_archetype: profile.secondary_archetype,
            total_dreams_analyzed: profile.total_dreams_analyzed,
            timestamp: profile.last_updated,
        })
        .await;

        Ok(profile)
    }

    async fn seed_quick_locked(
        &self,
        user_id: &UserId,
        quiz: &QuizResult,
    ) -> Result<UnconsciousProfile, ProfileError> {
        let stored_total = self
            .profile_repo
            .find_by_user(user_id)
            .await?
            .filter(UnconsciousProfile::is_latched)
            .map(|p| p.total_dreams_analyzed);

        // A full history that has not been folded yet latches as well.
        let latched_total = match stored_total {
            Some(total) => Some(total),
            None => {
                let count = self.pattern_repo.count_for_user(user_id).await?;
                (count >= MIN_DREAMS_FOR_FULL_PROFILE).then_some(count as u64)
            }
        };

        if let Some(total_dreams_analyzed) = latched_total {
            info!(user_id = %user_id, total_dreams_analyzed, "Quick profile rejected, full profile latched");
            self.publish(ProfileEvent::QuickProfileRejected {
                user_id: user_id.clone(),
                total_dreams_analyzed,
                timestamp: Utc::now(),
            })
            .await;
            return Err(ProfileError::QuickProfileLocked { total_dreams_analyzed });
        }

        let profile = UnconsciousProfile::quick(user_id.clone(), quiz, Utc::now());
        self.profile_repo.save(&profile).await?;

        info!(user_id = %user_id, primary = %profile.primary_archetype, "Quick profile seeded");
        self.publish(ProfileEvent::QuickProfileSeeded {
            user_id: user_id.clone(),
            primary_archetype: profile.primary_archetype,
            timestamp: profile.last_updated,
        })
        .await;

        Ok(profile)
    }
}

/// Holds a user's lock; on drop the map entry is evicted once no other
/// caller holds or waits on it.
struct UserLockGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    locks: &'a DashMap<UserId, Arc<Mutex<()>>>,
    user_id: UserId,
}

impl Drop for UserLockGuard<'_> {
    fn drop(&mut self) {
        // Release the mutex first so its Arc no longer counts as a holder.
        drop(self.guard.take());
        self.locks
            .remove_if(&self.user_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

fn outcome_label(result: &Result<UnconsciousProfile, ProfileError>) -> &'static str {
    match result {
        Ok(_) => "updated",
        Err(ProfileError::InsufficientData { .. }) => "insufficient_data",
        Err(ProfileError::QuickProfileLocked { .. }) => "locked",
        Err(_) => "failed",
    }
}

#[async_trait]
impl ProfileService for StandardProfileService {
    async fn recompute(&self, user_id: &UserId) -> Result<UnconsciousProfile, ProfileError> {
        let _guard = self.lock_user(user_id).await;
        let result = self.recompute_locked(user_id).await;
        metrics::counter!("somnia_profile_recomputations_total", "outcome" => outcome_label(&result))
            .increment(1);
        result
    }

    async fn seed_quick_profile(
        &self,
        user_id: &UserId,
        quiz: &QuizResult,
    ) -> Result<UnconsciousProfile, ProfileError> {
        let _guard = self.lock_user(user_id).await;
        let result = self.seed_quick_locked(user_id, quiz).await;
        metrics::counter!("somnia_quick_profile_writes_total", "outcome" => outcome_label(&result))
            .increment(1);
        result
    }

    async fn get_profile(&self, user_id: &UserId) -> Result<Option<UnconsciousProfile>, ProfileError> {
        Ok(self.profile_repo.find_by_user(user_id).await?)
    }
}

/// Run a recomputation detached from the caller.
///
/// The recomputation still completes or fails as one unit; failures other
/// than the expected below-threshold skip are logged.
pub fn spawn_recompute(
    service: Arc<dyn ProfileService>,
    user_id: UserId,
) -> JoinHandle<Result<UnconsciousProfile, ProfileError>> {
    tokio::spawn(async move {
        let result = service.recompute(&user_id).await;
        if let Err(e) = &result {
            if !e.is_expected() {
                warn!(user_id = %user_id, "Detached profile recomputation failed: {}", e);
            }
        }
        result
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::RepositoryError;
    use crate::domain::{Archetype, ArchetypeScores, DreamId, PatternRecord, ProfileState};
    use crate::infrastructure::repositories::{InMemoryPatternRepository, InMemoryProfileRepository};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    // Mock EventBus for testing
    struct MockEventBus {
        events: Arc<StdMutex<Vec<ProfileEvent>>>,
    }

    impl MockEventBus {
        fn new() -> Self {
            Self {
                events: Arc::new(StdMutex::new(Vec::new())),
            }
        }

        fn event_types(&self) -> Vec<&'static str> {
            self.events.lock().unwrap().iter().map(|e| e.event_type()).collect()
        }
    }

    #[async_trait]
    impl EventBus for MockEventBus {
        async fn publish(&self, event: ProfileEvent) -> anyhow::Result<()> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    fn record(user: &str, i: usize, affinity: &[(Archetype, f64)]) -> PatternRecord {
        PatternRecord {
            dream_id: DreamId::new(format!("{}-dream-{}", user, i)),
            user_id: UserId::new(user),
            symbols: vec!["water".to_string()],
            emotions: vec!["awe".to_string()],
            archetype_affinity: affinity.iter().copied().collect::<ArchetypeScores>(),
            vividness: 0.7,
            abstractness: 0.3,
            text_length: 120,
            analyzed_at: Utc::now(),
        }
    }

    struct Fixture {
        patterns: Arc<InMemoryPatternRepository>,
        profiles: Arc<InMemoryProfileRepository>,
        events: Arc<MockEventBus>,
        service: StandardProfileService,
    }

    fn fixture() -> Fixture {
        let patterns = Arc::new(InMemoryPatternRepository::new());
        let profiles = Arc::new(InMemoryProfileRepository::new());
        let events = Arc::new(MockEventBus::new());
        let service = StandardProfileService::new(patterns.clone(), profiles.clone(), events.clone());
        Fixture { patterns, profiles, events, service }
    }

    async fn seed_records(patterns: &InMemoryPatternRepository, user: &str, n: usize) {
        for i in 0..n {
            patterns
                .upsert(&record(user, i, &[(Archetype::Hero, 0.8), (Archetype::Sage, 0.2)]))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_recompute_below_threshold_is_noop() {
        let f = fixture();
        let user = UserId::new("u1");
        seed_records(&f.patterns, "u1", 4).await;

        let err = f.service.recompute(&user).await.unwrap_err();
        assert!(matches!(err, ProfileError::InsufficientData { found: 4, required: 5 }));
        assert!(err.is_expected());
        assert!(f.profiles.find_by_user(&user).await.unwrap().is_none());
        assert_eq!(f.events.event_types(), vec!["recompute_skipped"]);
    }

    #[tokio::test]
    async fn test_recompute_below_threshold_keeps_quick_profile() {
        let f = fixture();
        let user = UserId::new("u1");
        let quick = f
            .service
            .seed_quick_profile(&user, &QuizResult::new(Archetype::Lover))
            .await
            .unwrap();
        seed_records(&f.patterns, "u1", 3).await;

        assert!(f.service.recompute(&user).await.is_err());
        let stored = f.profiles.find_by_user(&user).await.unwrap().unwrap();
        assert_eq!(stored, quick);
    }

    #[tokio::test]
    async fn test_recompute_full_profile() {
        let f = fixture();
        let user = UserId::new("u1");
        seed_records(&f.patterns, "u1", 5).await;
        // another user's records never leak in
        seed_records(&f.patterns, "u2", 2).await;

        let profile = f.service.recompute(&user).await.unwrap();
        assert_eq!(profile.state, ProfileState::Full);
        assert!((profile.archetype_scores.get(Archetype::Hero) - 0.8).abs() < 1e-9);
        assert!((profile.archetype_scores.get(Archetype::Sage) - 0.2).abs() < 1e-9);
        assert_eq!(profile.primary_archetype, Archetype::Hero);
        assert_eq!(profile.secondary_archetype, Archetype::Sage);
        assert_eq!(profile.total_dreams_analyzed, 5);

        let stored = f.service.get_profile(&user).await.unwrap().unwrap();
        assert_eq!(stored, profile);
        assert_eq!(f.events.event_types(), vec!["profile_recomputed"]);
    }

    #[tokio::test]
    async fn test_recompute_is_idempotent() {
        let f = fixture();
        let user = UserId::new("u1");
        for i in 0..7 {
            let affinity = [(Archetype::ALL[i % 12], 0.1 + i as f64 * 0.07), (Archetype::Ruler, 0.33)];
            f.patterns.upsert(&record("u1", i, &affinity)).await.unwrap();
        }

        let first = f.service.recompute(&user).await.unwrap();
        let second = f.service.recompute(&user).await.unwrap();
        assert!(first.same_content(&second));
        assert_eq!(second.total_dreams_analyzed, 7);
    }

    #[tokio::test]
    async fn test_quick_profile_latch() {
        let f = fixture();
        let user = UserId::new("u1");
        seed_records(&f.patterns, "u1", 5).await;
        let full = f.service.recompute(&user).await.unwrap();

        let err = f
            .service
            .seed_quick_profile(&user, &QuizResult::new(Archetype::Jester))
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::QuickProfileLocked { total_dreams_analyzed: 5 }));

        let stored = f.profiles.find_by_user(&user).await.unwrap().unwrap();
        assert_eq!(stored, full);
    }

    #[tokio::test]
    async fn test_quick_profile_rejected_when_history_is_already_full() {
        let f = fixture();
        let user = UserId::new("u1");
        seed_records(&f.patterns, "u1", 6).await;

        let err = f
            .service
            .seed_quick_profile(&user, &QuizResult::new(Archetype::Jester))
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::QuickProfileLocked { total_dreams_analyzed: 6 }));
        assert!(f.profiles.find_by_user(&user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_quick_profile_superseded_by_full() {
        let f = fixture();
        let user = UserId::new("u1");
        let quick = f
            .service
            .seed_quick_profile(&user, &QuizResult::new(Archetype::Caregiver))
            .await
            .unwrap();
        assert_eq!(quick.state, ProfileState::Quick);
        assert_eq!(quick.total_dreams_analyzed, 1);

        seed_records(&f.patterns, "u1", 5).await;
        let full = f.service.recompute(&user).await.unwrap();
        assert_eq!(full.state, ProfileState::Full);
        assert_eq!(full.primary_archetype, Archetype::Hero);
        assert_eq!(full.archetype_scores.get(Archetype::Caregiver), 0.0);
    }

    /// Pattern repository that records how many `list_for_user` calls overlap.
    struct SlowPatternRepository {
        inner: InMemoryPatternRepository,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl PatternRepository for SlowPatternRepository {
        async fn upsert(&self, record: &PatternRecord) -> Result<(), RepositoryError> {
            self.inner.upsert(record).await
        }

        async fn find_by_dream(&self, dream_id: &DreamId) -> Result<Option<PatternRecord>, RepositoryError> {
            self.inner.find_by_dream(dream_id).await
        }

        async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<PatternRecord>, RepositoryError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            let result = self.inner.list_for_user(user_id).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }

        async fn count_for_user(&self, user_id: &UserId) -> Result<usize, RepositoryError> {
            self.inner.count_for_user(user_id).await
        }

        async fn delete(&self, dream_id: &DreamId) -> Result<(), RepositoryError> {
            self.inner.delete(dream_id).await
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_recomputations_are_serialized_per_user() {
        let patterns = Arc::new(SlowPatternRepository {
            inner: InMemoryPatternRepository::new(),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        });
        seed_records(&patterns.inner, "u1", 5).await;

        let service: Arc<dyn ProfileService> = Arc::new(StandardProfileService::new(
            patterns.clone(),
            Arc::new(InMemoryProfileRepository::new()),
            Arc::new(MockEventBus::new()),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| spawn_recompute(service.clone(), UserId::new("u1")))
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(patterns.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_last_recompute_sees_latest_history() {
        let f = fixture();
        let user = UserId::new("u1");
        seed_records(&f.patterns, "u1", 5).await;

        let service: Arc<dyn ProfileService> = Arc::new(f.service);
        let first = spawn_recompute(service.clone(), user.clone());
        f.patterns.upsert(&record("u1", 99, &[(Archetype::Magician, 5.0)])).await.unwrap();
        let second = spawn_recompute(service.clone(), user.clone());
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        let stored = f.profiles.find_by_user(&user).await.unwrap().unwrap();
        assert_eq!(stored.total_dreams_analyzed, 6);
        assert_eq!(stored.primary_archetype, Archetype::Magician);
    }

    struct UnavailableProfileRepository;

    #[async_trait]
    impl ProfileRepository for UnavailableProfileRepository {
        async fn save(&self, _profile: &UnconsciousProfile) -> Result<(), RepositoryError> {
            Err(RepositoryError::Database("connection refused".to_string()))
        }

        async fn find_by_user(&self, _user_id: &UserId) -> Result<Option<UnconsciousProfile>, RepositoryError> {
            Err(RepositoryError::Database("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_store_unavailable_is_reported() {
        let patterns = Arc::new(InMemoryPatternRepository::new());
        seed_records(&patterns, "u1", 5).await;
        let events = Arc::new(MockEventBus::new());
        let service = StandardProfileService::new(patterns, Arc::new(UnavailableProfileRepository), events.clone());

        let err = service.recompute(&UserId::new("u1")).await.unwrap_err();
        assert!(matches!(err, ProfileError::StoreUnavailable(_)));
        assert!(!err.is_expected());
        assert!(events.event_types().is_empty());
    }

    struct UnavailablePatternRepository;

    #[async_trait]
    impl PatternRepository for UnavailablePatternRepository {
        async fn upsert(&self, _record: &PatternRecord) -> Result<(), RepositoryError> {
            Err(RepositoryError::Database("connection refused".to_string()))
        }

        async fn find_by_dream(&self, _dream_id: &DreamId) -> Result<Option<PatternRecord>, RepositoryError> {
            Err(RepositoryError::Database("connection refused".to_string()))
        }

        async fn list_for_user(&self, _user_id: &UserId) -> Result<Vec<PatternRecord>, RepositoryError> {
            Err(RepositoryError::Database("connection refused".to_string()))
        }

        async fn count_for_user(&self, _user_id: &UserId) -> Result<usize, RepositoryError> {
            Err(RepositoryError::Database("connection refused".to_string()))
        }

        async fn delete(&self, _dream_id: &DreamId) -> Result<(), RepositoryError> {
            Err(RepositoryError::Database("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_pattern_store_unavailable_writes_nothing() {
        let profiles = Arc::new(InMemoryProfileRepository::new());
        let events = Arc::new(MockEventBus::new());
        let service =
            StandardProfileService::new(Arc::new(UnavailablePatternRepository), profiles.clone(), events.clone());
        let user = UserId::new("u1");

        let err = service.recompute(&user).await.unwrap_err();
        assert!(matches!(err, ProfileError::StoreUnavailable(RepositoryError::Database(_))));
        assert!(!err.is_expected());
        assert!(profiles.find_by_user(&user).await.unwrap().is_none());
        assert!(events.event_types().is_empty());
    }

    #[tokio::test]
    async fn test_user_locks_are_released_after_use() {
        let f = fixture();
        for i in 0..50 {
            let user = format!("user-{}", i);
            seed_records(&f.patterns, &user, if i % 2 == 0 { 5 } else { 2 }).await;
            let _ = f.service.recompute(&UserId::new(user.clone())).await;
            let _ = f
                .service
                .seed_quick_profile(&UserId::new(user), &QuizResult::new(Archetype::Sage))
                .await;
        }
        assert!(f.service.user_locks.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_user_locks_are_released_after_concurrent_use() {
        let f = fixture();
        seed_records(&f.patterns, "u1", 5).await;
        let service = Arc::new(f.service);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.recompute(&UserId::new("u1")).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(service.user_locks.is_empty());
    }
}
