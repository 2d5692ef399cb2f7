// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use super::extraction::ExtractionError;
use super::repository::RepositoryError;

/// Errors surfaced by the profile engine's application services.
///
/// Every variant is recoverable by the caller. `InsufficientData` and
/// `QuickProfileLocked` are defined non-actions rather than failures; see
/// [`ProfileError::is_expected`].
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Profile store unavailable: {0}")]
    StoreUnavailable(#[from] RepositoryError),

    #[error("Not enough analyzed dreams for a full profile: found {found}, need {required}")]
    InsufficientData { found: usize, required: usize },

    #[error("Quick profile rejected: full profile already covers {total_dreams_analyzed} dreams")]
    QuickProfileLocked { total_dreams_analyzed: u64 },

    #[error("Pattern extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
}

impl ProfileError {
    /// True for outcomes that are steady-state for a user rather than faults.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            ProfileError::InsufficientData { .. } | ProfileError::QuickProfileLocked { .. }
        )
    }
}
