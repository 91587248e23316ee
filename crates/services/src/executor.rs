use std::sync::Arc;

use flashdeck_core::model::{CardId, DeckId};
use flashdeck_core::reconcile::OperationPlan;
use storage::repository::DeckStore;

use crate::error::{ExecutionError, ExecutionPhase};

/// How far a plan got. Committed steps are never replayed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionProgress {
    pub deletes_done: usize,
    pub patch_done: bool,
    /// Server ids of created cards, in plan order.
    pub created: Vec<CardId>,
}

impl ExecutionProgress {
    /// Number of committed store calls.
    #[must_use]
    pub fn completed_steps(&self) -> usize {
        self.deletes_done + usize::from(self.patch_done) + self.created.len()
    }

    #[must_use]
    pub fn is_complete(&self, plan: &OperationPlan) -> bool {
        self.deletes_done >= plan.deletes.len()
            && (self.patch_done || plan.patch.is_none())
            && self.created.len() >= plan.creates.len()
    }
}

/// Result of a fully applied plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub deleted: usize,
    pub patched: bool,
    pub created: Vec<CardId>,
}

impl From<ExecutionProgress> for ExecutionOutcome {
    fn from(progress: ExecutionProgress) -> Self {
        Self {
            deleted: progress.deletes_done,
            patched: progress.patch_done,
            created: progress.created,
        }
    }
}

/// Applies an `OperationPlan` to a `DeckStore`, one awaited call at a time.
#[derive(Clone)]
pub struct PlanExecutor {
    store: Arc<dyn DeckStore>,
}

impl PlanExecutor {
    #[must_use]
    pub fn new(store: Arc<dyn DeckStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn DeckStore> {
        &self.store
    }

    /// Run every step of `plan`: deletes, then the patch, then creates.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError` for the first failing call; later steps are
    /// not attempted.
    pub async fn execute(
        &self,
        deck_id: DeckId,
        plan: &OperationPlan,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let mut progress = ExecutionProgress::default();
        self.resume(deck_id, plan, &mut progress).await?;
        Ok(progress.into())
    }

    /// Continue `plan` from the first step not recorded in `progress`.
    ///
    /// `progress` is updated after every committed call, so a failed run can
    /// be resumed with the same value.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError` for the first failing call.
    pub async fn resume(
        &self,
        deck_id: DeckId,
        plan: &OperationPlan,
        progress: &mut ExecutionProgress,
    ) -> Result<(), ExecutionError> {
        for (step, card_id) in plan.deletes.iter().enumerate().skip(progress.deletes_done) {
            self.store
                .delete_card(deck_id, *card_id)
                .await
                .map_err(|source| ExecutionError {
                    phase: ExecutionPhase::Delete,
                    step,
                    source,
                })?;
            progress.deletes_done += 1;
        }

        if let Some(patch) = plan.patch.as_ref().filter(|_| !progress.patch_done) {
            self.store
                .patch_deck(deck_id, patch)
                .await
                .map_err(|source| ExecutionError {
                    phase: ExecutionPhase::Patch,
                    step: 0,
                    source,
                })?;
            progress.patch_done = true;
        }

        let done = progress.created.len();
        for (step, content) in plan.creates.iter().enumerate().skip(done) {
            let id = self
                .store
                .create_card(deck_id, content)
                .await
                .map_err(|source| ExecutionError {
                    phase: ExecutionPhase::Create,
                    step,
                    source,
                })?;
            progress.created.push(id);
        }
        Ok(())
    }
}
