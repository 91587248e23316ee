use std::sync::Arc;

use flashdeck_core::model::{DeckDraft, DeckId, DeckSnapshot};
use flashdeck_core::reconcile::{OperationPlan, reconcile};
use storage::repository::DeckStore;

use crate::error::SessionError;
use crate::executor::{ExecutionOutcome, ExecutionProgress, PlanExecutor};

#[derive(Debug, Clone)]
struct PendingPlan {
    plan: OperationPlan,
    progress: ExecutionProgress,
}

/// Load, edit and save one existing deck.
///
/// The session owns its draft and the snapshot taken at load. A save that
/// fails midway keeps the plan and its progress: editing is refused until
/// the plan is finished by another `submit` or dropped with
/// `discard_pending`.
pub struct DeckEditSession {
    deck_id: DeckId,
    draft: DeckDraft,
    snapshot: DeckSnapshot,
    executor: PlanExecutor,
    pending: Option<PendingPlan>,
    closed: bool,
}

impl DeckEditSession {
    /// Fetch a deck and open it for editing.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the deck cannot be loaded.
    pub async fn load(store: Arc<dyn DeckStore>, deck_id: DeckId) -> Result<Self, SessionError> {
        let deck = store.load_deck(deck_id).await?;
        let (draft, snapshot) = DeckDraft::load(deck);
        Ok(Self {
            deck_id,
            draft,
            snapshot,
            executor: PlanExecutor::new(store),
            pending: None,
            closed: false,
        })
    }

    #[must_use]
    pub fn deck_id(&self) -> DeckId {
        self.deck_id
    }

    #[must_use]
    pub fn draft(&self) -> &DeckDraft {
        &self.draft
    }

    #[must_use]
    pub fn snapshot(&self) -> &DeckSnapshot {
        &self.snapshot
    }

    /// Mutable access for edits.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::PlanPending` while an unfinished save exists,
    /// or `SessionError::Closed` after a successful save.
    pub fn draft_mut(&mut self) -> Result<&mut DeckDraft, SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        if self.pending.is_some() {
            return Err(SessionError::PlanPending);
        }
        Ok(&mut self.draft)
    }

    /// The plan the next `submit` would run.
    #[must_use]
    pub fn plan_preview(&self) -> OperationPlan {
        match &self.pending {
            Some(pending) => pending.plan.clone(),
            None => reconcile(&self.snapshot, &self.draft),
        }
    }

    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.pending.is_some() || !reconcile(&self.snapshot, &self.draft).is_empty()
    }

    #[must_use]
    pub fn has_pending_plan(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Validate, reconcile and apply the draft.
    ///
    /// With a pending plan, the draft is not re-read: the same plan resumes
    /// from its first uncommitted step.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Validation` with every draft problem, or
    /// `SessionError::Execution` when a store call fails.
    pub async fn submit(&mut self) -> Result<ExecutionOutcome, SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }

        let mut pending = match self.pending.take() {
            Some(pending) => pending,
            None => {
                self.draft.validate().map_err(SessionError::Validation)?;
                PendingPlan {
                    plan: reconcile(&self.snapshot, &self.draft),
                    progress: ExecutionProgress::default(),
                }
            }
        };

        let result = self
            .executor
            .resume(self.deck_id, &pending.plan, &mut pending.progress)
            .await;
        match result {
            Ok(()) => {
                self.closed = true;
                Ok(pending.progress.into())
            }
            Err(err) => {
                self.pending = Some(pending);
                Err(err.into())
            }
        }
    }

    /// Drop an unfinished save and reopen the deck as the store now has it.
    ///
    /// Steps already committed stay applied; unsaved edits are lost.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the deck cannot be reloaded; the
    /// pending plan is kept in that case.
    pub async fn discard_pending(&mut self) -> Result<(), SessionError> {
        if self.pending.is_none() {
            return Ok(());
        }
        let deck = self.executor.store().load_deck(self.deck_id).await?;
        let (draft, snapshot) = DeckDraft::load(deck);
        self.draft = draft;
        self.snapshot = snapshot;
        self.pending = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use flashdeck_core::model::{CardContent, CardId, DraftError, LoadedCard, LoadedDeck};
    use storage::repository::{InMemoryRepository, StoreCall, StoreOp};

    fn repo() -> InMemoryRepository {
        let repo = InMemoryRepository::new();
        repo.insert_deck(LoadedDeck {
            id: DeckId::new(3),
            title: "Colors".into(),
            is_public: false,
            custom_fields: Vec::new(),
            cards: vec![
                LoadedCard {
                    id: CardId::new(30),
                    content: CardContent::new("red", "rouge"),
                },
                LoadedCard {
                    id: CardId::new(31),
                    content: CardContent::new("blue", "bleu"),
                },
            ],
        })
        .unwrap();
        repo
    }

    #[tokio::test]
    async fn untouched_session_has_no_changes() {
        let session = DeckEditSession::load(Arc::new(repo()), DeckId::new(3))
            .await
            .unwrap();
        assert!(!session.has_changes());
        assert!(session.plan_preview().is_empty());
    }

    #[tokio::test]
    async fn invalid_draft_is_not_submitted() {
        let repo = repo();
        let mut session = DeckEditSession::load(Arc::new(repo.clone()), DeckId::new(3))
            .await
            .unwrap();
        session.draft_mut().unwrap().set_title("   ");

        let err = session.submit().await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Validation(ref errors) if errors == &vec![DraftError::EmptyTitle]
        ));
        assert!(repo.calls().unwrap().is_empty());
        assert!(session.draft_mut().is_ok());
    }

    #[tokio::test]
    async fn failed_save_locks_edits_until_resumed() {
        let repo = repo();
        let mut session = DeckEditSession::load(Arc::new(repo.clone()), DeckId::new(3))
            .await
            .unwrap();
        {
            let draft = session.draft_mut().unwrap();
            let red = draft.cards()[0].client_key();
            draft.remove_card(red).unwrap();
            let green = draft.add_card();
            draft.set_front(green, "green").unwrap();
            draft.set_back(green, "vert").unwrap();
        }
        repo.fail_next(StoreOp::CreateCard).unwrap();

        let err = session.submit().await.unwrap_err();
        assert!(matches!(err, SessionError::Execution(_)));
        assert!(session.has_pending_plan());
        assert!(matches!(session.draft_mut(), Err(SessionError::PlanPending)));

        let outcome = session.submit().await.unwrap();
        assert_eq!(outcome.deleted, 1);
        assert_eq!(outcome.created, vec![CardId::new(32)]);
        assert_eq!(
            repo.calls().unwrap(),
            vec![
                StoreCall::DeleteCard(CardId::new(30)),
                StoreCall::CreateCard(CardId::new(32)),
            ]
        );
        assert!(session.is_closed());
        assert!(matches!(session.submit().await, Err(SessionError::Closed)));
    }

    #[tokio::test]
    async fn discard_reloads_committed_state() {
        let repo = repo();
        let mut session = DeckEditSession::load(Arc::new(repo.clone()), DeckId::new(3))
            .await
            .unwrap();
        {
            let draft = session.draft_mut().unwrap();
            let blue = draft.cards()[1].client_key();
            draft.remove_card(blue).unwrap();
            draft.set_title("Couleurs");
        }
        repo.fail_next(StoreOp::PatchDeck).unwrap();
        session.submit().await.unwrap_err();

        session.discard_pending().await.unwrap();
        assert!(!session.has_pending_plan());
        assert_eq!(session.draft().title(), "Colors");
        assert_eq!(session.draft().cards().len(), 1);
        assert!(!session.has_changes());
        assert!(session.draft_mut().is_ok());
    }
}
