//! Draft-vs-snapshot diff producing an ordered store operation plan.

use std::collections::HashMap;

use serde::Serialize;

use crate::model::{
    CardContent, CardDraft, CardId, CardUpdate, ClientKey, CustomFieldRegistry, DeckDraft,
    DeckSnapshot,
};

/// The single deck-level update of a plan: metadata plus changed cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeckPatch {
    pub title: String,
    pub is_public: bool,
    pub custom_fields: CustomFieldRegistry,
    pub updated_cards: Vec<CardUpdate>,
}

/// Store operations for one submission.
///
/// Executed strictly as: every delete, then the patch, then every create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperationPlan {
    pub deletes: Vec<CardId>,
    pub patch: Option<DeckPatch>,
    pub creates: Vec<CardContent>,
}

/// One store call of a plan, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStep<'a> {
    Delete(CardId),
    Patch(&'a DeckPatch),
    Create(&'a CardContent),
}

impl OperationPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.patch.is_none() && self.creates.is_empty()
    }

    /// Number of store calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.deletes.len() + usize::from(self.patch.is_some()) + self.creates.len()
    }

    pub fn steps(&self) -> impl Iterator<Item = PlanStep<'_>> {
        self.deletes
            .iter()
            .copied()
            .map(PlanStep::Delete)
            .chain(self.patch.iter().map(PlanStep::Patch))
            .chain(self.creates.iter().map(PlanStep::Create))
    }
}

/// Diffs the current draft against its load-time snapshot.
///
/// Cards are joined on their client key. Cards with neither front nor back
/// never appear in the plan: a pre-existing card emptied by the user is
/// deleted, a new empty row is ignored, and a card stored without content is
/// left alone until the user fills it in.
#[must_use]
pub fn reconcile(original: &DeckSnapshot, current: &DeckDraft) -> OperationPlan {
    let live: HashMap<ClientKey, &CardDraft> = current
        .content_bearing_cards()
        .map(|card| (card.client_key(), card))
        .collect();

    let deletes = original
        .content_bearing_cards()
        .filter(|card| !live.contains_key(&card.client_key()))
        .filter_map(CardDraft::server_id)
        .collect();

    let baseline: HashMap<ClientKey, &CardDraft> = original
        .cards()
        .iter()
        .map(|card| (card.client_key(), card))
        .collect();

    let updated_cards: Vec<CardUpdate> = current
        .content_bearing_cards()
        .filter(|card| !card.is_new())
        .filter_map(|card| {
            let id = card.server_id()?;
            let before = baseline.get(&card.client_key())?;
            card_changed(before, original.registry(), card, current.registry()).then(|| {
                CardUpdate {
                    id,
                    content: card.to_content(current.registry()),
                }
            })
        })
        .collect();

    let patch = (metadata_changed(original, current) || !updated_cards.is_empty()).then(|| {
        DeckPatch {
            title: current.title().trim().to_owned(),
            is_public: current.is_public(),
            custom_fields: current.registry().clone(),
            updated_cards,
        }
    });

    let creates = current
        .content_bearing_cards()
        .filter(|card| card.is_new())
        .map(|card| card.to_content(current.registry()))
        .collect();

    OperationPlan {
        deletes,
        patch,
        creates,
    }
}

fn metadata_changed(original: &DeckDraft, current: &DeckDraft) -> bool {
    original.title().trim() != current.title().trim()
        || original.is_public() != current.is_public()
        || original.registry() != current.registry()
}

fn card_changed(
    before: &CardDraft,
    before_registry: &CustomFieldRegistry,
    after: &CardDraft,
    after_registry: &CustomFieldRegistry,
) -> bool {
    before.front() != after.front()
        || before.back() != after.back()
        || before.custom_data(before_registry) != after.custom_data(after_registry)
}
