use std::sync::Arc;

use flashdeck_core::codec::{self, ColumnMask, DelimiterConfig, FieldDelimiter, RecordDelimiter};
use flashdeck_core::model::{CardContent, CardId, DeckDraft, DeckId};
use services::{DeckCreateService, DeckEditSession, ExecutionPhase, SessionError};
use storage::repository::{DeckStore, InMemoryRepository, StoreCall, StoreOp};

async fn create_animals(repo: &InMemoryRepository) -> DeckId {
    let service = DeckCreateService::new(Arc::new(repo.clone()));
    let mut draft = DeckDraft::new_deck();
    draft.set_title("Animals");
    draft.add_field();
    draft.set_field_label(0, "Notes");

    let config = DelimiterConfig::new(FieldDelimiter::Pipe, RecordDelimiter::Newline);
    service
        .create_from_text(
            &draft,
            "cat | chat | feline\ndog | chien\nbird | oiseau | sings",
            &config,
        )
        .await
        .expect("create deck")
}

#[tokio::test]
async fn editor_flow_create_edit_rename_save() {
    let repo = InMemoryRepository::new();
    let deck_id = create_animals(&repo).await;
    let store: Arc<dyn DeckStore> = Arc::new(repo.clone());

    let mut session = DeckEditSession::load(Arc::clone(&store), deck_id)
        .await
        .expect("load deck");
    {
        let draft = session.draft_mut().expect("editable");
        let dog = draft.cards()[1].client_key();
        draft.remove_card(dog).expect("remove dog");
        draft.set_field_label(0, "Usage Notes");
        let fish = draft.add_card();
        draft.set_front(fish, "fish").expect("front");
        draft.set_back(fish, "poisson").expect("back");
        draft.set_custom_value(fish, "usage_notes", "swims").expect("notes");
        draft.add_card();
    }

    let plan = session.plan_preview();
    assert_eq!(plan.deletes, vec![CardId::new(2)]);
    let patch = plan.patch.as_ref().expect("patch for rename");
    assert_eq!(patch.updated_cards.len(), 2);
    assert_eq!(plan.creates.len(), 1);

    let outcome = session.submit().await.expect("save");
    assert_eq!(outcome.created, vec![CardId::new(4)]);
    assert_eq!(
        repo.calls().expect("calls")[1..],
        [
            StoreCall::DeleteCard(CardId::new(2)),
            StoreCall::PatchDeck(deck_id),
            StoreCall::CreateCard(CardId::new(4)),
        ]
    );

    let deck = store.load_deck(deck_id).await.expect("reload");
    assert_eq!(deck.custom_fields[0].name(), "usage_notes");
    let contents: Vec<CardContent> = deck.cards.into_iter().map(|c| c.content).collect();
    assert_eq!(
        contents,
        vec![
            CardContent::new("cat", "chat").with_custom("usage_notes", "feline"),
            CardContent::new("bird", "oiseau").with_custom("usage_notes", "sings"),
            CardContent::new("fish", "poisson").with_custom("usage_notes", "swims"),
        ]
    );
}

#[tokio::test]
async fn editor_flow_resumes_after_partial_failure() {
    let repo = InMemoryRepository::new();
    let deck_id = create_animals(&repo).await;

    let mut session = DeckEditSession::load(Arc::new(repo.clone()), deck_id)
        .await
        .expect("load deck");
    {
        let draft = session.draft_mut().expect("editable");
        let cat = draft.cards()[0].client_key();
        draft.remove_card(cat).expect("remove cat");
        draft.set_public(true);
        let cow = draft.add_card();
        draft.set_front(cow, "cow").expect("front");
        draft.set_back(cow, "vache").expect("back");
    }

    repo.fail_next(StoreOp::PatchDeck).expect("inject");
    let err = session.submit().await.expect_err("patch fails");
    let SessionError::Execution(execution) = err else {
        panic!("expected execution error, got {err:?}");
    };
    assert_eq!(execution.phase, ExecutionPhase::Patch);
    assert!(matches!(session.draft_mut(), Err(SessionError::PlanPending)));

    session.submit().await.expect("resume");
    let calls = repo.calls().expect("calls");
    let deletes = calls
        .iter()
        .filter(|c| matches!(c, StoreCall::DeleteCard(_)))
        .count();
    assert_eq!(deletes, 1, "committed delete is not replayed");

    let deck = repo.load_deck(deck_id).await.expect("reload");
    assert!(deck.is_public);
    let fronts: Vec<&str> = deck.cards.iter().map(|c| c.content.front.as_str()).collect();
    assert_eq!(fronts, vec!["dog", "bird", "cow"]);
}

#[tokio::test]
async fn editor_flow_export_reimport_round_trip() {
    let repo = InMemoryRepository::new();
    let deck_id = create_animals(&repo).await;
    let session = DeckEditSession::load(Arc::new(repo.clone()), deck_id)
        .await
        .expect("load deck");

    let draft = session.draft();
    let config = DelimiterConfig::new(FieldDelimiter::Semicolon, RecordDelimiter::DoubleNewline);
    let records = draft.export_records();
    let text = codec::serialize(
        &records,
        &config,
        draft.registry(),
        &ColumnMask::all(draft.registry().len()),
    );
    assert_eq!(text, "cat;chat;feline\n\ndog;chien;\n\nbird;oiseau;sings");
    assert_eq!(codec::parse(&text, &config, draft.registry().len()), records);
}
