//! Propagation passes, bootstrap and re-entrancy of the sync controller.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{fast_settings, Fixture, FailingEmbeddingStore};
use storysync::domain::models::{Card, CardMeta, Representation};
use storysync::infrastructure::storage::StoryFiles;
use storysync::services::{
    parse_outline, render_outline, BootstrapOutcome, ControllerState, PassOutcome,
    SyncController, SyncSettings,
};
use tokio::sync::mpsc;

fn indexed(id: &str, title: &str, content: &str, version: u64) -> Card {
    Card::new(id, "scene", title, content, 1_000)
        .with_tags(vec![format!("tag-{id}")])
        .with_meta(CardMeta {
            version,
            updated_at: 1_000,
        })
}

async fn seed_index(fixture: &Fixture, cards: &[Card]) {
    fixture.files().write_index(cards).await.unwrap();
    fixture.files().write_outline(cards).await.unwrap();
    fixture.files().write_narrative(cards).await.unwrap();
}

#[tokio::test]
async fn test_bootstrap_seeds_empty_stores() {
    let fixture = Fixture::new().await;

    let outcome = fixture.controller.bootstrap().await.unwrap();

    assert_eq!(outcome, BootstrapOutcome::Seeded);
    let index = fixture.files().read_index().await;
    assert_eq!(index.len(), 1);
    assert_eq!(index[0].id, "card_001");
    assert_eq!(index[0].title, "Example Opening");
    assert!(fixture
        .read(Representation::Outline)
        .starts_with("--CARD_START id:card_001\n"));
    assert_eq!(
        fixture.read(Representation::Narrative),
        "This is a sample paragraph. Replace me."
    );
    assert_eq!(fixture.embeddings.sources(), vec!["init"]);
}

#[tokio::test]
async fn test_bootstrap_twice_is_byte_identical() {
    let fixture = Fixture::new().await;
    fixture.controller.bootstrap().await.unwrap();
    let first = fixture.snapshot();

    let outcome = fixture.controller.bootstrap().await.unwrap();

    assert_eq!(outcome, BootstrapOutcome::Merged { cards: 1 });
    assert_eq!(fixture.snapshot(), first);
}

#[tokio::test]
async fn test_bootstrap_from_narrative_only() {
    let fixture = Fixture::new().await;
    fixture.write(Representation::Narrative, "Alpha.\n\nBeta.");

    let outcome = fixture.controller.bootstrap().await.unwrap();

    assert_eq!(outcome, BootstrapOutcome::FromNarrative { cards: 2 });
    let index = fixture.files().read_index().await;
    let ids: Vec<_> = index.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["card_001", "card_002"]);
    assert_eq!(index[0].card_type, "scene");
    assert_eq!(index[0].title, "Paragraph 1");
    assert_eq!(index[1].content, "Beta.");
    assert_eq!(fixture.read(Representation::Narrative), "Alpha.\n\nBeta.");
    assert_eq!(parse_outline(&fixture.read(Representation::Outline)).len(), 2);
    assert_eq!(fixture.embeddings.sources(), vec!["story_txt"]);
}

#[tokio::test]
async fn test_bootstrap_merges_outline_into_index() {
    let fixture = Fixture::new().await;
    fixture
        .files()
        .write_index(&[indexed("a", "A", "alpha", 3)])
        .await
        .unwrap();
    fixture.write(
        Representation::Outline,
        &render_outline(&[Card::new("b", "note", "B", "beta", 0)]),
    );

    let outcome = fixture.controller.bootstrap().await.unwrap();

    assert_eq!(outcome, BootstrapOutcome::Merged { cards: 2 });
    let index = fixture.files().read_index().await;
    let ids: Vec<_> = index.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
    assert_eq!(index[1].meta.version, 3);
    assert_eq!(fixture.read(Representation::Narrative), "beta\n\nalpha");
}

#[tokio::test]
async fn test_outline_edit_propagates_to_index_and_narrative() {
    let fixture = Fixture::new().await;
    seed_index(&fixture, &[indexed("a", "A", "alpha", 4)]).await;

    let edited = "--CARD_START id:a\nType: scene\nTitle: A revised\nContent:\nalpha\n--CARD_END\n\n\
                  --CARD_START id:fresh\nType: note\nTitle: New\nContent:\nfresh text\n--CARD_END\n";
    fixture.write(Representation::Outline, edited);

    let outline_path = fixture.files().path(Representation::Outline);
    let outcome = fixture.controller.on_debounce_expired(&outline_path).await;

    assert_eq!(
        outcome,
        PassOutcome::Propagated {
            origin: Representation::Outline,
            cards: 2
        }
    );
    let index = fixture.files().read_index().await;
    assert_eq!(index[0].title, "A revised");
    assert_eq!(index[0].tags, vec!["tag-a".to_string()]);
    assert_eq!(index[0].meta.version, 4);
    assert_eq!(index[1].id, "fresh");
    assert!(index[1].tags.is_empty());
    assert_eq!(index[1].meta.version, 1);
    assert_eq!(fixture.read(Representation::Narrative), "alpha\n\nfresh text");
    // The origin store is never rewritten by its own pass.
    assert_eq!(fixture.read(Representation::Outline), edited);
    assert_eq!(fixture.embeddings.sources(), vec!["outline_change"]);
}

#[tokio::test]
async fn test_outline_pass_never_drops_index_cards() {
    let fixture = Fixture::new().await;
    seed_index(
        &fixture,
        &[indexed("a", "A", "alpha", 1), indexed("b", "B", "beta", 1)],
    )
    .await;
    fixture.write(
        Representation::Outline,
        &render_outline(&[Card::new("a", "scene", "A", "alpha", 0)]),
    );

    let path = fixture.files().path(Representation::Outline);
    fixture.controller.on_debounce_expired(&path).await;

    let index = fixture.files().read_index().await;
    let ids: Vec<_> = index.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[tokio::test]
async fn test_index_edit_propagates_to_text_stores() {
    let fixture = Fixture::new().await;
    seed_index(&fixture, &[indexed("a", "A", "alpha", 1)]).await;

    let mut edited = fixture.files().read_index().await;
    edited[0].content = "alpha rewritten".to_string();
    edited.push(indexed("b", "B", "beta", 1));
    fixture.write(
        Representation::Json,
        &serde_json::to_string_pretty(&edited).unwrap(),
    );
    let index_before = fixture.read(Representation::Json);

    let path = fixture.files().path(Representation::Json);
    let outcome = fixture.controller.on_debounce_expired(&path).await;

    assert!(matches!(
        outcome,
        PassOutcome::Propagated {
            origin: Representation::Json,
            cards: 2
        }
    ));
    assert_eq!(
        fixture.read(Representation::Narrative),
        "alpha rewritten\n\nbeta"
    );
    let outline = parse_outline(&fixture.read(Representation::Outline));
    assert_eq!(outline[0].content, "alpha rewritten");
    assert_eq!(outline[1].id, "b");
    assert_eq!(fixture.read(Representation::Json), index_before);
    assert_eq!(fixture.embeddings.sources(), vec!["json_change"]);
}

#[tokio::test]
async fn test_narrative_edit_keeps_index_metadata() {
    let fixture = Fixture::new().await;
    seed_index(&fixture, &[indexed("card_001", "Opening", "old", 6)]).await;
    fixture.write(Representation::Narrative, "New text.\n\nSecond paragraph.");

    let path = fixture.files().path(Representation::Narrative);
    fixture.controller.on_debounce_expired(&path).await;

    let index = fixture.files().read_index().await;
    assert_eq!(index.len(), 2);
    assert_eq!(index[0].content, "New text.");
    assert_eq!(index[0].title, "Paragraph 1");
    assert_eq!(index[0].tags, vec!["tag-card_001".to_string()]);
    assert_eq!(index[0].meta.version, 6);
    assert_eq!(index[1].id, "card_002");
    assert_eq!(fixture.embeddings.sources(), vec!["story_txt_change"]);
}

#[tokio::test]
async fn test_malformed_index_reads_as_empty() {
    let fixture = Fixture::new().await;
    fixture.write(Representation::Json, "{ not json");
    fixture.write(
        Representation::Outline,
        &render_outline(&[Card::new("a", "scene", "A", "alpha", 0)]),
    );

    let path = fixture.files().path(Representation::Outline);
    let outcome = fixture.controller.on_debounce_expired(&path).await;

    assert!(matches!(outcome, PassOutcome::Propagated { cards: 1, .. }));
    assert_eq!(fixture.files().read_index().await[0].id, "a");
}

#[tokio::test]
async fn test_second_pass_changes_nothing() {
    let fixture = Fixture::new().await;
    fixture.controller.bootstrap().await.unwrap();
    let path = fixture.files().path(Representation::Outline);

    fixture.controller.on_debounce_expired(&path).await;
    let after_first = fixture.snapshot();
    fixture.controller.on_debounce_expired(&path).await;

    assert_eq!(fixture.snapshot(), after_first);
}

#[tokio::test]
async fn test_pass_dropped_while_lock_held() {
    let fixture = Fixture::new().await;
    seed_index(&fixture, &[indexed("a", "A", "alpha", 1)]).await;
    fixture.write(
        Representation::Outline,
        &render_outline(&[Card::new("a", "scene", "Changed", "alpha", 0)]),
    );
    let before = fixture.read(Representation::Json);

    let guard = fixture.controller.lock().try_acquire(Duration::ZERO);
    assert!(guard.is_some());
    let path = fixture.files().path(Representation::Outline);
    let outcome = fixture.controller.on_debounce_expired(&path).await;

    assert_eq!(outcome, PassOutcome::Dropped);
    assert_eq!(fixture.read(Representation::Json), before);
    assert_eq!(fixture.controller.state(), ControllerState::Idle);
    assert!(fixture.embeddings.batches().is_empty());

    drop(guard);
    let outcome = fixture.controller.on_debounce_expired(&path).await;
    assert!(matches!(outcome, PassOutcome::Propagated { .. }));
}

#[tokio::test]
async fn test_lock_held_until_release_delay_after_pass() {
    let fixture = Fixture::with_settings(SyncSettings {
        debounce: Duration::from_millis(10),
        lock_release_delay: Duration::from_millis(100),
    })
    .await;
    fixture.controller.bootstrap().await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let path = fixture.files().path(Representation::Json);
    let first = fixture.controller.on_debounce_expired(&path).await;
    let second = fixture.controller.on_debounce_expired(&path).await;

    assert!(matches!(first, PassOutcome::Propagated { .. }));
    assert_eq!(second, PassOutcome::Dropped);

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(!fixture.controller.lock().is_held());
}

#[tokio::test]
async fn test_failed_pass_returns_to_idle_and_releases_lock() {
    let fixture = Fixture::with_settings(SyncSettings {
        debounce: Duration::from_millis(10),
        lock_release_delay: Duration::from_millis(50),
    })
    .await;
    let index_path = fixture.files().path(Representation::Json);
    std::fs::remove_file(&index_path).unwrap();
    std::fs::create_dir(&index_path).unwrap();
    fixture.write(
        Representation::Outline,
        &render_outline(&[Card::new("a", "scene", "A", "alpha", 0)]),
    );

    let path = fixture.files().path(Representation::Outline);
    let outcome = fixture.controller.on_debounce_expired(&path).await;

    assert!(matches!(outcome, PassOutcome::Failed(_)), "got {outcome:?}");
    assert_eq!(fixture.controller.state(), ControllerState::Idle);
    assert!(fixture.embeddings.batches().is_empty());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!fixture.controller.lock().is_held());
}

#[tokio::test]
async fn test_unrelated_path_is_ignored() {
    let fixture = Fixture::new().await;
    let path = fixture.files().memory_path();

    assert_eq!(
        fixture.controller.on_debounce_expired(&path).await,
        PassOutcome::Ignored
    );
}

#[tokio::test]
async fn test_burst_of_events_runs_one_pass_for_last_file() {
    let fixture = Fixture::new().await;
    seed_index(&fixture, &[indexed("a", "A", "alpha", 1)]).await;
    let mut edited = fixture.files().read_index().await;
    edited[0].content = "from index".to_string();
    fixture.write(
        Representation::Json,
        &serde_json::to_string_pretty(&edited).unwrap(),
    );

    let (tx, rx) = mpsc::unbounded_channel();
    let controller = Arc::clone(&fixture.controller);
    let run = tokio::spawn(async move { controller.run(rx).await });

    tx.send(fixture.files().path(Representation::Outline)).unwrap();
    tx.send(fixture.files().path(Representation::Narrative)).unwrap();
    tx.send(fixture.files().path(Representation::Json)).unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(fixture.embeddings.sources(), vec!["json_change"]);
    assert_eq!(fixture.read(Representation::Narrative), "from index");
    assert_eq!(fixture.controller.state(), ControllerState::Idle);

    drop(tx);
    run.await.unwrap();
}

#[tokio::test]
async fn test_embedding_failure_does_not_fail_pass() {
    let dir = tempfile::tempdir().unwrap();
    let files = StoryFiles::new(dir.path());
    files.ensure_files().await.unwrap();
    let controller = SyncController::new(files, Arc::new(FailingEmbeddingStore), fast_settings());

    assert_eq!(
        controller.bootstrap().await.unwrap(),
        BootstrapOutcome::Seeded
    );
    assert_eq!(controller.files().read_index().await.len(), 1);
}
