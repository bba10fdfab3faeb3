use axon_console::config::AxonMode;
use axon_console::debate::{
    DebateStatus, DebateStore, DebateView, IgnoredReason, SqliteDebateStore, StepOutcome,
    TurnOutcome, deep_link_fragment, parse_deep_link,
};

use crate::debate_harness::{adapter, memory_store, new_view, runner};

#[tokio::test]
async fn single_round_debate_completes_after_two_turns() {
    let runner = runner(adapter(AxonMode::Mock, ""));
    let mut view = new_view(&["Ada: fares pay for upkeep", "Grace: free access"], 1);

    assert!(runner.start(&mut view).is_applied());
    assert_eq!(view.round_display(), "Round: 1/1");

    for expected in ["Ada", "Grace"] {
        match runner.generate_turn(&mut view).await.unwrap() {
            TurnOutcome::Spoke(message) => {
                assert_eq!(message.speaker.as_deref(), Some(expected));
                assert!(message.content.starts_with("(mock reply #1)"));
            }
            TurnOutcome::Skipped(reason) => panic!("unexpected skip: {reason}"),
        }
    }

    assert_eq!(view.session().status, DebateStatus::Completed);
    assert_eq!(view.round_display(), "Round: 1/1");

    let before = view.session().clone();
    assert!(matches!(
        runner.generate_turn(&mut view).await.unwrap(),
        TurnOutcome::Skipped(_)
    ));
    assert_eq!(view.session(), &before);
}

#[tokio::test]
async fn counters_stay_within_bounds_through_a_full_run() {
    let runner = runner(adapter(AxonMode::Mock, ""));
    let mut view = new_view(&["Ada", "Grace", "Linus"], 3);
    runner.start(&mut view);

    let seats = 3;
    while let TurnOutcome::Spoke(_) = runner.generate_turn(&mut view).await.unwrap() {
        let session = view.session();
        assert!(session.turns_in_round <= seats);
        assert!(session.current_round <= session.max_rounds);
        if session.current_round < session.max_rounds {
            assert!(session.turns_in_round < seats);
        }
    }

    let session = view.session();
    assert_eq!(session.status, DebateStatus::Completed);
    assert_eq!(session.turns().count(), 9);
}

#[tokio::test]
async fn stored_debate_reopens_read_only_from_a_share_link() {
    let store = memory_store().await;
    let runner = runner(adapter(AxonMode::Mock, ""));

    let mut view = new_view(&["Ada", "Grace"], 2);
    runner.start(&mut view);
    runner.generate_turn(&mut view).await.unwrap();
    store.save(view.session()).await.unwrap();

    let link = format!("https://axon.example.com/debates{}", deep_link_fragment(&view.session().id));
    let id = parse_deep_link(&link).unwrap();
    let mut shared = DebateView::read_only(store.load(&id).await.unwrap());

    assert!(shared.controls().none_enabled());
    assert_eq!(
        runner.pause(&mut shared),
        StepOutcome::Ignored(IgnoredReason::ReadOnly)
    );
    assert_eq!(
        runner.generate_turn(&mut shared).await.unwrap(),
        TurnOutcome::Skipped(IgnoredReason::ReadOnly)
    );
    assert_eq!(shared.session(), &store.load(&id).await.unwrap());
}

#[tokio::test]
async fn debate_survives_a_store_round_trip_between_turns() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("debates.db");
    let runner = runner(adapter(AxonMode::Mock, ""));

    let id = {
        let store = SqliteDebateStore::open(&path).await.unwrap();
        let mut view = new_view(&["Ada", "Grace"], 1);
        runner.start(&mut view);
        runner.generate_turn(&mut view).await.unwrap();
        store.save(view.session()).await.unwrap();
        view.session().id.clone()
    };

    let store = SqliteDebateStore::open(&path).await.unwrap();
    let mut view = DebateView::editable(store.load(&id).await.unwrap());
    assert_eq!(view.session().next_speaker().unwrap().name, "Grace");
    runner.generate_turn(&mut view).await.unwrap();
    store.save(view.session()).await.unwrap();

    let reloaded = store.load(&id).await.unwrap();
    assert_eq!(reloaded.status, DebateStatus::Completed);
    assert_eq!(reloaded.messages.len(), 3);
    assert_eq!(store.list().await.unwrap()[0].message_count, 3);
}
