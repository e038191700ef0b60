use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::time::{Duration, Instant};

use battle_core::{
    Action, AlwaysAttack, BattleMode, BattleOutcome, BattlePhase, CombatError, EnemyKind, FixedRng,
    HpChange, MonsterSpec, Outcome, ParticipantId, Rarity, RoundClose, RoundReport, SideId,
    SubmitStatus,
};
use battle_runtime::{
    BattleRuntime, Event, InMemoryPetStore, OutcomeEvent, PetRecord, RoundEvent, RuntimeError,
    Topic,
};

fn drone() -> MonsterSpec {
    MonsterSpec {
        name: "Scrap Drone".into(),
        health: 50,
        attack: 10,
        defense: 5,
        rarity: Rarity::Common,
        kind: EnemyKind::Monster,
    }
}

fn store_with(pets: &[(u64, &str, u32, u32, u32)]) -> Arc<InMemoryPetStore> {
    Arc::new(InMemoryPetStore::with_pets(pets.iter().map(
        |&(id, name, attack, defense, hp)| (ParticipantId(id), PetRecord::new(name, attack, defense, hp)),
    )))
}

fn runtime(store: Arc<InMemoryPetStore>) -> BattleRuntime {
    BattleRuntime::builder()
        .pet_store(store)
        .rng(FixedRng::AVERAGE)
        .monster_ai(AlwaysAttack)
        .build()
}

async fn next_resolved(rx: &mut broadcast::Receiver<Event>) -> (RoundClose, RoundReport) {
    loop {
        match rx.recv().await.expect("round topic closed") {
            Event::Round(RoundEvent::Resolved { close, report, .. }) => return (close, report),
            other => println!("  • {:?}", other.topic()),
        }
    }
}

/// A solo hunt from seating to persisted rewards.
#[tokio::test(start_paused = true)]
async fn solo_hunt_settles_rewards() {
    println!("\n── Solo hunt against a Scrap Drone ──");
    let store = store_with(&[(1, "Sparky", 30, 20, 100)]);
    let runtime = runtime(store.clone());

    let handle = runtime
        .open_pve(BattleMode::SoloPve, &[ParticipantId(1)], drone(), Some(11))
        .await
        .unwrap();
    let mut outcome_rx = handle.subscribe(Topic::Outcome);
    assert!(runtime.session(handle.id()).is_ok());

    let attack = Action::Attack {
        target: ParticipantId::MONSTER,
    };
    println!("Round 1: Sparky attacks");
    assert_eq!(
        handle.submit(ParticipantId(1), attack).await.unwrap(),
        SubmitStatus::QuorumReached
    );
    let state = handle.query_state().await.unwrap();
    assert_eq!(state.round_number, 2);
    assert_eq!(state.participant(ParticipantId::MONSTER).unwrap().hp, 22);

    println!("Round 2: Sparky finishes it");
    handle.submit(ParticipantId(1), attack).await.unwrap();

    let summary = handle.wait_finished().await.unwrap();
    println!("✓ Outcome: {:?} after {} rounds", summary.outcome, summary.rounds);
    assert_eq!(summary.outcome, BattleOutcome::Won { side: SideId::PARTY });
    assert_eq!(summary.rounds, 2);

    let record = store.get(ParticipantId(1)).unwrap();
    assert_eq!((record.experience, record.currency), (5, 5));
    assert_eq!(record.battles_won, 1);
    assert_eq!(record.loot.len(), 1);
    assert!(record.settled_battles.contains(&handle.id()));

    match outcome_rx.recv().await.unwrap() {
        Event::Outcome(OutcomeEvent::Finished { forfeited_by, .. }) => assert_eq!(forfeited_by, None),
        other => panic!("expected Finished, got {:?}", other),
    }
    match outcome_rx.recv().await.unwrap() {
        Event::Outcome(OutcomeEvent::RewardsSettled { settled, failed, .. }) => {
            assert_eq!(settled, vec![ParticipantId(1)]);
            assert!(failed.is_empty());
        }
        other => panic!("expected RewardsSettled, got {:?}", other),
    }

    assert!(runtime.registry().active_ids().unwrap().is_empty());
    assert!(matches!(
        runtime.session(handle.id()),
        Err(RuntimeError::UnknownBattle { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn round_closes_when_the_deadline_passes() {
    let store = store_with(&[(1, "Sparky", 30, 20, 100), (2, "Bolt", 30, 20, 100)]);
    let runtime = runtime(store);
    let handle = runtime
        .open_pve(
            BattleMode::GroupPve,
            &[ParticipantId(1), ParticipantId(2)],
            drone(),
            Some(3),
        )
        .await
        .unwrap();
    let mut round_rx = handle.subscribe(Topic::Round);
    let started = Instant::now();

    let status = handle
        .submit(
            ParticipantId(1),
            Action::Attack {
                target: ParticipantId::MONSTER,
            },
        )
        .await
        .unwrap();
    assert_eq!(status, SubmitStatus::Pending { remaining: 1 });

    // Bolt never answers; the round resolves without it.
    let (close, report) = next_resolved(&mut round_rx).await;
    assert_eq!(close, RoundClose::Timeout);
    assert!(started.elapsed() >= Duration::from_secs(60));
    assert_eq!(
        report.hp_changes[&ParticipantId::MONSTER],
        HpChange { before: 50, after: 22 }
    );

    match round_rx.recv().await.unwrap() {
        Event::Round(RoundEvent::Opened { round, expected, .. }) => {
            assert_eq!(round, 2);
            assert_eq!(expected, vec![ParticipantId(1), ParticipantId(2)]);
        }
        other => panic!("expected Opened, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn late_submissions_are_ignored() {
    let store = store_with(&[(1, "Sparky", 30, 20, 100), (2, "Bolt", 12, 4, 100)]);
    let runtime = runtime(store);
    let handle = runtime
        .open_pvp(
            BattleMode::PvpFreeForAll,
            &[(ParticipantId(1), SideId(0)), (ParticipantId(2), SideId(1))],
            Some(9),
        )
        .await
        .unwrap();

    handle.forfeit(SideId(1)).await.unwrap();
    handle.wait_finished().await.unwrap();

    let late = handle
        .submit(
            ParticipantId(1),
            Action::Attack {
                target: ParticipantId(2),
            },
        )
        .await
        .unwrap();
    assert_eq!(late, SubmitStatus::Ignored);

    let state = handle.query_state().await.unwrap();
    assert_eq!(state.phase, BattlePhase::Terminated);
    assert!(state.pending_actions.is_empty());
}

#[tokio::test(start_paused = true)]
async fn invalid_submissions_are_reported_to_the_caller() {
    let store = store_with(&[(1, "Sparky", 30, 20, 100), (2, "Bolt", 12, 4, 100)]);
    let runtime = runtime(store);
    let handle = runtime
        .open_pvp(
            BattleMode::PvpFreeForAll,
            &[(ParticipantId(1), SideId(0)), (ParticipantId(2), SideId(1))],
            Some(9),
        )
        .await
        .unwrap();

    let charge = Action::Charge;
    handle.submit(ParticipantId(1), charge).await.unwrap();
    assert!(matches!(
        handle.submit(ParticipantId(1), charge).await,
        Err(RuntimeError::Submit(_))
    ));
    match handle.submit(ParticipantId(7), charge).await {
        Err(RuntimeError::Submit(e)) => {
            let context = e.context().unwrap();
            assert_eq!(context.round, 1);
            assert_eq!(context.participant, Some(ParticipantId(7)));
        }
        other => panic!("expected a rejected submission, got {other:?}"),
    }

    let state = handle.query_state().await.unwrap();
    assert_eq!(state.pending_actions.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn forfeit_hands_the_win_to_the_other_side() {
    let store = store_with(&[(1, "Sparky", 30, 20, 100), (2, "Bolt", 12, 4, 100)]);
    let runtime = runtime(store.clone());
    let handle = runtime
        .open_pvp(
            BattleMode::PvpFreeForAll,
            &[(ParticipantId(1), SideId(0)), (ParticipantId(2), SideId(1))],
            Some(2),
        )
        .await
        .unwrap();
    let mut outcome_rx = handle.subscribe(Topic::Outcome);

    let summary = handle.forfeit(SideId(0)).await.unwrap();
    assert_eq!(summary.outcome, BattleOutcome::Won { side: SideId(1) });
    assert_eq!(summary.rewards[&ParticipantId(1)].outcome, Outcome::Defeat);

    match outcome_rx.recv().await.unwrap() {
        Event::Outcome(OutcomeEvent::Finished { forfeited_by, .. }) => {
            assert_eq!(forfeited_by, Some(SideId(0)))
        }
        other => panic!("expected Finished, got {:?}", other),
    }
    assert_eq!(handle.wait_finished().await.unwrap(), summary);
    assert_eq!(store.get(ParticipantId(1)).unwrap().battles_lost, 1);
    assert_eq!(store.get(ParticipantId(2)).unwrap().battles_won, 1);

    // The session is gone; a second forfeit cannot reach it.
    assert!(handle.forfeit(SideId(1)).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn idle_free_for_all_plays_itself_out() {
    let store = store_with(&[
        (1, "Sparky", 10, 0, 100),
        (2, "Bolt", 10, 0, 100),
        (3, "Fizz", 10, 0, 100),
    ]);
    let runtime = runtime(store);
    let handle = runtime
        .open_pvp(
            BattleMode::PvpFreeForAll,
            &[
                (ParticipantId(1), SideId(0)),
                (ParticipantId(2), SideId(0)),
                (ParticipantId(3), SideId(0)),
            ],
            Some(21),
        )
        .await
        .unwrap();

    // Every round times out and each entrant attacks someone at random.
    let summary = handle.wait_finished().await.unwrap();
    println!("✓ {:?} after {} rounds", summary.outcome, summary.rounds);
    assert!(summary.rounds >= 5);
    assert_eq!(summary.rewards.len(), 3);
    assert!(runtime.registry().active_ids().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn abandoned_pve_stalemate_is_forfeited() {
    let store = store_with(&[(1, "Sparky", 30, 20, 100)]);
    let runtime = runtime(store.clone());
    let handle = runtime
        .open_pve(BattleMode::SoloPve, &[ParticipantId(1)], drone(), Some(6))
        .await
        .unwrap();
    let started = Instant::now();

    // Nobody submits and the drone's 10 power meets 20 / 2 defense: a perfect block every round.
    let summary = handle.wait_finished().await.unwrap();
    assert_eq!(summary.outcome, BattleOutcome::Won { side: SideId::ENEMY });
    assert_eq!(summary.rounds, 10);
    assert!(started.elapsed() >= Duration::from_secs(600));

    let reward = &summary.rewards[&ParticipantId(1)];
    assert_eq!(reward.outcome, Outcome::Defeat);
    assert_eq!(reward.final_hp, 100);
    assert_eq!(store.get(ParticipantId(1)).unwrap().battles_lost, 1);
    assert!(runtime.registry().active_ids().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn shutdown_aborts_running_sessions() {
    let store = store_with(&[(1, "Sparky", 30, 20, 100)]);
    let runtime = runtime(store.clone());
    let handle = runtime
        .open_encounter(
            BattleMode::SoloPve,
            &[ParticipantId(1)],
            EnemyKind::Boss,
            Rarity::Legendary,
            Some(5),
        )
        .await
        .unwrap();
    assert_eq!(runtime.registry().active_ids().unwrap(), vec![handle.id()]);

    // The empty catalog falls back to the rarity table.
    let state = handle.query_state().await.unwrap();
    assert_eq!(state.participant(ParticipantId::MONSTER).unwrap().max_hp, 400);

    runtime.shutdown().await.unwrap();

    assert!(matches!(
        handle.wait_finished().await,
        Err(RuntimeError::SessionClosed { .. })
    ));
    assert!(store.get(ParticipantId(1)).unwrap().settled_battles.is_empty());
}
