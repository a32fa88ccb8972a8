#![allow(non_snake_case)]

use super::*;
use crate::{
    actions::{
        PullCount,
        ShopUpgrade,
    },
    chain::TransactionDigest,
    items::{
        Gear,
        GearSlot,
        Rarity,
    },
};
use std::sync::{
    Arc,
    Mutex,
    atomic::{
        AtomicUsize,
        Ordering,
    },
};

fn id(raw: &str) -> ObjectId {
    raw.parse().unwrap()
}

fn owner() -> SuiAddress {
    id("0xa11ce")
}

fn config() -> ContractConfig {
    ContractConfig {
        package_id: Some(id("0x100")),
        nft_mint_authority_id: Some(id("0x200")),
        ..ContractConfig::default()
    }
}

fn snapshot(hp: u64, gems: u64, potions: u64, roll_count: u64, position: u64) -> RunSnapshot {
    RunSnapshot {
        current_hp: hp,
        max_hp: 100,
        gems,
        potion_count: potions,
        potion_max_carry: 3,
        roll_count,
        position_on_board: position,
        board_tile_count: 20,
        ..RunSnapshot::default()
    }
}

fn run_object(run_id: &str, snapshot: RunSnapshot) -> RunObject {
    RunObject {
        id: id(run_id),
        player_id: id("0x42"),
        snapshot,
    }
}

fn gear(raw_id: &str) -> OwnedItem {
    OwnedItem::Gear(Gear {
        id: id(raw_id),
        slot: GearSlot::Weapon,
        set_id: 0,
        rarity: Rarity::Normal,
        atk: 3,
        hp: 0,
        acc: 0,
        def: 0,
    })
}

fn digest() -> Confirmation {
    Confirmation {
        digest: TransactionDigest("9xQe".to_string()),
    }
}

struct FakeExecutor {
    submit_result: Result<Confirmation, ChainError>,
    wait_result: Result<(), ChainError>,
    submitted: Arc<Mutex<Vec<MoveCall>>>,
}

impl FakeExecutor {
    fn accepting() -> Self {
        Self {
            submit_result: Ok(digest()),
            wait_result: Ok(()),
            submitted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn rejecting(reason: &str) -> Self {
        Self {
            submit_result: Err(ChainError::Rejected(reason.to_string())),
            ..Self::accepting()
        }
    }
}

impl TransactionExecutor for FakeExecutor {
    async fn submit(&self, call: &MoveCall) -> Result<Confirmation, ChainError> {
        self.submitted.lock().unwrap().push(call.clone());
        self.submit_result.clone()
    }

    async fn wait_for_confirmation(
        &self,
        _confirmation: &Confirmation,
    ) -> Result<(), ChainError> {
        self.wait_result.clone()
    }
}

struct FakeStateSource {
    player: Mutex<Result<Option<PlayerSnapshot>, ChainError>>,
    run: Mutex<Result<Option<RunObject>, ChainError>>,
    items: Mutex<Result<Vec<OwnedItem>, ChainError>>,
    queries: AtomicUsize,
}

impl FakeStateSource {
    fn new() -> Self {
        Self {
            player: Mutex::new(Ok(None)),
            run: Mutex::new(Ok(None)),
            items: Mutex::new(Ok(Vec::new())),
            queries: AtomicUsize::new(0),
        }
    }

    fn set_run(&self, run: Result<Option<RunObject>, ChainError>) {
        *self.run.lock().unwrap() = run;
    }

    fn set_items(&self, items: Vec<OwnedItem>) {
        *self.items.lock().unwrap() = Ok(items);
    }

    fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl StateSource for FakeStateSource {
    async fn player(
        &self,
        _owner: &SuiAddress,
    ) -> Result<Option<PlayerSnapshot>, ChainError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.player.lock().unwrap().clone()
    }

    async fn run(&self, _owner: &SuiAddress) -> Result<Option<RunObject>, ChainError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.run.lock().unwrap().clone()
    }

    async fn owned_items(&self, _owner: &SuiAddress) -> Result<Vec<OwnedItem>, ChainError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.items.lock().unwrap().clone()
    }
}

fn orchestrator_with_run(run: RunObject) -> ActionOrchestrator {
    let mut orchestrator = ActionOrchestrator::new();
    orchestrator.ingest_run(Some(run));
    orchestrator
}

async fn perform(
    orchestrator: &mut ActionOrchestrator,
    executor: &FakeExecutor,
    source: &FakeStateSource,
    action: Action,
) {
    let call = orchestrator.begin(action, &config()).unwrap();
    let report =
        ActionOrchestrator::execute(executor, source, owner(), action, call).await;
    orchestrator.complete(report);
}

#[tokio::test]
async fn roll__combat_shows_battle_then_feedback() {
    // given
    let before = run_object("0x7", snapshot(80, 10, 2, 4, 3));
    let after = run_object("0x7", snapshot(70, 25, 2, 5, 9));
    let mut orchestrator = orchestrator_with_run(before);
    let executor = FakeExecutor::accepting();
    let source = FakeStateSource::new();
    source.set_run(Ok(Some(after)));

    // when
    perform(
        &mut orchestrator,
        &executor,
        &source,
        Action::Roll { run: before.id },
    )
    .await;

    // then
    let expected = InferredEvent::Combat {
        gems_gained: 15,
        damage_taken: 10,
        is_boss: true,
    };
    assert_eq!(orchestrator.presentation(), Presentation::Battle(expected));
    assert_eq!(orchestrator.tile_log().get(9), Some(&expected));
    assert_eq!(orchestrator.tile_log().get(3), None);
    assert!(!orchestrator.has_pre_action_snapshot());
    assert!(!orchestrator.is_pending());

    orchestrator.finish_battle();
    assert_eq!(orchestrator.presentation(), Presentation::Feedback(expected));
    orchestrator.dismiss_event();
    assert_eq!(orchestrator.presentation(), Presentation::Idle);
}

#[tokio::test]
async fn roll__heal_skips_the_battle() {
    // given
    let before = run_object("0x7", snapshot(60, 10, 2, 1, 0));
    let mut orchestrator = orchestrator_with_run(before);
    let source = FakeStateSource::new();
    source.set_run(Ok(Some(run_object("0x7", snapshot(90, 10, 2, 2, 6)))));

    // when
    perform(
        &mut orchestrator,
        &FakeExecutor::accepting(),
        &source,
        Action::Roll { run: before.id },
    )
    .await;

    // then
    assert_eq!(
        orchestrator.presentation(),
        Presentation::Feedback(InferredEvent::Heal { hp_gained: 30 })
    );
}

#[tokio::test]
async fn begin__captures_snapshot_before_the_call_is_returned() {
    let before = run_object("0x7", snapshot(50, 0, 0, 0, 0));
    let mut orchestrator = orchestrator_with_run(before);

    let call = orchestrator
        .begin(Action::Roll { run: before.id }, &config())
        .unwrap();

    assert_eq!(call.function, "roll_and_move_entry");
    assert!(orchestrator.has_pre_action_snapshot());
    assert!(orchestrator.is_pending());
    assert_eq!(orchestrator.status(), "Roll dice...");
}

#[tokio::test]
async fn begin__rejects_a_second_action_while_one_is_pending() {
    // given
    let run = run_object("0x7", snapshot(50, 0, 1, 0, 0));
    let mut orchestrator = orchestrator_with_run(run);
    orchestrator
        .begin(Action::Roll { run: run.id }, &config())
        .unwrap();

    // when
    let second = orchestrator.begin(Action::UsePotion { run: run.id }, &config());

    // then
    assert_eq!(
        second,
        Err(OrchestratorError::Busy {
            pending: "Roll dice"
        })
    );
    assert_eq!(orchestrator.pending(), Some(Action::Roll { run: run.id }));
}

#[tokio::test]
async fn begin__unconfigured_package_leaves_nothing_pending() {
    let run = run_object("0x7", snapshot(50, 0, 1, 0, 0));
    let mut orchestrator = orchestrator_with_run(run);

    let result = orchestrator.begin(Action::Roll { run: run.id }, &ContractConfig::default());

    assert_eq!(
        result,
        Err(OrchestratorError::Config(ConfigError::Missing("package id")))
    );
    assert!(!orchestrator.is_pending());
    assert!(!orchestrator.has_pre_action_snapshot());
}

#[tokio::test]
async fn execute__rejected_submission_does_not_refetch() {
    // given
    let before = run_object("0x7", snapshot(50, 10, 1, 3, 4));
    let mut orchestrator = orchestrator_with_run(before);
    let executor = FakeExecutor::rejecting("user declined");
    let source = FakeStateSource::new();

    // when
    perform(
        &mut orchestrator,
        &executor,
        &source,
        Action::Roll { run: before.id },
    )
    .await;

    // then
    assert_eq!(source.queries(), 0);
    assert_eq!(orchestrator.run(), Some(&before));
    assert!(!orchestrator.has_pre_action_snapshot());
    assert!(!orchestrator.is_pending());
    assert_eq!(orchestrator.presentation(), Presentation::Idle);
    assert_eq!(
        orchestrator.last_error(),
        Some("Roll dice failed: user declined")
    );
}

#[tokio::test]
async fn execute__confirmation_timeout_still_refreshes_state() {
    // given
    let before = run_object("0x7", snapshot(50, 10, 1, 3, 4));
    let mut orchestrator = orchestrator_with_run(before);
    let executor = FakeExecutor {
        wait_result: Err(ChainError::ConfirmationTimeout(digest().digest)),
        ..FakeExecutor::accepting()
    };
    let source = FakeStateSource::new();
    source.set_run(Ok(Some(run_object("0x7", snapshot(50, 10, 2, 4, 8)))));

    // when
    perform(
        &mut orchestrator,
        &executor,
        &source,
        Action::Roll { run: before.id },
    )
    .await;

    // then
    assert_eq!(source.queries(), 3);
    assert_eq!(
        orchestrator.presentation(),
        Presentation::Feedback(InferredEvent::LuckyGacha { potions_gained: 1 })
    );
    assert_eq!(executor.submitted.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn complete__failed_run_refresh_keeps_stale_run_and_later_poll_classifies() {
    // given
    let before = run_object("0x7", snapshot(50, 10, 1, 3, 4));
    let mut orchestrator = orchestrator_with_run(before);
    let source = FakeStateSource::new();
    source.set_run(Err(ChainError::Transport {
        endpoint: "http://node".to_string(),
        message: "connection reset".to_string(),
    }));
    source.set_items(vec![gear("0xe1")]);

    // when
    perform(
        &mut orchestrator,
        &FakeExecutor::accepting(),
        &source,
        Action::Roll { run: before.id },
    )
    .await;

    // then
    assert_eq!(orchestrator.run(), Some(&before));
    assert_eq!(orchestrator.items().len(), 1);
    assert!(orchestrator.last_error().is_some());
    assert!(orchestrator.has_pre_action_snapshot());

    orchestrator.ingest_run(Some(run_object("0x7", snapshot(35, 10, 1, 4, 6))));
    assert_eq!(
        orchestrator.presentation(),
        Presentation::Feedback(InferredEvent::BadEvent { hp_lost: 15 })
    );
    assert!(!orchestrator.has_pre_action_snapshot());
}

#[tokio::test]
async fn ingest_run__poll_during_pending_action_does_not_classify() {
    // given
    let before = run_object("0x7", snapshot(80, 10, 2, 4, 3));
    let after = run_object("0x7", snapshot(70, 25, 2, 5, 9));
    let mut orchestrator = orchestrator_with_run(before);
    let call = orchestrator
        .begin(Action::Roll { run: before.id }, &config())
        .unwrap();

    // when
    orchestrator.ingest_run(Some(after));

    // then
    assert_eq!(orchestrator.presentation(), Presentation::Idle);
    assert!(orchestrator.has_pre_action_snapshot());

    let source = FakeStateSource::new();
    source.set_run(Ok(Some(after)));
    let report = ActionOrchestrator::execute(
        &FakeExecutor::accepting(),
        &source,
        owner(),
        Action::Roll { run: before.id },
        call,
    )
    .await;
    orchestrator.complete(report);
    assert!(orchestrator.presentation().event().is_some_and(InferredEvent::is_combat));
}

#[tokio::test]
async fn ingest_run__stale_read_does_not_consume_the_snapshot() {
    let before = run_object("0x7", snapshot(80, 10, 2, 4, 3));
    let mut orchestrator = orchestrator_with_run(before);
    let source = FakeStateSource::new();
    source.set_run(Ok(Some(before)));

    perform(
        &mut orchestrator,
        &FakeExecutor::accepting(),
        &source,
        Action::Roll { run: before.id },
    )
    .await;

    assert!(orchestrator.has_pre_action_snapshot());
    assert_eq!(orchestrator.presentation(), Presentation::Idle);
}

#[tokio::test]
async fn ingest_run__snapshot_of_another_run_is_never_compared() {
    // given
    let before = run_object("0x7", snapshot(80, 10, 2, 4, 3));
    let mut orchestrator = orchestrator_with_run(before);
    let source = FakeStateSource::new();
    source.set_run(Ok(Some(run_object("0x8", snapshot(100, 50, 2, 6, 1)))));

    // when
    perform(
        &mut orchestrator,
        &FakeExecutor::accepting(),
        &source,
        Action::Roll { run: before.id },
    )
    .await;

    // then
    assert_eq!(orchestrator.presentation(), Presentation::Idle);
    assert!(!orchestrator.has_pre_action_snapshot());
    assert!(orchestrator.tile_log().is_empty());
}

#[tokio::test]
async fn ingest_run__new_run_resets_the_tile_log() {
    // given
    let before = run_object("0x7", snapshot(80, 10, 2, 4, 3));
    let mut orchestrator = orchestrator_with_run(before);
    let source = FakeStateSource::new();
    source.set_run(Ok(Some(run_object("0x7", snapshot(70, 25, 2, 5, 9)))));
    perform(
        &mut orchestrator,
        &FakeExecutor::accepting(),
        &source,
        Action::Roll { run: before.id },
    )
    .await;
    assert_eq!(orchestrator.tile_log().len(), 1);

    // when
    let fresh = RunSnapshot {
        board_tile_count: 12,
        ..snapshot(100, 0, 0, 0, 0)
    };
    orchestrator.ingest_run(Some(run_object("0x9", fresh)));

    // then
    assert!(orchestrator.tile_log().is_empty());
    assert_eq!(orchestrator.tile_log().tile_count(), 12);
}

#[tokio::test]
async fn ingest_run__same_run_keeps_the_tile_log() {
    let before = run_object("0x7", snapshot(80, 10, 2, 4, 3));
    let mut orchestrator = orchestrator_with_run(before);
    let source = FakeStateSource::new();
    source.set_run(Ok(Some(run_object("0x7", snapshot(70, 25, 2, 5, 9)))));
    perform(
        &mut orchestrator,
        &FakeExecutor::accepting(),
        &source,
        Action::Roll { run: before.id },
    )
    .await;

    orchestrator.ingest_run(Some(run_object("0x7", snapshot(70, 25, 2, 5, 9))));
    orchestrator.ingest_run(Some(run_object("0x7", snapshot(70, 25, 1, 5, 9))));

    assert_eq!(orchestrator.tile_log().len(), 1);
}

#[tokio::test]
async fn use_potion__hp_gain_is_not_reported_as_an_event() {
    // given
    let before = run_object("0x7", snapshot(40, 10, 2, 4, 3));
    let mut orchestrator = orchestrator_with_run(before);
    let source = FakeStateSource::new();
    source.set_run(Ok(Some(run_object("0x7", snapshot(65, 10, 1, 4, 3)))));

    // when
    perform(
        &mut orchestrator,
        &FakeExecutor::accepting(),
        &source,
        Action::UsePotion { run: before.id },
    )
    .await;

    // then
    assert_eq!(orchestrator.presentation(), Presentation::Idle);
    assert!(orchestrator.tile_log().is_empty());
    assert_eq!(orchestrator.run().map(|r| r.snapshot.current_hp), Some(65));
    assert_eq!(orchestrator.status(), "Use potion confirmed");
}

#[tokio::test]
async fn shop_buy__refreshes_run_without_inferring() {
    let before = run_object("0x7", snapshot(40, 30, 1, 6, 3));
    let mut orchestrator = orchestrator_with_run(before);
    let source = FakeStateSource::new();
    source.set_run(Ok(Some(run_object("0x7", snapshot(40, 10, 2, 6, 3)))));

    perform(
        &mut orchestrator,
        &FakeExecutor::accepting(),
        &source,
        Action::ShopBuy {
            run: before.id,
            upgrade: ShopUpgrade::Potion,
        },
    )
    .await;

    assert_eq!(orchestrator.presentation(), Presentation::Idle);
    assert_eq!(orchestrator.run().map(|r| r.snapshot.potion_count), Some(2));
}

#[tokio::test]
async fn pull_gear__reports_newly_owned_items() {
    // given
    let mut orchestrator = ActionOrchestrator::new();
    orchestrator.ingest_items(vec![gear("0xe1")]);
    let source = FakeStateSource::new();
    source.set_items(vec![gear("0xe1"), gear("0xe2"), gear("0xe3")]);
    let executor = FakeExecutor::accepting();

    // when
    perform(
        &mut orchestrator,
        &executor,
        &source,
        Action::PullGear {
            count: PullCount::One,
        },
    )
    .await;

    // then
    let pulled: Vec<ObjectId> = orchestrator.last_pulled().iter().map(OwnedItem::id).collect();
    assert_eq!(pulled, vec![id("0xe2"), id("0xe3")]);
    assert_eq!(
        executor.submitted.lock().unwrap()[0].payment_mist,
        Some(PullCount::One.price_mist())
    );

    orchestrator.clear_pulled();
    assert!(orchestrator.last_pulled().is_empty());
}

#[tokio::test]
async fn ingest_run__run_ending_drops_the_run() {
    let before = run_object("0x7", snapshot(10, 10, 0, 4, 3));
    let mut orchestrator = orchestrator_with_run(before);

    orchestrator.ingest_run(None);

    assert_eq!(orchestrator.run(), None);
}

#[test]
fn dismiss_event__does_not_skip_the_battle() {
    let before = run_object("0x7", snapshot(80, 10, 2, 4, 3));
    let mut orchestrator = orchestrator_with_run(before);
    orchestrator
        .begin(Action::Roll { run: before.id }, &config())
        .unwrap();
    orchestrator.complete(ActionReport::Confirmed {
        action: Action::Roll { run: before.id },
        confirmation: digest(),
        refresh: StateRefresh {
            player: Ok(None),
            run: Ok(Some(run_object("0x7", snapshot(80, 12, 2, 5, 7)))),
            items: Ok(Vec::new()),
        },
    });

    orchestrator.dismiss_event();

    assert!(matches!(orchestrator.presentation(), Presentation::Battle(_)));
}

#[tokio::test]
async fn pull_gear__stale_inventory_read_keeps_waiting_for_new_items() {
    // given
    let mut orchestrator = ActionOrchestrator::new();
    orchestrator.ingest_items(vec![gear("0xe1")]);
    let source = FakeStateSource::new();
    source.set_items(vec![gear("0xe1")]);

    // when
    perform(
        &mut orchestrator,
        &FakeExecutor::accepting(),
        &source,
        Action::PullGear {
            count: PullCount::One,
        },
    )
    .await;
    let after_stale_read = orchestrator.last_pulled().len();
    orchestrator.ingest_items(vec![gear("0xe1"), gear("0xe2")]);

    // then
    assert_eq!(after_stale_read, 0);
    let pulled: Vec<ObjectId> = orchestrator.last_pulled().iter().map(OwnedItem::id).collect();
    assert_eq!(pulled, vec![id("0xe2")]);

    orchestrator.ingest_items(vec![gear("0xe1"), gear("0xe2"), gear("0xe9")]);
    assert_eq!(orchestrator.last_pulled().len(), 1);
}

#[tokio::test]
async fn begin__roll_waits_for_the_previous_roll_to_show_up() {
    // given
    let before = run_object("0x7", snapshot(80, 10, 2, 4, 3));
    let mut orchestrator = orchestrator_with_run(before);
    let source = FakeStateSource::new();
    source.set_run(Ok(Some(before)));
    perform(
        &mut orchestrator,
        &FakeExecutor::accepting(),
        &source,
        Action::Roll { run: before.id },
    )
    .await;

    // when
    let second = orchestrator.begin(Action::Roll { run: before.id }, &config());
    orchestrator.ingest_run(Some(run_object("0x7", snapshot(90, 10, 2, 5, 6))));
    let third = orchestrator.begin(Action::Roll { run: before.id }, &config());

    // then
    assert_eq!(second, Err(OrchestratorError::AwaitingRoll));
    assert_eq!(
        orchestrator.presentation(),
        Presentation::Feedback(InferredEvent::Heal { hp_gained: 10 })
    );
    assert!(third.is_ok());
}

#[tokio::test]
async fn ingest_run__gives_up_on_a_roll_that_never_shows_up() {
    let before = run_object("0x7", snapshot(80, 10, 2, 4, 3));
    let mut orchestrator = orchestrator_with_run(before);
    let source = FakeStateSource::new();
    source.set_run(Ok(Some(before)));
    perform(
        &mut orchestrator,
        &FakeExecutor::accepting(),
        &source,
        Action::Roll { run: before.id },
    )
    .await;

    for _ in 1..MAX_STALE_RUN_READS {
        orchestrator.ingest_run(Some(before));
    }

    assert!(!orchestrator.has_pre_action_snapshot());
    assert!(
        orchestrator
            .begin(Action::Roll { run: before.id }, &config())
            .is_ok()
    );
}

#[tokio::test]
async fn roll__repeated_event_is_presented_again() {
    // given
    let mut orchestrator = orchestrator_with_run(run_object("0x7", snapshot(60, 10, 2, 1, 0)));
    let source = FakeStateSource::new();
    let executor = FakeExecutor::accepting();

    // when
    source.set_run(Ok(Some(run_object("0x7", snapshot(70, 10, 2, 2, 4)))));
    perform(&mut orchestrator, &executor, &source, Action::Roll { run: id("0x7") }).await;
    let first = (orchestrator.presentation(), orchestrator.presentation_seq());
    source.set_run(Ok(Some(run_object("0x7", snapshot(80, 10, 2, 3, 8)))));
    perform(&mut orchestrator, &executor, &source, Action::Roll { run: id("0x7") }).await;
    let second = (orchestrator.presentation(), orchestrator.presentation_seq());

    // then
    let heal = Presentation::Feedback(InferredEvent::Heal { hp_gained: 10 });
    assert_eq!(first, (heal, 1));
    assert_eq!(second, (heal, 2));
}
