//! Ties a player action to the run state the client shows.
//!
//! The flow for one action is `begin` -> `execute` -> `complete`. `begin` and
//! `complete` mutate the orchestrator and run on the UI loop; `execute` only
//! borrows the chain boundaries so it can be spawned. Periodic polling feeds
//! the same `ingest_*` methods that `complete` uses.

use crate::{
    actions::Action,
    chain::{
        ChainError,
        Confirmation,
        MoveCall,
        ObjectId,
        StateSource,
        SuiAddress,
        TransactionExecutor,
    },
    config::{
        ConfigError,
        ContractConfig,
    },
    detection::{
        InferredEvent,
        classify,
    },
    items::OwnedItem,
    snapshot::{
        PlayerSnapshot,
        RunObject,
        RunSnapshot,
    },
    tile_log::TileEventLog,
};
use std::collections::HashSet;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrchestratorError {
    #[error("{pending} is still in progress")]
    Busy { pending: &'static str },
    #[error("the last roll has not shown up on chain yet")]
    AwaitingRoll,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// What the event area of the screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Presentation {
    #[default]
    Idle,
    /// Fight animation, shown before the combat result.
    Battle(InferredEvent),
    Feedback(InferredEvent),
}

impl Presentation {
    pub fn event(&self) -> Option<&InferredEvent> {
        match self {
            Presentation::Idle => None,
            Presentation::Battle(event) | Presentation::Feedback(event) => Some(event),
        }
    }
}

/// Fresh reads of everything an action can change. Each query succeeds or
/// fails on its own.
#[derive(Debug, Clone)]
pub struct StateRefresh {
    pub player: Result<Option<PlayerSnapshot>, ChainError>,
    pub run: Result<Option<RunObject>, ChainError>,
    pub items: Result<Vec<OwnedItem>, ChainError>,
}

impl StateRefresh {
    pub async fn fetch<S>(source: &S, owner: &SuiAddress) -> Self
    where
        S: StateSource + Sync,
    {
        let (player, run, items) = tokio::join!(
            source.player(owner),
            source.run(owner),
            source.owned_items(owner),
        );
        Self { player, run, items }
    }
}

#[derive(Debug, Clone)]
pub enum ActionReport {
    Failed {
        action: Action,
        error: ChainError,
    },
    Confirmed {
        action: Action,
        confirmation: Confirmation,
        refresh: StateRefresh,
    },
}

/// Reads of the run that may lag behind a confirmed roll before the
/// snapshot taken for it is given up.
pub const MAX_STALE_RUN_READS: u32 = 5;

#[derive(Debug, Clone, Copy)]
struct PreActionSnapshot {
    run_id: ObjectId,
    snapshot: RunSnapshot,
    stale_reads: u32,
}

#[derive(Debug, Default)]
pub struct ActionOrchestrator {
    player: Option<PlayerSnapshot>,
    run: Option<RunObject>,
    items: Vec<OwnedItem>,
    pre_action: Option<PreActionSnapshot>,
    items_before_pull: Option<HashSet<ObjectId>>,
    pending: Option<Action>,
    tile_log: TileEventLog,
    presentation: Presentation,
    presentation_seq: u64,
    last_pulled: Vec<OwnedItem>,
    last_error: Option<String>,
    status: String,
}

impl ActionOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `action` pending and returns the call to submit. A dice roll
    /// captures the current run first so its outcome can be inferred.
    pub fn begin(
        &mut self,
        action: Action,
        config: &ContractConfig,
    ) -> Result<MoveCall, OrchestratorError> {
        if let Some(pending) = self.pending {
            return Err(OrchestratorError::Busy {
                pending: pending.label(),
            });
        }
        // Capturing over an unconsumed snapshot would fold two rolls into one event.
        if action.infers_event() && self.pre_action.is_some() {
            return Err(OrchestratorError::AwaitingRoll);
        }
        let call = action.to_move_call(config)?;

        self.pre_action = if action.infers_event() {
            self.run.map(|run| PreActionSnapshot {
                run_id: run.id,
                snapshot: run.snapshot,
                stale_reads: 0,
            })
        } else {
            None
        };
        if action.is_gacha() && self.items_before_pull.is_none() {
            self.items_before_pull = Some(self.items.iter().map(OwnedItem::id).collect());
        }

        tracing::info!("submitting {}: {}", action.label(), call.target());
        self.pending = Some(action);
        self.last_error = None;
        self.status = format!("{}...", action.label());
        Ok(call)
    }

    /// Submits `call`, waits for it and rereads chain state.
    pub async fn execute<E, S>(
        executor: &E,
        source: &S,
        owner: SuiAddress,
        action: Action,
        call: MoveCall,
    ) -> ActionReport
    where
        E: TransactionExecutor + Sync,
        S: StateSource + Sync,
    {
        let confirmation = match executor.submit(&call).await {
            Ok(confirmation) => confirmation,
            Err(error) => {
                tracing::warn!("{} rejected: {error}", action.label());
                return ActionReport::Failed { action, error };
            }
        };
        if let Err(e) = executor.wait_for_confirmation(&confirmation).await {
            tracing::warn!(
                "waiting for {} failed, refreshing anyway: {e}",
                confirmation.digest
            );
        }
        let refresh = StateRefresh::fetch(source, &owner).await;
        ActionReport::Confirmed {
            action,
            confirmation,
            refresh,
        }
    }

    pub fn complete(&mut self, report: ActionReport) {
        self.pending = None;
        match report {
            ActionReport::Failed { action, error } => {
                self.pre_action = None;
                self.items_before_pull = None;
                self.status = format!("{} failed", action.label());
                self.last_error =
                    Some(format!("{} failed: {}", action.label(), error.user_message()));
            }
            ActionReport::Confirmed {
                action,
                confirmation,
                refresh,
            } => {
                tracing::info!("{} confirmed in {}", action.label(), confirmation.digest);
                self.status = format!("{} confirmed", action.label());
                self.apply_refresh(refresh);
            }
        }
    }

    /// Ingests every query that succeeded. Failures keep the last known value.
    pub fn apply_refresh(&mut self, refresh: StateRefresh) {
        let StateRefresh { player, run, items } = refresh;
        match player {
            Ok(player) => self.ingest_player(player),
            Err(e) => self.refresh_failed("player", &e),
        }
        match items {
            Ok(items) => self.ingest_items(items),
            Err(e) => self.refresh_failed("inventory", &e),
        }
        match run {
            Ok(run) => self.ingest_run(run),
            Err(e) => self.refresh_failed("run", &e),
        }
    }

    fn refresh_failed(&mut self, what: &str, error: &ChainError) {
        tracing::warn!("failed to refresh {what}: {error}");
        self.last_error = Some(format!("Could not refresh {what}: {}", error.user_message()));
    }

    pub fn ingest_player(&mut self, player: Option<PlayerSnapshot>) {
        self.player = player;
    }

    pub fn ingest_items(&mut self, items: Vec<OwnedItem>) {
        if self.pending.is_none()
            && let Some(before) = &self.items_before_pull
        {
            let pulled: Vec<OwnedItem> = items
                .iter()
                .filter(|item| !before.contains(&item.id()))
                .cloned()
                .collect();
            // A read from before the pull landed; keep the baseline for the next one.
            if pulled.is_empty() {
                tracing::debug!("inventory read shows no pulled items yet");
            } else {
                tracing::info!("gacha pull yielded {} item(s)", pulled.len());
                self.items_before_pull = None;
                self.last_pulled = pulled;
            }
        }
        self.items = items;
    }

    pub fn ingest_run(&mut self, run: Option<RunObject>) {
        let Some(next) = run else {
            if let Some(ended) = self.run.take() {
                tracing::info!("run {} is gone", ended.id);
            }
            if self.pending.is_none() {
                self.pre_action = None;
            }
            return;
        };

        let is_new_run = match &self.run {
            None => true,
            Some(current) => current.id != next.id && next.snapshot.roll_count == 0,
        };
        if is_new_run {
            tracing::info!(
                "tracking run {} on a {} tile board",
                next.id,
                next.snapshot.board_tile_count
            );
            self.tile_log.reset(next.snapshot.board_tile_count);
        }

        if self.pending.is_none() {
            self.classify_against_snapshot(&next);
        }
        self.run = Some(next);
    }

    fn classify_against_snapshot(&mut self, next: &RunObject) {
        let Some(pre) = self.pre_action.as_mut() else {
            return;
        };
        if pre.run_id != next.id {
            tracing::debug!("dropping snapshot of run {}", pre.run_id);
            self.pre_action = None;
            return;
        }
        // A read from before the roll landed; wait for the next one.
        if next.snapshot.roll_count <= pre.snapshot.roll_count {
            pre.stale_reads += 1;
            if pre.stale_reads >= MAX_STALE_RUN_READS {
                tracing::warn!(
                    "roll on run {} never showed up after {} reads, giving up",
                    pre.run_id,
                    pre.stale_reads
                );
                self.pre_action = None;
            }
            return;
        }
        let before = pre.snapshot;
        self.pre_action = None;
        match classify(&before, &next.snapshot) {
            Some(event) => self.present(next.snapshot.position_on_board, event),
            None => tracing::debug!("roll changed nothing worth reporting"),
        }
    }

    fn present(&mut self, position: u64, event: InferredEvent) {
        tracing::info!("tile {position}: {event}");
        if let Err(e) = self.tile_log.record(position, event) {
            tracing::warn!("not logging event: {e}");
        }
        self.presentation = if event.is_combat() {
            Presentation::Battle(event)
        } else {
            Presentation::Feedback(event)
        };
        self.presentation_seq += 1;
    }

    /// Ends the fight animation and shows its result.
    pub fn finish_battle(&mut self) {
        if let Presentation::Battle(event) = self.presentation {
            self.presentation = Presentation::Feedback(event);
        }
    }

    pub fn dismiss_event(&mut self) {
        if matches!(self.presentation, Presentation::Feedback(_)) {
            self.presentation = Presentation::Idle;
        }
    }

    pub fn clear_pulled(&mut self) {
        self.last_pulled.clear();
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn player(&self) -> Option<&PlayerSnapshot> {
        self.player.as_ref()
    }

    pub fn run(&self) -> Option<&RunObject> {
        self.run.as_ref()
    }

    pub fn items(&self) -> &[OwnedItem] {
        &self.items
    }

    pub fn pending(&self) -> Option<Action> {
        self.pending
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn has_pre_action_snapshot(&self) -> bool {
        self.pre_action.is_some()
    }

    pub fn tile_log(&self) -> &TileEventLog {
        &self.tile_log
    }

    pub fn presentation(&self) -> Presentation {
        self.presentation
    }

    /// Counts presented events, so a repeat of the same event is still new.
    pub fn presentation_seq(&self) -> u64 {
        self.presentation_seq
    }

    pub fn last_pulled(&self) -> &[OwnedItem] {
        &self.last_pulled
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn status(&self) -> &str {
        &self.status
    }
}
