use crate::ui::{
    self,
    ActionRequest,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use std::{
    sync::Arc,
    time::Duration,
};
use suiventure::{
    Action,
    ActionOrchestrator,
    ActionReport,
    MoveCall,
    ObjectId,
    OrchestratorError,
    PlayerSnapshot,
    Presentation,
    RunObject,
    StateRefresh,
    SuiAddress,
    TileEventLog,
    config::ContractConfig,
    items::{
        Gear,
        OwnedItem,
        StatTotals,
        UpgradeGroup,
        equipped_totals,
        upgrade_groups,
    },
    progress::{
        can_use_potion,
        shop_available,
    },
};
use suiventure_tui::{
    deployment::{
        Network,
        format_deployment_summary,
    },
    rpc_client::SuiRpcClient,
    sui_cli::{
        SuiCli,
        SuiCliExecutor,
    },
};
use tokio::{
    sync::mpsc,
    time,
};

/// How long the fight stays on screen before its result.
pub const BATTLE_DURATION: Duration = Duration::from_millis(2500);
pub const FEEDBACK_DURATION: Duration = Duration::from_secs(4);
const MAX_ERRORS: usize = 5;

pub struct AppConfig {
    pub network: Network,
    pub rpc_url: String,
    pub contracts: ContractConfig,
    pub owner: SuiAddress,
    pub cli: SuiCli,
    pub gas_budget: u64,
    pub poll_interval: Duration,
}

/// Fees held by the gear and pet transfer policies, in MIST.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PolicyBalances {
    pub gear: Option<u64>,
    pub pet: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct AppSnapshot {
    pub deployment: String,
    pub owner: SuiAddress,
    pub loaded: bool,
    pub player: Option<PlayerSnapshot>,
    pub run: Option<RunObject>,
    pub items: Vec<OwnedItem>,
    pub gear_totals: StatTotals,
    pub upgrade_groups: Vec<UpgradeGroup>,
    pub tile_log: TileEventLog,
    pub presentation: Presentation,
    pub pending: Option<Action>,
    pub last_pulled: Vec<OwnedItem>,
    pub policy_balances: PolicyBalances,
    pub status: String,
    pub errors: Vec<String>,
}

pub struct AppController {
    orchestrator: ActionOrchestrator,
    contracts: ContractConfig,
    rpc: Arc<SuiRpcClient>,
    executor: Arc<SuiCliExecutor>,
    owner: SuiAddress,
    deployment: String,
    poll_interval: Duration,
    policy_balances: PolicyBalances,
    loaded: bool,
    errors: Vec<String>,
    presentation_timer: PresentationTimer,
}

impl AppController {
    pub fn new(config: AppConfig) -> Result<Self> {
        let rpc = SuiRpcClient::new(config.rpc_url.clone(), &config.contracts)
            .wrap_err("Cannot query SuiVenture objects")?;
        let rpc = Arc::new(rpc);
        let executor = Arc::new(SuiCliExecutor::new(
            config.cli,
            config.gas_budget,
            Arc::clone(&rpc),
        ));
        let deployment =
            format_deployment_summary(config.network, &config.rpc_url, &config.contracts);
        let mut orchestrator = ActionOrchestrator::new();
        orchestrator.set_status(format!("Connected to {deployment}"));
        Ok(Self {
            orchestrator,
            contracts: config.contracts,
            rpc,
            executor,
            owner: config.owner,
            deployment,
            poll_interval: config.poll_interval,
            policy_balances: PolicyBalances::default(),
            loaded: false,
            errors: Vec::new(),
            presentation_timer: PresentationTimer::default(),
        })
    }

    fn build_snapshot(&self) -> AppSnapshot {
        let o = &self.orchestrator;
        let gear = owned_gear(o.items());
        let equipped = o.player().map(|p| p.equipped).unwrap_or_default();
        let mut errors = self.errors.clone();
        if let Some(err) = o.last_error() {
            errors.push(err.to_string());
        }
        AppSnapshot {
            deployment: self.deployment.clone(),
            owner: self.owner,
            loaded: self.loaded,
            player: o.player().cloned(),
            run: o.run().copied(),
            items: o.items().to_vec(),
            gear_totals: equipped_totals(&equipped, &gear),
            upgrade_groups: upgrade_groups(&gear, &equipped),
            tile_log: o.tile_log().clone(),
            presentation: o.presentation(),
            pending: o.pending(),
            last_pulled: o.last_pulled().to_vec(),
            policy_balances: self.policy_balances,
            status: o.status().to_string(),
            errors,
        }
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.orchestrator.set_status(status);
    }

    fn push_error(&mut self, error: String) {
        self.errors.push(error);
        if self.errors.len() > MAX_ERRORS {
            let excess = self.errors.len() - MAX_ERRORS;
            self.errors.drain(..excess);
        }
    }

    /// Resolves `request` against the current state and marks it pending.
    /// Returns the call to submit, or `None` when the request was turned
    /// down with a status hint.
    fn request(&mut self, request: ActionRequest) -> Option<(Action, MoveCall)> {
        if let Some(pending) = self.orchestrator.pending() {
            self.set_status(format!("Waiting for {} to finish", pending.label()));
            return None;
        }
        let action = match plan_action(&self.orchestrator, request) {
            Ok(action) => action,
            Err(hint) => {
                self.set_status(hint);
                return None;
            }
        };
        match self.orchestrator.begin(action, &self.contracts) {
            Ok(call) => {
                self.errors.clear();
                Some((action, call))
            }
            Err(OrchestratorError::AwaitingRoll) => {
                self.set_status("Waiting for the last roll to show up");
                None
            }
            Err(e) => {
                tracing::warn!("cannot start {}: {e}", action.label());
                self.push_error(format!("{} unavailable: {e}", action.label()));
                None
            }
        }
    }

    fn spawn_action(
        &self,
        action: Action,
        call: MoveCall,
        report_tx: mpsc::UnboundedSender<ActionReport>,
    ) {
        let executor = Arc::clone(&self.executor);
        let rpc = Arc::clone(&self.rpc);
        let owner = self.owner;
        tokio::spawn(async move {
            let report = ActionOrchestrator::execute(
                executor.as_ref(),
                rpc.as_ref(),
                owner,
                action,
                call,
            )
            .await;
            if report_tx.send(report).is_err() {
                tracing::warn!("{} finished after the UI loop exited", action.label());
            }
        });
    }

    fn complete(&mut self, report: ActionReport) {
        self.orchestrator.complete(report);
        self.sync_presentation();
    }

    fn ingest_bundle(&mut self, bundle: SnapshotBundle) {
        let SnapshotBundle {
            refresh,
            policy_balances,
        } = bundle;
        self.orchestrator.apply_refresh(refresh);
        if policy_balances.gear.is_some() {
            self.policy_balances.gear = policy_balances.gear;
        }
        if policy_balances.pet.is_some() {
            self.policy_balances.pet = policy_balances.pet;
        }
        self.loaded = true;
        self.sync_presentation();
    }

    fn sync_presentation(&mut self) {
        self.presentation_timer.sync(
            self.orchestrator.presentation(),
            self.orchestrator.presentation_seq(),
        );
    }

    /// Battle -> feedback -> idle, either on timeout or when the player
    /// skips ahead.
    fn advance_presentation(&mut self) {
        match self.orchestrator.presentation() {
            Presentation::Battle(_) => self.orchestrator.finish_battle(),
            Presentation::Feedback(_) => self.orchestrator.dismiss_event(),
            Presentation::Idle => {}
        }
        self.sync_presentation();
    }
}

/// Deadline of whatever the event area shows.
#[derive(Debug, Default)]
struct PresentationTimer {
    shown: Presentation,
    shown_seq: u64,
    deadline: Option<time::Instant>,
}

impl PresentationTimer {
    /// Restarts the deadline when the presentation moved on or a new event
    /// was presented, even one equal to the last.
    fn sync(&mut self, current: Presentation, seq: u64) {
        if current == self.shown && seq == self.shown_seq {
            return;
        }
        self.shown = current;
        self.shown_seq = seq;
        let now = time::Instant::now();
        self.deadline = match current {
            Presentation::Idle => None,
            Presentation::Battle(_) => Some(now + BATTLE_DURATION),
            Presentation::Feedback(_) => Some(now + FEEDBACK_DURATION),
        };
    }

    fn deadline(&self) -> Option<time::Instant> {
        self.deadline
    }
}

fn owned_gear(items: &[OwnedItem]) -> Vec<Gear> {
    items
        .iter()
        .filter_map(|item| match item {
            OwnedItem::Gear(gear) => Some(gear.clone()),
            OwnedItem::Pet(_) => None,
        })
        .collect()
}

/// Turns a request from the screen into an action, or a hint explaining
/// why it cannot be taken right now.
fn plan_action(
    orchestrator: &ActionOrchestrator,
    request: ActionRequest,
) -> Result<Action, String> {
    const NO_RUN: &str = "No active run. Press n to start one";
    let player = orchestrator.player();
    let run = orchestrator.run();
    let action = match request {
        ActionRequest::CreatePlayer => {
            if player.is_some() {
                return Err("This account already has a player".to_string());
            }
            Action::CreatePlayer
        }
        ActionRequest::StartRun => {
            let player = player.ok_or("Create a player first (c)")?;
            if run.is_some() {
                return Err("A run is already in progress".to_string());
            }
            Action::StartRun { player: player.id }
        }
        ActionRequest::Roll => Action::Roll {
            run: run.ok_or(NO_RUN)?.id,
        },
        ActionRequest::UsePotion => {
            let run = run.ok_or(NO_RUN)?;
            if !can_use_potion(&run.snapshot) {
                return Err("No potion to drink or HP already full".to_string());
            }
            Action::UsePotion { run: run.id }
        }
        ActionRequest::ShopBuy(upgrade) => {
            let run = run.ok_or(NO_RUN)?;
            if !shop_available(run.snapshot.floor) {
                return Err("The shop only opens on every third floor".to_string());
            }
            Action::ShopBuy {
                run: run.id,
                upgrade,
            }
        }
        ActionRequest::PullGear(count) => Action::PullGear { count },
        ActionRequest::PullPet(count) => Action::PullPet { count },
        ActionRequest::UpgradeGear(index) => {
            let gear = owned_gear(orchestrator.items());
            let equipped = player.map(|p| p.equipped).unwrap_or_default();
            let group = upgrade_groups(&gear, &equipped)
                .into_iter()
                .nth(index)
                .ok_or("That upgrade is no longer available")?;
            Action::UpgradeGear { items: group.items }
        }
    };
    Ok(action)
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let controller = AppController::new(config)?;
    let mut ui_state = ui::UiState::default();
    let mut input_events = ui::input_event_stream();

    tracing::info!("Starting UI");
    ui::terminal_enter(&mut ui_state)?;
    tracing::info!("UI ready");
    let res = run_loop(controller, &mut ui_state, &mut input_events).await;
    ui::terminal_exit()?;
    res
}

#[derive(Debug)]
struct SnapshotBundle {
    refresh: StateRefresh,
    policy_balances: PolicyBalances,
}

enum SnapshotWorkerCommand {
    FetchNow,
    Shutdown,
}

async fn snapshot_worker(
    poll_interval: Duration,
    rpc: Arc<SuiRpcClient>,
    owner: SuiAddress,
    policies: (Option<ObjectId>, Option<ObjectId>),
    mut cmd_rx: mpsc::UnboundedReceiver<SnapshotWorkerCommand>,
    snapshot_tx: mpsc::UnboundedSender<SnapshotBundle>,
) -> Result<()> {
    async fn policy_balance(rpc: &SuiRpcClient, policy: Option<ObjectId>) -> Option<u64> {
        let policy = policy?;
        match rpc.transfer_policy_balance(&policy).await {
            Ok(balance) => Some(balance),
            Err(err) => {
                tracing::warn!("transfer policy {} unavailable: {err}", policy.short());
                None
            }
        }
    }

    async fn fetch_snapshot(
        rpc: &SuiRpcClient,
        owner: &SuiAddress,
        policies: (Option<ObjectId>, Option<ObjectId>),
        snapshot_tx: &mpsc::UnboundedSender<SnapshotBundle>,
    ) -> Result<()> {
        let (refresh, gear, pet) = tokio::join!(
            StateRefresh::fetch(rpc, owner),
            policy_balance(rpc, policies.0),
            policy_balance(rpc, policies.1),
        );
        snapshot_tx
            .send(SnapshotBundle {
                refresh,
                policy_balances: PolicyBalances { gear, pet },
            })
            .map_err(|_| eyre!("snapshot receiver dropped"))
    }

    let mut ticker = time::interval(poll_interval);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                fetch_snapshot(&rpc, &owner, policies, &snapshot_tx).await?;
            }
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else {
                    break;
                };
                match cmd {
                    SnapshotWorkerCommand::FetchNow => {
                        fetch_snapshot(&rpc, &owner, policies, &snapshot_tx).await?;
                    }
                    SnapshotWorkerCommand::Shutdown => break,
                }
            }
        }
    }
    Ok(())
}

async fn presentation_timer(deadline: Option<time::Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn run_loop(
    mut controller: AppController,
    ui_state: &mut ui::UiState,
    input_events: &mut ui::InputEventReceiver,
) -> Result<()> {
    tracing::info!("Running app loop for {}", controller.owner);
    let policies = (
        controller.contracts.transfer_policy_gear_id,
        controller.contracts.transfer_policy_pet_id,
    );
    let (snapshot_cmd_tx, snapshot_cmd_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, mut snapshot_rx) = mpsc::unbounded_channel();
    let snapshot_handle = tokio::spawn(snapshot_worker(
        controller.poll_interval,
        Arc::clone(&controller.rpc),
        controller.owner,
        policies,
        snapshot_cmd_rx,
        snapshot_tx,
    ));
    let (report_tx, mut report_rx) = mpsc::unbounded_channel();
    let mut snapshot_worker_closed = false;

    ui::draw(ui_state, &controller.build_snapshot()).wrap_err("initial draw failed")?;

    loop {
        let deadline = controller.presentation_timer.deadline();
        tokio::select! {
            maybe_bundle = snapshot_rx.recv() => {
                let Some(bundle) = maybe_bundle else {
                    tracing::warn!("snapshot worker channel closed");
                    snapshot_worker_closed = true;
                    break;
                };
                controller.ingest_bundle(bundle);
                ui::draw(ui_state, &controller.build_snapshot())
                    .wrap_err("draw after snapshot refresh failed")?;
            }
            Some(report) = report_rx.recv() => {
                controller.complete(report);
                let _ = snapshot_cmd_tx.send(SnapshotWorkerCommand::FetchNow);
                ui::draw(ui_state, &controller.build_snapshot())
                    .wrap_err("draw after action report failed")?;
            }
            _ = presentation_timer(deadline) => {
                controller.advance_presentation();
                ui::draw(ui_state, &controller.build_snapshot())
                    .wrap_err("draw after presentation timeout failed")?;
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
            raw_ev = ui::next_raw_event(input_events) => {
                let event = raw_ev?;
                let Some(ev) = ui::interpret_event(ui_state, event) else {
                    continue;
                };
                match ev {
                    ui::UserEvent::Quit => break,
                    ui::UserEvent::Redraw => {}
                    ui::UserEvent::Refresh => {
                        controller.set_status("Refreshing...");
                        let _ = snapshot_cmd_tx.send(SnapshotWorkerCommand::FetchNow);
                    }
                    ui::UserEvent::Dismiss => controller.advance_presentation(),
                    ui::UserEvent::ClearPulled => controller.orchestrator.clear_pulled(),
                    ui::UserEvent::Hint(hint) => controller.set_status(hint),
                    ui::UserEvent::Act(request) => {
                        if let Some((action, call)) = controller.request(request) {
                            controller.spawn_action(action, call, report_tx.clone());
                        }
                    }
                }
                ui::draw(ui_state, &controller.build_snapshot())
                    .wrap_err("draw after input failed")?;
            }
        }
    }

    let _ = snapshot_cmd_tx.send(SnapshotWorkerCommand::Shutdown);
    match snapshot_handle.await {
        Ok(Ok(())) => {
            if snapshot_worker_closed {
                return Err(eyre!(
                    "Snapshot worker exited unexpectedly; check the RPC connection"
                ));
            }
        }
        Ok(Err(err)) => {
            return Err(err).wrap_err("snapshot worker failed");
        }
        Err(err) => {
            return Err(eyre!(err)).wrap_err("snapshot worker panicked");
        }
    }
    Ok(())
}
