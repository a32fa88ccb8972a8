use crate::client::AppSnapshot;
use color_eyre::eyre::{
    Result,
    eyre,
};
use crossterm::{
    event::{
        Event,
        EventStream,
        KeyCode,
        KeyEventKind,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use futures::StreamExt;
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::{
    io::stdout,
    ops::Range,
};
use suiventure::{
    InferredEvent,
    Presentation,
    actions::{
        PullCount,
        ShopUpgrade,
    },
    config::format_sui,
    items::{
        GearSlot,
        OwnedItem,
        Rarity,
    },
    progress::{
        MAX_FLOOR,
        boss_next,
        floor_progress,
        loot_preview,
        shop_available,
    },
};

pub type InputEventReceiver = EventStream;

/// A player action picked on screen; the controller resolves object ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionRequest {
    CreatePlayer,
    StartRun,
    Roll,
    UsePotion,
    ShopBuy(ShopUpgrade),
    PullGear(PullCount),
    PullPet(PullCount),
    /// Index into the upgrade groups shown in the upgrade modal.
    UpgradeGear(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserEvent {
    Quit,
    Redraw,
    Refresh,
    Dismiss,
    ClearPulled,
    Hint(&'static str),
    Act(ActionRequest),
}

#[derive(Debug, Default)]
pub struct UiState {
    mode: Mode,
    view: View,
    shop_open: bool,
    upgrade_options: usize,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
enum Mode {
    #[default]
    Normal,
    ShopModal(ListState),
    GachaModal(ListState),
    UpgradeModal(ListState),
    QuitModal,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum View {
    #[default]
    Run,
    Inventory,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct ListState {
    idx: usize,
}

impl ListState {
    fn up(&mut self) {
        self.idx = self.idx.saturating_sub(1);
    }

    fn down(&mut self, len: usize) {
        if self.idx + 1 < len {
            self.idx += 1;
        }
    }
}

const GACHA_OPTIONS: [(&str, ActionRequest); 4] = [
    ("Gear x1", ActionRequest::PullGear(PullCount::One)),
    ("Gear x10", ActionRequest::PullGear(PullCount::Ten)),
    ("Pet x1", ActionRequest::PullPet(PullCount::One)),
    ("Pet x10", ActionRequest::PullPet(PullCount::Ten)),
];

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
    // Create a single persistent Terminal to preserve buffers across draws
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    Ok(())
}

pub fn input_event_stream() -> InputEventReceiver {
    EventStream::new()
}

pub async fn next_raw_event(input: &mut InputEventReceiver) -> Result<Event> {
    match input.next().await {
        Some(event) => Ok(event?),
        None => Err(eyre!("terminal input stream closed")),
    }
}

pub fn draw(state: &mut UiState, snap: &AppSnapshot) -> Result<()> {
    // keep what the modals need to validate key presses
    state.shop_open = snap
        .run
        .is_some_and(|run| shop_available(run.snapshot.floor));
    state.upgrade_options = snap.upgrade_groups.len();
    if let Mode::ShopModal(_) = state.mode
        && !state.shop_open
    {
        state.mode = Mode::Normal;
    }
    if let Mode::UpgradeModal(ref mut list) = state.mode {
        list.idx = list.idx.min(state.upgrade_options.saturating_sub(1));
    }
    if let Some(mut term) = state.terminal.take() {
        term.draw(|f| ui(f, state, snap))?;
        state.terminal = Some(term);
    }
    Ok(())
}

pub fn interpret_event(state: &mut UiState, event: Event) -> Option<UserEvent> {
    let k = match event {
        Event::Key(k) if k.kind == KeyEventKind::Press => k,
        Event::Resize(..) => return Some(UserEvent::Redraw),
        _ => return None,
    };
    match &mut state.mode {
        Mode::ShopModal(list) => match k.code {
            KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::Redraw)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                list.up();
                Some(UserEvent::Redraw)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                list.down(ShopUpgrade::ALL.len());
                Some(UserEvent::Redraw)
            }
            KeyCode::Enter => {
                let upgrade = ShopUpgrade::ALL[list.idx];
                state.mode = Mode::Normal;
                Some(UserEvent::Act(ActionRequest::ShopBuy(upgrade)))
            }
            _ => None,
        },
        Mode::GachaModal(list) => match k.code {
            KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::Redraw)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                list.up();
                Some(UserEvent::Redraw)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                list.down(GACHA_OPTIONS.len());
                Some(UserEvent::Redraw)
            }
            KeyCode::Enter => {
                let (_, request) = GACHA_OPTIONS[list.idx];
                state.mode = Mode::Normal;
                Some(UserEvent::Act(request))
            }
            _ => None,
        },
        Mode::UpgradeModal(list) => match k.code {
            KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::Redraw)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                list.up();
                Some(UserEvent::Redraw)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                list.down(state.upgrade_options);
                Some(UserEvent::Redraw)
            }
            KeyCode::Enter if state.upgrade_options > 0 => {
                let idx = list.idx;
                state.mode = Mode::Normal;
                Some(UserEvent::Act(ActionRequest::UpgradeGear(idx)))
            }
            _ => None,
        },
        Mode::QuitModal => match k.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(UserEvent::Quit),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::Redraw)
            }
            _ => None,
        },
        Mode::Normal => match k.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                state.mode = Mode::QuitModal;
                Some(UserEvent::Redraw)
            }
            KeyCode::Char('c') => Some(UserEvent::Act(ActionRequest::CreatePlayer)),
            KeyCode::Char('n') => Some(UserEvent::Act(ActionRequest::StartRun)),
            KeyCode::Char('r') => Some(UserEvent::Act(ActionRequest::Roll)),
            KeyCode::Char('p') => Some(UserEvent::Act(ActionRequest::UsePotion)),
            KeyCode::Char('s') => {
                if !state.shop_open {
                    return Some(UserEvent::Hint("The shop only opens on every third floor"));
                }
                state.mode = Mode::ShopModal(ListState::default());
                Some(UserEvent::Redraw)
            }
            KeyCode::Char('g') => {
                state.mode = Mode::GachaModal(ListState::default());
                Some(UserEvent::Redraw)
            }
            KeyCode::Char('u') => {
                if state.upgrade_options == 0 {
                    return Some(UserEvent::Hint(
                        "Fusing needs three unequipped gear of the same slot, set and rarity",
                    ));
                }
                state.mode = Mode::UpgradeModal(ListState::default());
                Some(UserEvent::Redraw)
            }
            KeyCode::Char('i') | KeyCode::Tab => {
                state.view = match state.view {
                    View::Run => View::Inventory,
                    View::Inventory => View::Run,
                };
                Some(UserEvent::Redraw)
            }
            KeyCode::Char('f') => Some(UserEvent::Refresh),
            KeyCode::Char('x') => Some(UserEvent::ClearPulled),
            KeyCode::Enter | KeyCode::Char(' ') => Some(UserEvent::Dismiss),
            _ => None,
        },
    }
}

fn ui(f: &mut Frame, state: &UiState, snap: &AppSnapshot) {
    f.render_widget(Clear, f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // player + run
            Constraint::Length(3), // floor progress
            Constraint::Length(3), // board
            Constraint::Min(8),    // event or inventory
            Constraint::Length(7), // status/errors + help
        ])
        .split(f.area());

    draw_top(f, chunks[0], snap);
    draw_progress(f, chunks[1], snap);
    draw_board(f, chunks[2], snap);
    match state.view {
        View::Run => draw_event_panel(f, chunks[3], snap),
        View::Inventory => draw_inventory(f, chunks[3], snap),
    }
    draw_bottom(f, chunks[4], snap);
    draw_modals(f, state, snap);
}

fn draw_top(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);
    draw_player_panel(f, cols[0], snap);
    draw_run_panel(f, cols[1], snap);
}

fn draw_player_panel(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let mut lines = vec![Line::from(format!("Address: {}", snap.owner.short()))];
    match (&snap.player, snap.loaded) {
        (_, false) => lines.push(Line::from("Loading...")),
        (None, true) => lines.push(Line::from("No player yet. Press c to create one.")),
        (Some(player), true) => {
            let gear = snap.gear_totals;
            lines.push(Line::from(format!("Gems: {}", player.gems)));
            lines.push(Line::from(format!(
                "ATK {} (+{})  HP {} (+{})",
                player.base_atk, gear.atk, player.base_hp, gear.hp
            )));
            lines.push(Line::from(format!(
                "ACC {} (+{})  DEF {} (+{})",
                player.base_acc, gear.acc, player.base_def, gear.def
            )));
        }
    }
    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Player"));
    f.render_widget(widget, area);
}

fn draw_run_panel(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let lines = match &snap.run {
        None if !snap.loaded => vec![Line::from("Loading...")],
        None => vec![Line::from("No active run. Press n to start one.")],
        Some(run) => {
            let s = &run.snapshot;
            let hp_style = if s.current_hp * 4 <= s.max_hp {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::Green)
            };
            let mut hints = vec![loot_preview(s.floor)];
            if boss_next(s.roll_count) {
                hints.push("Boss on next roll!".to_string());
            }
            if shop_available(s.floor) {
                hints.push("Shop open (s)".to_string());
            }
            vec![
                Line::from(vec![
                    Span::raw(format!("Floor {} | ", s.floor)),
                    Span::styled(format!("HP {}/{}", s.current_hp, s.max_hp), hp_style),
                    Span::raw(format!(" | Gems {} | Rolls {}", s.gems, s.roll_count)),
                ]),
                Line::from(format!(
                    "Potions {}/{} (heal +{})",
                    s.potion_count, s.potion_max_carry, s.potion_heal_amount
                )),
                Line::from(format!(
                    "Temp ATK +{} DEF +{} ACC +{}",
                    s.temp_atk, s.temp_def, s.temp_acc
                )),
                Line::from(hints.join(" | ")),
            ]
        }
    };
    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Run"));
    f.render_widget(widget, area);
}

fn draw_progress(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let floor = snap.run.map(|run| run.snapshot.floor).unwrap_or(0);
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(floor_progress(floor))
        .label(format!("Floor {floor} / {MAX_FLOOR}"));
    f.render_widget(gauge, area);
}

fn draw_board(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let line = match &snap.run {
        None => Line::from("-"),
        Some(run) => {
            let position = run.snapshot.position_on_board;
            let tiles = snap.tile_log.tile_count().max(run.snapshot.board_tile_count);
            let capacity = u64::from(area.width.saturating_sub(2) / 3);
            let spans: Vec<Span> = visible_tiles(tiles, position, capacity)
                .map(|tile| {
                    if tile == position {
                        Span::styled(
                            "[@]",
                            Style::default()
                                .fg(Color::Yellow)
                                .add_modifier(Modifier::BOLD),
                        )
                    } else {
                        match snap.tile_log.get(tile) {
                            Some(event) => Span::styled(
                                format!("[{}]", event_icon(event)),
                                event_style(event),
                            ),
                            None => Span::raw("[ ]"),
                        }
                    }
                })
                .collect();
            Line::from(spans)
        }
    };
    let widget = Paragraph::new(line)
        .block(Block::default().borders(Borders::ALL).title("Board"));
    f.render_widget(widget, area);
}

/// The tiles that fit in `capacity` cells, centered on `position` when the
/// board is wider than that.
fn visible_tiles(tiles: u64, position: u64, capacity: u64) -> Range<u64> {
    if tiles <= capacity {
        return 0..tiles;
    }
    let start = if position < tiles {
        position
            .saturating_sub(capacity / 2)
            .min(tiles - capacity)
    } else {
        0
    };
    start..start + capacity
}

fn draw_event_panel(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let mut lines: Vec<Line> = Vec::new();
    match snap.presentation {
        Presentation::Battle(event) => {
            let title = match event {
                InferredEvent::Combat { is_boss: true, .. } => "A boss blocks the way!",
                _ => "Battle!",
            };
            lines.push(Line::styled(
                title,
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ));
            lines.push(Line::from("Steel clashes... (Enter to skip)"));
        }
        Presentation::Feedback(event) => {
            lines.push(Line::styled(
                format!("{} {event}", event_icon(&event)),
                event_style(&event).add_modifier(Modifier::BOLD),
            ));
            lines.push(Line::from("(Enter to dismiss)"));
        }
        Presentation::Idle => match snap.pending {
            Some(action) => lines.push(Line::from(format!("{}...", action.label()))),
            None if snap.run.is_some() => lines.push(Line::from("Press r to roll the dice.")),
            None => {}
        },
    }
    if !snap.last_pulled.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from("New from the gacha (x to clear):"));
        lines.extend(snap.last_pulled.iter().map(item_line));
    }
    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Events"));
    f.render_widget(widget, area);
}

fn draw_inventory(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let equipped = snap.player.as_ref().map(|p| p.equipped).unwrap_or_default();
    let mut items: Vec<&OwnedItem> = snap.items.iter().collect();
    items.sort_by_key(|item| match item {
        OwnedItem::Gear(gear) => (0, gear.slot.index(), std::cmp::Reverse(gear.rarity)),
        OwnedItem::Pet(pet) => (1, usize::from(pet.pet_id), std::cmp::Reverse(pet.rarity)),
    });
    let mut lines: Vec<Line> = Vec::new();
    if items.is_empty() {
        lines.push(Line::from("No gear or pets yet. Press g for the gacha."));
    }
    for item in items {
        let mut line = item_line(item);
        if equipped.contains(&item.id()) {
            line.spans.push(Span::styled(" [E]", Style::default().fg(Color::Green)));
        }
        lines.push(line);
    }
    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Inventory"));
    f.render_widget(widget, cols[0]);

    let mut side: Vec<Line> = Vec::new();
    side.push(Line::from("Equipped:"));
    for slot in GearSlot::ALL {
        let text = match equipped.get(slot) {
            Some(id) => id.short(),
            None => "-".to_string(),
        };
        side.push(Line::from(format!("  {}: {text}", slot.name())));
    }
    side.push(Line::from(format!(
        "Upgrades ready: {} (u)",
        snap.upgrade_groups.len()
    )));
    side.push(Line::from(""));
    side.push(Line::from("Marketplace fees:"));
    side.push(Line::from(format!(
        "  gear {}",
        format_balance(snap.policy_balances.gear)
    )));
    side.push(Line::from(format!(
        "  pet {}",
        format_balance(snap.policy_balances.pet)
    )));
    let widget = Paragraph::new(side)
        .block(Block::default().borders(Borders::ALL).title("Loadout"));
    f.render_widget(widget, cols[1]);
}

fn draw_bottom(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Length(3)])
        .split(area);

    let status_widget = if snap.errors.is_empty() {
        let status = if snap.status.trim().is_empty() {
            "Ready".to_string()
        } else {
            snap.status.clone()
        };
        Paragraph::new(status)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Status"))
            .style(Style::default().fg(Color::Green))
    } else {
        let lines: Vec<Line> = snap.errors.iter().map(|e| Line::from(e.clone())).collect();
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Errors"))
            .style(Style::default().fg(Color::Red))
    };
    f.render_widget(status_widget, chunks[0]);

    let help = Paragraph::new(
        "c create player | n new run | r roll | p potion | s shop | g gacha | u upgrade | i inventory | f refresh | q/Esc quit",
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Help | {}", snap.deployment)),
    );
    f.render_widget(help, chunks[1]);
}

fn draw_modals(f: &mut Frame, state: &UiState, snap: &AppSnapshot) {
    match &state.mode {
        Mode::ShopModal(list) => {
            let area = centered_rect(50, 40, f.area());
            let block = Block::default().borders(Borders::ALL).title("Shop");
            let mut lines: Vec<Line> = ShopUpgrade::ALL
                .iter()
                .enumerate()
                .map(|(i, upgrade)| {
                    let cur = if i == list.idx { ">" } else { " " };
                    Line::from(format!("{cur} {}", upgrade.label()))
                })
                .collect();
            if let Some(run) = &snap.run {
                lines.push(Line::from(""));
                lines.push(Line::from(format!("Gems: {}", run.snapshot.gems)));
            }
            lines.push(Line::from("Enter=buy Esc=close"));
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(Paragraph::new(lines), block.inner(area));
        }
        Mode::GachaModal(list) => {
            let area = centered_rect(50, 40, f.area());
            let block = Block::default().borders(Borders::ALL).title("Gacha");
            let mut lines: Vec<Line> = GACHA_OPTIONS
                .iter()
                .enumerate()
                .map(|(i, (label, request))| {
                    let cur = if i == list.idx { ">" } else { " " };
                    let price = match request {
                        ActionRequest::PullGear(count) | ActionRequest::PullPet(count) => {
                            count.price_mist()
                        }
                        _ => 0,
                    };
                    Line::from(format!("{cur} {label}  {} SUI", format_sui(price)))
                })
                .collect();
            lines.push(Line::from(""));
            lines.push(Line::from("Enter=pull Esc=close"));
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(Paragraph::new(lines), block.inner(area));
        }
        Mode::UpgradeModal(list) => {
            let area = centered_rect(60, 50, f.area());
            let block = Block::default().borders(Borders::ALL).title("Fuse Gear");
            let mut lines: Vec<Line> = snap
                .upgrade_groups
                .iter()
                .enumerate()
                .map(|(i, group)| {
                    let cur = if i == list.idx { ">" } else { " " };
                    Line::from(vec![
                        Span::raw(format!("{cur} 3x ")),
                        Span::styled(group.rarity.name(), rarity_style(group.rarity)),
                        Span::raw(format!(" {} (set {}) -> ", group.slot.name(), group.set_id)),
                        Span::styled(
                            group.result_rarity().name(),
                            rarity_style(group.result_rarity()),
                        ),
                    ])
                })
                .collect();
            lines.push(Line::from(""));
            lines.push(Line::from("Enter=fuse Esc=close"));
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(Paragraph::new(lines), block.inner(area));
        }
        Mode::QuitModal => {
            let area = centered_rect(40, 20, f.area());
            let block = Block::default().borders(Borders::ALL).title("Confirm Quit");
            let p = Paragraph::new("Quit the game? (Y/N)");
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        }
        Mode::Normal => {}
    }
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h_percent) / 2),
            Constraint::Percentage(h_percent),
            Constraint::Percentage((100 - h_percent) / 2),
        ])
        .split(r);

    let vertical = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w_percent) / 2),
            Constraint::Percentage(w_percent),
            Constraint::Percentage((100 - w_percent) / 2),
        ])
        .split(popup_layout[1]);

    vertical[1]
}

fn item_line(item: &OwnedItem) -> Line<'static> {
    let rarity = item.rarity();
    let detail = match item {
        OwnedItem::Gear(gear) => format!(
            "{} (set {}) ATK {} HP {} ACC {} DEF {}",
            gear.slot.name(),
            gear.set_id,
            gear.atk,
            gear.hp,
            gear.acc,
            gear.def
        ),
        OwnedItem::Pet(pet) => match pet.kind() {
            Some(kind) => format!("{} ({} +{})", kind.name, kind.bonus, pet.bonus_value),
            None => pet.name(),
        },
    };
    Line::from(vec![
        Span::styled(format!("{:<7}", rarity.name()), rarity_style(rarity)),
        Span::raw(format!(" {detail}")),
    ])
}

fn format_balance(balance: Option<u64>) -> String {
    match balance {
        Some(mist) => format!("{} SUI", format_sui(mist)),
        None => "n/a".to_string(),
    }
}

fn event_icon(event: &InferredEvent) -> &'static str {
    match event {
        InferredEvent::Combat { is_boss: true, .. } => "👑",
        InferredEvent::Combat { .. } => "⚔",
        InferredEvent::Heal { .. } => "✚",
        InferredEvent::BadEvent { .. } => "☠",
        InferredEvent::LuckyGacha { .. } => "🧪",
    }
}

fn event_style(event: &InferredEvent) -> Style {
    match event {
        InferredEvent::Combat { .. } => Style::default().fg(Color::Red),
        InferredEvent::Heal { .. } => Style::default().fg(Color::Green),
        InferredEvent::BadEvent { .. } => Style::default().fg(Color::Magenta),
        InferredEvent::LuckyGacha { .. } => Style::default().fg(Color::Yellow),
    }
}

fn rarity_style(rarity: Rarity) -> Style {
    match rarity {
        Rarity::Normal => Style::default().fg(Color::Gray),
        Rarity::Rare => Style::default().fg(Color::Blue),
        Rarity::Epic => Style::default().fg(Color::Magenta),
        Rarity::Legend => Style::default().fg(Color::Yellow),
        Rarity::Mystic => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crossterm::event::{
        KeyEvent,
        KeyModifiers,
    };

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn interpret_event__quit_needs_confirmation() {
        // given
        let mut state = UiState::default();

        // when
        let first = interpret_event(&mut state, press(KeyCode::Char('q')));
        let second = interpret_event(&mut state, press(KeyCode::Char('y')));

        // then
        assert_eq!(first, Some(UserEvent::Redraw));
        assert_eq!(second, Some(UserEvent::Quit));
    }

    #[test]
    fn interpret_event__shop_stays_closed_off_shop_floors() {
        let mut state = UiState::default();
        let event = interpret_event(&mut state, press(KeyCode::Char('s')));
        assert!(matches!(event, Some(UserEvent::Hint(_))));
        assert_eq!(state.mode, Mode::Normal);
    }

    #[test]
    fn interpret_event__shop_selection_buys_highlighted_upgrade() {
        // given
        let mut state = UiState {
            shop_open: true,
            ..UiState::default()
        };
        interpret_event(&mut state, press(KeyCode::Char('s')));

        // when
        interpret_event(&mut state, press(KeyCode::Down));
        interpret_event(&mut state, press(KeyCode::Down));
        let event = interpret_event(&mut state, press(KeyCode::Enter));

        // then
        assert_eq!(
            event,
            Some(UserEvent::Act(ActionRequest::ShopBuy(ShopUpgrade::TempAtk)))
        );
        assert_eq!(state.mode, Mode::Normal);
    }

    #[test]
    fn interpret_event__gacha_modal_offers_ten_pulls() {
        let mut state = UiState::default();
        interpret_event(&mut state, press(KeyCode::Char('g')));
        interpret_event(&mut state, press(KeyCode::Char('j')));
        let event = interpret_event(&mut state, press(KeyCode::Enter));
        assert_eq!(
            event,
            Some(UserEvent::Act(ActionRequest::PullGear(PullCount::Ten)))
        );
    }

    #[test]
    fn interpret_event__upgrade_selection_is_bounded_by_groups() {
        // given
        let mut state = UiState {
            upgrade_options: 2,
            ..UiState::default()
        };
        interpret_event(&mut state, press(KeyCode::Char('u')));

        // when
        for _ in 0..5 {
            interpret_event(&mut state, press(KeyCode::Down));
        }
        let event = interpret_event(&mut state, press(KeyCode::Enter));

        // then
        assert_eq!(event, Some(UserEvent::Act(ActionRequest::UpgradeGear(1))));
    }

    #[test]
    fn interpret_event__ignores_key_releases() {
        let mut state = UiState::default();
        let mut release = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(interpret_event(&mut state, Event::Key(release)), None);
    }

    #[test]
    fn visible_tiles__short_board_is_shown_whole() {
        assert_eq!(visible_tiles(12, 3, 30), 0..12);
    }

    #[test]
    fn visible_tiles__huge_board_is_clamped_around_the_player() {
        // given
        let tiles = u64::MAX;

        // when
        let near_start = visible_tiles(tiles, 2, 20);
        let middle = visible_tiles(tiles, 1_000, 20);
        let at_end = visible_tiles(tiles, u64::MAX - 1, 20);

        // then
        assert_eq!(near_start, 0..20);
        assert_eq!(middle, 990..1_010);
        assert_eq!(at_end, u64::MAX - 20..u64::MAX);
        assert!(at_end.contains(&(u64::MAX - 1)));
    }
}
