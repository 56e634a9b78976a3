use chrono::{Local, TimeZone};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, info};
use num_format::Locale;
use ratatui::layout::Alignment;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction as LayoutDirection, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span, Text},
    widgets::{
        Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, TableState,
        Tabs, Wrap,
    },
    Frame, Terminal,
};
use std::collections::VecDeque;
use std::error::Error;
use std::io;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use super::core::alerts::Direction;
use super::core::indicators::Overlay;
use super::core::scheduler::{SchedulerCommand, SchedulerEvent, Toast, ToastLevel};
use super::core::simulator::InputMode;
use super::core::state::{lock, ChartState, Command, DashboardState, SharedState, SortColumn};
use super::format::{
    format_currency, format_large_number, format_percentage, format_quantity, grouped, locale_for,
    time_ago, MISSING,
};
use super::theme::{self, Palette};
use crate::api::models::{Coin, SignalKind};

type DynError = Box<dyn Error + Send + Sync>;

const FRAME_INTERVAL: Duration = Duration::from_millis(100);
const TOAST_TTL: Duration = Duration::from_secs(6);
const MAX_TOASTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardView {
    Market,
    Signals,
    Movers,
    Chart,
    Alerts,
    Dream,
    Feeds,
}

impl DashboardView {
    pub const ALL: [DashboardView; 7] = [
        DashboardView::Market,
        DashboardView::Signals,
        DashboardView::Movers,
        DashboardView::Chart,
        DashboardView::Alerts,
        DashboardView::Dream,
        DashboardView::Feeds,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            DashboardView::Market => "Market [m]",
            DashboardView::Signals => "Signals [g]",
            DashboardView::Movers => "Movers [o]",
            DashboardView::Chart => "Chart [c]",
            DashboardView::Alerts => "Alerts [a]",
            DashboardView::Dream => "Dream [d]",
            DashboardView::Feeds => "Feeds [f]",
        }
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|v| v == self).unwrap_or(0)
    }

    fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn previous(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Single-line text entry shown in the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prompt {
    Search,
    AlertTarget(Direction),
    DreamAmount,
    DreamTarget,
}

impl Prompt {
    fn label(&self) -> &'static str {
        match self {
            Prompt::Search => "Search",
            Prompt::AlertTarget(Direction::Above) => "Alert when price >=",
            Prompt::AlertTarget(Direction::Below) => "Alert when price <=",
            Prompt::DreamAmount => "Amount",
            Prompt::DreamTarget => "Target move %",
        }
    }
}

/// Per-frame rendering inputs derived from preferences.
struct RenderCtx<'a> {
    s: &'a DashboardState,
    p: Palette,
    locale: Locale,
}

pub struct Dashboard {
    state: SharedState,
    commands: UnboundedSender<SchedulerCommand>,
    events: UnboundedReceiver<SchedulerEvent>,
    view: DashboardView,
    cursor: usize,
    alert_cursor: usize,
    prompt: Option<Prompt>,
    input: String,
    toasts: VecDeque<(Toast, Instant)>,
    countdown: Option<u64>,
    running: bool,
}

impl Dashboard {
    pub fn new(
        state: SharedState,
        commands: UnboundedSender<SchedulerCommand>,
        events: UnboundedReceiver<SchedulerEvent>,
    ) -> Self {
        Self {
            state,
            commands,
            events,
            view: DashboardView::Market,
            cursor: 0,
            alert_cursor: 0,
            prompt: None,
            input: String::new(),
            toasts: VecDeque::new(),
            countdown: None,
            running: true,
        }
    }

    pub async fn run(mut self) -> Result<(), DynError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal).await;

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        self.send(SchedulerCommand::Shutdown);
        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<(), DynError> {
        let mut frames = tokio::time::interval(FRAME_INTERVAL);

        while self.running {
            frames.tick().await;

            while event::poll(Duration::ZERO)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_input(key);
                    }
                }
            }

            while let Ok(event) = self.events.try_recv() {
                self.apply_event(event);
            }
            self.expire_toasts();

            {
                let state = lock(&self.state);
                let cx = RenderCtx {
                    s: &state,
                    p: theme::palette(state.prefs().theme),
                    locale: locale_for(state.prefs().language),
                };
                terminal.draw(|f| self.draw(f, &cx))?;
            }
        }

        info!("Dashboard closed");
        Ok(())
    }

    fn send(&self, command: SchedulerCommand) {
        if self.commands.send(command).is_err() {
            debug!("Scheduler is gone, command dropped");
        }
    }

    fn push_toast(&mut self, toast: Toast) {
        self.toasts.push_back((toast, Instant::now()));
        while self.toasts.len() > MAX_TOASTS {
            self.toasts.pop_front();
        }
    }

    fn expire_toasts(&mut self) {
        while let Some((_, at)) = self.toasts.front() {
            if at.elapsed() < TOAST_TTL {
                break;
            }
            self.toasts.pop_front();
        }
    }

    fn apply_event(&mut self, event: SchedulerEvent) {
        match event {
            SchedulerEvent::Countdown(seconds) => self.countdown = seconds,
            SchedulerEvent::BatchFinished { failed, at } => {
                debug!(
                    "Batch finished at {} with {} failures",
                    at.format("%H:%M:%S"),
                    failed.len()
                );
            }
            SchedulerEvent::ChartLoaded(coin_id) => debug!("Chart ready for {}", coin_id),
            SchedulerEvent::Toast(toast) => self.push_toast(toast),
        }
    }

    /// Runs a store command, turning a rejection into a toast.
    fn apply(&mut self, command: Command) -> bool {
        let result = lock(&self.state).handle(command);
        match result {
            Ok(()) => true,
            Err(e) => {
                self.push_toast(Toast::new(ToastLevel::Warning, e.to_string()));
                false
            }
        }
    }

    fn select_coin(&mut self, coin_id: String) {
        self.apply(Command::SelectCoin(coin_id.clone()));
        self.send(SchedulerCommand::LoadChart(coin_id));
        self.view = DashboardView::Chart;
    }

    /// Coin id of the highlighted row, falling back to the selected coin.
    fn focused_coin_id(&self) -> Option<String> {
        let state = lock(&self.state);
        let row = match self.view {
            DashboardView::Market => state.view().get(self.cursor).map(|c| c.id.clone()),
            DashboardView::Signals => state
                .feeds()
                .signals
                .get(self.cursor)
                .map(|s| s.coin_id.clone()),
            _ => None,
        };
        row.or_else(|| state.view_state().selected_coin_id.clone())
    }

    fn row_count(&self) -> usize {
        let state = lock(&self.state);
        match self.view {
            DashboardView::Market => state.view().len(),
            DashboardView::Signals => state.feeds().signals.len(),
            DashboardView::Alerts => state.alerts().len(),
            _ => 0,
        }
    }

    fn move_cursor(&mut self, down: bool) {
        let count = self.row_count();
        let cursor = if self.view == DashboardView::Alerts {
            &mut self.alert_cursor
        } else {
            &mut self.cursor
        };
        *cursor = if down {
            (*cursor + 1).min(count.saturating_sub(1))
        } else {
            cursor.saturating_sub(1)
        };
    }

    fn open_prompt(&mut self, prompt: Prompt) {
        self.input = match prompt {
            Prompt::Search => lock(&self.state).view_state().search_query.clone(),
            _ => String::new(),
        };
        self.prompt = Some(prompt);
    }

    fn handle_key_input(&mut self, key: KeyEvent) {
        if let Some(prompt) = self.prompt {
            self.handle_prompt_input(prompt, key);
            return;
        }

        let consent_pending = lock(&self.state).prefs().consent.is_none();

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.running = false
            }
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Tab => self.view = self.view.next(),
            KeyCode::BackTab => self.view = self.view.previous(),
            KeyCode::Char('m') => self.view = DashboardView::Market,
            KeyCode::Char('g') => self.view = DashboardView::Signals,
            KeyCode::Char('o') => self.view = DashboardView::Movers,
            KeyCode::Char('c') => self.view = DashboardView::Chart,
            KeyCode::Char('a') => self.view = DashboardView::Alerts,
            KeyCode::Char('d') => self.view = DashboardView::Dream,
            KeyCode::Char('f') => self.view = DashboardView::Feeds,
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(false),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(true),
            KeyCode::Enter => {
                if let Some(coin_id) = self.focused_coin_id() {
                    self.select_coin(coin_id);
                }
            }
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                if let Some(column) = SortColumn::ALL.get(index) {
                    self.apply(Command::SortBy(*column));
                    self.cursor = 0;
                }
            }
            KeyCode::Char('/') => self.open_prompt(Prompt::Search),
            KeyCode::Char('w') => {
                if let Some(coin_id) = self.focused_coin_id() {
                    self.apply(Command::ToggleWatchlist(coin_id));
                }
            }
            KeyCode::Char('W') => {
                self.apply(Command::ToggleWatchlistOnly);
                self.cursor = 0;
            }
            KeyCode::Char('r') => {
                self.send(SchedulerCommand::RefreshNow);
                self.push_toast(Toast::new(ToastLevel::Info, "Refreshing..."));
            }
            KeyCode::Char('p') => self.send(SchedulerCommand::ToggleEnabled),
            KeyCode::Char('t') => {
                self.apply(Command::ToggleTheme);
            }
            KeyCode::Char('l') => {
                self.apply(Command::ToggleLanguage);
            }
            KeyCode::Char('n') => {
                self.apply(Command::ToggleNotifications);
            }
            KeyCode::Char('y') if consent_pending => {
                self.apply(Command::SetConsent(true));
            }
            KeyCode::Char('N') if consent_pending => {
                self.apply(Command::SetConsent(false));
            }
            KeyCode::Char('>') | KeyCode::Char('+') => self.open_alert_prompt(Direction::Above),
            KeyCode::Char('<') | KeyCode::Char('-') => self.open_alert_prompt(Direction::Below),
            KeyCode::Char('x') | KeyCode::Delete if self.view == DashboardView::Alerts => {
                let id = lock(&self.state).alerts().get(self.alert_cursor).map(|a| a.id);
                if let Some(id) = id {
                    self.apply(Command::RemoveAlert(id));
                    self.alert_cursor = self.alert_cursor.saturating_sub(1);
                }
            }
            KeyCode::Char('u') if self.view == DashboardView::Dream => {
                self.open_prompt(Prompt::DreamAmount)
            }
            KeyCode::Char('e') if self.view == DashboardView::Dream => {
                self.open_prompt(Prompt::DreamTarget)
            }
            KeyCode::Char('i') if self.view == DashboardView::Dream => {
                self.apply(Command::ToggleDreamMode);
            }
            KeyCode::Char('h') if self.view == DashboardView::Dream => {
                self.apply(Command::DreamTargetAth);
            }
            _ => (),
        }
    }

    fn open_alert_prompt(&mut self, direction: Direction) {
        let selected = lock(&self.state).view_state().selected_coin_id.is_some();
        if selected {
            self.open_prompt(Prompt::AlertTarget(direction));
        } else {
            self.push_toast(Toast::new(
                ToastLevel::Warning,
                "Select a coin with Enter before adding an alert",
            ));
        }
    }

    fn handle_prompt_input(&mut self, prompt: Prompt, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                if prompt == Prompt::Search {
                    self.apply(Command::Search(String::new()));
                }
                self.close_prompt();
            }
            KeyCode::Enter => {
                self.submit_prompt(prompt);
                self.close_prompt();
            }
            KeyCode::Backspace => {
                self.input.pop();
                if prompt == Prompt::Search {
                    self.apply(Command::Search(self.input.clone()));
                    self.cursor = 0;
                }
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                if prompt == Prompt::Search {
                    self.apply(Command::Search(self.input.clone()));
                    self.cursor = 0;
                }
            }
            _ => (),
        }
    }

    fn close_prompt(&mut self) {
        self.prompt = None;
        self.input.clear();
    }

    fn submit_prompt(&mut self, prompt: Prompt) {
        let raw = self.input.clone();
        match prompt {
            Prompt::Search => (),
            Prompt::AlertTarget(direction) => {
                let coin_id = lock(&self.state).view_state().selected_coin_id.clone();
                if let Some(coin_id) = coin_id {
                    let added = self.apply(Command::AddAlert {
                        coin_id: coin_id.clone(),
                        target: raw.clone(),
                        direction,
                    });
                    if added {
                        self.push_toast(Toast::new(
                            ToastLevel::Info,
                            format!("Alert set: {} {} {}", coin_id, direction.symbol(), raw.trim()),
                        ));
                    }
                }
            }
            Prompt::DreamAmount => {
                self.apply(Command::SetDreamAmount(raw));
            }
            Prompt::DreamTarget => {
                self.apply(Command::SetDreamTarget(raw));
            }
        }
    }

    // ─── Rendering ───

    fn draw(&self, f: &mut Frame<CrosstermBackend<io::Stdout>>, cx: &RenderCtx) {
        let banner = if cx.s.prefs().consent.is_none() { 1 } else { 0 };
        let chunks = Layout::default()
            .direction(LayoutDirection::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(banner),
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(1),
                Constraint::Length(3),
            ])
            .split(f.size());

        self.render_header(f, chunks[0], cx);
        if banner > 0 {
            self.render_consent_banner(f, chunks[1], cx);
        }
        self.render_tabs(f, chunks[2], cx);
        self.render_main_content(f, chunks[3], cx);
        self.render_toast(f, chunks[4], cx);
        self.render_footer(f, chunks[5], cx);
    }

    fn render_header(&self, f: &mut Frame<CrosstermBackend<io::Stdout>>, area: Rect, cx: &RenderCtx) {
        let s = cx.s;
        let p = &cx.p;

        let refresh_status = match self.countdown {
            Some(secs) => Span::styled(format!("AUTO {}s", secs), Style::default().fg(p.up)),
            None => Span::styled("PAUSED", Style::default().fg(p.warn)),
        };
        let last_refresh = match s.last_refreshed() {
            Some(at) => format!(
                "Last refresh: {} ({})",
                at.format("%H:%M:%S"),
                time_ago(at, Local::now())
            ),
            None => "Loading...".to_string(),
        };

        let mut overview = vec![];
        if let Some(o) = &s.feeds().overview {
            overview.push(Span::styled(
                format!("Mkt Cap {} ", format_currency(o.total_market_cap_usd, &cx.locale)),
                p.text(),
            ));
            overview.push(Span::styled(
                format_percentage(o.market_cap_change_24h),
                p.change(o.market_cap_change_24h),
            ));
            overview.push(Span::styled(
                format!(
                    " | Vol {} | BTC Dom {}",
                    format_currency(o.total_volume_usd, &cx.locale),
                    o.btc_dominance
                        .map(|d| format!("{:.1}%", d))
                        .unwrap_or_else(|| MISSING.to_string())
                ),
                p.text(),
            ));
            if let Some(fg) = &o.fear_greed {
                overview.push(Span::styled(
                    format!(" | Fear & Greed {} {}", fg.value, fg.classification),
                    p.text(),
                ));
            }
            if let Some(score) = &o.market_score {
                overview.push(Span::styled(
                    format!(" | Score {:.0} {}", score.score, score.label),
                    p.text(),
                ));
            }
        } else {
            overview.push(Span::styled("Market overview unavailable", p.muted()));
        }

        let header = Paragraph::new(Text::from(vec![
            Line::from(vec![
                Span::styled("COINBOARD ", p.title()),
                refresh_status,
                Span::styled(format!(" | {}", last_refresh), p.muted()),
            ]),
            Line::from(overview),
        ]))
        .block(Block::default().borders(Borders::BOTTOM));

        f.render_widget(header, area);
    }

    fn render_consent_banner(
        &self,
        f: &mut Frame<CrosstermBackend<io::Stdout>>,
        area: Rect,
        cx: &RenderCtx,
    ) {
        let banner = Paragraph::new(Line::from(vec![
            Span::styled(
                " Preferences, watchlist and alerts are stored locally. ",
                Style::default().fg(cx.p.highlight_fg).bg(cx.p.warn),
            ),
            Span::styled(" y", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" Accept  "),
            Span::styled("N", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" Decline"),
        ]));
        f.render_widget(banner, area);
    }

    fn render_tabs(&self, f: &mut Frame<CrosstermBackend<io::Stdout>>, area: Rect, cx: &RenderCtx) {
        let titles: Vec<Line> = DashboardView::ALL
            .iter()
            .map(|v| Line::from(v.title()))
            .collect();
        let tabs = Tabs::new(titles)
            .select(self.view.index())
            .style(cx.p.muted())
            .highlight_style(cx.p.title())
            .divider("|");
        f.render_widget(tabs, area);
    }

    fn render_main_content(
        &self,
        f: &mut Frame<CrosstermBackend<io::Stdout>>,
        area: Rect,
        cx: &RenderCtx,
    ) {
        match self.view {
            DashboardView::Market => self.render_market_view(f, area, cx),
            DashboardView::Signals => self.render_signals_view(f, area, cx),
            DashboardView::Movers => self.render_movers_view(f, area, cx),
            DashboardView::Chart => self.render_chart_view(f, area, cx),
            DashboardView::Alerts => self.render_alerts_view(f, area, cx),
            DashboardView::Dream => self.render_dream_view(f, area, cx),
            DashboardView::Feeds => self.render_feeds_view(f, area, cx),
        }
    }

    fn render_market_view(&self, f: &mut Frame<CrosstermBackend<io::Stdout>>, area: Rect, cx: &RenderCtx) {
        let s = cx.s;
        let vs = s.view_state();
        let coins = s.view();

        let mut title = format!("Coins ({})", coins.len());
        if !vs.search_query.is_empty() {
            title.push_str(&format!(" search: \"{}\"", vs.search_query));
        }
        if vs.show_watchlist_only {
            title.push_str(" watchlist only");
        }

        let header_cells: Vec<Cell> = std::iter::once(Cell::from(" "))
            .chain(SortColumn::ALL.iter().enumerate().map(|(i, column)| {
                let arrow = if *column == vs.sort_column {
                    if vs.sort_ascending {
                        " ▲"
                    } else {
                        " ▼"
                    }
                } else {
                    ""
                };
                Cell::from(format!("{}{}{}", i + 1, column.label(), arrow))
            }))
            .collect();

        let rows: Vec<Row> = coins
            .iter()
            .map(|c| self.market_row(c, cx))
            .collect();

        let table = Table::new(rows)
            .header(Row::new(header_cells).style(Style::default().add_modifier(Modifier::BOLD)))
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(cx.p.highlight())
            .widths(&[
                Constraint::Length(1),
                Constraint::Length(6),
                Constraint::Min(14),
                Constraint::Length(8),
                Constraint::Length(13),
                Constraint::Length(8),
                Constraint::Length(9),
                Constraint::Length(9),
                Constraint::Length(11),
                Constraint::Length(13),
            ]);

        let mut table_state = TableState::default();
        if !coins.is_empty() {
            table_state.select(Some(self.cursor.min(coins.len() - 1)));
        }
        f.render_stateful_widget(table, area, &mut table_state);
    }

    fn market_row<'a>(&self, c: &'a Coin, cx: &RenderCtx) -> Row<'a> {
        let p = &cx.p;
        let star = if cx.s.is_watched(&c.id) { "★" } else { " " };
        let is_selected = cx.s.view_state().selected_coin_id.as_deref() == Some(c.id.as_str());
        let pct = |v: Option<f64>| Cell::from(Span::styled(format_percentage(v), p.change(v)));

        Row::new(vec![
            Cell::from(Span::styled(star, Style::default().fg(p.warn))),
            Cell::from(
                c.market_cap_rank
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| MISSING.to_string()),
            ),
            Cell::from(c.name.as_str()),
            Cell::from(c.symbol.to_uppercase()),
            Cell::from(format_currency(c.current_price, &cx.locale)),
            pct(c.price_change_percentage_1h_in_currency),
            pct(c.change_24h()),
            pct(c.price_change_percentage_7d_in_currency),
            Cell::from(format_currency(c.total_volume, &cx.locale)),
            Cell::from(format_currency(c.market_cap, &cx.locale)),
        ])
        .style(if is_selected {
            p.text().add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            p.text()
        })
    }

    fn signal_style(p: &Palette, kind: SignalKind) -> Style {
        match kind {
            SignalKind::StrongBuy => Style::default().fg(p.up).add_modifier(Modifier::BOLD),
            SignalKind::Buy => Style::default().fg(p.up),
            SignalKind::Sell => Style::default().fg(p.down),
            SignalKind::StrongSell => Style::default().fg(p.down).add_modifier(Modifier::BOLD),
            SignalKind::Neutral | SignalKind::NoData => p.muted(),
        }
    }

    fn render_signals_view(&self, f: &mut Frame<CrosstermBackend<io::Stdout>>, area: Rect, cx: &RenderCtx) {
        let p = &cx.p;
        let signals = &cx.s.feeds().signals;
        let layer = |v: Option<f64>| {
            v.map(|v| format!("{:.0}", v))
                .unwrap_or_else(|| MISSING.to_string())
        };

        let rows: Vec<Row> = signals
            .iter()
            .map(|sig| {
                let rsi = sig
                    .indicators
                    .rsi
                    .as_ref()
                    .and_then(|r| r.value)
                    .map(|v| format!("{:.1}", v))
                    .unwrap_or_else(|| MISSING.to_string());
                Row::new(vec![
                    Cell::from(format!("{} ({})", sig.name, sig.symbol.to_uppercase())),
                    Cell::from(Span::styled(sig.signal.as_str(), Self::signal_style(p, sig.signal))),
                    Cell::from(format!("{:.1}", sig.score)),
                    Cell::from(String::from(sig.confidence)),
                    Cell::from(rsi),
                    Cell::from(layer(sig.layers.technical)),
                    Cell::from(layer(sig.layers.volume)),
                    Cell::from(layer(sig.layers.sentiment)),
                    Cell::from(layer(sig.layers.derivatives)),
                    Cell::from(format_currency(sig.current_price, &cx.locale)),
                    Cell::from(Span::styled(
                        format_percentage(sig.price_change_24h),
                        p.change(sig.price_change_24h),
                    )),
                ])
            })
            .collect();

        let table = Table::new(rows)
            .header(
                Row::new(vec![
                    "Coin", "Signal", "Score", "Conf.", "RSI", "Tech", "Vol", "Sent", "Deriv",
                    "Price", "24h",
                ])
                .style(Style::default().add_modifier(Modifier::BOLD)),
            )
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Signals ({})", signals.len())),
            )
            .highlight_style(p.highlight())
            .widths(&[
                Constraint::Min(18),
                Constraint::Length(12),
                Constraint::Length(6),
                Constraint::Length(7),
                Constraint::Length(6),
                Constraint::Length(5),
                Constraint::Length(5),
                Constraint::Length(5),
                Constraint::Length(6),
                Constraint::Length(13),
                Constraint::Length(9),
            ]);

        let mut table_state = TableState::default();
        if !signals.is_empty() {
            table_state.select(Some(self.cursor.min(signals.len() - 1)));
        }
        f.render_stateful_widget(table, area, &mut table_state);
    }

    fn render_movers_view(&self, f: &mut Frame<CrosstermBackend<io::Stdout>>, area: Rect, cx: &RenderCtx) {
        let chunks = Layout::default()
            .direction(LayoutDirection::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let movers = &cx.s.feeds().movers;
        for (coins, title, chunk) in [
            (&movers.gainers, "Top Gainers (24h)", chunks[0]),
            (&movers.losers, "Top Losers (24h)", chunks[1]),
        ] {
            let rows: Vec<Row> = coins
                .iter()
                .map(|c| {
                    Row::new(vec![
                        Cell::from(format!("{} ({})", c.name, c.symbol.to_uppercase())),
                        Cell::from(format_currency(c.current_price, &cx.locale)),
                        Cell::from(Span::styled(
                            format_percentage(c.change_24h()),
                            cx.p.change(c.change_24h()),
                        )),
                    ])
                })
                .collect();

            let table = Table::new(rows)
                .header(
                    Row::new(vec!["Coin", "Price", "24h"])
                        .style(Style::default().add_modifier(Modifier::BOLD)),
                )
                .block(Block::default().borders(Borders::ALL).title(title))
                .widths(&[
                    Constraint::Min(16),
                    Constraint::Length(13),
                    Constraint::Length(9),
                ]);
            f.render_widget(table, chunk);
        }
    }

    fn render_chart_view(&self, f: &mut Frame<CrosstermBackend<io::Stdout>>, area: Rect, cx: &RenderCtx) {
        let s = cx.s;
        let selected = match s.view_state().selected_coin_id.as_deref() {
            Some(id) => id,
            None => {
                let message = Paragraph::new("Press Enter on a coin to load its chart")
                    .alignment(Alignment::Center)
                    .block(Block::default().borders(Borders::ALL).title("Chart"));
                f.render_widget(message, area);
                return;
            }
        };

        let chart_state = match s.chart().filter(|c| c.coin_id == selected) {
            Some(c) => c,
            None => {
                let message = Paragraph::new(format!("Loading chart for {}...", selected))
                    .alignment(Alignment::Center)
                    .block(Block::default().borders(Borders::ALL).title("Chart"));
                f.render_widget(message, area);
                return;
            }
        };

        let chunks = Layout::default()
            .direction(LayoutDirection::Horizontal)
            .constraints([Constraint::Min(40), Constraint::Length(36)])
            .split(area);

        if chart_state.points.len() < 2 {
            let message = Paragraph::new("Insufficient data for chart")
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(message, chunks[0]);
        } else {
            self.render_price_chart(f, chunks[0], cx, chart_state);
        }
        self.render_chart_sidebar(f, chunks[1], cx, chart_state);
    }

    fn render_price_chart(
        &self,
        f: &mut Frame<CrosstermBackend<io::Stdout>>,
        area: Rect,
        cx: &RenderCtx,
        chart_state: &ChartState,
    ) {
        let config = cx.s.indicator_config();
        let close: Vec<(f64, f64)> = chart_state
            .points
            .iter()
            .map(|pt| (pt.time as f64, pt.close))
            .collect();
        let overlay = |o: Overlay| -> Vec<(f64, f64)> {
            chart_state
                .overlays
                .points(o)
                .into_iter()
                .map(|(t, v)| (t as f64, v))
                .collect()
        };
        let ema_short = overlay(Overlay::EmaShort);
        let ema_long = overlay(Overlay::EmaLong);
        let bb_upper = overlay(Overlay::BollingerUpper);
        let bb_middle = overlay(Overlay::BollingerMiddle);
        let bb_lower = overlay(Overlay::BollingerLower);

        let (min_y, max_y) = [&close, &ema_short, &ema_long, &bb_upper, &bb_lower]
            .iter()
            .flat_map(|series| series.iter().map(|(_, v)| *v))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        let pad = ((max_y - min_y) * 0.05).max(max_y.abs() * 0.001).max(1e-9);
        let (min_y, max_y) = (min_y - pad, max_y + pad);

        let min_x = close.first().map_or(0.0, |p| p.0);
        let max_x = close.last().map_or(1.0, |p| p.0);

        let datasets = vec![
            line_dataset("BB upper".to_string(), Color::DarkGray, &bb_upper),
            line_dataset("BB lower".to_string(), Color::DarkGray, &bb_lower),
            line_dataset(format!("SMA{}", config.bb_period), Color::Gray, &bb_middle),
            line_dataset(format!("EMA{}", config.ema_long), Color::Magenta, &ema_long),
            line_dataset(format!("EMA{}", config.ema_short), Color::Cyan, &ema_short),
            line_dataset("Price".to_string(), cx.p.text, &close),
        ];

        let mid_x = (min_x + max_x) / 2.0;
        let mid_y = (min_y + max_y) / 2.0;
        let chart = Chart::new(datasets)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("{} Price History", chart_state.coin_id)),
            )
            .x_axis(
                Axis::default()
                    .style(cx.p.muted())
                    .bounds([min_x, max_x])
                    .labels(vec![
                        Span::raw(format_bucket(min_x as i64)),
                        Span::raw(format_bucket(mid_x as i64)),
                        Span::raw(format_bucket(max_x as i64)),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .style(cx.p.muted())
                    .bounds([min_y, max_y])
                    .labels(vec![
                        Span::raw(format_currency(Some(min_y), &cx.locale)),
                        Span::raw(format_currency(Some(mid_y), &cx.locale)),
                        Span::raw(format_currency(Some(max_y), &cx.locale)),
                    ]),
            );

        f.render_widget(chart, area);
    }

    fn render_chart_sidebar(
        &self,
        f: &mut Frame<CrosstermBackend<io::Stdout>>,
        area: Rect,
        cx: &RenderCtx,
        chart_state: &ChartState,
    ) {
        let p = &cx.p;
        let config = cx.s.indicator_config();
        let coin = cx.s.coin(&chart_state.coin_id);
        let money = |v: Option<f64>| format_currency(v, &cx.locale);
        let field = |label: &str, value: String| {
            Line::from(vec![
                Span::styled(format!("{:<13}", label), p.muted()),
                Span::styled(value, p.text()),
            ])
        };

        let mut lines = vec![];
        if let Some(c) = coin {
            lines.push(Line::from(Span::styled(
                format!("{} ({})", c.name, c.symbol.to_uppercase()),
                p.title(),
            )));
            lines.push(field("Price", money(c.current_price)));
            lines.push(Line::from(vec![
                Span::styled(format!("{:<13}", "24h"), p.muted()),
                Span::styled(format_percentage(c.change_24h()), p.change(c.change_24h())),
            ]));
            lines.push(field("24h High", money(c.high_24h)));
            lines.push(field("24h Low", money(c.low_24h)));
        }
        if let Some(d) = &chart_state.detail {
            lines.push(field("ATH", money(d.ath)));
            lines.push(Line::from(vec![
                Span::styled(format!("{:<13}", "From ATH"), p.muted()),
                Span::styled(
                    format_percentage(d.ath_change_percentage),
                    p.change(d.ath_change_percentage),
                ),
            ]));
            lines.push(field("ATL", money(d.atl)));
            lines.push(field("Supply", format_large_number(d.circulating_supply)));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Overlays", p.title())));
        let overlays = &chart_state.overlays;
        for (label, overlay) in [
            (format!("EMA {}", config.ema_short), Overlay::EmaShort),
            (format!("EMA {}", config.ema_long), Overlay::EmaLong),
            ("BB upper".to_string(), Overlay::BollingerUpper),
            ("BB middle".to_string(), Overlay::BollingerMiddle),
            ("BB lower".to_string(), Overlay::BollingerLower),
        ] {
            lines.push(field(&label, money(overlays.latest(overlay))));
        }

        if let Some(sig) = &chart_state.signal {
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled(format!("{:<13}", "Signal"), p.muted()),
                Span::styled(sig.signal.as_str(), Self::signal_style(p, sig.signal)),
            ]));
            lines.push(field(
                "Score",
                format!("{:.1} ({})", sig.score, String::from(sig.confidence)),
            ));
            if let Some(rsi) = sig.indicators.rsi.as_ref().and_then(|r| r.value) {
                lines.push(field("RSI", format!("{:.1}", rsi)));
            }
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(
                "{} bars, loaded {}",
                chart_state.points.len(),
                chart_state.loaded_at.format("%H:%M:%S")
            ),
            p.muted(),
        )));

        let sidebar = Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Details"));
        f.render_widget(sidebar, area);
    }

    fn render_alerts_view(&self, f: &mut Frame<CrosstermBackend<io::Stdout>>, area: Rect, cx: &RenderCtx) {
        let p = &cx.p;
        let alerts = cx.s.alerts();
        let prices = cx.s.price_snapshot();

        let rows: Vec<Row> = alerts
            .iter()
            .map(|alert| {
                let current = prices.get(&alert.coin_id).copied();
                let status = match (alert.triggered, alert.triggered_at) {
                    (true, Some(at)) => Local
                        .timestamp_opt(at, 0)
                        .single()
                        .map(|t| format!("TRIGGERED {}", t.format("%m-%d %H:%M")))
                        .unwrap_or_else(|| "TRIGGERED".to_string()),
                    (true, None) => "TRIGGERED".to_string(),
                    (false, _) => "ACTIVE".to_string(),
                };
                let status_style = if alert.triggered {
                    Style::default().fg(p.warn)
                } else {
                    Style::default().fg(p.up)
                };

                Row::new(vec![
                    Cell::from(alert.id.to_string()),
                    Cell::from(alert.coin_id.as_str()),
                    Cell::from(format!(
                        "{} {}",
                        alert.direction.symbol(),
                        format_currency(Some(alert.target_price), &cx.locale)
                    )),
                    Cell::from(format_currency(current, &cx.locale)),
                    Cell::from(Span::styled(status, status_style)),
                ])
            })
            .collect();

        let title = format!(
            "Price Alerts ({} active)",
            alerts.iter().filter(|a| !a.triggered).count()
        );
        let table = Table::new(rows)
            .header(
                Row::new(vec!["ID", "Coin", "Condition", "Current", "Status"])
                    .style(Style::default().add_modifier(Modifier::BOLD)),
            )
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(p.highlight())
            .widths(&[
                Constraint::Length(5),
                Constraint::Min(14),
                Constraint::Length(18),
                Constraint::Length(14),
                Constraint::Length(22),
            ]);

        let mut table_state = TableState::default();
        if !alerts.is_empty() {
            table_state.select(Some(self.alert_cursor.min(alerts.len() - 1)));
        }
        f.render_stateful_widget(table, area, &mut table_state);
    }

    fn render_dream_view(&self, f: &mut Frame<CrosstermBackend<io::Stdout>>, area: Rect, cx: &RenderCtx) {
        let p = &cx.p;
        let s = cx.s;
        let inputs = s.dream_inputs();

        let outcome = match s.dream_outcome() {
            Some(o) => o,
            None => {
                let message = Paragraph::new("Select a coin with a known price to start dreaming")
                    .alignment(Alignment::Center)
                    .block(Block::default().borders(Borders::ALL).title("Dream Machine"));
                f.render_widget(message, area);
                return;
            }
        };

        let chunks = Layout::default()
            .direction(LayoutDirection::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);

        let r = &outcome.result;
        let field = |label: &str, value: String, style: Style| {
            Line::from(vec![
                Span::styled(format!("{:<16}", label), p.muted()),
                Span::styled(value, style),
            ])
        };
        let (mode_label, amount) = match inputs.mode {
            InputMode::Usd => (
                "USD investment",
                format_currency(Some(inputs.amount), &cx.locale),
            ),
            InputMode::Coin => (
                "Coins held",
                format_quantity(inputs.amount, &cx.locale),
            ),
        };

        let lines = vec![
            Line::from(Span::styled(
                format!(
                    "{} @ {}",
                    outcome.coin_id,
                    format_currency(Some(outcome.current_price), &cx.locale)
                ),
                p.title(),
            )),
            Line::from(""),
            field("Mode", mode_label.to_string(), p.text()),
            field("Amount", amount, p.text()),
            field(
                "Target move",
                format!("+{}%", grouped(inputs.target_pct, 2, &cx.locale)),
                p.text(),
            ),
            Line::from(""),
            field("Target price", format_currency(Some(r.target_price), &cx.locale), p.text()),
            field("Investment", format_currency(Some(r.investment_usd), &cx.locale), p.text()),
            field("Coins", format_quantity(r.coins_bought, &cx.locale), p.text()),
            field("Future value", format_currency(Some(r.future_value), &cx.locale), p.text()),
            field(
                "Profit",
                format_currency(Some(r.profit), &cx.locale),
                p.change(Some(r.profit)).add_modifier(Modifier::BOLD),
            ),
        ];
        let summary = Paragraph::new(Text::from(lines))
            .block(Block::default().borders(Borders::ALL).title("Dream Machine"));
        f.render_widget(summary, chunks[0]);

        let rows: Vec<Row> = outcome
            .items
            .iter()
            .map(|item| {
                let style = if item.affordable { p.text() } else { p.muted() };
                Row::new(vec![
                    Cell::from(if item.affordable { "✓" } else { " " }),
                    Cell::from(item.name.as_str()),
                    Cell::from(format_currency(Some(item.price_usd), &cx.locale)),
                    Cell::from(if item.affordable {
                        format!("x{}", item.count)
                    } else {
                        String::new()
                    }),
                ])
                .style(style)
            })
            .collect();
        let affordable = outcome.items.iter().filter(|i| i.affordable).count();
        let table = Table::new(rows)
            .header(
                Row::new(vec!["", "With the profit you could buy", "Price", "Count"])
                    .style(Style::default().add_modifier(Modifier::BOLD)),
            )
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Shopping list ({} affordable)", affordable)),
            )
            .widths(&[
                Constraint::Length(1),
                Constraint::Min(22),
                Constraint::Length(13),
                Constraint::Length(10),
            ]);
        f.render_widget(table, chunks[1]);
    }

    fn render_feeds_view(&self, f: &mut Frame<CrosstermBackend<io::Stdout>>, area: Rect, cx: &RenderCtx) {
        let p = &cx.p;
        let feeds = cx.s.feeds();
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let opt = |v: Option<f64>, decimals: usize| {
            v.map(|v| format!("{:.*}", decimals, v))
                .unwrap_or_else(|| MISSING.to_string())
        };

        let rows = Layout::default()
            .direction(LayoutDirection::Vertical)
            .constraints([
                Constraint::Percentage(35),
                Constraint::Percentage(35),
                Constraint::Percentage(30),
            ])
            .split(area);
        let top = Layout::default()
            .direction(LayoutDirection::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[0]);
        let middle = Layout::default()
            .direction(LayoutDirection::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);

        let anomalies: Vec<Row> = feeds
            .anomalies
            .iter()
            .map(|a| {
                Row::new(vec![
                    Cell::from(a.symbol.to_uppercase()),
                    Cell::from(format_large_number(a.current_volume)),
                    Cell::from(format_large_number(a.baseline_volume)),
                    Cell::from(Span::styled(
                        format!("{}x", opt(a.deviation_multiple, 1)),
                        if a.is_anomaly {
                            Style::default().fg(p.warn)
                        } else {
                            p.text()
                        },
                    )),
                ])
            })
            .collect();
        f.render_widget(
            Table::new(anomalies)
                .header(Row::new(vec!["Coin", "Volume", "Baseline", "Dev."]).style(bold))
                .block(Block::default().borders(Borders::ALL).title("Volume Anomalies"))
                .widths(&[
                    Constraint::Length(8),
                    Constraint::Length(10),
                    Constraint::Length(10),
                    Constraint::Length(8),
                ]),
            top[0],
        );

        let derivatives: Vec<Row> = feeds
            .derivatives
            .iter()
            .map(|d| {
                let funding = d.funding_rate.as_ref().and_then(|r| r.value);
                let ratio = d.long_short_ratio.as_ref().and_then(|r| r.value);
                Row::new(vec![
                    Cell::from(d.symbol.to_uppercase()),
                    Cell::from(Span::styled(
                        opt(funding.map(|v| v * 100.0), 4) + "%",
                        p.change(funding),
                    )),
                    Cell::from(opt(ratio, 2)),
                    Cell::from(format_currency(d.open_interest, &cx.locale)),
                ])
            })
            .collect();
        f.render_widget(
            Table::new(derivatives)
                .header(Row::new(vec!["Coin", "Funding", "L/S", "Open Int."]).style(bold))
                .block(Block::default().borders(Borders::ALL).title("Derivatives"))
                .widths(&[
                    Constraint::Length(8),
                    Constraint::Length(10),
                    Constraint::Length(6),
                    Constraint::Length(12),
                ]),
            top[1],
        );

        let now = Local::now();
        let whales: Vec<Row> = feeds
            .whales
            .iter()
            .map(|w| {
                let short_hash: String = w.hash.chars().take(10).collect();
                let age = w
                    .time
                    .and_then(|t| Local.timestamp_opt(t, 0).single())
                    .map(|t| time_ago(t, now))
                    .unwrap_or_else(|| MISSING.to_string());
                Row::new(vec![
                    Cell::from(format!("{} BTC", opt(w.value_btc, 2))),
                    Cell::from(format_currency(w.value_usd, &cx.locale)),
                    Cell::from(age),
                    Cell::from(w.note.clone().unwrap_or(short_hash)),
                ])
            })
            .collect();
        f.render_widget(
            Table::new(whales)
                .header(Row::new(vec!["Value", "USD", "Age", "Tx"]).style(bold))
                .block(Block::default().borders(Borders::ALL).title("Whale Transactions"))
                .widths(&[
                    Constraint::Length(14),
                    Constraint::Length(12),
                    Constraint::Length(9),
                    Constraint::Min(10),
                ]),
            middle[0],
        );

        let social: Vec<Row> = feeds
            .social
            .iter()
            .map(|b| {
                Row::new(vec![
                    Cell::from(format!("{} ({})", b.name, b.symbol.to_uppercase())),
                    Cell::from(opt(b.buzz_score, 0)),
                    Cell::from(b.direction.clone().unwrap_or_else(|| MISSING.to_string())),
                    Cell::from(format!("{}x", opt(b.volume_ratio, 1))),
                ])
            })
            .collect();
        f.render_widget(
            Table::new(social)
                .header(Row::new(vec!["Coin", "Buzz", "Trend", "Vol."]).style(bold))
                .block(Block::default().borders(Borders::ALL).title("Social Buzz"))
                .widths(&[
                    Constraint::Min(14),
                    Constraint::Length(6),
                    Constraint::Length(8),
                    Constraint::Length(7),
                ]),
            middle[1],
        );

        let mut lines = vec![];
        match feeds.sentiment.as_ref().and_then(|s| s.overall.as_ref()) {
            Some(o) => lines.push(Line::from(vec![
                Span::styled(format!("{} ({:.2}) ", o.label, o.score), p.change(Some(o.score))),
                Span::styled(
                    format!("+{} / -{} / ={}", o.positive, o.negative, o.neutral),
                    p.muted(),
                ),
            ])),
            None => lines.push(Line::from(Span::styled("No sentiment data", p.muted()))),
        }
        if let Some(sentiment) = &feeds.sentiment {
            for article in &sentiment.recent_news {
                lines.push(Line::from(vec![
                    Span::styled(
                        if article.sentiment > 0.0 {
                            "▲ "
                        } else if article.sentiment < 0.0 {
                            "▼ "
                        } else {
                            "• "
                        },
                        p.change(Some(article.sentiment)),
                    ),
                    Span::styled(article.title.as_str(), p.text()),
                    Span::styled(format!("  {}", article.source), p.muted()),
                ]));
            }
        }
        f.render_widget(
            Paragraph::new(Text::from(lines))
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title("News Sentiment")),
            rows[2],
        );
    }

    fn render_toast(&self, f: &mut Frame<CrosstermBackend<io::Stdout>>, area: Rect, cx: &RenderCtx) {
        if let Some((toast, _)) = self.toasts.back() {
            let line = Paragraph::new(Span::styled(
                format!(" {} ", toast.message),
                cx.p.toast(toast.level),
            ));
            f.render_widget(line, area);
        }
    }

    fn render_footer(&self, f: &mut Frame<CrosstermBackend<io::Stdout>>, area: Rect, cx: &RenderCtx) {
        let controls = match self.prompt {
            Some(prompt) => vec![
                Span::styled(format!("{}: ", prompt.label()), cx.p.title()),
                Span::styled(format!("{}_", self.input), cx.p.text()),
                Span::raw("  "),
                Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" Confirm  "),
                Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" Cancel"),
            ],
            None => {
                let keys: &[(&str, &str)] = match self.view {
                    DashboardView::Market => &[
                        ("↑/↓", "Navigate"),
                        ("Enter", "Chart"),
                        ("1-9", "Sort"),
                        ("/", "Search"),
                        ("w", "Watch"),
                        ("W", "Watchlist only"),
                        (">/<", "Alert"),
                        ("r", "Refresh"),
                        ("p", "Pause"),
                        ("t", "Theme"),
                        ("l", "Lang"),
                        ("q", "Quit"),
                    ],
                    DashboardView::Signals => &[
                        ("↑/↓", "Navigate"),
                        ("Enter", "Chart"),
                        ("w", "Watch"),
                        ("r", "Refresh"),
                        ("q", "Quit"),
                    ],
                    DashboardView::Chart => &[
                        (">/<", "Alert"),
                        ("w", "Watch"),
                        ("d", "Dream"),
                        ("m", "Market"),
                        ("q", "Quit"),
                    ],
                    DashboardView::Alerts => &[
                        ("↑/↓", "Navigate"),
                        ("x", "Delete"),
                        (">/<", "Add for selected"),
                        ("n", "Mute notifications"),
                        ("q", "Quit"),
                    ],
                    DashboardView::Dream => &[
                        ("u", "Amount"),
                        ("e", "Target %"),
                        ("i", "USD/Coin"),
                        ("h", "ATH target"),
                        ("m", "Market"),
                        ("q", "Quit"),
                    ],
                    DashboardView::Movers | DashboardView::Feeds => &[
                        ("Tab", "Next view"),
                        ("r", "Refresh"),
                        ("m", "Market"),
                        ("q", "Quit"),
                    ],
                };

                let mut spans = vec![Span::raw("Controls: ")];
                for (key, label) in keys {
                    spans.push(Span::styled(
                        key.to_string(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ));
                    spans.push(Span::raw(format!(" {}  ", label)));
                }
                spans
            }
        };

        let footer = Paragraph::new(Line::from(controls))
            .style(cx.p.muted())
            .block(Block::default().borders(Borders::TOP));

        f.render_widget(footer, area);
    }
}

fn line_dataset(name: String, color: Color, data: &[(f64, f64)]) -> Dataset<'_> {
    Dataset::default()
        .name(name)
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(data)
}

fn format_bucket(time: i64) -> String {
    Local
        .timestamp_opt(time, 0)
        .single()
        .map(|t| t.format("%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn views_cycle_in_both_directions() {
        let mut view = DashboardView::Market;
        for _ in 0..DashboardView::ALL.len() {
            view = view.next();
        }
        assert_eq!(view, DashboardView::Market);
        assert_eq!(DashboardView::Market.previous(), DashboardView::Feeds);
    }
}
