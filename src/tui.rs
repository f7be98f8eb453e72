use std::collections::HashSet;
use std::io;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Bar, BarChart, BarGroup, Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row,
        Table, Wrap,
    },
    Frame, Terminal,
};
use tokio::sync::{mpsc, watch};
use tracing::warn;
use tui_big_text::{BigText, PixelSize};

use crate::chart::{self, ChartAnimation, ChartData};
use crate::client::{BalanceApi, HttpApi};
use crate::config::{self, Config};
use crate::format::format_percentage;
use crate::model::{AddressRecord, BalanceSnapshot};
use crate::poller::Update;
use crate::reconcile::{self, TableView};
use crate::sort::{sort_records, SortField, SortState};
use crate::theme::Theme;

/// Token bar chart plus its value animation; the chains chart updates
/// without animation, so it is plain [`ChartData`].
pub struct TokenPanel {
    pub data: ChartData,
    pub animation: ChartAnimation,
}

pub struct App {
    pub theme: Theme,
    pub amounts_hidden: bool,
    pub sort: SortState,
    pub expanded: HashSet<String>,
    pub selected: usize,
    pub table: TableView,
    pub last_addresses: Option<Vec<AddressRecord>>,
    pub last_aggregate: Option<BalanceSnapshot>,
    pub tokens_chart: Option<TokenPanel>,
    pub chains_chart: Option<ChartData>,
    pub popup: Option<String>,
    pub should_quit: bool,
    config: Config,
    updates: mpsc::UnboundedReceiver<Update>,
    stop: watch::Sender<bool>,
}

impl App {
    pub fn new(
        config: Config,
        updates: mpsc::UnboundedReceiver<Update>,
        stop: watch::Sender<bool>,
    ) -> App {
        App {
            theme: config.theme,
            amounts_hidden: false,
            sort: SortState::default(),
            expanded: HashSet::new(),
            selected: 0,
            table: TableView::default(),
            last_addresses: None,
            last_aggregate: None,
            tokens_chart: None,
            chains_chart: None,
            popup: None,
            should_quit: false,
            config,
            updates,
            stop,
        }
    }

    /// Non-blocking: applies everything the poller has published since the
    /// last frame.
    pub fn drain_updates(&mut self) {
        while let Ok(update) = self.updates.try_recv() {
            match update {
                Update::Aggregate(snapshot) => self.apply_aggregate(snapshot, Instant::now()),
                Update::Addresses(addresses) => self.apply_addresses(addresses),
            }
        }
    }

    pub fn apply_aggregate(&mut self, snapshot: BalanceSnapshot, now: Instant) {
        if let Some(data) = chart::token_chart(&snapshot.top_tokens, self.amounts_hidden) {
            match &mut self.tokens_chart {
                Some(panel) => {
                    panel.animation.retarget(data.values.clone(), now);
                    panel.data = data;
                }
                None => {
                    self.tokens_chart = Some(TokenPanel {
                        animation: ChartAnimation::new(data.values.clone()),
                        data,
                    })
                }
            }
        }
        if let Some(data) = chart::chains_chart(&snapshot.chains, self.amounts_hidden) {
            self.chains_chart = Some(data);
        }
        self.last_aggregate = Some(snapshot);
    }

    /// Merges a fetched address list into the on-screen order and patches
    /// the table through the reconciler.
    pub fn apply_addresses(&mut self, fetched: Vec<AddressRecord>) {
        if fetched.is_empty() {
            warn!("empty address list received, keeping current table");
            return;
        }
        let merged = crate::sort::merge_incoming(&self.table.order(), &fetched, &self.sort);
        self.expanded
            .retain(|addr| merged.iter().any(|record| &record.address == addr));
        self.rerender(&merged);
        self.last_addresses = Some(merged);
    }

    /// Toggles sorting by `field` and rebuilds the table in the new order.
    pub fn sort_by(&mut self, field: SortField) {
        self.sort.toggle(field);
        let Some(mut records) = self.last_addresses.clone() else {
            return;
        };
        sort_records(&mut records, field, self.sort.direction);
        self.table.clear();
        self.rerender(&records);
        self.last_addresses = Some(records);
    }

    pub fn toggle_expansion(&mut self) {
        let Some(row) = self.table.rows.get(self.selected) else {
            return;
        };
        let address = row.address.clone();
        if !self.expanded.remove(&address) {
            self.expanded.insert(address);
        }
        if let Some(records) = self.last_addresses.clone() {
            self.rerender(&records);
        }
    }

    /// Re-renders every currency-bearing string without re-fetching: table
    /// cells through the reconciler, chart labels in place (values keep
    /// animating undisturbed).
    pub fn toggle_privacy(&mut self) {
        self.amounts_hidden = !self.amounts_hidden;
        if let Some(records) = self.last_addresses.clone() {
            self.rerender(&records);
        }
        if let Some(aggregate) = &self.last_aggregate {
            if let Some(panel) = &mut self.tokens_chart {
                if let Some(fresh) = chart::token_chart(&aggregate.top_tokens, self.amounts_hidden)
                {
                    panel.data.labels = fresh.labels;
                }
            }
            if let Some(data) = &mut self.chains_chart {
                if let Some(fresh) = chart::chains_chart(&aggregate.chains, self.amounts_hidden) {
                    data.labels = fresh.labels;
                }
            }
        }
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        self.config.theme = self.theme;
        if let Err(err) = config::store(&self.config) {
            warn!(%err, "failed to persist theme");
        }
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.table.rows.len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn rerender(&mut self, records: &[AddressRecord]) {
        let ops = reconcile::reconcile(&self.table, records, &self.expanded, self.amounts_hidden);
        reconcile::apply(&mut self.table, &ops);
        self.selected = self.selected.min(self.table.rows.len().saturating_sub(1));
    }

    /// Writes the current dashboard contents to a timestamped text file.
    pub fn export_snapshot(&self) -> io::Result<String> {
        use comfy_table::{
            presets::UTF8_FULL, Attribute, Cell, CellAlignment, ContentArrangement, Table,
        };

        let filename = format!(
            "balance-checker-{}.txt",
            chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
        );

        let mut out = String::new();
        if let Some(aggregate) = &self.last_aggregate {
            out.push_str(&format!(
                "Accounts: {}\nTotal value: {}\n\n",
                aggregate.global_stats.total_accounts,
                crate::format::format_currency(
                    aggregate.global_stats.total_usd_value,
                    self.amounts_hidden
                ),
            ));
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Address").add_attribute(Attribute::Bold),
                Cell::new("Balance").add_attribute(Attribute::Bold),
                Cell::new("Tokens").add_attribute(Attribute::Bold),
                Cell::new("Projects").add_attribute(Attribute::Bold),
            ]);
        for row in &self.table.rows {
            table.add_row(vec![
                Cell::new(&row.label),
                Cell::new(&row.balance).set_alignment(CellAlignment::Right),
                Cell::new(&row.token_count).set_alignment(CellAlignment::Right),
                Cell::new(&row.project_count).set_alignment(CellAlignment::Right),
            ]);
        }
        out.push_str(&table.to_string());
        out.push('\n');

        std::fs::write(&filename, out)?;
        Ok(filename)
    }
}

pub async fn run_tui(
    api: HttpApi,
    config: Config,
    updates: mpsc::UnboundedReceiver<Update>,
    stop: watch::Sender<bool>,
) -> eyre::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, updates, stop);
    let res = run_app(&mut terminal, &mut app, &api).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    api: &HttpApi,
) -> eyre::Result<()>
where
    B::Error: Send + Sync + 'static,
{
    loop {
        terminal.draw(|f| ui(f, app))?;

        app.drain_updates();

        if crossterm::event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    // the popup is a blocking acknowledgment: any key clears it
                    if app.popup.take().is_some() {
                        continue;
                    }
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
                        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
                        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
                        KeyCode::Enter | KeyCode::Char(' ') => app.toggle_expansion(),
                        KeyCode::Char('1') => app.sort_by(SortField::TotalBalance),
                        KeyCode::Char('2') => app.sort_by(SortField::TokenCount),
                        KeyCode::Char('3') => app.sort_by(SortField::ProjectCount),
                        KeyCode::Char('p') => app.toggle_privacy(),
                        KeyCode::Char('d') => app.toggle_theme(),
                        KeyCode::Char('x') => {
                            app.popup = Some(match app.export_snapshot() {
                                Ok(filename) => format!("Snapshot written to {filename}"),
                                Err(err) => format!("Snapshot failed: {err}"),
                            });
                        }
                        KeyCode::Char('S') => {
                            // best effort, surfaced once, never retried
                            app.popup = Some(match api.stop_server().await {
                                Ok(()) => "Server stopped.".to_string(),
                                Err(err) => format!("Failed to stop server: {err}"),
                            });
                        }
                        _ => {}
                    }
                }
            }
        }

        if app.should_quit {
            let _ = app.stop.send(true);
            break;
        }
    }
    Ok(())
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Percentage(40),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_stats(f, chunks[0], app);

    let chart_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);
    render_tokens_chart(f, chart_chunks[0], app);
    render_chains_chart(f, chart_chunks[1], app);

    render_table(f, chunks[2], app);
    render_help(f, chunks[3], app);

    if let Some(message) = &app.popup {
        render_popup(f, message);
    }
}

fn render_stats(f: &mut Frame, area: Rect, app: &App) {
    let Some(aggregate) = &app.last_aggregate else {
        let loading = Paragraph::new("Loading balance data...")
            .block(Block::default().borders(Borders::ALL).title("Balances"))
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center);
        f.render_widget(loading, area);
        return;
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.grid_color()))
        .title(format!(
            "Total USD Value - {} accounts",
            aggregate.global_stats.total_accounts
        ))
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let total = crate::format::format_currency(
        aggregate.global_stats.total_usd_value,
        app.amounts_hidden,
    );
    let big_text = BigText::builder()
        .pixel_size(PixelSize::Quadrant)
        .style(
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
        .lines(vec![total.into()])
        .build();
    f.render_widget(big_text, inner);
}

fn render_tokens_chart(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.grid_color()))
        .title("Top Tokens");

    let Some(panel) = &app.tokens_chart else {
        f.render_widget(block, area);
        return;
    };

    let values = panel.animation.values_at(Instant::now());
    let bars: Vec<Bar> = panel
        .data
        .labels
        .iter()
        .zip(&values)
        .map(|(label, value)| {
            Bar::default()
                .value(value.max(0.0) as u64)
                .label(Line::from(label.as_str()))
                .text_value(crate::format::format_currency(*value, app.amounts_hidden))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(9)
        .bar_style(Style::default().fg(app.theme.accent_color()))
        .value_style(
            Style::default()
                .fg(Color::Black)
                .bg(app.theme.accent_color()),
        )
        .label_style(Style::default().fg(app.theme.text_color()));

    f.render_widget(chart, area);
}

fn render_chains_chart(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.grid_color()))
        .title("Chains");

    let Some(data) = &app.chains_chart else {
        f.render_widget(block, area);
        return;
    };

    let total: f64 = data.values.iter().sum();
    let fallback = vec![(0x3b, 0x82, 0xf6); data.values.len()];
    let colors = data.colors.as_ref().unwrap_or(&fallback);

    let items: Vec<ListItem> = data
        .labels
        .iter()
        .zip(&data.values)
        .zip(colors)
        .map(|((label, value), (r, g, b))| {
            ListItem::new(Line::from(vec![
                Span::styled("■ ", Style::default().fg(Color::Rgb(*r, *g, *b))),
                Span::styled(
                    format!("{label:<28}"),
                    Style::default().fg(app.theme.text_color()),
                ),
                Span::styled(
                    format!("{: >8}", format_percentage(*value, total)),
                    Style::default().fg(app.theme.text_color()),
                ),
            ]))
        })
        .collect();

    f.render_widget(List::new(items).block(block), area);
}

fn render_table(f: &mut Frame, area: Rect, app: &App) {
    let sort_title = |field: SortField| {
        if app.sort.field == Some(field) {
            format!("{} {}", field.title(), app.sort.direction.marker())
        } else {
            field.title().to_string()
        }
    };

    let header_cells = [
        "Address".to_string(),
        sort_title(SortField::TotalBalance),
        sort_title(SortField::TokenCount),
        sort_title(SortField::ProjectCount),
    ]
    .map(|title| {
        Cell::from(title).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    let text_style = Style::default().fg(app.theme.text_color());
    let dim_style = Style::default().fg(app.theme.grid_color());

    let mut rows: Vec<Row> = Vec::new();
    for (i, row) in app.table.rows.iter().enumerate() {
        let marker = if row.detail.is_some() { "▼" } else { "▶" };
        let row_style = if i == app.selected {
            Style::default().bg(Color::DarkGray)
        } else {
            Style::default()
        };
        rows.push(
            Row::new(vec![
                Cell::from(format!("{marker} {}", row.label)).style(text_style),
                Cell::from(row.balance.clone()).style(text_style),
                Cell::from(row.token_count.clone()).style(text_style),
                Cell::from(row.project_count.clone()).style(text_style),
            ])
            .style(row_style),
        );

        if let Some(detail) = &row.detail {
            rows.push(Row::new(vec![
                Cell::from(format!("  {}", detail.address)).style(dim_style)
            ]));
            if !detail.tokens.is_empty() {
                rows.push(Row::new(vec![Cell::from("  Top tokens").style(dim_style)]));
                for item in &detail.tokens {
                    rows.push(Row::new(vec![
                        Cell::from(format!("    {}", item.label)).style(text_style),
                        Cell::from(item.value.clone()).style(text_style),
                    ]));
                }
            }
            if !detail.projects.is_empty() {
                rows.push(Row::new(vec![
                    Cell::from("  Top projects").style(dim_style)
                ]));
                for item in &detail.projects {
                    rows.push(Row::new(vec![
                        Cell::from(format!("    {}", item.label)).style(text_style),
                        Cell::from(item.value.clone()).style(text_style),
                    ]));
                }
            }
        }
    }

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(34),
            Constraint::Percentage(26),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.grid_color()))
            .title("Addresses"),
    )
    .style(text_style);

    f.render_widget(table, area);
}

fn render_help(f: &mut Frame, area: Rect, app: &App) {
    let help = Paragraph::new(
        "j/k select | enter expand | 1/2/3 sort | p privacy | d theme | x snapshot | S stop server | q quit",
    )
    .block(Block::default().borders(Borders::ALL).title("Help"))
    .style(Style::default().fg(app.theme.grid_color()))
    .alignment(Alignment::Center);
    f.render_widget(help, area);
}

fn render_popup(f: &mut Frame, message: &str) {
    let popup_area = centered_rect(60, 20, f.area());
    f.render_widget(Clear, popup_area);

    let paragraph = Paragraph::new(format!("{message}\n\nPress any key to continue"))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Notice")
                .style(Style::default().fg(Color::Yellow)),
        )
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    f.render_widget(paragraph, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChainSummary, GlobalStats, ProjectSummary, TokenSummary};

    fn test_app() -> App {
        let (_tx, rx) = mpsc::unbounded_channel();
        let (stop_tx, _stop_rx) = watch::channel(false);
        App::new(Config::default(), rx, stop_tx)
    }

    fn record(address: &str, balance: f64, tokens: u64, projects: u64) -> AddressRecord {
        AddressRecord {
            address: address.to_string(),
            total_balance: balance,
            token_count: tokens,
            project_count: projects,
            top_tokens: vec![TokenSummary {
                symbol: "ETH".to_string(),
                value: balance / 2.0,
            }],
            top_projects: vec![ProjectSummary {
                name: "Aave".to_string(),
                value: balance / 4.0,
            }],
        }
    }

    fn aggregate(total: f64) -> BalanceSnapshot {
        BalanceSnapshot {
            global_stats: GlobalStats {
                total_accounts: 2,
                total_usd_value: total,
            },
            top_tokens: vec![TokenSummary {
                symbol: "ETH".to_string(),
                value: total,
            }],
            chains: vec![ChainSummary {
                name: "eth".to_string(),
                total_value: total,
            }],
        }
    }

    #[test]
    fn expanded_row_survives_a_poll_update() {
        let mut app = test_app();
        app.apply_addresses(vec![record("a", 100.0, 3, 2)]);
        app.toggle_expansion();
        assert!(app.table.rows[0].detail.is_some());

        let mut updated = record("a", 100.0, 3, 2);
        updated.top_tokens[0].value = 75.0;
        app.apply_addresses(vec![updated]);

        let detail = app.table.rows[0].detail.as_ref().unwrap();
        assert_eq!(
            detail.tokens[0].value,
            crate::format::format_currency(75.0, false)
        );
        assert!(app.expanded.contains("a"));
    }

    #[test]
    fn new_address_lands_between_sorted_neighbors() {
        let mut app = test_app();
        app.apply_addresses(vec![record("hi", 0.0, 30, 0), record("lo", 0.0, 10, 0)]);
        app.sort_by(SortField::TokenCount);
        assert_eq!(app.table.order(), ["hi", "lo"]);

        app.apply_addresses(vec![
            record("hi", 0.0, 30, 0),
            record("lo", 0.0, 10, 0),
            record("new", 0.0, 20, 0),
        ]);
        assert_eq!(app.table.order(), ["hi", "new", "lo"]);
    }

    #[test]
    fn sorting_twice_reverses_the_table() {
        let mut app = test_app();
        app.apply_addresses(vec![
            record("a", 30.0, 0, 0),
            record("b", 10.0, 0, 0),
            record("c", 20.0, 0, 0),
        ]);

        app.sort_by(SortField::TotalBalance);
        assert_eq!(app.table.order(), ["a", "c", "b"]);

        app.sort_by(SortField::TotalBalance);
        assert_eq!(app.table.order(), ["b", "c", "a"]);
    }

    #[test]
    fn privacy_toggle_twice_restores_all_strings() {
        let mut app = test_app();
        app.apply_aggregate(aggregate(1500.0), Instant::now());
        app.apply_addresses(vec![record("a", 100.0, 3, 2)]);
        app.toggle_expansion();

        let table_before = app.table.clone();
        let chart_labels_before = app.chains_chart.as_ref().unwrap().labels.clone();

        app.toggle_privacy();
        assert_eq!(app.table.rows[0].balance, crate::format::MASKED_AMOUNT);
        assert_ne!(
            app.chains_chart.as_ref().unwrap().labels,
            chart_labels_before
        );

        app.toggle_privacy();
        assert_eq!(app.table, table_before);
        assert_eq!(
            app.chains_chart.as_ref().unwrap().labels,
            chart_labels_before
        );
    }

    #[test]
    fn empty_address_list_is_ignored() {
        let mut app = test_app();
        app.apply_addresses(vec![record("a", 1.0, 0, 0)]);
        app.apply_addresses(Vec::new());
        assert_eq!(app.table.order(), ["a"]);
    }

    #[test]
    fn vanished_expansion_state_is_pruned() {
        let mut app = test_app();
        app.apply_addresses(vec![record("a", 1.0, 0, 0), record("b", 2.0, 0, 0)]);
        app.toggle_expansion();
        assert!(app.expanded.contains("a"));

        app.apply_addresses(vec![record("b", 2.0, 0, 0)]);
        assert!(app.expanded.is_empty());
    }
}
