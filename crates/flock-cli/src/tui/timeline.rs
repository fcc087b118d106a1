//! TUI timeline view.
//!
//! The interactive loop owns the engine's `TimelineController` on the UI
//! thread. Fetches run on a single worker thread: triggers emit
//! `FetchCommand`s over a channel, the worker executes them against the
//! REST client, and completed pages come back to be persisted and fed to
//! the controller as `FetchOutcome`s.
//!
//! Key bindings: j/k navigate, r refresh, m load older, enter open a
//! thread / fill a gap / retry a failed fetch, x reveal a content
//! warning, q quit.

use std::rc::Rc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::Duration;

use anyhow::{Context as _, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use tracing::warn;

use flock_core::error::FetchError;
use flock_core::fetch::{FetchCommand, FetchOutcome, Page, PageSummary};
use flock_core::model::{RenderItem, RevealState, StatusId};
use flock_core::pagination::PaginationState;
use flock_core::timeline::TimelineController;

use crate::api::{ApiClient, Context};
use crate::config::Config;
use crate::db::Store;

use super::thread::{ThreadAction, ThreadView};

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

enum WorkerRequest {
    Timeline(FetchCommand),
    Thread(StatusId),
}

enum WorkerReply {
    Timeline {
        command: FetchCommand,
        result: Result<Page, FetchError>,
    },
    Thread {
        focal: StatusId,
        result: Result<Context, FetchError>,
    },
}

/// Run fetches off the UI thread. The worker ends when the request
/// channel closes; a send failure after UI teardown is not an error.
fn spawn_worker(client: ApiClient, requests: Receiver<WorkerRequest>, replies: Sender<WorkerReply>) {
    std::thread::spawn(move || {
        for request in requests {
            let reply = match request {
                WorkerRequest::Timeline(command) => WorkerReply::Timeline {
                    result: command.execute(&client),
                    command,
                },
                WorkerRequest::Thread(focal) => WorkerReply::Thread {
                    result: client.fetch_context(&focal),
                    focal,
                },
            };
            if replies.send(reply).is_err() {
                break;
            }
        }
    });
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

struct App {
    store: Rc<Store>,
    controller: TimelineController<Rc<Store>>,
    requests: Sender<WorkerRequest>,
    replies: Receiver<WorkerReply>,
    selected: usize,
    thread: Option<ThreadView>,
    status_line: Option<String>,
    should_quit: bool,
}

impl App {
    fn issue(&mut self, command: Option<FetchCommand>) {
        if let Some(command) = command {
            if self.requests.send(WorkerRequest::Timeline(command)).is_err() {
                self.status_line = Some("fetch worker is gone".to_string());
            }
        }
    }

    /// Drain completed fetches: persist, notify, then apply the outcome.
    fn drain_replies(&mut self) {
        while let Ok(reply) = self.replies.try_recv() {
            match reply {
                WorkerReply::Timeline { command, result } => {
                    self.finish_timeline_fetch(&command, result);
                }
                WorkerReply::Thread { focal, result } => {
                    if let Some(view) = &mut self.thread {
                        if view.focal_id() == &focal {
                            view.apply_context(result);
                        }
                    }
                }
            }
        }
    }

    fn finish_timeline_fetch(&mut self, command: &FetchCommand, result: Result<Page, FetchError>) {
        let summary = match &result {
            Ok(page) => {
                if let Err(err) = self.persist(command, page) {
                    // Treat a failed write like a failed fetch: the
                    // machine lands in a retryable state.
                    warn!(error = %err, "failed to persist fetched page");
                    self.status_line = Some(format!("store write failed: {err}"));
                    Err(FetchError::Network(format!("persisting page: {err}")))
                } else {
                    self.controller.on_store_changed();
                    Ok(PageSummary::from(page))
                }
            }
            Err(err) => {
                self.status_line = Some(err.to_string());
                Err(err.clone())
            }
        };
        let outcome = match command {
            FetchCommand::Latest => FetchOutcome::Latest(summary),
            FetchCommand::Older { .. } => FetchOutcome::Older(summary),
            FetchCommand::Gap { anchor, .. } => FetchOutcome::Gap {
                anchor: anchor.clone(),
                result: summary,
            },
        };
        self.controller.apply_outcome(outcome);
        self.clamp_selection();
    }

    fn persist(&mut self, command: &FetchCommand, page: &Page) -> Result<()> {
        match command {
            FetchCommand::Latest => {
                if let Some(anchor) = self.store.insert_latest_page(page)? {
                    self.controller.note_gap_anchor(&anchor);
                }
            }
            FetchCommand::Older { .. } | FetchCommand::Gap { .. } => {
                self.store.insert_statuses(&page.statuses)?;
            }
        }
        Ok(())
    }

    fn on_key(&mut self, key: KeyEvent) {
        if let Some(view) = &mut self.thread {
            if matches!(view.on_key(key), ThreadAction::Close) {
                self.thread = None;
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => {
                if self.selected + 1 < self.controller.items().len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Char('r') => {
                let command = self.controller.trigger_refresh();
                self.issue(command);
            }
            KeyCode::Char('m') => {
                let command = self.controller.trigger_load_older();
                self.issue(command);
            }
            KeyCode::Char('x') => self.reveal_selected(),
            KeyCode::Enter => self.activate_selected(),
            _ => {}
        }
    }

    /// Enter acts on whatever sits under the cursor.
    fn activate_selected(&mut self) {
        let Some(item) = self.controller.items().get(self.selected).cloned() else {
            return;
        };
        match item {
            RenderItem::Content { id, .. } => {
                let view = ThreadView::new(id.clone());
                if self.requests.send(WorkerRequest::Thread(id)).is_ok() {
                    self.thread = Some(view);
                }
            }
            RenderItem::GapMarker { after } => {
                let command = self.controller.trigger_gap_fetch(&after);
                self.issue(command);
            }
            RenderItem::BottomLoader(PaginationState::Failed) => {
                let command = self.controller.trigger_retry();
                self.issue(command);
            }
            RenderItem::BottomLoader(_) | RenderItem::NoMoreMarker => {
                let command = self.controller.trigger_load_older();
                self.issue(command);
            }
            RenderItem::TopLoader | RenderItem::EmptyState(_) => {}
        }
    }

    fn reveal_selected(&mut self) {
        if let Some(RenderItem::Content { id, .. }) =
            self.controller.items().get(self.selected).cloned()
        {
            self.controller
                .set_attribute(&id, |attr| attr.reveal = attr.reveal.toggled());
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.controller.items().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    // -- rendering ----------------------------------------------------------

    fn render(&self, frame: &mut Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(frame.area());

        if let Some(view) = &self.thread {
            view.render(frame, chunks[0]);
        } else {
            self.render_timeline(frame, chunks[0]);
        }
        self.render_status_line(frame, chunks[1]);
    }

    fn render_timeline(&self, frame: &mut Frame<'_>, area: Rect) {
        let rows: Vec<ListItem<'_>> = self
            .controller
            .items()
            .iter()
            .map(|item| self.row(item))
            .collect();
        let mut state = ListState::default();
        state.select(Some(self.selected));
        let list = List::new(rows)
            .block(Block::default().borders(Borders::ALL).title("timeline"))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn row(&self, item: &RenderItem) -> ListItem<'_> {
        match item {
            RenderItem::Content { id, attribute } => {
                let Ok(Some(status)) = self.store.get(id) else {
                    return ListItem::new(Line::from(format!("<{id}>")));
                };
                let concealed =
                    status.sensitive && attribute.borrow().reveal == RevealState::Concealed;
                let body = if concealed {
                    format!("[CW: {}] (x to reveal)", status.spoiler_text)
                } else {
                    status.content.replace('\n', " ")
                };
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{}: ", status.account),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(body),
                ]))
            }
            RenderItem::GapMarker { .. } => ListItem::new(Line::from(Span::styled(
                "── missing statuses, enter to load ──",
                Style::default().fg(Color::Cyan),
            ))),
            RenderItem::TopLoader => ListItem::new(Line::from(Span::styled(
                "⟳ refreshing…",
                Style::default().fg(Color::Yellow),
            ))),
            RenderItem::BottomLoader(state) => {
                ListItem::new(Line::from(Span::styled(
                    bottom_loader_text(*state, self.controller.last_error()),
                    Style::default().fg(Color::DarkGray),
                )))
            }
            RenderItem::NoMoreMarker => ListItem::new(Line::from(Span::styled(
                "· end of timeline ·",
                Style::default().fg(Color::DarkGray),
            ))),
            RenderItem::EmptyState(reason) => ListItem::new(Line::from(Span::styled(
                reason.message(),
                Style::default().fg(Color::Red),
            ))),
        }
    }

    fn render_status_line(&self, frame: &mut Frame<'_>, area: Rect) {
        let text = self.status_line.as_ref().map_or_else(
            || {
                format!(
                    " {} | j/k move  r refresh  m older  enter open  x reveal  q quit",
                    self.controller.pagination_state()
                )
            },
            |line| format!(" {line}"),
        );
        frame.render_widget(Paragraph::new(text), area);
    }
}

fn bottom_loader_text(state: PaginationState, error: Option<&FetchError>) -> String {
    match state {
        PaginationState::LoadingLatest | PaginationState::LoadingOlder => "⟳ loading…".to_string(),
        PaginationState::Failed => error.map_or_else(
            || "✗ fetch failed, enter to retry".to_string(),
            |err| format!("✗ {err}, enter to retry"),
        ),
        _ => "· more below ·".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run_timeline_tui(config: &Config) -> Result<()> {
    let store = Rc::new(Store::open(&config.db_path())?);
    let controller = TimelineController::new(Rc::clone(&store));

    let (request_tx, request_rx) = channel();
    let (reply_tx, reply_rx) = channel();
    spawn_worker(ApiClient::new(config), request_rx, reply_tx);

    let mut app = App {
        store,
        controller,
        requests: request_tx,
        replies: reply_rx,
        selected: 0,
        thread: None,
        status_line: None,
        should_quit: false,
    };
    let first = app.controller.activate();
    app.issue(first);

    enable_raw_mode().context("enabling raw mode")?;
    execute!(std::io::stdout(), EnterAlternateScreen).context("entering alternate screen")?;
    let backend = CrosstermBackend::new(std::io::stdout());
    let mut terminal = Terminal::new(backend).context("creating terminal")?;

    let result = event_loop(&mut terminal, &mut app);

    disable_raw_mode().ok();
    execute!(std::io::stdout(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.drain_replies();
        terminal.draw(|frame| app.render(frame))?;

        if event::poll(Duration::from_millis(100)).context("polling input")? {
            if let Event::Key(key) = event::read().context("reading input")? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }
        if app.should_quit {
            return Ok(());
        }
    }
}
