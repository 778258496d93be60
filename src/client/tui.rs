//! Interactive terminal console.
//!
//! Renders the transcript, a single-line command input, and a status bar.
//! Submitted commands go through the [`Console`] state machine; each
//! dispatch runs as a spawned task and reports its outcome over a channel
//! that the draw loop drains every tick.

use std::collections::BTreeMap;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use crate::client::http::ConsoleClient;
use crate::config::{ActionConfig, Config};
use crate::console::{Console, RequestOutcome, SubmitAction};
use crate::transcript::{LineKind, Transcript};

/// Action fired by the Ctrl+P binding.
const PING_ACTION: &str = "ping";

/// Rows jumped by PageUp/PageDown.
const SCROLL_PAGE: u16 = 10;

/// Events delivered back to the draw loop by spawned request tasks.
enum UiEvent {
    /// Outcome of a dispatched query, tagged with its submission seq.
    Query(u64, RequestOutcome),
    /// Status text from a named action; replaces the status line.
    Action(String),
}

/// Run the interactive console until the user quits.
pub async fn run(config: Config, client: ConsoleClient) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_console_loop(&mut terminal, config, client).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_console_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    config: Config,
    client: ConsoleClient,
) -> Result<()> {
    let mut ui = ConsoleUi::new(&config, client);
    let (tx, mut rx) = mpsc::unbounded_channel::<UiEvent>();

    loop {
        // Apply outcomes that arrived since the last tick.
        while let Ok(event) = rx.try_recv() {
            ui.apply(event);
        }

        terminal.draw(|frame| ui.draw(frame))?;

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
            match key.code {
                KeyCode::Esc => return Ok(()),
                KeyCode::Char('c') if ctrl => return Ok(()),
                KeyCode::Char('l') if ctrl => ui.clear_transcript(),
                KeyCode::Char('p') if ctrl => ui.fire_action(PING_ACTION, &tx),
                KeyCode::Enter => ui.submit(&tx),
                KeyCode::PageUp => ui.scroll_up(SCROLL_PAGE),
                KeyCode::PageDown => ui.scroll_down(SCROLL_PAGE),
                _ => {
                    ui.input.handle_event(&Event::Key(key));
                }
            }
        }
    }
}

struct ConsoleUi {
    console: Console,
    input: Input,
    client: Arc<ConsoleClient>,
    actions: BTreeMap<String, ActionConfig>,
    scroll: u16,
    /// Whether the transcript view is pinned to its bottom.
    follow: bool,
}

impl ConsoleUi {
    fn new(config: &Config, client: ConsoleClient) -> Self {
        Self {
            console: Console::new(config.console.ordering),
            input: Input::default(),
            client: Arc::new(client),
            actions: config.actions.clone(),
            scroll: 0,
            follow: true,
        }
    }

    /// Submit the input field. The field is cleared at submit time, before
    /// any response arrives.
    fn submit(&mut self, tx: &mpsc::UnboundedSender<UiEvent>) {
        let raw = self.input.value().to_string();
        self.input.reset();
        self.follow = true;

        match self.console.submit(&raw) {
            SubmitAction::ClearedLocal => {}
            SubmitAction::Dispatch(submission) => {
                let client = Arc::clone(&self.client);
                let tx = tx.clone();
                tokio::spawn(async move {
                    let outcome = match client.query(&submission.command).await {
                        Ok(payload) => RequestOutcome::Success(payload),
                        Err(err) => err.into_outcome(),
                    };
                    let _ = tx.send(UiEvent::Query(submission.seq, outcome));
                });
            }
        }
    }

    /// Fire a named action; its response replaces the status line.
    fn fire_action(&mut self, name: &str, tx: &mpsc::UnboundedSender<UiEvent>) {
        let Some(action) = self.actions.get(name).cloned() else {
            self.console.set_status(format!("no action named '{name}'"));
            return;
        };
        let client = Arc::clone(&self.client);
        let tx = tx.clone();
        tokio::spawn(async move {
            let text = match client.action(&action.cmd, action.val).await {
                Ok(payload) => payload,
                Err(err) => err.to_string(),
            };
            let _ = tx.send(UiEvent::Action(text));
        });
    }

    fn clear_transcript(&mut self) {
        self.console.clear();
        self.scroll = 0;
        self.follow = true;
    }

    fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::Query(seq, outcome) => {
                self.console.apply_outcome(seq, outcome);
                self.follow = true;
            }
            UiEvent::Action(text) => self.console.set_status(text),
        }
    }

    fn scroll_up(&mut self, rows: u16) {
        self.follow = false;
        self.scroll = self.scroll.saturating_sub(rows);
    }

    fn scroll_down(&mut self, rows: u16) {
        self.scroll = self.scroll.saturating_add(rows);
    }

    fn draw(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // transcript
                Constraint::Length(3), // input
                Constraint::Length(1), // status
            ])
            .split(frame.area());

        self.draw_transcript(frame, chunks[0]);
        self.draw_input(frame, chunks[1]);
        self.draw_status(frame, chunks[2]);
    }

    fn draw_transcript(&mut self, frame: &mut Frame, area: Rect) {
        let transcript = self.console.transcript();
        let rows = transcript_rows(transcript);
        let viewport = area.height.saturating_sub(2); // borders
        let bottom = autoscroll_offset(transcript.display_height() as u16, viewport);

        if self.follow {
            self.scroll = bottom;
        } else {
            self.scroll = self.scroll.min(bottom);
            if self.scroll == bottom {
                self.follow = true;
            }
        }

        let view = Paragraph::new(rows)
            .block(
                Block::default()
                    .title(" console ")
                    .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .scroll((self.scroll, 0));
        frame.render_widget(view, area);
    }

    fn draw_input(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" cmd ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        // Scroll the input if the cursor is beyond the visible width.
        let width = inner.width as usize;
        let cursor = self.input.visual_cursor();
        let skip = if cursor >= width { cursor - width + 1 } else { 0 };
        let visible: String = self.input.value().chars().skip(skip).take(width).collect();

        let input = Paragraph::new(Line::from(Span::styled(
            visible,
            Style::default().fg(Color::White),
        )));
        frame.render_widget(input, inner);

        frame.set_cursor_position((inner.x + (cursor - skip) as u16, inner.y));
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let pending = self.console.pending();
        let pending_span = if pending > 0 {
            Span::styled(
                format!("{pending} pending"),
                Style::default().fg(Color::Yellow),
            )
        } else {
            Span::styled("idle", Style::default().fg(Color::Green))
        };

        // The status line is a single row; collapse any newlines in the
        // action payload.
        let status_text = self.console.status().replace('\n', " ");

        let status = Paragraph::new(Line::from(vec![
            Span::raw(" "),
            pending_span,
            Span::raw(" | "),
            Span::styled("Ctrl+P", Style::default().fg(Color::Yellow)),
            Span::raw(" ping | "),
            Span::styled("Ctrl+L", Style::default().fg(Color::Yellow)),
            Span::raw(" clear | "),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::raw(" quit | "),
            Span::raw(status_text),
        ]));
        frame.render_widget(status, area);
    }
}

/// Scroll offset that pins the view to the transcript bottom: content height
/// minus viewport height, saturating at zero.
fn autoscroll_offset(content_rows: u16, viewport_rows: u16) -> u16 {
    content_rows.saturating_sub(viewport_rows)
}

/// Project transcript entries onto display rows, one styled row per line of
/// text. Empty entries still occupy a row.
fn transcript_rows(transcript: &Transcript) -> Vec<Line<'_>> {
    let mut rows = Vec::new();
    for entry in transcript.lines() {
        let style = line_style(entry.kind);
        let mut pushed = false;
        for text in entry.text.lines() {
            rows.push(Line::from(Span::styled(text, style)));
            pushed = true;
        }
        if !pushed {
            rows.push(Line::from(Span::styled("", style)));
        }
    }
    rows
}

fn line_style(kind: LineKind) -> Style {
    match kind {
        LineKind::Command => Style::default().fg(Color::Cyan),
        LineKind::Response => Style::default(),
        LineKind::Failure => Style::default().fg(Color::Red),
        LineKind::Timeout => Style::default().fg(Color::Yellow),
    }
}
