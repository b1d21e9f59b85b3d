use crate::{
    canvas::MapCanvas,
    command::{Command, parse_command},
    transcript::{Tone, TranscriptLine, bubble_lines},
    view::{self, ViewSnap},
};
use anyhow::Result;
use crossterm::{
    event::{Event as CtEvent, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    io::{self, Stdout},
    time::{Duration, Instant},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wayfinder_config::{Theme, ThemeStore};
use wayfinder_planner::{
    ChatMessage, Controls, MapSurface, Sender, SessionError, SessionEvent, SessionHandle,
    SessionState,
};

const BRAILLE_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const TYPING: &str = "  Typing...";

pub enum TuiMsg {
    InputEvent(CtEvent),
    Tick,
    Submit(String),
    Session(SessionEvent),
    OpError(String),
    Shutdown,
}

pub struct TuiApp {
    // deps
    session: SessionHandle,
    themes: ThemeStore,
    cancel: CancellationToken,
    endpoint: String,

    // terminal
    term: Terminal<CrosstermBackend<Stdout>>,
    tick_rate: Duration,
    last_tick: Instant,
    restored: bool,

    // ui state
    input: String,
    input_cursor: usize,
    lines: Vec<TranscriptLine>, // transcript buffer
    scroll: usize,              // from bottom
    dirty: bool,
    theme: Theme,
    canvas: MapCanvas,

    // session mirror
    state: SessionState,
    controls: Controls,
    typing_at: Option<usize>,
    spin_idx: usize,
}

impl TuiApp {
    pub fn new(
        session: SessionHandle,
        themes: ThemeStore,
        cancel: CancellationToken,
        endpoint: impl Into<String>,
    ) -> Result<Self> {
        let theme = themes.load();
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut term = Terminal::new(backend)?;
        term.clear()?;

        Ok(Self {
            session,
            themes,
            cancel,
            endpoint: endpoint.into(),
            term,
            tick_rate: Duration::from_millis(80),
            last_tick: Instant::now(),
            restored: false,
            input: String::new(),
            input_cursor: 0,
            lines: vec![TranscriptLine::new(
                "Describe the trip you want, e.g. 'street food then a sunset view'. /help lists commands."
                    .into(),
                Tone::System,
            )],
            scroll: 0,
            dirty: true,
            theme,
            canvas: MapCanvas::default(),
            state: SessionState::Idle,
            controls: Controls {
                submit: true,
                reevaluate: false,
            },
            typing_at: None,
            spin_idx: 0,
        })
    }

    /// Process messages until `/quit`, Ctrl-C, or every sender is gone.
    pub async fn run(mut self, mut rx: mpsc::Receiver<TuiMsg>, me: mpsc::Sender<TuiMsg>) -> Result<()> {
        while let Some(msg) = rx.recv().await {
            if !self.handle(msg, &me)? {
                break;
            }
        }
        self.cancel.cancel();
        self.restore_terminal();
        Ok(())
    }

    fn restore_terminal(&mut self) {
        if self.restored {
            return;
        }
        disable_raw_mode().ok();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        self.restored = true;
    }

    fn cursor_left(&mut self) {
        if self.input_cursor == 0 {
            return;
        }
        self.input_cursor -= 1;
        while self.input_cursor > 0 && !self.input.is_char_boundary(self.input_cursor) {
            self.input_cursor -= 1;
        }
    }

    fn cursor_right(&mut self) {
        if self.input_cursor >= self.input.len() {
            return;
        }
        self.input_cursor += 1;
        while self.input_cursor < self.input.len()
            && !self.input.is_char_boundary(self.input_cursor)
        {
            self.input_cursor += 1;
        }
    }

    fn insert_char(&mut self, ch: char) {
        self.input.insert(self.input_cursor, ch);
        self.input_cursor += ch.len_utf8();
    }

    fn backspace(&mut self) {
        if self.input_cursor == 0 {
            return;
        }
        let mut prev = self.input_cursor.saturating_sub(1);
        while prev > 0 && !self.input.is_char_boundary(prev) {
            prev -= 1;
        }
        self.input.drain(prev..self.input_cursor);
        self.input_cursor = prev;
    }

    fn delete(&mut self) {
        if self.input_cursor >= self.input.len() {
            return;
        }
        let start = self.input_cursor;
        let mut end = start + 1;
        while end < self.input.len() && !self.input.is_char_boundary(end) {
            end += 1;
        }
        self.input.drain(start..end);
    }

    fn push<S: Into<String>>(&mut self, s: S, tone: Tone) {
        self.lines.push(TranscriptLine::new(s.into(), tone));
        self.dirty = true;
    }

    fn push_blank(&mut self) {
        self.push(String::new(), Tone::Value);
    }

    fn render_message(&mut self, msg: ChatMessage) {
        let (header, tone) = match msg.sender {
            Sender::User => (("→ [You]", Tone::UserHeader), Tone::UserText),
            Sender::Bot if msg.html.starts_with("Error:") => {
                (("← [Wayfinder]", Tone::BotHeader), Tone::Error)
            }
            Sender::Bot => (("← [Wayfinder]", Tone::BotHeader), Tone::BotText),
        };
        self.push(header.0, header.1);
        for line in bubble_lines(&msg.html) {
            self.push(line, tone);
        }
        self.push_blank();
    }

    fn on_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Message(msg) => self.render_message(msg),
            SessionEvent::Typing(true) => {
                self.typing_at = Some(self.lines.len());
                self.push(TYPING, Tone::Dim);
            }
            SessionEvent::Typing(false) => {
                if let Some(idx) = self.typing_at.take()
                    && self.lines.get(idx).is_some_and(|l| l.text == TYPING)
                {
                    self.lines.remove(idx);
                    self.dirty = true;
                }
            }
            SessionEvent::Alert(text) => {
                self.push(format!("× {text}"), Tone::Error);
                self.push_blank();
            }
            SessionEvent::State(state) => {
                self.state = state;
                self.dirty = true;
            }
            SessionEvent::Controls(controls) => {
                self.controls = controls;
                self.dirty = true;
            }
            SessionEvent::Map(op) => {
                self.canvas.apply(op);
                self.dirty = true;
            }
        }
    }

    fn busy(&self) -> bool {
        self.state != SessionState::Idle
    }

    fn spinner(&self) -> &'static str {
        if self.busy() {
            BRAILLE_FRAMES[self.spin_idx % BRAILLE_FRAMES.len()]
        } else {
            " "
        }
    }

    fn step_spinner(&mut self) {
        if self.busy() {
            self.spin_idx = (self.spin_idx + 1) % BRAILLE_FRAMES.len();
            self.dirty = true;
        }
    }

    fn status(&self) -> String {
        match self.state {
            SessionState::Idle => format!("Ready • {}", self.endpoint),
            SessionState::AwaitingLocation => "Finding your location".into(),
            SessionState::AwaitingBackend => "Planning your trip".into(),
            SessionState::Rendering => "Placing markers".into(),
        }
    }

    fn draw(&mut self) -> Result<()> {
        let status = self.status();
        let spinner = self.spinner();
        let snap = ViewSnap {
            input: self.input.clone(),
            input_cursor: self.input_cursor,
            lines: &self.lines,
            scroll: self.scroll,
            busy: self.busy(),
            spinner,
            status,
            reevaluate: self.controls.reevaluate,
            theme: self.theme,
            map: &self.canvas,
        };

        view::draw(&mut self.term, &snap)
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<TuiMsg> {
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL)
            | (KeyCode::Char('q'), KeyModifiers::CONTROL) => return Some(TuiMsg::Shutdown),
            (KeyCode::Char('r'), KeyModifiers::CONTROL) => {
                return Some(TuiMsg::Submit("/reeval".into()));
            }
            (KeyCode::PageUp, _) => self.scroll = self.scroll.saturating_add(5),
            (KeyCode::PageDown, _) => self.scroll = self.scroll.saturating_sub(5),
            (KeyCode::Up, _) => self.scroll = self.scroll.saturating_add(1),
            (KeyCode::Down, _) => self.scroll = self.scroll.saturating_sub(1),
            (KeyCode::Enter, _) => {
                let line = std::mem::take(&mut self.input);
                self.input_cursor = 0;
                self.dirty = true;
                return Some(TuiMsg::Submit(line));
            }
            (KeyCode::Left, _) => self.cursor_left(),
            (KeyCode::Right, _) => self.cursor_right(),
            (KeyCode::Home, _) => self.input_cursor = 0,
            (KeyCode::End, _) => self.input_cursor = self.input.len(),
            (KeyCode::Backspace, _) => self.backspace(),
            (KeyCode::Delete, _) => self.delete(),
            (KeyCode::Esc, _) => {
                self.input.clear();
                self.input_cursor = 0;
            }
            (KeyCode::Char(ch), _) => self.insert_char(ch),
            _ => return None,
        }
        self.dirty = true;
        None
    }

    fn route_submit(&mut self, line: String, me: &mpsc::Sender<TuiMsg>) {
        let s = line.trim().to_string();
        if s.starts_with('/') {
            self.handle_command(parse_command(&s), me);
            return;
        }
        // Empty prompts go through too; the session answers with an alert.
        if let Err(e) = self.session.submit(s) {
            self.refused(e);
        }
    }

    fn refused(&mut self, e: SessionError) {
        tracing::debug!(error = %e, "tui.command.refused");
        let text = match e {
            SessionError::Busy => "Still working on the last request.".to_string(),
            other => other.to_string(),
        };
        self.push(format!("× {text}"), Tone::Dim);
        self.push_blank();
    }

    fn toggle_theme(&mut self) {
        let next = self.theme.toggled();
        self.theme = next;
        self.dirty = true;
        match self.themes.save(next) {
            Ok(()) => self.push(format!("Theme: {next}"), Tone::System),
            Err(e) => {
                tracing::warn!(error = %e, path = %self.themes.path().display(), "theme.save.failed");
                self.push(format!("× Theme changed but not saved: {e}"), Tone::Error);
            }
        }
        self.push_blank();
    }

    fn handle_command(&mut self, cmd: Command, me: &mpsc::Sender<TuiMsg>) {
        match cmd {
            Command::Quit => {
                let _ = me.try_send(TuiMsg::Shutdown);
            }
            Command::Help => {
                self.push("Commands:", Tone::Label);
                self.push("  <text>          plan a trip from where you are", Tone::Value);
                self.push("  /reeval, ^R     ask again with the last request", Tone::Value);
                self.push("  /theme          switch between dark and light", Tone::Value);
                self.push("  /quit           exit", Tone::Value);
                self.push_blank();
            }
            Command::Reevaluate => {
                if !self.controls.reevaluate {
                    let why = if self.busy() {
                        "Still working on the last request."
                    } else {
                        "Nothing to re-evaluate. Send a request first."
                    };
                    self.push(format!("× {why}"), Tone::Dim);
                    self.push_blank();
                    return;
                }
                if let Err(e) = self.session.reevaluate() {
                    self.refused(e);
                }
            }
            Command::Theme => self.toggle_theme(),
            Command::Unknown(s) => {
                self.push(format!("× Unknown command: {s}"), Tone::Error);
                self.push("Try `/help`.", Tone::Dim);
                self.push_blank();
            }
        }
    }

    /// Returns `false` once the app should stop.
    fn handle(&mut self, msg: TuiMsg, me: &mpsc::Sender<TuiMsg>) -> Result<bool> {
        match msg {
            TuiMsg::InputEvent(ev) => {
                if let CtEvent::Key(k) = ev
                    && let Some(next) = self.handle_key(k)
                {
                    let _ = me.try_send(next);
                }
            }
            TuiMsg::Submit(line) => self.route_submit(line, me),
            TuiMsg::Session(event) => self.on_session_event(event),
            TuiMsg::OpError(e) => {
                self.push(format!("× Error: {e}"), Tone::Error);
                self.push_blank();
            }
            TuiMsg::Tick => {
                self.step_spinner();
                if self.dirty || self.last_tick.elapsed() >= self.tick_rate {
                    self.draw()?;
                    self.last_tick = Instant::now();
                    self.dirty = false;
                }
            }
            TuiMsg::Shutdown => {
                self.cancel.cancel();
                self.restore_terminal();
                return Ok(false);
            }
        }

        Ok(true)
    }
}

impl Drop for TuiApp {
    fn drop(&mut self) {
        self.restore_terminal();
    }
}
