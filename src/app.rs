use anyhow::{Context, Result};
use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::completion::ProfileSnapshot;
use crate::config::Config;
use crate::progress::{AutoSaveEvent, AutoSaveScheduler, ProgressRestorer};
use crate::store::PersistenceStore;
use crate::ui::terminal_guard::{install_panic_hook, TerminalGuard};
use crate::wizard::{OnboardingWizard, ProgressSidebar};

const SIDEBAR_WIDTH: u16 = 36;

/// Interactive terminal front-end for the onboarding wizard
pub struct App {
    wizard: OnboardingWizard,
    /// JSON file the profile is (re)loaded from with `r`
    profile_path: Option<PathBuf>,
    /// Sidebar row under the keyboard cursor
    selected: usize,
    /// Where the sidebar was last drawn, for mapping mouse clicks
    sidebar_area: Rect,
    status_message: Option<String>,
    last_saved_at: Option<i64>,
    save_events: mpsc::UnboundedReceiver<AutoSaveEvent>,
    tick_rate: Duration,
    should_quit: bool,
}

impl App {
    pub fn new(
        config: &Config,
        store: Arc<dyn PersistenceStore>,
        identity: Option<String>,
        profile_path: Option<PathBuf>,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let autosave = AutoSaveScheduler::from_config(Arc::clone(&store), &config.autosave)
            .with_events(tx);
        let restorer = ProgressRestorer::from_config(store, &config.autosave);
        let mut wizard = OnboardingWizard::mount(identity, autosave, &restorer);

        let mut status_message = wizard
            .restored_at()
            .map(|_| "Resumed saved progress".to_string());

        // A profile file only seeds the wizard when there was nothing to resume
        if wizard.restored_at().is_none() {
            if let Some(ref path) = profile_path {
                wizard.replace_profile(load_profile(path)?);
                status_message = Some(format!("Loaded profile from {}", path.display()));
            }
        }

        let selected = wizard.current_index();
        Ok(Self {
            wizard,
            profile_path,
            selected,
            sidebar_area: Rect::default(),
            status_message,
            last_saved_at: None,
            save_events: rx,
            tick_rate: Duration::from_millis(config.ui.tick_rate_ms),
            should_quit: false,
        })
    }

    pub fn wizard(&self) -> &OnboardingWizard {
        &self.wizard
    }

    pub async fn run(&mut self) -> Result<()> {
        install_panic_hook();
        let (_guard, mut terminal) = TerminalGuard::enter()?;

        while !self.should_quit {
            self.drain_save_events();
            terminal.draw(|f| self.render(f))?;

            if event::poll(self.tick_rate)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key.code)?;
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }
        }

        Ok(())
    }

    fn drain_save_events(&mut self) {
        while let Ok(event) = self.save_events.try_recv() {
            match event {
                AutoSaveEvent::Saved {
                    saved_at_epoch_ms, ..
                } => self.last_saved_at = Some(saved_at_epoch_ms),
                AutoSaveEvent::Failed { .. } => {
                    self.status_message = Some("Progress could not be saved".to_string());
                }
            }
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<()> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.wizard.steps().len() {
                    self.selected += 1;
                }
            }
            KeyCode::Enter => self.click(self.selected),
            KeyCode::Right | KeyCode::Char('n') => self.advance(),
            KeyCode::Char('b') => {
                self.wizard.mark_benefits_calculated();
                self.status_message = Some("Benefits estimate recorded".to_string());
            }
            KeyCode::Char('r') => self.reload_profile()?,
            KeyCode::Char('s') => self.submit(),
            _ => {}
        }
        Ok(())
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let sidebar = ProgressSidebar::new(self.wizard.steps(), self.wizard.current_index());
        if let Some(index) = sidebar.row_at(self.sidebar_area, mouse.column, mouse.row) {
            self.selected = index;
            self.click(index);
        }
    }

    fn click(&mut self, index: usize) {
        let sidebar = ProgressSidebar::new(self.wizard.steps(), self.wizard.current_index());
        if let Some(intent) = sidebar.click(index) {
            self.wizard.navigate(intent);
            self.status_message = None;
        }
    }

    fn advance(&mut self) {
        if self.wizard.complete_current_step() {
            self.selected = self.wizard.current_index();
            self.status_message = None;
        } else {
            let step = self.wizard.current_step().name.clone();
            self.status_message = Some(format!("{} still needs input", step));
        }
    }

    fn submit(&mut self) {
        match self.wizard.submit() {
            Ok(()) => {
                self.selected = self.wizard.current_index();
                self.status_message = Some("Onboarding complete".to_string());
            }
            Err(index) => {
                let step = self.wizard.steps()[index].name.clone();
                self.status_message = Some(format!("Finish {} before submitting", step));
            }
        }
    }

    fn reload_profile(&mut self) -> Result<()> {
        let Some(path) = self.profile_path.clone() else {
            self.status_message = Some("No profile file given (--profile)".to_string());
            return Ok(());
        };
        match load_profile(&path) {
            Ok(profile) => {
                self.wizard.replace_profile(profile);
                self.status_message = Some(format!("Reloaded {}", path.display()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Profile reload failed");
                self.status_message = Some(format!("Reload failed: {}", e));
            }
        }
        Ok(())
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
            .split(frame.area());

        self.sidebar_area = chunks[0];
        ProgressSidebar::new(self.wizard.steps(), self.wizard.current_index())
            .selected(Some(self.selected))
            .focused(true)
            .render(frame, chunks[0]);

        self.render_detail(frame, chunks[1]);
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect) {
        let completion = self.wizard.completion();
        let block = Block::default()
            .title(format!(" {} ", self.wizard.current_step().name))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Gray));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(1), // Heading
                Constraint::Length(1), // Completeness bar
                Constraint::Length(1), // Spacer
                Constraint::Min(4),    // Sections
                Constraint::Length(1), // Status
                Constraint::Length(1), // Help
            ])
            .split(inner);

        let heading = Line::from(vec![
            Span::styled(
                "Profile completeness ",
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                completion.level().label(),
                Style::default().fg(Color::Yellow),
            ),
        ]);
        frame.render_widget(Paragraph::new(heading), chunks[0]);

        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
            .percent(u16::from(completion.percentage))
            .label(format!("{}%", completion.percentage));
        frame.render_widget(gauge, chunks[1]);

        let mut lines: Vec<Line> = Vec::new();
        if let Some(next) = completion.next_action() {
            lines.push(Line::from(vec![
                Span::styled("Next: ", Style::default().fg(Color::Cyan)),
                Span::raw(
                    next.suggested_action
                        .clone()
                        .unwrap_or_else(|| next.title.clone()),
                ),
                Span::styled(
                    format!("  (+{}%)", next.weight),
                    Style::default().fg(Color::DarkGray),
                ),
            ]));
            lines.push(Line::from(""));
        }
        for section in &completion.breakdown {
            let (icon, color) = if section.completed {
                ("✓", Color::Green)
            } else {
                ("·", Color::DarkGray)
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{} ", icon), Style::default().fg(color)),
                Span::raw(format!("{:<30}", section.label)),
                Span::styled(
                    format!("{:>3}%", section.weight),
                    Style::default().fg(Color::DarkGray),
                ),
            ]));
        }
        frame.render_widget(
            Paragraph::new(lines).wrap(Wrap { trim: false }),
            chunks[3],
        );

        let saved = match self.last_saved_at.or(self.wizard.restored_at()) {
            Some(ms) => chrono::DateTime::from_timestamp_millis(ms)
                .map(|t| format!("Saved {}", t.format("%H:%M:%S")))
                .unwrap_or_default(),
            None => "Not saved yet".to_string(),
        };
        let status = self
            .status_message
            .as_ref()
            .map(|m| format!("{}  |  {}", m, saved))
            .unwrap_or(saved);
        frame.render_widget(
            Paragraph::new(Span::styled(status, Style::default().fg(Color::Yellow))),
            chunks[4],
        );

        let help = "↑/↓ select  Enter jump  n continue  b benefits  r reload  s submit  q quit";
        frame.render_widget(
            Paragraph::new(Span::styled(help, Style::default().fg(Color::DarkGray))),
            chunks[5],
        );
    }
}

/// Read a profile JSON file
pub fn load_profile(path: &Path) -> Result<ProfileSnapshot> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile file {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse profile file {}", path.display()))
}
