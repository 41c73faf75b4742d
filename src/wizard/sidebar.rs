//! Sidebar listing the wizard steps with a step-progress bar.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use super::navigation::{self, NavigationIntent, Step, StepView};

/// Rows above the step list: progress bar plus a spacer
const HEADER_ROWS: u16 = 2;

/// Presentation adapter over the navigation model.
///
/// Holds borrowed props only; build a fresh one for every frame.
pub struct ProgressSidebar<'a> {
    steps: &'a [Step],
    current_index: usize,
    /// Row under the keyboard cursor, if any
    selected: Option<usize>,
    focused: bool,
}

impl<'a> ProgressSidebar<'a> {
    pub fn new(steps: &'a [Step], current_index: usize) -> Self {
        Self {
            steps,
            current_index,
            selected: None,
            focused: false,
        }
    }

    pub fn selected(mut self, selected: Option<usize>) -> Self {
        self.selected = selected;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Step-completion percentage shown in the bar
    pub fn progress_percentage(&self) -> u8 {
        navigation::progress_percentage(self.steps)
    }

    pub fn views(&self) -> Vec<StepView> {
        navigation::step_views(self.steps, self.current_index)
    }

    /// Navigation intent for a click on step `index`, if it is allowed
    pub fn click(&self, index: usize) -> Option<NavigationIntent> {
        navigation::click(self.steps, index, self.current_index)
    }

    /// Step index under terminal cell (`column`, `row`) when rendered in `area`
    pub fn row_at(&self, area: Rect, column: u16, row: u16) -> Option<usize> {
        let inner = Block::default().borders(Borders::ALL).inner(area);
        let list_top = inner.y + HEADER_ROWS;
        if column < inner.x || column >= inner.x + inner.width {
            return None;
        }
        if row < list_top || row >= inner.y + inner.height {
            return None;
        }
        let index = usize::from(row - list_top);
        (index < self.steps.len()).then_some(index)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::Gray)
        };

        let block = Block::default()
            .title(" Onboarding ")
            .borders(Borders::ALL)
            .border_style(border_style);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Progress bar
                Constraint::Length(1), // Spacer
                Constraint::Min(0),    // Steps
            ])
            .split(inner);

        let percent = self.progress_percentage();
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
            .percent(u16::from(percent))
            .label(format!("{}% of steps", percent));
        frame.render_widget(gauge, chunks[0]);

        let lines: Vec<Line> = self
            .views()
            .iter()
            .map(|view| self.step_line(view))
            .collect();
        frame.render_widget(Paragraph::new(lines), chunks[2]);
    }

    fn step_line(&self, view: &StepView) -> Line<'static> {
        let (icon, mut style) = if view.is_current {
            (
                "▶",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        } else if view.completed {
            ("✓", Style::default().fg(Color::Green))
        } else if view.navigable {
            ("○", Style::default().fg(Color::White))
        } else {
            // Rendered disabled; clicks are ignored
            ("○", Style::default().fg(Color::DarkGray))
        };

        if self.selected == Some(view.index) {
            style = style.add_modifier(Modifier::REVERSED);
        }

        let mut spans = vec![
            Span::styled(format!("{} ", icon), style),
            Span::styled(view.name.clone(), style),
        ];
        if let Some(ref summary) = view.summary {
            spans.push(Span::styled(
                format!("  {}", summary),
                Style::default().fg(Color::DarkGray),
            ));
        }
        Line::from(spans)
    }
}
