use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    layout::Position,
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};
use std::io::stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedSender};

use crate::app::{App, Card, FetchOutcome, Focus};
use crate::browser::{LinkOpener, SystemOpener};
use crate::fetch::ResultFetcher;

const ACCENT: Color = Color::Rgb(0x64, 0xb6, 0x87);
const TICK: Duration = Duration::from_millis(50);
const CARD_MAX_WIDTH: u16 = 44;
const CARD_HEIGHT: u16 = 9;

pub async fn run(fetcher: ResultFetcher, mut app: App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut app, Arc::new(fetcher), &SystemOpener).await;

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    fetcher: Arc<ResultFetcher>,
    opener: &dyn LinkOpener,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<FetchOutcome>();

    loop {
        while let Ok(outcome) = rx.try_recv() {
            app.fetch_settled(outcome);
        }
        app.tick(Instant::now());

        terminal.draw(|frame| draw(frame, app))?;

        if !event::poll(TICK)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            break;
        }

        match app.focus {
            Focus::Query => match key.code {
                KeyCode::Esc => break,
                KeyCode::Enter => spawn_fetch(app, &fetcher, &tx),
                KeyCode::Tab | KeyCode::Down => app.enter_grid(),
                KeyCode::Backspace => {
                    app.query.pop();
                }
                KeyCode::Char(c) => app.query.push(c),
                _ => {}
            },
            Focus::Grid => {
                let cols = grid_columns(terminal.size()?.width) as isize;
                match key.code {
                    KeyCode::Char('q') => break,
                    KeyCode::Esc | KeyCode::Tab => app.leave_grid(),
                    KeyCode::Left | KeyCode::Char('h') => app.hover_move(-1),
                    KeyCode::Right | KeyCode::Char('l') => app.hover_move(1),
                    KeyCode::Up | KeyCode::Char('k') => app.hover_move(-cols),
                    KeyCode::Down | KeyCode::Char('j') => app.hover_move(cols),
                    KeyCode::Enter | KeyCode::Char('o') => app.activate(opener),
                    _ => {}
                }
            }
        }
    }
    Ok(())
}

/// Starts the loader and the fetch together; the task reports back over
/// the channel tagged with its generation.
fn spawn_fetch(app: &mut App, fetcher: &Arc<ResultFetcher>, tx: &UnboundedSender<FetchOutcome>) {
    let generation = app.submit();
    let fetcher = Arc::clone(fetcher);
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = fetcher.fetch().await;
        let _ = tx.send(FetchOutcome { generation, result });
    });
}

fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // header
            Constraint::Length(3), // query input
            Constraint::Length(1), // loader
            Constraint::Min(0),    // card grid
            Constraint::Length(1), // status / help
        ])
        .split(frame.area());

    draw_header(frame, chunks[0]);
    draw_query(frame, app, chunks[1]);
    draw_loader(frame, app, chunks[2]);
    draw_grid(frame, app, chunks[3]);
    draw_footer(frame, app, chunks[4]);
}

fn draw_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(
            "JobGrid",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" - Search Engine", Style::default().add_modifier(Modifier::BOLD)),
    ]);
    frame.render_widget(Paragraph::new(title).alignment(Alignment::Center), area);
}

fn draw_query(frame: &mut Frame, app: &App, area: Rect) {
    let border_style = if app.focus == Focus::Query {
        Style::default().fg(ACCENT)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let input = Paragraph::new(app.query.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" Search "),
    );
    frame.render_widget(input, area);

    if app.focus == Focus::Query {
        let x = (area.x + 1 + app.query.chars().count() as u16)
            .min(area.right().saturating_sub(2));
        frame.set_cursor_position(Position::new(x, area.y + 1));
    }
}

fn draw_loader(frame: &mut Frame, app: &App, area: Rect) {
    let Some(elapsed) = app.loading_elapsed(Instant::now()) else {
        return;
    };
    frame.render_widget(Paragraph::new(loader_line(area.width, elapsed)), area);
}

/// Thin indeterminate sweep: a bright segment chasing across a dim rule.
fn loader_line(width: u16, elapsed: Duration) -> Line<'static> {
    let width = width as usize;
    if width == 0 {
        return Line::raw("");
    }
    let segment = (width / 5).max(1);
    let head = (elapsed.as_millis() / 40) as usize % width;
    let start = head.saturating_sub(segment);

    let dim = Style::default().fg(Color::DarkGray);
    let bright = Style::default().fg(ACCENT);
    Line::from(vec![
        Span::styled("─".repeat(start), dim),
        Span::styled("━".repeat(head - start), bright),
        Span::styled("─".repeat(width - head), dim),
    ])
}

fn draw_grid(frame: &mut Frame, app: &App, area: Rect) {
    if app.cards.is_empty() || area.height < CARD_HEIGHT {
        return;
    }
    let cols = grid_columns(area.width);
    let card_width = (area.width / cols as u16).min(CARD_MAX_WIDTH);
    let visible_rows = (area.height / CARD_HEIGHT).max(1) as usize;
    let total_rows = app.cards.len().div_ceil(cols);

    // Scroll so the hovered card's row stays on screen.
    let hovered_row = app.hovered.unwrap_or(0) / cols;
    let first_row = hovered_row
        .saturating_sub(visible_rows - 1)
        .min(total_rows.saturating_sub(visible_rows));

    for card in &app.cards {
        let row = card.index / cols;
        if row < first_row || row >= first_row + visible_rows {
            continue;
        }
        let rect = Rect {
            x: area.x + (card.index % cols) as u16 * card_width,
            y: area.y + (row - first_row) as u16 * CARD_HEIGHT,
            width: card_width,
            height: CARD_HEIGHT,
        };
        draw_card(frame, app, card, rect);
    }
}

fn draw_card(frame: &mut Frame, app: &App, card: &Card, area: Rect) {
    // Opacity 0 is hidden outright; anything below full renders dimmed.
    if card.opacity <= 0.0 {
        return;
    }
    let dimmed = card.opacity < 1.0;
    let hovered = app.hovered == Some(card.index);

    let border_style = if hovered {
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
    } else if dimmed {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
    } else {
        Style::default().fg(ACCENT)
    };
    let text_style = if dimmed {
        Style::default().add_modifier(Modifier::DIM)
    } else {
        Style::default()
    };

    let block = Block::default().borders(Borders::ALL).border_style(border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(
        Paragraph::new(card_lines(card, inner.width)).style(text_style),
        inner,
    );
}

fn card_lines(card: &Card, width: u16) -> Vec<Line<'_>> {
    let label = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Title: ", label),
            Span::raw(card.listing.title.as_str()),
        ]),
        Line::from(vec![
            Span::styled("Employer: ", label),
            Span::raw(card.listing.employer.as_str()),
        ]),
        Line::from(vec![
            Span::styled("Employment Type: ", label),
            Span::raw(card.listing.employment_type.as_str()),
        ]),
        Line::from(Span::styled("Description: ", label)),
    ];
    let wrapped = textwrap::fill(&card.listing.description, width.max(1) as usize);
    for text in wrapped.lines().take(3) {
        lines.push(Line::from(text.to_string()));
    }
    lines
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let line = match &app.status {
        Some(status) => Line::styled(status.as_str(), Style::default().fg(Color::Yellow)),
        None => Line::styled(
            " type a query  Enter:search  Tab:cards  h/j/k/l:move  o:open link  Esc:back  q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn grid_columns(width: u16) -> usize {
    (width / CARD_MAX_WIDTH).max(1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_columns_scale_with_width() {
        assert_eq!(grid_columns(30), 1);
        assert_eq!(grid_columns(100), 2);
        assert_eq!(grid_columns(200), 4);
    }

    #[test]
    fn test_loader_line_spans_full_width() {
        for ms in [0u64, 500, 2_000, 10_000] {
            let line = loader_line(80, Duration::from_millis(ms));
            let chars: usize = line.spans.iter().map(|s| s.content.chars().count()).sum();
            assert_eq!(chars, 80, "at {ms}ms");
        }
    }
}
