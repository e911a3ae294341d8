//! Terminal UI rendering with ratatui

use tetrs_engine::board::{Cell, BOARD_HEIGHT, BOARD_WIDTH, SENTINEL_COL};
use tetrs_engine::game::{Game, GameState, FEEDBACK_TICKS};
use tetrs_engine::mode::{format_duration, GameMode, Outcome, RecordStore};
use tetrs_engine::settings::Settings;
use tetrs_engine::tetromino::{PieceKind, Rotation};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use std::time::Duration;

const EMPTY: &str = "  ";

/// Total width needed: hold(12) + board(22) + next/stats(18) = 52
const GAME_WIDTH: u16 = 52;
/// Total height needed: board(20) + 2 hidden rows + 2 for borders = 24
const GAME_HEIGHT: u16 = BOARD_HEIGHT as u16 + 2;
/// Pieces shown in the next queue
const PREVIEW_COUNT: usize = 6;

/// Standard guideline colors
fn piece_color(kind: PieceKind) -> Color {
    match kind {
        PieceKind::I => Color::Cyan,
        PieceKind::O => Color::Yellow,
        PieceKind::T => Color::Magenta,
        PieceKind::S => Color::Green,
        PieceKind::Z => Color::Red,
        PieceKind::J => Color::Blue,
        PieceKind::L => Color::LightRed,
    }
}

/// Render the entire game UI
pub fn render_game(frame: &mut Frame, game: &Game, settings: &Settings) {
    let area = frame.area();
    let (block_char, _) = settings.visual.block_chars();

    // Center the game area
    let game_area = center_rect(area, GAME_WIDTH, GAME_HEIGHT);

    // Create main layout: hold | board | next + stats
    let main_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(12),                              // Hold box
            Constraint::Length((BOARD_WIDTH as u16 - 1) * 2 + 2), // Board plus borders
            Constraint::Length(18),                              // Next queue + stats
        ])
        .split(game_area);

    render_hold(frame, main_layout[0], game, block_char);
    render_board(frame, main_layout[1], game, settings);

    // Right side: next queue and stats
    let right_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(PREVIEW_COUNT as u16 * 2 + 2),
            Constraint::Min(8),
        ])
        .split(main_layout[2]);

    render_next_queue(frame, right_layout[0], game.preview(PREVIEW_COUNT), block_char);
    render_stats(frame, right_layout[1], game, settings);

    match game.state() {
        GameState::Idle => render_overlay(
            frame,
            area,
            "TETRS",
            &[game.mode().description(), "Press R to start"],
        ),
        GameState::GameOver(Outcome::Won) => {
            let time = format!("Time: {}", game.mode_state().format_time());
            render_overlay(frame, area, "COMPLETE!", &[time.as_str(), "R restart  Q quit"]);
        }
        GameState::GameOver(Outcome::Lost) => {
            render_overlay(frame, area, "GAME OVER", &["R restart  Q quit"])
        }
        GameState::Active => {}
    }
}

/// Center a rect within another rect
fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Render the hold piece box, greyed out once hold has been used
fn render_hold(frame: &mut Frame, area: Rect, game: &Game, block_char: &str) {
    let block = Block::default()
        .title(" HOLD ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if let Some(kind) = game.held() {
        let color = if game.hold_available() {
            piece_color(kind)
        } else {
            Color::DarkGray
        };
        render_mini_piece(frame, inner, kind, color, block_char);
    }
}

/// Render the next piece queue
fn render_next_queue(frame: &mut Frame, area: Rect, queue: &[PieceKind], block_char: &str) {
    let block = Block::default()
        .title(" NEXT ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if queue.is_empty() {
        return;
    }

    let piece_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(2); queue.len()])
        .split(inner);

    for (slot, &kind) in piece_areas.iter().zip(queue) {
        render_mini_piece(frame, *slot, kind, piece_color(kind), block_char);
    }
}

/// Render a small piece preview (for hold and next queue)
fn render_mini_piece(frame: &mut Frame, area: Rect, kind: PieceKind, color: Color, block_char: &str) {
    if area.height < 1 || area.width < 4 {
        return;
    }

    let shape = kind.shape(Rotation::North);

    // Spawn shapes are at most 2 rows by 4 columns
    let min_row = shape.iter().map(|(r, _)| *r).min().unwrap_or(0);
    let min_col = shape.iter().map(|(_, c)| *c).min().unwrap_or(0);

    let lines: Vec<Line> = (0..2)
        .map(|row| {
            let spans: Vec<Span> = (0..4)
                .map(|col| {
                    if shape.contains(&(min_row + row, min_col + col)) {
                        Span::styled(block_char, Style::default().fg(color))
                    } else {
                        Span::raw(EMPTY)
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// Render the game board, hidden rows included
fn render_board(frame: &mut Frame, area: Rect, game: &Game, settings: &Settings) {
    let (block_char, ghost_char) = settings.visual.block_chars();
    let ghost_color = game
        .active()
        .map(|piece| piece_color(piece.kind))
        .unwrap_or(Color::DarkGray);

    let title = format!(" {} ", game.mode().name());
    let block = Block::default()
        .title(title)
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = game
        .cells()
        .chunks(BOARD_WIDTH)
        .map(|row| {
            let spans: Vec<Span> = row
                .iter()
                .skip(SENTINEL_COL + 1)
                .map(|cell| match cell {
                    Cell::Block(kind) => Span::styled(block_char, Style::default().fg(piece_color(*kind))),
                    Cell::Ghost if settings.visual.show_ghost => {
                        Span::styled(ghost_char, Style::default().fg(ghost_color).dim())
                    }
                    _ => Span::raw(EMPTY),
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn stat<'a>(label: &'a str, value: String, color: Color) -> [Line<'a>; 2] {
    [
        Line::from(Span::styled(label, Style::default().fg(Color::Gray))),
        Line::from(Span::styled(value, Style::default().fg(color).bold())),
    ]
}

/// Render stats panel
fn render_stats(frame: &mut Frame, area: Rect, game: &Game, settings: &Settings) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let score = game.score();
    let mut lines = Vec::new();

    // Mode-specific display
    match game.mode() {
        GameMode::Marathon => {
            lines.extend(stat("SCORE", score.points.to_string(), Color::Yellow));
            let best = settings
                .personal_best(GameMode::Marathon)
                .map_or("-".to_string(), |best| best.to_string());
            lines.extend(stat("BEST", best, Color::DarkGray));
        }
        GameMode::Sprint => {
            lines.extend(stat("TIME", game.mode_state().format_time(), Color::Yellow));
            let remaining = game.mode_state().lines_remaining(score.lines).unwrap_or(0);
            lines.extend(stat("LINES LEFT", remaining.to_string(), Color::Cyan));
            let best = settings
                .personal_best(GameMode::Sprint)
                .map_or("-".to_string(), |ms| format_duration(Duration::from_millis(ms)));
            lines.extend(stat("BEST", best, Color::DarkGray));
        }
    }

    lines.extend(stat("LINES", score.lines.to_string(), Color::Green));

    let mut streaks = Vec::new();
    if score.combo > 1 {
        streaks.push(format!("Combo {}", score.combo - 1));
    }
    if score.back_to_back {
        streaks.push("B2B".to_string());
    }
    lines.push(Line::styled(streaks.join(" "), Style::default().fg(Color::Cyan)));

    if let Some(feedback) = game.feedback() {
        // Fade out over the last third of its lifetime
        let style = Style::default().fg(Color::Magenta).bold();
        let style = if feedback.remaining * 3 < FEEDBACK_TICKS {
            style.dim()
        } else {
            style
        };
        lines.push(Line::styled(feedback.text.clone(), style));
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
}

/// Render an overlay (for idle/game over)
fn render_overlay(frame: &mut Frame, area: Rect, title: &str, subtitle: &[&str]) {
    let popup_width = 42u16;
    let popup_height = subtitle.len() as u16 + 4;
    let popup_area = center_rect(area, popup_width, popup_height);

    // Clear the background
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let mut text = vec![
        Line::styled(title, Style::default().fg(Color::Yellow).bold()),
        Line::raw(""),
    ];
    text.extend(
        subtitle
            .iter()
            .map(|line| Line::styled(*line, Style::default().fg(Color::Gray))),
    );

    let paragraph = Paragraph::new(text).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}
