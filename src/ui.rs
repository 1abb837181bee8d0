//! Layout and drawing: board, falling piece, sidebar, pause and game-over overlays.

use crate::app::Screen;
use crate::board::{COLUMNS, Cell, ROWS};
use crate::game::GameState;
use crate::piece::Piece;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Each board cell is two terminal columns wide so cells look square.
const CELL_WIDTH: u16 = 2;
const SIDEBAR_WIDTH: u16 = 24;

/// Flash length for one cleared row; more rows flash longer.
const LINE_CLEAR_FLASH_MS: u32 = 180;

const NEXT_PREVIEW_ROWS: u16 = 4;

/// Board with border, in terminal cells.
fn board_outer_size() -> (u16, u16) {
    (COLUMNS as u16 * CELL_WIDTH + 2, ROWS as u16 + 2)
}

/// Split the screen into centred board and sidebar rects.
fn game_layout(area: Rect) -> (Rect, Rect) {
    let (bw, bh) = board_outer_size();
    let total_w = bw + SIDEBAR_WIDTH;

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(bh),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(bw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    (inner[0], inner[1])
}

/// Board cells only (inside the border).
fn board_inner_rect(area: Rect) -> Rect {
    let (board_outer, _) = game_layout(area);
    Block::default().borders(Borders::ALL).inner(board_outer)
}

/// Colour of board cell (x, y) with the falling piece drawn on top; None when empty.
fn cell_color(
    state: &GameState,
    theme: &Theme,
    piece_cells: &HashSet<(i32, i32)>,
    (x, y): (usize, usize),
    cell: Cell,
) -> Option<Color> {
    if piece_cells.contains(&(x as i32, y as i32)) {
        return Some(theme.piece_color(state.current().kind));
    }
    match cell {
        Cell::Filled(kind) => Some(theme.piece_color(kind)),
        Cell::Empty => None,
    }
}

/// Flash effect started when rows are cleared.
pub fn line_clear_flash(theme: &Theme, rows: u32) -> Effect {
    let ms = LINE_CLEAR_FLASH_MS * rows.clamp(1, 4);
    fx::fade_from(theme.main_fg, theme.main_fg, (ms, Interpolation::Linear))
}

/// Draw the whole frame for the current screen and advance the line-clear flash.
pub fn draw(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    screen: Screen,
    line_clear_effect: &mut Option<Effect>,
    line_clear_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let area = frame.area();
    Block::default()
        .style(Style::default().bg(theme.bg))
        .render(area, frame.buffer_mut());

    let (board_area, sidebar_area) = game_layout(area);
    draw_board(frame, state, theme, board_area);
    draw_sidebar(frame, state, theme, sidebar_area);

    if line_clear_effect.is_some() {
        apply_line_clear_effect(frame, area, line_clear_effect, line_clear_process_time, now);
    }

    match screen {
        Screen::Playing => {}
        Screen::Paused => draw_pause_overlay(frame, theme, board_area),
        Screen::GameOver => draw_game_over(frame, state, theme, board_area),
    }
}

fn apply_line_clear_effect(
    frame: &mut Frame,
    area: Rect,
    line_clear_effect: &mut Option<Effect>,
    line_clear_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let board_rect = board_inner_rect(area);
    let delta = line_clear_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    *line_clear_process_time = Some(now);

    if let Some(effect) = line_clear_effect {
        frame.render_effect(effect, board_rect, TfxDuration::from_millis(delta_ms));
    }
}

fn draw_board(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border).bg(theme.bg))
        .title(Span::styled(" Blockfall ", Style::default().fg(theme.title)));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let piece_cells: HashSet<(i32, i32)> = state.current().cells_at(0, 0).collect();
    let buf = frame.buffer_mut();
    for (y, row) in state.board().rows().enumerate() {
        for (x, &cell) in row.iter().enumerate() {
            let rx = inner.x + x as u16 * CELL_WIDTH;
            let ry = inner.y + y as u16;
            if rx + 1 >= inner.x + inner.width || ry >= inner.y + inner.height {
                continue;
            }
            let (symbols, style) = match cell_color(state, theme, &piece_cells, (x, y), cell) {
                Some(color) => (["█", "█"], Style::default().fg(color).bg(theme.bg)),
                None => ([" ", "·"], Style::default().fg(theme.grid).bg(theme.bg)),
            };
            buf[(rx, ry)].set_symbol(symbols[0]).set_style(style);
            buf[(rx + 1, ry)].set_symbol(symbols[1]).set_style(style);
        }
    }
}

fn draw_sidebar(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.border).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(NEXT_PREVIEW_ROWS + 3), // Next (border + title + preview)
            Constraint::Length(7),                     // Stats
            Constraint::Min(0),                        // Controls
        ])
        .split(area);

    // --- Next ---
    let next_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(" Next ", title_style));
    let next_inner = next_block.inner(chunks[0]);
    next_block.render(chunks[0], frame.buffer_mut());
    draw_piece_preview(frame, theme, state.next(), next_inner);

    // --- Stats ---
    let stats_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let stats_inner = stats_block.inner(chunks[1]);
    stats_block.render(chunks[1], frame.buffer_mut());
    let stat = |label: &'static str, value: u32| {
        Line::from(vec![
            Span::styled(label, title_style),
            Span::styled(value.to_string(), fg_style),
        ])
    };
    Paragraph::new(Text::from(vec![
        stat("Score: ", state.score()),
        stat("Level: ", state.level()),
        stat("Lines: ", state.lines_cleared()),
        stat("Pieces: ", state.pieces_locked()),
        Line::from(vec![
            Span::styled("Speed: ", title_style),
            Span::styled(format!("{} ms", state.fall_interval_ms()), fg_style),
        ]),
    ]))
    .render(stats_inner, frame.buffer_mut());

    // --- Controls ---
    let controls = vec![
        Line::from(Span::styled("←/→  move", fg_style)),
        Line::from(Span::styled("↑    rotate", fg_style)),
        Line::from(Span::styled("↓    soft drop", fg_style)),
        Line::from(Span::styled("Spc  hard drop", fg_style)),
        Line::from(Span::styled("P    pause", fg_style)),
        Line::from(Span::styled("Q    quit", fg_style)),
    ];
    Paragraph::new(controls)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style),
        )
        .render(chunks[2], frame.buffer_mut());
}

/// Draw a piece's current shape centred in `area`.
fn draw_piece_preview(frame: &mut Frame, theme: &Theme, piece: &Piece, area: Rect) {
    let shape = piece.current_shape();
    let color = theme.piece_color(piece.kind);
    let bw = shape.cols() as u16 * CELL_WIDTH;
    let bh = shape.rows() as u16;
    let off_x = area.width.saturating_sub(bw) / 2;
    let off_y = area.height.saturating_sub(bh) / 2;

    for (r, c) in shape.occupied() {
        let rect = Rect {
            x: area.x + off_x + c as u16 * CELL_WIDTH,
            y: area.y + off_y + r as u16,
            width: CELL_WIDTH,
            height: 1,
        }
        .intersection(area);
        Paragraph::new("██")
            .style(Style::default().fg(color).bg(theme.bg))
            .render(rect, frame.buffer_mut());
    }
}

fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, board_area: Rect) {
    let popup = centered_popup(board_area, 18, 5);
    let lines = vec![
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled("P resume", Style::default().fg(theme.main_fg))),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border).bg(theme.bg)),
        )
        .style(Style::default().bg(theme.bg))
        .render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, state: &GameState, theme: &Theme, board_area: Rect) {
    let popup = centered_popup(board_area, 20, 9);
    let lines = vec![
        Line::from(Span::styled(
            " GAME OVER ",
            Style::default()
                .fg(Color::White)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("Score: {}", state.score()),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            format!("Level: {}", state.level()),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled("Any key  restart", Style::default().fg(theme.main_fg))),
        Line::from(Span::styled("Q  quit", Style::default().fg(theme.main_fg))),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border).bg(theme.bg)),
        )
        .style(Style::default().bg(theme.bg))
        .render(popup, frame.buffer_mut());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::PieceKind;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn render(state: &GameState, screen: Screen, effect: &mut Option<Effect>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 26)).unwrap();
        let theme = Theme::classic();
        let mut process_time = None;
        terminal
            .draw(|f| draw(f, state, &theme, screen, effect, &mut process_time, Instant::now()))
            .unwrap();
        let buf = terminal.backend().buffer();
        let width = buf.area.width as usize;
        buf.content
            .chunks(width)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn playing_screen_shows_board_and_stats() {
        let state = GameState::with_seed(3);
        let out = render(&state, Screen::Playing, &mut None);
        assert!(out.contains("Blockfall"));
        assert!(out.contains("Next"));
        assert!(out.contains("Score: 0"));
        assert!(out.contains("Level: 1"));
        // current piece (4 cells) plus next preview (4 cells), two columns each
        assert_eq!(out.matches('█').count(), 16);
        assert!(!out.contains("GAME OVER"));
    }

    #[test]
    fn overlays_follow_screen() {
        let state = GameState::with_seed(3);
        assert!(render(&state, Screen::Paused, &mut None).contains("Paused"));
        let over = render(&state, Screen::GameOver, &mut None);
        assert!(over.contains("GAME OVER"));
        assert!(over.contains("Any key  restart"));
        assert!(over.contains("Q  quit"));
    }

    #[test]
    fn board_grid_and_speed_are_drawn() {
        let mut state = GameState::with_seed(3);
        state.hard_drop();
        let out = render(&state, Screen::Playing, &mut None);
        // locked piece, new current piece and next preview
        assert_eq!(out.matches('█').count(), 24);
        assert!(out.contains("Speed: 1000 ms"));
        assert!(out.contains("Pieces: 1"));
    }

    #[test]
    fn cell_color_prefers_piece_then_board() {
        let state = GameState::with_seed(11);
        let theme = Theme::classic();
        let piece_cells: HashSet<(i32, i32)> = state.current().cells_at(0, 0).collect();
        let &(px, py) = piece_cells.iter().next().unwrap();
        assert_eq!(
            cell_color(&state, &theme, &piece_cells, (px as usize, py as usize), Cell::Empty),
            Some(theme.piece_color(state.current().kind))
        );
        assert_eq!(
            cell_color(&state, &theme, &piece_cells, (0, ROWS - 1), Cell::Empty),
            None
        );
        assert_eq!(
            cell_color(&state, &theme, &piece_cells, (0, ROWS - 1), Cell::Filled(PieceKind::Z)),
            Some(theme.piece_color(PieceKind::Z))
        );
    }

    #[test]
    fn flash_effect_renders_and_finishes() {
        let state = GameState::with_seed(3);
        let mut effect = Some(line_clear_flash(&Theme::classic(), 2));
        let _ = render(&state, Screen::Playing, &mut effect);
        assert!(effect.as_ref().is_some_and(|e| !e.done()));
    }

    #[test]
    fn layout_fits_standard_terminal() {
        let (board, sidebar) = game_layout(Rect::new(0, 0, 80, 24));
        assert_eq!((board.width, board.height), board_outer_size());
        assert_eq!(sidebar.width, SIDEBAR_WIDTH);
        assert_eq!(sidebar.x, board.x + board.width);
    }
}
