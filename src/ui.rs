//! Layout and drawing: carousel, boards, pause, game over, quit menu, caption.

use crate::app::{QuitOption, Screen, Session};
use crate::carousel::{Carousel, GameKind, TILES};
use crate::engine::Status;
use crate::runner::{self, RunnerGame};
use crate::snake::{self, Point, SnakeGame};
use crate::tetris::{self, Cell, TetrisGame};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget, Wrap};
use std::fmt::Display;
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

const SIDEBAR_WIDTH: u16 = 18;
const TILE_W: u16 = 24;
const TILE_H: u16 = 9;
/// Runner scene in terminal cells; each cell is two half-block pixels tall.
const RUNNER_COLS: u16 = 68;
const RUNNER_ROWS: u16 = 12;
/// Scene units per half-block pixel, vertically.
const RUNNER_UNIT_Y: f32 = 8.0;
const GAME_OVER_FADE_MS: u32 = 600;

/// Everything the renderer reads for one frame.
pub struct Scene<'a> {
    pub screen: Screen,
    pub theme: &'a Theme,
    pub carousel: &'a Carousel,
    pub session: Option<&'a Session>,
    pub caption: Option<&'a str>,
    pub quit_selected: QuitOption,
}

/// Game-over fade, created on the first game-over frame and cleared on restart.
#[derive(Default)]
pub struct Fade {
    effect: Option<Effect>,
    last: Option<Instant>,
}

impl Fade {
    pub fn clear(&mut self) {
        self.effect = None;
        self.last = None;
    }
}

pub fn draw(frame: &mut Frame, scene: &Scene, fade: &mut Fade, now: Instant) {
    let theme = scene.theme;
    let area = frame.area();
    Block::default()
        .style(Style::default().bg(theme.bg))
        .render(area, frame.buffer_mut());

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Fill(1), Constraint::Length(1)])
        .split(area);
    let (body, caption_row) = (rows[0], rows[1]);

    match (scene.screen, scene.session) {
        (Screen::Menu, _) | (_, None) => draw_menu(frame, theme, scene.carousel, body),
        (screen, Some(session)) => {
            let board = draw_game(frame, theme, session, body);
            match session.game().status() {
                Status::GameOver => {
                    apply_game_over_fade(frame, theme, board, fade, now);
                    draw_game_over(frame, theme, session, board);
                }
                Status::Paused => draw_pause_overlay(frame, theme, board),
                Status::Idle | Status::Running => {}
            }
            if screen == Screen::QuitMenu {
                draw_quit_menu(frame, theme, scene.quit_selected);
            }
        }
    }

    if let Some(text) = scene.caption {
        Paragraph::new(Line::from(Span::styled(
            format!("« {text} »"),
            Style::default().fg(theme.title).bold(),
        )))
        .alignment(Alignment::Center)
        .render(caption_row, frame.buffer_mut());
    }
}

fn centered(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn clear_rect(buf: &mut Buffer, rect: Rect, bg: Color) {
    let rect = rect.intersection(buf.area);
    for y in rect.top()..rect.bottom() {
        for x in rect.left()..rect.right() {
            buf[(x, y)].set_symbol(" ").set_style(Style::default().bg(bg));
        }
    }
}

/// Two vertical pixels per cell: `color_at(x, py)` with `py` in half-rows.
fn paint_half_blocks(buf: &mut Buffer, rect: Rect, color_at: impl Fn(u16, u16) -> Color) {
    for ty in 0..rect.height {
        for x in 0..rect.width {
            let top = color_at(x, ty * 2);
            let bot = color_at(x, ty * 2 + 1);
            buf[(rect.x + x, rect.y + ty)]
                .set_symbol("▀")
                .set_style(Style::default().fg(top).bg(bot));
        }
    }
}

fn draw_menu(frame: &mut Frame, theme: &Theme, carousel: &Carousel, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(2),
            Constraint::Length(TILE_H),
            Constraint::Length(2),
            Constraint::Fill(1),
        ])
        .split(area);

    let title = Line::from(vec![
        Span::styled(" play", Style::default().fg(theme.blocks[6]).bold()),
        Span::styled("room ", Style::default().fg(theme.main_fg).bold()),
    ]);
    Paragraph::new(title)
        .alignment(Alignment::Center)
        .render(rows[1], frame.buffer_mut());

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(TILE_W),
            Constraint::Length(TILE_W),
            Constraint::Length(TILE_W),
            Constraint::Fill(1),
        ])
        .split(rows[2]);

    for (i, tile) in TILES.iter().enumerate() {
        let active = carousel.is_active(i);
        let accent = theme.blocks[(i * 2) % theme.blocks.len()];
        let (border, label, text) = if active {
            (
                Style::default().fg(accent).bold(),
                Style::default().fg(theme.bg).bg(accent).bold(),
                theme.main_fg,
            )
        } else {
            (
                Style::default().fg(theme.inactive_fg),
                Style::default().fg(theme.inactive_fg),
                theme.inactive_fg,
            )
        };
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(tile.blurb, Style::default().fg(text))),
            Line::from(""),
            Line::from(Span::styled(
                if active { "▶ ENTER to play" } else { "" },
                Style::default().fg(accent),
            )),
        ];
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border.bg(theme.bg))
                    .title(Span::styled(format!(" {} ", tile.title), label)),
            )
            .render(cols[i + 1], frame.buffer_mut());
    }

    Paragraph::new(Line::from(Span::styled(
        "←/→ choose    ENTER play    Q quit",
        Style::default().fg(theme.inactive_fg),
    )))
    .alignment(Alignment::Center)
    .render(rows[3], frame.buffer_mut());
}

/// (board width, board height, sidebar width) in terminal cells, borders included.
fn board_size(kind: GameKind) -> (u16, u16, u16) {
    match kind {
        GameKind::Snake => (
            snake::GRID_W as u16 + 2,
            (snake::GRID_H as u16).div_ceil(2) + 2,
            SIDEBAR_WIDTH,
        ),
        GameKind::Tetris => (
            tetris::BOARD_W as u16 * 2 + 2,
            tetris::BOARD_H as u16 + 2,
            SIDEBAR_WIDTH,
        ),
        GameKind::Runner => (RUNNER_COLS + 2, RUNNER_ROWS + 2, 0),
    }
}

/// Board, sidebar and key hints centred in `area`. Returns the board rect.
fn draw_game(frame: &mut Frame, theme: &Theme, session: &Session, area: Rect) -> Rect {
    let kind = session.kind();
    let (bw, bh, sw) = board_size(kind);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(bw + sw),
            Constraint::Fill(1),
        ])
        .split(area);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(bh),
            Constraint::Length(1),
            Constraint::Fill(1),
        ])
        .split(cols[1]);

    let board = Rect {
        width: bw.min(rows[1].width),
        ..rows[1]
    };
    let sidebar = Rect {
        x: board.right(),
        width: rows[1].width.saturating_sub(board.width),
        ..rows[1]
    };

    let tile = kind.tile();
    let title = match session {
        Session::Runner(g) => format!(
            " {}  Score {}  Speed {:.1} ",
            tile.title,
            g.score(),
            g.speed()
        ),
        _ => format!(" {} ", tile.title),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, theme.title));
    let inner = block.inner(board);
    block.render(board, frame.buffer_mut());

    let buf = frame.buffer_mut();
    match session {
        Session::Snake(g) => draw_snake(buf, theme, g, inner),
        Session::Tetris(g) => draw_tetris(buf, theme, g, inner),
        Session::Runner(g) => draw_runner(buf, theme, g, inner),
    }
    if sidebar.width > 0 {
        draw_sidebar(frame, theme, session, sidebar);
    }

    let hint = Rect {
        x: area.x,
        width: area.width,
        ..rows[2]
    };
    Paragraph::new(Line::from(Span::styled(
        format!("{}    S start  P pause  R reset  N step  ESC games", tile.controls),
        Style::default().fg(theme.inactive_fg),
    )))
    .alignment(Alignment::Center)
    .render(hint, frame.buffer_mut());

    board
}

fn draw_snake(buf: &mut Buffer, theme: &Theme, game: &SnakeGame, area: Rect) {
    let w = snake::GRID_W as usize;
    let mut grid = vec![theme.bg; w * snake::GRID_H as usize];
    let mut paint = |p: Point, color: Color| {
        if (0..snake::GRID_W).contains(&p.x) && (0..snake::GRID_H).contains(&p.y) {
            grid[p.y as usize * w + p.x as usize] = color;
        }
    };
    paint(game.food(), theme.food);
    for p in game.body() {
        paint(p, theme.snake_body);
    }
    paint(game.head(), theme.snake_head);

    paint_half_blocks(buf, area, |x, y| {
        let x = usize::from(x);
        if x >= w {
            return theme.bg;
        }
        grid.get(usize::from(y) * w + x).copied().unwrap_or(theme.bg)
    });
}

/// Two terminal columns per cell; ghost cells drawn light in the piece colour.
fn draw_tetris(buf: &mut Buffer, theme: &Theme, game: &TetrisGame, area: Rect) {
    let board = game.display_board();
    let ghost: Vec<(i32, i32)> = match (game.piece(), game.ghost_y()) {
        (Some(piece), Some(gy)) => piece
            .board_cells()
            .map(|(x, y)| (x, y + gy - piece.y))
            .collect(),
        _ => Vec::new(),
    };
    let ghost_color = game
        .piece()
        .map_or(theme.inactive_fg, |p| theme.block_color(p.kind.color_id()));

    for (y, row) in board.rows().enumerate() {
        let ry = area.y + y as u16;
        if ry >= area.bottom() {
            break;
        }
        for (x, cell) in row.iter().enumerate() {
            let rx = area.x + 2 * x as u16;
            if rx + 2 > area.right() {
                break;
            }
            let (symbol, fg) = match cell {
                Cell::Filled(_) => ("██", theme.block_color(cell.color_id())),
                Cell::Empty if ghost.contains(&(x as i32, y as i32)) => ("░░", ghost_color),
                Cell::Empty => (" ·", theme.div_line),
            };
            buf.set_string(rx, ry, symbol, Style::default().fg(fg).bg(theme.bg));
        }
    }
}

fn draw_runner(buf: &mut Buffer, theme: &Theme, game: &RunnerGame, area: Rect) {
    let unit_x = runner::SCENE_W / f32::from(RUNNER_COLS);
    let half_rows = RUNNER_ROWS * 2;
    let feet = game.runner_y();
    paint_half_blocks(buf, area, |cx, py| {
        // Sample the centre of the pixel; height counts up from the bottom edge.
        let x = (f32::from(cx) + 0.5) * unit_x;
        let h = (f32::from(half_rows.saturating_sub(py + 1)) + 0.5) * RUNNER_UNIT_Y;
        let in_runner = (runner::RUNNER_X..runner::RUNNER_X + runner::RUNNER_W).contains(&x)
            && (feet..feet + runner::RUNNER_H).contains(&h);
        if in_runner {
            theme.runner
        } else if game
            .obstacles()
            .iter()
            .any(|o| (o.x..o.x + o.w).contains(&x) && h < o.h)
        {
            theme.obstacle
        } else {
            theme.bg
        }
    });
}

fn stat(theme: &Theme, label: &str, value: impl Display) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {label:<7}"), Style::default().fg(theme.inactive_fg)),
        Span::styled(value.to_string(), Style::default().fg(theme.main_fg).bold()),
    ])
}

fn heading_arrow(d: snake::Direction) -> &'static str {
    match d {
        snake::Direction::Up => "↑",
        snake::Direction::Down => "↓",
        snake::Direction::Left => "←",
        snake::Direction::Right => "→",
    }
}

fn status_hint(status: Status) -> &'static str {
    match status {
        Status::Idle => " SPACE to start",
        Status::Running => "",
        Status::Paused => " Paused",
        Status::GameOver => " Game over",
    }
}

fn draw_sidebar(frame: &mut Frame, theme: &Theme, session: &Session, area: Rect) {
    let stats_area = if let Session::Tetris(g) = session {
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Fill(1)])
            .split(area);
        draw_next_preview(frame, theme, g, parts[0]);
        parts[1]
    } else {
        area
    };

    let mut lines = vec![Line::from("")];
    match session {
        Session::Snake(g) => {
            lines.push(stat(theme, "Score", g.score()));
            lines.push(stat(theme, "Length", g.len()));
            lines.push(stat(theme, "Heading", heading_arrow(g.heading())));
        }
        Session::Tetris(g) => {
            lines.push(stat(theme, "Score", g.score()));
            lines.push(stat(theme, "Lines", g.lines()));
            lines.push(stat(theme, "Level", g.level()));
        }
        // The runner scene spans the whole row; its stats live in the title.
        Session::Runner(_) => {}
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        status_hint(session.game().status()),
        Style::default().fg(theme.title).bold(),
    )));
    Paragraph::new(lines).render(stats_area, frame.buffer_mut());
}

fn draw_next_preview(frame: &mut Frame, theme: &Theme, game: &TetrisGame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" Next ", theme.title));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let kind = game.next_kind();
    let color = theme.block_color(kind.color_id());
    let buf = frame.buffer_mut();
    for (dx, dy) in kind.shape().cells() {
        let rx = inner.x + 1 + 2 * dx as u16;
        let ry = inner.y + dy as u16;
        if rx + 2 <= inner.right() && ry < inner.bottom() {
            buf.set_string(rx, ry, "██", Style::default().fg(color).bg(theme.bg));
        }
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, board: Rect) {
    let popup = centered(board, 20, 5);
    clear_rect(frame.buffer_mut(), popup, theme.bg);
    let lines = vec![
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P resume ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

/// Grey the board out behind the game-over panel.
fn apply_game_over_fade(
    frame: &mut Frame,
    theme: &Theme,
    board: Rect,
    fade: &mut Fade,
    now: Instant,
) {
    let delta = fade
        .last
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    fade.last = Some(now);

    let effect = fade.effect.get_or_insert_with(|| {
        fx::fade_to(
            theme.inactive_fg,
            theme.div_line,
            (GAME_OVER_FADE_MS, Interpolation::Linear),
        )
        .with_area(board)
    });
    frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
}

fn draw_game_over(frame: &mut Frame, theme: &Theme, session: &Session, board: Rect) {
    let progress = session.game().progress();
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Score: {} ", progress.score),
            Style::default().fg(theme.main_fg),
        )),
    ];
    if session.kind() == GameKind::Tetris {
        lines.push(Line::from(Span::styled(
            format!(" Lines: {} ", progress.lines),
            Style::default().fg(theme.main_fg),
        )));
    }
    lines.push(Line::from(""));
    for hint in [" SPACE again ", " ESC games "] {
        lines.push(Line::from(Span::styled(
            hint,
            Style::default().fg(theme.main_fg),
        )));
    }
    let popup = centered(board, 20, lines.len() as u16 + 2);
    clear_rect(frame.buffer_mut(), popup, theme.bg);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .title(Span::styled(" playroom ", theme.title)),
        )
        .render(popup, frame.buffer_mut());
}

pub fn draw_quit_menu(frame: &mut Frame, theme: &Theme, selected: QuitOption) {
    let quit_rect = centered(frame.area(), 24, 8);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title))
        .title(" Quit? ");

    clear_rect(frame.buffer_mut(), quit_rect, theme.bg);
    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    let options = [
        (QuitOption::Resume, " Resume "),
        (QuitOption::Carousel, " Games "),
        (QuitOption::Exit, " Exit "),
    ];
    for (i, (opt, label)) in options.iter().enumerate() {
        let style = if *opt == selected {
            Style::default().fg(theme.bg).bg(theme.title).bold()
        } else {
            Style::default().fg(theme.title)
        };
        let rx = inner.x + inner.width.saturating_sub(label.len() as u16) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        if ry < inner.bottom() {
            frame.buffer_mut().set_string(rx, ry, label, style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Game;
    use crate::rng::GameRng;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn render(scene: &Scene) -> String {
        let mut terminal = Terminal::new(TestBackend::new(90, 30)).unwrap();
        let mut fade = Fade::default();
        terminal
            .draw(|f| draw(f, scene, &mut fade, Instant::now()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn scene<'a>(
        screen: Screen,
        theme: &'a Theme,
        carousel: &'a Carousel,
        session: Option<&'a Session>,
    ) -> Scene<'a> {
        Scene {
            screen,
            theme,
            carousel,
            session,
            caption: None,
            quit_selected: QuitOption::Resume,
        }
    }

    #[test]
    fn menu_lists_every_tile() {
        let theme = Theme::default();
        let carousel = Carousel::default();
        let text = render(&scene(Screen::Menu, &theme, &carousel, None));
        for tile in &TILES {
            assert!(text.contains(tile.title), "{} missing", tile.title);
        }
        assert!(text.contains("ENTER to play"));
    }

    #[test]
    fn idle_tetris_shows_stats_and_caption() {
        let theme = Theme::default();
        let carousel = Carousel::default();
        let session = Session::Tetris(TetrisGame::new(GameRng::new(1)));
        let mut s = scene(Screen::Playing, &theme, &carousel, Some(&session));
        s.caption = Some("hello");
        let text = render(&s);
        assert!(text.contains("Next"));
        assert!(text.contains("Level"));
        assert!(text.contains("SPACE to start"));
        assert!(text.contains("« hello »"));
    }

    #[test]
    fn snake_sidebar_shows_heading_and_runner_title_shows_speed() {
        let theme = Theme::default();
        let carousel = Carousel::default();
        let session = Session::Snake(SnakeGame::new(GameRng::new(3)));
        let text = render(&scene(Screen::Playing, &theme, &carousel, Some(&session)));
        assert!(text.contains("Length"));
        assert!(text.contains("→"));

        let session = Session::Runner(RunnerGame::new(GameRng::new(3)));
        let text = render(&scene(Screen::Playing, &theme, &carousel, Some(&session)));
        assert!(text.contains("Speed"));
        assert!(text.contains("2.1"));
    }

    #[test]
    fn game_over_panel() {
        let theme = Theme::default();
        let carousel = Carousel::default();
        let mut game = SnakeGame::new(GameRng::new(2));
        game.start();
        while !game.status().is_game_over() {
            game.step();
        }
        let session = Session::Snake(game);
        let text = render(&scene(Screen::Playing, &theme, &carousel, Some(&session)));
        assert!(text.contains("Game Over"));
        assert!(text.contains("SPACE again"));
    }

    #[test]
    fn quit_menu_over_the_board() {
        let theme = Theme::default();
        let carousel = Carousel::default();
        let session = Session::Runner(RunnerGame::new(GameRng::new(4)));
        let text = render(&scene(Screen::QuitMenu, &theme, &carousel, Some(&session)));
        assert!(text.contains("Quit?"));
        assert!(text.contains("Resume"));
        assert!(text.contains("Exit"));
    }

    #[test]
    fn runner_scene_paints_the_runner() {
        let theme = Theme::default();
        let mut buf = Buffer::empty(Rect::new(0, 0, RUNNER_COLS, RUNNER_ROWS));
        let area = buf.area;
        let game = RunnerGame::new(GameRng::new(3));
        draw_runner(&mut buf, &theme, &game, area);
        // Bottom row, at the runner's column: both halves are runner.
        let col = (runner::RUNNER_X / (runner::SCENE_W / f32::from(RUNNER_COLS))) as u16 + 1;
        let cell = &buf[(col, RUNNER_ROWS - 1)];
        assert_eq!(cell.fg, theme.runner);
        assert_eq!(cell.bg, theme.runner);
        assert_eq!(buf[(0, RUNNER_ROWS - 1)].fg, theme.bg);
    }
}
