//! App: terminal init, main loop, clock and key handling.

use crate::GameConfig;
use crate::announce::{Herald, cues};
use crate::carousel::{Carousel, GameKind};
use crate::engine::{Game, Ticker, sync_ticker};
use crate::input::{Action, key_to_action};
use crate::rng::GameRng;
use crate::runner::RunnerGame;
use crate::snake::{Direction, SnakeGame};
use crate::tetris::TetrisGame;
use crate::theme::Theme;
use crate::ui::{Fade, Scene};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    Carousel,
    Exit,
}

impl QuitOption {
    fn down(self) -> Self {
        match self {
            Self::Resume => Self::Carousel,
            Self::Carousel => Self::Exit,
            Self::Exit => Self::Resume,
        }
    }

    fn up(self) -> Self {
        match self {
            Self::Resume => Self::Exit,
            Self::Carousel => Self::Resume,
            Self::Exit => Self::Carousel,
        }
    }
}

/// The mounted engine. Exactly one exists while a game screen is up.
#[derive(Debug, Clone)]
pub enum Session {
    Snake(SnakeGame),
    Tetris(TetrisGame),
    Runner(RunnerGame),
}

impl Session {
    fn mount(kind: GameKind, rng: GameRng) -> Self {
        match kind {
            GameKind::Snake => Self::Snake(SnakeGame::new(rng)),
            GameKind::Tetris => Self::Tetris(TetrisGame::new(rng)),
            GameKind::Runner => Self::Runner(RunnerGame::new(rng)),
        }
    }

    pub fn kind(&self) -> GameKind {
        match self {
            Self::Snake(_) => GameKind::Snake,
            Self::Tetris(_) => GameKind::Tetris,
            Self::Runner(_) => GameKind::Runner,
        }
    }

    pub fn game(&self) -> &dyn Game {
        match self {
            Self::Snake(g) => g,
            Self::Tetris(g) => g,
            Self::Runner(g) => g,
        }
    }

    fn game_mut(&mut self) -> &mut dyn Game {
        match self {
            Self::Snake(g) => g,
            Self::Tetris(g) => g,
            Self::Runner(g) => g,
        }
    }

    /// Arrow keys while the game runs.
    fn direction(&mut self, action: Action) {
        match self {
            Self::Snake(g) => {
                let d = match action {
                    Action::Up => Direction::Up,
                    Action::Down => Direction::Down,
                    Action::Left => Direction::Left,
                    Action::Right => Direction::Right,
                    _ => return,
                };
                g.set_direction(d);
            }
            Self::Tetris(g) => match action {
                Action::Left => g.move_left(),
                Action::Right => g.move_right(),
                Action::Up => g.rotate(),
                Action::Down => g.soft_drop(),
                _ => {}
            },
            Self::Runner(g) => {
                if action == Action::Up {
                    g.jump();
                }
            }
        }
    }

    /// Space / Enter: slam or jump mid-game, otherwise (re)start.
    fn primary(&mut self) {
        if !self.game().status().is_running() {
            self.game_mut().start();
            if let Self::Runner(g) = self {
                g.jump();
            }
            return;
        }
        match self {
            Self::Tetris(g) => g.hard_drop(),
            Self::Runner(g) => g.jump(),
            Self::Snake(_) => {}
        }
    }
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    screen: Screen,
    carousel: Carousel,
    session: Option<Session>,
    /// Present iff the session's engine is running.
    ticker: Option<Ticker>,
    herald: Herald,
    rng: GameRng,
    quit_selected: QuitOption,
    /// The quit menu parked a running game; Resume starts it again.
    resume_on_close: bool,
    fade: Fade,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Self {
        let rng = config.seed.map_or_else(GameRng::from_entropy, GameRng::new);
        log::info!("session seed {}", rng.seed());
        let mut app = Self {
            herald: Herald::new(config.mute),
            carousel: config.game.map(Carousel::focused_on).unwrap_or_default(),
            config,
            theme,
            screen: Screen::Menu,
            session: None,
            ticker: None,
            rng,
            quit_selected: QuitOption::Resume,
            resume_on_close: false,
            fade: Fade::default(),
        };
        if let Some(kind) = app.config.game {
            app.mount(kind);
        }
        app
    }

    fn mount(&mut self, kind: GameKind) {
        let rng = self.rng.fork();
        log::info!("mounting {kind:?} (seed {})", rng.seed());
        self.session = Some(Session::mount(kind, rng));
        self.ticker = None;
        self.fade.clear();
        self.herald.hush();
        self.screen = Screen::Playing;
    }

    /// Back to the carousel; the engine and its ticker go with it.
    fn unmount(&mut self) {
        if let Some(session) = self.session.take() {
            log::info!("unmounting {:?}", session.kind());
        }
        self.ticker = None;
        self.fade.clear();
        self.herald.hush();
        self.screen = Screen::Menu;
    }

    /// Run one engine operation, then turn the progress diff into cues and
    /// bring the ticker in line with the new status.
    fn drive(&mut self, now: Instant, op: impl FnOnce(&mut Session)) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let kind = session.kind();
        let before = session.game().progress();
        op(session);
        let after = session.game().progress();
        if before.status != after.status {
            log::info!("{kind:?}: {:?} -> {:?}", before.status, after.status);
            if !after.status.is_game_over() {
                self.fade.clear();
            }
        }
        for cue in cues(kind, before, after) {
            cue.play(&mut self.herald);
        }
        sync_ticker(&mut self.ticker, session.game(), now);
    }

    /// Returns true when the app should exit.
    fn handle_action(&mut self, action: Action, now: Instant) -> bool {
        match self.screen {
            Screen::Menu => match action {
                Action::Quit => return true,
                Action::Left | Action::Up => self.carousel.prev(),
                Action::Right | Action::Down => self.carousel.next(),
                Action::Primary | Action::Start => self.mount(self.carousel.selected().kind),
                _ => {}
            },
            Screen::Playing => self.handle_game_action(action, now),
            Screen::QuitMenu => match action {
                Action::Down | Action::Right => self.quit_selected = self.quit_selected.down(),
                Action::Up | Action::Left => self.quit_selected = self.quit_selected.up(),
                Action::Primary => match self.quit_selected {
                    QuitOption::Resume => self.close_quit_menu(now),
                    QuitOption::Carousel => {
                        self.resume_on_close = false;
                        self.unmount();
                    }
                    QuitOption::Exit => return true,
                },
                Action::Quit | Action::Back | Action::Pause => self.close_quit_menu(now),
                _ => {}
            },
        }
        false
    }

    fn close_quit_menu(&mut self, now: Instant) {
        self.screen = Screen::Playing;
        if std::mem::take(&mut self.resume_on_close) {
            self.drive(now, |s| s.game_mut().start());
        }
    }

    fn handle_game_action(&mut self, action: Action, now: Instant) {
        let running = self
            .session
            .as_ref()
            .is_some_and(|s| s.game().status().is_running());
        match action {
            Action::Quit => {
                self.resume_on_close = running;
                if running {
                    self.drive(now, |s| s.game_mut().pause());
                }
                self.screen = Screen::QuitMenu;
                self.quit_selected = QuitOption::Resume;
            }
            Action::Back => self.unmount(),
            Action::Start => self.drive(now, |s| s.game_mut().start()),
            Action::Pause if running => self.drive(now, |s| s.game_mut().pause()),
            Action::Pause => self.drive(now, |s| {
                if s.game().status() == crate::engine::Status::Paused {
                    s.game_mut().start();
                }
            }),
            Action::Reset => self.drive(now, |s| s.game_mut().reset()),
            Action::Step => self.drive(now, |s| s.game_mut().step()),
            Action::Primary => self.drive(now, Session::primary),
            Action::Up if !running && matches!(self.session, Some(Session::Runner(_))) => {
                self.drive(now, Session::primary);
            }
            Action::Left | Action::Right | Action::Up | Action::Down if running => {
                self.drive(now, |s| s.direction(action));
            }
            _ => {}
        }
    }

    /// Fire the engine tick if its period has elapsed.
    fn on_clock(&mut self, now: Instant) {
        if self.screen != Screen::Playing {
            return;
        }
        let Some(interval) = self.session.as_ref().map(|s| s.game().tick_interval()) else {
            return;
        };
        if self.ticker.as_mut().is_some_and(|t| t.fire(now, interval)) {
            self.drive(now, |s| s.game_mut().tick());
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;
        if let Err(e) = &result {
            log::error!("main loop failed: {e:#}");
        }
        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame = Duration::from_secs_f64(1.0 / self.config.frame_rate);
        loop {
            let now = Instant::now();
            let scene = Scene {
                screen: self.screen,
                theme: &self.theme,
                carousel: &self.carousel,
                session: self.session.as_ref(),
                caption: self.herald.caption(now),
                quit_selected: self.quit_selected,
            };
            terminal.draw(|f| crate::ui::draw(f, &scene, &mut self.fade, now))?;

            let mut timeout = frame.saturating_sub(now.elapsed());
            if let Some(ticker) = &self.ticker {
                timeout = timeout.min(ticker.remaining(Instant::now()));
            }

            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        let action = key_to_action(key);
                        if self.handle_action(action, Instant::now()) {
                            return Ok(());
                        }
                    }
                }
            }

            self.on_clock(Instant::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Status;

    fn app(game: Option<GameKind>) -> App {
        let config = GameConfig {
            game,
            seed: Some(11),
            mute: true,
            frame_rate: 30.0,
        };
        App::new(config, Theme::default())
    }

    fn status(app: &App) -> Option<Status> {
        app.session.as_ref().map(|s| s.game().status())
    }

    #[test]
    fn carousel_picks_and_mounts() {
        let mut app = app(None);
        let now = Instant::now();
        assert_eq!(app.screen, Screen::Menu);
        app.handle_action(Action::Right, now);
        let kind = app.carousel.selected().kind;
        app.handle_action(Action::Primary, now);
        assert_eq!(app.screen, Screen::Playing);
        assert_eq!(app.session.as_ref().map(Session::kind), Some(kind));
        assert_eq!(status(&app), Some(Status::Idle));
        assert!(app.ticker.is_none());
    }

    #[test]
    fn ticker_lives_only_while_running() {
        let mut app = app(Some(GameKind::Tetris));
        let now = Instant::now();
        app.handle_action(Action::Start, now);
        assert!(app.ticker.is_some());
        app.handle_action(Action::Pause, now);
        assert_eq!(status(&app), Some(Status::Paused));
        assert!(app.ticker.is_none());
        app.handle_action(Action::Pause, now);
        assert_eq!(status(&app), Some(Status::Running));
        assert!(app.ticker.is_some());
        app.handle_action(Action::Back, now);
        assert!(app.session.is_none());
        assert!(app.ticker.is_none());
        assert_eq!(app.screen, Screen::Menu);
    }

    #[test]
    fn clock_drives_the_running_engine() {
        let mut app = app(Some(GameKind::Runner));
        let t0 = Instant::now();
        app.handle_action(Action::Start, t0);
        app.on_clock(t0 + Duration::from_millis(16));
        let Some(Session::Runner(game)) = &app.session else {
            panic!("runner not mounted");
        };
        assert_eq!(game.score(), 1);
    }

    #[test]
    fn directions_ignored_unless_running() {
        let mut app = app(Some(GameKind::Snake));
        let now = Instant::now();
        app.handle_action(Action::Up, now);
        let heading = |app: &App| match &app.session {
            Some(Session::Snake(g)) => g.heading(),
            _ => panic!("snake not mounted"),
        };
        assert_eq!(heading(&app), Direction::Right);
        app.handle_action(Action::Start, now);
        app.handle_action(Action::Up, now);
        assert_eq!(heading(&app), Direction::Up);
    }

    #[test]
    fn runner_primary_starts_and_jumps() {
        let mut app = app(Some(GameKind::Runner));
        let now = Instant::now();
        app.handle_action(Action::Primary, now);
        assert_eq!(status(&app), Some(Status::Running));
        app.on_clock(now + Duration::from_millis(16));
        let Some(Session::Runner(game)) = &app.session else {
            panic!("runner not mounted");
        };
        assert!(game.runner_y() > 0.0);
    }

    #[test]
    fn quit_menu_resume_and_exit() {
        let mut app = app(Some(GameKind::Snake));
        let now = Instant::now();
        assert!(!app.handle_action(Action::Quit, now));
        assert_eq!(app.screen, Screen::QuitMenu);
        assert!(!app.handle_action(Action::Primary, now));
        assert_eq!(app.screen, Screen::Playing);

        app.handle_action(Action::Quit, now);
        app.handle_action(Action::Up, now);
        assert_eq!(app.quit_selected, QuitOption::Exit);
        assert!(app.handle_action(Action::Primary, now));
    }

    #[test]
    fn quit_menu_holds_the_game_and_resume_restarts_it() {
        let mut app = app(Some(GameKind::Runner));
        let now = Instant::now();
        let score = |app: &App| app.session.as_ref().map(|s| s.game().progress().score);
        app.handle_action(Action::Start, now);
        app.handle_action(Action::Quit, now);
        assert_eq!(status(&app), Some(Status::Paused));
        assert!(app.ticker.is_none());
        for i in 1..=50 {
            app.on_clock(now + Duration::from_millis(16 * i));
        }
        assert_eq!(score(&app), Some(0));

        let later = now + Duration::from_secs(1);
        app.handle_action(Action::Primary, later);
        assert_eq!(app.screen, Screen::Playing);
        assert_eq!(status(&app), Some(Status::Running));
        assert!(app.ticker.is_some());
        app.on_clock(later + Duration::from_millis(16));
        assert!(score(&app) > Some(0));

        // A game that was already paused stays paused.
        app.handle_action(Action::Pause, later);
        app.handle_action(Action::Quit, later);
        app.handle_action(Action::Back, later);
        assert_eq!(status(&app), Some(Status::Paused));
        assert!(app.ticker.is_none());
    }

    #[test]
    fn game_over_speaks_through_the_herald() {
        let mut app = app(Some(GameKind::Snake));
        let now = Instant::now();
        app.handle_action(Action::Start, now);
        // Straight into the right wall.
        for _ in 0..20 {
            app.handle_action(Action::Step, now);
        }
        assert_eq!(status(&app), Some(Status::GameOver));
        assert!(app.ticker.is_none());
        assert_eq!(app.herald.caption(Instant::now()), Some("Game over!"));
    }
}
