//! Snake: body on a fixed grid, food, heading, score-driven speed.

use crate::engine::{Game, Progress, Status};
use crate::rng::GameRng;
use std::collections::VecDeque;
use std::time::Duration;

pub const GRID_W: i32 = 20;
pub const GRID_H: i32 = 30;

/// Initial body, head first.
const START: [Point; 3] = [
    Point { x: 10, y: 15 },
    Point { x: 9, y: 15 },
    Point { x: 8, y: 15 },
];

const BASE_INTERVAL_MS: u64 = 220;
const MIN_INTERVAL_MS: u64 = 60;
/// Every this many points the snake speeds up by `SPEEDUP_STEP_MS`.
const POINTS_PER_SPEEDUP: u32 = 5;
const SPEEDUP_STEP_MS: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    fn offset(self, d: Direction) -> Self {
        let (dx, dy) = d.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    fn in_bounds(self) -> bool {
        (0..GRID_W).contains(&self.x) && (0..GRID_H).contains(&self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Up,
    Down,
    Left,
    #[default]
    Right,
}

impl Direction {
    /// Unit vector; y grows downwards.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SnakeGame {
    /// Head at the front.
    body: VecDeque<Point>,
    heading: Direction,
    food: Point,
    score: u32,
    status: Status,
    rng: GameRng,
}

impl SnakeGame {
    pub fn new(mut rng: GameRng) -> Self {
        let body: VecDeque<Point> = START.into_iter().collect();
        let food = random_food(&body, &mut rng);
        Self {
            body,
            heading: Direction::Right,
            food,
            score: 0,
            status: Status::Idle,
            rng,
        }
    }

    pub fn body(&self) -> impl Iterator<Item = Point> + '_ {
        self.body.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn head(&self) -> Point {
        self.body[0]
    }

    pub fn food(&self) -> Point {
        self.food
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn occupies(&self, p: Point) -> bool {
        self.body.contains(&p)
    }

    /// Turning straight back onto the body is dropped silently.
    pub fn set_direction(&mut self, d: Direction) {
        if self.status.is_game_over() || d == self.heading.opposite() {
            return;
        }
        self.heading = d;
    }

    fn advance(&mut self) {
        let next = self.head().offset(self.heading);
        if !next.in_bounds() || self.occupies(next) {
            self.status = Status::GameOver;
            return;
        }
        self.body.push_front(next);
        if next == self.food {
            self.score += 1;
            self.food = random_food(&self.body, &mut self.rng);
        } else {
            self.body.pop_back();
        }
    }
}

impl Game for SnakeGame {
    fn start(&mut self) {
        if self.status.begin() {
            self.reset();
            self.status = Status::Running;
        }
    }

    fn pause(&mut self) {
        self.status.park();
    }

    fn reset(&mut self) {
        self.body = START.into_iter().collect();
        self.heading = Direction::Right;
        self.food = random_food(&self.body, &mut self.rng);
        self.score = 0;
        self.status = Status::Idle;
    }

    fn tick(&mut self) {
        if self.status.is_running() {
            self.advance();
        }
    }

    fn step(&mut self) {
        if !self.status.is_game_over() {
            self.advance();
        }
    }

    fn status(&self) -> Status {
        self.status
    }

    fn tick_interval(&self) -> Duration {
        let speedup = u64::from(self.score / POINTS_PER_SPEEDUP) * SPEEDUP_STEP_MS;
        Duration::from_millis(BASE_INTERVAL_MS.saturating_sub(speedup).max(MIN_INTERVAL_MS))
    }

    fn progress(&self) -> Progress {
        Progress {
            score: self.score,
            lines: 0,
            status: self.status,
        }
    }
}

/// Re-sample until the cell is free. The grid is far larger than any
/// reachable body, so this terminates almost surely after a few draws.
fn random_food(body: &VecDeque<Point>, rng: &mut GameRng) -> Point {
    loop {
        let p = Point::new(
            rng.below(GRID_W as usize) as i32,
            rng.below(GRID_H as usize) as i32,
        );
        if !body.contains(&p) {
            return p;
        }
    }
}

#[cfg(test)]
impl SnakeGame {
    fn with_food(seed: u64, food: Point) -> Self {
        let mut game = Self::new(GameRng::new(seed));
        game.food = food;
        game
    }

    fn with_body(seed: u64, body: &[Point], heading: Direction, food: Point) -> Self {
        let mut game = Self::with_food(seed, food);
        game.body = body.iter().copied().collect();
        game.heading = heading;
        game
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIRECTIONS: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    fn running(mut game: SnakeGame) -> SnakeGame {
        game.start();
        game
    }

    #[test]
    fn new_game_is_idle_with_start_body() {
        let game = SnakeGame::new(GameRng::new(1));
        assert_eq!(game.status(), Status::Idle);
        assert_eq!(game.body().collect::<Vec<_>>(), START.to_vec());
        assert_eq!(game.heading(), Direction::Right);
        assert!(!game.occupies(game.food()));
    }

    #[test]
    fn direction_change_accepted_unless_opposite() {
        for current in DIRECTIONS {
            for wanted in DIRECTIONS {
                let mut game = SnakeGame::new(GameRng::new(2));
                game.heading = current;
                game.set_direction(wanted);
                if wanted == current.opposite() {
                    assert_eq!(game.heading(), current);
                } else {
                    assert_eq!(game.heading(), wanted);
                }
            }
        }
    }

    #[test]
    fn tick_without_food_shifts_body() {
        let mut game = running(SnakeGame::with_food(3, Point::new(0, 0)));
        let old_head = game.head();
        let old_tail = *game.body.back().unwrap();
        game.tick();
        assert_eq!(game.len(), 3);
        assert_eq!(game.head(), Point::new(old_head.x + 1, old_head.y));
        assert!(!game.occupies(old_tail));
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn tick_onto_food_grows_and_scores() {
        let mut game = running(SnakeGame::with_food(4, Point::new(11, 15)));
        game.tick();
        assert_eq!(game.len(), 4);
        assert_eq!(game.score(), 1);
        assert!(!game.occupies(game.food()));
    }

    #[test]
    fn three_ticks_reach_food() {
        let mut game = running(SnakeGame::with_food(5, Point::new(13, 15)));
        for _ in 0..3 {
            game.tick();
        }
        assert_eq!(game.head(), Point::new(13, 15));
        assert_eq!(game.score(), 1);
        assert_eq!(game.len(), 4);
        assert!(game.status().is_running());
    }

    #[test]
    fn wall_ends_game_and_freezes_ticks() {
        let body = [Point::new(19, 0), Point::new(18, 0), Point::new(17, 0)];
        let mut game = running(SnakeGame::with_body(
            6,
            &body,
            Direction::Right,
            Point::new(5, 5),
        ));
        game.tick();
        assert_eq!(game.status(), Status::GameOver);
        assert!(!game.status().is_running());
        assert_eq!(game.body().collect::<Vec<_>>(), body.to_vec());

        game.tick();
        game.step();
        game.set_direction(Direction::Down);
        assert_eq!(game.heading(), Direction::Right);
        assert_eq!(game.body().collect::<Vec<_>>(), body.to_vec());
        assert_eq!(game.status(), Status::GameOver);
    }

    #[test]
    fn biting_own_body_ends_game() {
        // A hook: heading up from (5,5) runs into (5,4).
        let body = [
            Point::new(5, 5),
            Point::new(6, 5),
            Point::new(6, 4),
            Point::new(5, 4),
            Point::new(4, 4),
        ];
        let mut game = running(SnakeGame::with_body(
            7,
            &body,
            Direction::Up,
            Point::new(0, 0),
        ));
        game.tick();
        assert_eq!(game.status(), Status::GameOver);
    }

    #[test]
    fn tick_is_noop_unless_running_but_step_advances() {
        let mut game = SnakeGame::with_food(8, Point::new(0, 0));
        let head = game.head();
        game.tick();
        assert_eq!(game.head(), head);
        game.step();
        assert_eq!(game.head(), Point::new(head.x + 1, head.y));

        game.start();
        game.pause();
        game.tick();
        assert_eq!(game.head(), Point::new(head.x + 1, head.y));
        assert_eq!(game.status(), Status::Paused);
    }

    #[test]
    fn start_after_game_over_resets() {
        let body = [Point::new(0, 0), Point::new(1, 0), Point::new(2, 0)];
        let mut game = running(SnakeGame::with_body(
            9,
            &body,
            Direction::Left,
            Point::new(5, 5),
        ));
        game.score = 12;
        game.tick();
        assert!(game.status().is_game_over());

        game.start();
        assert!(game.status().is_running());
        assert_eq!(game.score(), 0);
        assert_eq!(game.body().collect::<Vec<_>>(), START.to_vec());
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut game = running(SnakeGame::with_food(10, Point::new(11, 15)));
        game.tick();
        game.set_direction(Direction::Down);
        game.reset();
        assert_eq!(game.status(), Status::Idle);
        assert_eq!(game.score(), 0);
        assert_eq!(game.heading(), Direction::Right);
        assert_eq!(game.len(), 3);
        assert!(!game.occupies(game.food()));
    }

    #[test]
    fn interval_shrinks_with_score_down_to_floor() {
        let mut game = SnakeGame::new(GameRng::new(11));
        let ms = |g: &SnakeGame| g.tick_interval().as_millis();
        assert_eq!(ms(&game), 220);
        game.score = 4;
        assert_eq!(ms(&game), 220);
        game.score = 5;
        assert_eq!(ms(&game), 200);
        game.score = 40;
        assert_eq!(ms(&game), 60);
        game.score = 500;
        assert_eq!(ms(&game), 60);
    }

    #[test]
    fn food_never_lands_on_body() {
        let mut rng = GameRng::new(12);
        let body: VecDeque<Point> = (0..GRID_W).map(|x| Point::new(x, 0)).collect();
        for _ in 0..200 {
            assert!(!body.contains(&random_food(&body, &mut rng)));
        }
    }
}
