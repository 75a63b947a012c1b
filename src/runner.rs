//! Jump runner: a box that hops over obstacles scrolling in from the right.
//!
//! Units are logical scene pixels; height is measured upwards from the ground.

use crate::engine::{Game, Progress, Status};
use crate::rng::GameRng;
use std::time::Duration;

pub const SCENE_W: f32 = 340.0;
pub const RUNNER_X: f32 = 40.0;
pub const RUNNER_W: f32 = 28.0;
pub const RUNNER_H: f32 = 32.0;

const GRAVITY: f32 = 0.45;
const JUMP_VELOCITY: f32 = 11.0;
const SPEED_START: f32 = 2.1;
const SPEED_STEP: f32 = 0.1;
const POINTS_PER_SPEEDUP: u32 = 300;
const FRAME: Duration = Duration::from_millis(16);

/// A new obstacle may appear only once the last one has scrolled past here.
const SPAWN_GAP_X: f32 = 220.0;
const SPAWN_CHANCE: f64 = 0.006;
/// Obstacles are dropped once fully past this x.
const DESPAWN_X: f32 = -10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub x: f32,
    pub w: f32,
    pub h: f32,
}

impl Obstacle {
    fn overlaps_runner(&self, runner_y: f32) -> bool {
        RUNNER_X < self.x + self.w
            && RUNNER_X + RUNNER_W > self.x
            && runner_y < self.h
            && runner_y + RUNNER_H > 0.0
    }
}

#[derive(Debug, Clone)]
pub struct RunnerGame {
    /// Height of the runner's feet above the ground.
    y: f32,
    vy: f32,
    obstacles: Vec<Obstacle>,
    speed: f32,
    score: u32,
    status: Status,
    rng: GameRng,
}

impl RunnerGame {
    pub fn new(rng: GameRng) -> Self {
        Self {
            y: 0.0,
            vy: 0.0,
            obstacles: Vec::new(),
            speed: SPEED_START,
            score: 0,
            status: Status::Idle,
            rng,
        }
    }

    pub fn runner_y(&self) -> f32 {
        self.y
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn on_ground(&self) -> bool {
        self.y <= 0.0
    }

    /// Only from the ground and only mid-run.
    pub fn jump(&mut self) {
        if self.status.is_running() && self.on_ground() {
            self.vy = JUMP_VELOCITY;
        }
    }

    fn advance(&mut self) {
        self.vy -= GRAVITY;
        self.y = (self.y + self.vy).max(0.0);
        if self.on_ground() && self.vy < 0.0 {
            self.vy = 0.0;
        }

        let speed = self.speed;
        for o in &mut self.obstacles {
            o.x -= speed;
        }
        self.obstacles.retain(|o| o.x + o.w > DESPAWN_X);

        let room = self.obstacles.last().is_none_or(|o| o.x < SPAWN_GAP_X);
        if room && self.rng.chance(SPAWN_CHANCE) {
            self.spawn_obstacle();
        }

        if self.obstacles.iter().any(|o| o.overlaps_runner(self.y)) {
            self.status = Status::GameOver;
            return;
        }

        self.score += 1;
        if self.score % POINTS_PER_SPEEDUP == 0 {
            self.speed += SPEED_STEP;
        }
    }

    fn spawn_obstacle(&mut self) {
        let w = self.rng.range(16..36) as f32;
        let h = self.rng.range(18..42) as f32;
        self.obstacles.push(Obstacle { x: SCENE_W, w, h });
    }
}

impl Game for RunnerGame {
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
        self.y = 0.0;
        self.vy = 0.0;
        self.obstacles.clear();
        self.speed = SPEED_START;
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
        FRAME
    }

    fn progress(&self) -> Progress {
        Progress {
            score: self.score,
            lines: 0,
            status: self.status,
        }
    }
}
