//! Game tiles shown on the start screen, and which one is highlighted.

use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GameKind {
    Snake,
    Tetris,
    #[value(alias = "dino")]
    Runner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameTile {
    pub title: &'static str,
    pub kind: GameKind,
    pub blurb: &'static str,
    /// Key hints shown under the board.
    pub controls: &'static str,
}

pub static TILES: [GameTile; 3] = [
    GameTile {
        title: "Tetris",
        kind: GameKind::Tetris,
        blurb: "Stack the falling blocks and fill whole rows.",
        controls: "←→ move  ↑ turn  ↓ drop  SPACE slam",
    },
    GameTile {
        title: "Snake",
        kind: GameKind::Snake,
        blurb: "Eat the red dot and grow longer.",
        controls: "←↑↓→ steer  N step",
    },
    GameTile {
        title: "Dino",
        kind: GameKind::Runner,
        blurb: "Jump over the rocks. Don't bump!",
        controls: "SPACE / ↑ jump",
    },
];

impl GameKind {
    pub fn tile(self) -> &'static GameTile {
        TILES
            .iter()
            .find(|t| t.kind == self)
            .unwrap_or(&TILES[0])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Carousel {
    index: usize,
}

impl Carousel {
    pub fn focused_on(kind: GameKind) -> Self {
        Self {
            index: TILES.iter().position(|t| t.kind == kind).unwrap_or(0),
        }
    }

    pub fn next(&mut self) {
        self.index = (self.index + 1) % TILES.len();
    }

    pub fn prev(&mut self) {
        self.index = (self.index + TILES.len() - 1) % TILES.len();
    }

    pub fn selected(&self) -> &'static GameTile {
        &TILES[self.index]
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.index == index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_both_ways() {
        let mut c = Carousel::default();
        c.prev();
        assert_eq!(c.index, TILES.len() - 1);
        c.next();
        assert_eq!(c.index, 0);
        for _ in 0..TILES.len() {
            c.next();
        }
        assert_eq!(c.index, 0);
    }

    #[test]
    fn every_kind_has_one_tile() {
        for kind in [GameKind::Snake, GameKind::Tetris, GameKind::Runner] {
            assert_eq!(TILES.iter().filter(|t| t.kind == kind).count(), 1);
            assert_eq!(kind.tile().kind, kind);
            let c = Carousel::focused_on(kind);
            assert_eq!(c.selected().kind, kind);
            assert!(c.is_active(c.index));
        }
    }
}
