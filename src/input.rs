//! Key bindings: arrows and vim-style letters.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Screen-independent intent of a key press; each game decides what it means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Left,
    Right,
    Up,
    Down,
    /// Space / Enter: hard drop, jump, pick a tile, confirm.
    Primary,
    Start,
    Pause,
    Reset,
    Step,
    /// Back to the carousel.
    Back,
    Quit,
    None,
}

/// Map key event to action. Supports both arrows and vim (hjkl).
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL {
        return match code {
            KeyCode::Char('c') => Action::Quit,
            _ => Action::None,
        };
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    match code {
        KeyCode::Char('q' | 'Q') => Action::Quit,
        KeyCode::Esc | KeyCode::Tab | KeyCode::Backspace => Action::Back,
        KeyCode::Left | KeyCode::Char('h') => Action::Left,
        KeyCode::Right | KeyCode::Char('l') => Action::Right,
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Primary,
        KeyCode::Char('s' | 'S') => Action::Start,
        KeyCode::Char('p' | 'P') => Action::Pause,
        KeyCode::Char('r' | 'R') => Action::Reset,
        KeyCode::Char('n' | 'N') => Action::Step,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> Action {
        key_to_action(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn arrows_and_vim_agree() {
        assert_eq!(press(KeyCode::Left), press(KeyCode::Char('h')));
        assert_eq!(press(KeyCode::Right), press(KeyCode::Char('l')));
        assert_eq!(press(KeyCode::Up), press(KeyCode::Char('k')));
        assert_eq!(press(KeyCode::Down), Action::Down);
    }

    #[test]
    fn controls() {
        assert_eq!(press(KeyCode::Char(' ')), Action::Primary);
        assert_eq!(press(KeyCode::Enter), Action::Primary);
        assert_eq!(press(KeyCode::Char('p')), Action::Pause);
        assert_eq!(press(KeyCode::Char('R')), Action::Reset);
        assert_eq!(press(KeyCode::Esc), Action::Back);
        assert_eq!(press(KeyCode::Char('x')), Action::None);
    }

    #[test]
    fn ctrl_c_quits_other_chords_ignored() {
        let ctrl = |c| key_to_action(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL));
        assert_eq!(ctrl('c'), Action::Quit);
        assert_eq!(ctrl('h'), Action::None);
        let alt = key_to_action(KeyEvent::new(KeyCode::Left, KeyModifiers::ALT));
        assert_eq!(alt, Action::None);
    }
}
