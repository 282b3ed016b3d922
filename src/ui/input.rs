//! Key bindings
//!
//! Translates key presses into what they mean in the current screen.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::game::TurnInput;

/// What a key does while a floor is being played
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayAction {
    Turn(TurnInput),
    Pause,
    ToggleRenderMode,
    Quit,
}

/// Direction for a movement key: arrows, WASD, vi keys and yubn diagonals
pub fn direction_for(code: KeyCode) -> Option<(i32, i32)> {
    match code {
        KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('w') => Some((0, -1)),
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('s') => Some((0, 1)),
        KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('a') => Some((-1, 0)),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('d') => Some((1, 0)),
        KeyCode::Char('y') => Some((-1, -1)),
        KeyCode::Char('u') => Some((1, -1)),
        KeyCode::Char('b') => Some((-1, 1)),
        KeyCode::Char('n') => Some((1, 1)),
        _ => None,
    }
}

pub fn play_action(key: KeyEvent) -> Option<PlayAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') => Some(PlayAction::Quit),
            _ => None,
        };
    }

    if let Some((dx, dy)) = direction_for(key.code) {
        return Some(PlayAction::Turn(TurnInput::Move {
            dx: dx as f32,
            dy: dy as f32,
        }));
    }

    match key.code {
        KeyCode::Char('.') | KeyCode::Char(' ') => Some(PlayAction::Turn(TurnInput::Wait)),
        KeyCode::Esc | KeyCode::Char('p') => Some(PlayAction::Pause),
        KeyCode::Tab => Some(PlayAction::ToggleRenderMode),
        KeyCode::Char('q') => Some(PlayAction::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_movement_keys_agree() {
        let up = Some(PlayAction::Turn(TurnInput::Move { dx: 0.0, dy: -1.0 }));
        assert_eq!(play_action(key(KeyCode::Up)), up);
        assert_eq!(play_action(key(KeyCode::Char('w'))), up);
        assert_eq!(play_action(key(KeyCode::Char('k'))), up);
        assert_eq!(direction_for(KeyCode::Char('n')), Some((1, 1)));
    }

    #[test]
    fn test_other_bindings() {
        assert_eq!(play_action(key(KeyCode::Char('.'))), Some(PlayAction::Turn(TurnInput::Wait)));
        assert_eq!(play_action(key(KeyCode::Esc)), Some(PlayAction::Pause));
        assert_eq!(play_action(key(KeyCode::Char('q'))), Some(PlayAction::Quit));
        assert_eq!(
            play_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(PlayAction::Quit)
        );
        assert_eq!(play_action(key(KeyCode::Char('z'))), None);
    }
}
