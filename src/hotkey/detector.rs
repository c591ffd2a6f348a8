//! Press/release edge detection for a modifier hotkey

use super::keys::{Hotkey, ModifierState};

/// A hotkey transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Pressed,
    Released,
}

/// Turns a stream of modifier snapshots into press/release edges
#[derive(Debug, Clone)]
pub struct HotkeyDetector {
    hotkey: Hotkey,
    held: bool,
}

impl HotkeyDetector {
    pub fn new(hotkey: Hotkey) -> Self {
        Self {
            hotkey,
            held: false,
        }
    }

    /// Feed the latest modifier state, returning an edge if the hotkey
    /// changed between held and not held
    pub fn update(&mut self, state: &ModifierState) -> Option<Edge> {
        let held = self.hotkey.is_held(state);
        let edge = match (self.held, held) {
            (false, true) => Some(Edge::Pressed),
            (true, false) => Some(Edge::Released),
            _ => None,
        };
        self.held = held;
        edge
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(control: bool, option: bool, command: bool) -> ModifierState {
        ModifierState {
            control,
            option,
            command,
            shift: false,
        }
    }

    #[test]
    fn test_press_and_release() {
        let mut detector = HotkeyDetector::new(Hotkey::default());

        assert_eq!(detector.update(&state(true, false, false)), None);
        assert_eq!(detector.update(&state(true, true, false)), Some(Edge::Pressed));
        assert_eq!(detector.update(&state(true, false, false)), Some(Edge::Released));
        assert_eq!(detector.update(&state(false, false, false)), None);
    }

    #[test]
    fn test_extra_modifier_keeps_hotkey_held() {
        let mut detector = HotkeyDetector::new(Hotkey::default());

        assert_eq!(detector.update(&state(true, true, false)), Some(Edge::Pressed));
        assert_eq!(detector.update(&state(true, true, true)), None);
        assert_eq!(detector.update(&state(false, false, false)), Some(Edge::Released));
    }

    #[test]
    fn test_repeated_state_is_not_an_edge() {
        let mut detector = HotkeyDetector::new("Command".parse().unwrap());

        assert_eq!(detector.update(&state(false, false, true)), Some(Edge::Pressed));
        assert_eq!(detector.update(&state(false, false, true)), None);
    }
}
