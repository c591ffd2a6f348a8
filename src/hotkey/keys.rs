//! Modifier key definitions and hotkey parsing
//!
//! A hotkey is a set of modifier keys that must all be held together,
//! e.g. `Control+Option`.

#[cfg(target_os = "macos")]
use core_graphics::event::CGEventFlags;

/// Modifier key flag masks from macOS CGEventFlags
#[cfg(target_os = "macos")]
pub mod flags {
    use core_graphics::event::CGEventFlags;

    /// Control key modifier flag
    pub const CONTROL: CGEventFlags = CGEventFlags::CGEventFlagControl;
    /// Option/Alt key modifier flag
    pub const OPTION: CGEventFlags = CGEventFlags::CGEventFlagAlternate;
    /// Command key modifier flag
    pub const COMMAND: CGEventFlags = CGEventFlags::CGEventFlagCommand;
    /// Shift key modifier flag
    pub const SHIFT: CGEventFlags = CGEventFlags::CGEventFlagShift;
}

/// Tracks which modifier keys are currently pressed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ModifierState {
    /// Control key is held
    pub control: bool,
    /// Option/Alt key is held
    pub option: bool,
    /// Command key is held
    pub command: bool,
    /// Shift key is held
    pub shift: bool,
}

impl ModifierState {
    /// Create a new ModifierState from CGEventFlags
    #[cfg(target_os = "macos")]
    pub fn from_flags(flags: CGEventFlags) -> Self {
        Self {
            control: flags.contains(flags::CONTROL),
            option: flags.contains(flags::OPTION),
            command: flags.contains(flags::COMMAND),
            shift: flags.contains(flags::SHIFT),
        }
    }

    /// Check if every modifier held in `other` is also held here
    #[cfg_attr(not(target_os = "macos"), allow(dead_code))]
    pub fn contains(&self, other: &ModifierState) -> bool {
        (!other.control || self.control)
            && (!other.option || self.option)
            && (!other.command || self.command)
            && (!other.shift || self.shift)
    }
}

/// Errors from parsing a hotkey string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseHotkeyError {
    #[error("empty hotkey string")]
    Empty,

    #[error("unknown modifier: {0}")]
    UnknownModifier(String),

    #[error("modifier listed twice: {0}")]
    Duplicate(String),
}

/// A global hotkey: the modifiers that must be held together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hotkey {
    modifiers: ModifierState,
}

impl Hotkey {
    /// Check if the hotkey is held given the current modifier state
    #[cfg_attr(not(target_os = "macos"), allow(dead_code))]
    pub fn is_held(&self, state: &ModifierState) -> bool {
        state.contains(&self.modifiers)
    }
}

impl Default for Hotkey {
    fn default() -> Self {
        Self {
            modifiers: ModifierState {
                control: true,
                option: true,
                ..ModifierState::default()
            },
        }
    }
}

impl std::str::FromStr for Hotkey {
    type Err = ParseHotkeyError;

    /// Parse a hotkey string like "Control+Option" or "cmd+shift"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ParseHotkeyError::Empty);
        }

        let mut modifiers = ModifierState::default();
        for part in s.split('+') {
            let part = part.trim();
            let slot = match part.to_uppercase().as_str() {
                "CONTROL" | "CTRL" => &mut modifiers.control,
                "OPTION" | "ALT" => &mut modifiers.option,
                "COMMAND" | "CMD" | "SUPER" => &mut modifiers.command,
                "SHIFT" => &mut modifiers.shift,
                "" => return Err(ParseHotkeyError::Empty),
                _ => return Err(ParseHotkeyError::UnknownModifier(part.to_string())),
            };
            if *slot {
                return Err(ParseHotkeyError::Duplicate(part.to_string()));
            }
            *slot = true;
        }

        Ok(Self { modifiers })
    }
}

impl std::fmt::Display for Hotkey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if self.modifiers.control {
            parts.push("Control");
        }
        if self.modifiers.option {
            parts.push("Option");
        }
        if self.modifiers.command {
            parts.push("Command");
        }
        if self.modifiers.shift {
            parts.push("Shift");
        }
        write!(f, "{}", parts.join("+"))
    }
}
