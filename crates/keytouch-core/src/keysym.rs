// Keytouch Key Symbols
// Key symbol numbers and modifier state masks understood by the composition engine

use std::fmt;
use std::str::FromStr;

use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// A key symbol as the composition engine interprets it.
///
/// The numeric values follow the X11 keysym table, which is what the
/// engine side speaks. Printable Latin-1 symbols equal their codepoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct KeySym(pub u32);

impl KeySym {
    pub const SPACE: KeySym = KeySym(0x0020);
    pub const BACKSPACE: KeySym = KeySym(0xff08);
    pub const TAB: KeySym = KeySym(0xff09);
    pub const RETURN: KeySym = KeySym(0xff0d);
    pub const ESCAPE: KeySym = KeySym(0xff1b);
    pub const HOME: KeySym = KeySym(0xff50);
    pub const LEFT: KeySym = KeySym(0xff51);
    pub const UP: KeySym = KeySym(0xff52);
    pub const RIGHT: KeySym = KeySym(0xff53);
    pub const DOWN: KeySym = KeySym(0xff54);
    pub const PAGE_UP: KeySym = KeySym(0xff55);
    pub const PAGE_DOWN: KeySym = KeySym(0xff56);
    pub const END: KeySym = KeySym(0xff57);
    pub const SHIFT_L: KeySym = KeySym(0xffe1);
    pub const CAPS_LOCK: KeySym = KeySym(0xffe5);
    pub const DELETE: KeySym = KeySym(0xffff);

    const NAMED: &'static [(&'static str, KeySym)] = &[
        ("space", KeySym::SPACE),
        ("BackSpace", KeySym::BACKSPACE),
        ("Tab", KeySym::TAB),
        ("Return", KeySym::RETURN),
        ("Escape", KeySym::ESCAPE),
        ("Home", KeySym::HOME),
        ("Left", KeySym::LEFT),
        ("Up", KeySym::UP),
        ("Right", KeySym::RIGHT),
        ("Down", KeySym::DOWN),
        ("Page_Up", KeySym::PAGE_UP),
        ("Page_Down", KeySym::PAGE_DOWN),
        ("End", KeySym::END),
        ("Shift_L", KeySym::SHIFT_L),
        ("Caps_Lock", KeySym::CAPS_LOCK),
        ("Delete", KeySym::DELETE),
    ];

    /// Get the raw symbol value
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Symbol for a single printable character
    pub fn from_char(c: char) -> Self {
        let code = c as u32;
        if (0x20..=0xff).contains(&code) {
            KeySym(code)
        } else {
            // Unicode keysyms live at 0x01000000 + codepoint
            KeySym(0x0100_0000 + code)
        }
    }

    /// The engine-side name for named symbols
    pub fn name(self) -> Option<&'static str> {
        Self::NAMED
            .iter()
            .find(|(_, sym)| *sym == self)
            .map(|(name, _)| *name)
    }
}

impl fmt::Display for KeySym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => match char::from_u32(self.0) {
                Some(c) if (0x21..=0xff).contains(&self.0) => write!(f, "{}", c),
                _ => write!(f, "0x{:04x}", self.0),
            },
        }
    }
}

impl FromStr for KeySym {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((_, sym)) = Self::NAMED.iter().find(|(name, _)| name.eq_ignore_ascii_case(s)) {
            return Ok(*sym);
        }
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(KeySym::from_char(c)),
            _ => Err(format!("Unknown key symbol: {}", s)),
        }
    }
}

/// A single modifier flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum KeyState {
    Shift,
    CapsLock,
    #[strum(to_string = "Ctrl", serialize = "Control")]
    Ctrl,
    Alt,
    NumLock,
    Super,
    /// Marks a key event as synthesized by the on-screen keyboard
    Virtual,
}

impl KeyState {
    /// Bit in the engine's modifier mask
    pub fn bit(self) -> u32 {
        match self {
            KeyState::Shift => 1 << 0,
            KeyState::CapsLock => 1 << 1,
            KeyState::Ctrl => 1 << 2,
            KeyState::Alt => 1 << 3,
            KeyState::NumLock => 1 << 4,
            KeyState::Super => 1 << 6,
            KeyState::Virtual => 1 << 23,
        }
    }
}

/// Set of modifier flags carried with a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct KeyStates(pub u32);

impl KeyStates {
    pub const EMPTY: KeyStates = KeyStates(0);

    pub fn of(states: &[KeyState]) -> Self {
        KeyStates(states.iter().fold(0, |mask, s| mask | s.bit()))
    }

    pub fn contains(self, state: KeyState) -> bool {
        self.0 & state.bit() != 0
    }

    pub fn with(self, state: KeyState) -> Self {
        KeyStates(self.0 | state.bit())
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the raw mask
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for KeyStates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = KeyState::iter()
            .filter(|s| self.contains(*s))
            .map(|s| s.to_string())
            .collect();
        if names.is_empty() {
            write!(f, "-")
        } else {
            write!(f, "{}", names.join("+"))
        }
    }
}

impl FromStr for KeyStates {
    type Err = String;

    /// Parse a `+`-separated list such as `Shift+Virtual`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed == "-" {
            return Ok(KeyStates::EMPTY);
        }
        trimmed.split('+').try_fold(KeyStates::EMPTY, |acc, part| {
            KeyState::from_str(part.trim())
                .map(|state| acc.with(state))
                .map_err(|_| format!("Unknown modifier: {}", part.trim()))
        })
    }
}
