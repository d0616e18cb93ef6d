// Space2Super Key Type
// Linux input-event-codes key codes and their symbolic names

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Number of EV_KEY codes the kernel defines (`KEY_CNT`).
pub const KEY_CNT: usize = 0x300;

/// First and last pointer button codes (`BTN_MOUSE..=BTN_TASK`).
pub const BTN_MOUSE: u16 = 0x110;
pub const BTN_TASK: u16 = 0x117;

/// A single evdev key code.
///
/// Values match Linux input-event-codes.h, so they can be written to a
/// uinput device as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Key(pub u16);

impl Key {
    /// Raw numeric code
    pub fn code(self) -> u16 {
        self.0
    }

    /// Symbolic name, "UNKNOWN" when the code has none
    pub fn name(self) -> &'static str {
        key_name(self.0).unwrap_or("UNKNOWN")
    }

    /// True for mouse/pointer buttons rather than keyboard keys
    pub fn is_pointer_button(self) -> bool {
        (BTN_MOUSE..=BTN_TASK).contains(&self.0)
    }
}

impl From<u16> for Key {
    fn from(code: u16) -> Self {
        Key(code)
    }
}

impl From<Key> for u16 {
    fn from(key: Key) -> Self {
        key.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.0)
    }
}

impl FromStr for Key {
    type Err = String;

    /// Accepts a symbolic name ("SPACE", "left_meta") or a numeric code ("57").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<u16>() {
            if (code as usize) < KEY_CNT {
                return Ok(Key(code));
            }
            return Err(format!("Key code out of range: {}", code));
        }
        key_from_name(trimmed).ok_or_else(|| format!("Unknown key: {}", trimmed))
    }
}

// Canonical names, one per code.
const KEY_NAMES: &[(u16, &str)] = &[
    (1, "ESC"),
    (2, "KEY_1"),
    (3, "KEY_2"),
    (4, "KEY_3"),
    (5, "KEY_4"),
    (6, "KEY_5"),
    (7, "KEY_6"),
    (8, "KEY_7"),
    (9, "KEY_8"),
    (10, "KEY_9"),
    (11, "KEY_0"),
    (12, "MINUS"),
    (13, "EQUAL"),
    (14, "BACKSPACE"),
    (15, "TAB"),
    (16, "Q"),
    (17, "W"),
    (18, "E"),
    (19, "R"),
    (20, "T"),
    (21, "Y"),
    (22, "U"),
    (23, "I"),
    (24, "O"),
    (25, "P"),
    (26, "LEFT_BRACE"),
    (27, "RIGHT_BRACE"),
    (28, "ENTER"),
    (29, "LEFT_CTRL"),
    (30, "A"),
    (31, "S"),
    (32, "D"),
    (33, "F"),
    (34, "G"),
    (35, "H"),
    (36, "J"),
    (37, "K"),
    (38, "L"),
    (39, "SEMICOLON"),
    (40, "APOSTROPHE"),
    (41, "GRAVE"),
    (42, "LEFT_SHIFT"),
    (43, "BACKSLASH"),
    (44, "Z"),
    (45, "X"),
    (46, "C"),
    (47, "V"),
    (48, "B"),
    (49, "N"),
    (50, "M"),
    (51, "COMMA"),
    (52, "DOT"),
    (53, "SLASH"),
    (54, "RIGHT_SHIFT"),
    (55, "KPASTERISK"),
    (56, "LEFT_ALT"),
    (57, "SPACE"),
    (58, "CAPSLOCK"),
    (59, "F1"),
    (60, "F2"),
    (61, "F3"),
    (62, "F4"),
    (63, "F5"),
    (64, "F6"),
    (65, "F7"),
    (66, "F8"),
    (67, "F9"),
    (68, "F10"),
    (69, "NUMLOCK"),
    (70, "SCROLLLOCK"),
    (71, "KP7"),
    (72, "KP8"),
    (73, "KP9"),
    (74, "KPMINUS"),
    (75, "KP4"),
    (76, "KP5"),
    (77, "KP6"),
    (78, "KPPLUS"),
    (79, "KP1"),
    (80, "KP2"),
    (81, "KP3"),
    (82, "KP0"),
    (83, "KPDOT"),
    (86, "KEY_102ND"),
    (87, "F11"),
    (88, "F12"),
    (96, "KPENTER"),
    (97, "RIGHT_CTRL"),
    (98, "KPSLASH"),
    (99, "SYSRQ"),
    (100, "RIGHT_ALT"),
    (102, "HOME"),
    (103, "UP"),
    (104, "PAGE_UP"),
    (105, "LEFT"),
    (106, "RIGHT"),
    (107, "END"),
    (108, "DOWN"),
    (109, "PAGE_DOWN"),
    (110, "INSERT"),
    (111, "DELETE"),
    (113, "MUTE"),
    (114, "VOLUMEDOWN"),
    (115, "VOLUMEUP"),
    (117, "KPEQUAL"),
    (119, "PAUSE"),
    (125, "LEFT_META"),
    (126, "RIGHT_META"),
    (127, "COMPOSE"),
    (139, "MENU"),
    (183, "F13"),
    (184, "F14"),
    (185, "F15"),
    (186, "F16"),
    (187, "F17"),
    (188, "F18"),
    (189, "F19"),
    (190, "F20"),
    (191, "F21"),
    (192, "F22"),
    (193, "F23"),
    (194, "F24"),
    (0x110, "BTN_LEFT"),
    (0x111, "BTN_RIGHT"),
    (0x112, "BTN_MIDDLE"),
    (0x113, "BTN_SIDE"),
    (0x114, "BTN_EXTRA"),
    (0x115, "BTN_FORWARD"),
    (0x116, "BTN_BACK"),
    (0x117, "BTN_TASK"),
];

// Extra spellings accepted on input only. The X11-style keysym names let
// configs written against xmodmap output keep working.
const KEY_ALIASES: &[(&str, u16)] = &[
    ("ESCAPE", 1),
    ("1", 2),
    ("RETURN", 28),
    ("CONTROL_L", 29),
    ("SHIFT_L", 42),
    ("SHIFT_R", 54),
    ("ALT_L", 56),
    ("CONTROL_R", 97),
    ("ALT_R", 100),
    ("ISO_LEVEL3_SHIFT", 100),
    ("PRINT", 99),
    ("SUPER_L", 125),
    ("SUPER_R", 126),
    ("LEFT_SUPER", 125),
    ("RIGHT_SUPER", 126),
];

/// Canonical name for a key code, if it has one
pub fn key_name(code: u16) -> Option<&'static str> {
    static BY_CODE: OnceLock<Vec<Option<&'static str>>> = OnceLock::new();
    BY_CODE
        .get_or_init(|| {
            let mut names = vec![None; KEY_CNT];
            for &(code, name) in KEY_NAMES {
                names[code as usize] = Some(name);
            }
            names
        })
        .get(code as usize)
        .copied()
        .flatten()
}

/// Parse a key name (case-insensitive) to a key code
pub fn key_from_name(name: &str) -> Option<Key> {
    let name_upper = name.trim().to_uppercase();
    KEY_NAMES
        .iter()
        .find(|(_, n)| *n == name_upper)
        .map(|(code, _)| *code)
        .or_else(|| {
            KEY_ALIASES
                .iter()
                .find(|(n, _)| *n == name_upper)
                .map(|(_, code)| *code)
        })
        .map(Key::from)
}
