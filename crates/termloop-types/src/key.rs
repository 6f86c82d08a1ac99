/// A decoded keypress, independent of the terminal backend that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    Tab,
    Esc,
    Ctrl(char),
    /// A key the engine has no routing for (function keys, media keys, ...)
    Other,
}

impl Key {
    /// History navigation keys: Up steps to older entries, Down to newer ones.
    pub fn is_history_nav(&self) -> bool {
        matches!(self, Key::Up | Key::Down)
    }

    /// Cursor movement keys that never touch the input buffer.
    pub fn is_cursor_move(&self) -> bool {
        matches!(self, Key::Left | Key::Right)
    }

    /// The character to echo and append, if this key carries one.
    pub fn printable(&self) -> Option<char> {
        match self {
            Key::Char(c) => Some(*c),
            _ => None,
        }
    }
}
