pub mod crossterm;

use std::time::Duration;
use termloop_types::{Key, Result};

/// Synchronous wrapper over raw terminal primitives.
///
/// Implemented by [`crossterm::CrosstermTerminal`] for a real interactive
/// terminal and by the scripted fake in `termloop-testing`. The engine is the
/// only caller; it serializes access behind its own lock.
pub trait Terminal: Send {
    /// Whether a keypress is pending, waiting at most `timeout`.
    fn poll_key(&mut self, timeout: Duration) -> Result<bool>;

    /// Read one keypress, blocking until one arrives.
    fn read_key(&mut self) -> Result<Key>;

    /// Write text at the cursor, without a line terminator.
    fn write_text(&mut self, text: &str) -> Result<()>;

    /// Write text followed by a line break (CRLF under raw mode).
    fn write_line(&mut self, text: &str) -> Result<()>;

    /// Erase the line the cursor is on. Does not move the cursor.
    fn clear_line(&mut self) -> Result<()>;

    fn move_to_column(&mut self, column: u16) -> Result<()>;

    fn move_left(&mut self, count: u16) -> Result<()>;

    fn move_right(&mut self, count: u16) -> Result<()>;

    /// Current cursor column, 0-based.
    fn cursor_column(&mut self) -> Result<u16>;

    /// Terminal window width in columns.
    fn width(&mut self) -> u16;
}
