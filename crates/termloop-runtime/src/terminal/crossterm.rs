use crate::terminal::Terminal;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{cursor, queue};
use std::io::{self, Stdout, Write};
use std::time::Duration;
use termloop_types::{Key, Result};

/// Raw-mode terminal backed by crossterm and stdout.
///
/// Raw mode is enabled on construction and restored on drop. Only one
/// instance should exist per process; two would race on key reads.
pub struct CrosstermTerminal {
    stdout: Stdout,
}

impl CrosstermTerminal {
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self {
            stdout: io::stdout(),
        })
    }
}

impl Drop for CrosstermTerminal {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl Terminal for CrosstermTerminal {
    fn poll_key(&mut self, timeout: Duration) -> Result<bool> {
        Ok(event::poll(timeout)?)
    }

    fn read_key(&mut self) -> Result<Key> {
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(map_key(key)),
            // Resize, focus, release events carry no key for the engine
            _ => Ok(Key::Other),
        }
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        self.stdout.write_all(text.as_bytes())?;
        self.stdout.flush()?;
        Ok(())
    }

    fn write_line(&mut self, text: &str) -> Result<()> {
        self.stdout.write_all(text.as_bytes())?;
        // Raw mode does not translate LF, so emit the full CRLF
        self.stdout.write_all(b"\r\n")?;
        self.stdout.flush()?;
        Ok(())
    }

    fn clear_line(&mut self) -> Result<()> {
        queue!(self.stdout, Clear(ClearType::CurrentLine))?;
        self.stdout.flush()?;
        Ok(())
    }

    fn move_to_column(&mut self, column: u16) -> Result<()> {
        queue!(self.stdout, cursor::MoveToColumn(column))?;
        self.stdout.flush()?;
        Ok(())
    }

    fn move_left(&mut self, count: u16) -> Result<()> {
        if count > 0 {
            queue!(self.stdout, cursor::MoveLeft(count))?;
            self.stdout.flush()?;
        }
        Ok(())
    }

    fn move_right(&mut self, count: u16) -> Result<()> {
        if count > 0 {
            queue!(self.stdout, cursor::MoveRight(count))?;
            self.stdout.flush()?;
        }
        Ok(())
    }

    fn cursor_column(&mut self) -> Result<u16> {
        let (column, _row) = cursor::position()?;
        Ok(column)
    }

    fn width(&mut self) -> u16 {
        terminal::size().map(|(width, _)| width).unwrap_or(80)
    }
}

fn map_key(key: KeyEvent) -> Key {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if let KeyCode::Char(c) = key.code {
            return Key::Ctrl(c.to_ascii_lowercase());
        }
    }
    match key.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Tab => Key::Tab,
        KeyCode::Esc => Key::Esc,
        _ => Key::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn maps_printable_and_control_keys() {
        assert_eq!(
            map_key(press(KeyCode::Char('a'), KeyModifiers::NONE)),
            Key::Char('a')
        );
        assert_eq!(
            map_key(press(KeyCode::Char('C'), KeyModifiers::CONTROL)),
            Key::Ctrl('c')
        );
        assert_eq!(map_key(press(KeyCode::Enter, KeyModifiers::NONE)), Key::Enter);
        assert_eq!(map_key(press(KeyCode::Up, KeyModifiers::NONE)), Key::Up);
        assert_eq!(map_key(press(KeyCode::F(5), KeyModifiers::NONE)), Key::Other);
    }
}
