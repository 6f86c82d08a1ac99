use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use termloop_runtime::Terminal;
use termloop_types::{Key, Result};

/// One recorded terminal operation, in the order the engine issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalOp {
    Write(String),
    WriteLine(String),
    ClearLine,
    MoveToColumn(u16),
    MoveLeft(u16),
    MoveRight(u16),
}

#[derive(Debug, Default)]
struct ScriptedInner {
    keys: VecDeque<Key>,
    ops: Vec<TerminalOp>,
    column: u16,
}

/// Deterministic in-memory [`Terminal`] for driving the engine in tests.
///
/// Keys come from a script that tests can extend at any time through the
/// probe; every draw operation is recorded with the cursor column tracked
/// the way a real terminal would.
pub struct ScriptedTerminal {
    inner: Arc<Mutex<ScriptedInner>>,
}

/// Shared view into a [`ScriptedTerminal`] owned by the engine.
#[derive(Clone)]
pub struct TerminalProbe {
    inner: Arc<Mutex<ScriptedInner>>,
}

impl ScriptedTerminal {
    pub fn new(keys: impl IntoIterator<Item = Key>) -> (Self, TerminalProbe) {
        let inner = Arc::new(Mutex::new(ScriptedInner {
            keys: keys.into_iter().collect(),
            ops: Vec::new(),
            column: 0,
        }));
        let probe = TerminalProbe {
            inner: Arc::clone(&inner),
        };
        (Self { inner }, probe)
    }

    /// A terminal with no scripted keys; feed them later via the probe.
    pub fn idle() -> (Self, TerminalProbe) {
        Self::new([])
    }

    fn lock(&self) -> MutexGuard<'_, ScriptedInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TerminalProbe {
    fn lock(&self) -> MutexGuard<'_, ScriptedInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append keys to the script, making them visible to the input loop.
    pub fn push_keys(&self, keys: impl IntoIterator<Item = Key>) {
        self.lock().keys.extend(keys);
    }

    /// Type a string followed by Enter.
    pub fn type_line(&self, text: &str) {
        let mut keys: Vec<Key> = text.chars().map(Key::Char).collect();
        keys.push(Key::Enter);
        self.push_keys(keys);
    }

    pub fn pending_keys(&self) -> usize {
        self.lock().keys.len()
    }

    pub fn ops(&self) -> Vec<TerminalOp> {
        self.lock().ops.clone()
    }

    /// Lines the engine flushed with a terminator, in write order.
    pub fn written_lines(&self) -> Vec<String> {
        self.lock()
            .ops
            .iter()
            .filter_map(|op| match op {
                TerminalOp::WriteLine(line) => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    /// Everything written, newline-joined, clears and cursor moves elided.
    pub fn output_text(&self) -> String {
        let mut text = String::new();
        for op in self.lock().ops.iter() {
            match op {
                TerminalOp::Write(s) => text.push_str(s),
                TerminalOp::WriteLine(s) => {
                    text.push_str(s);
                    text.push('\n');
                }
                _ => {}
            }
        }
        text
    }

    pub fn cursor_column(&self) -> u16 {
        self.lock().column
    }
}

impl Terminal for ScriptedTerminal {
    fn poll_key(&mut self, _timeout: Duration) -> Result<bool> {
        Ok(!self.lock().keys.is_empty())
    }

    fn read_key(&mut self) -> Result<Key> {
        // The engine only reads after a positive poll
        Ok(self.lock().keys.pop_front().unwrap_or(Key::Other))
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.column += text.chars().count() as u16;
        inner.ops.push(TerminalOp::Write(text.to_string()));
        Ok(())
    }

    fn write_line(&mut self, text: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.column = 0;
        inner.ops.push(TerminalOp::WriteLine(text.to_string()));
        Ok(())
    }

    fn clear_line(&mut self) -> Result<()> {
        self.lock().ops.push(TerminalOp::ClearLine);
        Ok(())
    }

    fn move_to_column(&mut self, column: u16) -> Result<()> {
        let mut inner = self.lock();
        inner.column = column;
        inner.ops.push(TerminalOp::MoveToColumn(column));
        Ok(())
    }

    fn move_left(&mut self, count: u16) -> Result<()> {
        let mut inner = self.lock();
        inner.column = inner.column.saturating_sub(count);
        inner.ops.push(TerminalOp::MoveLeft(count));
        Ok(())
    }

    fn move_right(&mut self, count: u16) -> Result<()> {
        let mut inner = self.lock();
        inner.column += count;
        inner.ops.push(TerminalOp::MoveRight(count));
        Ok(())
    }

    fn cursor_column(&mut self) -> Result<u16> {
        Ok(self.lock().column)
    }

    fn width(&mut self) -> u16 {
        80
    }
}
