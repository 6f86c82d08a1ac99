use crate::terminal::Terminal;
use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use termloop_engine::{HistoryBuffer, HistoryNavigator};
use termloop_types::{ConsoleConfig, Error, Key, Result};

/// Everything the caller and the two background loops share. Guarded by one
/// coarse mutex; every observable state transition happens under it.
struct EngineState {
    input: String,
    output: VecDeque<String>,
    history: HistoryBuffer,
    navigator: HistoryNavigator,
    register_input: bool,
    register_output: bool,
    auto_flush: bool,
    flush_pending: bool,
    disposed: bool,
}

impl EngineState {
    fn new(config: &ConsoleConfig) -> Self {
        Self {
            input: String::new(),
            output: VecDeque::new(),
            history: HistoryBuffer::new(config.history_capacity),
            navigator: HistoryNavigator::new(),
            register_input: true,
            register_output: true,
            auto_flush: config.auto_flush,
            flush_pending: false,
            disposed: false,
        }
    }

    /// Run one key through the navigator against a snapshot of the input.
    fn route_navigation(&mut self, key: &Key) -> Option<String> {
        let current = self.input.clone();
        self.navigator.handle_key(key, &current, &mut self.history)
    }
}

type SharedState = Arc<Mutex<EngineState>>;
type SharedTerminal = Arc<Mutex<Box<dyn Terminal>>>;

/// The interactive console engine.
///
/// Owns the input buffer, the output FIFO, and the history buffer, and runs
/// two background polling threads for the engine's lifetime: an input loop
/// that routes keypresses (editing, history browsing, end-of-line) and an
/// output loop that drains queued lines to the terminal in strict FIFO order,
/// clearing and rewriting any partially typed input line around the flush.
///
/// All methods are non-blocking except [`read_line`](ConsoleEngine::read_line).
/// After [`dispose`](ConsoleEngine::dispose) every state-touching method
/// fails with [`Error::Disposed`].
pub struct ConsoleEngine {
    state: SharedState,
    line_rx: Mutex<Receiver<String>>,
    input_handle: Option<JoinHandle<()>>,
    output_handle: Option<JoinHandle<()>>,
}

impl ConsoleEngine {
    /// Start the engine over `terminal` and spawn both background loops.
    ///
    /// The terminal is treated as a process-wide singleton; running two
    /// engines against one terminal races on key reads.
    pub fn start(terminal: Box<dyn Terminal>, config: &ConsoleConfig) -> Result<Self> {
        let state: SharedState = Arc::new(Mutex::new(EngineState::new(config)));
        let terminal: SharedTerminal = Arc::new(Mutex::new(terminal));
        let (line_tx, line_rx) = channel();

        let input_handle = thread::Builder::new()
            .name("console-input".to_string())
            .spawn({
                let state = Arc::clone(&state);
                let terminal = Arc::clone(&terminal);
                let interval = config.input_poll();
                move || input_loop(&state, &terminal, &line_tx, interval)
            })?;

        let output_handle = thread::Builder::new()
            .name("console-output".to_string())
            .spawn({
                let state = Arc::clone(&state);
                let terminal = Arc::clone(&terminal);
                let interval = config.output_poll();
                move || output_loop(&state, &terminal, interval)
            })?;

        Ok(Self {
            state,
            line_rx: Mutex::new(line_rx),
            input_handle: Some(input_handle),
            output_handle: Some(output_handle),
        })
    }

    fn locked(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn live(&self) -> Result<MutexGuard<'_, EngineState>> {
        let state = self.locked();
        if state.disposed {
            return Err(Error::Disposed);
        }
        Ok(state)
    }

    /// Append a pre-formatted line to the output queue. Never blocks. With
    /// `immediate` set, the next output-loop cycle flushes even when
    /// auto-flush is off. Dropped silently while output registration is off.
    pub fn queue_output(&self, line: impl Into<String>, immediate: bool) -> Result<()> {
        let mut state = self.live()?;
        if state.register_output {
            state.output.push_back(line.into());
            if immediate {
                state.flush_pending = true;
            }
        }
        Ok(())
    }

    /// Ask the output loop to flush on its next cycle.
    pub fn request_flush(&self) -> Result<()> {
        self.live()?.flush_pending = true;
        Ok(())
    }

    /// Snapshot of the in-progress input line.
    pub fn input_buffer(&self) -> Result<String> {
        Ok(self.live()?.input.clone())
    }

    /// Return the in-progress input line and clear it.
    pub fn flush_input_buffer(&self) -> Result<String> {
        Ok(std::mem::take(&mut self.live()?.input))
    }

    pub fn clear_input_buffer(&self) -> Result<()> {
        self.live()?.input.clear();
        Ok(())
    }

    /// Atomically toggle whether keypresses and queued output are accepted.
    /// While input registration is off, pending keys are read and discarded.
    pub fn set_register_state(&self, input: bool, output: bool) -> Result<()> {
        let mut state = self.live()?;
        state.register_input = input;
        state.register_output = output;
        Ok(())
    }

    pub fn is_auto_flush(&self) -> Result<bool> {
        Ok(self.live()?.auto_flush)
    }

    pub fn set_auto_flush(&self, auto_flush: bool) -> Result<()> {
        self.live()?.auto_flush = auto_flush;
        Ok(())
    }

    /// Number of committed lines currently held for history browsing.
    pub fn history_len(&self) -> Result<usize> {
        Ok(self.live()?.history.len())
    }

    /// Number of lines still waiting in the output queue.
    pub fn output_len(&self) -> Result<usize> {
        Ok(self.live()?.output.len())
    }

    /// Block until the user commits a line with Enter, then return it.
    ///
    /// Forces a flush of anything already queued, suspends auto-flush while
    /// waiting so output cannot clobber the line being typed, and restores
    /// the previous auto-flush state before returning. The only blocking
    /// operation on the engine.
    pub fn read_line(&self) -> Result<String> {
        let previous_auto_flush = {
            let mut state = self.live()?;
            let previous = state.auto_flush;
            if previous {
                state.flush_pending = true;
            }
            state.auto_flush = false;
            previous
        };

        let received = {
            let receiver = self.line_rx.lock().unwrap_or_else(PoisonError::into_inner);
            receiver.recv()
        };

        {
            let mut state = self.locked();
            if !state.disposed {
                state.auto_flush = previous_auto_flush;
            }
        }

        received.map_err(|_| Error::Disposed)
    }

    /// Non-blocking variant of [`read_line`](ConsoleEngine::read_line):
    /// returns a line only if one has already been committed.
    pub fn try_read_line(&self) -> Result<Option<String>> {
        drop(self.live()?);
        // A pending read_line holds the receiver lock while it waits; never
        // join that wait, just report that no line is available
        let receiver = match self.line_rx.try_lock() {
            Ok(receiver) => receiver,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return Ok(None),
        };
        match receiver.try_recv() {
            Ok(line) => Ok(Some(line)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(Error::Disposed),
        }
    }

    /// Irreversibly stop both background loops and join them. The loops
    /// observe the flag within one polling interval. Disposing while a
    /// `read_line` is pending is unsupported; the reader is unblocked with
    /// [`Error::Disposed`] rather than the line it was waiting for.
    pub fn dispose(&mut self) -> Result<()> {
        self.live()?.disposed = true;
        if let Some(handle) = self.input_handle.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.output_handle.take() {
            let _ = handle.join();
        }
        Ok(())
    }
}

impl Drop for ConsoleEngine {
    fn drop(&mut self) {
        let _ = self.dispose();
    }
}

fn lock_state(state: &SharedState) -> MutexGuard<'_, EngineState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn lock_terminal(terminal: &SharedTerminal) -> MutexGuard<'_, Box<dyn Terminal>> {
    terminal.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Poll for pending keys and route them. Lock order is always state before
/// terminal; the bare poll step takes only the terminal lock.
fn input_loop(
    state: &SharedState,
    terminal: &SharedTerminal,
    line_tx: &Sender<String>,
    interval: Duration,
) {
    loop {
        let register_input = {
            let state = lock_state(state);
            if state.disposed {
                break;
            }
            state.register_input
        };

        if !register_input {
            discard_pending_keys(terminal);
            thread::sleep(interval);
            continue;
        }

        let key = {
            let mut terminal = lock_terminal(terminal);
            match terminal.poll_key(Duration::ZERO) {
                Ok(true) => terminal.read_key().ok(),
                _ => None,
            }
        };

        if let Some(key) = key {
            apply_key(state, terminal, line_tx, key);
            // Drain any burst (paste, scripted input) before sleeping
            continue;
        }

        thread::sleep(interval);
    }
}

fn discard_pending_keys(terminal: &SharedTerminal) {
    let mut terminal = lock_terminal(terminal);
    while let Ok(true) = terminal.poll_key(Duration::ZERO) {
        if terminal.read_key().is_err() {
            break;
        }
    }
}

/// Route one keypress through the engine state and update the display.
fn apply_key(state: &SharedState, terminal: &SharedTerminal, line_tx: &Sender<String>, key: Key) {
    let mut state = lock_state(state);
    // Both flags can have flipped between the poll and this point
    if state.disposed || !state.register_input {
        return;
    }
    let mut terminal = lock_terminal(terminal);

    match key {
        Key::Up | Key::Down => {
            if let Some(text) = state.route_navigation(&key) {
                state.input = text.clone();
                let _ = redraw_line(terminal.as_mut(), &text);
            }
        }
        Key::Enter => {
            // A pending browse commits before the line is taken
            let _ = state.route_navigation(&Key::Enter);
            let line = std::mem::take(&mut state.input);
            let EngineState {
                navigator, history, ..
            } = &mut *state;
            navigator.record_submission(history, &line);
            let _ = terminal.write_line("");
            // History is updated first, then the end-of-line event fires
            let _ = line_tx.send(line);
        }
        Key::Backspace => {
            let _ = state.route_navigation(&Key::Backspace);
            if state.input.pop().is_some() {
                let _ = erase_last_glyph(terminal.as_mut());
            }
        }
        Key::Left => {
            if terminal.cursor_column().is_ok_and(|column| column > 0) {
                let _ = terminal.move_left(1);
            }
        }
        Key::Right => {
            let input_width = state.input.chars().count();
            if terminal
                .cursor_column()
                .is_ok_and(|column| (column as usize) < input_width)
            {
                let _ = terminal.move_right(1);
            }
        }
        Key::Char(c) => {
            let _ = state.route_navigation(&key);
            state.input.push(c);
            let mut echo = [0u8; 4];
            let _ = terminal.write_text(c.encode_utf8(&mut echo));
        }
        Key::Tab | Key::Esc | Key::Ctrl(_) | Key::Other => {
            // Not echoed, but still a non-navigation key: an active browse
            // commits before the key is dropped
            let _ = state.route_navigation(&key);
        }
    }
}

fn redraw_line(terminal: &mut dyn Terminal, text: &str) -> Result<()> {
    terminal.clear_line()?;
    terminal.move_to_column(0)?;
    terminal.write_text(text)
}

fn erase_last_glyph(terminal: &mut dyn Terminal) -> Result<()> {
    terminal.move_left(1)?;
    terminal.write_text(" ")?;
    terminal.move_left(1)
}

/// Drain the output queue in strict FIFO order whenever auto-flush is on or a
/// flush was requested. The state lock is held across the terminal writes so
/// no keystroke can interleave with a half-finished flush.
fn output_loop(state: &SharedState, terminal: &SharedTerminal, interval: Duration) {
    loop {
        {
            let mut state = lock_state(state);
            if state.disposed {
                break;
            }
            if !state.output.is_empty() && (state.auto_flush || state.flush_pending) {
                let lines: Vec<String> = state.output.drain(..).collect();
                state.flush_pending = false;
                let mut terminal = lock_terminal(terminal);
                let _ = flush_lines(terminal.as_mut(), &lines, &state.input);
            }
        }
        thread::sleep(interval);
    }
}

/// One flush cycle: clear and home a partially typed line first, write every
/// queued line in order, then rewrite the input buffer back onto the line.
fn flush_lines(terminal: &mut dyn Terminal, lines: &[String], input: &str) -> Result<()> {
    let cleared = terminal.cursor_column()? > 0;
    if cleared {
        terminal.clear_line()?;
        terminal.move_to_column(0)?;
    }
    for line in lines {
        terminal.write_line(line)?;
    }
    if cleared && !input.is_empty() {
        terminal.write_text(input)?;
    }
    Ok(())
}
