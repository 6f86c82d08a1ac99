use crate::HistoryBuffer;
use termloop_types::Key;

/// Where the navigator currently sits within history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseState {
    Idle,
    /// `selected` is the history index currently shown on the input line.
    /// Index 0 is the synthetic entry (the saved in-progress input).
    Browsing { selected: usize },
}

/// Shell-style up/down history browsing over a [`HistoryBuffer`].
///
/// The navigator never touches the terminal or the engine's input buffer
/// directly: [`handle_key`](HistoryNavigator::handle_key) receives a snapshot
/// of the current input and returns the text the input line should be
/// replaced with, if any. The engine applies the display update.
///
/// Entering browse mode pushes the in-progress input onto the history buffer
/// as a synthetic entry, so stepping back down to index 0 restores it.
/// Committing mid-browse (any non-navigation key) permanently consumes the
/// synthetic entry and every entry browsed through on the way.
#[derive(Debug)]
pub struct HistoryNavigator {
    state: BrowseState,
}

impl Default for HistoryNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self {
            state: BrowseState::Idle,
        }
    }

    pub fn state(&self) -> BrowseState {
        self.state
    }

    pub fn is_browsing(&self) -> bool {
        matches!(self.state, BrowseState::Browsing { .. })
    }

    /// Route one keypress. Returns `Some(text)` when the input line must be
    /// replaced with `text`; `None` lets the key proceed normally.
    pub fn handle_key(
        &mut self,
        key: &Key,
        current_input: &str,
        history: &mut HistoryBuffer,
    ) -> Option<String> {
        match (self.state, key) {
            (BrowseState::Idle, Key::Up) => {
                if history.is_empty() {
                    return None;
                }
                history.push(current_input.to_string());
                self.state = BrowseState::Browsing { selected: 1 };
                history.element_at(1).ok().map(str::to_string)
            }
            (BrowseState::Idle, _) => None,
            (BrowseState::Browsing { selected }, Key::Up) => {
                if !history.has_element_at(selected + 1) {
                    return None;
                }
                self.state = BrowseState::Browsing {
                    selected: selected + 1,
                };
                history.element_at(selected + 1).ok().map(str::to_string)
            }
            (BrowseState::Browsing { selected: 0 }, Key::Down) => {
                self.state = BrowseState::Idle;
                history.pop().ok()
            }
            (BrowseState::Browsing { selected }, Key::Down) => {
                self.state = BrowseState::Browsing {
                    selected: selected - 1,
                };
                history.element_at(selected - 1).ok().map(str::to_string)
            }
            (BrowseState::Browsing { selected }, _) => {
                // Commit: the synthetic entry and everything browsed through
                // are consumed, then the key applies to the input as usual.
                for _ in 0..=selected {
                    let _ = history.pop();
                }
                self.state = BrowseState::Idle;
                None
            }
        }
    }

    /// Record a committed line after Enter. Consecutive identical lines are
    /// not duplicated.
    pub fn record_submission(&self, history: &mut HistoryBuffer, line: &str) {
        if history.top().is_ok_and(|top| top == line) {
            return;
        }
        history.push(line.to_string());
    }
}
