//! Testing infrastructure for termloop integration tests.
//!
//! - [`ScriptedTerminal`]: deterministic [`Terminal`](termloop_runtime::Terminal)
//!   fake driven by a key script, with a probe for inspecting everything the
//!   engine drew
//! - [`wait_until`]: polling assertion helper for the background loops

mod scripted;
mod wait;

pub use scripted::{ScriptedTerminal, TerminalOp, TerminalProbe};
pub use wait::wait_until;
