mod engine;
mod terminal;

pub use engine::ConsoleEngine;
pub use terminal::crossterm::CrosstermTerminal;
pub use terminal::Terminal;
