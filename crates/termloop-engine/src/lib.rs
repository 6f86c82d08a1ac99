mod history;
mod navigator;

pub use history::HistoryBuffer;
pub use navigator::{BrowseState, HistoryNavigator};
