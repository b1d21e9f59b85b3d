mod canvas;
mod command;
mod feeders;
mod styles;
mod transcript;
mod tui;
mod view;

pub use canvas::MapCanvas;
pub use feeders::spawn_tui_feeders;
pub use tui::{TuiApp, TuiMsg};
