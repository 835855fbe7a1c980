//! Charts module - static chart rendering and dashboard assembly

mod page;
mod renderer;

pub use renderer::{render_dashboard, ChartError};
