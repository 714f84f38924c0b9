//! Charts module - Chart rendering

mod renderer;

pub use renderer::{CategoryChart, ChartError, ChartRenderer, SeriesData};
