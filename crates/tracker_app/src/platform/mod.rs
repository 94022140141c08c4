mod app;
mod cli;
mod config;
mod logging;
mod render;

pub use app::run;
