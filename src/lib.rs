//! Thumbwatch - finds recordings whose thumbnail was captured while still
//! black and asks the media server to regenerate it.

pub mod analysis;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod jobs;
pub mod logging;
