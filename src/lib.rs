//! ZMK slider host tool
//!
//! Configuration and the terminal slider. Device access lives in
//! `zmk-transport`, session state in `zmk-session`.

pub mod config;
pub mod tui;
