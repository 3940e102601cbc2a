// CLI definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use zmk_slider::config::Config;

#[derive(Parser, Debug)]
#[command(name = "zmk-slider")]
#[command(author, version, about = "Drive the vendor value report of a ZMK keyboard")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file path (default: ~/.config/zmk-slider/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// HID usage page of the vendor interface (e.g. 0xff0b)
    #[arg(long, global = true, value_parser = parse_u16)]
    pub usage_page: Option<u16>,

    /// Only offer devices with this vendor ID
    #[arg(long, global = true, value_parser = parse_u16)]
    pub vid: Option<u16>,

    /// Only offer devices with this product ID
    #[arg(long, global = true, value_parser = parse_u16)]
    pub pid: Option<u16>,

    /// Choose the device interactively instead of taking the first match
    #[arg(long, global = true)]
    pub prompt: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// List HID interfaces matching the filter
    #[command(visible_alias = "ls")]
    List {
        /// Show every HID interface, ignoring the filter
        #[arg(short, long)]
        all: bool,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the value currently held by the device
    #[command(visible_alias = "get")]
    Read {
        /// How long to wait for the device to answer
        #[arg(long, default_value = "1000")]
        timeout_ms: u64,
    },

    /// Send one value to the device
    Set {
        /// Value (0-255)
        value: u8,
    },

    /// Print every value change until interrupted
    Watch,

    /// Interactive slider (default)
    Tui,
}

impl Cli {
    /// Apply command-line overrides on top of the config file
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(page) = self.usage_page {
            config.filter.usage_page = page;
        }
        if let Some(vid) = self.vid {
            config.filter.vendor_id = Some(vid);
        }
        if let Some(pid) = self.pid {
            config.filter.product_id = Some(pid);
        }
    }
}

/// Parse a u16 given in decimal or with a 0x prefix
fn parse_u16(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number '{}': {}", s, e))
}
