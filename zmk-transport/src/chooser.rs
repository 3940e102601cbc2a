//! User-mediated device selection

use std::io::{self, BufRead, Write};

use crate::types::DeviceInfo;

/// How `request_device` picks among matching interfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Chooser {
    /// Take the first match without asking
    #[default]
    First,
    /// List matches on the terminal and read a choice from stdin
    Prompt,
}

/// Parse a menu answer; empty input or anything out of range means "cancel"
pub fn parse_selection(input: &str, count: usize) -> Option<usize> {
    let index = input.trim().parse::<usize>().ok()?;
    (index < count).then_some(index)
}

/// Print the candidates and block until the user picks one
pub fn prompt_selection(devices: &[DeviceInfo]) -> io::Result<Option<usize>> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "Select a device:")?;
    for (i, d) in devices.iter().enumerate() {
        writeln!(
            out,
            "  [{}] {} ({:04x}:{:04x}) if={} {}",
            i,
            d.display_name(),
            d.vid,
            d.pid,
            d.interface_number,
            d.path
        )?;
    }
    write!(out, "Enter number (blank to cancel): ")?;
    out.flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(parse_selection(&input, devices.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("0\n", 2), Some(0));
        assert_eq!(parse_selection(" 1 ", 2), Some(1));
        assert_eq!(parse_selection("2", 2), None);
        assert_eq!(parse_selection("", 2), None);
        assert_eq!(parse_selection("abc", 2), None);
    }
}
