// Operator commands typed into the outgoing text stream.
//
// Anything starting with the configured prefix belongs to us and is never
// forwarded, whether or not it names a known command.

use crate::core_modules::tracking_store::TrackingCounts;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Status,
    ToggleDebug,
    /// Prefixed, but not a command we know.
    Unknown,
}

/// Parses `text` against `prefix`. `None` means the text is not ours.
pub fn parse(text: &str, prefix: &str) -> Option<Command> {
    let trimmed = text.trim();
    let head = trimmed.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    let rest = &trimmed[prefix.len()..];
    let command = if rest.eq_ignore_ascii_case("status") {
        Command::Status
    } else if rest.eq_ignore_ascii_case("debug") {
        Command::ToggleDebug
    } else {
        Command::Unknown
    };
    Some(command)
}

pub fn on_off(flag: bool) -> &'static str {
    if flag { "ON" } else { "OFF" }
}

/// The status report, one line per entry.
pub fn status_lines(counts: &TrackingCounts, debug: bool) -> Vec<String> {
    vec![
        "========== GHOST STATUS ==========".to_string(),
        format!("Total Ghosts Found (All Time): {}", counts.total_found),
        format!("Current Ghosts Tracked: {}", counts.tracked),
        format!("Claimed Ghosts: {}", counts.claimed),
        format!("Unclaimed Ghosts (With Flames): {}", counts.unclaimed),
        format!("Debug Mode: {}", on_off(debug)),
        "==================================".to_string(),
    ]
}

pub fn debug_toggled_line(debug: bool) -> String {
    format!("Debug mode: {}", on_off(debug))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "//ghost";

    #[test]
    fn known_commands_any_case() {
        assert_eq!(parse("//ghoststatus", PREFIX), Some(Command::Status));
        assert_eq!(parse("//GhostStatus", PREFIX), Some(Command::Status));
        assert_eq!(parse("  //ghostdebug ", PREFIX), Some(Command::ToggleDebug));
        assert_eq!(parse("//GHOSTDEBUG", PREFIX), Some(Command::ToggleDebug));
    }

    #[test]
    fn prefixed_unknown_text_is_still_ours() {
        assert_eq!(parse("//ghost", PREFIX), Some(Command::Unknown));
        assert_eq!(parse("//ghostfoo", PREFIX), Some(Command::Unknown));
        assert_eq!(parse("//ghoststatus now", PREFIX), Some(Command::Unknown));
    }

    #[test]
    fn other_text_is_not_ours() {
        assert_eq!(parse("hello", PREFIX), None);
        assert_eq!(parse("//gho", PREFIX), None);
        assert_eq!(parse("/ghoststatus", PREFIX), None);
        assert_eq!(parse("", PREFIX), None);
        // Multi-byte text shorter than the prefix must not panic.
        assert_eq!(parse("ñ", PREFIX), None);
        assert_eq!(parse("//ghosé", PREFIX), None);
    }

    #[test]
    fn status_report_lines() {
        let counts = TrackingCounts {
            total_found: 5,
            tracked: 3,
            claimed: 1,
            unclaimed: 2,
        };
        let lines = status_lines(&counts, true);
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "========== GHOST STATUS ==========");
        assert_eq!(lines[1], "Total Ghosts Found (All Time): 5");
        assert_eq!(lines[2], "Current Ghosts Tracked: 3");
        assert_eq!(lines[3], "Claimed Ghosts: 1");
        assert_eq!(lines[4], "Unclaimed Ghosts (With Flames): 2");
        assert_eq!(lines[5], "Debug Mode: ON");
        assert!(lines[6].starts_with("====="));
    }
}
