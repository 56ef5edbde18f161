//! Line-oriented operator console
//!
//! Stands in for the kiosk front end when the service runs attended:
//! each stdin line is one command.

use anyhow::{Result, bail};
use voltbay_api::{ChargeDurations, DurationSlot};
use voltbay_util::Identity;

pub const HELP: &str = "\
commands:
  login <code>            authenticate at the kiosk
  logout                  forget the current user
  start <short|medium|long> <code>
                          start charging for the current user
  stop <code>             stop the current session
  ack                     clear a finished session
  dismiss <identity>      remove a finished roster entry
  emergency               trip the emergency stop
  reset                   clear the emergency stop (admin)
  durations [<s> <m> <l>] show or set session lengths (admin)
  codes [add|remove <code>]
                          list or edit user codes (admin)
  status                  print the station state
  help                    this text
  quit                    shut down";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Login(String),
    Logout,
    Start { slot: DurationSlot, confirm_code: String },
    Stop(String),
    Acknowledge,
    Dismiss(Identity),
    Emergency,
    Reset,
    ShowDurations,
    SetDurations(ChargeDurations),
    ListCodes,
    AddCode(String),
    RemoveCode(String),
    Status,
    Help,
    Quit,
}

impl ConsoleCommand {
    /// Whether only a logged-in admin may run this command
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            ConsoleCommand::Reset
                | ConsoleCommand::SetDurations(_)
                | ConsoleCommand::ListCodes
                | ConsoleCommand::AddCode(_)
                | ConsoleCommand::RemoveCode(_)
        )
    }
}

/// Parse one console line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&verb, rest)) = words.split_first() else {
        return Ok(None);
    };

    let command = match (verb.to_ascii_lowercase().as_str(), rest) {
        ("login", [code]) => ConsoleCommand::Login(code.to_string()),
        ("logout", []) => ConsoleCommand::Logout,
        ("start", [slot, code]) => ConsoleCommand::Start {
            slot: parse_slot(slot)?,
            confirm_code: code.to_string(),
        },
        ("stop", [code]) => ConsoleCommand::Stop(code.to_string()),
        ("ack", []) => ConsoleCommand::Acknowledge,
        ("dismiss", [identity]) => ConsoleCommand::Dismiss(Identity::new(*identity)),
        ("emergency", []) => ConsoleCommand::Emergency,
        ("reset", []) => ConsoleCommand::Reset,
        ("durations", []) => ConsoleCommand::ShowDurations,
        ("durations", [short, medium, long]) => ConsoleCommand::SetDurations(ChargeDurations::new(
            parse_minutes(short)?,
            parse_minutes(medium)?,
            parse_minutes(long)?,
        )),
        ("codes", []) => ConsoleCommand::ListCodes,
        ("codes", ["add", code]) => ConsoleCommand::AddCode(code.to_string()),
        ("codes", ["remove", code]) => ConsoleCommand::RemoveCode(code.to_string()),
        ("status", []) => ConsoleCommand::Status,
        ("help" | "?", []) => ConsoleCommand::Help,
        ("quit" | "exit", []) => ConsoleCommand::Quit,
        _ => bail!("unrecognized command: {}", line.trim()),
    };

    Ok(Some(command))
}

fn parse_slot(word: &str) -> Result<DurationSlot> {
    match word.to_ascii_lowercase().as_str() {
        "short" | "s" => Ok(DurationSlot::Short),
        "medium" | "m" => Ok(DurationSlot::Medium),
        "long" | "l" => Ok(DurationSlot::Long),
        other => bail!("unknown duration slot: {}", other),
    }
}

fn parse_minutes(word: &str) -> Result<u32> {
    match word.parse::<u32>() {
        Ok(minutes) => Ok(minutes),
        Err(_) => bail!("not a number of minutes: {}", word),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse_line("login 1001").unwrap(),
            Some(ConsoleCommand::Login("1001".into()))
        );
        assert_eq!(
            parse_line("  START long 1001 ").unwrap(),
            Some(ConsoleCommand::Start {
                slot: DurationSlot::Long,
                confirm_code: "1001".into()
            })
        );
        assert_eq!(
            parse_line("durations 15 45 120").unwrap(),
            Some(ConsoleCommand::SetDurations(ChargeDurations::new(15, 45, 120)))
        );
        assert_eq!(
            parse_line("codes remove 1004").unwrap(),
            Some(ConsoleCommand::RemoveCode("1004".into()))
        );
        assert_eq!(
            parse_line("dismiss user-3").unwrap(),
            Some(ConsoleCommand::Dismiss(Identity::user(3)))
        );
        assert_eq!(parse_line("").unwrap(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_line("start forever 1001").is_err());
        assert!(parse_line("start short").is_err());
        assert!(parse_line("durations 10 x 30").is_err());
        assert!(parse_line("login").is_err());
        assert!(parse_line("fly away").is_err());
    }

    #[test]
    fn test_admin_commands() {
        assert!(ConsoleCommand::Reset.requires_admin());
        assert!(ConsoleCommand::AddCode("2002".into()).requires_admin());
        assert!(!ConsoleCommand::Emergency.requires_admin());
        assert!(!ConsoleCommand::Stop("1001".into()).requires_admin());
    }
}
