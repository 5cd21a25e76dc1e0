use shared::domain::{Mode, SessionState};

use crate::balance::{format_hms, recommend_totals};

pub const HELP_TEXT: &str = "/hacker\n/money\n/playboy\n/summary";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Switch(Mode),
    Summary,
    Help,
}

impl Command {
    /// Commands match exactly; anything unrecognized asks for help.
    pub fn parse(text: &str) -> Self {
        if let Some(mode) = Mode::from_command(text) {
            return Command::Switch(mode);
        }
        if text == "/summary" {
            return Command::Summary;
        }
        Command::Help
    }

    pub fn requested_mode(self) -> Option<Mode> {
        match self {
            Command::Switch(mode) => Some(mode),
            Command::Summary | Command::Help => None,
        }
    }
}

pub fn summary_report(state: &SessionState) -> String {
    let current = state.mode.map(Mode::label).unwrap_or("Unknown");
    let lines: Vec<String> = recommend_totals(&state.total_time)
        .entries
        .iter()
        .map(|entry| format!("{} => {}", entry.mode.label(), format_hms(entry.seconds)))
        .collect();
    format!("Current Mode: {current}\n\n{}", lines.join("\n\n"))
}
