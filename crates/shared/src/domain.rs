use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(ChatId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Hacker,
    Money,
    Playboy,
}

impl Mode {
    /// Fixed label order, also used to break ties when ranking recommendations.
    pub const ALL: [Mode; 3] = [Mode::Hacker, Mode::Money, Mode::Playboy];

    pub fn key(self) -> &'static str {
        match self {
            Mode::Hacker => "hacker",
            Mode::Money => "money",
            Mode::Playboy => "playboy",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Hacker => "Hacker",
            Mode::Money => "Money",
            Mode::Playboy => "Playboy",
        }
    }

    pub fn command(self) -> &'static str {
        match self {
            Mode::Hacker => "/hacker",
            Mode::Money => "/money",
            Mode::Playboy => "/playboy",
        }
    }

    pub fn from_command(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.command() == text)
    }
}

/// Seconds logged per mode.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TotalTime {
    #[serde(default)]
    pub hacker: f64,
    #[serde(default)]
    pub money: f64,
    #[serde(default)]
    pub playboy: f64,
}

impl TotalTime {
    pub fn get(&self, mode: Mode) -> f64 {
        match mode {
            Mode::Hacker => self.hacker,
            Mode::Money => self.money,
            Mode::Playboy => self.playboy,
        }
    }

    pub fn slot_mut(&mut self, mode: Mode) -> &mut f64 {
        match mode {
            Mode::Hacker => &mut self.hacker,
            Mode::Money => &mut self.money,
            Mode::Playboy => &mut self.playboy,
        }
    }

    pub fn sum(&self) -> f64 {
        self.hacker + self.money + self.playboy
    }
}

/// The single persisted session record.
///
/// Field names follow the on-disk JSON document:
/// `{"mode": ..., "start_time": ..., "total_time": {...}}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub mode: Option<Mode>,
    #[serde(default)]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub total_time: TotalTime,
}

impl SessionState {
    /// Repairs records that break the state invariants.
    ///
    /// A start time without a mode is dropped, a mode without a start time
    /// keeps the mode and restarts its timer on the next command, and negative
    /// or non-finite totals are clamped to zero.
    pub fn normalized(mut self) -> Self {
        if self.mode.is_none() {
            self.start_time = None;
        }
        if matches!(self.start_time, Some(start) if !start.is_finite()) {
            self.start_time = None;
        }
        for mode in Mode::ALL {
            let slot = self.total_time.slot_mut(mode);
            if !slot.is_finite() || *slot < 0.0 {
                *slot = 0.0;
            }
        }
        self
    }
}
