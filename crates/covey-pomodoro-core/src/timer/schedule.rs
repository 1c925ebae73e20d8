use serde::{Deserialize, Serialize};

/// Phase of the Pomodoro cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    Work,
    ShortBreak,
    LongBreak,
}

impl TimerMode {
    pub fn label(self) -> &'static str {
        match self {
            TimerMode::Work => "Work",
            TimerMode::ShortBreak => "Short Break",
            TimerMode::LongBreak => "Long Break",
        }
    }
}

impl std::fmt::Display for TimerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Target duration of each phase and the long-break cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDurations {
    pub work_secs: u64,
    pub short_break_secs: u64,
    pub long_break_secs: u64,
    /// Every n-th completed Work phase is followed by a long break.
    pub sessions_before_long_break: u32,
}

impl PhaseDurations {
    pub fn duration_secs(&self, mode: TimerMode) -> u64 {
        match mode {
            TimerMode::Work => self.work_secs,
            TimerMode::ShortBreak => self.short_break_secs,
            TimerMode::LongBreak => self.long_break_secs,
        }
    }

    /// Duration in milliseconds, saturating on absurd values.
    pub fn duration_ms(&self, mode: TimerMode) -> u64 {
        self.duration_secs(mode).saturating_mul(1000)
    }

    /// Which break follows the `completed`-th finished Work phase.
    pub fn break_after(&self, completed: u32) -> TimerMode {
        let every = self.sessions_before_long_break.max(1);
        if completed > 0 && completed % every == 0 {
            TimerMode::LongBreak
        } else {
            TimerMode::ShortBreak
        }
    }
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            work_secs: 25 * 60,
            short_break_secs: 5 * 60,
            long_break_secs: 15 * 60,
            sessions_before_long_break: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_durations() {
        let d = PhaseDurations::default();
        assert_eq!(d.duration_secs(TimerMode::Work), 1500);
        assert_eq!(d.duration_secs(TimerMode::ShortBreak), 300);
        assert_eq!(d.duration_secs(TimerMode::LongBreak), 900);
        assert_eq!(d.duration_ms(TimerMode::Work), 1_500_000);
    }

    #[test]
    fn every_fourth_break_is_long() {
        let d = PhaseDurations::default();
        let breaks: Vec<_> = (1..=8).map(|n| d.break_after(n)).collect();
        assert_eq!(breaks[3], TimerMode::LongBreak);
        assert_eq!(breaks[7], TimerMode::LongBreak);
        assert_eq!(
            breaks.iter().filter(|m| **m == TimerMode::ShortBreak).count(),
            6
        );
    }

    #[test]
    fn mode_serializes_snake_case() {
        let json = serde_json::to_string(&TimerMode::ShortBreak).unwrap();
        assert_eq!(json, "\"short_break\"");
    }
}
