mod clock;
mod controller;
mod engine;
mod schedule;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{ControllerOptions, SaveOutcome, SubscriptionId, TimerController};
pub use engine::{CompletedWork, TimerEngine, TimerSnapshot};
pub use schedule::{PhaseDurations, TimerMode};
