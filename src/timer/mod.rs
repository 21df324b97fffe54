pub mod controller;
pub mod error;
pub mod phase_timer;
pub mod session_log;
pub mod state;

pub use controller::{TimerController, TimerEvent, TimerSnapshot};
pub use error::TimerError;
pub use phase_timer::{PhaseTimer, TimerSignal};
pub use session_log::{Clock, SessionLog, SystemClock};
pub use state::{Phase, PhaseSlot, TimerConfig, TimerState};
