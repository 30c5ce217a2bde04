//! Time-window admission and the per-day emission cap.

pub mod gate;
pub mod ledger;
pub mod window;

pub use gate::{Admission, GateDecision, Rejection, WindowGate, WindowSlot};
pub use ledger::DailyLedger;
pub use window::{ScheduledInstant, TimeWindow};
