mod burst_status;
mod clock;
mod manager;
mod template;

pub use {
    burst_status::BurstStatus,
    clock::{Clock, SystemClock},
    manager::{SessionManager, SessionSettings},
    template::{DEFAULT_TEMPLATE, FileNameTemplate},
};
