mod capture_orchestrator;
mod notifier;
mod still_capture;

pub use {
    capture_orchestrator::{CaptureOrchestrator, OrchestratorSettings},
    notifier::{Notifier, OverlayMode},
    still_capture::{DisplayInfo, StillCapture, WindowInfo},
};
