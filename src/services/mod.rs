//! Service layer: format conversion, merging, write checks and propagation.

pub mod card_service;
pub mod conflict_detector;
pub mod reconciler;
pub mod sync_controller;
pub mod transcoder;

pub use card_service::CardService;
pub use conflict_detector::ConflictDetector;
pub use reconciler::{merge_from_json, merge_from_secondary};
pub use sync_controller::{
    BootstrapOutcome, ControllerState, PassOutcome, PropagationGuard, PropagationLock,
    SyncController, SyncSettings,
};
pub use transcoder::{parse_outline, render_narrative, render_outline, split_narrative};
