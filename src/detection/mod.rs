pub mod change_detector;

pub use change_detector::{
    ChangeDetector, ChangeResult, FIRST_PUBLISH_REASON, NO_CHANGES_REASON, detect_changes,
};
