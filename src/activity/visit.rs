use tracing::debug;

use crate::{
    activity::{ActivityLogger, VISIT},
    navigation::{NavigationListener, Navigator},
};

/// Records one `"visit"` entry per distinct navigation while a user is
/// signed in. The path that is current when the recorder is attached counts
/// as the first visit.
///
/// Entries are built inside [`Navigator::navigate`], so the identity gate
/// sees who was signed in when the navigation happened. Recording stops when
/// the recorder or the navigator is dropped.
pub struct VisitRecorder {
    listener: NavigationListener,
}

impl VisitRecorder {
    pub fn attach(navigator: &Navigator, logger: ActivityLogger) -> Self {
        record(&logger, &navigator.current());
        let listener = navigator.on_navigate(move |path| record(&logger, path));
        debug!("Visit recorder attached");
        Self { listener }
    }

    /// False once the navigator is gone
    pub fn is_recording(&self) -> bool {
        self.listener.is_attached()
    }
}

fn record(logger: &ActivityLogger, path: &str) {
    logger.log_activity(VISIT, format!("Visited {path}"));
}
