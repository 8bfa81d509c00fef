//! Navigator that records redirects instead of performing them.
//!
//! Used by the CLI (which reports where the page would go) and by tests.

use std::sync::Mutex;

use tracing::info;

use crate::domain::Navigator;

#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirects(&self) -> Vec<String> {
        match self.redirects.lock() {
            Ok(redirects) => redirects.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn last(&self) -> Option<String> {
        self.redirects().pop()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, target: &str) {
        info!(to = target, "Redirect");
        match self.redirects.lock() {
            Ok(mut redirects) => redirects.push(target.to_string()),
            Err(poisoned) => poisoned.into_inner().push(target.to_string()),
        }
    }
}
