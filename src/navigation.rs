//! Navigation seam for the transport's forced-redirect path.
//!
//! The transport never talks to the view layer directly; on forced expiry
//! it asks a [`NavigationSink`] where the user currently is and, unless
//! they are already at a sign-in entry point, sends them there.

use parking_lot::Mutex;

/// Route of the sign-in entry point.
pub const SIGN_IN_ROUTE: &str = "/signin";
/// Staff-specific sign-in entry variant.
pub const STAFF_SIGN_IN_ROUTE: &str = "/staff/signin";

/// Whether `route` already is a sign-in entry point. Query strings and
/// fragments are ignored so `/signin?expired=1` does not re-redirect.
pub fn is_sign_in_route(route: &str) -> bool {
    let path = route.split(['?', '#']).next().unwrap_or(route);
    path == SIGN_IN_ROUTE || path == STAFF_SIGN_IN_ROUTE
}

/// Where the user is and how to move them. Implemented by the embedding
/// host (web view bridge, TUI router, …).
pub trait NavigationSink: Send + Sync {
    fn current_route(&self) -> String;
    fn navigate(&self, route: &str);
}

/// Sink that records navigations for hosts that poll, and for tests.
#[derive(Default)]
pub struct RecordingNavigator {
    route: Mutex<String>,
    visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new(initial_route: &str) -> Self {
        Self {
            route: Mutex::new(initial_route.to_string()),
            visited: Mutex::new(Vec::new()),
        }
    }

    /// Routes navigated to so far, oldest first.
    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().clone()
    }
}

impl NavigationSink for RecordingNavigator {
    fn current_route(&self) -> String {
        self.route.lock().clone()
    }

    fn navigate(&self, route: &str) {
        *self.route.lock() = route.to_string();
        self.visited.lock().push(route.to_string());
    }
}
