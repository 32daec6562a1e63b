//! Navigation between application screens.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Screens the booking workflow can leave to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    /// The user's bookings list
    Bookings,
    /// The dashboard
    Dashboard,
}

impl Route {
    /// Path of the screen
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Bookings => "/bookings",
            Self::Dashboard => "/dashboard",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Moves the user to another screen
pub trait Navigator: Send + Sync {
    /// Navigate to a route
    fn navigate(&self, route: Route);
}

/// Navigator that only logs, for headless runs
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, route: Route) {
        tracing::info!(path = route.path(), "Navigating");
    }
}

/// Navigator that records every route, for tests
#[derive(Clone, Debug, Default)]
pub struct RecordingNavigator {
    visited: Arc<Mutex<Vec<Route>>>,
}

impl RecordingNavigator {
    /// Creates an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes navigated to so far
    #[must_use]
    pub fn routes(&self) -> Vec<Route> {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route);
    }
}
