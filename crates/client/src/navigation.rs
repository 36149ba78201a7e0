//! Navigation targets and the sink that receives redirects.
//!
//! The session layer decides *where* the user must go (login after teardown,
//! a role landing view after sign-in). The shell hosting the runtime decides
//! *how* to get there by implementing [`Navigator`].

use std::fmt;

use tokio::sync::watch;

use fastbite_core::Role;

/// A view the runtime can send the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Login entry point.
    Login,
    /// Customer menu.
    CustomerMenu,
    /// Kitchen order dashboard.
    KitchenDashboard,
    /// Delivery dashboard.
    DeliveryDashboard,
}

impl Route {
    /// Path of the view.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::CustomerMenu => "/customer/menu",
            Self::KitchenDashboard => "/kitchen/dashboard",
            Self::DeliveryDashboard => "/delivery/dashboard",
        }
    }

    /// Landing view for a role. Unrecognized roles land on login.
    #[must_use]
    pub const fn landing_for(role: &Role) -> Self {
        match role {
            Role::Customer => Self::CustomerMenu,
            Role::Kitchen => Self::KitchenDashboard,
            Role::Delivery => Self::DeliveryDashboard,
            Role::Unrecognized(_) => Self::Login,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Receives redirect requests.
pub trait Navigator: Send + Sync {
    /// Move the hosting context to `route`.
    fn navigate(&self, route: Route);
}

/// Navigator that publishes the latest destination on a watch channel.
///
/// Shells subscribe and render whichever view was requested last.
#[derive(Debug)]
pub struct WatchNavigator {
    tx: watch::Sender<Option<Route>>,
}

impl Default for WatchNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchNavigator {
    /// Create a navigator with no destination yet.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Most recent destination, if any redirect happened.
    #[must_use]
    pub fn current(&self) -> Option<Route> {
        *self.tx.borrow()
    }

    /// Watch for future redirects.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Route>> {
        self.tx.subscribe()
    }
}

impl Navigator for WatchNavigator {
    fn navigate(&self, route: Route) {
        tracing::debug!(route = %route, "navigating");
        self.tx.send_replace(Some(route));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_landing_for_roles() {
        assert_eq!(Route::landing_for(&Role::Customer), Route::CustomerMenu);
        assert_eq!(Route::landing_for(&Role::Kitchen), Route::KitchenDashboard);
        assert_eq!(Route::landing_for(&Role::Delivery), Route::DeliveryDashboard);
        assert_eq!(
            Route::landing_for(&Role::Unrecognized("ADMIN".to_string())),
            Route::Login
        );
    }

    #[test]
    fn test_paths() {
        assert_eq!(Route::KitchenDashboard.path(), "/kitchen/dashboard");
        assert_eq!(Route::Login.to_string(), "/login");
    }

    #[tokio::test]
    async fn test_watch_navigator_publishes_latest() {
        let navigator = WatchNavigator::new();
        let mut rx = navigator.subscribe();
        assert_eq!(navigator.current(), None);

        navigator.navigate(Route::Login);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Some(Route::Login));

        navigator.navigate(Route::CustomerMenu);
        assert_eq!(navigator.current(), Some(Route::CustomerMenu));
    }
}
