//! The runtime object hosting one of each component.

use std::sync::Arc;

use tracing::{info, instrument};

use fastbite_core::models::{AuthResponse, Order, RegisterRequest};

use crate::cart::CartStore;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result, add_breadcrumb};
use crate::gateway::RequestGateway;
use crate::navigation::{Navigator, Route};
use crate::notify::{Notifier, Severity};
use crate::session::{Profile, SessionStore};
use crate::storage::KeyValueStore;
use crate::stream::StreamManager;

/// Session-aware navigation state computed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavState {
    /// Signed-in user, if any.
    pub profile: Option<Profile>,
}

impl NavState {
    /// Whether a user is signed in.
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.profile.is_some()
    }
}

/// Client runtime shared by every view.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

struct RuntimeInner {
    config: ClientConfig,
    session: SessionStore,
    gateway: RequestGateway,
    streams: Arc<StreamManager>,
    cart: CartStore,
    notifier: Arc<dyn Notifier>,
}

impl Runtime {
    /// Wire up the components over one storage medium.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(
        config: ClientConfig,
        store: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let streams = Arc::new(StreamManager::new(&config)?);
        let channels = Arc::downgrade(&streams);
        // Any teardown, including a 401 seen by the gateway, closes live channels.
        let session = SessionStore::new(store.clone(), navigator).with_teardown(move || {
            if let Some(streams) = channels.upgrade() {
                streams.disconnect_all();
            }
        });
        let gateway = RequestGateway::new(&config, session.clone())?;
        let cart = CartStore::new(store);

        Ok(Self {
            inner: Arc::new(RuntimeInner {
                config,
                session,
                gateway,
                streams,
                cart,
                notifier,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    #[must_use]
    pub fn gateway(&self) -> &RequestGateway {
        &self.inner.gateway
    }

    #[must_use]
    pub fn streams(&self) -> &StreamManager {
        &self.inner.streams
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    #[must_use]
    pub fn notifier(&self) -> &dyn Notifier {
        self.inner.notifier.as_ref()
    }

    /// Startup hook: publish the persisted cart and report who is signed in.
    pub fn init(&self) -> NavState {
        self.inner.cart.notify();
        NavState {
            profile: self.inner.session.profile(),
        }
    }

    /// Sign in and go to the role's landing view.
    ///
    /// Returns `None` if the gateway produced no result.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the session cannot be saved.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Option<Route>> {
        let auth = self.inner.gateway.login(email, password).await?;
        self.establish(auth, "login")
    }

    /// Create an account, sign in, and go to the role's landing view.
    ///
    /// Returns `None` if the gateway produced no result.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the session cannot be saved.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn sign_up(&self, registration: &RegisterRequest) -> Result<Option<Route>> {
        let auth = self.inner.gateway.register(registration).await?;
        self.establish(auth, "register")
    }

    /// Submit the cart as an order. The cart is cleared only once the
    /// backend has accepted it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Cart`] before any call if the cart is empty or
    /// the address is blank, and other errors if the call fails.
    #[instrument(skip(self, notes))]
    pub async fn place_order(&self, delivery_address: &str, notes: Option<&str>) -> Result<Option<Order>> {
        let request = self.inner.cart.order_request(delivery_address, notes)?;
        let Some(order) = self.inner.gateway.create_order(&request).await? else {
            return Ok(None);
        };

        self.inner.cart.clear()?;
        add_breadcrumb("order", "Order placed", Some(&[("order_id", order.id.as_str())]));
        info!(order_id = %order.id, "order placed");
        Ok(Some(order))
    }

    /// Close every live channel and tear the session down.
    ///
    /// # Errors
    ///
    /// Returns an error if stored session data cannot be removed.
    pub fn sign_out(&self) -> Result<()> {
        self.inner.session.clear()?;
        add_breadcrumb("auth", "Signed out", None);
        Ok(())
    }

    /// Show an error to the user.
    pub fn report(&self, err: &ClientError) {
        self.inner
            .notifier
            .show_alert(&err.user_message(), Severity::Error);
    }

    fn establish(&self, auth: Option<AuthResponse>, action: &str) -> Result<Option<Route>> {
        let Some(auth) = auth else {
            return Ok(None);
        };

        self.inner.session.save(&auth)?;
        add_breadcrumb("auth", action, Some(&[("role", auth.role.as_wire())]));
        Ok(Some(self.inner.session.redirect_for_role()))
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("api_url", &self.inner.config.api_url.as_str())
            .field("session", &self.inner.session)
            .field("streams", &self.inner.streams)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::navigation::WatchNavigator;
    use crate::notify::LogNotifier;
    use crate::session::tests::auth;
    use crate::storage::MemoryStore;

    fn runtime() -> (Runtime, Arc<WatchNavigator>) {
        let navigator = Arc::new(WatchNavigator::new());
        let config = ClientConfig::for_api_url("http://127.0.0.1:9/api").unwrap();
        let runtime = Runtime::new(
            config,
            Arc::new(MemoryStore::new()),
            navigator.clone(),
            Arc::new(LogNotifier),
        )
        .unwrap();
        (runtime, navigator)
    }

    #[test]
    fn test_init_reports_signed_out() {
        let (runtime, _) = runtime();
        let mut updates = runtime.cart().subscribe();

        let state = runtime.init();

        assert!(!state.is_signed_in());
        assert!(updates.try_recv().unwrap().items.is_empty());
    }

    #[test]
    fn test_establish_saves_and_redirects() {
        let (runtime, navigator) = runtime();
        let route = runtime.establish(Some(auth("REPARTIDOR")), "login").unwrap();

        assert_eq!(route, Some(Route::DeliveryDashboard));
        assert_eq!(navigator.current(), Some(Route::DeliveryDashboard));
        assert!(runtime.init().is_signed_in());
    }

    #[test]
    fn test_establish_without_result_does_nothing() {
        let (runtime, navigator) = runtime();
        assert_eq!(runtime.establish(None, "login").unwrap(), None);
        assert_eq!(navigator.current(), None);
        assert!(!runtime.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_place_order_rejects_empty_cart_before_calling() {
        let (runtime, _) = runtime();
        let err = runtime.place_order("Calle 1", None).await.unwrap_err();
        assert!(matches!(err, ClientError::Cart(crate::cart::CartError::Empty)));
    }

    #[test]
    fn test_sign_out_clears_session_and_redirects() {
        let (runtime, navigator) = runtime();
        runtime.establish(Some(auth("CLIENTE")), "login").unwrap();

        runtime.sign_out().unwrap();

        assert!(!runtime.session().is_authenticated());
        assert!(runtime.streams().is_empty());
        assert_eq!(navigator.current(), Some(Route::Login));
    }

    #[tokio::test]
    async fn test_any_session_teardown_closes_channels() {
        let (runtime, _) = runtime();
        runtime.establish(Some(auth("COCINA")), "login").unwrap();
        runtime
            .streams()
            .connect::<serde_json::Value, _>("/orders/stream", |_| {}, None)
            .unwrap();

        runtime.session().clear().unwrap();

        assert!(runtime.streams().is_empty());
    }
}
