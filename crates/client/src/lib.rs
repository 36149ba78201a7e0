//! FastBite client runtime.
//!
//! Session identity, authenticated backend calls, live order channels, and
//! the local cart for the customer, kitchen, and delivery views.
//!
//! # Components
//!
//! - [`SessionStore`] - persisted credential and profile, role-based redirects
//! - [`RequestGateway`] - every backend call, with uniform response handling
//! - [`StreamManager`] - named server-sent event subscriptions
//! - [`CartStore`] - the cart working set and its change notifications
//!
//! [`Runtime`] owns one of each and implements the sign-in, checkout, and
//! sign-out flows that span them.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fastbite_client::{ClientConfig, FileStore, LogNotifier, Runtime, WatchNavigator};
//!
//! let config = ClientConfig::from_env()?;
//! let store = Arc::new(FileStore::open(&config.state_dir)?);
//! let runtime = Runtime::new(config, store, Arc::new(WatchNavigator::new()), Arc::new(LogNotifier))?;
//!
//! runtime.init();
//! if let Some(route) = runtime.sign_in("cocina@fastbite.com", "secret").await? {
//!     println!("landing on {route}");
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod error;
pub mod gateway;
pub mod navigation;
pub mod notify;
pub mod runtime;
pub mod session;
pub mod storage;
pub mod stream;

pub use cart::{CartError, CartLine, CartStore, CartUpdated, CountDisplay};
pub use config::{ClientConfig, ConfigError, StreamConfig};
pub use error::{ClientError, Result};
pub use gateway::{ApiError, RequestGateway, RequestOptions};
pub use navigation::{Navigator, Route, WatchNavigator};
pub use notify::{LogNotifier, Notifier, Severity};
pub use runtime::{NavState, Runtime};
pub use session::{Credential, Profile, SessionStore, TeardownHook};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use stream::{ChannelError, ErrorHandler, StreamManager, channels};
