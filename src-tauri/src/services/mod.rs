//! Business logic services.
//!
//! This module contains the core logic for talking to the AgroPec API,
//! aggregating the notification feed, and running the live channel and
//! badge refresher in the background.
//!
//! Services are designed to be testable and independent of Tauri-specific code.

pub mod aggregator;
pub mod api_client;
pub mod badge;
pub mod credentials;
pub mod events;
pub mod live_channel;
pub mod runtime;
pub mod toasts;

pub use aggregator::NotificationAggregator;
pub use api_client::AgroPecClient;
pub use credentials::CredentialService;
pub use runtime::AppRuntime;
pub use toasts::ToastManager;
