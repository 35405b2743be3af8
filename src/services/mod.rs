//! Narrow interfaces to the external collaborators the core consumes.
//!
//! The engine only sees these traits; the host process decides what backs
//! them. [`rest`] ships one HTTP-backed implementation.

pub mod ai_signal;
pub mod execution;
pub mod market_data;
pub mod notifications;
pub mod rest;

pub use ai_signal::AiSignalProvider;
pub use execution::{AccountBalance, CloseResult, ExecutionGateway, OrderResult};
pub use market_data::MarketDataProvider;
pub use notifications::{LogNotificationSink, NotificationSink};
pub use rest::RestClient;

/// Error type shared by all service traits.
pub type ServiceError = Box<dyn std::error::Error + Send + Sync>;
