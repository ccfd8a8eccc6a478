//! Friend and group notification fan-out.

pub mod builder;
pub mod dispatcher;
pub mod types;

pub use builder::NotificationBuilder;
pub use dispatcher::NotificationDispatcher;
pub use types::Notification;
