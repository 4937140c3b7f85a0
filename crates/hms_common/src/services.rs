// --- File: crates/hms_common/src/services.rs ---
//! Service abstractions for external collaborators.
//!
//! Delivery channels (email service, calendar, log) implement
//! [`NotificationChannel`]; the dispatcher holds them type-erased behind
//! [`SharedChannel`] so channels with different error types can be mixed.

use crate::models::NotificationEvent;
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// A wrapper error type that implements std::error::Error for Box<dyn std::error::Error + Send + Sync>
#[derive(Debug)]
pub struct BoxedError(pub Box<dyn StdError + Send + Sync>);

impl fmt::Display for BoxedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for BoxedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<Box<dyn StdError + Send + Sync>> for BoxedError {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        BoxedError(err)
    }
}

/// A single delivery path for notification events.
pub trait NotificationChannel: Send + Sync {
    /// Error type returned by delivery attempts.
    type Error: StdError + Send + Sync + 'static;

    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Deliver one event. Channels ignore events they have no use for and
    /// return `Ok(())`.
    fn send<'a>(&'a self, event: &'a NotificationEvent) -> BoxFuture<'a, (), Self::Error>;
}

/// Adapter erasing a channel's error type into [`BoxedError`].
pub struct BoxedChannel<C>(pub C);

impl<C: NotificationChannel> NotificationChannel for BoxedChannel<C> {
    type Error = BoxedError;

    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn send<'a>(&'a self, event: &'a NotificationEvent) -> BoxFuture<'a, (), Self::Error> {
        let delivery = self.0.send(event);
        Box::pin(async move { delivery.await.map_err(|e| BoxedError(Box::new(e))) })
    }
}

/// A type-erased, shareable channel.
pub type SharedChannel = Arc<dyn NotificationChannel<Error = BoxedError>>;

/// Wraps a concrete channel into a [`SharedChannel`].
pub fn shared_channel<C>(channel: C) -> SharedChannel
where
    C: NotificationChannel + 'static,
{
    Arc::new(BoxedChannel(channel))
}
