//! Explicit logger handle passed to every component at construction time.
//!
//! # Design
//! - A `Logger` pairs a `Dispatch` with a span; nothing relies on a
//!   process-global subscriber.
//! - Synchronous work runs inside [`Logger::in_scope`]; futures are wrapped
//!   with [`Logger::scope`] so every poll (on any runtime worker) reports to
//!   the same dispatcher.

use std::future::Future;

use tracing::instrument::{Instrumented, WithDispatch, WithSubscriber};
use tracing::{Dispatch, Instrument, Span, dispatcher};

use crate::init::build_sha;

/// Logging handle carrying the dispatcher and the component span.
#[derive(Clone, Debug)]
pub struct Logger {
    dispatch: Dispatch,
    span: Span,
}

impl Logger {
    /// Wrap a dispatcher with the application root span.
    #[must_use]
    pub fn new(dispatch: Dispatch) -> Self {
        let span = dispatcher::with_default(&dispatch, || {
            tracing::info_span!("databackup", build_sha = %build_sha())
        });
        Self { dispatch, span }
    }

    /// Logger that discards every event.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Dispatch::none())
    }

    /// Derive a child logger whose span names the component.
    #[must_use]
    pub fn component(&self, name: &'static str) -> Self {
        let span = self.in_scope(|| tracing::info_span!("component", component = name));
        Self {
            dispatch: self.dispatch.clone(),
            span,
        }
    }

    /// Run `work` with this logger installed as the current dispatcher.
    pub fn in_scope<T>(&self, work: impl FnOnce() -> T) -> T {
        dispatcher::with_default(&self.dispatch, || self.span.in_scope(work))
    }

    /// Attach this logger to `future` for every poll.
    pub fn scope<F>(&self, future: F) -> WithDispatch<Instrumented<F>>
    where
        F: Future,
    {
        future
            .instrument(self.span.clone())
            .with_subscriber(self.dispatch.clone())
    }
}
