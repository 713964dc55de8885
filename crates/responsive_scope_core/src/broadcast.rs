//! Viewport change fan-out.
//!
//! # Responsibility
//! - Hold the set of viewport consumers in registration order.
//! - Keep exactly one host resize subscription while the set is non-empty.
//! - Push the current dimensions to every consumer in one pass.
//!
//! # Invariants
//! - A consumer appears at most once; identity is the `Rc` allocation.
//! - One consumer failing never stops delivery to the rest, and never
//!   unregisters it.

use crate::host::ResizeSignal;
use crate::model::viewport::Viewport;
use log::{error, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// Receiver of viewport updates.
pub trait ViewportConsumer {
    /// Short label used in log lines.
    fn consumer_label(&self) -> String;

    /// Applies new dimensions. Consumers that do not override this lack the
    /// update contract and are skipped with a warning.
    fn update_viewport(&self, _width: u32, _height: u32) -> Result<(), ConsumerError> {
        Err(ConsumerError::MissingUpdateContract)
    }
}

/// Per-consumer delivery errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumerError {
    MissingUpdateContract,
    UpdateFailed(String),
}

impl Display for ConsumerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingUpdateContract => write!(f, "consumer has no update contract"),
            Self::UpdateFailed(message) => write!(f, "consumer update failed: {message}"),
        }
    }
}

impl Error for ConsumerError {}

/// Counts for one delivery pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Default)]
pub struct ViewportBroadcaster {
    consumers: Vec<Rc<dyn ViewportConsumer>>,
    listening: bool,
}

impl ViewportBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `consumer` and pushes the current dimensions to it right away.
    ///
    /// Returns `false` when the consumer was already registered; it still
    /// receives the push.
    pub fn register<S: ResizeSignal + ?Sized>(
        &mut self,
        consumer: Rc<dyn ViewportConsumer>,
        signal: &S,
    ) -> bool {
        let inserted = !self.contains(&consumer);
        if inserted {
            self.consumers.push(Rc::clone(&consumer));
        }
        if !self.listening {
            signal.subscribe_resize();
            self.listening = true;
        }
        deliver(&[consumer], signal.viewport());
        inserted
    }

    /// Removes `consumer`; the last removal drops the host subscription.
    pub fn unregister<S: ResizeSignal + ?Sized>(
        &mut self,
        consumer: &Rc<dyn ViewportConsumer>,
        signal: &S,
    ) -> bool {
        let before = self.consumers.len();
        self.consumers.retain(|existing| !same_consumer(existing, consumer));
        let removed = self.consumers.len() != before;
        if self.consumers.is_empty() && self.listening {
            signal.unsubscribe_resize();
            self.listening = false;
        }
        removed
    }

    pub fn contains(&self, consumer: &Rc<dyn ViewportConsumer>) -> bool {
        self.consumers
            .iter()
            .any(|existing| same_consumer(existing, consumer))
    }

    /// Snapshot of the current consumers, in registration order.
    pub fn consumers(&self) -> Vec<Rc<dyn ViewportConsumer>> {
        self.consumers.clone()
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }
}

/// Delivers one viewport to `consumers` in order, logging every failure.
pub fn deliver(consumers: &[Rc<dyn ViewportConsumer>], viewport: Viewport) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    for consumer in consumers {
        match consumer.update_viewport(viewport.width, viewport.height) {
            Ok(()) => report.delivered += 1,
            Err(ConsumerError::MissingUpdateContract) => {
                report.skipped += 1;
                warn!(
                    "event=viewport_deliver module=broadcast status=skip consumer={} reason=missing_update_contract",
                    consumer.consumer_label()
                );
            }
            Err(err) => {
                report.failed += 1;
                error!(
                    "event=viewport_deliver module=broadcast status=error consumer={} error={err}",
                    consumer.consumer_label()
                );
            }
        }
    }
    report
}

fn same_consumer(left: &Rc<dyn ViewportConsumer>, right: &Rc<dyn ViewportConsumer>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(left), Rc::as_ptr(right))
}

#[cfg(test)]
mod tests {
    use super::{deliver, ConsumerError, DeliveryReport, ViewportBroadcaster, ViewportConsumer};
    use crate::host::{MemoryHost, ResizeSignal};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<(u32, u32)>>,
    }

    impl ViewportConsumer for Recorder {
        fn consumer_label(&self) -> String {
            "recorder".to_string()
        }

        fn update_viewport(&self, width: u32, height: u32) -> Result<(), ConsumerError> {
            self.seen.borrow_mut().push((width, height));
            Ok(())
        }
    }

    struct Broken;

    impl ViewportConsumer for Broken {
        fn consumer_label(&self) -> String {
            "broken".to_string()
        }

        fn update_viewport(&self, _width: u32, _height: u32) -> Result<(), ConsumerError> {
            Err(ConsumerError::UpdateFailed("boom".to_string()))
        }
    }

    struct Inert;

    impl ViewportConsumer for Inert {
        fn consumer_label(&self) -> String {
            "inert".to_string()
        }
    }

    #[test]
    fn register_subscribes_once_and_pushes_immediately() {
        let host = MemoryHost::new(640, 480);
        let mut broadcaster = ViewportBroadcaster::new();
        let first = Rc::new(Recorder::default());
        let second = Rc::new(Recorder::default());

        assert!(broadcaster.register(first.clone(), &host));
        assert!(broadcaster.register(second.clone(), &host));
        assert!(!broadcaster.register(first.clone(), &host));

        assert_eq!(host.subscribe_calls(), 1);
        assert_eq!(broadcaster.len(), 2);
        assert_eq!(second.seen.borrow().as_slice(), &[(640, 480)]);
    }

    #[test]
    fn failures_do_not_stop_the_pass() {
        let host = MemoryHost::new(640, 480);
        let mut broadcaster = ViewportBroadcaster::new();
        let before = Rc::new(Recorder::default());
        let after = Rc::new(Recorder::default());
        broadcaster.register(before.clone(), &host);
        broadcaster.register(Rc::new(Broken), &host);
        broadcaster.register(Rc::new(Inert), &host);
        broadcaster.register(after.clone(), &host);

        host.resize_window(1024, 700);
        let report = deliver(&broadcaster.consumers(), host.viewport());
        assert_eq!(
            report,
            DeliveryReport {
                delivered: 2,
                skipped: 1,
                failed: 1
            }
        );
        assert_eq!(after.seen.borrow().last(), Some(&(1024, 700)));
        assert_eq!(broadcaster.len(), 4);
    }

    #[test]
    fn last_unregister_drops_subscription() {
        let host = MemoryHost::new(640, 480);
        let mut broadcaster = ViewportBroadcaster::new();
        let first: Rc<dyn ViewportConsumer> = Rc::new(Recorder::default());
        let second: Rc<dyn ViewportConsumer> = Rc::new(Recorder::default());
        broadcaster.register(first.clone(), &host);
        broadcaster.register(second.clone(), &host);

        assert!(broadcaster.unregister(&first, &host));
        assert!(host.is_subscribed());
        assert!(broadcaster.unregister(&second, &host));
        assert!(!host.is_subscribed());
        assert!(!broadcaster.is_listening());
        assert!(!broadcaster.unregister(&second, &host));
        assert_eq!(host.unsubscribe_calls(), 1);
    }
}
