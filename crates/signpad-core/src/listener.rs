//! Host listener contract.

use crate::event::{EventResult, SignatureEventType};
use std::fmt;
use std::rc::{Rc, Weak};

/// Implement this to receive signature pad events.
pub trait SignaturePadEventListener {
    fn on_signature_pad_event(&self, event_type: SignatureEventType, result: &EventResult);
}

/// Plain callback form of the listener.
pub type EventCallback = dyn Fn(SignatureEventType, &EventResult);

/// The two accepted listener shapes.
///
/// An interface listener is held weakly: the host owns it, and once it is
/// dropped notifications are skipped. A callback is held by the pad.
#[derive(Clone)]
pub enum Listener {
    Interface(Weak<dyn SignaturePadEventListener>),
    Callback(Rc<EventCallback>),
}

impl Listener {
    /// Listen through an object owned by the host.
    pub fn interface(listener: &Rc<dyn SignaturePadEventListener>) -> Self {
        Listener::Interface(Rc::downgrade(listener))
    }

    /// Listen through a closure.
    pub fn callback(f: impl Fn(SignatureEventType, &EventResult) + 'static) -> Self {
        Listener::Callback(Rc::new(f))
    }

    /// Deliver one event. Returns false if the listener is gone.
    pub fn notify(&self, event_type: SignatureEventType, result: &EventResult) -> bool {
        match self {
            Listener::Interface(weak) => match weak.upgrade() {
                Some(listener) => {
                    listener.on_signature_pad_event(event_type, result);
                    true
                }
                None => false,
            },
            Listener::Callback(f) => {
                f(event_type, result);
                true
            }
        }
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Listener::Interface(weak) => f
                .debug_tuple("Interface")
                .field(&(weak.strong_count() > 0))
                .finish(),
            Listener::Callback(_) => f.write_str("Callback"),
        }
    }
}
