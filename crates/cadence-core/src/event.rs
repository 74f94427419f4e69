//! Notification and output event types.

use crate::time::Timestamp;

/// One external value delivered to a model's input port.
///
/// Notifications sharing the same simulated instant are merged into a
/// single bag before the receiving model recomputes. For a vector
/// external reference, `element` selects the addressed element;
/// scalar references leave it `None`.
///
/// # Examples
///
/// ```
/// use cadence_core::Notification;
///
/// let n = Notification::scalar("inflow", 2.5);
/// assert_eq!(n.port, "inflow");
/// assert_eq!(n.element, None);
///
/// let e = Notification::element("levels", 2, 0.75);
/// assert_eq!(e.element, Some(2));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    /// Target input port (the external variable's declared name).
    pub port: String,
    /// Addressed element for vector references; `None` for scalars.
    pub element: Option<u32>,
    /// The delivered value.
    pub value: f64,
}

impl Notification {
    /// A notification for a scalar external reference.
    pub fn scalar(port: &str, value: f64) -> Self {
        Self {
            port: port.to_string(),
            element: None,
            value,
        }
    }

    /// A notification for one element of a vector external reference.
    pub fn element(port: &str, element: u32, value: f64) -> Self {
        Self {
            port: port.to_string(),
            element: Some(element),
            value,
        }
    }
}

/// One value published on an output port after a transition.
///
/// Emitted in declaration order of the owning model's variables; the
/// driver routes each event to the connected input ports of downstream
/// models at the same instant.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputEvent {
    /// Source output port (the owned variable's declared name).
    pub port: String,
    /// Source element for vector variables; `None` for scalars.
    pub element: Option<u32>,
    /// The newly committed value.
    pub value: f64,
    /// The instant at which the value was committed.
    pub time: Timestamp,
}
