//! Push-streams with synchronous, ordered fan-out.
//!
//! An [`Observable`] delivers values to subscribers on the publishing thread.
//! [`select`] derives a deduplicated, replaying stream from another one.

mod observable;
mod select;

pub(crate) use observable::{new_gate, Callback, Gate, Source, SubscriberList};
pub use observable::{Observable, Subscription};
pub use select::{select, select_with};
