//! The store and its lens-style selector API.
//!
//! A [`Store`] owns one emission channel. [`Store::select_by_fn`] names a
//! sub-model with a [`ModelSelector`], and [`PropertySelector::property`]
//! binds one of its properties to a [`PropertyActuator`] that can read,
//! write and observe it without a reducer per state shape.

mod actuator;
mod options;
mod selector;
mod store;

pub use actuator::{PropertyActuator, PropertySelector};
pub use options::StoreOptions;
pub use selector::{Lens, ModelSelector, Root};
pub use store::{DynamicState, DynamicStore, Store, StoreState};
