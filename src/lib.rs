//! # Frozen Store
//!
//! A reactive, immutable state store for Rust.
//!
//! A [`Store`] is the single source of truth for one slice of application
//! state. It is built from three layers:
//!
//! ## Structural utilities
//!
//! Pure helpers over serializable values:
//! - [`deep_freeze`] / [`Frozen`] - immutable shared snapshots
//! - [`naive_object_comparison`] and [`deep_copy`] - equality and cloning by
//!   serialized shape
//! - [`merge_deep`], [`copy_array`], [`copy_object`], [`object_is_empty`]
//!
//! ## Streams
//!
//! - [`Observable<T>`] - synchronous, ordered push-streams
//! - [`select`] - map + consecutive dedup + replay of the latest value
//! - [`StoreSubject<T>`] - the emission channel: freezes what it publishes
//!   and drops values equal to the current one
//!
//! ## Store
//!
//! - [`Store<T>`] - whole-state reads and writes, shallow partial merges
//! - [`PropertySelector`] / [`PropertyActuator`] - lens access to any
//!   property of any sub-model
//!
//! ```
//! use frozen_store::{Lens, Store};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct App {
//!     user: Option<User>,
//! }
//!
//! #[derive(Serialize, Deserialize)]
//! struct User {
//!     name: String,
//! }
//!
//! let store = Store::new(App {
//!     user: Some(User { name: "x".into() }),
//! });
//! let before = store.state();
//!
//! let name = store
//!     .select_by_fn(Lens::new(|app: &App| app.user.as_ref(), |app: &mut App| app.user.as_mut()))
//!     .property::<String>("name");
//! name.set_value("y".to_string()).unwrap();
//!
//! assert_eq!(name.get_current().unwrap().as_deref(), Some("y"));
//! assert_eq!(before.user.as_ref().unwrap().name, "x");
//! ```

pub mod error;
pub mod observable;
pub mod store;
pub mod structural;
pub mod subject;

// Re-export main types for convenience
pub use error::{Result, StoreError};
pub use observable::{select, select_with, Observable, Subscription};
pub use store::{
    DynamicState, DynamicStore, Lens, ModelSelector, PropertyActuator, PropertySelector, Root,
    Store, StoreOptions, StoreState,
};
pub use structural::{
    copy_array, copy_object, deep_copy, deep_freeze, is_object, merge_deep,
    naive_object_comparison, object_is_empty, structurally_equal, Frozen,
};
pub use subject::StoreSubject;

