//! The store's emission channel.
//!
//! A single-value broadcast channel that freezes everything it publishes and
//! never broadcasts a value structurally equal to the current one.

mod subject;

pub use subject::StoreSubject;
