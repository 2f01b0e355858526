//! Persistent storage for interview sessions and reports

pub mod session_store;

pub use session_store::SessionStore;
