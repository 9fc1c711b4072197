//! Backend A: log-structured tables with LISTEN/NOTIFY long polls.

pub mod store;
pub mod table;

pub use store::LogEventStore;
