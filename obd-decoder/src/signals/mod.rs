//! Signal definitions and signal set catalogs
//!
//! This module owns the declarative side of decoding: what a signal is
//! (where its bits live, how raw bits become a physical value) and which
//! signals apply to a given model year and response arbitration ID.

pub mod database;
pub mod signalset;

pub use database::{
    ByteOrder, DatabaseStats, Formula, Rational, RequestDescriptor, SignalDatabase,
    SignalDefinition, SignalSet, ValueType,
};
