//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the storage the services depend on.

pub mod store;
