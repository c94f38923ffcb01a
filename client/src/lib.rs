// Crate root for the Woltride fleet telemetry client.

pub mod conn;
pub mod constants;
pub mod hub;
pub mod present;
pub mod store;
pub mod tasks;
