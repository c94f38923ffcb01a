// Shared device model, envelope decoding, IO element decoding, and fleet tracking.

pub mod envelope;
pub mod fleet;
pub mod io;
pub mod model;
