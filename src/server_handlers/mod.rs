pub mod sga;

pub use sga::*;
