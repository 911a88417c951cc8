pub mod sign;
pub mod spin;

pub use sign::{sign, SignArgs};
pub use spin::{claim, list_prizes, list_spins, status};
