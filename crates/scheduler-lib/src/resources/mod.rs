//! Resource arithmetic
//!
//! `Quantity` carries exact resource amounts; `ResourceCounter` sums them
//! per resource name, which is the unit the reservation tracker and the
//! topology adjuster operate on.

mod counter;
mod quantity;

pub use counter::ResourceCounter;
pub use quantity::{Quantity, QuantityFormat};
