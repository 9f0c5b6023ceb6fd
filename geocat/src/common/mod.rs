//! Common value types shared by the lookup, filter and manager modules.

mod sort_order;
mod value;

pub use sort_order::*;
pub use value::*;
