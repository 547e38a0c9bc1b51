pub mod recipes;
pub mod related;

pub use recipes::*;
pub use related::*;
