//! Filter compilation and statement execution

pub mod executor;
pub mod filter;

pub use executor::Query;
pub use filter::{Condition, FilterSet, Predicate};
