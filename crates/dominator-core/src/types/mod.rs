//! Type system for Dominator runtime values

pub mod value;

pub use value::Value;
