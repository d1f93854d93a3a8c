//! Application services: the store boundary and the reinitialize operation.

pub mod error;
pub mod repos;
pub mod reset;
