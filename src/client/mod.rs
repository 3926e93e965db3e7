//! Outbound HTTP with bounded retries

mod executor;


pub use executor::{RequestSpec, ResilientClient};
