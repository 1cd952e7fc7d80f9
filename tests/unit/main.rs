//! Unit tests for individual components

mod builders_test;
mod config_test;
mod decision_test;
mod error_test;
mod transport_test;
mod util_test;
