//! Integration tests with mock orchestrators

pub mod connection_pool;
pub mod error_handling;
pub mod mock_server;
pub mod streaming;
