// Application layer - use cases and the ports they depend on
pub mod care_repository;
pub mod endpoint_resolver;
pub mod error;
pub mod reconnect;
pub mod transport;
pub mod vitals_service;

#[cfg(test)]
pub mod testing;
