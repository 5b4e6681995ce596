//! Client modules for external services

pub mod marketo;

pub use marketo::MarketoClient;
