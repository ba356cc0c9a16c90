//! Production store adapters.

pub mod postgres;

pub use postgres::PostgresMarketplaceStore;
