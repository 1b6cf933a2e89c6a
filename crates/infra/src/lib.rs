//! `stocktrail-infra` — storage backends and the service layer.
//!
//! The store keeps the catalog mutation and its audit append inside one
//! atomic operation; the services decide *what* to write and thread the
//! acting principal through explicitly.

pub mod service;
pub mod store;


pub use service::{
    AppServices, CategoryService, ItemService, LogQueryService, ServiceError, UserService,
};
pub use store::{InMemoryStore, InventoryStore, ItemView, LogView, NewUser, StoreError, UserRecord};

#[cfg(feature = "postgres")]
pub use store::postgres::PostgresStore;
