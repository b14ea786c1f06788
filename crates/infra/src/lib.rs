//! Infrastructure layer: storage, services, marketplace client, config.
//!
//! Domain crates stay IO-free; everything that touches a lock, a database
//! row or the network lives here behind the [`store::LedgerStore`] seam.

pub mod catalog;
pub mod config;
pub mod error;
pub mod external;
pub mod feed;
pub mod import;
pub mod ledger;
pub mod orders;
pub mod store;

pub use catalog::{Catalog, ItemFailure, ReceiveReport};
pub use error::{LedgerError, LedgerResult};
pub use feed::{FeedGenerator, FeedSettings};
pub use import::{ImportFailure, ImportReport, ImportedOrder, LineWarning, OrderImporter};
pub use ledger::StockLedger;
pub use orders::{CreateOrder, OrderAssembler};
pub use store::{
    CreatedProduct, InMemoryLedgerStore, LedgerStore, PostgresLedgerStore, StoreError, StoreResult,
};
