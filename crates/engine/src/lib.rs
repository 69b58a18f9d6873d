//! The ledger engine.
//!
//! Holds the data model (assets, transactions, users, exports) and every
//! operation that mutates it. Balance-affecting operations run inside a
//! single database transaction so a balance can never drift from the
//! transactions that explain it.

pub use assets::{Asset, AssetKind, normalize_name};
pub use currency::Currency;
pub use error::EngineError;
pub use exports::Export;
pub use money::Money;
pub use ops::{Engine, EngineBuilder, NewAsset, RecordTransaction, UpdateTransaction};
pub use owner::OwnerRef;
pub use transactions::{Transaction, TransactionKind};
pub use users::{User, normalize_phone};

mod assets;
mod currency;
mod error;
mod exports;
mod money;
mod ops;
mod owner;
mod transactions;
mod users;

type ResultEngine<T> = Result<T, EngineError>;
