//! Infrastructure Layer
//!
//! Database implementations and the in-process store.

pub mod memory;
pub mod postgres;

pub use memory::MemoryPromoStore;
pub use postgres::PgPromoRepository;
