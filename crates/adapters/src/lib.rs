//! phrasecast adapters crate
//!
//! Infrastructure adapters implementing the domain ports:
//! - `phrases`: CSV phrase source
//! - `render`: Raster image backend
//! - `store`: Filesystem artifact store
//! - `ledger`: SQLite and in-memory publication ledgers
//! - `instagram`: Instagram publisher and a stub

mod ledger_memory;
mod ledger_sqlite;
mod phrases_csv;
mod render_raster;
mod store_fs;

pub mod instagram;

/// Re-exports for phrase sources
pub mod phrases {
    pub use crate::phrases_csv::{CsvPhraseSource, parse_phrases};
}

/// Re-exports for render backends
pub mod render {
    pub use crate::render_raster::{RasterAssets, RasterBackend};
}

/// Re-exports for artifact stores
pub mod store {
    pub use crate::store_fs::FsArtifactStore;
}

/// Re-exports for publication ledgers
pub mod ledger {
    pub use crate::ledger_memory::InMemoryLedger;
    pub use crate::ledger_sqlite::SqliteLedger;
}
