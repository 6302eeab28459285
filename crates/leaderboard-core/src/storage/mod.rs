//! Score storage and persistence.
//!
//! - **Score store**: in-memory, insertion-ordered score records and the
//!   leaderboard queries over them
//! - **Snapshot file**: JSON file holding the full record list, rewritten
//!   after every mutation
//!
//! ## Snapshot Writes
//!
//! Snapshots are written to a temporary file next to the target, synced and
//! then renamed over it, so a reader only ever sees a complete file.

mod snapshot;
mod store;

pub use snapshot::*;
pub use store::*;
