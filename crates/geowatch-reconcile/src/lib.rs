//! Feed reconciliation engine.
//!
//! Compares the previously retained snapshot of a feed with a freshly
//! normalized one and produces the set of changes worth notifying about.
//! This is the only stateful part of geowatch; fetching, rendering, and
//! posting are handled by the surrounding crates.
//!
//! # Modes
//!
//! | Feed | Entry point | Identity |
//! |------|-------------|----------|
//! | Seismic | [`QuakeState::reconcile`] | keyed by public ID, bounded retention |
//! | Volcano | [`reconcile_positional`] | raw feed position, IDs must agree |
//! | Volcano | [`reconcile_by_id`] | keyed by volcano ID |
//! | Volcano summary | [`select_summary`] | none, threshold filter only |
//!
//! Keyed reconciliation never writes thread handles itself. The caller
//! posts each change and calls [`QuakeState::commit_thread`] only once the
//! sink has confirmed the post, so a failed post cannot leave a dangling
//! handle in retained state.

mod keyed;
mod volcano;

pub use keyed::{QuakeChange, QuakeChangeSet, QuakeState, DEFAULT_RETAIN_LIMIT};
pub use volcano::{
    reconcile_by_id, reconcile_positional, reconcile_volcanoes, select_summary, FeedRows,
    LevelChange, Pairing, VolcanoDiff,
};
