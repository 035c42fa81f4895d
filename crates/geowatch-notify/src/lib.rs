//! Notification rendering and posting for geowatch.
//!
//! [`render`] turns reconciled changes into post text using the static
//! lookup tables in [`tables`]. The [`NotificationSink`] trait is the
//! posting seam: [`MastodonSink`] publishes statuses, [`LogSink`] only logs
//! them (dry run). Every successful post returns a [`ThreadHandle`] that the
//! caller may pass back as `in_reply_to` to continue the thread.
//!
//! [`ThreadHandle`]: geowatch_types::ThreadHandle

pub mod error;
pub mod mastodon;
pub mod render;
pub mod sink;
pub mod tables;

pub use error::PostError;
pub use mastodon::{MastodonSink, Visibility};
pub use render::{render_level_change, render_quake, render_volcano_summary, QuakeDisplay};
pub use sink::{LogSink, NotificationSink};
