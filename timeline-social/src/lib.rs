//! Harvest a user's timeline and flatten it for tabular analysis.
//!
//! The pieces compose linearly: [`paginate::fetch_all`] walks the timeline through
//! a [`paginate::TimelineSource`] (normally [`twitter::TwitterApi`]),
//! [`normalize::normalize`] flattens each post, and [`table::to_table`] keys the
//! records by local creation time. [`archive`] persists raw batches in between.
pub mod archive;
pub mod error;
pub mod normalize;
pub mod paginate;
pub mod table;
pub mod twitter;

pub use error::{Result, SocialError};
pub use normalize::{FieldValue, NormalizedRecord, normalize, normalize_all};
pub use paginate::{TimelineSource, fetch_all, fetch_all_with_deadline};
pub use table::{Timeline, TimelineRow, to_table};
