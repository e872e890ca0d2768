//! Twitter v1.1 integration surface.
//!
//! `types` holds the status/user models as they come off the wire; `client` is the
//! signed user-timeline page fetcher used by the paginator.
pub mod client;
pub mod types;

pub use client::TwitterApi;
pub use types::{RawPost, RawUser};
