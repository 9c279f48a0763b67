//! Feed orchestration: filter state, debouncing, scroll gating, and the
//! controller that ties them to the API client.
//!
//! The module is organized into four submodules:
//!
//! - [`filter`] - The replace-wholesale query specification and page cursor
//! - [`debounce`] - Quiet-period collapsing of rapid filter changes
//! - [`scroll`] - Sentinel-visibility gating for load-more
//! - [`controller`] - The state machine owning posts, cursor, and errors

pub mod controller;
pub mod debounce;
pub mod filter;
pub mod scroll;

pub use controller::{FeedController, FeedPhase, FeedState, PageRequest};
pub use debounce::Debouncer;
pub use filter::{FilterSpec, PageCursor, SortKey, SortOrder, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use scroll::ScrollTrigger;
