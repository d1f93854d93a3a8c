//! In-memory snapshot cache.
//!
//! Three generic containers ([`SyncMap`], [`SyncCounterMap`], [`SyncListMap`])
//! each guarded by one reader/writer lock, instantiated once per entity in
//! [`EntityCaches`], and refilled wholesale by [`CacheLoader`]. There is no
//! eviction and no incremental invalidation: the only way entries change is a
//! full reload.

mod counter;
mod entities;
mod icon;
mod list;
mod loader;
mod lock;
mod map;

pub use counter::SyncCounterMap;
pub use entities::{CacheSnapshot, EntityCaches};
pub use icon::{ContentHash, Icon, content_hash};
pub use list::SyncListMap;
pub use loader::{CacheEntity, CacheLoadError, CacheLoader, LoadReport};
pub use map::SyncMap;
