//! Entity-Component-System implementation
//!
//! Sparse-set component storage, tuple queries, world resources and a phased
//! system scheduler.

pub mod component;
pub mod components;
pub mod entity;
pub mod query;
pub mod scheduler;
pub mod storage;
pub mod system;
pub mod systems;
pub mod world;

pub use component::Component;
pub use entity::{Entity, EntityAllocator};
pub use query::Query;
pub use scheduler::{ScheduleError, ScheduleRunError, SystemScheduler};
pub use storage::ComponentStorage;
pub use system::{System, SystemError, SystemPhase};
pub use world::{EcsError, World};
