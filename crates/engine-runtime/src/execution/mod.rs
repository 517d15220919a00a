pub mod backfill;
pub mod enumerate;
pub mod executor;
pub mod factory;
pub mod oneshot;
pub mod runner;
pub mod tracker;
