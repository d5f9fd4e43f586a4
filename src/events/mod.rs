//! Events
//!
//! Ground-truth topics injected into the synthetic stream:
//!
//! - **curve**: per-term IDF trajectories and historical sample files
//! - **simulated**: analytic plateau / ramp / recovery trajectories
//! - **catalog**: the candidate pool
//! - **scheduler**: selection and placement on the timeline
//! - **injector**: per-sub-window term insertion
//! - **error**: error types

pub mod catalog;
pub mod curve;
pub mod error;
pub mod injector;
pub mod scheduler;
pub mod simulated;

pub use catalog::{default_catalog, load_candidates, CandidateOptions, CatalogEntry, SimulatedEventSpec};
pub use curve::{parse_samples, Event, EventInputEntry, TrimWindow};
pub use error::{EventError, EventResult};
pub use injector::{
    partition_sub_windows, target_count, EventInjector, InjectionTarget, SubWindowReport, TermReport,
};
pub use scheduler::{EventScheduler, ManifestEntry, Schedule, ScheduleOptions, SchedulePhase};
pub use simulated::{minute_values, simulated_event, spread_over_minute, CurveShape, SimulatedTerm};
