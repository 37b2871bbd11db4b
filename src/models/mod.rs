//! Training-program domain models.
//!
//! Catalog records (phases, phase-components, exercises), the parameter
//! bundle one scheduling request consumes, the solved-schedule shapes the
//! stages extract, and the relaxation-attempt history.
//!
//! Every catalog reserves index 0 for an inactive sentinel item so slots
//! can be optional without separate null handling.

mod exercise;
mod parameters;
mod phase;
mod phase_component;
mod relaxation;
mod schedule;

pub use exercise::Exercise;
pub use parameters::Parameters;
pub use phase::Phase;
pub use phase_component::PhaseComponent;
pub use relaxation::RelaxationAttempt;
pub use schedule::{
    ComponentSchedule, ComponentSlot, DayPlan, ExerciseSchedule, OutputRow, PhaseSchedule,
    PhaseSlot, Solution,
};
