//! Position domain: who holds which office, and since when.

pub mod entities;

pub use entities::{
    AssignmentSource, HolderChangeReason, HolderHistoryEntry, Position, PositionAssignment,
    TermLength, VacancyReason,
};
