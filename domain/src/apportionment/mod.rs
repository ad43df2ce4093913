//! Delegate apportionment domain
//!
//! Converts group membership counts into delegate seats (Hare quota,
//! largest remainder) and fills those seats from priority-ordered
//! nominations.
//!
//! ```text
//! Group roster ──► apportion ──► DelegateAllocation ──┐
//!                                                     ├─► finalize_selection
//! DelegateNomination (nominated) ─────────────────────┘      │
//!                                          confirmed / standby ◄┘
//! ```

pub mod calculator;
pub mod group;
pub mod nomination;

pub use calculator::{AllocationLine, Apportionment, apportion};
pub use group::{DelegateAllocation, DelegateConference, Group, GroupMembership};
pub use nomination::{DelegateNomination, NominationStatus, SelectionDecision, finalize_selection};
