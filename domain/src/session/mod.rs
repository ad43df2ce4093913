//! Voting session domain.
//!
//! A session sequences a queue of votable items through its phases:
//!
//! ```text
//! setup ──start_item──► introduction ──begin_voting──► voting
//!                            ▲                           │ complete_item
//!                            └────────move_to_next───────┤
//!                                                        ▼
//!                                                      closed
//! ```
//!
//! - [`item::ChangeRequest`] - a votable item and its queue ordering
//! - [`entities::VotingSession`] - the state machine itself

pub mod entities;
pub mod item;

pub use entities::{
    ItemDecision, SessionBallot, SessionPhase, SessionProgress, SessionSnapshot, VotingSession,
};
pub use item::{ChangeRequest, ItemStatus, order_queue};
