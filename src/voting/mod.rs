//! Voting Module
//!
//! The spot-the-liar workflow: cast a vote, tally the results, and gate the
//! detailed results behind the admin token.

pub mod model;
pub mod render;
pub mod widget;

pub use model::{AuditEvent, ErrorReport, Tally, Video, Vote};
pub use widget::{AdminView, SessionState, View, VoterView, VotingWidget};
