//! liarvote
//!
//! A two-video "spot the liar" vote: visitors pick the video they think is
//! lying, votes go to a pluggable response store, and a token-gated admin view
//! shows the tally and the raw responses.

pub mod auth;
pub mod cli;
pub mod config;
pub mod logging;
pub mod server;
pub mod store;
pub mod voting;
