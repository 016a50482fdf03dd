//! State module for request pacing
//!
//! # Components
//!
//! - `FetchState`: the single process-wide record of when the last request was
//!   granted, consulted before every fetch to decide how long to wait

mod fetch_state;

pub use fetch_state::FetchState;
