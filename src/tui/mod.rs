//! Interactive terminal interface.
//!
//! Organized along pure/effect boundaries:
//! - `state`: pure data types (Session, Screen, Action, Transition)
//! - `update`: pure transitions
//! - `view`: pure rendering
//! - `theme`: pure style data
//! - `run`: the effects boundary (terminal, threads, event loop)

pub mod run;
pub mod state;
pub mod theme;
pub mod update;
pub mod view;
