//! Headless controller: owns the application state and drives search sessions
//! on behalf of a front end.

pub mod commands;
pub mod events;
pub mod helpers;
pub mod proxy;
pub mod state;
pub mod tasks;
