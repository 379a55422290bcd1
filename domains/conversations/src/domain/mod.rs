//! Domain types and pure logic for the Conversations domain

pub mod entities;
pub mod progress;
pub mod prompt;
pub mod state;
