//! Domain types and pure logic for the Questions domain

pub mod entities;
pub mod triggers;
