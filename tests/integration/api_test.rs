//! HTTP-level tests for the quiz API, run against in-memory stores and a
//! scripted provider

mod common;
mod conversations;
mod stream;
