//! Machine-translation gateway.
//!
//! Serves `POST /translate` on top of a sequence-to-sequence engine: the
//! source language is detected when not given, the text is normalized and
//! tokenized, the engine runs on the blocking thread pool behind a
//! concurrency gate, and its ranked hypotheses are decoded and cleaned into a
//! primary translation plus alternates.

pub mod backend;
pub mod config;
pub mod error;
pub mod gate;
pub mod language;
pub mod metrics;
pub mod pipeline;
pub mod profile;
pub mod server;
pub mod text;
