//! Client for the external vision-reasoning capability.
//!
//! Prompt construction is this crate's responsibility; transport, auth, and
//! rate limits belong to the provider. Every call returns a typed result
//! plus an optional reasoning token the caller threads into the next frame.

mod client;
mod prompts;

pub use client::{
    FrameAnalysis, HorizonAnalysis, RouteCue, VisionClient, VisionOutcome,
};
