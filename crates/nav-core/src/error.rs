//! Error taxonomy for the navigation pipeline.
//!
//! Only `Validation` is surfaced to callers; every other variant is
//! recovered internally (fallback planner, fail-closed terrain gate,
//! cache treated as a miss) so the pipeline always produces a well-formed
//! instruction.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed caller input: bad coordinates, heading, or request shape.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Vision capability unreachable, timed out, or returned garbage.
    #[error("vision capability unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Elevation provider failed; the terrain gate fails closed on this.
    #[error("terrain lookup failed: {0}")]
    TerrainLookup(String),

    /// Result cache unavailable; treated as an unconditional miss.
    #[error("result cache unavailable")]
    CacheUnavailable,
}

impl PipelineError {
    /// Short stable label for metrics recording.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "validation",
            PipelineError::UpstreamUnavailable(_) => "upstream_unavailable",
            PipelineError::TerrainLookup(_) => "terrain_lookup",
            PipelineError::CacheUnavailable => "cache_unavailable",
        }
    }
}
