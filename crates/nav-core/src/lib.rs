pub mod error;
pub mod fallback;
pub mod geo;
pub mod guidance;
pub mod models;

pub use error::PipelineError;
pub use fallback::{plan_fallback, FallbackTrigger};
pub use geo::{bearing, distance, elevation_angle, visual_scale, EARTH_RADIUS_M};
pub use guidance::{
    direction_from_adjustment, direction_from_heading_delta, format_distance, turn_state,
    AlignmentStatus, TurnState,
};
pub use models::{
    normalize_heading, AnalysisContext, Direction, GeoPoint, NavigationInstruction, PoiAction,
    ReasoningToken, RefinedPoi, SkylineFeature, SkylineKind, VisiblePoi, Waypoint,
};
