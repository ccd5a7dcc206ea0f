//! Prompt templates for the vision-reasoning capability.
//!
//! The model is asked for strict JSON; the client still treats every field
//! as optional and fills defaults on the way out.

use nav_core::models::{AnalysisContext, VisiblePoi, Waypoint};

pub(crate) fn navigation_frame(ctx: &AnalysisContext) -> String {
    let destination_context = ctx
        .destination_hint
        .as_deref()
        .map(|name| format!(" User is navigating to: '{name}'."))
        .unwrap_or_default();

    format!(
        "You are a human-centric AR walking-navigation assistant.{destination_context}\n\
         \n\
         Current Context:\n\
         - Location: ({:.6}, {:.6})\n\
         - Heading: {:.1}° (0°=North, 90°=East, 180°=South, 270°=West)\n\
         \n\
         Task: Analyze the camera frame and provide navigation guidance using visible landmarks.\n\
         \n\
         Requirements:\n\
         1. Identify visible local landmarks (buildings, signs, stores, street features)\n\
         2. Compare landmark positions to the user's heading\n\
         3. Give clear walking directions using what they can actually see\n\
         4. Estimate bearing adjustment needed (positive = turn right, negative = turn left)\n\
         5. Detect if the user appears lost or off-route\n\
         \n\
         Return ONLY valid JSON (no markdown):\n\
         {{\n\
           \"instruction\": \"concise walking direction using visible landmarks\",\n\
           \"bearing_adjustment\": <integer degrees to adjust, -180 to 180>,\n\
           \"landmark_identified\": \"name of most prominent landmark visible\",\n\
           \"confidence\": <float 0.0-1.0>,\n\
           \"is_lost\": <boolean>\n\
         }}",
        ctx.location.latitude, ctx.location.longitude, ctx.heading_deg
    )
}

pub(crate) fn horizon(ctx: &AnalysisContext, visible_pois: &[VisiblePoi]) -> String {
    let poi_summary = visible_pois
        .iter()
        .map(|poi| {
            format!(
                "- {} at {:.1}° ({:.1}km)",
                poi.name,
                poi.bearing_degrees,
                poi.distance_meters / 1000.0
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are analyzing a landscape photo for AR navigation horizon markers.\n\
         \n\
         Current Context:\n\
         - Location: ({:.6}, {:.6})\n\
         - Camera Heading: {:.1}° (0°=North, 90°=East, 180°=South, 270°=West)\n\
         - Field of View: ~90° horizontal\n\
         \n\
         Visible POIs (Points of Interest) in this direction:\n\
         {poi_summary}\n\
         \n\
         Task: identify mountains, buildings, and treelines along the skyline, the horizon\n\
         line position (as Y% from bottom, 0-100), and for each POI whether it is occluded\n\
         and how its marker should move: \"show\", \"hide\", \"raise\", or \"lower\".\n\
         \n\
         Return ONLY valid JSON:\n\
         {{\n\
           \"horizon_line_y_percent\": <integer 0-100>,\n\
           \"skyline_features\": [\n\
             {{\"type\": \"mountain|building|treeline\", \"bearing_start\": <degrees>,\n\
               \"bearing_end\": <degrees>, \"estimated_height_degrees\": <vertical angle>}}\n\
           ],\n\
           \"refined_pois\": [\n\
             {{\"name\": \"POI name\", \"original_bearing\": <degrees>,\n\
               \"action\": \"show|hide|raise|lower\", \"y_adjustment\": <float -1.0 to 1.0>,\n\
               \"reasoning\": \"brief explanation\"}}\n\
           ]\n\
         }}",
        ctx.location.latitude, ctx.location.longitude, ctx.heading_deg
    )
}

pub(crate) fn turn_phrase(
    poi_name: &str,
    direction: &str,
    turn_amount_deg: f64,
    distance_km: f64,
) -> String {
    format!(
        "You are a warm, encouraging AR navigation guide helping someone find \"{poi_name}\".\n\
         \n\
         Current situation:\n\
         - They need to turn {turn_amount_deg:.0}° {direction}\n\
         - The target is {distance_km:.1} km away\n\
         \n\
         Generate a SHORT, natural voice guidance (max 12 words):\n\
         - Be conversational and warm\n\
         - Don't mention technical terms like \"degrees\" unless necessary\n\
         - Keep it brief for real-time feedback\n\
         \n\
         Return ONLY the guidance text, nothing else."
    )
}

pub(crate) fn route_preview(user_location: (f64, f64), waypoints: &[Waypoint]) -> String {
    let waypoint_list = waypoints
        .iter()
        .map(|w| {
            format!(
                "- {}: ({}, {})",
                w.name, w.location.latitude, w.location.longitude
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Generate visual navigation cues for offline AR navigation.\n\
         \n\
         User Location: ({}, {})\n\
         \n\
         Route Waypoints:\n\
         {waypoint_list}\n\
         \n\
         For each waypoint, provide a visual description, key landmarks to look for,\n\
         and a directional hint from the previous waypoint.\n\
         \n\
         Return JSON array:\n\
         [\n\
           {{\n\
             \"waypoint_name\": \"string\",\n\
             \"visual_cue\": \"what to look for\",\n\
             \"landmarks\": [\"landmark1\", \"landmark2\"],\n\
             \"approach_hint\": \"how to approach from previous point\"\n\
           }}\n\
         ]",
        user_location.0, user_location.1
    )
}
