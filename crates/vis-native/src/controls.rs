use vis_core::{ParamError, VisualiserParams};

pub const MOVEMENT_STEP: f32 = 0.1;
pub const FORCE_STEP: f32 = 0.5;
pub const COUNT_STEP: f32 = 250.0;

/// What a key press asks the visualiser to do.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ControlAction {
    Reset,
    Nudge { id: &'static str, delta: f32 },
}

/// Map a key name (`"r"`, `"+"`, `"ArrowUp"`, ...) to an action.
pub fn action_for_key(key: &str) -> Option<ControlAction> {
    let nudge = |id, delta| Some(ControlAction::Nudge { id, delta });
    match key {
        "r" | "R" => Some(ControlAction::Reset),
        "ArrowUp" => nudge("movement_style", MOVEMENT_STEP),
        "ArrowDown" => nudge("movement_style", -MOVEMENT_STEP),
        "ArrowRight" => nudge("force_scale", FORCE_STEP),
        "ArrowLeft" => nudge("force_scale", -FORCE_STEP),
        "+" | "=" => nudge("num_particles", COUNT_STEP),
        "-" | "_" => nudge("num_particles", -COUNT_STEP),
        _ => None,
    }
}

/// Add `delta` to a named parameter; returns the clamped result.
pub fn nudge(params: &mut VisualiserParams, id: &str, delta: f32) -> Result<f32, ParamError> {
    let value = params.get(id)? + delta;
    params.set(id, value)?;
    params.get(id)
}
