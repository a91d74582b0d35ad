//! Player motion controller: turns one tick of directional input into a
//! velocity and an animation or idle-pose selection.
//!
//! Everything here is a pure function of its arguments. The scene feeds it the
//! player's input snapshot and the velocity left over from the previous tick,
//! then applies the result to the ECS.

use bevy::prelude::*;

/// Held/not-held state of the four directions for one tick.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirectionalInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

/// Static standing frame shown while idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacingPose {
    Left,
    Right,
    Back,
    Front,
}

/// Looping walk cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationKey {
    WalkLeft,
    WalkRight,
    WalkBack,
    WalkFront,
}

impl AnimationKey {
    pub const ALL: [AnimationKey; 4] = [
        AnimationKey::WalkLeft,
        AnimationKey::WalkRight,
        AnimationKey::WalkBack,
        AnimationKey::WalkFront,
    ];
}

/// What the sprite should show after a tick. Exactly one variant per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseSelection {
    /// Play (or keep playing) a walk cycle.
    Walk(AnimationKey),
    /// Stop playback; switch to a standing frame, or keep the current frame
    /// when `None`.
    Idle(Option<FacingPose>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionOutput {
    pub velocity: Vec2,
    pub pose: PoseSelection,
}

/// Resolve one tick of player motion.
///
/// Velocities are in map space: +x right, +y down. `previous` is the velocity
/// carried over from the last tick and is only read to pick an idle pose.
pub fn resolve_motion(speed: f32, input: DirectionalInput, previous: Vec2) -> MotionOutput {
    let mut velocity = Vec2::ZERO;

    if input.left {
        velocity.x = -speed;
    } else if input.right {
        velocity.x = speed;
    }

    if input.up {
        velocity.y = -speed;
    } else if input.down {
        velocity.y = speed;
    }

    // Diagonals must not be faster than straight lines.
    let velocity = velocity.normalize_or_zero() * speed;

    MotionOutput {
        velocity,
        pose: select_pose(input, previous),
    }
}

/// Horizontal walk cycles win over vertical ones.
fn select_pose(input: DirectionalInput, previous: Vec2) -> PoseSelection {
    if input.left {
        PoseSelection::Walk(AnimationKey::WalkLeft)
    } else if input.right {
        PoseSelection::Walk(AnimationKey::WalkRight)
    } else if input.up {
        PoseSelection::Walk(AnimationKey::WalkBack)
    } else if input.down {
        PoseSelection::Walk(AnimationKey::WalkFront)
    } else {
        PoseSelection::Idle(idle_pose(previous))
    }
}

fn idle_pose(previous: Vec2) -> Option<FacingPose> {
    if previous.x < 0.0 {
        Some(FacingPose::Left)
    } else if previous.x > 0.0 {
        Some(FacingPose::Right)
    } else if previous.y < 0.0 {
        Some(FacingPose::Back)
    } else if previous.y > 0.0 {
        Some(FacingPose::Front)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::SQRT_2;

    const SPEED: f32 = 170.0;
    const EPS: f32 = 1e-3;

    fn input(up: bool, down: bool, left: bool, right: bool) -> DirectionalInput {
        DirectionalInput { up, down, left, right }
    }

    fn all_inputs() -> impl Iterator<Item = DirectionalInput> {
        (0u8..16).map(|bits| input(bits & 1 != 0, bits & 2 != 0, bits & 4 != 0, bits & 8 != 0))
    }

    #[test]
    fn single_axis_moves_at_full_speed() {
        let cases = [
            (input(true, false, false, false), Vec2::new(0.0, -SPEED)),
            (input(false, true, false, false), Vec2::new(0.0, SPEED)),
            (input(false, false, true, false), Vec2::new(-SPEED, 0.0)),
            (input(false, false, false, true), Vec2::new(SPEED, 0.0)),
        ];
        for (i, expected) in cases {
            let out = resolve_motion(SPEED, i, Vec2::ZERO);
            assert!(out.velocity.abs_diff_eq(expected, EPS), "{i:?} -> {:?}", out.velocity);
        }
    }

    #[test]
    fn diagonal_is_normalized() {
        for (up, down) in [(true, false), (false, true)] {
            for (left, right) in [(true, false), (false, true)] {
                let out = resolve_motion(SPEED, input(up, down, left, right), Vec2::ZERO);
                assert!((out.velocity.length() - SPEED).abs() < EPS);
                assert!((out.velocity.x.abs() - SPEED / SQRT_2).abs() < EPS);
                assert!((out.velocity.y.abs() - SPEED / SQRT_2).abs() < EPS);
            }
        }
    }

    #[test]
    fn any_signal_gives_full_speed_and_none_gives_rest() {
        for i in all_inputs() {
            let out = resolve_motion(SPEED, i, Vec2::ZERO);
            if i != DirectionalInput::default() {
                assert!((out.velocity.length() - SPEED).abs() < EPS, "{i:?}");
            } else {
                assert_eq!(out.velocity, Vec2::ZERO);
            }
        }
    }

    #[test]
    fn left_beats_right() {
        let out = resolve_motion(SPEED, input(false, false, true, true), Vec2::ZERO);
        assert_eq!(out.velocity, Vec2::new(-SPEED, 0.0));
        assert_eq!(out.pose, PoseSelection::Walk(AnimationKey::WalkLeft));
    }

    #[test]
    fn up_beats_down() {
        let out = resolve_motion(SPEED, input(true, true, false, false), Vec2::ZERO);
        assert_eq!(out.velocity, Vec2::new(0.0, -SPEED));
        assert_eq!(out.pose, PoseSelection::Walk(AnimationKey::WalkBack));
    }

    #[test]
    fn horizontal_animation_wins_on_diagonals() {
        let out = resolve_motion(SPEED, input(true, false, true, false), Vec2::ZERO);
        assert_eq!(out.pose, PoseSelection::Walk(AnimationKey::WalkLeft));
        let out = resolve_motion(SPEED, input(false, true, false, true), Vec2::ZERO);
        assert_eq!(out.pose, PoseSelection::Walk(AnimationKey::WalkRight));
        let out = resolve_motion(SPEED, input(false, true, false, false), Vec2::ZERO);
        assert_eq!(out.pose, PoseSelection::Walk(AnimationKey::WalkFront));
    }

    #[test]
    fn idle_pose_follows_previous_velocity() {
        let none = DirectionalInput::default();
        let cases = [
            (Vec2::new(-SPEED, 0.0), FacingPose::Left),
            (Vec2::new(SPEED, 0.0), FacingPose::Right),
            (Vec2::new(0.0, -SPEED), FacingPose::Back),
            (Vec2::new(0.0, SPEED), FacingPose::Front),
            // x is checked before y
            (Vec2::new(-1.0, 1.0), FacingPose::Left),
        ];
        for (previous, pose) in cases {
            let out = resolve_motion(SPEED, none, previous);
            assert_eq!(out.velocity, Vec2::ZERO);
            assert_eq!(out.pose, PoseSelection::Idle(Some(pose)));
        }
    }

    #[test]
    fn standing_still_keeps_the_current_frame() {
        let out = resolve_motion(SPEED, DirectionalInput::default(), Vec2::ZERO);
        assert_eq!(out.pose, PoseSelection::Idle(None));
    }

    #[test]
    fn identical_inputs_give_identical_outputs() {
        let previous = Vec2::new(12.0, -3.0);
        for i in all_inputs() {
            assert_eq!(resolve_motion(SPEED, i, previous), resolve_motion(SPEED, i, previous));
        }
    }
}
