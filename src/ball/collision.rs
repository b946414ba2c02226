//! Collision detection and response
//!
//! Four target classes are tested every tick in a fixed order: ground, field
//! boundary, goal posts, goalkeeper. Each one that overlaps resolves
//! independently, so several can fire in the same tick.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ball::components::BallState;
use crate::constants::{FALLBACK_NORMAL, NORMAL_EPSILON};
use crate::difficulty::PhysicsParams;
use crate::tuning::{BallTuning, FieldGeometry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionKind {
    Ground,
    Boundary,
    GoalPost,
    Goalkeeper,
}

impl CollisionKind {
    pub fn name(&self) -> &'static str {
        match self {
            CollisionKind::Ground => "ground",
            CollisionKind::Boundary => "boundary",
            CollisionKind::GoalPost => "post",
            CollisionKind::Goalkeeper => "keeper",
        }
    }
}

/// One resolved contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    pub kind: CollisionKind,
    pub contact_point: Vec3,
    /// Unit normal pointing from the target toward the ball
    pub normal: Vec3,
    /// Magnitude of the velocity change (diagnostics only)
    pub impulse: f32,
}

/// Goalkeeper collision box, from the keeper's last published position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeeperVolume {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl KeeperVolume {
    /// Box for a keeper standing at `anchor` (feet, centered). The plan view
    /// is square: the keeper's width is used on both x and z.
    pub fn from_anchor(anchor: Vec3, field: &FieldGeometry) -> Self {
        Self {
            center: anchor + Vec3::Y * (field.keeper_height / 2.0),
            half_extents: Vec3::new(
                field.keeper_width / 2.0,
                field.keeper_height / 2.0,
                field.keeper_width / 2.0,
            ),
        }
    }

    /// True when a sphere of `radius` at `point` overlaps the box
    pub fn overlaps(&self, point: Vec3, radius: f32) -> bool {
        let d = (point - self.center).abs();
        let reach = self.half_extents + Vec3::splat(radius);
        d.x < reach.x && d.y < reach.y && d.z < reach.z
    }
}

/// Everything that fired this tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionResult {
    pub events: Vec<CollisionEvent>,
}

impl CollisionResult {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn fired(&self, kind: CollisionKind) -> bool {
        self.events.iter().any(|e| e.kind == kind)
    }

    /// The contact that ends the shot, keeper taking priority over posts
    pub fn terminal(&self) -> Option<CollisionKind> {
        if self.fired(CollisionKind::Goalkeeper) {
            Some(CollisionKind::Goalkeeper)
        } else if self.fired(CollisionKind::GoalPost) {
            Some(CollisionKind::GoalPost)
        } else {
            None
        }
    }
}

/// Normalize, falling back to -z for degenerate vectors
pub fn safe_normal(v: Vec3) -> Vec3 {
    let len = v.length();
    if !len.is_finite() || len < NORMAL_EPSILON {
        return FALLBACK_NORMAL;
    }
    v / len
}

/// Mirror `velocity` about the plane with unit normal `normal`
pub fn reflect(velocity: Vec3, normal: Vec3) -> Vec3 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Shared inputs for a resolver pass
pub struct CollisionContext<'a> {
    pub params: &'a PhysicsParams,
    pub field: &'a FieldGeometry,
    pub ball: &'a BallTuning,
    /// None when the keeper's body is out of play for this shot
    pub keeper: Option<KeeperVolume>,
}

/// Run every check in order and apply their corrections to `state`
pub fn resolve_collisions(state: &mut BallState, ctx: &CollisionContext) -> CollisionResult {
    let mut result = CollisionResult::default();

    if let Some(event) = resolve_ground(state, ctx) {
        result.events.push(event);
    }
    if let Some(event) = resolve_boundary(state, ctx) {
        result.events.push(event);
    }
    result.events.extend(resolve_posts(state, ctx));
    if let Some(event) = resolve_keeper(state, ctx) {
        result.events.push(event);
    }

    // Keeper push-out can point downward; the floor always wins
    let radius = ctx.field.ball_radius;
    if state.position.y < radius {
        state.position.y = radius;
    }

    result
}

pub fn resolve_ground(state: &mut BallState, ctx: &CollisionContext) -> Option<CollisionEvent> {
    let radius = ctx.field.ball_radius;
    if state.position.y >= radius {
        return None;
    }

    let before = state.velocity.y;
    state.position.y = radius;
    state.velocity.y = -before * ctx.params.bounce_factor * ctx.ball.ground_extra_damping;
    if state.velocity.y.abs() < ctx.ball.ground_rest_snap {
        state.velocity.y = 0.0;
    }

    Some(CollisionEvent {
        kind: CollisionKind::Ground,
        contact_point: Vec3::new(state.position.x, 0.0, state.position.z),
        normal: Vec3::Y,
        impulse: (state.velocity.y - before).abs(),
    })
}

pub fn resolve_boundary(state: &mut BallState, ctx: &CollisionContext) -> Option<CollisionEvent> {
    let limit = ctx.field.half_field_width() - ctx.field.ball_radius;
    if state.position.x.abs() <= limit {
        return None;
    }

    let side = state.position.x.signum();
    let before = state.velocity.x;
    state.position.x = side * limit;
    state.velocity.x = -before * ctx.ball.boundary_damping;

    Some(CollisionEvent {
        kind: CollisionKind::Boundary,
        contact_point: Vec3::new(side * ctx.field.half_field_width(), state.position.y, state.position.z),
        normal: Vec3::new(-side, 0.0, 0.0),
        impulse: (state.velocity.x - before).abs(),
    })
}

/// Each post is checked on its own; both may fire
pub fn resolve_posts(state: &mut BallState, ctx: &CollisionContext) -> Vec<CollisionEvent> {
    let reach = ctx.field.ball_radius + ctx.field.collision_tolerance;
    let mut events = Vec::new();

    for post in ctx.field.post_positions() {
        if state.position.distance(post) >= reach {
            continue;
        }
        let normal = safe_normal(state.position - post);
        let before = state.velocity;
        state.velocity = reflect(before, normal) * ctx.ball.post_damping;
        events.push(CollisionEvent {
            kind: CollisionKind::GoalPost,
            contact_point: post,
            normal,
            impulse: (state.velocity - before).length(),
        });
    }

    events
}

pub fn resolve_keeper(state: &mut BallState, ctx: &CollisionContext) -> Option<CollisionEvent> {
    let keeper = ctx.keeper?;
    let radius = ctx.field.ball_radius;
    if !keeper.overlaps(state.position, radius) {
        return None;
    }

    let normal = safe_normal(state.position - keeper.center);
    let before = state.velocity;
    state.velocity = reflect(before, normal) * ctx.ball.keeper_damping;
    state.position += normal * ctx.ball.keeper_push_out * radius;

    Some(CollisionEvent {
        kind: CollisionKind::Goalkeeper,
        contact_point: keeper.center,
        normal,
        impulse: (state.velocity - before).length(),
    })
}
