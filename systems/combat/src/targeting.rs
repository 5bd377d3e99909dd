//! Geometric target selection over an enemy view.

use std::cmp::Ordering;

use gridfort_core::{EnemySnapshot, EnemyView, Vec2};

/// Half-width of a line beam, in cells.
pub(crate) const BEAM_HALF_WIDTH: f32 = 0.5;

fn by_distance(origin: Vec2) -> impl Fn(&&EnemySnapshot, &&EnemySnapshot) -> Ordering {
    move |left, right| {
        left.position
            .distance(origin)
            .partial_cmp(&right.position.distance(origin))
            .unwrap_or(Ordering::Equal)
            .then(left.id.cmp(&right.id))
    }
}

/// Enemies within `range` of `origin`, in ascending id order.
pub(crate) fn in_range<'a>(
    enemies: &'a EnemyView,
    origin: Vec2,
    range: f32,
) -> impl Iterator<Item = &'a EnemySnapshot> + 'a {
    enemies
        .iter()
        .filter(move |enemy| enemy.position.distance(origin) <= range)
}

/// Closest enemy within `range`; ties go to the lower id.
pub(crate) fn nearest(enemies: &EnemyView, origin: Vec2, range: f32) -> Option<&EnemySnapshot> {
    nearest_to(enemies, origin, range, origin)
}

/// Enemy within `range` of `origin` that lies closest to `from`.
pub(crate) fn nearest_to(
    enemies: &EnemyView,
    origin: Vec2,
    range: f32,
    from: Vec2,
) -> Option<&EnemySnapshot> {
    in_range(enemies, origin, range).min_by(by_distance(from))
}

/// Up to `count` enemies within `range`, closest first.
pub(crate) fn nearest_n(
    enemies: &EnemyView,
    origin: Vec2,
    range: f32,
    count: u32,
) -> Vec<&EnemySnapshot> {
    let mut candidates: Vec<&EnemySnapshot> = in_range(enemies, origin, range).collect();
    candidates.sort_by(by_distance(origin));
    candidates.truncate(count as usize);
    candidates
}

/// Enemies lying within [`BEAM_HALF_WIDTH`] of the segment from `origin`
/// toward `aim`, extended to `range`.
pub(crate) fn along_ray<'a>(
    enemies: &'a EnemyView,
    origin: Vec2,
    aim: Vec2,
    range: f32,
) -> impl Iterator<Item = &'a EnemySnapshot> + 'a {
    let end = origin + (aim - origin).normalize_or_zero() * range;
    enemies
        .iter()
        .filter(move |enemy| distance_to_segment(enemy.position, origin, end) <= BEAM_HALF_WIDTH)
}

fn distance_to_segment(point: Vec2, start: Vec2, end: Vec2) -> f32 {
    let segment = end - start;
    let length_squared = segment.length_squared();
    if length_squared <= f32::EPSILON {
        return point.distance(start);
    }
    let along = ((point - start).dot(segment) / length_squared).clamp(0.0, 1.0);
    point.distance(start + segment * along)
}
