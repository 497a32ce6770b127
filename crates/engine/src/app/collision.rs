use super::{SimEntity, Vec2};

/// Impulse for two hitboxes closer than `min_distance`: `first` loses it and
/// `second` gains it. `None` when they do not overlap.
///
/// The target is the point `min_distance` away from `first` along the line
/// towards `second`; the impulse is a fraction of the gap to that target.
pub fn separation_impulse(
    first: Vec2,
    second: Vec2,
    min_distance: f32,
    response: f32,
) -> Option<Vec2> {
    let delta = second - first;
    if delta.length() >= min_distance {
        return None;
    }
    let angle = delta.y.atan2(delta.x);
    let target = first + Vec2::from_angle(angle, min_distance);
    Some((target - second) * response)
}

/// Applies the separation impulse to both entities. Returns the impulse
/// subtracted from `first`, which `second` received with the opposite sign.
pub fn resolve_pair(
    first: &mut SimEntity,
    second: &mut SimEntity,
    min_distance: f32,
    response: f32,
) -> Option<Vec2> {
    let impulse =
        separation_impulse(first.position(), second.position(), min_distance, response)?;
    first.push(impulse * -1.0);
    second.push(impulse);
    Some(impulse)
}

/// Resolves `index` against every other entity. Returns how many overlaps
/// were found.
pub fn resolve_overlaps_for(
    index: usize,
    entities: &mut [SimEntity],
    min_distance: f32,
    response: f32,
) -> usize {
    let mut hits = 0;
    for other in 0..entities.len() {
        if other == index {
            continue;
        }
        let Some((current, neighbor)) = pair_mut(entities, index, other) else {
            continue;
        };
        if resolve_pair(current, neighbor, min_distance, response).is_some() {
            hits += 1;
        }
    }
    hits
}

fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> Option<(&mut T, &mut T)> {
    if a == b || a.max(b) >= items.len() {
        return None;
    }
    if a < b {
        let (head, tail) = items.split_at_mut(b);
        Some((&mut head[a], &mut tail[0]))
    } else {
        let (head, tail) = items.split_at_mut(a);
        Some((&mut tail[0], &mut head[b]))
    }
}
