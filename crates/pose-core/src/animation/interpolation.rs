//! Keyframe lookup and sampling with pre/post playback behaviours

use super::types::{Interpolate, KeyBehaviour, Keyframe};

/// Find the index of the keyframe at or before the given time
///
/// Returns None if the list is empty or `time` lies before the first key.
/// For interpolation, this returns the index of the earlier keyframe in the
/// bracketing pair (so we can interpolate between `[index]` and `[index+1]`).
pub fn find_key_index<T>(keys: &[Keyframe<T>], time: f64) -> Option<usize> {
    let first = keys.first()?;
    if time < first.time {
        return None;
    }

    let last_index = keys.len() - 1;
    if time >= keys[last_index].time {
        return Some(last_index);
    }

    // Largest index with keys[index].time <= time
    let mut low = 0;
    let mut high = last_index;
    while low < high {
        let mid = (low + high).div_ceil(2);
        if keys[mid].time <= time {
            low = mid;
        } else {
            high = mid - 1;
        }
    }

    Some(low)
}

/// Which end of a key list is being extrapolated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Start,
    End,
}

/// Sample a key list at `time` (clip-relative ticks)
///
/// Inside `[first.time, last.time]` the bracketing pair is interpolated.
/// Outside it `pre` / `post` decide the value:
/// - `Default` returns `rest`
/// - `Constant` holds the first / last key
/// - `Linear` extrapolates along the first / last two keys (a single key holds)
/// - `Repeat` wraps the time by `duration` and samples again
///
/// `Repeat` wraps into `[first.time, first.time + period)` with
/// `period = max(duration, last.time - first.time)`. This is the interval
/// `[last.time - period, first.time)` shifted by one period, so both give
/// the same value. Past the last key the sample blends from the last key
/// back to the first.
///
/// An empty list always yields `rest`.
pub fn sample_keys<T: Interpolate>(
    keys: &[Keyframe<T>],
    time: f64,
    duration: f64,
    pre: KeyBehaviour,
    post: KeyBehaviour,
    rest: T,
) -> T {
    let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
        return rest;
    };

    let (behaviour, edge) = if time < first.time {
        (pre, Edge::Start)
    } else if time > last.time {
        (post, Edge::End)
    } else {
        return interpolate_within(keys, time);
    };

    match behaviour {
        KeyBehaviour::Default => rest,
        KeyBehaviour::Constant => match edge {
            Edge::Start => first.value,
            Edge::End => last.value,
        },
        KeyBehaviour::Linear => extrapolate(keys, time, edge),
        KeyBehaviour::Repeat => sample_wrapped(keys, time, duration),
    }
}

fn interpolate_within<T: Interpolate>(keys: &[Keyframe<T>], time: f64) -> T {
    let index = find_key_index(keys, time).unwrap_or(0);
    let Some(next) = keys.get(index + 1) else {
        return keys[index].value;
    };
    segment_value(&keys[index], next, time)
}

fn segment_value<T: Interpolate>(from: &Keyframe<T>, to: &Keyframe<T>, time: f64) -> T {
    let span = to.time - from.time;
    if span <= 0.0 {
        return to.value;
    }
    let factor = ((time - from.time) / span) as f32;
    from.value.interpolate(&to.value, factor)
}

fn extrapolate<T: Interpolate>(keys: &[Keyframe<T>], time: f64, edge: Edge) -> T {
    let n = keys.len();
    if n < 2 {
        return keys[0].value;
    }
    let (from, to) = match edge {
        Edge::Start => (&keys[0], &keys[1]),
        Edge::End => (&keys[n - 2], &keys[n - 1]),
    };
    if to.time - from.time <= 0.0 {
        return match edge {
            Edge::Start => from.value,
            Edge::End => to.value,
        };
    }
    segment_value(from, to, time)
}

fn sample_wrapped<T: Interpolate>(keys: &[Keyframe<T>], time: f64, duration: f64) -> T {
    let first = &keys[0];
    let last = &keys[keys.len() - 1];
    let period = duration.max(last.time - first.time);
    if period <= 0.0 || !period.is_finite() {
        return first.value;
    }

    let wrapped = first.time + (time - first.time).rem_euclid(period);
    if wrapped <= last.time {
        return interpolate_within(keys, wrapped);
    }

    // Between the last key and the end of the period: blend back to the first key
    let gap = first.time + period - last.time;
    if gap <= 0.0 {
        return last.value;
    }
    let factor = ((wrapped - last.time) / gap) as f32;
    last.value.interpolate(&first.value, factor)
}
