use std::borrow::Cow;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub fn short_label(label: &str, max_chars: usize) -> Cow<'_, str> {
    if label.chars().count() <= max_chars {
        return Cow::Borrowed(label);
    }

    let mut shortened = label
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    shortened.push('…');
    Cow::Owned(shortened)
}

pub fn stable_unit<T: Hash>(value: T) -> f32 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    let hash = hasher.finish();

    ((hash & 0xffff_ffff) as f64 / (u32::MAX as f64 + 1.0)) as f32
}

/// Tiny deterministic offset used to separate coincident points.
pub fn jiggle(seed: usize) -> f32 {
    (stable_unit(seed) - 0.5) * 1e-6
}
