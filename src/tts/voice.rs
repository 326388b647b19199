//! Voice catalog for the speech endpoint.

use rand::seq::IndexedRandom;

/// Voices accepted by the speech endpoint.
pub const VOICES: &[&str] = &[
    "alloy", "ash", "coral", "echo", "onyx", "nova", "sage", "shimmer",
];

/// Pseudo-voice that picks a different voice per build.
pub const RANDOM_VOICE: &str = "random";

/// Check whether `name` is a known voice or `random`.
pub fn is_known(name: &str) -> bool {
    name == RANDOM_VOICE || VOICES.contains(&name)
}

/// Resolve a configured voice to a concrete one.
///
/// `random` picks uniformly from [`VOICES`]; any other value is returned
/// unchanged.
pub fn resolve(name: &str) -> &str {
    if name != RANDOM_VOICE {
        return name;
    }
    VOICES.choose(&mut rand::rng()).copied().unwrap_or(name)
}
