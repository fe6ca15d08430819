use rand::Rng;

/// Characters a generated suffix is drawn from. Lowercase only, since Docker
/// rejects repository names with uppercase letters.
pub const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Length of the random suffix appended to a prefix.
pub const SUFFIX_LEN: usize = 8;

/// Returns `{prefix}-{suffix}` with a fresh random suffix.
///
/// Uniqueness is probabilistic (36^8 possibilities); collisions with a
/// concurrent build are not detected.
pub fn generate(prefix: &str) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!("{prefix}-{suffix}")
}

/// Whether `name` is exactly `{prefix}-` followed by a generated suffix.
pub fn has_generated_suffix(name: &str, prefix: &str) -> bool {
    let Some(suffix) = name
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
    else {
        return false;
    };
    suffix.len() == SUFFIX_LEN && suffix.bytes().all(|b| SUFFIX_ALPHABET.contains(&b))
}
