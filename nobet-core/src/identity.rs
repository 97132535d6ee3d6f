//! Stable identifier normalization.
//!
//! Grounded on `examples/original_source/functions/utils.py`'s
//! `normalize_id` / `ids_match` / `find_matching_id`, which the request
//! parsers and rule/manual-pin resolution both depend on so that `"17"` and
//! `17` name the same person.

use sha2::{Digest, Sha256};

/// Any request-document scalar that can name a person: a JSON number,
/// string, or boolean, depending on how the caller encoded it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawId<'a> {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(&'a str),
}

/// Normalizes any scalar id encoding to a stable 64-bit integer.
///
/// - Booleans map to 0/1.
/// - Integers pass through unchanged.
/// - Integer-valued floats cast to their integer value.
/// - Other finite floats and all strings are hashed: a tagged string
///   representation is fed through SHA-256 and the first 8 bytes are
///   truncated to an `i64`. Tagging keeps `"17"` (a string) from landing
///   in the same hash bucket as some unrelated float that happens to hash
///   identically before tagging; it does not, however, prevent `"17"` and
///   the integer `17` from colliding — that collision is intentional so
///   that `idsMatch("17", 17)` holds.
pub fn normalize_id(raw: RawId<'_>) -> i64 {
    match raw {
        RawId::Bool(b) => {
            if b {
                1
            } else {
                0
            }
        }
        RawId::Int(i) => i,
        RawId::Float(f) => {
            if f.fract() == 0.0 && f.is_finite() {
                f as i64
            } else {
                hash_tagged("f", &format!("{f}"))
            }
        }
        RawId::Str(s) => {
            // A numeric-looking string collapses onto its integer twin so
            // that "17" and 17 normalize identically.
            if let Ok(i) = s.trim().parse::<i64>() {
                i
            } else if let Ok(f) = s.trim().parse::<f64>() {
                normalize_id(RawId::Float(f))
            } else {
                hash_tagged("s", s)
            }
        }
    }
}

fn hash_tagged(tag: &str, value: &str) -> i64 {
    let mut hasher = Sha256::new();
    hasher.update(tag.as_bytes());
    hasher.update(b":");
    hasher.update(value.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[0..8]);
    // Clear the sign bit so hashed ids never collide with small negative
    // integer ids that plausibly appear as literal person ids.
    (i64::from_be_bytes(bytes)) & 0x7fff_ffff_ffff_ffff
}

/// Two raw ids name the same person iff their normalized forms are equal.
pub fn ids_match(a: RawId<'_>, b: RawId<'_>) -> bool {
    normalize_id(a) == normalize_id(b)
}

/// Finds the element of `collection` whose normalized id matches `target`,
/// by applying `key` to project each element to its raw id.
pub fn find_matching_id<'a, T, F>(target: i64, collection: &'a [T], key: F) -> Option<&'a T>
where
    F: Fn(&T) -> i64,
{
    collection.iter().find(|item| key(item) == target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_pass_through() {
        assert_eq!(normalize_id(RawId::Int(42)), 42);
    }

    #[test]
    fn booleans_map_to_zero_one() {
        assert_eq!(normalize_id(RawId::Bool(true)), 1);
        assert_eq!(normalize_id(RawId::Bool(false)), 0);
    }

    #[test]
    fn numeric_string_matches_integer_twin() {
        assert_eq!(normalize_id(RawId::Str("17")), normalize_id(RawId::Int(17)));
        assert!(ids_match(RawId::Str("17"), RawId::Int(17)));
    }

    #[test]
    fn integer_valued_float_matches_integer() {
        assert_eq!(normalize_id(RawId::Float(5.0)), normalize_id(RawId::Int(5)));
    }

    #[test]
    fn distinct_strings_do_not_collide_with_small_integers() {
        // Extremely unlikely to collide, but the point of the test is that
        // the function is deterministic and total, not proof of collision
        // freedom.
        let a = normalize_id(RawId::Str("Ahmet"));
        let b = normalize_id(RawId::Str("Mehmet"));
        assert_ne!(a, b);
    }

    #[test]
    fn normalize_id_is_deterministic() {
        let a = normalize_id(RawId::Str("Ahmet Yilmaz"));
        let b = normalize_id(RawId::Str("Ahmet Yilmaz"));
        assert_eq!(a, b);
    }

    #[test]
    fn find_matching_id_locates_member() {
        let ids = vec![10i64, 20, 30];
        assert_eq!(find_matching_id(20, &ids, |x| *x), Some(&20));
        assert_eq!(find_matching_id(99, &ids, |x| *x), None);
    }
}
