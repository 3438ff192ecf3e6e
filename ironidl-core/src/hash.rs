//! Field-id hashing.
//!
//! Record fields and variant tags are identified on the wire by a `u32`
//! derived from their name, so two schemas that agree on field names agree
//! on the wire regardless of declaration order.

/// Hashes a field or tag name to its canonical id.
///
/// `h = 0; for each byte b: h = h * 223 + b (mod 2^32)`.
#[must_use]
pub fn idl_hash(name: &str) -> u32 {
    name.bytes()
        .fold(0u32, |h, b| h.wrapping_mul(223).wrapping_add(u32::from(b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_empty() {
        assert_eq!(idl_hash(""), 0);
    }

    #[test]
    fn test_hash_single_byte() {
        assert_eq!(idl_hash("a"), 97);
        assert_eq!(idl_hash("b"), 98);
    }

    #[test]
    fn test_hash_known_values() {
        assert_eq!(idl_hash("ok"), 24_860);
        assert_eq!(idl_hash("err"), 5_048_165);
        assert_eq!(idl_hash("foo"), 5_097_222);
    }

    #[test]
    fn test_hash_order_sensitive() {
        assert_ne!(idl_hash("ab"), idl_hash("ba"));
    }

    #[test]
    fn test_hash_wraps() {
        // long names overflow u32 and must wrap instead of panicking
        let name = "a_very_long_field_name_that_overflows_the_accumulator";
        assert_eq!(idl_hash(name), idl_hash(name));
    }
}
