//! Deterministic field layout hashing.

use blake3::Hasher;

use crate::FieldIndex;

/// Computes a deterministic hash of the field index layout.
///
/// State dumps carry this value so readers can reject dumps written against a
/// different layout.
#[must_use]
pub fn layout_hash() -> u64 {
    let mut hasher = Hasher::new();
    write_u32(&mut hasher, FieldIndex::COUNT as u32);
    for start in [
        FieldIndex::EQUIP_START,
        FieldIndex::STAIN_START,
        FieldIndex::APPEARANCE_START,
        FieldIndex::CREST_START,
        FieldIndex::META_START,
        FieldIndex::COLOR_START,
    ] {
        write_u8(&mut hasher, start);
    }

    for field in FieldIndex::all() {
        write_u8(&mut hasher, field.raw());
        write_str(&mut hasher, &field.to_string());
    }

    let hash = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(head)
}

fn write_u8(hasher: &mut Hasher, value: u8) {
    hasher.update(&[value]);
}

fn write_u32(hasher: &mut Hasher, value: u32) {
    hasher.update(&value.to_le_bytes());
}

fn write_str(hasher: &mut Hasher, value: &str) {
    write_u32(hasher, value.len() as u32);
    hasher.update(value.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_across_calls() {
        assert_eq!(layout_hash(), layout_hash());
    }

    #[test]
    fn hash_is_not_trivial() {
        assert_ne!(layout_hash(), 0);
    }
}
