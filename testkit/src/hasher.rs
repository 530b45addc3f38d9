use parity_traits::{Hash, Hasher, HASH_SIZE};

/// `Hasher` backed by `blake2b_simd`, keyed via blake2b's native key input.
#[derive(Debug, Default, Clone, Copy)]
pub struct Blake2Hasher;

impl Hasher for Blake2Hasher {
    fn hash(&self, key: &[u8], data: &[u8]) -> Hash {
        let mut params = blake2b_simd::Params::new();
        params.hash_length(HASH_SIZE);
        if !key.is_empty() {
            params.key(key);
        }
        let digest = params.hash(data);
        let mut out = [0u8; HASH_SIZE];
        out.copy_from_slice(digest.as_bytes());
        Hash(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_input_same_hash() {
        let hasher = Blake2Hasher;
        let a = hasher.hash(b"key", b"data");
        let b = hasher.hash(b"key", b"data");
        assert_eq!(a.0, b.0);
    }

    #[test]
    fn different_key_different_hash() {
        let hasher = Blake2Hasher;
        let a = hasher.hash(b"key1", b"data");
        let b = hasher.hash(b"key2", b"data");
        assert_ne!(a.0, b.0);
    }
}
