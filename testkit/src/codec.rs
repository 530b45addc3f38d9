use parity_traits::{ParityLevel, RaidCodec};

/// A deterministic, pure stand-in for the RAID coding primitive (spec §2
/// C3: "treated as a pure function").
///
/// The primary parity stream is a byte-wise XOR across all data buffers.
/// The Q-parity stream (used only at [`ParityLevel::Dual`]) is a
/// byte-wise weighted sum, each disk's contribution scaled by its
/// `(index + 1)`. This is not a real Reed-Solomon code -- repairing from
/// damaged parity is explicitly out of scope for this crate -- but it is
/// a genuine pure function of `(level, data)`, which is all invariant 1
/// (spec §8) requires.
#[derive(Debug, Default, Clone, Copy)]
pub struct XorRaidCodec;

impl RaidCodec for XorRaidCodec {
    fn encode(&self, level: ParityLevel, data: &[&[u8]], parity: &mut [&mut [u8]]) {
        assert_eq!(parity.len(), level.count());
        let block_size = parity[0].len();
        for byte in parity[0].iter_mut() {
            *byte = 0;
        }
        for buf in data {
            debug_assert_eq!(buf.len(), block_size);
            for (out, &b) in parity[0].iter_mut().zip(buf.iter()) {
                *out ^= b;
            }
        }

        if level == ParityLevel::Dual {
            for byte in parity[1].iter_mut() {
                *byte = 0;
            }
            for (j, buf) in data.iter().enumerate() {
                let weight = (j as u16 + 1) as u8;
                for (out, &b) in parity[1].iter_mut().zip(buf.iter()) {
                    *out = out.wrapping_add(b.wrapping_mul(weight));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_level_is_xor() {
        let codec = XorRaidCodec;
        let a = [0b1010_1010u8; 4];
        let b = [0b0101_0101u8; 4];
        let mut p = [0u8; 4];
        {
            let data: [&[u8]; 2] = [&a, &b];
            let mut parity: [&mut [u8]; 1] = [&mut p];
            codec.encode(ParityLevel::Single, &data, &mut parity);
        }
        assert_eq!(p, [0xFFu8; 4]);
    }

    #[test]
    fn empty_data_yields_zero_parity() {
        let codec = XorRaidCodec;
        let mut p = [0xFFu8; 4];
        {
            let data: [&[u8]; 0] = [];
            let mut parity: [&mut [u8]; 1] = [&mut p];
            codec.encode(ParityLevel::Single, &data, &mut parity);
        }
        assert_eq!(p, [0u8; 4]);
    }
}
