use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use gramdex::codec::{self, Layout, PositionReader};

const LAYOUTS: [Layout; 4] = [
    Layout::Fixed(codec::MIN_BLOCK_SIZE),
    Layout::Fixed(codec::BLOCK_SIZE),
    Layout::Fixed(64),
    Layout::Unbounded,
];

fn random_positions(rng: &mut StdRng, count: usize, max_gap: u16) -> Vec<u16> {
    let mut values = Vec::with_capacity(count);
    let mut next = rng.random_range(0..=max_gap) as u32;
    while values.len() < count && next <= u16::MAX as u32 {
        values.push(next as u16);
        next += rng.random_range(1..=max_gap) as u32;
    }
    values
}

fn brute_range(values: &[u16], lo: u16, hi: u16) -> bool {
    values.iter().any(|&v| lo <= v && v <= hi)
}

#[test]
fn test_membership_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(0x6772_616d);
    for max_gap in [1u16, 7, 40, 900, 20_000, 40_000] {
        let values = random_positions(&mut rng, 300, max_gap);
        for layout in LAYOUTS {
            let data = codec::compress_with(layout, &values);
            assert_eq!(codec::decode_with(layout, &data).unwrap(), values);
            assert_eq!(codec::len_with(layout, &data), values.len());

            for _ in 0..200 {
                let lo = rng.random_range(0..=u16::MAX);
                let hi = lo.saturating_add(rng.random_range(0..8));
                assert_eq!(
                    codec::range_contains_with(layout, &data, lo, hi),
                    brute_range(&values, lo, hi),
                    "{layout:?} gap {max_gap} [{lo}, {hi}]"
                );
            }
        }
    }
}

#[test]
fn test_forward_to_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(42);
    for max_gap in [3u16, 300, 33_000] {
        let values = random_positions(&mut rng, 500, max_gap);
        for layout in LAYOUTS {
            let data = codec::compress_with(layout, &values);
            let mut reader = PositionReader::with_layout(&data, layout).with_fast_steps(2);
            let mut target = 0u16;
            loop {
                let expected = values.iter().copied().find(|&v| v >= target);
                assert_eq!(reader.forward_to(target), expected, "{layout:?} target {target}");
                match target.checked_add(rng.random_range(1..=max_gap.saturating_mul(2))) {
                    Some(next) => target = next,
                    None => break,
                }
            }
        }
    }
}

#[test]
fn test_fixed_blocks_are_stride_aligned() {
    let mut rng = StdRng::seed_from_u64(7);
    let values = random_positions(&mut rng, 1000, 50);
    let data = codec::compress(&values);
    // Only the last block may be short.
    assert!(data.len() > codec::BLOCK_SIZE);
    let full = data.len() / codec::BLOCK_SIZE;
    let mut decoded = Vec::new();
    for block in 0..full {
        let chunk = &data[block * codec::BLOCK_SIZE..(block + 1) * codec::BLOCK_SIZE];
        let anchor = u16::from_be_bytes([chunk[0], chunk[1]]);
        assert!(values.contains(&anchor));
        decoded.push(anchor);
    }
    assert!(decoded.windows(2).all(|w| w[0] < w[1]));
}
