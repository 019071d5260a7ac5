//! Property-based tests for the emotion vector model.
//!
//! Uses proptest to verify the regime invariants for ALL inputs, not just
//! hand-picked examples.

use aura_core::emotion::{EmotionSpace, EmotionVector, Regime};
use proptest::prelude::*;

fn bipolar() -> EmotionSpace {
    EmotionSpace::bipolar()
}

fn simplex() -> EmotionSpace {
    EmotionSpace::simplex()
}

proptest! {
    /// **Bounded invariant**: after clamp, every dimension is in [min, max].
    #[test]
    fn bounded_clamp_stays_in_range(values in prop::collection::vec(any::<i32>(), 4)) {
        let space = bipolar();
        let v = EmotionVector::from_values(values, &space).unwrap();
        for &x in v.values() {
            prop_assert!((-100..=100).contains(&x), "out of range: {}", x);
        }
    }

    /// **Simplex invariant**: after normalisation the sum is exactly the
    /// total (no off-by-one from rounding) and every value is non-negative.
    #[test]
    fn simplex_clamp_sums_exactly(values in prop::collection::vec(-500i32..=500, 6)) {
        let space = simplex();
        let v = EmotionVector::from_values(values, &space).unwrap();
        prop_assert_eq!(v.values().iter().sum::<i32>(), 100);
        prop_assert!(v.values().iter().all(|&x| x >= 0));
    }

    /// **Round-trip**: formatting a valid vector and parsing it back
    /// yields the identical vector.
    #[test]
    fn parse_format_roundtrip(values in prop::collection::vec(-100i32..=100, 4)) {
        let space = bipolar();
        let v = EmotionVector::from_values(values, &space).unwrap();
        let parsed = EmotionVector::parse(&v.format(), &space).unwrap();
        prop_assert_eq!(parsed, v);
    }

    /// **Arity rejection**: any token count other than the configured
    /// dimension count is a parse error, never a partial vector.
    #[test]
    fn parse_rejects_wrong_arity(n in 1usize..10, value in -100i32..=100) {
        prop_assume!(n != 4);
        let space = bipolar();
        let text = vec![value.to_string(); n].join(",");
        prop_assert!(EmotionVector::parse(&text, &space).is_err());
    }

    /// **Deltas preserve the regime**: applying any signed delta list
    /// yields a vector that still satisfies the active invariant.
    #[test]
    fn apply_deltas_preserves_bounded(
        values in prop::collection::vec(-100i32..=100, 4),
        deltas in prop::collection::vec(-200i32..=200, 4),
    ) {
        let space = bipolar();
        let v = EmotionVector::from_values(values, &space).unwrap();
        let out = v.apply_deltas(&deltas, &space);
        prop_assert!(space.regime.holds_for(out.values()));
    }

    #[test]
    fn apply_deltas_preserves_simplex(
        values in prop::collection::vec(0i32..=100, 6),
        deltas in prop::collection::vec(-50i32..=50, 6),
    ) {
        let space = simplex();
        let v = EmotionVector::from_values(values, &space).unwrap();
        let out = v.apply_deltas(&deltas, &space);
        prop_assert!(space.regime.holds_for(out.values()),
            "simplex invariant broken: {:?}", out.values());
    }

    /// **Float clamp**: the drift engine's float-domain clamp keeps
    /// bounded values in range for any finite input.
    #[test]
    fn clamp_floats_bounded_in_range(values in prop::collection::vec(-1e6f64..=1e6, 4)) {
        let regime = Regime::Bounded { min: -100, max: 100 };
        let mut vals = values;
        regime.clamp_floats(&mut vals);
        for v in vals {
            prop_assert!((-100.0..=100.0).contains(&v));
        }
    }
}
