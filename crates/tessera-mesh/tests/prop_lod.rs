use proptest::prelude::*;
use tessera_mesh::LodResolutionPlanner;

proptest! {
    // Even bases of at least 4: non-increasing, all even, floored at 4, LOD0 untouched
    #[test]
    fn even_base_chain_is_monotone_and_even(half in 2usize..=512, count in 1usize..=8, strength in 0.1f32..3.0) {
        let base = half * 2;
        let p = LodResolutionPlanner::new(base, count, strength).unwrap();
        let r = p.resolutions();
        prop_assert_eq!(r.len(), count);
        prop_assert_eq!(r[0], base);
        for w in r.windows(2) {
            prop_assert!(w[1] <= w[0]);
        }
        for res in &r {
            prop_assert!(*res >= 4);
            prop_assert_eq!(res % 2, 0);
        }
    }

    // Any base: levels never grow, levels past LOD0 are even once the base
    // reaches the floor, and `resolution(k)` agrees with the list
    #[test]
    fn any_base_never_grows(base in 1usize..=1024, count in 1usize..=8, strength in 0.01f32..4.0) {
        let p = LodResolutionPlanner::new(base, count, strength).unwrap();
        let r = p.resolutions();
        for w in r.windows(2) {
            prop_assert!(w[1] <= w[0]);
        }
        if base >= 4 {
            for res in &r[1..] {
                prop_assert_eq!(res % 2, 0);
                prop_assert!(*res >= 4);
            }
        }
        for (k, res) in r.iter().enumerate() {
            prop_assert_eq!(p.resolution(k), *res);
        }
    }
}
