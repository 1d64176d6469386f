use proptest::prelude::*;
use tessera_control::{BlendMaps, ControlTextureBaker};

fn maps() -> impl Strategy<Value = BlendMaps> {
    (1usize..=12, 1usize..=12, 0usize..=6).prop_flat_map(|(w, h, n)| {
        // Weights drawn from a small set so exact zeros are common
        let cell = prop_oneof![Just(0.0f32), Just(0.25f32), Just(1.0f32), 0.0f32..1.0];
        proptest::collection::vec(proptest::collection::vec(cell, w * h), n).prop_map(move |layers| {
            let mut m = BlendMaps::new(w, h);
            for (i, weights) in layers.into_iter().enumerate() {
                m = m.with_layer(format!("layer{i}"), weights);
            }
            m
        })
    })
}

proptest! {
    // No texel is ever all-zero; all-zero sources become exactly (1,0,0,0)
    #[test]
    fn texels_never_all_zero(m in maps(), res in 1usize..=24) {
        let tex = ControlTextureBaker::new(res).bake(&m).unwrap().texture;
        prop_assert_eq!(tex.texels.len(), res * res);
        for y in 0..res {
            for x in 0..res {
                let t = tex.texel(x, y);
                prop_assert!(t.iter().any(|w| *w != 0.0));
                let sx = (x * m.width / res).min(m.width - 1);
                let sy = (y * m.height / res).min(m.height - 1);
                let src: Vec<f32> = (0..4).map(|c| m.weight(c, sx, sy)).collect();
                if src.iter().all(|w| *w == 0.0) {
                    prop_assert_eq!(t, [1.0, 0.0, 0.0, 0.0]);
                } else {
                    prop_assert_eq!(t.to_vec(), src);
                }
            }
        }
    }

    // Baking is a pure per-texel transform: same input, same output
    #[test]
    fn bake_is_deterministic(m in maps(), res in 1usize..=16) {
        let a = ControlTextureBaker::new(res).bake(&m).unwrap().texture;
        let b = ControlTextureBaker::new(res).bake(&m).unwrap().texture;
        prop_assert_eq!(a, b);
    }
}
