use proptest::prelude::*;
use tessera_field::ChunkPlanner;

fn res_and_count() -> impl Strategy<Value = (usize, usize)> {
    (2usize..=1025).prop_flat_map(|r| (Just(r), 1usize..=(r - 1).min(64)))
}

proptest! {
    // Every sample cell along an axis belongs to exactly one chunk
    #[test]
    fn axis_cells_covered_once((r, c) in res_and_count()) {
        let p = ChunkPlanner::new(r, c).unwrap();
        let mut hits = vec![0u8; r - 1];
        for i in 0..c {
            let (s, e) = p.axis_bounds(i);
            prop_assert!(s < e);
            for cell in s..e {
                hits[cell] += 1;
            }
        }
        prop_assert!(hits.iter().all(|h| *h == 1));
    }

    // Adjacent chunks agree on their shared boundary and the grid ends at R-1
    #[test]
    fn boundaries_are_shared((r, c) in res_and_count()) {
        let p = ChunkPlanner::new(r, c).unwrap();
        prop_assert_eq!(p.axis_bounds(0).0, 0);
        prop_assert_eq!(p.axis_bounds(c - 1).1, r - 1);
        for cy in 0..c {
            for cx in 0..c {
                let a = p.rect(cx, cy);
                if cx + 1 < c {
                    let b = p.rect(cx + 1, cy);
                    prop_assert_eq!(a.end_x(), b.start_x);
                    prop_assert_eq!(a.start_y, b.start_y);
                    prop_assert_eq!(a.height, b.height);
                }
                if cy + 1 < c {
                    let b = p.rect(cx, cy + 1);
                    prop_assert_eq!(a.end_y(), b.start_y);
                }
            }
        }
    }

    // Summed chunk areas equal the whole cell grid
    #[test]
    fn rect_areas_sum_to_domain((r, c) in res_and_count()) {
        let p = ChunkPlanner::new(r, c).unwrap();
        let area: usize = p.rects().map(|rc| rc.width * rc.height).sum();
        prop_assert_eq!(area, (r - 1) * (r - 1));
        prop_assert_eq!(p.rects().count(), c * c);
    }
}
