/// Comb sort of `order` by `dist`, **descending** (farthest first), so the
/// draw step can paint sprites back-to-front.
///
/// `order` and `dist` are permuted together and must have the same length.
pub fn comb_sort(order: &mut [usize], dist: &mut [f64]) {
    let n = order.len().min(dist.len());
    let mut gap = n;
    let mut swapped = false;

    while gap > 1 || swapped {
        gap = gap * 10 / 13;
        if gap == 9 || gap == 10 {
            gap = 11;
        }
        gap = gap.max(1);

        swapped = false;
        for i in 0..n.saturating_sub(gap) {
            let j = i + gap;
            if dist[i] < dist[j] {
                dist.swap(i, j);
                order.swap(i, j);
                swapped = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    #[test]
    fn sorts_far_to_near() {
        let mut order = vec![0, 1, 2, 3];
        let mut dist = vec![1.0, 4.0, 2.0, 3.0];
        comb_sort(&mut order, &mut dist);
        assert_eq!(order, [1, 3, 2, 0]);
        assert_eq!(dist, [4.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn empty_and_single() {
        let (mut o, mut d) = (vec![], vec![]);
        comb_sort(&mut o, &mut d);
        let (mut o, mut d) = (vec![0], vec![5.0]);
        comb_sort(&mut o, &mut d);
        assert_eq!(o, [0]);
    }

    #[test]
    fn matches_full_sort_on_random_input() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        for len in [2, 9, 10, 11, 12, 57, 300] {
            let mut dist: Vec<f64> = (0..len).map(|_| rng.gen_range(0.0..100.0)).collect();
            let mut order: Vec<usize> = (0..len).collect();
            let original = dist.clone();

            comb_sort(&mut order, &mut dist);

            let mut expected = original.clone();
            expected.sort_by(|a, b| b.total_cmp(a));
            assert_eq!(dist, expected);
            // the permutation must carry the distances along
            for (k, &i) in order.iter().enumerate() {
                assert_eq!(original[i], dist[k]);
            }
        }
    }
}
