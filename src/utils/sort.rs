/// Sorts a sparse row by column index (SoA layout: `cols` / `vals`).
/// - Sorts by cols ascending
/// - Reorders vals accordingly
/// - Stable, so duplicated columns keep their insertion order
///
/// Small rows use insertion sort; larger rows use a 4-pass LSD radix sort
/// over the u32 column keys.
#[inline]
pub fn sort_by_column<N: Copy>(cols: &mut [u32], vals: &mut [N]) {
    assert_eq!(cols.len(), vals.len());
    let n = cols.len();
    if n <= 1 {
        return;
    }
    if n <= 32 {
        insertion_sort(cols, vals);
        return;
    }
    if cols.windows(2).all(|w| w[0] <= w[1]) {
        return;
    }

    let mut cols_tmp = vec![0u32; n];
    let mut vals_tmp: Vec<N> = vals.to_vec();

    // After an even number of passes the data is back in the caller's slices.
    for (pass, shift) in [0u32, 8, 16, 24].into_iter().enumerate() {
        if pass % 2 == 0 {
            radix_pass(cols, vals, &mut cols_tmp, &mut vals_tmp, shift);
        } else {
            radix_pass(&cols_tmp, &vals_tmp, cols, vals, shift);
        }
    }
}

#[inline]
fn radix_pass<N: Copy>(src_c: &[u32], src_v: &[N], dst_c: &mut [u32], dst_v: &mut [N], shift: u32) {
    let mut count = [0usize; 256];
    for &k in src_c {
        count[((k >> shift) & 0xFF) as usize] += 1;
    }
    let mut sum = 0usize;
    for c in count.iter_mut() {
        let tmp = *c;
        *c = sum;
        sum += tmp;
    }
    for (&k, &v) in src_c.iter().zip(src_v) {
        let bucket = ((k >> shift) & 0xFF) as usize;
        let pos = count[bucket];
        dst_c[pos] = k;
        dst_v[pos] = v;
        count[bucket] += 1;
    }
}

#[inline]
fn insertion_sort<N: Copy>(cols: &mut [u32], vals: &mut [N]) {
    for i in 1..cols.len() {
        let key = cols[i];
        let val = vals[i];
        let mut j = i;
        while j > 0 && cols[j - 1] > key {
            cols[j] = cols[j - 1];
            vals[j] = vals[j - 1];
            j -= 1;
        }
        cols[j] = key;
        vals[j] = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// sort by key, ties keep original position
    fn baseline(cols: &[u32], vals: &[u16]) -> (Vec<u32>, Vec<u16>) {
        let mut pairs: Vec<(u32, usize, u16)> = cols
            .iter()
            .copied()
            .enumerate()
            .map(|(i, k)| (k, i, vals[i]))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        (pairs.iter().map(|p| p.0).collect(), pairs.iter().map(|p| p.2).collect())
    }

    /// tiny deterministic PRNG (xorshift32)
    struct Rng(u32);
    impl Rng {
        fn next_u32(&mut self) -> u32 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            self.0 = x;
            x
        }
    }

    #[test]
    fn empty_and_single_rows_are_untouched() {
        let mut cols: Vec<u32> = vec![];
        let mut vals: Vec<f64> = vec![];
        sort_by_column(&mut cols, &mut vals);
        assert!(cols.is_empty());

        let mut cols = vec![7u32];
        let mut vals = vec![0.5f64];
        sort_by_column(&mut cols, &mut vals);
        assert_eq!(cols, vec![7]);
        assert_eq!(vals, vec![0.5]);
    }

    #[test]
    fn small_rows_use_insertion_sort() {
        let mut cols = vec![5u32, 1, 3, 1];
        let mut vals = vec![50u16, 10, 30, 11];
        sort_by_column(&mut cols, &mut vals);
        assert_eq!(cols, vec![1, 1, 3, 5]);
        assert_eq!(vals, vec![10, 11, 30, 50]);
    }

    #[test]
    fn large_rows_match_stable_baseline() {
        let mut rng = Rng(0x9E37_79B9);
        for &n in &[33usize, 100, 1000, 5000] {
            let cols: Vec<u32> = (0..n).map(|_| rng.next_u32() % 20_000).collect();
            let vals: Vec<u16> = (0..n).map(|i| i as u16).collect();
            let (want_c, want_v) = baseline(&cols, &vals);

            let mut got_c = cols.clone();
            let mut got_v = vals.clone();
            sort_by_column(&mut got_c, &mut got_v);
            assert_eq!(got_c, want_c, "cols differ for n={n}");
            assert_eq!(got_v, want_v, "vals differ for n={n}");
        }
    }

    #[test]
    fn full_u32_range_keys_sort() {
        let mut rng = Rng(12345);
        let mut cols: Vec<u32> = (0..257).map(|_| rng.next_u32()).collect();
        cols.push(u32::MAX);
        cols.push(0);
        let mut vals: Vec<u16> = (0..cols.len()).map(|i| i as u16).collect();
        let (want_c, want_v) = baseline(&cols, &vals);
        sort_by_column(&mut cols, &mut vals);
        assert_eq!(cols, want_c);
        assert_eq!(vals, want_v);
    }
}
