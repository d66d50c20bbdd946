//! Adaptive run-merging sort driven by a strict "less than" predicate
//!
//! Natural runs are detected (strictly descending ones reversed in place),
//! short runs are extended by binary insertion, and pending runs are merged
//! on the powersort node-power rule with galloping merges. The comparison
//! sequence is fully determined by the input, so a predicate that is not a
//! strict weak ordering still yields one reproducible permutation instead of
//! a panic. Sorting is stable for consistent predicates.

/// Runs shorter than this are sorted by binary insertion alone
const MIN_MERGE: usize = 64;

/// Initial number of consecutive wins before a merge starts galloping
const MIN_GALLOP: usize = 7;

#[derive(Debug, Clone, Copy)]
struct Run {
    base: usize,
    len: usize,
    power: u32,
}

/// How a merge finished, deciding which leftover gets copied back
enum Tail {
    /// Whatever remains in scratch goes into the gap
    Flush,
    /// One scratch element is left and belongs at the far end of the gap
    Last,
}

/// Sort `items` with `less(a, b)` meaning "a sorts strictly before b"
pub fn sort_by_less<T, F>(items: &mut [T], less: F)
where
    T: Copy,
    F: FnMut(&T, &T) -> bool,
{
    let n = items.len();
    if n < 2 {
        return;
    }

    let min_run = min_run_length(n);
    let mut state = MergeState {
        keys: items,
        less,
        pending: Vec::new(),
        scratch: Vec::new(),
        min_gallop: MIN_GALLOP,
    };

    let mut lo = 0;
    while lo < n {
        let remaining = n - lo;
        let (mut run, descending) = count_run(&state.keys[lo..], &mut state.less);
        if descending {
            state.keys[lo..lo + run].reverse();
        }
        if run < min_run {
            let force = remaining.min(min_run);
            binary_insertion_sort(&mut state.keys[lo..lo + force], run, &mut state.less);
            run = force;
        }
        state.found_new_run(run);
        state.pending.push(Run {
            base: lo,
            len: run,
            power: 0,
        });
        lo += run;
    }

    state.force_collapse();
}

fn min_run_length(mut n: usize) -> usize {
    let mut r = 0;
    while n >= MIN_MERGE {
        r |= n & 1;
        n >>= 1;
    }
    n + r
}

/// Length of the natural run at the start of `items`, and whether it is
/// strictly descending
fn count_run<T, F>(items: &[T], less: &mut F) -> (usize, bool)
where
    F: FnMut(&T, &T) -> bool,
{
    if items.len() == 1 {
        return (1, false);
    }

    let mut n = 2;
    if less(&items[1], &items[0]) {
        while n < items.len() && less(&items[n], &items[n - 1]) {
            n += 1;
        }
        (n, true)
    } else {
        while n < items.len() && !less(&items[n], &items[n - 1]) {
            n += 1;
        }
        (n, false)
    }
}

/// Insert `items[sorted..]` one by one into the sorted prefix
fn binary_insertion_sort<T, F>(items: &mut [T], sorted: usize, less: &mut F)
where
    T: Copy,
    F: FnMut(&T, &T) -> bool,
{
    for i in sorted.max(1)..items.len() {
        let pivot = items[i];
        let (mut l, mut r) = (0, i);
        while l < r {
            let p = l + ((r - l) >> 1);
            if less(&pivot, &items[p]) {
                r = p;
            } else {
                l = p + 1;
            }
        }
        items[l..=i].rotate_right(1);
    }
}

/// Depth of the node between two adjacent runs in the implied merge tree
fn node_power(s1: usize, n1: usize, n2: usize, n: usize) -> u32 {
    let mut a = 2 * s1 + n1;
    let mut b = a + n1 + n2;
    let mut power = 0;
    loop {
        power += 1;
        if a >= n {
            a -= n;
            b -= n;
        } else if b >= n {
            break;
        }
        a <<= 1;
        b <<= 1;
    }
    power
}

/// Leftmost position in `run` where `key` could go, searching out from `hint`
fn gallop_left<T, F>(key: T, run: &[T], hint: usize, less: &mut F) -> usize
where
    T: Copy,
    F: FnMut(&T, &T) -> bool,
{
    let mut last = 0;
    let mut ofs = 1;
    let (mut lo, mut hi);

    if less(&run[hint], &key) {
        let max = run.len() - hint;
        while ofs < max && less(&run[hint + ofs], &key) {
            last = ofs;
            ofs = (ofs << 1) + 1;
        }
        ofs = ofs.min(max);
        lo = hint + last + 1;
        hi = hint + ofs;
    } else {
        let max = hint + 1;
        while ofs < max && !less(&run[hint - ofs], &key) {
            last = ofs;
            ofs = (ofs << 1) + 1;
        }
        ofs = ofs.min(max);
        lo = hint + 1 - ofs;
        hi = hint - last;
    }

    while lo < hi {
        let m = lo + ((hi - lo) >> 1);
        if less(&run[m], &key) {
            lo = m + 1;
        } else {
            hi = m;
        }
    }
    hi
}

/// Rightmost position in `run` where `key` could go, searching out from `hint`
fn gallop_right<T, F>(key: T, run: &[T], hint: usize, less: &mut F) -> usize
where
    T: Copy,
    F: FnMut(&T, &T) -> bool,
{
    let mut last = 0;
    let mut ofs = 1;
    let (mut lo, mut hi);

    if less(&key, &run[hint]) {
        let max = hint + 1;
        while ofs < max && less(&key, &run[hint - ofs]) {
            last = ofs;
            ofs = (ofs << 1) + 1;
        }
        ofs = ofs.min(max);
        lo = hint + 1 - ofs;
        hi = hint - last;
    } else {
        let max = run.len() - hint;
        while ofs < max && !less(&key, &run[hint + ofs]) {
            last = ofs;
            ofs = (ofs << 1) + 1;
        }
        ofs = ofs.min(max);
        lo = hint + last + 1;
        hi = hint + ofs;
    }

    while lo < hi {
        let m = lo + ((hi - lo) >> 1);
        if less(&key, &run[m]) {
            hi = m;
        } else {
            lo = m + 1;
        }
    }
    hi
}

struct MergeState<'a, T, F> {
    keys: &'a mut [T],
    less: F,
    pending: Vec<Run>,
    scratch: Vec<T>,
    min_gallop: usize,
}

impl<T, F> MergeState<'_, T, F>
where
    T: Copy,
    F: FnMut(&T, &T) -> bool,
{
    /// Merge pending runs that sit deeper in the merge tree than the node
    /// joining the top run with a new run of `len` elements
    fn found_new_run(&mut self, len: usize) {
        let Some(top) = self.pending.last().copied() else {
            return;
        };
        let power = node_power(top.base, top.len, len, self.keys.len());
        while self.pending.len() > 1 && self.pending[self.pending.len() - 2].power > power {
            self.merge_at(self.pending.len() - 2);
        }
        if let Some(top) = self.pending.last_mut() {
            top.power = power;
        }
    }

    fn force_collapse(&mut self) {
        while self.pending.len() > 1 {
            let mut i = self.pending.len() - 2;
            if i > 0 && self.pending[i - 1].len < self.pending[i + 1].len {
                i -= 1;
            }
            self.merge_at(i);
        }
    }

    /// Merge pending runs `i` and `i + 1`
    fn merge_at(&mut self, i: usize) {
        let Run {
            base: mut base_a,
            len: mut na,
            ..
        } = self.pending[i];
        let Run {
            base: base_b,
            len: nb,
            ..
        } = self.pending[i + 1];
        self.pending[i].len = na + nb;
        self.pending.remove(i + 1);

        // Leading elements of a already in place
        let k = gallop_right(
            self.keys[base_b],
            &self.keys[base_a..base_a + na],
            0,
            &mut self.less,
        );
        base_a += k;
        na -= k;
        if na == 0 {
            return;
        }

        // Trailing elements of b already in place
        let nb = gallop_left(
            self.keys[base_a + na - 1],
            &self.keys[base_b..base_b + nb],
            nb - 1,
            &mut self.less,
        );
        if nb == 0 {
            return;
        }

        if na <= nb {
            self.merge_lo(base_a, na, nb);
        } else {
            self.merge_hi(base_a, na, nb);
        }
    }

    /// Merge front to back with run a moved to scratch; needs `na <= nb`
    fn merge_lo(&mut self, base_a: usize, mut na: usize, mut nb: usize) {
        self.scratch.clear();
        self.scratch
            .extend_from_slice(&self.keys[base_a..base_a + na]);
        let mut dest = base_a;
        let mut a = 0;
        let mut b = base_a + na;

        self.keys[dest] = self.keys[b];
        dest += 1;
        b += 1;
        nb -= 1;

        let tail = 'merge: {
            if nb == 0 {
                break 'merge Tail::Flush;
            }
            if na == 1 {
                break 'merge Tail::Last;
            }

            let mut min_gallop = self.min_gallop;
            loop {
                let mut a_wins = 0;
                let mut b_wins = 0;

                loop {
                    if (self.less)(&self.keys[b], &self.scratch[a]) {
                        self.keys[dest] = self.keys[b];
                        dest += 1;
                        b += 1;
                        nb -= 1;
                        b_wins += 1;
                        a_wins = 0;
                        if nb == 0 {
                            break 'merge Tail::Flush;
                        }
                        if b_wins >= min_gallop {
                            break;
                        }
                    } else {
                        self.keys[dest] = self.scratch[a];
                        dest += 1;
                        a += 1;
                        na -= 1;
                        a_wins += 1;
                        b_wins = 0;
                        if na == 1 {
                            break 'merge Tail::Last;
                        }
                        if a_wins >= min_gallop {
                            break;
                        }
                    }
                }

                min_gallop += 1;
                loop {
                    min_gallop -= usize::from(min_gallop > 1);
                    self.min_gallop = min_gallop;

                    let k = gallop_right(
                        self.keys[b],
                        &self.scratch[a..a + na],
                        0,
                        &mut self.less,
                    );
                    a_wins = k;
                    if k > 0 {
                        self.keys[dest..dest + k].copy_from_slice(&self.scratch[a..a + k]);
                        dest += k;
                        a += k;
                        na -= k;
                        if na == 1 {
                            break 'merge Tail::Last;
                        }
                        if na == 0 {
                            break 'merge Tail::Flush;
                        }
                    }
                    self.keys[dest] = self.keys[b];
                    dest += 1;
                    b += 1;
                    nb -= 1;
                    if nb == 0 {
                        break 'merge Tail::Flush;
                    }

                    let k = gallop_left(
                        self.scratch[a],
                        &self.keys[b..b + nb],
                        0,
                        &mut self.less,
                    );
                    b_wins = k;
                    if k > 0 {
                        self.keys.copy_within(b..b + k, dest);
                        dest += k;
                        b += k;
                        nb -= k;
                        if nb == 0 {
                            break 'merge Tail::Flush;
                        }
                    }
                    self.keys[dest] = self.scratch[a];
                    dest += 1;
                    a += 1;
                    na -= 1;
                    if na == 1 {
                        break 'merge Tail::Last;
                    }

                    if a_wins < MIN_GALLOP && b_wins < MIN_GALLOP {
                        break;
                    }
                }
                min_gallop += 1;
                self.min_gallop = min_gallop;
            }
        };

        match tail {
            Tail::Flush => {
                self.keys[dest..dest + na].copy_from_slice(&self.scratch[a..a + na]);
            }
            Tail::Last => {
                self.keys.copy_within(b..b + nb, dest);
                self.keys[dest + nb] = self.scratch[a];
            }
        }
    }

    /// Merge back to front with run b moved to scratch; needs `na >= nb`
    ///
    /// The next free slot is always `base_a + na + nb - 1`.
    fn merge_hi(&mut self, base_a: usize, mut na: usize, mut nb: usize) {
        let base_b = base_a + na;
        self.scratch.clear();
        self.scratch
            .extend_from_slice(&self.keys[base_b..base_b + nb]);

        self.keys[base_a + na + nb - 1] = self.keys[base_a + na - 1];
        na -= 1;

        let tail = 'merge: {
            if na == 0 {
                break 'merge Tail::Flush;
            }
            if nb == 1 {
                break 'merge Tail::Last;
            }

            let mut min_gallop = self.min_gallop;
            loop {
                let mut a_wins = 0;
                let mut b_wins = 0;

                loop {
                    let last_a = base_a + na - 1;
                    if (self.less)(&self.scratch[nb - 1], &self.keys[last_a]) {
                        self.keys[base_a + na + nb - 1] = self.keys[last_a];
                        na -= 1;
                        a_wins += 1;
                        b_wins = 0;
                        if na == 0 {
                            break 'merge Tail::Flush;
                        }
                        if a_wins >= min_gallop {
                            break;
                        }
                    } else {
                        self.keys[base_a + na + nb - 1] = self.scratch[nb - 1];
                        nb -= 1;
                        b_wins += 1;
                        a_wins = 0;
                        if nb == 1 {
                            break 'merge Tail::Last;
                        }
                        if b_wins >= min_gallop {
                            break;
                        }
                    }
                }

                min_gallop += 1;
                loop {
                    min_gallop -= usize::from(min_gallop > 1);
                    self.min_gallop = min_gallop;

                    let k = na
                        - gallop_right(
                            self.scratch[nb - 1],
                            &self.keys[base_a..base_a + na],
                            na - 1,
                            &mut self.less,
                        );
                    a_wins = k;
                    if k > 0 {
                        self.keys
                            .copy_within(base_a + na - k..base_a + na, base_a + na + nb - k);
                        na -= k;
                        if na == 0 {
                            break 'merge Tail::Flush;
                        }
                    }
                    self.keys[base_a + na + nb - 1] = self.scratch[nb - 1];
                    nb -= 1;
                    if nb == 1 {
                        break 'merge Tail::Last;
                    }

                    let k = nb
                        - gallop_left(
                            self.keys[base_a + na - 1],
                            &self.scratch[..nb],
                            nb - 1,
                            &mut self.less,
                        );
                    b_wins = k;
                    if k > 0 {
                        let end = base_a + na + nb;
                        self.keys[end - k..end].copy_from_slice(&self.scratch[nb - k..nb]);
                        nb -= k;
                        if nb == 1 {
                            break 'merge Tail::Last;
                        }
                        if nb == 0 {
                            break 'merge Tail::Flush;
                        }
                    }
                    self.keys[base_a + na + nb - 1] = self.keys[base_a + na - 1];
                    na -= 1;
                    if na == 0 {
                        break 'merge Tail::Flush;
                    }

                    if a_wins < MIN_GALLOP && b_wins < MIN_GALLOP {
                        break;
                    }
                }
                min_gallop += 1;
                self.min_gallop = min_gallop;
            }
        };

        match tail {
            Tail::Flush => {
                self.keys[base_a + na..base_a + na + nb].copy_from_slice(&self.scratch[..nb]);
            }
            Tail::Last => {
                self.keys.copy_within(base_a..base_a + na, base_a + 1);
                self.keys[base_a] = self.scratch[0];
            }
        }
    }
}
