/// Unique unordered body-index pairs `(i, j)` with `i < j < n`, row-major:
/// every pair for a given `i` comes before `i` is incremented.
pub fn combinations(n: usize) -> Vec<(usize, usize)> {
    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            pairs.push((i, j));
        }
    }
    pairs
}

/// Pair list tagged with the body count it was generated for, so a stale set
/// can be told apart from a current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairSet {
    n: usize,
    pairs: Vec<(usize, usize)>,
}

impl PairSet {
    pub fn new(n: usize) -> Self {
        Self { n, pairs: combinations(n) }
    }

    /// Rebuild from scratch for a new body count.
    pub fn regenerate(&mut self, n: usize) {
        self.n = n;
        self.pairs = combinations(n);
    }

    /// Body count this set was generated for.
    pub fn body_count(&self) -> usize { self.n }

    pub fn covers(&self, n: usize) -> bool { self.n == n }

    pub fn len(&self) -> usize { self.pairs.len() }
    pub fn is_empty(&self) -> bool { self.pairs.is_empty() }
    pub fn as_slice(&self) -> &[(usize, usize)] { &self.pairs }

    pub fn iter(&self) -> std::slice::Iter<'_, (usize, usize)> {
        self.pairs.iter()
    }
}
