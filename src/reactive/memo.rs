//! Revision-keyed memo.
//!
//! A [`Memo`] caches one derived value together with the store revision it
//! was computed from. Reading it at the same revision returns the cached
//! value; any other revision recomputes.

/// Cached derived computation keyed by store revision.
#[derive(Debug, Clone)]
pub struct Memo<T> {
    cached: Option<(u64, T)>,
    computations: usize,
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self {
            cached: None,
            computations: 0,
        }
    }
}

impl<T> Memo<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The value for `revision`, computing it with `compute` if the cache
    /// holds another revision (or nothing).
    pub fn get_or_compute(&mut self, revision: u64, compute: impl FnOnce() -> T) -> &T {
        let entry = match self.cached.take() {
            Some((cached, value)) if cached == revision => (cached, value),
            _ => {
                self.computations += 1;
                (revision, compute())
            }
        };
        &self.cached.insert(entry).1
    }

    /// The cached value, if it was computed for `revision`.
    pub fn peek(&self, revision: u64) -> Option<&T> {
        match &self.cached {
            Some((cached, value)) if *cached == revision => Some(value),
            _ => None,
        }
    }

    /// Drop the cached value.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// How many times the computation has run.
    pub fn computations(&self) -> usize {
        self.computations
    }
}
