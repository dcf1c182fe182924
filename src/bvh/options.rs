/// Parameters of a [`Bvh`](super::Bvh) build.
///
/// # Examples
/// ```
/// use linear_bvh::bvh::BuildOptions;
///
/// let options = BuildOptions::default().max_leaf_primitives(4);
/// assert_eq!(options.leaf_limit(), 4);
///
/// // A leaf always holds at least one primitive.
/// assert_eq!(BuildOptions::default().max_leaf_primitives(0).leaf_limit(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuildOptions {
    /// Largest number of primitives a leaf is created for once splitting stops being forced.
    /// Values of zero are treated as one.
    pub max_leaf_primitives: u8,

    /// Smallest number of primitives for which [`Bvh::build_par`](super::Bvh::build_par) builds
    /// the two halves of a split on separate threads. Smaller ranges are built sequentially.
    pub parallel_threshold: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            max_leaf_primitives: 1,
            parallel_threshold: 4096,
        }
    }
}

impl BuildOptions {
    /// Sets [`BuildOptions::max_leaf_primitives`].
    pub fn max_leaf_primitives(mut self, max_leaf_primitives: u8) -> Self {
        self.max_leaf_primitives = max_leaf_primitives;
        self
    }

    /// Sets [`BuildOptions::parallel_threshold`].
    pub fn parallel_threshold(mut self, parallel_threshold: usize) -> Self {
        self.parallel_threshold = parallel_threshold;
        self
    }

    /// The effective leaf size limit, at least one.
    pub fn leaf_limit(&self) -> usize {
        usize::from(self.max_leaf_primitives.max(1))
    }
}
