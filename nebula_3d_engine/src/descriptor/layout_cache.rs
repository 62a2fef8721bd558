//! Descriptor set layout deduplication
//!
//! Materials with the same shader binding shape must share one layout
//! object so their pipeline layouts stay compatible. The cache normalizes
//! binding lists (sort by index), then looks up by structural hash plus
//! full field-by-field equality — a hash collision can never alias two
//! different layouts because the map compares keys on collision.

use rustc_hash::FxHashMap;

use crate::descriptor::device::DescriptorDevice;
use crate::descriptor::types::{DescriptorLayoutInfo, LayoutBinding};
use crate::error::Result;

/// Deduplicating cache of descriptor set layouts; one instance per device.
///
/// Cached layouts live until [`finalize`](Self::finalize); descriptor sets
/// only borrow them.
pub struct DescriptorLayoutCache<D: DescriptorDevice> {
    layouts: FxHashMap<DescriptorLayoutInfo, D::Layout>,
}

impl<D: DescriptorDevice> DescriptorLayoutCache<D> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            layouts: FxHashMap::default(),
        }
    }

    /// Return the layout for `bindings`, creating it on first use.
    ///
    /// Binding order is irrelevant: identical (index, type, count, stages)
    /// tuples in any order map to the same layout handle. A cache hit makes
    /// no device call.
    pub fn create_descriptor_layout(
        &mut self,
        device: &mut D,
        bindings: &[LayoutBinding],
    ) -> Result<D::Layout> {
        let info = DescriptorLayoutInfo::from_bindings(bindings.to_vec());

        if let Some(&layout) = self.layouts.get(&info) {
            return Ok(layout);
        }

        let layout = device.create_layout(&info)?;
        self.layouts.insert(info, layout);
        Ok(layout)
    }

    /// Destroy every cached layout and clear the cache
    pub fn finalize(&mut self, device: &mut D) {
        for (_, layout) in self.layouts.drain() {
            device.destroy_layout(layout);
        }
    }

    /// Number of distinct layouts in the cache
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    /// Whether the cache holds no layouts
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}

impl<D: DescriptorDevice> Default for DescriptorLayoutCache<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "layout_cache_tests.rs"]
mod tests;
