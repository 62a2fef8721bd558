//! Descriptor binding and layout description types
//!
//! [`DescriptorLayoutInfo`] is the canonical, order-independent description
//! of a descriptor set's bindings and the dedup key of the layout cache:
//! bindings are sorted by binding index on construction so structurally
//! identical sets hash and compare equal regardless of insertion order.

use std::hash::{Hash, Hasher};

bitflags::bitflags! {
    /// Shader stages a binding is visible to (bit values match Vulkan)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 0x1;
        const FRAGMENT = 0x10;
        const COMPUTE = 0x20;
        const ALL_GRAPHICS = 0x1F;
    }
}

/// Descriptor type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorType {
    /// Uniform buffer
    UniformBuffer,
    /// Uniform buffer bound with a per-draw dynamic offset
    UniformBufferDynamic,
    /// Storage buffer
    StorageBuffer,
    /// Combined image sampler
    CombinedImageSampler,
    /// Sampled image
    SampledImage,
    /// Sampler
    Sampler,
    /// Input attachment (subpass-local read)
    InputAttachment,
}

impl DescriptorType {
    /// Whether this type binds a buffer resource
    pub fn is_buffer(&self) -> bool {
        matches!(
            self,
            Self::UniformBuffer | Self::UniformBufferDynamic | Self::StorageBuffer
        )
    }

    /// Whether this type binds an image resource
    pub fn is_image(&self) -> bool {
        matches!(
            self,
            Self::CombinedImageSampler
                | Self::SampledImage
                | Self::Sampler
                | Self::InputAttachment
        )
    }

    /// Whether this type takes a dynamic offset at bind time
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::UniformBufferDynamic)
    }
}

/// One binding slot in a descriptor set layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutBinding {
    /// Binding index
    pub binding: u32,
    /// Descriptor type
    pub descriptor_type: DescriptorType,
    /// Descriptor count (array size; 1 for scalars)
    pub count: u32,
    /// Shader stages the binding is visible to
    pub stages: ShaderStageFlags,
}

impl LayoutBinding {
    /// Create a binding with count 1
    pub fn new(binding: u32, descriptor_type: DescriptorType, stages: ShaderStageFlags) -> Self {
        Self {
            binding,
            descriptor_type,
            count: 1,
            stages,
        }
    }

    /// Uniform buffer binding
    pub fn uniform_buffer(binding: u32, stages: ShaderStageFlags) -> Self {
        Self::new(binding, DescriptorType::UniformBuffer, stages)
    }

    /// Dynamic uniform buffer binding
    pub fn uniform_buffer_dynamic(binding: u32, stages: ShaderStageFlags) -> Self {
        Self::new(binding, DescriptorType::UniformBufferDynamic, stages)
    }

    /// Storage buffer binding
    pub fn storage_buffer(binding: u32, stages: ShaderStageFlags) -> Self {
        Self::new(binding, DescriptorType::StorageBuffer, stages)
    }

    /// Combined image sampler binding
    pub fn combined_image_sampler(binding: u32, stages: ShaderStageFlags) -> Self {
        Self::new(binding, DescriptorType::CombinedImageSampler, stages)
    }

    /// Input attachment binding
    pub fn input_attachment(binding: u32, stages: ShaderStageFlags) -> Self {
        Self::new(binding, DescriptorType::InputAttachment, stages)
    }

    /// Set the descriptor count (array size)
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }
}

/// Canonical, order-independent layout description used as the cache key.
///
/// Construction sorts the bindings by binding index; equality and hashing
/// run field-by-field over the sorted list, so a hash collision between two
/// different layouts can never produce a wrong cache hit.
#[derive(Debug, Clone)]
pub struct DescriptorLayoutInfo {
    bindings: Vec<LayoutBinding>,
}

impl DescriptorLayoutInfo {
    /// Normalize an unordered binding list into canonical form
    pub fn from_bindings(mut bindings: Vec<LayoutBinding>) -> Self {
        bindings.sort_by_key(|b| b.binding);
        Self { bindings }
    }

    /// Bindings in canonical (index-sorted) order
    pub fn bindings(&self) -> &[LayoutBinding] {
        &self.bindings
    }
}

impl PartialEq for DescriptorLayoutInfo {
    fn eq(&self, other: &Self) -> bool {
        if self.bindings.len() != other.bindings.len() {
            return false;
        }
        // Field-by-field over the sorted lists. Each side's field is compared
        // against the OTHER side's field; a structural hash collision alone
        // must never count as equality.
        self.bindings.iter().zip(other.bindings.iter()).all(|(lhs, rhs)| {
            lhs.binding == rhs.binding
                && lhs.descriptor_type == rhs.descriptor_type
                && lhs.count == rhs.count
                && lhs.stages == rhs.stages
        })
    }
}

impl Eq for DescriptorLayoutInfo {}

impl Hash for DescriptorLayoutInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bindings.len().hash(state);
        for b in &self.bindings {
            b.binding.hash(state);
            b.descriptor_type.hash(state);
            b.count.hash(state);
            b.stages.hash(state);
        }
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
