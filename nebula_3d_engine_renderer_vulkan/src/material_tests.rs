//! Unit tests for material.rs (registry and kind declarations, no GPU)

use super::*;
use nebula_3d_engine::descriptor::DescriptorType;

// ============================================================================
// Registry tests
// ============================================================================

#[test]
fn test_builtin_kinds_are_registered() {
    let registry = MaterialRegistry::with_builtin_kinds();
    assert!(registry.get("unlit").is_some());
    assert!(registry.get("textured_lit").is_some());
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_unknown_kind_is_none() {
    let registry = MaterialRegistry::with_builtin_kinds();
    assert!(registry.get("does_not_exist").is_none());
}

#[test]
fn test_register_custom_kind() {
    struct WireframeKind;
    impl MaterialKind for WireframeKind {
        fn type_name(&self) -> &'static str {
            "wireframe"
        }
        fn material_bindings(&self) -> Vec<LayoutBinding> {
            Vec::new()
        }
        fn pipeline_spec(&self) -> PipelineSpec {
            PipelineSpec {
                shader: "wireframe".to_string(),
                cull_mode: vk::CullModeFlags::NONE,
                ..PipelineSpec::default()
            }
        }
    }

    let mut registry = MaterialRegistry::with_builtin_kinds();
    registry.register(Box::new(WireframeKind));

    let kind = registry.get("wireframe").unwrap();
    assert_eq!(kind.pipeline_spec().cull_mode, vk::CullModeFlags::NONE);
}

#[test]
fn test_register_replaces_same_name() {
    struct CustomUnlit;
    impl MaterialKind for CustomUnlit {
        fn type_name(&self) -> &'static str {
            "unlit"
        }
        fn material_bindings(&self) -> Vec<LayoutBinding> {
            Vec::new()
        }
        fn pipeline_spec(&self) -> PipelineSpec {
            PipelineSpec {
                shader: "custom_unlit".to_string(),
                ..PipelineSpec::default()
            }
        }
    }

    let mut registry = MaterialRegistry::with_builtin_kinds();
    let count_before = registry.len();
    registry.register(Box::new(CustomUnlit));

    assert_eq!(registry.len(), count_before);
    assert_eq!(registry.get("unlit").unwrap().pipeline_spec().shader, "custom_unlit");
}

// ============================================================================
// Kind declaration tests
// ============================================================================

#[test]
fn test_unlit_has_no_material_bindings() {
    assert!(UnlitKind.material_bindings().is_empty());
}

#[test]
fn test_textured_lit_binds_one_sampler() {
    let bindings = TexturedLitKind.material_bindings();
    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings[0].binding, 0);
    assert_eq!(bindings[0].descriptor_type, DescriptorType::CombinedImageSampler);
}

#[test]
fn test_default_pipeline_spec() {
    let spec = PipelineSpec::default();
    assert_eq!(spec.cull_mode, vk::CullModeFlags::BACK);
    assert!(spec.depth_test);
    assert!(spec.depth_write);
    assert!(!spec.alpha_blend);
    assert_eq!(spec.topology, vk::PrimitiveTopology::TRIANGLE_LIST);
}

#[test]
fn test_set_slot_indices() {
    assert_eq!(SET_SLOT_MATERIAL, 0);
    assert_eq!(SET_SLOT_GLOBAL, 1);
    assert_eq!(SET_SLOT_INSTANCE, 2);
}
