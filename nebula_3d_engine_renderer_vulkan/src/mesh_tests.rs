//! Unit tests for mesh.rs (OBJ parsing and vertex layout, no GPU required)

use super::*;
use nebula_3d_engine::nebula3d::EngineContext;

fn ctx() -> EngineContext {
    EngineContext::new()
}

// ============================================================================
// Vertex layout tests
// ============================================================================

#[test]
fn test_vertex_is_tightly_packed() {
    assert_eq!(std::mem::size_of::<Vertex>(), 32);
}

#[test]
fn test_binding_description_stride() {
    let binding = Vertex::binding_description();
    assert_eq!(binding.binding, 0);
    assert_eq!(binding.stride, 32);
    assert_eq!(binding.input_rate, vk::VertexInputRate::VERTEX);
}

#[test]
fn test_attribute_offsets() {
    let attrs = Vertex::attribute_descriptions();
    assert_eq!(attrs[0].offset, 0);
    assert_eq!(attrs[1].offset, 12);
    assert_eq!(attrs[2].offset, 24);
    assert_eq!(attrs[0].format, vk::Format::R32G32B32_SFLOAT);
    assert_eq!(attrs[2].format, vk::Format::R32G32_SFLOAT);
}

// ============================================================================
// OBJ parsing tests
// ============================================================================

#[test]
fn test_parse_single_triangle() {
    let source = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
f 1 2 3
";
    let mesh = MeshData::parse_obj(&ctx(), source, "triangle.obj").unwrap();
    assert_eq!(mesh.vertices.len(), 3);
    assert_eq!(mesh.indices, vec![0, 1, 2]);
    assert_eq!(mesh.vertices[1].position, [1.0, 0.0, 0.0]);
}

#[test]
fn test_parse_full_corner_format() {
    let source = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3/3/1
";
    let mesh = MeshData::parse_obj(&ctx(), source, "full.obj").unwrap();
    assert_eq!(mesh.vertices.len(), 3);
    assert_eq!(mesh.vertices[0].normal, [0.0, 0.0, 1.0]);
    assert_eq!(mesh.vertices[1].uv, [1.0, 0.0]);
}

#[test]
fn test_parse_position_and_normal_only() {
    // v//vn form (no texture coordinates)
    let source = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vn 0.0 1.0 0.0
f 1//1 2//1 3//1
";
    let mesh = MeshData::parse_obj(&ctx(), source, "no_uv.obj").unwrap();
    assert_eq!(mesh.vertices[0].normal, [0.0, 1.0, 0.0]);
    assert_eq!(mesh.vertices[0].uv, [0.0, 0.0]);
}

#[test]
fn test_parse_quad_triangulates_as_fan() {
    let source = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
f 1 2 3 4
";
    let mesh = MeshData::parse_obj(&ctx(), source, "quad.obj").unwrap();
    assert_eq!(mesh.vertices.len(), 4);
    // Fan: (0,1,2) and (0,2,3)
    assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
}

#[test]
fn test_parse_negative_indices() {
    // Negative indices count back from the most recent vertex
    let source = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
f -3 -2 -1
";
    let mesh = MeshData::parse_obj(&ctx(), source, "negative.obj").unwrap();
    assert_eq!(mesh.vertices[0].position, [0.0, 0.0, 0.0]);
    assert_eq!(mesh.vertices[2].position, [0.0, 1.0, 0.0]);
}

#[test]
fn test_parse_ignores_comments_and_unknown_lines() {
    let source = "\
# a comment
o some_object
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
usemtl whatever
f 1 2 3
";
    let mesh = MeshData::parse_obj(&ctx(), source, "comments.obj").unwrap();
    assert_eq!(mesh.vertices.len(), 3);
}

// ============================================================================
// Error cases
// ============================================================================

#[test]
fn test_parse_empty_source_fails() {
    let result = MeshData::parse_obj(&ctx(), "", "empty.obj");
    assert!(result.is_err());
}

#[test]
fn test_parse_out_of_range_index_fails() {
    let source = "\
v 0.0 0.0 0.0
f 1 2 3
";
    let result = MeshData::parse_obj(&ctx(), source, "bad_index.obj");
    assert!(result.is_err());
}

#[test]
fn test_parse_malformed_number_fails() {
    let source = "v 0.0 abc 0.0\n";
    let result = MeshData::parse_obj(&ctx(), source, "bad_number.obj");
    assert!(result.is_err());
}

#[test]
fn test_parse_five_corner_face_fails() {
    let source = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
v -1.0 0.0 0.0
f 1 2 3 4 5
";
    let result = MeshData::parse_obj(&ctx(), source, "ngon.obj");
    assert!(result.is_err());
}
