//! Small in-memory assets shared by loader, tree and viewer tests.

/// Positions of one right triangle followed by `u16` indices `0 1 2`.
fn triangle_buffer() -> Vec<u8> {
    let mut bytes = Vec::new();
    for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    for i in [0u16, 1, 2] {
        bytes.extend_from_slice(&i.to_le_bytes());
    }
    bytes
}

/// Same bytes as [`triangle_buffer`], base64 encoded for a data URI.
const TRIANGLE_BASE64: &str = "AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAABAAIA";

const BUFFER_VIEWS: &str = r#"
    "bufferViews": [
        { "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 },
        { "buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963 }
    ],
    "accessors": [
        { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
          "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
        { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
    ]"#;

/// Hierarchy:
///
/// ```text
/// Body (mesh, translated +X)
/// └── <unnamed> (mesh with two primitives)
/// Empty
/// ```
fn assembly_json(buffer_uri: Option<&str>) -> String {
    let buffer = match buffer_uri {
        Some(uri) => format!(r#"{{ "byteLength": 42, "uri": "{}" }}"#, uri),
        None => r#"{ "byteLength": 42 }"#.to_string(),
    };
    format!(
        r#"{{
    "asset": {{ "version": "2.0" }},
    "scene": 0,
    "scenes": [ {{ "nodes": [0, 2] }} ],
    "nodes": [
        {{ "name": "Body", "mesh": 0, "translation": [1.0, 0.0, 0.0], "children": [1] }},
        {{ "mesh": 1 }},
        {{ "name": "Empty" }}
    ],
    "meshes": [
        {{ "name": "BodyMesh", "primitives": [ {{ "attributes": {{ "POSITION": 0 }}, "indices": 1, "material": 0 }} ] }},
        {{ "primitives": [
            {{ "attributes": {{ "POSITION": 0 }}, "indices": 1, "material": 0 }},
            {{ "attributes": {{ "POSITION": 0 }}, "indices": 1 }}
        ] }}
    ],
    "materials": [
        {{ "name": "Steel",
           "pbrMetallicRoughness": {{ "baseColorFactor": [0.5, 0.5, 0.5, 1.0], "metallicFactor": 1.0, "roughnessFactor": 0.25 }},
           "emissiveFactor": [0.0, 0.0, 0.0],
           "doubleSided": true }}
    ],
    "buffers": [ {} ],
    {}
}}"#,
        buffer, BUFFER_VIEWS
    )
}

/// Wrap a JSON chunk and a binary chunk in a GLB container.
pub(crate) fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
    let mut json_chunk = json.as_bytes().to_vec();
    while json_chunk.len() % 4 != 0 {
        json_chunk.push(b' ');
    }
    let mut bin_chunk = bin.to_vec();
    while bin_chunk.len() % 4 != 0 {
        bin_chunk.push(0);
    }
    let total = 12 + 8 + json_chunk.len() + 8 + bin_chunk.len();

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json_chunk.len() as u32).to_le_bytes());
    out.extend_from_slice(b"JSON");
    out.extend_from_slice(&json_chunk);
    out.extend_from_slice(&(bin_chunk.len() as u32).to_le_bytes());
    out.extend_from_slice(b"BIN\0");
    out.extend_from_slice(&bin_chunk);
    out
}

/// Assembly as a GLB container.
pub(crate) fn assembly_glb() -> Vec<u8> {
    glb(&assembly_json(None), &triangle_buffer())
}

/// Assembly as glTF JSON with an embedded data URI buffer.
pub(crate) fn assembly_gltf() -> Vec<u8> {
    let uri = format!("data:application/octet-stream;base64,{}", TRIANGLE_BASE64);
    assembly_json(Some(&uri)).into_bytes()
}

/// Valid glTF whose nodes carry no meshes.
pub(crate) fn empty_gltf() -> Vec<u8> {
    br#"{
    "asset": { "version": "2.0" },
    "scene": 0,
    "scenes": [ { "nodes": [0] } ],
    "nodes": [ { "name": "Locator", "children": [1] }, { "name": "Child" } ]
}"#
    .to_vec()
}

/// glTF whose only primitive draws the triangle's corners as points.
pub(crate) fn points_gltf() -> Vec<u8> {
    format!(
        r#"{{
    "asset": {{ "version": "2.0" }},
    "scene": 0,
    "scenes": [ {{ "nodes": [0] }} ],
    "nodes": [ {{ "name": "Markers", "mesh": 0 }} ],
    "meshes": [
        {{ "primitives": [ {{ "attributes": {{ "POSITION": 0 }}, "indices": 1, "mode": 0 }} ] }}
    ],
    "buffers": [ {{ "byteLength": 42, "uri": "data:application/octet-stream;base64,{}" }} ],
    {}
}}"#,
        TRIANGLE_BASE64, BUFFER_VIEWS
    )
    .into_bytes()
}

/// glTF referencing an external buffer file.
pub(crate) fn external_buffer_gltf() -> Vec<u8> {
    assembly_json(Some("assembly.bin")).into_bytes()
}

/// Binary STL with a single facet.
pub(crate) fn single_facet_stl() -> Vec<u8> {
    let mut bytes = vec![0u8; 80];
    bytes.extend_from_slice(&1u32.to_le_bytes());
    for v in [
        0.0f32, 0.0, 1.0, // normal
        0.0, 0.0, 0.0, //
        2.0, 0.0, 0.0, //
        0.0, 2.0, 0.0,
    ] {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes
}

#[test]
fn test_fixture_base64_matches_buffer() {
    // Guard against the two encodings drifting apart.
    assert_eq!(triangle_buffer().len(), 42);
    assert_eq!(TRIANGLE_BASE64.len(), 56);
}
