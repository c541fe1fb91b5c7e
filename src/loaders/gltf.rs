use glam::{Quat, Vec3};
use gltf::buffer::Source;
use gltf::mesh::Mode;

use super::source::{sibling, AssetSource};
use crate::error::AssetLoadError;
use crate::math::Color;
use crate::scene::{Geometry, Material, NodeTree, SceneNode, Transform, TriangleMesh};

/// Named animation found in a model. Playback is not driven; the clip is
/// kept so callers can report it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
}

/// A parsed glTF scene as a detached subtree
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAsset {
    pub root: NodeTree,
    pub animations: Vec<AnimationClip>,
}

impl ModelAsset {
    pub fn mesh_count(&self) -> usize {
        fn count(tree: &NodeTree) -> usize {
            usize::from(tree.node.geometry.is_some()) + tree.children.iter().map(count).sum::<usize>()
        }
        count(&self.root)
    }
}

/// Parses `.gltf` or `.glb` bytes. External buffers are fetched through
/// `source`, relative to `name`.
pub async fn parse_model(source: &dyn AssetSource, name: &str, bytes: &[u8]) -> Result<ModelAsset, AssetLoadError> {
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes).map_err(|e| AssetLoadError::parse(name, e))?;
    let buffers = load_buffers(source, name, &document, blob).await?;

    log::info!(
        "{}: {} node(s), {} mesh(es), {} animation(s)",
        name,
        document.nodes().count(),
        document.meshes().count(),
        document.animations().count()
    );

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| AssetLoadError::parse(name, "file contains no scene"))?;

    let mut root = NodeTree::leaf(SceneNode::group().with_name(scene.name().unwrap_or(name)));
    for node in scene.nodes() {
        root.children.push(process_node(&node, &buffers, name)?);
    }

    let animations = document
        .animations()
        .map(|animation| AnimationClip {
            name: animation.name().unwrap_or("unnamed").to_string(),
            duration: animation_duration(&animation, &buffers),
        })
        .collect();

    let model = ModelAsset { root, animations };
    if model.mesh_count() == 0 {
        log::warn!("{}: no triangle geometry found", name);
    }
    Ok(model)
}

async fn load_buffers(
    source: &dyn AssetSource,
    name: &str,
    document: &gltf::Document,
    blob: Option<Vec<u8>>,
) -> Result<Vec<gltf::buffer::Data>, AssetLoadError> {
    let embedded = document
        .buffers()
        .any(|buffer| matches!(buffer.source(), Source::Uri(uri) if uri.starts_with("data:")));
    if embedded {
        return gltf::import_buffers(document, None, blob).map_err(|e| AssetLoadError::parse(name, e));
    }

    let mut blob = blob;
    let mut buffers = Vec::new();
    for buffer in document.buffers() {
        let data = match buffer.source() {
            Source::Bin => blob
                .take()
                .ok_or_else(|| AssetLoadError::parse(name, "binary chunk referenced but missing"))?,
            Source::Uri(uri) => source.fetch(&sibling(name, uri)).await?,
        };
        if data.len() < buffer.length() {
            return Err(AssetLoadError::parse(
                name,
                format!("buffer {} holds {} bytes, expected {}", buffer.index(), data.len(), buffer.length()),
            ));
        }
        buffers.push(gltf::buffer::Data(data));
    }
    Ok(buffers)
}

fn process_node(node: &gltf::Node, buffers: &[gltf::buffer::Data], name: &str) -> Result<NodeTree, AssetLoadError> {
    let (translation, rotation, scale) = node.transform().decomposed();
    let transform = Transform::from_parts(
        Vec3::from_array(translation),
        Quat::from_array(rotation),
        Vec3::from_array(scale),
    );
    let mut scene_node = SceneNode::group().with_transform(transform);
    if let Some(node_name) = node.name() {
        scene_node = scene_node.with_name(node_name);
    }
    let mut tree = NodeTree::leaf(scene_node);

    if let Some(mesh) = node.mesh() {
        tree.children.extend(process_mesh(&mesh, buffers, name)?);
    }
    for child in node.children() {
        tree.children.push(process_node(&child, buffers, name)?);
    }
    Ok(tree)
}

/// One mesh node per triangle primitive; other primitive modes are skipped
fn process_mesh(mesh: &gltf::Mesh, buffers: &[gltf::buffer::Data], name: &str) -> Result<Vec<NodeTree>, AssetLoadError> {
    let mut out = Vec::new();
    for primitive in mesh.primitives() {
        if primitive.mode() != Mode::Triangles {
            log::debug!("{}: skipping {:?} primitive", name, primitive.mode());
            continue;
        }
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
        let Some(positions) = reader.read_positions() else {
            log::debug!("{}: primitive without positions", name);
            continue;
        };
        let positions: Vec<Vec3> = positions.map(Vec3::from_array).collect();
        let triangles = match reader.read_indices() {
            Some(indices) => TriangleMesh::new(positions, indices.into_u32().collect()),
            None => TriangleMesh::from_triangles(positions),
        };
        if triangles.triangle_count() == 0 {
            continue;
        }
        log::debug!(
            "{}: primitive {} has {} triangles, {:?}",
            name,
            primitive.index(),
            triangles.triangle_count(),
            triangles.bvh_stats()
        );

        let gltf_material = primitive.material();
        let [r, g, b, _] = gltf_material.pbr_metallic_roughness().base_color_factor();
        let mut material = Material::standard(Color::rgb(r, g, b));
        if gltf_material.double_sided() {
            material = material.double_sided();
        }

        let mut node = SceneNode::mesh(Geometry::Mesh(triangles), material);
        if let Some(mesh_name) = mesh.name() {
            node = node.with_name(format!("{}.{}", mesh_name, primitive.index()));
        }
        out.push(NodeTree::leaf(node));
    }
    Ok(out)
}

fn animation_duration(animation: &gltf::Animation, buffers: &[gltf::buffer::Data]) -> f32 {
    animation
        .channels()
        .filter_map(|channel| {
            channel
                .reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()))
                .read_inputs()
        })
        .flatten()
        .fold(0.0f32, f32::max)
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Minimal glTF with one indexed triangle whose buffer lives in
    /// `tri.bin`, plus the matching buffer bytes.
    pub fn triangle_gltf() -> (String, Vec<u8>) {
        let mut bin = Vec::new();
        for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bin.extend_from_slice(&v.to_le_bytes());
        }
        for i in [0u16, 1, 2] {
            bin.extend_from_slice(&i.to_le_bytes());
        }
        bin.extend_from_slice(&[0, 0]);

        let json = r#"{
            "asset": {"version": "2.0"},
            "scene": 0,
            "scenes": [{"name": "tree", "nodes": [0]}],
            "nodes": [{"name": "trunk", "mesh": 0, "translation": [1.0, 2.0, 3.0]}],
            "meshes": [{"name": "trunk", "primitives": [{"attributes": {"POSITION": 0}, "indices": 1, "material": 0}]}],
            "materials": [{"pbrMetallicRoughness": {"baseColorFactor": [1.0, 0.0, 0.0, 1.0]}, "doubleSided": true}],
            "buffers": [{"uri": "tri.bin", "byteLength": 44}],
            "bufferViews": [
                {"buffer": 0, "byteOffset": 0, "byteLength": 36},
                {"buffer": 0, "byteOffset": 36, "byteLength": 6}
            ],
            "accessors": [
                {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                 "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]},
                {"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"}
            ]
        }"#;
        (json.to_string(), bin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loaders::MemorySource;
    use crate::scene::Side;

    #[test]
    fn test_parse_model_with_external_buffer() {
        let (json, bin) = fixtures::triangle_gltf();
        let source = MemorySource::new().with_asset("models/tri.bin", bin);
        let model = pollster::block_on(parse_model(&source, "models/tri.gltf", json.as_bytes())).unwrap();

        assert_eq!(source.fetch_count("models/tri.bin"), 1);
        assert_eq!(model.mesh_count(), 1);
        assert_eq!(model.root.node.name(), Some("tree"));

        let trunk = &model.root.children[0];
        assert_eq!(trunk.node.transform.position, Vec3::new(1.0, 2.0, 3.0));
        let mesh_node = &trunk.children[0].node;
        let material = mesh_node.material.as_ref().unwrap();
        assert_eq!(material.color.to_hex(), 0xff0000);
        assert_eq!(material.side, Side::Double);
        assert!(matches!(&mesh_node.geometry, Some(Geometry::Mesh(m)) if m.triangle_count() == 1));
    }

    #[test]
    fn test_missing_buffer_fails_fetch() {
        let (json, _) = fixtures::triangle_gltf();
        let source = MemorySource::new();
        let err = pollster::block_on(parse_model(&source, "tri.gltf", json.as_bytes())).unwrap_err();
        assert!(matches!(err, AssetLoadError::Fetch { ref name, .. } if name == "tri.bin"));
    }

    #[test]
    fn test_short_buffer_is_parse_error() {
        let (json, bin) = fixtures::triangle_gltf();
        let source = MemorySource::new().with_asset("tri.bin", bin[..10].to_vec());
        let err = pollster::block_on(parse_model(&source, "tri.gltf", json.as_bytes())).unwrap_err();
        assert!(matches!(err, AssetLoadError::Parse { .. }));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let source = MemorySource::new();
        let err = pollster::block_on(parse_model(&source, "Cake Birthday.glb", b"not a model")).unwrap_err();
        assert_eq!(err.asset_name(), "Cake Birthday.glb");
    }
}
