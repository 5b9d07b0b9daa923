//! Wavefront OBJ and MTL text for the generated parts.

use tracing::debug;

use table_kernel::mesh::unique_indexing;
use table_kernel::{Mesh, Vec2, Vec3};

use crate::errors::BuildError;
use crate::parts::Part;

/// Material library referenced by every object file.
pub const MTL_FILE: &str = "pooltable.mtl";

/// Texture every material samples.
pub const ATLAS_IMAGE: &str = "atlas.jpg";

const DEDUP_EPS: f64 = 1e-12;

pub fn material_name(part: Part) -> String {
    format!("material_{}", part.name())
}

/// Material library with one entry per part.
pub fn mtl_text() -> String {
    let mut out = String::new();
    for part in Part::MATERIAL_ORDER {
        out.push_str(&format!("newmtl {}\n", material_name(part)));
        out.push_str("Ka 0.1 0.1 0.1\n");
        out.push_str("Kd 0.7 0.7 0.7\n");
        out.push_str("Ks 0.5 0.5 0.5\n");
        out.push_str(&format!("map_Kd {ATLAS_IMAGE}\n\n"));
    }
    out
}

/// Object file for all meshes of one part.
///
/// Positions, normals and texture coordinates are deduplicated separately
/// and faces index them 1-based. Every face corner must carry a normal and
/// a uv.
pub fn obj_text<'a, I>(part: Part, meshes: I) -> Result<String, BuildError>
where
    I: IntoIterator<Item = &'a Mesh>,
{
    let mut positions: Vec<Vec3> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();
    let mut uvs: Vec<Vec2> = Vec::new();
    let mut corners: Vec<usize> = Vec::new();

    for (face_index, face) in meshes.into_iter().flat_map(|m| m.faces()).enumerate() {
        for (corner, p) in face.points().iter().enumerate() {
            let missing = |attribute| BuildError::MissingAttribute {
                part: part.name().to_string(),
                face: face_index,
                corner,
                attribute,
            };
            positions.push(*p);
            normals.push(face.normals[corner].ok_or_else(|| missing("normal"))?);
            uvs.push(face.uvs[corner].ok_or_else(|| missing("uv"))?);
        }
        corners.push(face.len());
    }

    let (unique_positions, position_index) = unique_indexing(&positions, |a, b| a.distance_to(b), DEDUP_EPS);
    let (unique_normals, normal_index) = unique_indexing(&normals, |a, b| a.distance_to(b), DEDUP_EPS);
    let (unique_uvs, uv_index) = unique_indexing(&uvs, |a, b| a.distance_to(b), DEDUP_EPS);

    let mut out = String::with_capacity(64 * (positions.len() + corners.len()));
    out.push_str(&format!("mtllib {MTL_FILE}\n"));
    for p in &unique_positions {
        out.push_str(&format!("v {} {} {}\n", p.x, p.y, p.z));
    }
    for n in &unique_normals {
        out.push_str(&format!("vn {} {} {}\n", n.x, n.y, n.z));
    }
    for uv in &unique_uvs {
        out.push_str(&format!("vt {} {}\n", uv.x, uv.y));
    }
    out.push_str(&format!("usemtl {}\n", material_name(part)));

    let mut k = 0;
    for count in corners {
        out.push('f');
        for _ in 0..count {
            out.push_str(&format!(" {}/{}/{}", position_index[k] + 1, uv_index[k] + 1, normal_index[k] + 1));
            k += 1;
        }
        out.push('\n');
    }

    debug!(
        part = part.name(),
        vertices = unique_positions.len(),
        normals = unique_normals.len(),
        uvs = unique_uvs.len(),
        "object text written"
    );
    Ok(out)
}
