//! Texture coordinates for every part and the grouping of faces into uv
//! islands.
//!
//! Uvs are in metres here; [`crate::layout`] scales and moves the islands
//! into the atlas afterwards.

use tracing::{debug, info, instrument, warn};

use table_kernel::uv::{PropagationRules, project_face, propagate};
use table_kernel::{Face, GeometryError, Mesh, Vec2, Vec3};

use crate::context::{BuildContext, Cushion, CushionPlane};
use crate::errors::BuildError;
use crate::parts::{Part, PartMesh, PieceKey};
use crate::spec::PocketKind;

const FLAT_TOLERANCE: f64 = 1e-9;

/// Faces of one mesh that share a connected uv chart.
#[derive(Debug, Clone, PartialEq)]
pub struct UvIsland {
    /// Index into the part mesh list.
    pub mesh: usize,
    pub faces: Vec<usize>,
}

/// Projection frame `(u, v)` looking along `-direction`.
fn view_frame(direction: &Vec3) -> Result<(Vec3, Vec3), GeometryError> {
    let u = if direction.cross(&Vec3::Z).length() < FLAT_TOLERANCE {
        Vec3::X
    } else {
        Vec3::Z.cross(direction).normalized().ok_or(GeometryError::DegenerateNormal)?
    };
    Ok((u, direction.cross(&u)))
}

/// Project a face along whichever of `directions` is closest to its
/// normal. Returns the index of the chosen direction.
fn project_cardinal(face: &mut Face, directions: &[Vec3]) -> Result<usize, GeometryError> {
    let normal = face.normal();
    let mut best = 0;
    for (k, d) in directions.iter().enumerate() {
        if d.dot(&normal) > directions[best].dot(&normal) {
            best = k;
        }
    }
    let (u, v) = view_frame(&directions[best])?;
    project_face(face, &u, &v);
    Ok(best)
}

const AXES: [Vec3; 6] = [
    Vec3::X,
    Vec3::new(-1.0, 0.0, 0.0),
    Vec3::Y,
    Vec3::new(0.0, -1.0, 0.0),
    Vec3::Z,
    Vec3::new(0.0, 0.0, -1.0),
];

/// Group face indices by a category index, dropping empty groups.
fn group_by(categories: &[usize], count: usize) -> Vec<Vec<usize>> {
    let mut groups = vec![Vec::new(); count];
    for (f, &c) in categories.iter().enumerate() {
        groups[c].push(f);
    }
    groups.retain(|g| !g.is_empty());
    groups
}

fn all_faces(mesh: &Mesh) -> Vec<Vec<usize>> {
    vec![(0..mesh.len()).collect()]
}

/// Classify each face by the last cushion plane it lies in.
pub fn cushion_categories(ctx: &BuildContext, cushion: Cushion, mesh: &Mesh, tol: f64) -> Vec<Option<CushionPlane>> {
    let planes = ctx.cushion(cushion);
    mesh.faces()
        .iter()
        .map(|face| {
            CushionPlane::ALL
                .into_iter()
                .rev()
                .find(|&which| face.lies_in(planes.get(which), tol))
        })
        .collect()
}

/// Unfold a cushion from its rail top: the top keeps its plan view and
/// every other face is laid out against the face it was reached from.
fn unwrap_cushion(ctx: &BuildContext, cushion: Cushion, mesh: &mut Mesh, tol: f64) -> Result<Vec<Vec<usize>>, BuildError> {
    use CushionPlane::*;

    let categories = cushion_categories(ctx, cushion, mesh, tol);
    let seeds: Vec<usize> = (0..categories.len())
        .filter(|&f| categories[f] == Some(RailTop))
        .collect();
    let rules = PropagationRules::new(vec![
        (RailTop, End1),
        (RailTop, End2),
        (RailTop, RailBack),
        (RailTop, RubberTop),
        (RubberTop, RubberBottom),
        (RubberBottom, Slate),
    ])
    .with_same_category(true);
    let outcome = propagate(mesh, &categories, &seeds, &rules, tol)?;

    let unreached = outcome.unreached();
    if !unreached.is_empty() {
        warn!(cushion = cushion.name(), faces = unreached.len(), "cushion faces not reached from the rail top");
    }
    for f in unreached {
        project_cardinal(&mut mesh.faces_mut()[f], &AXES)?;
    }
    Ok(all_faces(mesh))
}

/// Wrap a liner around its circle centre: the horizontal coordinate is the
/// arc length on the pocket rim, the vertical one is height.
fn unwrap_liner(ctx: &BuildContext, pocket: usize, mesh: &mut Mesh) -> Vec<Vec<usize>> {
    let spec = &ctx.spec;
    let pocket_spec = spec.pocket(PocketKind::of(pocket));
    let h0 = spec.rail_height();
    let center = ctx.liner_center(pocket);
    let n = ctx.pocket_normal(pocket);
    let v = -n.cross(&Vec3::Z);
    let slope = pocket_spec.vertical_angle.tan();

    for face in mesh.faces_mut() {
        let middle = face.centroid().distance_to(&center);
        let horizontal = (face.normal() - Vec3::Z).length() < FLAT_TOLERANCE;
        let uvs = face
            .points()
            .iter()
            .map(|p| {
                let d = *p - center;
                let angle = d.dot(&v).atan2(d.dot(&n));
                let x = (0.5 * pocket_spec.mouth + (h0 - p.z) * slope) * angle;
                let y = match (horizontal, p.distance_to(&center) > middle) {
                    (true, true) => h0 + spec.pocket_liner_width,
                    (true, false) => h0,
                    (false, _) => p.z,
                };
                Some(Vec2::new(x, y))
            })
            .collect();
        face.uvs = uvs;
    }
    all_faces(mesh)
}

/// Project each casing face along the closest of the bottom and the four
/// tapered sides; one island per side.
fn unwrap_casing(ctx: &BuildContext, mesh: &mut Mesh) -> Result<Vec<Vec<usize>>, BuildError> {
    let alpha = ctx.spec.casing_vertical_angle;
    let n1 = Vec3::new(alpha.cos(), 0.0, -alpha.sin());
    let n2 = Vec3::new(0.0, alpha.cos(), -alpha.sin());
    let normals = [-Vec3::Z, n1, n2, -n1, -n2];
    let directions = [Vec3::X, Vec3::Y, -Vec3::X, -Vec3::Y, Vec3::X];
    let frames = normals
        .iter()
        .zip(&directions)
        .map(|(n, u)| Ok((*u, n.cross(u).normalized().ok_or(GeometryError::DegenerateNormal)?)))
        .collect::<Result<Vec<_>, GeometryError>>()?;

    let mut categories = Vec::with_capacity(mesh.len());
    for face in mesh.faces_mut() {
        let normal = face.normal();
        // Only the horizontal part of the candidate normals counts; the
        // bottom scores zero and wins any tie.
        let score = |n: &Vec3| -(n.x * normal.x + n.y * normal.y);
        let mut best = 0;
        for k in 1..normals.len() {
            if score(&normals[k]) < score(&normals[best]) {
                best = k;
            }
        }
        let (u, v) = frames[best];
        project_face(face, &u, &v);
        categories.push(best);
    }
    Ok(group_by(&categories, normals.len()))
}

/// Top and bottom in plan view, the edges projected sideways.
fn unwrap_slate(mesh: &mut Mesh) -> Result<Vec<Vec<usize>>, BuildError> {
    let sides = [Vec3::X, -Vec3::X, Vec3::Y, -Vec3::Y];
    let mut categories = Vec::with_capacity(mesh.len());
    for face in mesh.faces_mut() {
        let normal = face.normal();
        let category = if (normal - Vec3::Z).length() < FLAT_TOLERANCE {
            0
        } else if (normal + Vec3::Z).length() < FLAT_TOLERANCE {
            1
        } else {
            2 + project_cardinal(face, &sides)?
        };
        categories.push(category);
    }
    Ok(group_by(&categories, 2 + sides.len()))
}

/// Uvs for one part mesh; returns its islands as face index lists.
pub fn unwrap_mesh(ctx: &BuildContext, part: &mut PartMesh, tol: f64) -> Result<Vec<Vec<usize>>, BuildError> {
    // Plan view everywhere first; parts below override it.
    for face in part.mesh.faces_mut() {
        project_face(face, &Vec3::X, &Vec3::Y);
    }
    let islands = match (part.part, part.key) {
        (Part::Cushions, PieceKey::Cushion(cushion)) => unwrap_cushion(ctx, cushion, &mut part.mesh, tol)?,
        (Part::Liners, PieceKey::Pocket(pocket)) => unwrap_liner(ctx, pocket, &mut part.mesh),
        (Part::Casing, _) => unwrap_casing(ctx, &mut part.mesh)?,
        (Part::Slate, _) => unwrap_slate(&mut part.mesh)?,
        _ => all_faces(&part.mesh),
    };
    debug!(part = part.part.name(), key = %part.name(), islands = islands.len(), "unwrapped");
    Ok(islands)
}

#[instrument(skip_all, fields(meshes = parts.len()))]
pub fn unwrap_parts(ctx: &BuildContext, parts: &mut [PartMesh], tol: f64) -> Result<Vec<UvIsland>, BuildError> {
    let mut islands = Vec::new();
    for (mesh, part) in parts.iter_mut().enumerate() {
        for faces in unwrap_mesh(ctx, part, tol)? {
            islands.push(UvIsland { mesh, faces });
        }
    }
    info!(islands = islands.len(), "uv unwrap complete");
    Ok(islands)
}
