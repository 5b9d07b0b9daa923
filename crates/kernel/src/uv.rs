//! Texture coordinate propagation across face adjacencies.
//!
//! Seeded faces carry known uvs. Each round, every unassigned face that
//! shares two vertices with a face assigned in the previous round, and
//! whose category pair is allowed, receives the similarity transform of its
//! own chart that agrees with the neighbor on the two shared vertices.

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::geometry::similarity::Similarity2;
use crate::geometry::vector::{Vec2, Vec3};
use crate::mesh::{Face, Mesh};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum UvError {
    #[error("expected {expected} face categories, got {got}")]
    CategoryCount { expected: usize, got: usize },
    #[error("seed face {0} has corners without uv")]
    UnseededFace(usize),
    #[error("seed face index {0} out of range")]
    SeedOutOfRange(usize),
}

/// Which category pairs uvs may flow across.
#[derive(Debug, Clone, PartialEq)]
pub struct PropagationRules<C> {
    pub allowed: Vec<(C, C)>,
    /// Also allow flow between faces of the same category.
    pub same_category: bool,
}

impl<C: PartialEq> PropagationRules<C> {
    pub fn new(allowed: Vec<(C, C)>) -> Self {
        Self {
            allowed,
            same_category: false,
        }
    }

    pub fn with_same_category(mut self, enabled: bool) -> Self {
        self.same_category = enabled;
        self
    }

    pub fn allows(&self, from: &C, to: &C) -> bool {
        (self.same_category && from == to)
            || self.allowed.iter().any(|(a, b)| a == from && b == to)
    }
}

/// Outcome of [`propagate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Propagation {
    /// Face each propagated face took its transform from.
    pub parents: Vec<Option<usize>>,
    pub assigned: Vec<bool>,
    pub rounds: usize,
}

impl Propagation {
    /// Faces neither seeded nor reached.
    pub fn unreached(&self) -> Vec<usize> {
        (0..self.assigned.len())
            .filter(|&f| !self.assigned[f])
            .collect()
    }

    /// Pairs `(parent, child)` of the propagation tree.
    pub fn tree_edges(&self) -> Vec<(usize, usize)> {
        self.parents
            .iter()
            .enumerate()
            .filter_map(|(child, parent)| parent.map(|p| (p, child)))
            .collect()
    }
}

/// Set a face's uvs to the projection of its points on two axes.
pub fn project_face(face: &mut Face, u: &Vec3, v: &Vec3) {
    let uvs: Vec<Option<Vec2>> = face
        .points()
        .iter()
        .map(|p| Some(Vec2::new(u.dot(p), v.dot(p))))
        .collect();
    face.uvs = uvs;
}

/// Propagate uvs outward from `seeds`.
///
/// `categories` is parallel to the mesh faces; faces without a category
/// never take part. The first successful propagation to a face wins. The
/// two shared corners receive the parent's uvs verbatim, so every
/// parent/child pair is seamless.
#[instrument(skip_all, fields(faces = mesh.len(), seeds = seeds.len()))]
pub fn propagate<C>(
    mesh: &mut Mesh,
    categories: &[Option<C>],
    seeds: &[usize],
    rules: &PropagationRules<C>,
    tol: f64,
) -> Result<Propagation, UvError>
where
    C: PartialEq,
{
    let n = mesh.len();
    if categories.len() != n {
        return Err(UvError::CategoryCount {
            expected: n,
            got: categories.len(),
        });
    }

    let (updates, outcome) = {
        let topo = mesh.topology(tol);
        let faces = mesh.faces();

        let mut uvs: Vec<Option<Vec<Vec2>>> = vec![None; n];
        let mut frontier = Vec::new();
        for &s in seeds {
            let face = faces.get(s).ok_or(UvError::SeedOutOfRange(s))?;
            let seeded: Option<Vec<Vec2>> = face.uvs.iter().copied().collect();
            uvs[s] = Some(seeded.ok_or(UvError::UnseededFace(s))?);
            frontier.push(s);
        }
        frontier.sort_unstable();
        frontier.dedup();

        let mut parents = vec![None; n];
        let mut rounds = 0;
        while !frontier.is_empty() {
            rounds += 1;
            let mut next = Vec::new();
            for f in 0..n {
                if uvs[f].is_some() {
                    continue;
                }
                let Some(to) = &categories[f] else { continue };
                for &g in &frontier {
                    let Some(from) = &categories[g] else { continue };
                    if !rules.allows(from, to) {
                        continue;
                    }
                    let shared = topo.shared_vertices(f, g);
                    if shared.len() < 2 {
                        continue;
                    }
                    let (Some(f1), Some(f2), Some(g1), Some(g2)) = (
                        topo.corner_of(f, shared[0]),
                        topo.corner_of(f, shared[1]),
                        topo.corner_of(g, shared[0]),
                        topo.corner_of(g, shared[1]),
                    ) else {
                        continue;
                    };
                    let Some(parent_uvs) = &uvs[g] else { continue };
                    let (w1, w2) = (parent_uvs[g1], parent_uvs[g2]);
                    let face = &faces[f];
                    let z1 = face.chart(&face.points()[f1]);
                    let z2 = face.chart(&face.points()[f2]);
                    let Ok(transform) = Similarity2::from_pairs(&z1, &z2, &w1, &w2) else {
                        continue;
                    };
                    let mut mapped: Vec<Vec2> = face
                        .points()
                        .iter()
                        .map(|p| transform.apply(&face.chart(p)))
                        .collect();
                    mapped[f1] = w1;
                    mapped[f2] = w2;
                    uvs[f] = Some(mapped);
                    parents[f] = Some(g);
                    next.push(f);
                    break;
                }
            }
            debug!(round = rounds, reached = next.len(), "propagation round");
            frontier = next;
        }

        let assigned = uvs.iter().map(Option::is_some).collect();
        (
            uvs,
            Propagation {
                parents,
                assigned,
                rounds,
            },
        )
    };

    for (face, update) in mesh.faces_mut().iter_mut().zip(updates) {
        if let Some(face_uvs) = update {
            face.uvs = face_uvs.into_iter().map(Some).collect();
        }
    }
    info!(
        unreached = outcome.unreached().len(),
        rounds = outcome.rounds,
        "uv propagation complete"
    );
    Ok(outcome)
}

/// Largest uv disagreement between two faces over their shared vertices,
/// or `None` when a shared corner has no uv.
pub fn seam_gap(mesh: &Mesh, f: usize, g: usize, tol: f64) -> Option<f64> {
    let faces = mesh.faces();
    let mut gap: f64 = 0.0;
    for (i, p) in faces[f].points().iter().enumerate() {
        for (j, q) in faces[g].points().iter().enumerate() {
            if p.distance_to(q) < tol {
                let a = faces[f].uvs[i]?;
                let b = faces[g].uvs[j]?;
                gap = gap.max(a.distance_to(&b));
            }
        }
    }
    Some(gap)
}
