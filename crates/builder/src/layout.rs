//! Packing the uv islands of all parts into one texture atlas.

use serde::Serialize;
use tracing::{info, instrument};

use table_atlas::{PackerConfig, Placement, pack};
use table_kernel::Vec2;

use crate::errors::BuildError;
use crate::parts::{Part, PartMesh};
use crate::spec::Spec;
use crate::unwrap::UvIsland;

/// Uv bounding box of an island, in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UvBounds {
    pub min: (f64, f64),
    pub max: (f64, f64),
}

impl UvBounds {
    pub fn width(&self) -> f64 {
        self.max.0 - self.min.0
    }

    pub fn height(&self) -> f64 {
        self.max.1 - self.min.1
    }
}

/// Where one island went: its padded rectangle in atlas pixels and the map
/// `pixel = scale * uv + offset` used for its faces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IslandPlacement {
    pub part: Part,
    pub key: String,
    pub rect: Placement,
    pub bounds: UvBounds,
    pub scale: f64,
    pub offset: (f64, f64),
}

/// The packed atlas, handed to the image compositor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtlasLayout {
    pub width: u32,
    pub height: u32,
    pub islands: Vec<IslandPlacement>,
}

impl AtlasLayout {
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Texture density multiplier of a part. Parts seen up close get more
/// pixels per metre.
pub fn enhance_factor(spec: &Spec, part: Part) -> f64 {
    match part {
        Part::Cushions | Part::Slate | Part::Rails => spec.uv_enhance_factor.0,
        Part::RailSights => spec.uv_enhance_factor.1,
        Part::Liners | Part::Casing => 1.0,
    }
}

fn island_bounds(part: &PartMesh, island: &UvIsland) -> Result<UvBounds, BuildError> {
    let mut min = (f64::INFINITY, f64::INFINITY);
    let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for &f in &island.faces {
        for (corner, uv) in part.mesh.faces()[f].uvs.iter().enumerate() {
            let uv = uv.ok_or_else(|| BuildError::MissingAttribute {
                part: format!("{}/{}", part.part.name(), part.name()),
                face: f,
                corner,
                attribute: "uv",
            })?;
            min = (min.0.min(uv.x), min.1.min(uv.y));
            max = (max.0.max(uv.x), max.1.max(uv.y));
        }
    }
    Ok(UvBounds { min, max })
}

/// Pixel size of a padded island, never zero.
fn padded_size(extent: f64, scale: f64, gap: u32) -> u32 {
    ((extent * scale).ceil() as u32 + 2 * gap).max(1)
}

/// Pack all islands and rewrite every face uv to normalized atlas
/// coordinates, `v` pointing up.
#[instrument(skip_all, fields(islands = islands.len()))]
pub fn layout_atlas(
    spec: &Spec,
    parts: &mut [PartMesh],
    islands: &[UvIsland],
    config: &PackerConfig,
) -> Result<AtlasLayout, BuildError> {
    let gap = spec.uv_texture_gap;
    let mut bounds = Vec::with_capacity(islands.len());
    let mut scales = Vec::with_capacity(islands.len());
    let mut sizes = Vec::with_capacity(islands.len());
    for island in islands {
        let part = &parts[island.mesh];
        let b = island_bounds(part, island)?;
        let scale = spec.uv_pixels_per_meter * enhance_factor(spec, part.part);
        sizes.push((padded_size(b.width(), scale, gap), padded_size(b.height(), scale, gap)));
        bounds.push(b);
        scales.push(scale);
    }

    let packing = pack(&sizes, config)?;
    let (w, h) = (packing.width as f64, packing.height as f64);

    let mut placed = Vec::with_capacity(islands.len());
    for (k, island) in islands.iter().enumerate() {
        let rect = packing.placements[k];
        let (b, scale) = (bounds[k], scales[k]);
        let offset = (
            (rect.x + gap) as f64 - b.min.0 * scale,
            (rect.y + gap) as f64 - b.min.1 * scale,
        );
        let part = &mut parts[island.mesh];
        for &f in &island.faces {
            for uv in part.mesh.faces_mut()[f].uvs.iter_mut().flatten() {
                let px = (rect.x + gap) as f64 + (uv.x - b.min.0) * scale;
                let py = (rect.y + gap) as f64 + (uv.y - b.min.1) * scale;
                *uv = Vec2::new(px / w, 1.0 - py / h);
            }
        }
        placed.push(IslandPlacement {
            part: part.part,
            key: part.name(),
            rect,
            bounds: b,
            scale,
            offset,
        });
    }

    info!(
        width = packing.width,
        height = packing.height,
        efficiency = packing.efficiency(),
        "atlas laid out"
    );
    Ok(AtlasLayout {
        width: packing.width,
        height: packing.height,
        islands: placed,
    })
}
