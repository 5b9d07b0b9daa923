//! Generate the reference table and write its OBJ/MTL files, the constants
//! table and metadata as JSON, the atlas layout and SVG previews.
//!
//! Usage: `render_table [output_dir]` (default `obj`).

use std::error::Error;
use std::fs;
use std::path::Path;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use table_builder::{AtlasLayout, GenerationConfig, Part, Spec, TableModel, generate};
use table_kernel::mesh::audit::{Severity, audit};
use table_kernel::{Mesh, Vec3};

/// Simple isometric projection: 3D -> 2D
fn project(p: &Vec3) -> (f64, f64) {
    let angle_x: f64 = 0.6;
    let angle_z: f64 = 0.8;
    let rx = p.x * angle_z.cos() - p.y * angle_z.sin();
    let ry = p.x * angle_z.sin() + p.y * angle_z.cos();
    let pz = ry * angle_x.sin() + p.z * angle_x.cos();
    (rx, -pz)
}

fn part_color(part: Part) -> (f64, f64, f64) {
    match part {
        Part::Cushions => (60.0, 150.0, 90.0),
        Part::Slate => (40.0, 120.0, 70.0),
        Part::Liners => (60.0, 60.0, 60.0),
        Part::Casing => (140.0, 90.0, 50.0),
        Part::Rails => (170.0, 110.0, 60.0),
        Part::RailSights => (220.0, 200.0, 160.0),
    }
}

/// Flat-shaded isometric view of all parts, painted back to front.
fn table_to_svg(model: &TableModel, width: f64, height: f64, title: &str) -> String {
    struct TriInfo {
        points: [(f64, f64); 3],
        depth: f64,
        fill: (u8, u8, u8),
    }

    let light = Vec3::new(0.3, -0.5, 0.8).normalized().unwrap_or(Vec3::Z);
    let mut tris = Vec::with_capacity(model.face_count());
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
    for part in &model.parts {
        let (r, g, b) = part_color(part.part);
        for face in part.mesh.faces() {
            let pts = face.points();
            if pts.len() != 3 {
                continue;
            }
            let projected = [project(&pts[0]), project(&pts[1]), project(&pts[2])];
            for (px, py) in projected {
                min_x = min_x.min(px);
                max_x = max_x.max(px);
                min_y = min_y.min(py);
                max_y = max_y.max(py);
            }
            let brightness = 0.3 + 0.7 * face.normal().dot(&light).abs().min(1.0);
            tris.push(TriInfo {
                points: projected,
                depth: Vec3::centroid(pts).z,
                fill: ((r * brightness) as u8, (g * brightness) as u8, (b * brightness) as u8),
            });
        }
    }
    tris.sort_by(|a, b| a.depth.total_cmp(&b.depth));

    let padding = 40.0;
    let avail_w = width - 2.0 * padding;
    let avail_h = height - 2.0 * padding - 25.0;
    let data_w = (max_x - min_x).max(0.001);
    let data_h = (max_y - min_y).max(0.001);
    let scale = (avail_w / data_w).min(avail_h / data_h);
    let offset_x = padding + (avail_w - data_w * scale) / 2.0;
    let offset_y = padding + 25.0 + (avail_h - data_h * scale) / 2.0;
    let tx = |px: f64| -> f64 { (px - min_x) * scale + offset_x };
    let ty = |py: f64| -> f64 { (py - min_y) * scale + offset_y };

    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" style=\"background:#1a1a2e\">\n\
         <text x=\"{}\" y=\"20\" font-family=\"monospace\" font-size=\"13\" fill=\"#8892b0\" text-anchor=\"middle\">{title}</text>\n",
        width / 2.0
    );
    for tri in &tris {
        let [(x0, y0), (x1, y1), (x2, y2)] = tri.points.map(|(x, y)| (tx(x), ty(y)));
        let (r, g, b) = tri.fill;
        svg.push_str(&format!(
            "  <polygon points=\"{x0:.1},{y0:.1} {x1:.1},{y1:.1} {x2:.1},{y2:.1}\" \
             fill=\"rgb({r},{g},{b})\" stroke=\"#222240\" stroke-width=\"0.2\"/>\n"
        ));
    }
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" font-family=\"monospace\" font-size=\"10\" fill=\"#5a6080\" \
         text-anchor=\"middle\">{} triangles</text>\n",
        width / 2.0,
        height - 8.0,
        tris.len()
    ));
    svg.push_str("</svg>\n");
    svg
}

/// Island rectangles of the atlas, one colour per part.
fn atlas_to_svg(layout: &AtlasLayout) -> String {
    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" style=\"background:#1a1a2e\">\n",
        w = layout.width,
        h = layout.height
    );
    for island in &layout.islands {
        let (r, g, b) = part_color(island.part);
        let rect = island.rect;
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"rgb({},{},{})\" stroke=\"#8892b0\" stroke-width=\"1\"/>\n",
            rect.x, rect.y, rect.width, rect.height, r as u8, g as u8, b as u8
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-family=\"monospace\" font-size=\"12\" fill=\"#ffffff\">{}/{}</text>\n",
            rect.x + 4,
            rect.y + 14,
            island.part.name(),
            island.key
        ));
    }
    svg.push_str("</svg>\n");
    svg
}

/// Log mesh closure per part group.
fn report(part: Part, meshes: Vec<&Mesh>) {
    let merged = Mesh::merge(meshes.into_iter().cloned());
    let findings = audit(&merged, 1e-9, Severity::Warning);
    let open = findings.errors().count() == 0 && !findings.is_watertight();
    info!(
        part = part.name(),
        triangles = merged.len(),
        vertices = findings.vertex_count,
        edges = findings.edge_count,
        watertight = findings.is_watertight(),
        "part summary"
    );
    if findings.errors().count() > 0 {
        warn!(part = part.name(), errors = findings.errors().count(), "mesh audit found errors");
    } else if open {
        info!(part = part.name(), "part is open by construction");
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let out_dir = std::env::args().nth(1).unwrap_or_else(|| "obj".to_string());
    let out = Path::new(&out_dir);
    fs::create_dir_all(out)?;

    let spec = Spec::default();
    let model = generate(&spec, &GenerationConfig::default())?;

    fs::write(out.join("pooltable.mtl"), model.mtl())?;
    for part in Part::ALL {
        fs::write(out.join(format!("{}.obj", part.name())), model.obj(part)?)?;
        report(part, model.meshes(part).map(|p| &p.mesh).collect());
    }
    fs::write(out.join("pooltable.json"), serde_json::to_string_pretty(&spec.to_json())?)?;
    fs::write(out.join("metadata.json"), serde_json::to_string_pretty(&model.metadata)?)?;
    fs::write(out.join("atlas.json"), serde_json::to_string_pretty(&model.layout)?)?;
    fs::write(out.join("atlas.svg"), atlas_to_svg(&model.layout))?;
    fs::write(out.join("table.svg"), table_to_svg(&model, 900.0, 600.0, "Pool table"))?;

    info!(
        dir = %out.display(),
        atlas_width = model.layout.width,
        atlas_height = model.layout.height,
        "table written"
    );
    Ok(())
}
