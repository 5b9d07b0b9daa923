//! Table constants.
//!
//! Every length is in metres and every angle in radians. A [`Spec`] holds the
//! independent constants; the cushion profile and rail height are derived
//! from them on demand and can be read but never set.

use std::collections::BTreeMap;
use std::f64::consts::{FRAC_1_SQRT_2, PI, SQRT_2};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const INCH: f64 = 0.0254;
pub const DEGREE: f64 = PI / 180.0;

/// Relative tolerance when a table restates a derived constant.
const DERIVED_TOLERANCE: f64 = 1e-9;

/// Constants computed from the others.
pub const DERIVED_CONSTANTS: [&str; 5] = [
    "CUSHION_NOSE_HEIGHT",
    "CUSHION_NOSE_ANGLE",
    "CUSHION_BED_ANGLE",
    "CUSHION_SLOPE",
    "TABLE_RAIL_HEIGHT",
];

/// Human-readable notes written next to the constants in the JSON table.
const COMMENTS: &[(&str, &str)] = &[
    (
        "GENERAL",
        "SI units, angles in radians. Sources: WPA equipment specifications (wpapool.com/equipment-specifications), BCA equipment specifications 2008.",
    ),
    ("BALL_RADIUS", "Ball radius, WPA: 0.5 * 2.25 in."),
    ("BALL_MASS", "Ball mass."),
    ("CUSHION_WIDTH", "Width of the cloth-covered cushion seen from above, WPA: [1.875, 2] in."),
    (
        "CUSHION_NOSE_HEIGHT",
        "Height of the cushion nose, about 1.43 in. WPA: [62.5%, 64.5%] of the ball diameter, BCA: [63.2%, 65.277%].",
    ),
    ("CUSHION_RUBBER_BASE_LENGTH", "K66 rubber base length, the side against the cushion."),
    ("CUSHION_RUBBER_SIDE_LENGTH", "K66 rubber side length, top and bottom."),
    (
        "CUSHION_K66_PROFILE_ANGLE",
        "Angle between the K66 rubber base and the vertical, 16 to 27 degrees.",
    ),
    ("CUSHION_NOSE_ANGLE", "Angle at the cushion nose between the rubber base points."),
    ("CUSHION_BED_ANGLE", "Angle between the cushion and the table bed."),
    ("CUSHION_SLOPE", "Small angle between the cushion top and the horizon."),
    (
        "CORNER_POCKET_MOUTH",
        "Corner pocket mouth, nose to nose. WPA: [4.5, 4.625] in, BCA: [4.875, 5.125] in.",
    ),
    ("CORNER_POCKET_HORIZONTAL_ANGLE", "Horizontal cut angle of the corner pocket, WPA and BCA: 142 degrees."),
    ("CORNER_POCKET_SHELF", "Corner pocket shelf depth, WPA: [1, 2.25] in, BCA: [1.625, 1.875] in."),
    ("CORNER_POCKET_RADIUS", "Radius of the corner pocket fall circle."),
    ("CORNER_POCKET_VERTICAL_ANGLE", "Vertical cut angle, WPA: [12, 15] degrees, BCA: 12 degrees."),
    ("CORNER_POCKET_LINER_DEPTH_OFFSET", "Moves the pocket liner arc deeper or shallower, default -1 in."),
    (
        "SIDE_POCKET_MOUTH",
        "Side pocket mouth, nose to nose, usually the corner mouth plus 0.5 in. WPA: [5, 5.125] in, BCA: [5.375, 5.625] in.",
    ),
    ("SIDE_POCKET_HORIZONTAL_ANGLE", "Horizontal cut angle of the side pocket, WPA: 104 degrees, BCA: 103 degrees."),
    ("SIDE_POCKET_SHELF", "Side pocket shelf depth, WPA and BCA: [0, 0.375] in."),
    ("SIDE_POCKET_RADIUS", "Radius of the side pocket fall circle."),
    ("SIDE_POCKET_VERTICAL_ANGLE", "Vertical cut angle, WPA and BCA: [12, 15] degrees."),
    ("SIDE_POCKET_LINER_DEPTH_OFFSET", "Moves the pocket liner arc deeper or shallower, default -1 in."),
    (
        "TABLE_LENGTH",
        "Nose to nose length, WPA: 100 in for a 9-foot table. The width is half the length.",
    ),
    ("TABLE_HEIGHT", "Table bed height from the floor, WPA: [29.25, 31] in, BCA: 30 in."),
    ("TABLE_RAIL_WIDTH", "Rail width including cloth, WPA: [4, 7.5] in."),
    (
        "TABLE_SLATE_DROP_POINT_RADIUS",
        "Rounding of the slate edge between the vertical pocket cut and the playing surface, BCA: [0.125, 0.25] in.",
    ),
    ("TABLE_SLATE_THICKNESS", "Slate thickness, WPA: at least 1 in."),
    ("TABLE_RAIL_HEIGHT", "Rail height above the bed, 1.6 in for a 23 degree K66 profile angle."),
    ("TABLE_SIGHTS_DEPTH", "Distance from the cushion nose to the sight centres, WPA: 3 11/16 in (+1/8 in)."),
    (
        "TABLE_RAIL_SIGHTS_BLOCK",
        "Where the sights plate starts: distance along x from 0 at B2, and from the cushion C nose at B3.",
    ),
    ("TABLE_RAIL_SIGHTS_RADIUS", "Radius of round sights, WPA: diameter between 7/16 in and 1/2 in."),
    ("TABLE_POCKET_LINER_WIDTH", "Width of the pocket liner visible from above."),
    ("TABLE_POCKET_LINER_NUM_POINTS", "Points on each pocket liner arc segment."),
    (
        "TABLE_SLATE_NUM_POINTS",
        "Vertical slices of the slate edge rounding, and points on each pocket arc.",
    ),
    (
        "TABLE_CASING_NUM_POINTS",
        "Points on the rounded casing corners, and points on the casing bevel.",
    ),
    ("UV_TEXTURE_GAP", "Pixels left around every uv island against colour bleeding from JPEG artifacts."),
    ("UV_PIXELS_PER_METER", "Base resolution of the texture atlas."),
    ("UV_ENHANCE_FACTOR", "Resolution multipliers for the prominent parts."),
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpecError {
    #[error("unknown constant {0}")]
    UnknownConstant(String),
    #[error("{0} is derived from other constants and cannot be set")]
    DerivedConstant(String),
    #[error("{constant} expects {expected}")]
    WrongShape { constant: String, expected: &'static str },
    #[error("{constant} must be positive, got {value}")]
    NonPositive { constant: String, value: f64 },
    #[error("invalid {constant}: {reason}")]
    Infeasible { constant: String, reason: String },
    #[error("spec table is not valid JSON: {0}")]
    Parse(String),
}

impl SpecError {
    pub fn infeasible(constant: &str, reason: impl Into<String>) -> Self {
        Self::Infeasible {
            constant: constant.to_string(),
            reason: reason.into(),
        }
    }

    /// Name of the constant the error is about, if any.
    pub fn constant(&self) -> Option<&str> {
        match self {
            Self::UnknownConstant(name) | Self::DerivedConstant(name) => Some(name),
            Self::WrongShape { constant, .. }
            | Self::NonPositive { constant, .. }
            | Self::Infeasible { constant, .. } => Some(constant),
            Self::Parse(_) => None,
        }
    }
}

/// One table entry: a scalar or a pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecValue {
    Number(f64),
    Pair(f64, f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PocketKind {
    Corner,
    Side,
}

impl PocketKind {
    /// Pockets are numbered 1 to 6 clockwise from the top left; 2 and 5
    /// are the side pockets.
    pub fn of(pocket: usize) -> Self {
        if pocket == 2 || pocket == 5 {
            Self::Side
        } else {
            Self::Corner
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            Self::Corner => "CORNER",
            Self::Side => "SIDE",
        }
    }
}

/// Cut of one pocket type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PocketSpec {
    /// Nose to nose distance.
    pub mouth: f64,
    pub horizontal_angle: f64,
    pub shelf: f64,
    /// Radius of the fall circle cut into the bed.
    pub radius: f64,
    pub vertical_angle: f64,
    pub liner_depth_offset: f64,
}

impl PocketSpec {
    const FIELDS: [&'static str; 6] = [
        "MOUTH",
        "HORIZONTAL_ANGLE",
        "SHELF",
        "RADIUS",
        "VERTICAL_ANGLE",
        "LINER_DEPTH_OFFSET",
    ];

    fn field_mut(&mut self, field: &str) -> Option<&mut f64> {
        match field {
            "MOUTH" => Some(&mut self.mouth),
            "HORIZONTAL_ANGLE" => Some(&mut self.horizontal_angle),
            "SHELF" => Some(&mut self.shelf),
            "RADIUS" => Some(&mut self.radius),
            "VERTICAL_ANGLE" => Some(&mut self.vertical_angle),
            "LINER_DEPTH_OFFSET" => Some(&mut self.liner_depth_offset),
            _ => None,
        }
    }

    fn values(&self) -> [f64; 6] {
        [
            self.mouth,
            self.horizontal_angle,
            self.shelf,
            self.radius,
            self.vertical_angle,
            self.liner_depth_offset,
        ]
    }
}

/// Independent constants of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spec {
    pub ball_radius: f64,
    pub ball_mass: f64,
    pub cushion_width: f64,
    pub cushion_rubber_base_length: f64,
    pub cushion_rubber_side_length: f64,
    pub cushion_k66_profile_angle: f64,
    pub corner_pocket: PocketSpec,
    pub side_pocket: PocketSpec,
    pub table_length: f64,
    pub table_height: f64,
    pub rail_width: f64,
    pub slate_drop_point_radius: f64,
    pub slate_thickness: f64,
    pub sights_depth: f64,
    /// Sights plate offsets at B2 and at B3.
    pub rail_sights_block: (f64, f64),
    pub rail_sights_radius: f64,
    pub pocket_liner_width: f64,
    pub casing_vertical_angle: f64,
    pub casing_height: f64,
    pub casing_edge_radius: f64,
    pub casing_bevel_radius: f64,
    pub pocket_liner_num_points: usize,
    /// Slices of the slate edge rounding, points per pocket arc.
    pub slate_num_points: (usize, usize),
    /// Points per casing corner quarter, points on the bevel.
    pub casing_num_points: (usize, usize),
    pub uv_texture_gap: u32,
    pub uv_pixels_per_meter: f64,
    pub uv_enhance_factor: (f64, f64),
}

impl Default for Spec {
    /// A 9-foot WPA table.
    fn default() -> Self {
        let corner_pocket = PocketSpec {
            mouth: 4.625 * INCH,
            horizontal_angle: 142.0 * DEGREE,
            shelf: 1.5 * INCH,
            radius: 3.25 * INCH,
            vertical_angle: 12.0 * DEGREE,
            liner_depth_offset: -1.0 * INCH,
        };
        let table_length = 100.0 * INCH;
        Self {
            ball_radius: 0.5 * 2.25 * INCH,
            ball_mass: 0.163,
            cushion_width: 2.0 * INCH,
            cushion_rubber_base_length: (1.0 + 3.0 / 16.0) * INCH,
            cushion_rubber_side_length: (1.0 + 1.0 / 8.0) * INCH,
            cushion_k66_profile_angle: 23.0 * DEGREE,
            corner_pocket,
            side_pocket: PocketSpec {
                mouth: corner_pocket.mouth + 0.5 * INCH,
                horizontal_angle: 104.0 * DEGREE,
                shelf: 0.1875 * INCH,
                radius: 3.25 * INCH,
                vertical_angle: 12.0 * DEGREE,
                liner_depth_offset: -1.0 * INCH,
            },
            table_length,
            table_height: 30.0 * INCH,
            rail_width: 7.0 * INCH,
            slate_drop_point_radius: 0.25 * INCH,
            slate_thickness: 1.0 * INCH,
            sights_depth: (3.0 + 11.0 / 16.0) * INCH,
            rail_sights_block: (0.3 * table_length / 8.0, 0.3 * table_length / 8.0),
            rail_sights_radius: 0.25 * INCH,
            pocket_liner_width: 0.5 * INCH,
            casing_vertical_angle: 15.0 * DEGREE,
            casing_height: 10.0 * INCH,
            casing_edge_radius: 8.0 * INCH,
            casing_bevel_radius: 0.5 * INCH,
            pocket_liner_num_points: 10,
            slate_num_points: (3, 10),
            casing_num_points: (5, 5),
            uv_texture_gap: 8,
            uv_pixels_per_meter: 128.0,
            uv_enhance_factor: (4.0, 8.0),
        }
    }
}

impl Spec {
    pub fn pocket(&self, kind: PocketKind) -> &PocketSpec {
        match kind {
            PocketKind::Corner => &self.corner_pocket,
            PocketKind::Side => &self.side_pocket,
        }
    }

    // ------------------------------------------------------------------
    // Derived constants
    // ------------------------------------------------------------------

    pub fn cushion_nose_height(&self) -> f64 {
        2.0 * 0.635 * self.ball_radius
    }

    /// Apex angle of the K66 rubber triangle.
    pub fn cushion_nose_angle(&self) -> f64 {
        2.0 * (0.5 * self.cushion_rubber_base_length / self.cushion_rubber_side_length).asin()
    }

    pub fn cushion_bed_angle(&self) -> f64 {
        0.5 * self.cushion_nose_angle() + self.cushion_k66_profile_angle
    }

    pub fn cushion_slope(&self) -> f64 {
        0.5 * self.cushion_nose_angle() - self.cushion_k66_profile_angle
    }

    pub fn rail_height(&self) -> f64 {
        self.cushion_nose_height() + self.cushion_rubber_side_length * self.cushion_slope().sin()
    }

    fn derived(&self, name: &str) -> Option<f64> {
        match name {
            "CUSHION_NOSE_HEIGHT" => Some(self.cushion_nose_height()),
            "CUSHION_NOSE_ANGLE" => Some(self.cushion_nose_angle()),
            "CUSHION_BED_ANGLE" => Some(self.cushion_bed_angle()),
            "CUSHION_SLOPE" => Some(self.cushion_slope()),
            "TABLE_RAIL_HEIGHT" => Some(self.rail_height()),
            _ => None,
        }
    }

    /// Centre of the side pocket fall circle at pocket 2, in the bed plane.
    pub(crate) fn side_fall_center_y(&self) -> f64 {
        self.table_length / 4.0 + self.side_pocket.radius + self.side_pocket.shelf
    }

    /// x of the corner pocket fall circle centre at pocket 3.
    pub(crate) fn corner_fall_center_x(&self) -> f64 {
        let mouth_x = self.table_length / 2.0 - 0.5 * self.corner_pocket.mouth * FRAC_1_SQRT_2;
        mouth_x + (self.corner_pocket.radius + self.corner_pocket.shelf) * FRAC_1_SQRT_2
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Check that the constants describe a table the builders can make.
    /// Errors name the constant to change.
    pub fn validate(&self) -> Result<(), SpecError> {
        let positive = [
            ("BALL_RADIUS", self.ball_radius),
            ("BALL_MASS", self.ball_mass),
            ("CUSHION_WIDTH", self.cushion_width),
            ("CUSHION_RUBBER_BASE_LENGTH", self.cushion_rubber_base_length),
            ("CUSHION_RUBBER_SIDE_LENGTH", self.cushion_rubber_side_length),
            ("CORNER_POCKET_MOUTH", self.corner_pocket.mouth),
            ("CORNER_POCKET_HORIZONTAL_ANGLE", self.corner_pocket.horizontal_angle),
            ("CORNER_POCKET_RADIUS", self.corner_pocket.radius),
            ("SIDE_POCKET_MOUTH", self.side_pocket.mouth),
            ("SIDE_POCKET_HORIZONTAL_ANGLE", self.side_pocket.horizontal_angle),
            ("SIDE_POCKET_RADIUS", self.side_pocket.radius),
            ("TABLE_LENGTH", self.table_length),
            ("TABLE_HEIGHT", self.table_height),
            ("TABLE_RAIL_WIDTH", self.rail_width),
            ("TABLE_SLATE_DROP_POINT_RADIUS", self.slate_drop_point_radius),
            ("TABLE_SLATE_THICKNESS", self.slate_thickness),
            ("TABLE_SIGHTS_DEPTH", self.sights_depth),
            ("TABLE_RAIL_SIGHTS_BLOCK", self.rail_sights_block.0),
            ("TABLE_RAIL_SIGHTS_BLOCK", self.rail_sights_block.1),
            ("TABLE_RAIL_SIGHTS_RADIUS", self.rail_sights_radius),
            ("TABLE_POCKET_LINER_WIDTH", self.pocket_liner_width),
            ("TABLE_CASING_HEIGHT", self.casing_height),
            ("TABLE_CASING_EDGE_RADIUS", self.casing_edge_radius),
            ("TABLE_CASING_BEVEL_RADIUS", self.casing_bevel_radius),
            ("UV_PIXELS_PER_METER", self.uv_pixels_per_meter),
            ("UV_ENHANCE_FACTOR", self.uv_enhance_factor.0),
            ("UV_ENHANCE_FACTOR", self.uv_enhance_factor.1),
        ];
        for (constant, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(SpecError::NonPositive {
                    constant: constant.to_string(),
                    value,
                });
            }
        }
        for (constant, value) in [
            ("CORNER_POCKET_SHELF", self.corner_pocket.shelf),
            ("SIDE_POCKET_SHELF", self.side_pocket.shelf),
        ] {
            if !(value >= 0.0) {
                return Err(SpecError::infeasible(constant, format!("shelf depth {value} is negative")));
            }
        }

        let counts = [
            ("TABLE_POCKET_LINER_NUM_POINTS", self.pocket_liner_num_points, 2),
            ("TABLE_SLATE_NUM_POINTS", self.slate_num_points.0, 2),
            ("TABLE_SLATE_NUM_POINTS", self.slate_num_points.1, 2),
            ("TABLE_CASING_NUM_POINTS", self.casing_num_points.0, 1),
            ("TABLE_CASING_NUM_POINTS", self.casing_num_points.1, 2),
        ];
        for (constant, value, min) in counts {
            if value < min {
                return Err(SpecError::infeasible(
                    constant,
                    format!("needs at least {min} points, got {value}"),
                ));
            }
        }

        if self.cushion_rubber_base_length >= 2.0 * self.cushion_rubber_side_length {
            return Err(SpecError::infeasible(
                "CUSHION_RUBBER_BASE_LENGTH",
                "rubber base must be shorter than two rubber sides",
            ));
        }
        if self.casing_bevel_radius >= self.casing_edge_radius {
            return Err(SpecError::infeasible(
                "TABLE_CASING_BEVEL_RADIUS",
                "bevel must be smaller than the casing edge radius",
            ));
        }

        let r = self.slate_drop_point_radius;
        if self.slate_thickness < 2.0 * r {
            return Err(SpecError::infeasible(
                "TABLE_SLATE_THICKNESS",
                "slate is thinner than twice the drop point radius",
            ));
        }
        if r >= self.corner_pocket.radius.min(self.side_pocket.radius) {
            return Err(SpecError::infeasible(
                "TABLE_SLATE_DROP_POINT_RADIUS",
                "drop point radius must be smaller than both pocket radii",
            ));
        }

        // The fall circles must reach the rail box, and the fully rounded
        // slate slice must still cut it.
        let x_rail = self.table_length / 2.0 + self.cushion_width;
        let y_rail = self.table_length / 4.0 + self.cushion_width;
        let side_y = self.side_fall_center_y();
        let corner_x = self.corner_fall_center_x();
        if side_y < y_rail {
            return Err(SpecError::infeasible(
                "SIDE_POCKET_RADIUS",
                "side pocket fall circle does not reach the rail box",
            ));
        }
        if corner_x < x_rail - SQRT_2 * self.corner_pocket.radius {
            return Err(SpecError::infeasible(
                "CORNER_POCKET_RADIUS",
                "corner pocket fall circle does not reach the rail box",
            ));
        }
        if side_y > y_rail + self.side_pocket.radius - r {
            return Err(SpecError::infeasible(
                "SIDE_POCKET_SHELF",
                "side pocket fall circle misses the slate after edge rounding",
            ));
        }
        if corner_x > x_rail + (self.corner_pocket.radius - r) * FRAC_1_SQRT_2 {
            return Err(SpecError::infeasible(
                "CORNER_POCKET_SHELF",
                "corner pocket fall circle misses the slate after edge rounding",
            ));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Table import and export
    // ------------------------------------------------------------------

    /// Every constant by name, derived ones included.
    pub fn to_table(&self) -> BTreeMap<String, SpecValue> {
        use SpecValue::{Number, Pair};

        let mut table = BTreeMap::new();
        let mut put = |name: &str, value: SpecValue| {
            table.insert(name.to_string(), value);
        };
        put("BALL_RADIUS", Number(self.ball_radius));
        put("BALL_MASS", Number(self.ball_mass));
        put("CUSHION_WIDTH", Number(self.cushion_width));
        put("CUSHION_RUBBER_BASE_LENGTH", Number(self.cushion_rubber_base_length));
        put("CUSHION_RUBBER_SIDE_LENGTH", Number(self.cushion_rubber_side_length));
        put("CUSHION_K66_PROFILE_ANGLE", Number(self.cushion_k66_profile_angle));
        for kind in [PocketKind::Corner, PocketKind::Side] {
            let pocket = self.pocket(kind);
            for (field, value) in PocketSpec::FIELDS.iter().zip(pocket.values()) {
                put(&format!("{}_POCKET_{field}", kind.prefix()), Number(value));
            }
        }
        put("TABLE_LENGTH", Number(self.table_length));
        put("TABLE_HEIGHT", Number(self.table_height));
        put("TABLE_RAIL_WIDTH", Number(self.rail_width));
        put("TABLE_SLATE_DROP_POINT_RADIUS", Number(self.slate_drop_point_radius));
        put("TABLE_SLATE_THICKNESS", Number(self.slate_thickness));
        put("TABLE_SIGHTS_DEPTH", Number(self.sights_depth));
        put(
            "TABLE_RAIL_SIGHTS_BLOCK",
            Pair(self.rail_sights_block.0, self.rail_sights_block.1),
        );
        put("TABLE_RAIL_SIGHTS_RADIUS", Number(self.rail_sights_radius));
        put("TABLE_POCKET_LINER_WIDTH", Number(self.pocket_liner_width));
        put("TABLE_CASING_VERTICAL_ANGLE", Number(self.casing_vertical_angle));
        put("TABLE_CASING_HEIGHT", Number(self.casing_height));
        put("TABLE_CASING_EDGE_RADIUS", Number(self.casing_edge_radius));
        put("TABLE_CASING_BEVEL_RADIUS", Number(self.casing_bevel_radius));
        put(
            "TABLE_POCKET_LINER_NUM_POINTS",
            Number(self.pocket_liner_num_points as f64),
        );
        put(
            "TABLE_SLATE_NUM_POINTS",
            Pair(self.slate_num_points.0 as f64, self.slate_num_points.1 as f64),
        );
        put(
            "TABLE_CASING_NUM_POINTS",
            Pair(self.casing_num_points.0 as f64, self.casing_num_points.1 as f64),
        );
        put("UV_TEXTURE_GAP", Number(self.uv_texture_gap as f64));
        put("UV_PIXELS_PER_METER", Number(self.uv_pixels_per_meter));
        put(
            "UV_ENHANCE_FACTOR",
            Pair(self.uv_enhance_factor.0, self.uv_enhance_factor.1),
        );
        for name in DERIVED_CONSTANTS {
            if let Some(value) = self.derived(name) {
                put(name, Number(value));
            }
        }
        table
    }

    /// Reference table overridden by the entries of `table`.
    ///
    /// Derived constants may appear only with the value the other entries
    /// imply, so an exported table reads back unchanged.
    pub fn from_table(table: &BTreeMap<String, SpecValue>) -> Result<Self, SpecError> {
        let mut spec = Self::default();
        let mut restated = Vec::new();
        for (name, value) in table {
            if DERIVED_CONSTANTS.contains(&name.as_str()) {
                restated.push((name, value));
            } else {
                spec.set(name, value)?;
            }
        }
        for (name, value) in restated {
            let given = number(name, value)?;
            let implied = spec.derived(name).unwrap_or(f64::NAN);
            if !((given - implied).abs() <= DERIVED_TOLERANCE * implied.abs().max(1.0)) {
                return Err(SpecError::DerivedConstant(name.clone()));
            }
        }
        Ok(spec)
    }

    fn set(&mut self, name: &str, value: &SpecValue) -> Result<(), SpecError> {
        let pocket_field = name
            .strip_prefix("CORNER_POCKET_")
            .map(|field| (PocketKind::Corner, field))
            .or_else(|| name.strip_prefix("SIDE_POCKET_").map(|field| (PocketKind::Side, field)));
        if let Some((kind, field)) = pocket_field {
            let pocket = match kind {
                PocketKind::Corner => &mut self.corner_pocket,
                PocketKind::Side => &mut self.side_pocket,
            };
            let slot = pocket
                .field_mut(field)
                .ok_or_else(|| SpecError::UnknownConstant(name.to_string()))?;
            *slot = number(name, value)?;
            return Ok(());
        }

        match name {
            "BALL_RADIUS" => self.ball_radius = number(name, value)?,
            "BALL_MASS" => self.ball_mass = number(name, value)?,
            "CUSHION_WIDTH" => self.cushion_width = number(name, value)?,
            "CUSHION_RUBBER_BASE_LENGTH" => self.cushion_rubber_base_length = number(name, value)?,
            "CUSHION_RUBBER_SIDE_LENGTH" => self.cushion_rubber_side_length = number(name, value)?,
            "CUSHION_K66_PROFILE_ANGLE" => self.cushion_k66_profile_angle = number(name, value)?,
            "TABLE_LENGTH" => self.table_length = number(name, value)?,
            "TABLE_HEIGHT" => self.table_height = number(name, value)?,
            "TABLE_RAIL_WIDTH" => self.rail_width = number(name, value)?,
            "TABLE_SLATE_DROP_POINT_RADIUS" => self.slate_drop_point_radius = number(name, value)?,
            "TABLE_SLATE_THICKNESS" => self.slate_thickness = number(name, value)?,
            "TABLE_SIGHTS_DEPTH" => self.sights_depth = number(name, value)?,
            "TABLE_RAIL_SIGHTS_BLOCK" => self.rail_sights_block = pair(name, value)?,
            "TABLE_RAIL_SIGHTS_RADIUS" => self.rail_sights_radius = number(name, value)?,
            "TABLE_POCKET_LINER_WIDTH" => self.pocket_liner_width = number(name, value)?,
            "TABLE_CASING_VERTICAL_ANGLE" => self.casing_vertical_angle = number(name, value)?,
            "TABLE_CASING_HEIGHT" => self.casing_height = number(name, value)?,
            "TABLE_CASING_EDGE_RADIUS" => self.casing_edge_radius = number(name, value)?,
            "TABLE_CASING_BEVEL_RADIUS" => self.casing_bevel_radius = number(name, value)?,
            "TABLE_POCKET_LINER_NUM_POINTS" => self.pocket_liner_num_points = count(name, value)?,
            "TABLE_SLATE_NUM_POINTS" => self.slate_num_points = count_pair(name, value)?,
            "TABLE_CASING_NUM_POINTS" => self.casing_num_points = count_pair(name, value)?,
            "UV_TEXTURE_GAP" => {
                self.uv_texture_gap = u32::try_from(count(name, value)?).map_err(|_| {
                    SpecError::WrongShape {
                        constant: name.to_string(),
                        expected: "a pixel count",
                    }
                })?
            }
            "UV_PIXELS_PER_METER" => self.uv_pixels_per_meter = number(name, value)?,
            "UV_ENHANCE_FACTOR" => self.uv_enhance_factor = pair(name, value)?,
            _ => return Err(SpecError::UnknownConstant(name.to_string())),
        }
        Ok(())
    }

    /// The table as a JSON object with a `COMMENTS` object of notes.
    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        for (name, value) in self.to_table() {
            let value = match value {
                SpecValue::Number(x) => serde_json::json!(x),
                SpecValue::Pair(a, b) => serde_json::json!([a, b]),
            };
            object.insert(name, value);
        }
        let comments: serde_json::Map<String, serde_json::Value> = COMMENTS
            .iter()
            .map(|(name, text)| (name.to_string(), serde_json::Value::from(*text)))
            .collect();
        object.insert("COMMENTS".to_string(), serde_json::Value::Object(comments));
        serde_json::Value::Object(object)
    }

    /// Read a JSON table as written by [`Spec::to_json`]; `COMMENTS` is
    /// ignored.
    pub fn from_json(text: &str) -> Result<Self, SpecError> {
        let raw: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(text).map_err(|err| SpecError::Parse(err.to_string()))?;
        let mut table = BTreeMap::new();
        for (name, value) in raw {
            if name == "COMMENTS" {
                continue;
            }
            let value: SpecValue = serde_json::from_value(value).map_err(|_| SpecError::WrongShape {
                constant: name.clone(),
                expected: "a number or a pair of numbers",
            })?;
            table.insert(name, value);
        }
        Self::from_table(&table)
    }
}

/// Note for a constant, as written into the JSON table.
pub fn comment(name: &str) -> Option<&'static str> {
    COMMENTS.iter().find(|(n, _)| *n == name).map(|(_, text)| *text)
}

fn number(name: &str, value: &SpecValue) -> Result<f64, SpecError> {
    match value {
        SpecValue::Number(x) => Ok(*x),
        SpecValue::Pair(..) => Err(SpecError::WrongShape {
            constant: name.to_string(),
            expected: "a number",
        }),
    }
}

fn pair(name: &str, value: &SpecValue) -> Result<(f64, f64), SpecError> {
    match value {
        SpecValue::Pair(a, b) => Ok((*a, *b)),
        SpecValue::Number(_) => Err(SpecError::WrongShape {
            constant: name.to_string(),
            expected: "a pair of numbers",
        }),
    }
}

fn to_count(name: &str, x: f64) -> Result<usize, SpecError> {
    if x.is_finite() && x >= 0.0 && x.fract() == 0.0 {
        Ok(x as usize)
    } else {
        Err(SpecError::WrongShape {
            constant: name.to_string(),
            expected: "a non-negative integer",
        })
    }
}

fn count(name: &str, value: &SpecValue) -> Result<usize, SpecError> {
    to_count(name, number(name, value)?)
}

fn count_pair(name: &str, value: &SpecValue) -> Result<(usize, usize), SpecError> {
    let (a, b) = pair(name, value)?;
    Ok((to_count(name, a)?, to_count(name, b)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_table_is_valid() {
        let spec = Spec::default();
        spec.validate().unwrap();
        // About 1.6 in for a 23 degree profile angle.
        assert!((spec.rail_height() / INCH - 1.6).abs() < 0.01, "{}", spec.rail_height() / INCH);
        assert!((spec.cushion_nose_angle() / DEGREE - 63.71).abs() < 0.01);
        assert!(spec.cushion_slope() > 0.0);
    }

    #[test]
    fn test_table_round_trip() {
        let spec = Spec::default();
        let table = spec.to_table();
        assert_eq!(table.len(), 42);
        assert_eq!(table["TABLE_SLATE_NUM_POINTS"], SpecValue::Pair(3.0, 10.0));
        assert_eq!(Spec::from_table(&table).unwrap(), spec);
    }

    #[test]
    fn test_json_round_trip_skips_comments() {
        let spec = Spec {
            table_length: 88.0 * INCH,
            rail_sights_block: (0.1, 0.1),
            ..Spec::default()
        };
        let text = serde_json::to_string_pretty(&spec.to_json()).unwrap();
        assert!(text.contains("\"COMMENTS\""));
        assert_eq!(Spec::from_json(&text).unwrap(), spec);
    }

    #[test]
    fn test_partial_table_overrides_defaults() {
        let table = BTreeMap::from([
            ("CORNER_POCKET_MOUTH".to_string(), SpecValue::Number(0.12)),
            ("UV_TEXTURE_GAP".to_string(), SpecValue::Number(4.0)),
        ]);
        let spec = Spec::from_table(&table).unwrap();
        assert_eq!(spec.corner_pocket.mouth, 0.12);
        assert_eq!(spec.uv_texture_gap, 4);
        assert_eq!(spec.table_length, Spec::default().table_length);
    }

    #[test]
    fn test_unknown_and_malformed_entries() {
        let unknown = BTreeMap::from([("TABLE_COLOR".to_string(), SpecValue::Number(1.0))]);
        assert_eq!(
            Spec::from_table(&unknown),
            Err(SpecError::UnknownConstant("TABLE_COLOR".to_string()))
        );

        let unknown_pocket = BTreeMap::from([("SIDE_POCKET_DEPTH".to_string(), SpecValue::Number(1.0))]);
        assert!(matches!(
            Spec::from_table(&unknown_pocket),
            Err(SpecError::UnknownConstant(name)) if name == "SIDE_POCKET_DEPTH"
        ));

        let shape = BTreeMap::from([("TABLE_LENGTH".to_string(), SpecValue::Pair(1.0, 2.0))]);
        assert!(matches!(
            Spec::from_table(&shape),
            Err(SpecError::WrongShape { constant, .. }) if constant == "TABLE_LENGTH"
        ));

        let fractional = BTreeMap::from([(
            "TABLE_POCKET_LINER_NUM_POINTS".to_string(),
            SpecValue::Number(2.5),
        )]);
        assert!(matches!(
            Spec::from_table(&fractional),
            Err(SpecError::WrongShape { constant, .. }) if constant == "TABLE_POCKET_LINER_NUM_POINTS"
        ));
    }

    #[test]
    fn test_derived_constant_cannot_be_changed() {
        let mut table = Spec::default().to_table();
        table.insert("TABLE_RAIL_HEIGHT".to_string(), SpecValue::Number(0.05));
        assert_eq!(
            Spec::from_table(&table),
            Err(SpecError::DerivedConstant("TABLE_RAIL_HEIGHT".to_string()))
        );
    }

    #[test]
    fn test_small_corner_radius_is_infeasible() {
        let mut spec = Spec::default();
        spec.corner_pocket.radius = 0.02;
        let err = spec.validate().unwrap_err();
        assert_eq!(err.constant(), Some("CORNER_POCKET_RADIUS"));
        assert!(matches!(err, SpecError::Infeasible { .. }));
    }

    #[test]
    fn test_thin_slate_is_infeasible() {
        let spec = Spec {
            slate_thickness: 0.01,
            ..Spec::default()
        };
        assert_eq!(spec.validate().unwrap_err().constant(), Some("TABLE_SLATE_THICKNESS"));
    }

    #[test]
    fn test_deep_side_shelf_is_infeasible() {
        let mut spec = Spec::default();
        spec.side_pocket.shelf = 0.1;
        assert_eq!(spec.validate().unwrap_err().constant(), Some("SIDE_POCKET_SHELF"));
    }

    #[test]
    fn test_non_positive_length() {
        let spec = Spec {
            table_length: 0.0,
            ..Spec::default()
        };
        assert!(matches!(
            spec.validate(),
            Err(SpecError::NonPositive { constant, .. }) if constant == "TABLE_LENGTH"
        ));
    }

    #[test]
    fn test_too_few_points() {
        let spec = Spec {
            slate_num_points: (1, 10),
            ..Spec::default()
        };
        assert_eq!(spec.validate().unwrap_err().constant(), Some("TABLE_SLATE_NUM_POINTS"));
    }

    #[test]
    fn test_comments_cover_named_constants() {
        assert!(comment("GENERAL").is_some());
        for name in Spec::default().to_table().keys() {
            if !name.starts_with("TABLE_CASING_") || name == "TABLE_CASING_NUM_POINTS" {
                assert!(comment(name).is_some(), "{name}");
            }
        }
    }
}
