//! Parametric billiard table builder.
//!
//! A [`Spec`] of table dimensions goes through [`generate`]: the part
//! builders in [`parts`] construct the cushions, slate, pocket liners,
//! casing, rail tops and sight plates, [`shading`] and [`unwrap`] fill in
//! normals and texture coordinates, and [`layout`] packs every uv island
//! into one atlas. [`export`] turns the result into OBJ and MTL text.

pub mod context;
pub mod errors;
pub mod export;
pub mod layout;
pub mod metadata;
pub mod model;
pub mod parts;
pub mod shading;
pub mod spec;
pub mod unwrap;

pub use context::{BuildContext, Cushion};
pub use errors::BuildError;
pub use layout::AtlasLayout;
pub use metadata::TableMetadata;
pub use model::{GenerationConfig, TableModel, generate};
pub use parts::{Part, PartMesh, PieceKey};
pub use spec::{Spec, SpecError, SpecValue};
