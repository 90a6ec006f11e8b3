//! The pipeline's stage-to-stage data model (§3).
//!
//! Every record here is an immutable value object validated at
//! construction; stages never read or write another stage's internal
//! state, only these types.

pub mod assets;
pub mod brief;
pub mod color;
pub mod direction;
pub mod specs;
pub mod style_dna;
pub mod validation;

pub use assets::{AssetStatus, AssetsPhaseResult, DirectionAssets, LogosPhaseResult, MockupResult};
pub use brief::{Brief, LockedCopy};
pub use color::{ColorRole, ColorSwatch, HexColor};
pub use direction::{BrandDirection, BrandDirectionsOutput, OptionType};
pub use specs::{BackgroundSpec, FillStyle, LogoSpec, LogoType, PatternSpec, StrokeWeight};
pub use style_dna::{CornerTreatment, RenderingMedium, ShapeVocabulary, StyleDNA, StyleDnaFillStyle};
pub use validation::ValidationError;
