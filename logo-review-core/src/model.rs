//! Records exchanged between the search, selection and annotation stages.

use serde::{Deserialize, Serialize};

/// Robotoff logo identifier.
pub type LogoId = u64;

/// One entry of a nearest-neighbor search, in service order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeighborResult {
    pub logo_id: LogoId,
    /// Similarity distance; `0.0` means the logo itself.
    pub distance: f64,
}

impl NeighborResult {
    pub fn new(logo_id: LogoId, distance: f64) -> Self {
        Self { logo_id, distance }
    }

    /// Synthetic self match placed in front of a reference search.
    pub fn reference(logo_id: LogoId) -> Self {
        Self::new(logo_id, 0.0)
    }
}

/// Crop coordinates inside the source image: `[y_min, x_min, y_max, x_max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundingBox(pub [f64; 4]);

impl BoundingBox {
    pub fn new(y_min: f64, x_min: f64, y_max: f64, x_max: f64) -> Self {
        Self([y_min, x_min, y_max, x_max])
    }

    pub fn y_min(&self) -> f64 {
        self.0[0]
    }

    pub fn x_min(&self) -> f64 {
        self.0[1]
    }

    pub fn y_max(&self) -> f64 {
        self.0[2]
    }

    pub fn x_max(&self) -> f64 {
        self.0[3]
    }
}

/// Image metadata of one logo as returned by the logo-images lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoImageMeta {
    pub id: LogoId,
    /// Path of the full product image, relative to the product images root.
    pub source_image: String,
    pub bounding_box: BoundingBox,
    /// Annotation already stored for this logo, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation_value: Option<String>,
}

/// Image part of a loaded logo, including the derived crop URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoImage {
    pub source_image: String,
    pub bounding_box: BoundingBox,
    pub cropped_image_url: String,
}

/// A logo in the loaded result set.
///
/// `id` is unique within one loaded set, and `distance` only means something
/// relative to the search that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoRecord {
    pub id: LogoId,
    pub distance: f64,
    pub image: LogoImage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation_value: Option<String>,
    pub selected: bool,
}

impl LogoRecord {
    pub(crate) fn with_selected(&self, selected: bool) -> Self {
        Self {
            selected,
            ..self.clone()
        }
    }
}

/// The `(type, value)` label applied to every selected logo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationData {
    #[serde(rename = "type")]
    pub annotation_type: String,
    pub value: String,
}

impl AnnotationData {
    pub fn new(annotation_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            annotation_type: annotation_type.into(),
            value: value.into(),
        }
    }

    /// Nothing to submit when either half of the pair is blank.
    pub fn is_empty(&self) -> bool {
        self.annotation_type.trim().is_empty() || self.value.trim().is_empty()
    }
}

/// One line of an annotation batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRequest {
    pub logo_id: LogoId,
    #[serde(rename = "type")]
    pub annotation_type: String,
    pub value: String,
}
