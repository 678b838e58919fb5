//! Product image and crop URL construction. No network access.

use crate::model::BoundingBox;

/// Builds full-resolution image URLs and Robotoff crop URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUrlBuilder {
    robotoff_url: String,
    images_url: String,
}

impl ImageUrlBuilder {
    pub fn new(robotoff_url: &str, images_url: &str) -> Self {
        Self {
            robotoff_url: robotoff_url.trim_end_matches('/').to_string(),
            images_url: images_url.trim_end_matches('/').to_string(),
        }
    }

    /// Full image URL for a `source_image` path such as `/327/019/0000/1.jpg`.
    pub fn full_image_url(&self, source_image: &str) -> String {
        if source_image.starts_with('/') {
            format!("{}/images/products{}", self.images_url, source_image)
        } else {
            format!("{}/images/products/{}", self.images_url, source_image)
        }
    }

    /// Robotoff crop endpoint for `bounding_box` inside `full_image_url`.
    pub fn cropped_image_url(&self, full_image_url: &str, bounding_box: &BoundingBox) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("image_url", full_image_url)
            .append_pair("y_min", &bounding_box.y_min().to_string())
            .append_pair("x_min", &bounding_box.x_min().to_string())
            .append_pair("y_max", &bounding_box.y_max().to_string())
            .append_pair("x_max", &bounding_box.x_max().to_string())
            .finish();
        format!("{}/images/crop?{}", self.robotoff_url, query)
    }

    /// Crop URL straight from the image path.
    pub fn crop_for(&self, source_image: &str, bounding_box: &BoundingBox) -> String {
        self.cropped_image_url(&self.full_image_url(source_image), bounding_box)
    }
}
