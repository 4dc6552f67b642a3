use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{VoxframeError, VoxframeResult};
use crate::image::buffer::Image;
use crate::region::spatial::SpatialRegion;

/// JSON-friendly snapshot of a buffered image: its buffered region plus pixels in memory
/// order (axis 0 fastest).
///
/// This is a thin adapter for tools and tests, not a storage format.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImageDocument<P> {
    /// Region covered by `data`.
    pub region: SpatialRegion,
    /// Pixels in memory order.
    pub data: Vec<P>,
}

impl<P: Clone> ImageDocument<P> {
    /// Snapshot the buffered pixels of `image`.
    pub fn from_image(image: &Image<P>) -> VoxframeResult<Self> {
        let region = image
            .buffered_region()
            .ok_or_else(|| VoxframeError::validation("image has no buffered pixels"))?
            .clone();
        Ok(Self {
            region,
            data: image.data().to_vec(),
        })
    }
}

impl<P> ImageDocument<P> {
    /// Convert into a fully-buffered [`Image`], validating the pixel count.
    pub fn into_image(self) -> VoxframeResult<Image<P>> {
        Image::from_vec(self.region, self.data)
    }
}

impl<P: serde::de::DeserializeOwned> ImageDocument<P> {
    /// Parse a document from a JSON file.
    pub fn from_path(path: &Path) -> VoxframeResult<Self> {
        let f = std::fs::File::open(path)
            .with_context(|| format!("open image document '{}'", path.display()))?;
        let doc = serde_json::from_reader(std::io::BufReader::new(f))?;
        Ok(doc)
    }
}

impl<P: serde::Serialize> ImageDocument<P> {
    /// Write the document as JSON.
    pub fn to_path(&self, path: &Path) -> VoxframeResult<()> {
        let f = std::fs::File::create(path)
            .with_context(|| format!("create image document '{}'", path.display()))?;
        serde_json::to_writer(std::io::BufWriter::new(f), self)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/image/document.rs"]
mod tests;
