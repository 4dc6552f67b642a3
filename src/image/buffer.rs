use crate::foundation::error::{VoxframeError, VoxframeResult};
use crate::region::spatial::SpatialRegion;

/// N-dimensional pixel buffer carrying the three pipeline regions.
///
/// - largest-possible: the maximal extent the producer could ever provide
/// - requested: what a consumer currently needs (`None` until someone asks)
/// - buffered: what is resident in `data` (`None` until allocated)
///
/// Pixels are stored over the buffered region with axis 0 fastest.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<P> {
    largest: SpatialRegion,
    requested: Option<SpatialRegion>,
    buffered: Option<SpatialRegion>,
    data: Vec<P>,
}

impl<P> Image<P> {
    /// Describe an image without allocating pixels.
    pub fn new(largest: SpatialRegion) -> Self {
        Self {
            largest,
            requested: None,
            buffered: None,
            data: Vec::new(),
        }
    }

    /// Wrap fully-buffered pixel data; all three regions become `region`.
    pub fn from_vec(region: SpatialRegion, data: Vec<P>) -> VoxframeResult<Self> {
        if data.len() != region.number_of_pixels() {
            return Err(VoxframeError::validation(format!(
                "image data has {} pixels but region {region} needs {}",
                data.len(),
                region.number_of_pixels()
            )));
        }
        Ok(Self {
            largest: region.clone(),
            requested: Some(region.clone()),
            buffered: Some(region),
            data,
        })
    }

    /// Build a fully-buffered image by evaluating `f` at every index.
    pub fn from_fn(region: SpatialRegion, mut f: impl FnMut(&[i64]) -> P) -> Self {
        let mut data = Vec::with_capacity(region.number_of_pixels());
        let len = region.line_length();
        for line in 0..region.number_of_lines() {
            let mut idx = region.line_start(line);
            for k in 0..len {
                if let Some(x) = idx.first_mut() {
                    *x = region.index()[0] + k as i64;
                }
                data.push(f(&idx));
            }
        }
        Self {
            largest: region.clone(),
            requested: Some(region.clone()),
            buffered: Some(region),
            data,
        }
    }

    /// Number of dimensions.
    pub fn dimension(&self) -> usize {
        self.largest.dimension()
    }

    /// Largest region the producer could ever provide.
    pub fn largest_possible_region(&self) -> &SpatialRegion {
        &self.largest
    }

    /// Replace the largest-possible region.
    pub fn set_largest_possible_region(&mut self, region: SpatialRegion) {
        self.largest = region;
    }

    /// Region a consumer currently needs, if one was set.
    pub fn requested_region(&self) -> Option<&SpatialRegion> {
        self.requested.as_ref()
    }

    /// Record the region a consumer needs.
    pub fn set_requested_region(&mut self, region: SpatialRegion) {
        self.requested = Some(region);
    }

    /// Request everything the producer can provide.
    pub fn set_requested_region_to_largest_possible_region(&mut self) {
        self.requested = Some(self.largest.clone());
    }

    /// Forget the current request.
    pub fn clear_requested_region(&mut self) {
        self.requested = None;
    }

    /// Region resident in memory, if allocated.
    pub fn buffered_region(&self) -> Option<&SpatialRegion> {
        self.buffered.as_ref()
    }

    /// Drop resident pixels. Regions other than the buffered one are kept.
    pub fn release_data(&mut self) {
        self.buffered = None;
        self.data = Vec::new();
    }

    /// Buffered pixels in memory order.
    pub fn data(&self) -> &[P] {
        &self.data
    }

    /// Mutable buffered pixels in memory order.
    pub fn data_mut(&mut self) -> &mut [P] {
        &mut self.data
    }

    /// Consume the image and return its pixels.
    pub fn into_data(self) -> Vec<P> {
        self.data
    }

    /// Pixel at `idx`, if buffered.
    pub fn pixel(&self, idx: &[i64]) -> Option<&P> {
        let offset = self.buffered.as_ref()?.offset_of(idx)?;
        self.data.get(offset)
    }

    /// Mutable pixel at `idx`, if buffered.
    pub fn pixel_mut(&mut self, idx: &[i64]) -> Option<&mut P> {
        let offset = self.buffered.as_ref()?.offset_of(idx)?;
        self.data.get_mut(offset)
    }

    /// Overwrite the pixel at `idx`.
    pub fn set_pixel(&mut self, idx: &[i64], value: P) -> VoxframeResult<()> {
        let px = self.pixel_mut(idx).ok_or_else(|| {
            VoxframeError::validation(format!("index {idx:?} is outside the buffered region"))
        })?;
        *px = value;
        Ok(())
    }

    /// Contiguous run of `len` pixels along axis 0 starting at `start`.
    pub fn scanline(&self, start: &[i64], len: usize) -> Option<&[P]> {
        let buffered = self.buffered.as_ref()?;
        let offset = buffered.offset_of(start)?;
        let into_line = start.first().map_or(0, |&x| (x - buffered.index()[0]) as usize);
        if len > buffered.line_length() - into_line {
            return None;
        }
        self.data.get(offset..offset + len)
    }

    /// `true` when every pixel of `region` is resident.
    pub fn buffers(&self, region: &SpatialRegion) -> bool {
        self.buffered
            .as_ref()
            .is_some_and(|b| b.contains_region(region))
    }
}

impl<P: Clone + Default> Image<P> {
    /// Allocate default-valued pixels for the requested region (largest if unset).
    pub fn allocate(&mut self) {
        let region = self
            .requested
            .clone()
            .unwrap_or_else(|| self.largest.clone());
        self.allocate_region(region);
    }

    fn allocate_region(&mut self, region: SpatialRegion) {
        self.data.clear();
        self.data.resize(region.number_of_pixels(), P::default());
        self.buffered = Some(region);
    }
}

impl<P: Clone> Image<P> {
    /// Fully-buffered image of `region` with every pixel set to `value`.
    pub fn filled(region: SpatialRegion, value: P) -> Self {
        let n = region.number_of_pixels();
        Self {
            largest: region.clone(),
            requested: Some(region.clone()),
            buffered: Some(region),
            data: vec![value; n],
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/image/buffer.rs"]
mod tests;
