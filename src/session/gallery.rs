//! Bounded, ordered store for accepted enrollment captures.

use crate::types::CapturedImage;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GalleryError {
    #[error("maximum of {max} images reached")]
    CapacityExceeded { max: usize },

    #[error("image index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("need {needed} more good-quality image(s) ({have} of {required})")]
    InsufficientQualityImages {
        have: usize,
        required: usize,
        needed: usize,
    },
}

/// Ordered set of captured images with a hard capacity and a quality floor
/// for submission eligibility. Removal and reordering have no minimum-count
/// guard; only submission checks the floor.
#[derive(Debug)]
pub struct CaptureGallery {
    images: Vec<CapturedImage>,
    max_images: usize,
    min_images: usize,
    min_quality_score: f32,
}

impl CaptureGallery {
    pub fn new(min_images: usize, max_images: usize, min_quality_score: f32) -> Self {
        Self {
            images: Vec::with_capacity(max_images),
            max_images,
            min_images,
            min_quality_score,
        }
    }

    /// Append a capture, preserving insertion order.
    pub fn append(&mut self, image: CapturedImage) -> Result<usize, GalleryError> {
        if self.images.len() >= self.max_images {
            return Err(GalleryError::CapacityExceeded {
                max: self.max_images,
            });
        }
        self.images.push(image);
        Ok(self.images.len())
    }

    /// Remove the image at `index`, shifting the rest down.
    pub fn remove(&mut self, index: usize) -> Result<CapturedImage, GalleryError> {
        if index >= self.images.len() {
            return Err(GalleryError::IndexOutOfBounds {
                index,
                len: self.images.len(),
            });
        }
        Ok(self.images.remove(index))
    }

    /// Move the image at `from` to position `to`, preserving the relative
    /// order of everything else.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), GalleryError> {
        let len = self.images.len();
        if from >= len {
            return Err(GalleryError::IndexOutOfBounds { index: from, len });
        }
        if to >= len {
            return Err(GalleryError::IndexOutOfBounds { index: to, len });
        }
        let image = self.images.remove(from);
        self.images.insert(to, image);
        Ok(())
    }

    /// Drop stored images whose score fell below the quality floor.
    /// Returns how many were removed.
    pub fn prune_low_quality(&mut self) -> usize {
        let before = self.images.len();
        let floor = self.min_quality_score;
        self.images.retain(|i| i.quality_score >= floor);
        before - self.images.len()
    }

    /// Images counting toward the submission minimum.
    pub fn qualifying_count(&self) -> usize {
        self.images
            .iter()
            .filter(|i| i.quality_score >= self.min_quality_score)
            .count()
    }

    /// Check the submission precondition, reporting exactly how many more
    /// qualifying images are needed.
    pub fn check_submittable(&self) -> Result<(), GalleryError> {
        let have = self.qualifying_count();
        if have < self.min_images {
            return Err(GalleryError::InsufficientQualityImages {
                have,
                required: self.min_images,
                needed: self.min_images - have,
            });
        }
        Ok(())
    }

    pub fn images(&self) -> &[CapturedImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.images.len() >= self.max_images
    }

    pub fn max_images(&self) -> usize {
        self.max_images
    }

    pub fn min_images(&self) -> usize {
        self.min_images
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }
}
