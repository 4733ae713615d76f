//! Subject identification from a landmark set.
//!
//! A [`SubjectId`] is a digest of the exact landmark coordinates, so it names a
//! face *pose* within a frame. Sub-pixel jitter between frames changes the
//! digest; this resolver disambiguates faces inside one frame and does not track
//! a person across frames.

use sha2::{Digest, Sha256};

use crate::config::CoordinateWidth;
use crate::error::LandmarkError;
use crate::types::{Point, SubjectId, SUBJECT_ID_LEN};

/// A landmark sequence that passed shape and range validation.
///
/// Classifiers and the resolver only ever see this type, so a short or
/// out-of-range detection never reaches them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Landmarks {
    points: Vec<Point>,
    width: CoordinateWidth,
}

impl Landmarks {
    pub fn new(
        points: Vec<Point>,
        expected: usize,
        width: CoordinateWidth,
    ) -> Result<Self, LandmarkError> {
        if points.is_empty() {
            return Err(LandmarkError::Empty);
        }
        if points.len() != expected {
            return Err(LandmarkError::WrongCount {
                expected,
                got: points.len(),
            });
        }
        if width == CoordinateWidth::Bits16 {
            for (index, value) in points.iter().flat_map(|p| [p.x, p.y]).enumerate() {
                if i16::try_from(value).is_err() {
                    return Err(LandmarkError::CoordinateOutOfRange {
                        index: index / 2,
                        value,
                        width: width.bits(),
                    });
                }
            }
        }
        Ok(Self { points, width })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Fixed-width big-endian encoding, x then y, in landmark order.
    pub fn encode(&self) -> Vec<u8> {
        let per_axis = (self.width.bits() / 8) as usize;
        let mut buf = Vec::with_capacity(self.points.len() * 2 * per_axis);
        for value in self.points.iter().flat_map(|p| [p.x, p.y]) {
            match self.width {
                // Range was checked in `new`.
                CoordinateWidth::Bits16 => buf.extend_from_slice(&(value as i16).to_be_bytes()),
                CoordinateWidth::Bits32 => buf.extend_from_slice(&value.to_be_bytes()),
            }
        }
        buf
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IdentityResolver {
    landmark_count: usize,
    width: CoordinateWidth,
}

impl IdentityResolver {
    pub fn new(landmark_count: usize, width: CoordinateWidth) -> Self {
        Self {
            landmark_count,
            width,
        }
    }

    pub fn landmarks(&self, points: Vec<Point>) -> Result<Landmarks, LandmarkError> {
        Landmarks::new(points, self.landmark_count, self.width)
    }

    pub fn resolve(&self, landmarks: &Landmarks) -> SubjectId {
        subject_id(landmarks)
    }
}

pub fn subject_id(landmarks: &Landmarks) -> SubjectId {
    let digest = Sha256::digest(landmarks.encode());
    let mut id = [0u8; SUBJECT_ID_LEN];
    id.copy_from_slice(&digest[..SUBJECT_ID_LEN]);
    SubjectId::Face(id)
}
