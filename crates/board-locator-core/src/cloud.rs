use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Per-pixel access to 3D coordinates of an organized (image-aligned) cloud.
///
/// Implementors decide their own memory layout; the geometric pipeline only
/// needs to know whether a pixel carries a valid 3D return and where it is.
pub trait PointLookup {
    fn width(&self) -> usize;
    fn height(&self) -> usize;

    /// 3D coordinate seen at pixel `(x, y)`, or `None` when the sensor has no
    /// valid return there or the pixel is out of range.
    fn point_at(&self, x: usize, y: usize) -> Option<Point3<f32>>;
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CloudError {
    #[error("cloud buffer has {got} points, expected {width}x{height}={expected}")]
    SizeMismatch {
        width: usize,
        height: usize,
        expected: usize,
        got: usize,
    },
}

/// Row-major organized point cloud, one entry per image pixel.
///
/// Missing returns are stored as non-finite coordinates (NaN), the way depth
/// drivers usually deliver them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "CloudRepr", try_from = "CloudRepr")]
pub struct OrganizedCloud {
    width: usize,
    height: usize,
    points: Vec<Point3<f32>>,
}

impl OrganizedCloud {
    pub fn new(width: usize, height: usize, points: Vec<Point3<f32>>) -> Result<Self, CloudError> {
        let expected = width * height;
        if points.len() != expected {
            return Err(CloudError::SizeMismatch {
                width,
                height,
                expected,
                got: points.len(),
            });
        }
        Ok(Self {
            width,
            height,
            points,
        })
    }

    /// Cloud where every pixel is missing.
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            points: vec![Point3::new(f32::NAN, f32::NAN, f32::NAN); width * height],
        }
    }

    /// Build a cloud by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(
        width: usize,
        height: usize,
        mut f: impl FnMut(usize, usize) -> Option<Point3<f32>>,
    ) -> Self {
        let mut points = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                points.push(f(x, y).unwrap_or_else(|| Point3::new(f32::NAN, f32::NAN, f32::NAN)));
            }
        }
        Self {
            width,
            height,
            points,
        }
    }

    /// Overwrite one pixel. Out-of-range pixels are ignored.
    pub fn set(&mut self, x: usize, y: usize, p: Option<Point3<f32>>) {
        if x >= self.width || y >= self.height {
            return;
        }
        self.points[y * self.width + x] =
            p.unwrap_or_else(|| Point3::new(f32::NAN, f32::NAN, f32::NAN));
    }

    pub fn points(&self) -> &[Point3<f32>] {
        &self.points
    }

    /// Number of pixels that carry a valid 3D return.
    pub fn valid_count(&self) -> usize {
        self.points.iter().filter(|p| is_valid(p)).count()
    }
}

impl PointLookup for OrganizedCloud {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn point_at(&self, x: usize, y: usize) -> Option<Point3<f32>> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let p = self.points[y * self.width + x];
        is_valid(&p).then_some(p)
    }
}

#[inline]
fn is_valid(p: &Point3<f32>) -> bool {
    p.x.is_finite() && p.y.is_finite() && p.z.is_finite()
}

/// On-disk form: missing returns become `null`.
#[derive(Serialize, Deserialize)]
struct CloudRepr {
    width: usize,
    height: usize,
    points: Vec<Option<[f32; 3]>>,
}

impl From<OrganizedCloud> for CloudRepr {
    fn from(cloud: OrganizedCloud) -> Self {
        let points = cloud
            .points
            .iter()
            .map(|p| is_valid(p).then_some([p.x, p.y, p.z]))
            .collect();
        Self {
            width: cloud.width,
            height: cloud.height,
            points,
        }
    }
}

impl TryFrom<CloudRepr> for OrganizedCloud {
    type Error = CloudError;

    fn try_from(repr: CloudRepr) -> Result<Self, Self::Error> {
        let points = repr
            .points
            .into_iter()
            .map(|p| match p {
                Some([x, y, z]) => Point3::new(x, y, z),
                None => Point3::new(f32::NAN, f32::NAN, f32::NAN),
            })
            .collect();
        OrganizedCloud::new(repr.width, repr.height, points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_buffer_length() {
        let err = OrganizedCloud::new(4, 3, vec![Point3::origin(); 11]).unwrap_err();
        assert_eq!(
            err,
            CloudError::SizeMismatch {
                width: 4,
                height: 3,
                expected: 12,
                got: 11
            }
        );
    }

    #[test]
    fn lookup_is_row_major_and_skips_missing() {
        let cloud = OrganizedCloud::from_fn(3, 2, |x, y| {
            (x != 1 || y != 1).then(|| Point3::new(x as f32, y as f32, 1.0))
        });
        assert_eq!(cloud.point_at(2, 1), Some(Point3::new(2.0, 1.0, 1.0)));
        assert_eq!(cloud.point_at(1, 1), None);
        assert_eq!(cloud.point_at(3, 0), None);
        assert_eq!(cloud.point_at(0, 2), None);
        assert_eq!(cloud.valid_count(), 5);
    }

    #[test]
    fn json_uses_null_for_missing_points() {
        let mut cloud = OrganizedCloud::empty(2, 1);
        cloud.set(1, 0, Some(Point3::new(0.5, -0.25, 1.0)));

        let json = serde_json::to_string(&cloud).expect("serialize");
        assert_eq!(
            json,
            r#"{"width":2,"height":1,"points":[null,[0.5,-0.25,1.0]]}"#
        );

        let back: OrganizedCloud = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.point_at(0, 0), None);
        assert_eq!(back.point_at(1, 0), Some(Point3::new(0.5, -0.25, 1.0)));
    }

    #[test]
    fn json_with_bad_length_is_rejected() {
        let res: Result<OrganizedCloud, _> =
            serde_json::from_str(r#"{"width":2,"height":2,"points":[null]}"#);
        assert!(res.is_err());
    }
}
