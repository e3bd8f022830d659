use collada::Vector3;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct BoundingBox3 {
    pub min: Vector3,
    pub max: Vector3,
}

impl BoundingBox3 {
    pub fn new(a: &Vector3, b: &Vector3) -> Self {
        BoundingBox3 {
            min: Vector3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Vector3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// The smallest box holding every point, or `None` for no points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vector3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;

        let mut bounding_box = BoundingBox3::new(first, first);
        for point in points {
            bounding_box.update_point(point);
        }
        Some(bounding_box)
    }

    pub fn len_x(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn len_y(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn len_z(&self) -> f32 {
        self.max.z - self.min.z
    }

    pub fn update_point(&mut self, v: &Vector3) {
        self.min.x = self.min.x.min(v.x);
        self.min.y = self.min.y.min(v.y);
        self.min.z = self.min.z.min(v.z);
        self.max.x = self.max.x.max(v.x);
        self.max.y = self.max.y.max(v.y);
        self.max.z = self.max.z.max(v.z);
    }

    pub fn update(&mut self, bb: &BoundingBox3) {
        self.update_point(&bb.min);
        self.update_point(&bb.max);
    }

    pub fn center(&self) -> Vector3 {
        (self.min + self.max) * 0.5
    }
}
