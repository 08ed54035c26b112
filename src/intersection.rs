use geo::{CoordNum, Rect};

use crate::{
    errors::{CubeError, Result},
    CoordUtils,
};

pub trait Intersection {
    type Output;
    fn intersection(&self, rhs: &Self) -> Result<Self::Output>;
}

impl<T: CoordNum> Intersection for Rect<T> {
    type Output = Rect<T>;
    /// Fails if the rectangles neither overlap nor touch.
    fn intersection(&self, rhs: &Self) -> Result<Rect<T>> {
        let lhs_max = self.max();
        let rhs_min = rhs.min();
        if (lhs_max.x < rhs_min.x) | (lhs_max.y < rhs_min.y) {
            return Err(CubeError::NoIntersection);
        }

        let lhs_min = self.min();
        let rhs_max = rhs.max();
        if (lhs_min.x > rhs_max.x) | (lhs_min.y > rhs_max.y) {
            return Err(CubeError::NoIntersection);
        }

        let min = lhs_min.operate(&rhs_min, |x, y| if x > y { x } else { y });
        let max = lhs_max.operate(&rhs_max, |x, y| if x < y { x } else { y });

        Ok(Self::new(min, max))
    }
}
