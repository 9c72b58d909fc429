use crate::error::invalid_argument;
use crate::utils::{Direction, UnitNorm};
use ndarray::{Array2, ArrayView2};
use num_traits::Float;

impl<T: Float> UnitNorm for Array2<T> {
    fn unit_norm(&mut self, direction: &Direction) -> anyhow::Result<()> {
        let lanes = match direction {
            Direction::Row => self.rows_mut(),
            Direction::Column => self.columns_mut(),
        };

        for (i, mut lane) in lanes.into_iter().enumerate() {
            let norm = lane.iter().fold(T::zero(), |acc, &v| acc + v * v).sqrt();
            if !(norm > T::epsilon()) {
                return Err(invalid_argument(
                    "matrix",
                    format!("{:?} {} has zero norm and cannot be normalised", direction, i),
                ));
            }
            lane.mapv_inplace(|v| v / norm);
        }
        Ok(())
    }
}

pub fn frobenius_norm<T: Float>(x: ArrayView2<T>) -> T {
    x.iter().fold(T::zero(), |acc, &v| acc + v * v).sqrt()
}
