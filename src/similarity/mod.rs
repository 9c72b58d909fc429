use ndarray::ArrayView1;
use num_traits::{Float, FromPrimitive, ToPrimitive};

/// Pairwise similarity of two equally long signals.
pub trait SimilarityMeasure {
    fn calculate<T>(&self, a: ArrayView1<T>, b: ArrayView1<T>) -> f64
    where
        T: Float + FromPrimitive + ToPrimitive;
}

/// Cosine of the angle between two vectors; 0 when either is zero.
pub struct CosineSimilarity;

impl SimilarityMeasure for CosineSimilarity {
    fn calculate<T>(&self, a: ArrayView1<T>, b: ArrayView1<T>) -> f64
    where
        T: Float + FromPrimitive + ToPrimitive,
    {
        let mut dot_product = T::zero();
        let mut norm_a = T::zero();
        let mut norm_b = T::zero();

        for (&x, &y) in a.iter().zip(b.iter()) {
            dot_product = dot_product + x * y;
            norm_a = norm_a + x * x;
            norm_b = norm_b + y * y;
        }

        let norm_product = (norm_a * norm_b).sqrt();
        if norm_product > T::epsilon() {
            (dot_product / norm_product).to_f64().unwrap_or(0.0)
        } else {
            0.0
        }
    }
}

/// Pearson correlation coefficient; 0 when either signal is constant.
pub struct PearsonSimilarity;

impl SimilarityMeasure for PearsonSimilarity {
    fn calculate<T>(&self, a: ArrayView1<T>, b: ArrayView1<T>) -> f64
    where
        T: Float + FromPrimitive + ToPrimitive,
    {
        let n = match T::from_usize(a.len()) {
            Some(n) if a.len() > 0 => n,
            _ => return 0.0,
        };
        let mean_a = a.iter().fold(T::zero(), |acc, &x| acc + x) / n;
        let mean_b = b.iter().fold(T::zero(), |acc, &y| acc + y) / n;

        let mut cov = T::zero();
        let mut var_a = T::zero();
        let mut var_b = T::zero();
        for (&x, &y) in a.iter().zip(b.iter()) {
            let dx = x - mean_a;
            let dy = y - mean_b;
            cov = cov + dx * dy;
            var_a = var_a + dx * dx;
            var_b = var_b + dy * dy;
        }

        let denominator = (var_a * var_b).sqrt();
        if denominator > T::epsilon() {
            (cov / denominator).to_f64().unwrap_or(0.0)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_cosine_similarity() {
        let a = array![1.0, 0.0, 1.0];
        let b = array![2.0, 0.0, 2.0];
        let c = array![0.0, 1.0, 0.0];
        assert_abs_diff_eq!(CosineSimilarity.calculate(a.view(), b.view()), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(CosineSimilarity.calculate(a.view(), c.view()), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(CosineSimilarity.calculate(a.view(), (-&b).view()), -1.0, epsilon = 1e-12);

        let zero = array![0.0, 0.0, 0.0];
        assert_eq!(CosineSimilarity.calculate(a.view(), zero.view()), 0.0);
    }

    #[test]
    fn test_pearson_similarity() {
        let a = array![1.0f32, 2.0, 3.0, 4.0];
        let b = array![10.0f32, 20.0, 30.0, 40.0];
        let c = array![4.0f32, 3.0, 2.0, 1.0];
        assert_abs_diff_eq!(PearsonSimilarity.calculate(a.view(), b.view()), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(PearsonSimilarity.calculate(a.view(), c.view()), -1.0, epsilon = 1e-6);

        let constant = array![5.0f32, 5.0, 5.0, 5.0];
        assert_eq!(PearsonSimilarity.calculate(a.view(), constant.view()), 0.0);
    }
}
