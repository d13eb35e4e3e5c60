//! Logistic regression trained by batch gradient descent with an L2 penalty

use ndarray::{Array1, Array2};

use super::{check_training_set, check_width, sigmoid, Classifier, ModelError};

#[derive(Debug, Clone)]
pub struct LogisticRegression {
    coefficients: Option<Array1<f64>>,
    intercept: f64,
    learning_rate: f64,
    max_iter: usize,
    tolerance: f64,
    /// L2 strength, applied to coefficients only
    l2: f64,
    pub cost_history: Vec<f64>,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(0.1, 1000, 1e-6, 1.0)
    }
}

impl LogisticRegression {
    pub fn new(learning_rate: f64, max_iter: usize, tolerance: f64, l2: f64) -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
            learning_rate,
            max_iter,
            tolerance,
            l2,
            cost_history: Vec::new(),
        }
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Penalized binary cross-entropy
    fn cost(&self, y: &Array1<f64>, p: &Array1<f64>, weights: &Array1<f64>) -> f64 {
        let eps = 1e-15;
        let n = y.len() as f64;
        let log_loss = -y
            .iter()
            .zip(p.iter())
            .map(|(&y, &p)| {
                let p = p.clamp(eps, 1.0 - eps);
                y * p.ln() + (1.0 - y) * (1.0 - p).ln()
            })
            .sum::<f64>()
            / n;
        log_loss + self.l2 / (2.0 * n) * weights.dot(weights)
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &str {
        "Logistic Regression"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
        check_training_set(x, y)?;
        let n = x.nrows() as f64;

        let mut weights = Array1::<f64>::zeros(x.ncols());
        let mut bias = 0.0;
        self.cost_history.clear();

        for _ in 0..self.max_iter {
            let p = (x.dot(&weights) + bias).mapv(sigmoid);
            let error = &p - y;

            let grad_w = x.t().dot(&error) / n + &weights * (self.l2 / n);
            let grad_b = error.sum() / n;

            weights = weights - grad_w * self.learning_rate;
            bias -= self.learning_rate * grad_b;

            let cost = self.cost(y, &p, &weights);
            if !cost.is_finite() {
                return Err(ModelError::NonFinite("logistic loss"));
            }
            let converged = self
                .cost_history
                .last()
                .is_some_and(|prev| (prev - cost).abs() < self.tolerance);
            self.cost_history.push(cost);
            if converged {
                break;
            }
        }

        self.coefficients = Some(weights);
        self.intercept = bias;
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        let weights = self.coefficients.as_ref().ok_or(ModelError::NotFitted)?;
        check_width(weights.len(), x)?;
        Ok((x.dot(weights) + self.intercept).mapv(sigmoid))
    }

    /// Absolute coefficients, normalized; meaningful on standardized input
    fn feature_importances(&self) -> Option<Vec<f64>> {
        self.coefficients
            .as_ref()
            .map(|w| super::normalize(w.mapv(f64::abs).to_vec()))
    }

    fn wants_scaled(&self) -> bool {
        true
    }
}
