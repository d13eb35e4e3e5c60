//! CART decision tree shared by the forest and boosting models

use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::{check_width, ModelError};

const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TreeTask {
    /// Gini impurity on 0/1 labels; leaves hold the positive-class share
    Classification,
    /// Squared error; leaves hold the mean target unless overridden
    Regression,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn per split (None = all)
    pub max_features: Option<usize>,
    pub seed: u64,
    pub task: TreeTask,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
            task: TreeTask::Classification,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Computes a leaf value from the row indices that reach it
pub type LeafValue<'a> = &'a dyn Fn(&[usize]) -> f64;

struct FitContext<'a> {
    x: &'a Array2<f64>,
    y: &'a Array1<f64>,
    leaf_value: Option<LeafValue<'a>>,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Running count, sum and sum of squares of targets
#[derive(Debug, Clone, Copy, Default)]
struct Moments {
    n: f64,
    sum: f64,
    sum_sq: f64,
}

impl Moments {
    fn of(y: &Array1<f64>, indices: &[usize]) -> Self {
        let mut m = Self::default();
        for &i in indices {
            m.add(y[i]);
        }
        m
    }

    fn add(&mut self, v: f64) {
        self.n += 1.0;
        self.sum += v;
        self.sum_sq += v * v;
    }

    fn minus(&self, other: &Self) -> Self {
        Self {
            n: self.n - other.n,
            sum: self.sum - other.sum,
            sum_sq: self.sum_sq - other.sum_sq,
        }
    }

    fn mean(&self) -> f64 {
        if self.n > 0.0 {
            self.sum / self.n
        } else {
            0.0
        }
    }

    fn impurity(&self, task: TreeTask) -> f64 {
        if self.n <= 0.0 {
            return 0.0;
        }
        let mean = self.mean();
        match task {
            TreeTask::Classification => 2.0 * mean * (1.0 - mean),
            TreeTask::Regression => (self.sum_sq / self.n - mean * mean).max(0.0),
        }
    }

    /// Impurity times sample count
    fn weighted_impurity(&self, task: TreeTask) -> f64 {
        self.n * self.impurity(task)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    config: TreeConfig,
    nodes: Vec<Node>,
    n_features: usize,
    /// Total weighted impurity decrease per feature
    importances: Vec<f64>,
}

impl DecisionTree {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            nodes: Vec::new(),
            n_features: 0,
            importances: Vec::new(),
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.fit_rows(x, y, indices, None)
    }

    /// Fit on a subset of rows, optionally overriding how leaf values are computed
    pub fn fit_rows(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: Vec<usize>,
        leaf_value: Option<LeafValue<'_>>,
    ) -> Result<(), ModelError> {
        if indices.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if x.nrows() != y.len() {
            return Err(ModelError::DimensionMismatch {
                expected: x.nrows(),
                got: y.len(),
            });
        }

        self.n_features = x.ncols();
        self.nodes.clear();
        self.importances = vec![0.0; x.ncols()];

        let ctx = FitContext { x, y, leaf_value };
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.build(&ctx, indices, 0, &mut rng);
        Ok(())
    }

    fn build(&mut self, ctx: &FitContext<'_>, indices: Vec<usize>, depth: usize, rng: &mut ChaCha8Rng) -> usize {
        let moments = Moments::of(ctx.y, &indices);
        let stop = depth >= self.config.max_depth
            || indices.len() < self.config.min_samples_split
            || moments.impurity(self.config.task) <= MIN_GAIN;

        let split = if stop {
            None
        } else {
            self.best_split(ctx, &indices, &moments, rng)
        };

        let Some(split) = split else {
            let value = match ctx.leaf_value {
                Some(f) => f(&indices),
                None => moments.mean(),
            };
            self.nodes.push(Node::Leaf { value });
            return self.nodes.len() - 1;
        };

        self.importances[split.feature] += split.gain;
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| ctx.x[[i, split.feature]] <= split.threshold);

        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { value: 0.0 });
        let left = self.build(ctx, left_rows, depth + 1, rng);
        let right = self.build(ctx, right_rows, depth + 1, rng);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    /// Best threshold over a random feature subset, by sorted sweep
    fn best_split(
        &self,
        ctx: &FitContext<'_>,
        indices: &[usize],
        parent: &Moments,
        rng: &mut ChaCha8Rng,
    ) -> Option<Candidate> {
        if indices.len() < 2 {
            return None;
        }
        let task = self.config.task;
        let min_leaf = self.config.min_samples_leaf.max(1);
        let parent_impurity = parent.weighted_impurity(task);

        let mut features: Vec<usize> = (0..self.n_features).collect();
        if let Some(m) = self.config.max_features {
            if m < self.n_features {
                features.shuffle(rng);
                features.truncate(m.max(1));
            }
        }

        let mut best: Option<Candidate> = None;
        let mut order = indices.to_vec();

        for &feature in &features {
            order.sort_by(|&a, &b| ctx.x[[a, feature]].total_cmp(&ctx.x[[b, feature]]));

            let mut left = Moments::default();
            for pos in 0..order.len() - 1 {
                left.add(ctx.y[order[pos]]);
                let n_left = pos + 1;
                if n_left < min_leaf || order.len() - n_left < min_leaf {
                    continue;
                }
                let here = ctx.x[[order[pos], feature]];
                let next = ctx.x[[order[pos + 1], feature]];
                if here >= next {
                    continue;
                }

                let right = parent.minus(&left);
                let gain = parent_impurity - left.weighted_impurity(task) - right.weighted_impurity(task);
                if gain > MIN_GAIN && best.map_or(true, |b| gain > b.gain) {
                    best = Some(Candidate {
                        feature,
                        threshold: here + (next - here) / 2.0,
                        gain,
                    });
                }
            }
        }
        best
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut id = 0;
        loop {
            match self.nodes.get(id) {
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    id = if row[*feature] <= *threshold { *left } else { *right };
                }
                Some(Node::Leaf { value }) => return *value,
                None => return 0.0,
            }
        }
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::NotFitted);
        }
        check_width(self.n_features, x)?;
        Ok(x.rows().into_iter().map(|row| self.predict_row(row)).collect())
    }

    /// Unnormalized impurity decrease per feature
    pub fn raw_importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n, Node::Leaf { .. })).count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match nodes.get(id) {
                Some(Node::Split { left, right, .. }) => 1 + walk(nodes, *left).max(walk(nodes, *right)),
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }
}
