// Decision trees - CART growth shared by the tree-based families
//
// One arena-backed tree grows either a classification tree (Gini impurity,
// leaves hold class fractions) or a regression tree (squared error, leaves
// hold the mean target). Splits are axis-aligned thresholds placed midway
// between consecutive distinct feature values; rows with `x <= threshold`
// go left. Candidate features are visited in a seeded random order and,
// when a feature budget is set, the search stops after that many
// non-constant features were evaluated.

use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::{check_prediction_input, check_training_input, Classifier};
use crate::error::EvaluationError;

/// Impurity below which a node counts as pure
const PURITY_EPSILON: f64 = 1e-12;

/// Number of features examined per split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxFeatures {
    All,
    /// `max(1, floor(sqrt(n_features)))`
    Sqrt,
}

impl MaxFeatures {
    fn resolve(self, n_features: usize) -> usize {
        match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => ((n_features as f64).sqrt().floor() as usize).max(1),
        }
    }
}

/// Growth limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub max_features: MaxFeatures,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            max_features: MaxFeatures::All,
        }
    }
}

/// What the tree is fitted to
#[derive(Clone, Copy)]
pub(crate) enum Target<'a> {
    Classes { y: &'a [usize], n_classes: usize },
    Values(&'a [f64]),
}

#[derive(Debug, Clone)]
pub(crate) enum Node {
    Leaf {
        value: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Sufficient statistics of the rows in a node
#[derive(Clone)]
struct NodeStats {
    counts: Vec<f64>,
    n: f64,
    sum: f64,
    sum_sq: f64,
}

impl NodeStats {
    fn empty(target: Target<'_>) -> Self {
        let classes = match target {
            Target::Classes { n_classes, .. } => n_classes,
            Target::Values(_) => 0,
        };
        Self {
            counts: vec![0.0; classes],
            n: 0.0,
            sum: 0.0,
            sum_sq: 0.0,
        }
    }

    fn of(target: Target<'_>, rows: &[usize]) -> Self {
        let mut stats = Self::empty(target);
        for &row in rows {
            stats.add(target, row, 1.0);
        }
        stats
    }

    fn add(&mut self, target: Target<'_>, row: usize, sign: f64) {
        self.n += sign;
        match target {
            Target::Classes { y, .. } => self.counts[y[row]] += sign,
            Target::Values(values) => {
                self.sum += sign * values[row];
                self.sum_sq += sign * values[row] * values[row];
            }
        }
    }

    /// Node size times node impurity
    fn weighted_impurity(&self, target: Target<'_>) -> f64 {
        if self.n <= 0.0 {
            return 0.0;
        }
        match target {
            Target::Classes { .. } => {
                self.n - self.counts.iter().map(|c| c * c).sum::<f64>() / self.n
            }
            Target::Values(_) => (self.sum_sq - self.sum * self.sum / self.n).max(0.0),
        }
    }

    fn leaf_value(&self, target: Target<'_>) -> Vec<f64> {
        match target {
            Target::Classes { .. } => self.counts.iter().map(|c| c / self.n).collect(),
            Target::Values(_) => vec![self.sum / self.n],
        }
    }
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    score: f64,
}

/// Fitted CART tree
#[derive(Debug, Clone, Default)]
pub(crate) struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Grow a tree on `rows` of `x` (rows may repeat, e.g. bootstrap draws)
    pub fn grow(
        x: ArrayView2<'_, f64>,
        target: Target<'_>,
        rows: Vec<usize>,
        params: TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let max_features = params.max_features.resolve(x.ncols());
        let mut features: Vec<usize> = (0..x.ncols()).collect();
        let mut nodes = vec![Node::Leaf { value: Vec::new() }];
        let mut stack = vec![(0usize, rows, 0usize)];

        while let Some((node, rows, depth)) = stack.pop() {
            let stats = NodeStats::of(target, &rows);
            let impurity = stats.weighted_impurity(target);

            let can_split = rows.len() >= params.min_samples_split
                && params.max_depth.map_or(true, |max| depth < max)
                && impurity > PURITY_EPSILON;

            let best = if can_split {
                features.shuffle(rng);
                find_best_split(x, target, &rows, &stats, &features, max_features)
            } else {
                None
            };

            match best {
                Some(split) => {
                    let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                        .iter()
                        .partition(|&&row| x[[row, split.feature]] <= split.threshold);
                    let left = nodes.len();
                    let right = left + 1;
                    nodes.push(Node::Leaf { value: Vec::new() });
                    nodes.push(Node::Leaf { value: Vec::new() });
                    nodes[node] = Node::Split {
                        feature: split.feature,
                        threshold: split.threshold,
                        left,
                        right,
                    };
                    stack.push((right, right_rows, depth + 1));
                    stack.push((left, left_rows, depth + 1));
                }
                None => {
                    nodes[node] = Node::Leaf {
                        value: stats.leaf_value(target),
                    };
                }
            }
        }

        Self { nodes }
    }

    /// Index of the leaf a sample falls into
    pub fn apply(&self, sample: ArrayView1<'_, f64>) -> usize {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { .. } => return index,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if sample[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Value stored at the leaf a sample falls into
    pub fn predict_value(&self, sample: ArrayView1<'_, f64>) -> &[f64] {
        match &self.nodes[self.apply(sample)] {
            Node::Leaf { value } => value,
            Node::Split { .. } => &[],
        }
    }

    /// Overwrite a leaf's value
    pub fn set_leaf_value(&mut self, leaf: usize, new_value: Vec<f64>) {
        if let Some(Node::Leaf { value }) = self.nodes.get_mut(leaf) {
            *value = new_value;
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match &nodes[index] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }
}

fn find_best_split(
    x: ArrayView2<'_, f64>,
    target: Target<'_>,
    rows: &[usize],
    parent: &NodeStats,
    features: &[usize],
    max_features: usize,
) -> Option<BestSplit> {
    let mut best: Option<BestSplit> = None;
    let mut visited = 0;
    let mut order = rows.to_vec();

    for &feature in features {
        if visited >= max_features && best.is_some() {
            break;
        }

        order.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));
        let first = x[[order[0], feature]];
        let last = x[[order[order.len() - 1], feature]];
        if last <= first {
            continue;
        }
        visited += 1;

        let mut left = NodeStats::empty(target);
        let mut right = parent.clone();
        for pos in 0..order.len() - 1 {
            left.add(target, order[pos], 1.0);
            right.add(target, order[pos], -1.0);

            let value = x[[order[pos], feature]];
            let next = x[[order[pos + 1], feature]];
            if next <= value {
                continue;
            }

            let score = left.weighted_impurity(target) + right.weighted_impurity(target);
            if best.as_ref().map_or(true, |b| score < b.score) {
                let mut threshold = value + (next - value) / 2.0;
                if threshold >= next {
                    threshold = value;
                }
                best = Some(BestSplit {
                    feature,
                    threshold,
                    score,
                });
            }
        }
    }

    best
}

/// Single CART classification tree with default hyperparameters
pub struct DecisionTree {
    params: TreeParams,
    seed: u64,
    tree: Option<Tree>,
    n_features: usize,
    n_classes: usize,
}

impl DecisionTree {
    pub fn new(seed: u64) -> Self {
        Self::with_params(TreeParams::default(), seed)
    }

    pub(crate) fn with_params(params: TreeParams, seed: u64) -> Self {
        Self {
            params,
            seed,
            tree: None,
            n_features: 0,
            n_classes: 0,
        }
    }

    /// Fit on an explicit row selection (rows may repeat)
    pub(crate) fn fit_rows(
        &mut self,
        x: ArrayView2<'_, f64>,
        y: &[usize],
        n_classes: usize,
        rows: Vec<usize>,
    ) {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let target = Target::Classes { y, n_classes };
        let tree = Tree::grow(x, target, rows, self.params, &mut rng);
        tracing::trace!(
            "[DecisionTree] Grew {} nodes, depth {}",
            tree.node_count(),
            tree.depth()
        );
        self.tree = Some(tree);
        self.n_features = x.ncols();
        self.n_classes = n_classes;
    }
}

impl Classifier for DecisionTree {
    fn fit(
        &mut self,
        x: ArrayView2<'_, f64>,
        y: &[usize],
        n_classes: usize,
    ) -> Result<(), EvaluationError> {
        check_training_input(x, y, n_classes)?;
        self.fit_rows(x, y, n_classes, (0..x.nrows()).collect());
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, EvaluationError> {
        check_prediction_input(x, self.tree.as_ref().map(|_| self.n_features))?;
        let mut proba = Array2::zeros((x.nrows(), self.n_classes));
        if let Some(tree) = &self.tree {
            for (row, sample) in x.outer_iter().enumerate() {
                for (class, &p) in tree.predict_value(sample).iter().enumerate() {
                    proba[[row, class]] = p;
                }
            }
        }
        Ok(proba)
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }
}
