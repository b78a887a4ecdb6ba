// Support Vector Machines - RBF C-SVC with calibrated probabilities
//
// One binary machine is trained per class pair (one-vs-one) with an SMO
// solver using second-order working-set selection. Pairwise decision
// values are mapped to probabilities with a Platt sigmoid whose parameters
// come from 5-fold internal cross-validation, and the pairwise estimates
// are coupled into one distribution per row (Wu, Lin and Weng, 2004).
//
// References:
// - Fan, Chen, Lin (2005). Working set selection using second order information
// - Lin, Lin, Weng (2007). A note on Platt's probabilistic outputs for SVMs

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::{check_prediction_input, check_training_input, Classifier};
use crate::error::EvaluationError;

const DEFAULT_C: f64 = 1.0;
/// Stopping tolerance on the maximal KKT violation
const SOLVER_EPSILON: f64 = 1e-3;
/// Floor for non-positive curvature along the working pair
const TAU: f64 = 1e-12;
const MAX_ITERATIONS: usize = 10_000_000;
/// Kernel row cache budget in bytes
const CACHE_BYTES: usize = 200 * 1024 * 1024;
/// Folds used to collect decision values for Platt scaling
const PLATT_FOLDS: usize = 5;
/// Pairwise probabilities are kept inside [MIN_PROB, 1 - MIN_PROB]
const MIN_PROB: f64 = 1e-7;

fn rbf(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>, gamma: f64) -> f64 {
    let distance: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum();
    (-gamma * distance).exp()
}

/// `gamma = 1 / (n_features × Var(X))`, or 1 when X is constant
fn scale_gamma(x: ArrayView2<'_, f64>) -> f64 {
    let n = x.len() as f64;
    let mean = x.sum() / n;
    let variance = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    if variance > 0.0 {
        1.0 / (x.ncols() as f64 * variance)
    } else {
        1.0
    }
}

/// Signed kernel rows `Q[i][k] = y_i · y_k · K(x_i, x_k)` with FIFO eviction
struct KernelCache<'x, 'a> {
    x: ArrayView2<'x, f64>,
    rows: &'a [usize],
    signs: &'a [f64],
    gamma: f64,
    cached: HashMap<usize, Rc<Vec<f64>>>,
    order: VecDeque<usize>,
    capacity: usize,
}

impl<'x, 'a> KernelCache<'x, 'a> {
    fn new(x: ArrayView2<'x, f64>, rows: &'a [usize], signs: &'a [f64], gamma: f64) -> Self {
        let capacity = (CACHE_BYTES / (rows.len().max(1) * std::mem::size_of::<f64>())).max(2);
        Self {
            x,
            rows,
            signs,
            gamma,
            cached: HashMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    fn row(&mut self, i: usize) -> Rc<Vec<f64>> {
        if let Some(row) = self.cached.get(&i) {
            return Rc::clone(row);
        }

        let xi = self.x.row(self.rows[i]);
        let row: Rc<Vec<f64>> = Rc::new(
            self.rows
                .iter()
                .zip(self.signs)
                .map(|(&r, &s)| self.signs[i] * s * rbf(xi, self.x.row(r), self.gamma))
                .collect(),
        );

        if self.order.len() >= self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.cached.remove(&evicted);
            }
        }
        self.order.push_back(i);
        self.cached.insert(i, Rc::clone(&row));
        row
    }
}

/// Two-class machine: `f(x) = Σ coef_s · K(sv_s, x) − rho`
#[derive(Debug, Clone)]
struct BinaryMachine {
    support_vectors: Array2<f64>,
    coef: Vec<f64>,
    rho: f64,
    gamma: f64,
}

impl BinaryMachine {
    fn decision(&self, sample: ArrayView1<'_, f64>) -> f64 {
        self.support_vectors
            .outer_iter()
            .zip(&self.coef)
            .map(|(sv, c)| c * rbf(sv, sample, self.gamma))
            .sum::<f64>()
            - self.rho
    }
}

/// Solve the C-SVC dual on `rows` of `x` with labels `signs` (±1)
fn train_binary(
    x: ArrayView2<'_, f64>,
    rows: &[usize],
    signs: &[f64],
    c: f64,
    gamma: f64,
) -> BinaryMachine {
    let l = rows.len();
    let mut cache = KernelCache::new(x, rows, signs, gamma);
    let mut alpha = vec![0.0; l];
    // Gradient of ½αᵀQα − eᵀα at α = 0
    let mut gradient = vec![-1.0; l];
    // Diagonal of Q; K(x, x) = 1 for the RBF kernel
    let qd = 1.0;

    let is_upper = |a: f64| a >= c;
    let is_lower = |a: f64| a <= 0.0;

    let mut iterations = 0;
    while iterations < MAX_ITERATIONS {
        iterations += 1;

        // First index: maximal violation
        let mut g_max = f64::NEG_INFINITY;
        let mut i_sel = None;
        for t in 0..l {
            if signs[t] > 0.0 {
                if !is_upper(alpha[t]) && -gradient[t] >= g_max {
                    g_max = -gradient[t];
                    i_sel = Some(t);
                }
            } else if !is_lower(alpha[t]) && gradient[t] >= g_max {
                g_max = gradient[t];
                i_sel = Some(t);
            }
        }

        // Second index: largest objective decrease
        let q_i = i_sel.map(|i| cache.row(i));
        let mut g_max2 = f64::NEG_INFINITY;
        let mut j_sel = None;
        let mut obj_diff_min = f64::INFINITY;
        for t in 0..l {
            let (grad_diff, candidate) = if signs[t] > 0.0 {
                if is_lower(alpha[t]) {
                    continue;
                }
                g_max2 = g_max2.max(gradient[t]);
                (g_max + gradient[t], -1.0)
            } else {
                if is_upper(alpha[t]) {
                    continue;
                }
                g_max2 = g_max2.max(-gradient[t]);
                (g_max - gradient[t], 1.0)
            };

            if let (Some(i), Some(q_i)) = (i_sel, &q_i) {
                if grad_diff > 0.0 {
                    let quad = qd + qd + candidate * 2.0 * signs[i] * q_i[t];
                    let quad = if quad > 0.0 { quad } else { TAU };
                    let obj_diff = -(grad_diff * grad_diff) / quad;
                    if obj_diff <= obj_diff_min {
                        j_sel = Some(t);
                        obj_diff_min = obj_diff;
                    }
                }
            }
        }

        let (i, j) = match (i_sel, j_sel) {
            (Some(i), Some(j)) if g_max + g_max2 >= SOLVER_EPSILON => (i, j),
            _ => break,
        };

        let q_i = cache.row(i);
        let q_j = cache.row(j);
        let (old_ai, old_aj) = (alpha[i], alpha[j]);

        if signs[i] != signs[j] {
            let quad = qd + qd + 2.0 * q_i[j];
            let quad = if quad > 0.0 { quad } else { TAU };
            let delta = (-gradient[i] - gradient[j]) / quad;
            let diff = alpha[i] - alpha[j];
            alpha[i] += delta;
            alpha[j] += delta;
            if diff > 0.0 {
                if alpha[j] < 0.0 {
                    alpha[j] = 0.0;
                    alpha[i] = diff;
                }
            } else if alpha[i] < 0.0 {
                alpha[i] = 0.0;
                alpha[j] = -diff;
            }
            if diff > 0.0 {
                if alpha[i] > c {
                    alpha[i] = c;
                    alpha[j] = c - diff;
                }
            } else if alpha[j] > c {
                alpha[j] = c;
                alpha[i] = c + diff;
            }
        } else {
            let quad = qd + qd - 2.0 * q_i[j];
            let quad = if quad > 0.0 { quad } else { TAU };
            let delta = (gradient[i] - gradient[j]) / quad;
            let sum = alpha[i] + alpha[j];
            alpha[i] -= delta;
            alpha[j] += delta;
            if sum > c {
                if alpha[i] > c {
                    alpha[i] = c;
                    alpha[j] = sum - c;
                }
            } else if alpha[j] < 0.0 {
                alpha[j] = 0.0;
                alpha[i] = sum;
            }
            if sum > c {
                if alpha[j] > c {
                    alpha[j] = c;
                    alpha[i] = sum - c;
                }
            } else if alpha[i] < 0.0 {
                alpha[i] = 0.0;
                alpha[j] = sum;
            }
        }

        let (delta_i, delta_j) = (alpha[i] - old_ai, alpha[j] - old_aj);
        for k in 0..l {
            gradient[k] += q_i[k] * delta_i + q_j[k] * delta_j;
        }
    }

    if iterations >= MAX_ITERATIONS {
        tracing::warn!("[SVM] Solver reached {} iterations without converging", MAX_ITERATIONS);
    }

    let rho = compute_rho(&alpha, &gradient, signs, c);

    let support: Vec<usize> = (0..l).filter(|&t| alpha[t] > 0.0).collect();
    let support_vectors = Array2::from_shape_fn((support.len(), x.ncols()), |(s, f)| {
        x[[rows[support[s]], f]]
    });
    let coef = support.iter().map(|&t| alpha[t] * signs[t]).collect();

    BinaryMachine {
        support_vectors,
        coef,
        rho,
        gamma,
    }
}

/// Offset from free variables, or the midpoint of the feasible interval
fn compute_rho(alpha: &[f64], gradient: &[f64], signs: &[f64], c: f64) -> f64 {
    let mut upper = f64::INFINITY;
    let mut lower = f64::NEG_INFINITY;
    let mut free_count = 0;
    let mut free_sum = 0.0;

    for t in 0..alpha.len() {
        let y_grad = signs[t] * gradient[t];
        if alpha[t] >= c {
            if signs[t] < 0.0 {
                upper = upper.min(y_grad);
            } else {
                lower = lower.max(y_grad);
            }
        } else if alpha[t] <= 0.0 {
            if signs[t] > 0.0 {
                upper = upper.min(y_grad);
            } else {
                lower = lower.max(y_grad);
            }
        } else {
            free_count += 1;
            free_sum += y_grad;
        }
    }

    if free_count > 0 {
        free_sum / free_count as f64
    } else {
        (upper + lower) / 2.0
    }
}

/// Fit `P(y = +1 | f) = 1 / (1 + exp(A·f + B))` by regularised Newton steps
fn sigmoid_train(decisions: &[f64], signs: &[f64]) -> (f64, f64) {
    const MAX_ITER: usize = 100;
    const MIN_STEP: f64 = 1e-10;
    const SIGMA: f64 = 1e-12;
    const EPS: f64 = 1e-5;

    let prior1 = signs.iter().filter(|&&s| s > 0.0).count() as f64;
    let prior0 = signs.len() as f64 - prior1;
    let hi_target = (prior1 + 1.0) / (prior1 + 2.0);
    let lo_target = 1.0 / (prior0 + 2.0);
    let targets: Vec<f64> = signs
        .iter()
        .map(|&s| if s > 0.0 { hi_target } else { lo_target })
        .collect();

    let objective = |a: f64, b: f64| -> f64 {
        decisions
            .iter()
            .zip(&targets)
            .map(|(&f, &t)| {
                let fapb = f * a + b;
                if fapb >= 0.0 {
                    t * fapb + (1.0 + (-fapb).exp()).ln()
                } else {
                    (t - 1.0) * fapb + (1.0 + fapb.exp()).ln()
                }
            })
            .sum()
    };

    let mut a = 0.0;
    let mut b = ((prior0 + 1.0) / (prior1 + 1.0)).ln();
    let mut fval = objective(a, b);

    for _ in 0..MAX_ITER {
        let (mut h11, mut h22, mut h21, mut g1, mut g2) = (SIGMA, SIGMA, 0.0, 0.0, 0.0);
        for (&f, &t) in decisions.iter().zip(&targets) {
            let fapb = f * a + b;
            let (p, q) = if fapb >= 0.0 {
                let e = (-fapb).exp();
                (e / (1.0 + e), 1.0 / (1.0 + e))
            } else {
                let e = fapb.exp();
                (1.0 / (1.0 + e), e / (1.0 + e))
            };
            let d2 = p * q;
            h11 += f * f * d2;
            h22 += d2;
            h21 += f * d2;
            let d1 = t - p;
            g1 += f * d1;
            g2 += d1;
        }

        if g1.abs() < EPS && g2.abs() < EPS {
            break;
        }

        let det = h11 * h22 - h21 * h21;
        let da = -(h22 * g1 - h21 * g2) / det;
        let db = -(-h21 * g1 + h11 * g2) / det;
        let gd = g1 * da + g2 * db;

        let mut step = 1.0;
        while step >= MIN_STEP {
            let (new_a, new_b) = (a + step * da, b + step * db);
            let new_f = objective(new_a, new_b);
            if new_f < fval + 0.0001 * step * gd {
                a = new_a;
                b = new_b;
                fval = new_f;
                break;
            }
            step /= 2.0;
        }

        if step < MIN_STEP {
            tracing::debug!("[SVM] Platt line search failed");
            break;
        }
    }

    (a, b)
}

fn sigmoid_predict(decision: f64, a: f64, b: f64) -> f64 {
    let fapb = decision * a + b;
    if fapb >= 0.0 {
        let e = (-fapb).exp();
        e / (1.0 + e)
    } else {
        1.0 / (1.0 + fapb.exp())
    }
}

/// Platt parameters from decision values of held-out internal folds
fn platt_parameters(
    x: ArrayView2<'_, f64>,
    rows: &[usize],
    signs: &[f64],
    c: f64,
    gamma: f64,
    rng: &mut StdRng,
) -> (f64, f64) {
    let l = rows.len();
    let mut perm: Vec<usize> = (0..l).collect();
    perm.shuffle(rng);
    let mut decisions = vec![0.0; l];

    for fold in 0..PLATT_FOLDS {
        let begin = fold * l / PLATT_FOLDS;
        let end = (fold + 1) * l / PLATT_FOLDS;
        if begin == end {
            continue;
        }

        let train: Vec<usize> = perm[..begin].iter().chain(&perm[end..]).copied().collect();
        let train_rows: Vec<usize> = train.iter().map(|&t| rows[t]).collect();
        let train_signs: Vec<f64> = train.iter().map(|&t| signs[t]).collect();
        let positives = train_signs.iter().filter(|&&s| s > 0.0).count();
        let negatives = train_signs.len() - positives;

        for &t in &perm[begin..end] {
            decisions[t] = match (positives, negatives) {
                (0, 0) => 0.0,
                (_, 0) => 1.0,
                (0, _) => -1.0,
                _ => 0.0,
            };
        }
        if positives == 0 || negatives == 0 {
            continue;
        }

        let machine = train_binary(x, &train_rows, &train_signs, c, gamma);
        for &t in &perm[begin..end] {
            decisions[t] = machine.decision(x.row(rows[t]));
        }
    }

    sigmoid_train(&decisions, signs)
}

/// Couple pairwise estimates `r[i][j] ≈ P(i | i or j)` into class probabilities
fn couple_pairwise(r: &[Vec<f64>]) -> Vec<f64> {
    let k = r.len();
    let max_iter = 100.max(k);
    let eps = 0.005 / k as f64;

    let mut q = vec![vec![0.0; k]; k];
    for t in 0..k {
        for j in 0..k {
            if j != t {
                q[t][t] += r[j][t] * r[j][t];
                q[t][j] = -r[j][t] * r[t][j];
            }
        }
    }

    let mut p = vec![1.0 / k as f64; k];
    let mut qp = vec![0.0; k];
    for _ in 0..max_iter {
        let mut pqp = 0.0;
        for t in 0..k {
            qp[t] = (0..k).map(|j| q[t][j] * p[j]).sum();
            pqp += p[t] * qp[t];
        }

        let max_error = qp
            .iter()
            .map(|v| (v - pqp).abs())
            .fold(0.0, f64::max);
        if max_error < eps {
            break;
        }

        for t in 0..k {
            let diff = (-qp[t] + pqp) / q[t][t];
            p[t] += diff;
            pqp = (pqp + diff * (diff * q[t][t] + 2.0 * qp[t])) / (1.0 + diff) / (1.0 + diff);
            for j in 0..k {
                qp[j] = (qp[j] + diff * q[t][j]) / (1.0 + diff);
                p[j] /= 1.0 + diff;
            }
        }
    }

    p
}

/// Machine for one class pair plus its Platt sigmoid
#[derive(Debug, Clone)]
struct PairModel {
    first: usize,
    second: usize,
    machine: BinaryMachine,
    platt_a: f64,
    platt_b: f64,
}

/// RBF support vector classifier with probability estimates
pub struct SupportVectorMachine {
    c: f64,
    seed: u64,
    /// Classes seen during fitting, ascending
    present: Vec<usize>,
    pairs: Vec<PairModel>,
    n_features: Option<usize>,
    n_classes: usize,
}

impl SupportVectorMachine {
    pub fn new(seed: u64) -> Self {
        Self {
            c: DEFAULT_C,
            seed,
            present: Vec::new(),
            pairs: Vec::new(),
            n_features: None,
            n_classes: 0,
        }
    }
}

impl Classifier for SupportVectorMachine {
    fn fit(
        &mut self,
        x: ArrayView2<'_, f64>,
        y: &[usize],
        n_classes: usize,
    ) -> Result<(), EvaluationError> {
        check_training_input(x, y, n_classes)?;

        let gamma = scale_gamma(x);
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.present = (0..n_classes).filter(|c| y.contains(c)).collect();
        self.pairs.clear();

        for (a, &first) in self.present.iter().enumerate() {
            for &second in &self.present[a + 1..] {
                let rows: Vec<usize> = (0..y.len())
                    .filter(|&r| y[r] == first || y[r] == second)
                    .collect();
                let signs: Vec<f64> = rows
                    .iter()
                    .map(|&r| if y[r] == first { 1.0 } else { -1.0 })
                    .collect();

                let (platt_a, platt_b) = platt_parameters(x, &rows, &signs, self.c, gamma, &mut rng);
                let machine = train_binary(x, &rows, &signs, self.c, gamma);
                tracing::trace!(
                    "[SVM] Pair ({}, {}): {} support vectors, rho={:.4}",
                    first,
                    second,
                    machine.coef.len(),
                    machine.rho
                );
                self.pairs.push(PairModel {
                    first,
                    second,
                    machine,
                    platt_a,
                    platt_b,
                });
            }
        }

        self.n_features = Some(x.ncols());
        self.n_classes = n_classes;
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, EvaluationError> {
        check_prediction_input(x, self.n_features)?;

        let mut proba = Array2::zeros((x.nrows(), self.n_classes));
        let k = self.present.len();
        let position: HashMap<usize, usize> = self
            .present
            .iter()
            .enumerate()
            .map(|(i, &class)| (class, i))
            .collect();

        for (row, sample) in x.outer_iter().enumerate() {
            if k == 1 {
                proba[[row, self.present[0]]] = 1.0;
                continue;
            }

            let mut r = vec![vec![0.0; k]; k];
            for pair in &self.pairs {
                let decision = pair.machine.decision(sample);
                let p = sigmoid_predict(decision, pair.platt_a, pair.platt_b)
                    .clamp(MIN_PROB, 1.0 - MIN_PROB);
                let (i, j) = (position[&pair.first], position[&pair.second]);
                r[i][j] = p;
                r[j][i] = 1.0 - p;
            }

            let coupled = if k == 2 {
                vec![r[0][1], r[1][0]]
            } else {
                couple_pairwise(&r)
            };
            for (i, &class) in self.present.iter().enumerate() {
                proba[[row, class]] = coupled[i];
            }
        }

        Ok(proba)
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_scale_gamma() {
        let x = array![[0.0, 2.0], [2.0, 0.0]];
        // Var over all elements = 1
        assert_abs_diff_eq!(scale_gamma(x.view()), 0.5);
        assert_eq!(scale_gamma(array![[3.0, 3.0]].view()), 1.0);
    }

    #[test]
    fn test_binary_machine_separates_points() {
        let x = array![[0.0, 0.0], [0.1, 0.2], [0.2, 0.1], [1.0, 1.0], [0.9, 0.8], [0.8, 0.9]];
        let rows: Vec<usize> = (0..6).collect();
        let signs = [1.0, 1.0, 1.0, -1.0, -1.0, -1.0];
        let machine = train_binary(x.view(), &rows, &signs, 1.0, 1.0);
        for (r, &s) in signs.iter().enumerate() {
            assert!(machine.decision(x.row(r)) * s > 0.0);
        }
        assert!(machine.coef.iter().all(|c| c.abs() <= 1.0 + 1e-12));
        // Dual equality constraint Σ α_i y_i = 0
        assert_abs_diff_eq!(machine.coef.iter().sum::<f64>(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_platt_parameters_from_subset_rows() {
        let (x, y) = blobs(3, 10);
        // Classes 0 and 2 only, trained through per-fold row buffers
        let rows: Vec<usize> = (0..y.len()).filter(|&r| y[r] != 1).collect();
        let signs: Vec<f64> = rows
            .iter()
            .map(|&r| if y[r] == 0 { 1.0 } else { -1.0 })
            .collect();
        let mut rng = StdRng::seed_from_u64(3);
        let (a, b) = platt_parameters(x.view(), &rows, &signs, 1.0, scale_gamma(x.view()), &mut rng);
        assert!(a < 0.0, "a={} b={}", a, b);
        assert!(sigmoid_predict(1.0, a, b) > sigmoid_predict(-1.0, a, b));
    }

    #[test]
    fn test_sigmoid_train_orders_probabilities() {
        let decisions = [-2.0, -1.5, -1.0, -0.2, 0.3, 1.0, 1.4, 2.2];
        let signs = [-1.0, -1.0, -1.0, -1.0, 1.0, 1.0, 1.0, 1.0];
        let (a, b) = sigmoid_train(&decisions, &signs);
        assert!(a < 0.0);
        assert!(sigmoid_predict(2.0, a, b) > 0.5);
        assert!(sigmoid_predict(-2.0, a, b) < 0.5);
    }

    #[test]
    fn test_coupling_is_a_distribution() {
        let r = vec![
            vec![0.0, 0.7, 0.8],
            vec![0.3, 0.0, 0.6],
            vec![0.2, 0.4, 0.0],
        ];
        let p = couple_pairwise(&r);
        assert_abs_diff_eq!(p.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        assert!(p[0] > p[1] && p[1] > p[2]);
    }

    fn blobs(n_classes: usize, per_class: usize) -> (Array2<f64>, Vec<usize>) {
        let n = n_classes * per_class;
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            let class = i / per_class;
            let center = if j == 0 { class as f64 } else { (class % 2) as f64 };
            center + ((i * 7 + j * 11) % 5) as f64 * 0.03
        });
        (x, (0..n).map(|i| i / per_class).collect())
    }

    #[test]
    fn test_binary_probabilities() {
        let (x, y) = blobs(2, 12);
        let mut svm = SupportVectorMachine::new(0);
        svm.fit(x.view(), &y, 2).unwrap();
        let proba = svm.predict_proba(x.view()).unwrap();
        for (row, &label) in y.iter().enumerate() {
            assert_abs_diff_eq!(proba.row(row).sum(), 1.0, epsilon = 1e-9);
            assert!(proba[[row, label]] > 0.5);
        }
    }

    #[test]
    fn test_multi_class_probabilities() {
        let (x, y) = blobs(3, 10);
        let mut svm = SupportVectorMachine::new(1);
        svm.fit(x.view(), &y, 4).unwrap();
        let proba = svm.predict_proba(x.view()).unwrap();
        assert_eq!(proba.ncols(), 4);
        for (row, &label) in y.iter().enumerate() {
            assert_abs_diff_eq!(proba.row(row).sum(), 1.0, epsilon = 1e-6);
            assert_eq!(proba[[row, 3]], 0.0);
            let best = (0..4)
                .max_by(|&a, &b| proba[[row, a]].total_cmp(&proba[[row, b]]))
                .unwrap();
            assert_eq!(best, label);
        }
    }
}
