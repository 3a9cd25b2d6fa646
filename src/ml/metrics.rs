//! Evaluation metrics for the binary classifiers.

use serde::{Deserialize, Serialize};

/// Confusion matrix for a `K`-class classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    pub n_classes: usize,
    /// Row-major `KxK` counts (`truth * K + predicted`).
    pub counts: Vec<u32>,
}

impl ConfusionMatrix {
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![0; n_classes * n_classes],
        }
    }

    pub fn from_predictions(n_classes: usize, truth: &[usize], predicted: &[usize]) -> Self {
        let mut cm = Self::new(n_classes);
        for (&t, &p) in truth.iter().zip(predicted) {
            cm.add(t, p);
        }
        cm
    }

    pub fn add(&mut self, truth: usize, predicted: usize) {
        if truth >= self.n_classes || predicted >= self.n_classes {
            return;
        }
        let idx = truth * self.n_classes + predicted;
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.counts[truth * self.n_classes + predicted]
    }

    pub fn rows(&self) -> Vec<Vec<u32>> {
        self.counts.chunks(self.n_classes.max(1)).map(<[u32]>::to_vec).collect()
    }
}

/// Precision/recall statistics for a single class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerClassStats {
    /// `TP / (TP + FP)`.
    pub precision: f64,
    /// `TP / (TP + FN)`.
    pub recall: f64,
    pub f1: f64,
    /// Total number of true examples for the class.
    pub support: u32,
}

/// Compute per-class precision, recall and F1 from a confusion matrix.
pub fn precision_recall_by_class(cm: &ConfusionMatrix) -> Vec<PerClassStats> {
    let k = cm.n_classes;
    (0..k)
        .map(|class_idx| {
            let tp = f64::from(cm.get(class_idx, class_idx));
            let mut fp = 0f64;
            let mut fn_ = 0f64;
            let mut support = 0u32;
            for j in 0..k {
                let v = cm.get(class_idx, j);
                support = support.saturating_add(v);
                if j != class_idx {
                    fn_ += f64::from(v);
                    fp += f64::from(cm.get(j, class_idx));
                }
            }
            let precision = if tp + fp == 0.0 { 0.0 } else { tp / (tp + fp) };
            let recall = if tp + fn_ == 0.0 { 0.0 } else { tp / (tp + fn_) };
            let f1 = if precision + recall == 0.0 {
                0.0
            } else {
                2.0 * precision * recall / (precision + recall)
            };
            PerClassStats {
                precision,
                recall,
                f1,
                support,
            }
        })
        .collect()
}

/// Compute overall accuracy from a confusion matrix.
pub fn accuracy(cm: &ConfusionMatrix) -> f64 {
    let total: u64 = cm.counts.iter().map(|&v| u64::from(v)).sum();
    if total == 0 {
        return 0.0;
    }
    let correct: u64 = (0..cm.n_classes).map(|i| u64::from(cm.get(i, i))).sum();
    correct as f64 / total as f64
}

/// Area under the ROC curve via the rank-sum statistic, averaging tied ranks.
///
/// `None` when only one class is present.
pub fn roc_auc(truth: &[usize], scores: &[f64]) -> Option<f64> {
    let mut order: Vec<usize> = (0..truth.len().min(scores.len())).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut ranks = vec![0.0f64; order.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // ranks are 1-based; ties share the mean rank of their run
        let rank = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }

    let n_pos = order.iter().filter(|&&idx| truth[idx] == 1).count() as f64;
    let n_neg = order.len() as f64 - n_pos;
    if n_pos == 0.0 || n_neg == 0.0 {
        return None;
    }
    let pos_rank_sum: f64 = order
        .iter()
        .filter(|&&idx| truth[idx] == 1)
        .map(|&idx| ranks[idx])
        .sum();
    Some((pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

/// Mean binary cross-entropy with probabilities clipped away from 0 and 1.
pub fn log_loss(truth: &[usize], proba: &[f64]) -> f64 {
    const EPS: f64 = 1e-15;
    let n = truth.len().min(proba.len());
    if n == 0 {
        return f64::NAN;
    }
    let total: f64 = truth
        .iter()
        .zip(proba)
        .map(|(&t, &p)| {
            let p = p.clamp(EPS, 1.0 - EPS);
            if t == 1 { -p.ln() } else { -(1.0 - p).ln() }
        })
        .sum();
    total / n as f64
}

/// Serialized evaluation report for a binary model on held-out rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryMetrics {
    pub n_samples: usize,
    pub accuracy: f64,
    /// Precision, recall and F1 of the POST class.
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub roc_auc: Option<f64>,
    pub log_loss: f64,
    pub per_class: Vec<PerClassStats>,
    /// `[truth][predicted]` counts in PRE, POST order.
    pub confusion: Vec<Vec<u32>>,
}

impl BinaryMetrics {
    /// Evaluate `P(POST)` scores against labels at a 0.5 decision threshold.
    pub fn evaluate(truth: &[usize], proba: &[f64]) -> Self {
        let predicted: Vec<usize> = proba.iter().map(|&p| usize::from(p >= 0.5)).collect();
        let cm = ConfusionMatrix::from_predictions(2, truth, &predicted);
        let per_class = precision_recall_by_class(&cm);
        let positive = per_class[1].clone();
        Self {
            n_samples: truth.len().min(proba.len()),
            accuracy: accuracy(&cm),
            precision: positive.precision,
            recall: positive.recall,
            f1: positive.f1,
            roc_auc: roc_auc(truth, proba),
            log_loss: log_loss(truth, proba),
            per_class,
            confusion: cm.rows(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confusion_counts_and_accuracy() {
        let cm = ConfusionMatrix::from_predictions(2, &[0, 0, 1, 1], &[0, 1, 1, 1]);
        assert_eq!(cm.rows(), vec![vec![1, 1], vec![0, 2]]);
        assert!((accuracy(&cm) - 0.75).abs() < 1e-12);
        let stats = precision_recall_by_class(&cm);
        assert!((stats[1].precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((stats[1].recall - 1.0).abs() < 1e-12);
        assert!((stats[1].f1 - 0.8).abs() < 1e-12);
        assert_eq!(stats[0].support, 2);
    }

    #[test]
    fn auc_handles_perfect_inverted_and_tied_scores() {
        let truth = [0, 0, 1, 1];
        assert_eq!(roc_auc(&truth, &[0.1, 0.2, 0.8, 0.9]), Some(1.0));
        assert_eq!(roc_auc(&truth, &[0.9, 0.8, 0.2, 0.1]), Some(0.0));
        assert_eq!(roc_auc(&truth, &[0.5; 4]), Some(0.5));
        assert_eq!(roc_auc(&[1, 1], &[0.3, 0.6]), None);
    }

    #[test]
    fn log_loss_is_finite_for_confident_mistakes() {
        let loss = log_loss(&[1, 0], &[0.0, 1.0]);
        assert!(loss.is_finite());
        assert!(loss > 30.0);
        assert!((log_loss(&[1], &[0.5]) - 2f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn evaluate_reports_positive_class() {
        let metrics = BinaryMetrics::evaluate(&[0, 1, 1, 0], &[0.2, 0.7, 0.4, 0.1]);
        assert_eq!(metrics.n_samples, 4);
        assert!((metrics.accuracy - 0.75).abs() < 1e-12);
        assert!((metrics.precision - 1.0).abs() < 1e-12);
        assert!((metrics.recall - 0.5).abs() < 1e-12);
        assert_eq!(metrics.roc_auc, Some(1.0));
    }
}
