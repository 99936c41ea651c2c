use crate::metrics::{MetricsError, MetricsResult};
use crate::utils::{argsort_desc, trapz, Array1F, ArrayView1F, F};

#[derive(Clone, Debug, PartialEq)]
pub struct RocCurve {
    pub fpr: Array1F,
    pub tpr: Array1F,
    /// Decreasing; the first one sits above every score so the curve starts at (0, 0)
    pub thresholds: Array1F,
}

/// Binary ROC accumulator. Scores and targets are collected across updates
#[derive(Clone, Debug, Default)]
pub struct Roc {
    scores: Vec<F>,
    targets: Vec<bool>,
}

impl Roc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, scores: &[F], targets: &[bool]) -> MetricsResult<()> {
        if scores.len() != targets.len() {
            return Err(MetricsError::Length { what: "targets", expected: scores.len(), actual: targets.len() });
        }
        self.scores.extend_from_slice(scores);
        self.targets.extend_from_slice(targets);
        Ok(())
    }

    pub fn compute(&self) -> MetricsResult<RocCurve> {
        if self.scores.is_empty() {
            return Err(MetricsError::Empty("roc"));
        }

        let scores = Array1F::from(self.scores.clone());
        let order = argsort_desc(&scores.view());

        // Cumulative true and false positives at each distinct score
        let mut tps = vec![0.0];
        let mut fps = vec![0.0];
        let mut thresholds = Vec::new();
        let mut true_count = 0.0;
        for (position, &i) in order.iter().enumerate() {
            if self.targets[i] {
                true_count += 1.0;
            }
            let is_last_of_value = order.get(position + 1)
                .map(|&next| self.scores[next] != self.scores[i])
                .unwrap_or(true);
            if is_last_of_value {
                tps.push(true_count);
                fps.push((position + 1) as F - true_count);
                thresholds.push(self.scores[i]);
            }
        }
        thresholds.insert(0, thresholds[0] + 1.0);

        Ok(RocCurve {
            fpr: rate(fps),
            tpr: rate(tps),
            thresholds: Array1F::from(thresholds),
        })
    }
}

/// Normalizes a cumulative count by its total. All zeros when there is nothing to count
fn rate(counts: Vec<F>) -> Array1F {
    let total = counts.last().copied().unwrap_or(0.0);
    let counts = Array1F::from(counts);
    if total <= 0.0 {
        Array1F::zeros(counts.len())
    } else {
        counts / total
    }
}

/// Area under `y(x)` with the trapezoidal rule. `x` must be monotonic; a decreasing `x` still
/// gives a positive area
pub fn auc(x: &ArrayView1F, y: &ArrayView1F) -> MetricsResult<F> {
    let steps: Vec<F> = x.windows(2).into_iter().map(|o| o[1] - o[0]).collect();
    let direction = if steps.iter().any(|&o| o < 0.0) {
        if steps.iter().all(|&o| o <= 0.0) {
            -1.0
        } else {
            return Err(MetricsError::NotMonotonic);
        }
    } else {
        1.0
    };
    Ok(direction * trapz(y, x))
}

#[cfg(test)]
mod tests {
    use ndarray::arr1;
    use crate::metrics::roc::{auc, Roc};

    #[test]
    fn test_perfect_separation() {
        let mut roc = Roc::new();
        roc.update(&[0.9, 0.8], &[true, true]).unwrap();
        roc.update(&[0.3, 0.1], &[false, false]).unwrap();

        let curve = roc.compute().unwrap();
        assert_eq!(curve.tpr.to_vec(), vec![0.0, 0.5, 1.0, 1.0, 1.0]);
        assert_eq!(curve.fpr.to_vec(), vec![0.0, 0.0, 0.0, 0.5, 1.0]);
        assert!((curve.thresholds[0] - 1.9).abs() < 1e-12);
        assert_eq!(auc(&curve.fpr.view(), &curve.tpr.view()).unwrap(), 1.0);
    }

    #[test]
    fn test_tied_scores_collapse() {
        let mut roc = Roc::new();
        roc.update(&[0.5, 0.5, 0.5], &[true, false, true]).unwrap();

        let curve = roc.compute().unwrap();
        assert_eq!(curve.tpr.to_vec(), vec![0.0, 1.0]);
        assert_eq!(curve.fpr.to_vec(), vec![0.0, 1.0]);
        assert_eq!(auc(&curve.fpr.view(), &curve.tpr.view()).unwrap(), 0.5);
    }

    #[test]
    fn test_single_class_gives_zero_rate() {
        let mut roc = Roc::new();
        roc.update(&[0.7, 0.2], &[true, true]).unwrap();

        let curve = roc.compute().unwrap();
        assert_eq!(curve.fpr.to_vec(), vec![0.0, 0.0, 0.0]);
        assert_eq!(curve.tpr.to_vec(), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_mismatched_update_is_rejected() {
        let mut roc = Roc::new();
        assert!(roc.update(&[0.9, 0.8], &[true]).is_err());
        // Nothing is recorded from a rejected update
        assert!(roc.compute().is_err());
    }

    #[test]
    fn test_empty() {
        assert!(Roc::new().compute().is_err());
    }

    #[test]
    fn test_auc_direction() {
        let x = arr1(&[0.0, 0.5, 1.0]);
        let y = arr1(&[1.0, 1.0, 1.0]);
        assert_eq!(auc(&x.view(), &y.view()).unwrap(), 1.0);

        let x = arr1(&[1.0, 0.5, 0.0]);
        assert_eq!(auc(&x.view(), &y.view()).unwrap(), 1.0);

        let x = arr1(&[0.0, 1.0, 0.5]);
        assert!(auc(&x.view(), &y.view()).is_err());
    }
}
