use itertools::Itertools;
use ndarray::{s, Array2};
use crate::metrics::{check_columns, MetricsResult};
use crate::utils::{Array2F, ArrayView2F, F};

/// Intersection over union of every box in `a` with every box in `b`, shape `[a, b]`
pub fn box_iou(a: &ArrayView2F, b: &ArrayView2F) -> Array2F {
    let area = |x1: F, y1: F, x2: F, y2: F| (x2 - x1) * (y2 - y1);

    Array2F::from_shape_fn((a.nrows(), b.nrows()), |(i, j)| {
        let (a1, b1) = (a.row(i), b.row(j));
        let width = (a1[2].min(b1[2]) - a1[0].max(b1[0])).max(0.0);
        let height = (a1[3].min(b1[3]) - a1[1].max(b1[1])).max(0.0);
        let inter = width * height;
        inter / (area(a1[0], a1[1], a1[2], a1[3]) + area(b1[0], b1[1], b1[2], b1[3]) - inter)
    })
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Match {
    pub label: usize,
    pub detection: usize,
    pub iou: F,
}

/// Every (label, detection) pair accepted by `keep`, in row-major order
pub fn candidate_matches(iou: &Array2F, mut keep: impl FnMut(usize, usize, F) -> bool) -> Vec<Match> {
    iou.indexed_iter()
        .filter(|&((label, detection), &value)| keep(label, detection, value))
        .map(|((label, detection), &iou)| Match { label, detection, iou })
        .collect()
}

/// Reduces candidates to one-to-one pairs: highest IoU wins, first per detection, then per label.
/// The result is ordered by label
pub fn unique_matches(mut matches: Vec<Match>) -> Vec<Match> {
    if matches.len() <= 1 {
        return matches;
    }

    matches.sort_by(|a, b| b.iou.total_cmp(&a.iou));
    let mut matches: Vec<Match> = matches.into_iter()
        .unique_by(|o| o.detection)
        .collect();

    matches.sort_by(|a, b| b.iou.total_cmp(&a.iou));
    let mut matches: Vec<Match> = matches.into_iter()
        .unique_by(|o| o.label)
        .collect();

    matches.sort_by_key(|o| o.label);
    matches
}

/// Which detections are correct at each IoU threshold, shape `[detections, thresholds]`.
/// A detection is correct when it is matched one-to-one to a label of the same class
/// with an IoU of at least the threshold
pub fn match_predictions(detections: &ArrayView2F, labels: &ArrayView2F, iou_thresholds: &[F]) -> MetricsResult<Array2<bool>> {
    check_columns("detections", detections.ncols(), 6)?;
    check_columns("labels", labels.ncols(), 5)?;

    let mut correct = Array2::from_elem((detections.nrows(), iou_thresholds.len()), false);
    if detections.nrows() == 0 || labels.nrows() == 0 {
        return Ok(correct);
    }

    let iou = box_iou(&labels.slice(s![.., 1..5]), &detections.slice(s![.., ..4]));
    let same_class = |label: usize, detection: usize| labels[[label, 0]] as i64 == detections[[detection, 5]] as i64;

    for (k, &threshold) in iou_thresholds.iter().enumerate() {
        let candidates = candidate_matches(&iou, |label, detection, value| {
            value >= threshold && same_class(label, detection)
        });
        for m in unique_matches(candidates) {
            correct[[m.detection, k]] = true;
        }
    }
    Ok(correct)
}

#[cfg(test)]
mod tests {
    use ndarray::arr2;
    use crate::metrics::boxes::{box_iou, candidate_matches, match_predictions, unique_matches};

    #[test]
    fn test_box_iou() {
        let a = arr2(&[[0.0, 0.0, 2.0, 2.0]]);
        let b = arr2(&[
            [0.0, 0.0, 2.0, 2.0],
            [1.0, 1.0, 3.0, 3.0],
            [5.0, 5.0, 6.0, 6.0],
        ]);
        let iou = box_iou(&a.view(), &b.view());
        assert_eq!(iou.shape(), &[1, 3]);
        assert_eq!(iou[[0, 0]], 1.0);
        assert!((iou[[0, 1]] - 1.0 / 7.0).abs() < 1e-12);
        assert_eq!(iou[[0, 2]], 0.0);
    }

    #[test]
    fn test_unique_matches_prefers_highest_iou() {
        let iou = arr2(&[
            [0.9, 0.6],
            [0.7, 0.0],
        ]);
        let matches = unique_matches(candidate_matches(&iou, |_, _, v| v > 0.5));
        assert_eq!(matches.len(), 1);
        assert_eq!((matches[0].label, matches[0].detection), (0, 0));
    }

    #[test]
    fn test_unique_matches_two_pairs() {
        let iou = arr2(&[
            [0.6, 0.9],
            [0.8, 0.0],
        ]);
        let matches = unique_matches(candidate_matches(&iou, |_, _, v| v > 0.5));
        let pairs: Vec<_> = matches.iter().map(|o| (o.label, o.detection)).collect();
        assert_eq!(pairs, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn test_match_predictions() {
        let labels = arr2(&[
            [0.0, 0.0, 0.0, 10.0, 10.0],
            [1.0, 20.0, 20.0, 30.0, 30.0],
        ]);
        let detections = arr2(&[
            [0.0, 0.0, 10.0, 10.0, 0.9, 0.0],   // exact hit
            [0.0, 0.0, 10.0, 10.0, 0.8, 0.0],   // duplicate of the first
            [20.0, 20.0, 30.0, 26.0, 0.7, 1.0], // IoU 0.6
            [20.0, 20.0, 30.0, 30.0, 0.6, 0.0], // wrong class
        ]);
        let correct = match_predictions(&detections.view(), &labels.view(), &[0.5, 0.75]).unwrap();
        assert_eq!(correct, arr2(&[
            [true, true],
            [false, false],
            [true, false],
            [false, false],
        ]));
    }
}
