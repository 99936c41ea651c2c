use std::fmt::{Display, Formatter};
use ndarray::{s, Axis};
use crate::metrics::boxes::{box_iou, candidate_matches, unique_matches};
use crate::metrics::{check_columns, MetricsError, MetricsResult};
use crate::utils::{Array2F, ArrayView2F, F};

/// Detection confusion matrix with an extra background row and column at index `nc`.
/// Matched labels count at `[true, predicted]`, unmatched labels at `[nc, true]`
/// and unmatched detections at `[predicted, nc]`
#[derive(Clone, Debug)]
pub struct ConfusionMatrix {
    matrix: Array2F,
    nc: usize,
    conf: F,
    iou_thres: F,
}

impl ConfusionMatrix {
    pub fn new(nc: usize) -> Self {
        Self::with_thresholds(nc, 0.25, 0.45)
    }

    pub fn with_thresholds(nc: usize, conf: F, iou_thres: F) -> Self {
        Self {
            matrix: Array2F::zeros((nc + 1, nc + 1)),
            nc,
            conf,
            iou_thres,
        }
    }

    pub fn matrix(&self) -> &Array2F {
        &self.matrix
    }

    fn class_index(&self, value: F) -> MetricsResult<usize> {
        let class = value as i64;
        if class < 0 || class as usize >= self.nc {
            return Err(MetricsError::ClassOutOfRange { class, nc: self.nc });
        }
        Ok(class as usize)
    }

    /// Accumulates one image. `detections` rows are `x1, y1, x2, y2, conf, class`,
    /// `labels` rows are `class, x1, y1, x2, y2`
    pub fn process_batch(&mut self, detections: &ArrayView2F, labels: &ArrayView2F) -> MetricsResult<()> {
        check_columns("detections", detections.ncols(), 6)?;
        check_columns("labels", labels.ncols(), 5)?;

        let kept: Vec<usize> = (0..detections.nrows())
            .filter(|&i| detections[[i, 4]] > self.conf)
            .collect();
        let detections = detections.select(Axis(0), &kept);

        let gt_classes = labels.column(0).iter()
            .map(|&o| self.class_index(o))
            .collect::<MetricsResult<Vec<_>>>()?;
        let detection_classes = detections.column(5).iter()
            .map(|&o| self.class_index(o))
            .collect::<MetricsResult<Vec<_>>>()?;

        let iou = box_iou(&labels.slice(s![.., 1..5]), &detections.slice(s![.., ..4]));
        let matches = unique_matches(candidate_matches(&iou, |_, _, value| value > self.iou_thres));
        let any_match = !matches.is_empty();

        for (i, &gc) in gt_classes.iter().enumerate() {
            let mut label_matches = matches.iter().filter(|o| o.label == i);
            match (label_matches.next(), label_matches.next()) {
                (Some(m), None) => self.matrix[[gc, detection_classes[m.detection]]] += 1.0,
                _ => self.matrix[[self.nc, gc]] += 1.0,
            }
        }

        if any_match {
            for (i, &dc) in detection_classes.iter().enumerate() {
                if !matches.iter().any(|o| o.detection == i) {
                    self.matrix[[dc, self.nc]] += 1.0;
                }
            }
        }
        Ok(())
    }

    /// Matrix with each column divided by its sum
    pub fn normalized(&self) -> Array2F {
        let sums = self.matrix.sum_axis(Axis(0)) + 1e-6;
        &self.matrix / &sums.insert_axis(Axis(0))
    }
}

impl Display for ConfusionMatrix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for row in self.matrix.rows() {
            let line: Vec<String> = row.iter().map(|o| o.to_string()).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{arr2, Array2};
    use crate::metrics::confusion_matrix::ConfusionMatrix;

    #[test]
    fn test_correct_and_misclassified() {
        let mut matrix = ConfusionMatrix::new(2);
        let labels = arr2(&[
            [0.0, 0.0, 0.0, 10.0, 10.0],
            [1.0, 20.0, 20.0, 30.0, 30.0],
        ]);
        let detections = arr2(&[
            [0.0, 0.0, 10.0, 10.0, 0.9, 0.0],
            [20.0, 20.0, 30.0, 30.0, 0.8, 0.0],
        ]);
        matrix.process_batch(&detections.view(), &labels.view()).unwrap();

        assert_eq!(matrix.matrix(), &arr2(&[
            [1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 0.0, 0.0],
        ]));
    }

    #[test]
    fn test_missed_label_and_extra_detection() {
        let mut matrix = ConfusionMatrix::new(1);
        let labels = arr2(&[
            [0.0, 0.0, 0.0, 10.0, 10.0],
            [0.0, 50.0, 50.0, 60.0, 60.0],
        ]);
        let detections = arr2(&[
            [0.0, 0.0, 10.0, 10.0, 0.9, 0.0],
            [80.0, 80.0, 90.0, 90.0, 0.9, 0.0],
            [50.0, 50.0, 60.0, 60.0, 0.1, 0.0], // below the confidence threshold
        ]);
        matrix.process_batch(&detections.view(), &labels.view()).unwrap();

        assert_eq!(matrix.matrix(), &arr2(&[
            [1.0, 1.0],
            [1.0, 0.0],
        ]));
        assert_eq!(matrix.to_string(), "1 1\n1 0\n");
    }

    #[test]
    fn test_no_detections() {
        let mut matrix = ConfusionMatrix::new(1);
        let labels = arr2(&[[0.0, 0.0, 0.0, 10.0, 10.0]]);
        matrix.process_batch(&Array2::<f64>::zeros((0, 6)).view(), &labels.view()).unwrap();
        assert_eq!(matrix.matrix()[[1, 0]], 1.0);
    }

    #[test]
    fn test_class_out_of_range() {
        let mut matrix = ConfusionMatrix::new(1);
        let labels = arr2(&[[3.0, 0.0, 0.0, 10.0, 10.0]]);
        assert!(matrix.process_batch(&Array2::<f64>::zeros((0, 6)).view(), &labels.view()).is_err());
    }

    #[test]
    fn test_normalized_columns() {
        let mut matrix = ConfusionMatrix::new(1);
        let labels = arr2(&[[0.0, 0.0, 0.0, 10.0, 10.0]]);
        let detections = arr2(&[[0.0, 0.0, 10.0, 10.0, 0.9, 0.0]]);
        matrix.process_batch(&detections.view(), &labels.view()).unwrap();
        assert!((matrix.normalized()[[0, 0]] - 1.0).abs() < 1e-5);
    }
}
