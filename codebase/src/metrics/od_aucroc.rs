use ndarray::{s, Axis};
use serde::Serialize;
use crate::metrics::boxes::{box_iou, candidate_matches};
use crate::metrics::roc::{auc, Roc, RocCurve};
use crate::metrics::{check_columns, MetricsError, MetricsResult};
use crate::utils::{Array1F, ArrayView2F, F};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RocScores {
    pub auc_roc_lesion: F,
    pub auc_roc_image: F,
    pub auc_roc_image_nonloc: F,
    pub pauc_froc_lesion: F,
    pub pauc_froc_image: F,
    pub pauc_froc_image_nonloc: F,
}

impl RocScores {
    pub fn to_array(&self) -> [F; 6] {
        [
            self.auc_roc_lesion,
            self.auc_roc_image,
            self.auc_roc_image_nonloc,
            self.pauc_froc_lesion,
            self.pauc_froc_image,
            self.pauc_froc_image_nonloc,
        ]
    }
}

/// Lesion and image level ROC / FROC scoring of a detector.
///
/// Classes at or above the malignant threshold are collapsed into one positive class.
/// Three curves are collected:
/// - lesion: one sample per malignant label, scored with the best overlapping detection
/// - image: one sample per image, scored with the best score among localized detections
/// - image non-local: one sample per image, scored with the best detection anywhere
///
/// Detections on images without malignant labels are kept as false markers for the FROC curves.
#[derive(Clone, Debug)]
pub struct OdAucRoc {
    roc_lesion: Roc,
    roc_image: Roc,
    roc_image_noloc: Roc,
    markers_in_normal_image: Vec<Vec<F>>,
    iou_thres: F,
    fm_img_ths: F,
    malignant_cls_th: F,
}

impl OdAucRoc {
    pub fn new(nc: usize) -> MetricsResult<Self> {
        Self::with_thresholds(nc, 0.5, 1.0)
    }

    pub fn with_thresholds(nc: usize, iou_thres: F, fm_img_ths: F) -> MetricsResult<Self> {
        let malignant_cls_th = match nc {
            4 => 2.0,
            2 => 1.0,
            1 => 0.0,
            _ => return Err(MetricsError::UnsupportedClassCount(nc)),
        };
        Ok(Self {
            roc_lesion: Roc::new(),
            roc_image: Roc::new(),
            roc_image_noloc: Roc::new(),
            markers_in_normal_image: Vec::new(),
            iou_thres,
            fm_img_ths,
            malignant_cls_th,
        })
    }

    pub fn normal_images(&self) -> usize {
        self.markers_in_normal_image.len()
    }

    /// Accumulates one image. `detections` rows are `x1, y1, x2, y2, conf, class`,
    /// `labels` rows are `class, x1, y1, x2, y2`
    pub fn process_batch(&mut self, detections: &ArrayView2F, labels: &ArrayView2F) -> MetricsResult<()> {
        check_columns("detections", detections.ncols(), 6)?;
        check_columns("labels", labels.ncols(), 5)?;

        let mal_detections: Vec<usize> = (0..detections.nrows())
            .filter(|&i| detections[[i, 5]] >= self.malignant_cls_th)
            .collect();
        let mal_labels: Vec<usize> = (0..labels.nrows())
            .filter(|&i| labels[[i, 0]] >= self.malignant_cls_th)
            .collect();
        let detections = detections.select(Axis(0), &mal_detections);
        let labels = labels.select(Axis(0), &mal_labels);

        let probs: Vec<F> = detections.column(4).to_vec();
        let nl = labels.nrows();

        if probs.is_empty() {
            if nl == 0 {
                self.markers_in_normal_image.push(probs);
                self.roc_lesion.update(&[0.0], &[false])?;
                self.roc_image.update(&[0.0], &[false])?;
                self.roc_image_noloc.update(&[0.0], &[false])?;
            } else {
                self.roc_lesion.update(&vec![0.0; nl], &vec![true; nl])?;
                self.roc_image.update(&[0.0], &[true])?;
                self.roc_image_noloc.update(&[0.0], &[true])?;
            }
            return Ok(());
        }

        let max_prob = probs.iter().copied().fold(F::NEG_INFINITY, F::max);
        if nl == 0 {
            self.markers_in_normal_image.push(probs);
            self.roc_lesion.update(&[max_prob], &[false])?;
            self.roc_image.update(&[max_prob], &[false])?;
            self.roc_image_noloc.update(&[max_prob], &[false])?;
            return Ok(());
        }
        self.roc_image_noloc.update(&[max_prob], &[true])?;

        // Every overlap above the threshold counts, not only one-to-one pairs
        let iou = box_iou(&labels.slice(s![.., 1..5]), &detections.slice(s![.., ..4]));
        let matches = candidate_matches(&iou, |_, _, value| value > self.iou_thres);

        let mut image_best_score: F = 0.0;
        for label in 0..nl {
            let best_score = matches.iter()
                .filter(|o| o.label == label)
                .map(|o| probs[o.detection])
                .fold(None, |best: Option<F>, o| Some(best.unwrap_or(0.0).max(o)));
            match best_score {
                Some(score) => {
                    image_best_score = image_best_score.max(score);
                    self.roc_lesion.update(&[score], &[true])?;
                }
                None => self.roc_lesion.update(&[0.0], &[true])?,
            }
        }
        self.roc_image.update(&[image_best_score], &[true])?;
        Ok(())
    }

    /// Average false markers per normal image at each threshold of a curve
    pub fn froc_curve(&self, curve: &RocCurve) -> MetricsResult<(Array1F, Array1F)> {
        let normal_images = self.markers_in_normal_image.len();
        if normal_images == 0 {
            return Err(MetricsError::Empty("normal images"));
        }

        let markers: Vec<F> = self.markers_in_normal_image.iter().flatten().copied().collect();
        let fm_per_image = curve.thresholds.mapv(|threshold| {
            markers.iter().filter(|&&o| o > threshold).count() as F / normal_images as F
        });
        Ok((curve.tpr.clone(), fm_per_image))
    }

    /// Partial area under the FROC curve where false markers per image stay within `fm_img_ths`
    fn partial_froc_auc(&self, curve: &RocCurve) -> MetricsResult<F> {
        let (tpr, fm_per_image) = self.froc_curve(curve)?;
        let within: Vec<usize> = (0..fm_per_image.len())
            .filter(|&i| fm_per_image[i] <= self.fm_img_ths)
            .collect();
        auc(&tpr.select(Axis(0), &within).view(), &fm_per_image.select(Axis(0), &within).view())
    }

    pub fn score(&self) -> MetricsResult<RocScores> {
        let lesion = self.roc_lesion.compute()?;
        let image = self.roc_image.compute()?;
        let image_nonloc = self.roc_image_noloc.compute()?;

        Ok(RocScores {
            auc_roc_lesion: auc(&lesion.fpr.view(), &lesion.tpr.view())?,
            auc_roc_image: auc(&image.fpr.view(), &image.tpr.view())?,
            auc_roc_image_nonloc: auc(&image_nonloc.fpr.view(), &image_nonloc.tpr.view())?,
            pauc_froc_lesion: self.partial_froc_auc(&lesion)?,
            pauc_froc_image: self.partial_froc_auc(&image)?,
            pauc_froc_image_nonloc: self.partial_froc_auc(&image_nonloc)?,
        })
    }

    pub fn curves(&self) -> MetricsResult<(RocCurve, RocCurve)> {
        Ok((self.roc_image.compute()?, self.roc_lesion.compute()?))
    }
}
