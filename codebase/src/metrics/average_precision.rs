use ndarray::{Array1, ArrayView2, Axis, concatenate, s};
use serde::Serialize;
use crate::metrics::{MetricsError, MetricsResult};
use crate::utils::{argmax, argsort_desc, cumsum_rows, interp, trapz, Array1F, Array2F, ArrayView1F, EPSILON, F};

/// Points on the confidence axis of the per-class curves
pub const CURVE_POINTS: usize = 1000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ApMethod {
    /// 101-point interpolation, as COCO does
    #[default]
    Interp,
    /// Exact area under the stepped curve
    Continuous,
}

/// Average precision of one recall/precision curve.
/// Returns the AP together with the sentinel-padded precision envelope and recall
pub fn compute_ap(recall: &ArrayView1F, precision: &ArrayView1F, method: ApMethod) -> (F, Array1F, Array1F) {
    let last_recall = recall.iter().last().copied().unwrap_or(0.0);
    let mrec = concatenate![Axis(0), Array1F::zeros(1), recall.to_owned(), Array1F::from_elem(1, last_recall + 0.01)];
    let mut mpre = concatenate![Axis(0), Array1F::ones(1), precision.to_owned(), Array1F::zeros(1)];

    // Precision envelope
    for i in (0..mpre.len() - 1).rev() {
        mpre[i] = mpre[i].max(mpre[i + 1]);
    }

    let ap = match method {
        ApMethod::Interp => {
            let x = Array1F::linspace(0.0, 1.0, 101);
            let y = interp(&x.view(), &mrec.view(), &mpre.view(), None, None);
            trapz(&y.view(), &x.view())
        }
        ApMethod::Continuous => {
            (0..mrec.len() - 1)
                .filter(|&i| mrec[i + 1] != mrec[i])
                .map(|i| (mrec[i + 1] - mrec[i]) * mpre[i + 1])
                .sum()
        }
    };
    (ap, mpre, mrec)
}

/// Curves that used to be plotted, one row per class
#[derive(Clone, Debug, Serialize)]
pub struct MetricCurves {
    /// Shared x axis (confidence for P/R/F1, recall for the PR curves)
    pub px: Vec<F>,
    pub precision: Vec<Vec<F>>,
    pub recall: Vec<Vec<F>>,
    pub f1: Vec<Vec<F>>,
    /// Precision over recall at IoU 0.5, only for classes that had both labels and predictions
    pub pr: Vec<ClassCurve>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ClassCurve {
    pub class: i64,
    pub ap50: F,
    pub values: Vec<F>,
}

#[derive(Clone, Debug)]
pub struct ClassMetrics {
    /// Precision per class at the confidence that maximizes the mean F1
    pub p: Array1F,
    pub r: Array1F,
    /// `[classes, iou thresholds]`
    pub ap: Array2F,
    pub f1: Array1F,
    pub classes: Vec<i64>,
    pub curves: MetricCurves,
}

impl ClassMetrics {
    pub fn ap50(&self) -> Array1F {
        if self.ap.ncols() > 0 {
            self.ap.column(0).to_owned()
        } else {
            Array1F::zeros(self.ap.nrows())
        }
    }

    /// AP averaged over the IoU thresholds, per class
    pub fn ap_mean(&self) -> Array1F {
        self.ap.mean_axis(Axis(1)).unwrap_or_else(|| Array1F::zeros(self.ap.nrows()))
    }
}

fn mean_or_zero(values: &ArrayView1F) -> F {
    values.mean().unwrap_or(0.0)
}

/// Summary means `[P, R, mAP@0.5, mAP@0.5:0.95]`, the input of `fitness`
pub fn mean_results(metrics: &ClassMetrics) -> [F; 4] {
    let ap50 = if metrics.ap.ncols() > 0 { mean_or_zero(&metrics.ap.column(0)) } else { 0.0 };
    [
        mean_or_zero(&metrics.p.view()),
        mean_or_zero(&metrics.r.view()),
        ap50,
        mean_or_zero(&metrics.ap_mean().view()),
    ]
}

/// Per-class precision, recall, AP and F1.
///
/// * `tp` - `[predictions, iou thresholds]`, whether each prediction is correct at each threshold
/// * `conf` - objectness of each prediction
/// * `pred_cls` - predicted class of each prediction
/// * `target_cls` - class of every label
pub fn ap_per_class(tp: &ArrayView2<bool>, conf: &ArrayView1F, pred_cls: &ArrayView1F, target_cls: &ArrayView1F) -> MetricsResult<ClassMetrics> {
    let n = tp.nrows();
    if conf.len() != n {
        return Err(MetricsError::Length { what: "conf", expected: n, actual: conf.len() });
    }
    if pred_cls.len() != n {
        return Err(MetricsError::Length { what: "pred_cls", expected: n, actual: pred_cls.len() });
    }

    // Sort by objectness
    let order = argsort_desc(conf);
    let tp = tp.select(Axis(0), &order).mapv(|o| if o { 1.0 } else { 0.0 });
    let conf = conf.select(Axis(0), &order);
    let pred_cls: Array1<i64> = pred_cls.select(Axis(0), &order).mapv(|o| o as i64);

    let mut classes: Vec<i64> = target_cls.iter().map(|&o| o as i64).collect();
    classes.sort_unstable();
    classes.dedup();
    let nc = classes.len();
    let iou_count = tp.ncols();

    let px = Array1F::linspace(0.0, 1.0, CURVE_POINTS);
    let neg_px = px.mapv(|o| -o);
    let mut ap = Array2F::zeros((nc, iou_count));
    let mut p = Array2F::zeros((nc, CURVE_POINTS));
    let mut r = Array2F::zeros((nc, CURVE_POINTS));
    let mut pr = Vec::new();

    for (ci, &class) in classes.iter().enumerate() {
        let indices: Vec<usize> = (0..n).filter(|&i| pred_cls[i] == class).collect();
        let label_count = target_cls.iter().filter(|&&o| o as i64 == class).count();
        if indices.is_empty() || label_count == 0 || iou_count == 0 {
            continue;
        }

        let tpc = cumsum_rows(&tp.select(Axis(0), &indices).view());
        let fpc = cumsum_rows(&tp.select(Axis(0), &indices).mapv(|o| 1.0 - o).view());

        let recall = &tpc / (label_count as F + EPSILON);
        let precision = &tpc / &(&tpc + &fpc);

        // Confidence decreases along the predictions, so interpolate on the negated axis
        let neg_conf = conf.select(Axis(0), &indices).mapv(|o| -o);
        r.row_mut(ci).assign(&interp(&neg_px.view(), &neg_conf.view(), &recall.column(0), Some(0.0), None));
        p.row_mut(ci).assign(&interp(&neg_px.view(), &neg_conf.view(), &precision.column(0), Some(1.0), None));

        for j in 0..iou_count {
            let (value, mpre, mrec) = compute_ap(&recall.column(j), &precision.column(j), ApMethod::Interp);
            ap[[ci, j]] = value;
            if j == 0 {
                let curve = interp(&px.view(), &mrec.view(), &mpre.view(), None, None);
                pr.push(ClassCurve { class, ap50: value, values: curve.to_vec() });
            }
        }
    }

    // Harmonic mean of precision and recall
    let f1 = 2.0 * &p * &r / (&p + &r + EPSILON);
    let best = f1.mean_axis(Axis(0))
        .and_then(|o| argmax(&o.view()))
        .unwrap_or(0);

    let rows = |array: &Array2F| -> Vec<Vec<F>> { array.rows().into_iter().map(|o| o.to_vec()).collect() };
    let curves = MetricCurves {
        px: px.to_vec(),
        precision: rows(&p),
        recall: rows(&r),
        f1: rows(&f1),
        pr,
    };

    Ok(ClassMetrics {
        p: p.slice(s![.., best]).to_owned(),
        r: r.slice(s![.., best]).to_owned(),
        f1: f1.slice(s![.., best]).to_owned(),
        ap,
        classes,
        curves,
    })
}
