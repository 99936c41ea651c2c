use std::fs;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use anyhow::Context;
use ndarray::{concatenate, arr2, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use yolo_codebase::metrics::average_precision::{ap_per_class, mean_results, MetricCurves};
use yolo_codebase::metrics::boxes::match_predictions;
use yolo_codebase::metrics::confusion_matrix::ConfusionMatrix;
use yolo_codebase::metrics::fitness::{fitness, fitness_roc};
use yolo_codebase::metrics::od_aucroc::{OdAucRoc, RocScores};
use yolo_codebase::metrics::roc::RocCurve;
use yolo_codebase::{Array1F, Array2F, GenericResult, F};

pub const METRICS_FILE: &str = "metrics.json";
pub const CURVES_FILE: &str = "curves.json";

#[derive(Deserialize, Debug)]
pub struct EvaluationInput {
    pub nc: usize,
    #[serde(default)]
    pub names: Vec<String>,
    pub images: Vec<ImageRecord>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ImageRecord {
    /// `x1, y1, x2, y2, conf, class`
    #[serde(default)]
    pub detections: Vec<[F; 6]>,
    /// `class, x1, y1, x2, y2`
    #[serde(default)]
    pub labels: Vec<[F; 5]>,
}

#[derive(Serialize, Debug)]
pub struct ClassSummary {
    pub class: i64,
    pub name: String,
    pub labels: usize,
    pub precision: F,
    pub recall: F,
    pub map50: F,
    pub map: F,
    pub f1: F,
}

#[derive(Serialize, Debug)]
pub struct MetricsSummary {
    pub nc: usize,
    pub images: usize,
    pub labels: usize,
    pub precision: F,
    pub recall: F,
    pub map50: F,
    pub map: F,
    pub fitness: F,
    pub classes: Vec<ClassSummary>,
    pub confusion_matrix: Vec<Vec<F>>,
    pub roc: Option<RocScores>,
    pub roc_fitness: Option<F>,
}

#[derive(Serialize, Debug)]
pub struct CurveData {
    pub fpr: Vec<F>,
    pub tpr: Vec<F>,
    pub thresholds: Vec<F>,
}

impl From<RocCurve> for CurveData {
    fn from(curve: RocCurve) -> Self {
        Self {
            fpr: curve.fpr.to_vec(),
            tpr: curve.tpr.to_vec(),
            thresholds: curve.thresholds.to_vec(),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct CurvesReport {
    #[serde(flatten)]
    pub detection: MetricCurves,
    /// Columns sum to 1, background row and column last
    pub confusion_matrix_normalized: Vec<Vec<F>>,
    pub roc_image: Option<CurveData>,
    pub roc_lesion: Option<CurveData>,
}

pub struct Evaluation {
    pub summary: MetricsSummary,
    pub curves: CurvesReport,
}

/// mAP@0.5:0.95 thresholds
fn iou_thresholds() -> Vec<F> {
    Array1F::linspace(0.5, 0.95, 10).to_vec()
}

fn rows(array: &Array2F) -> Vec<Vec<F>> {
    array.rows().into_iter().map(|o| o.to_vec()).collect()
}

fn to_array<const N: usize>(rows: &[[F; N]]) -> GenericResult<Array2F> {
    let flat = rows.iter().flatten().copied().collect();
    Ok(Array2F::from_shape_vec((rows.len(), N), flat)?)
}

pub fn evaluate(input: &EvaluationInput) -> GenericResult<Evaluation> {
    let iouv = iou_thresholds();
    let mut confusion = ConfusionMatrix::new(input.nc);
    let mut od_roc = match OdAucRoc::new(input.nc) {
        Ok(o) => Some(o),
        Err(e) => {
            info!("No ROC scores: {}", e);
            None
        }
    };

    let mut correct = Vec::new();
    let mut conf = Vec::new();
    let mut pred_cls = Vec::new();
    let mut target_cls = Vec::new();

    for (index, image) in input.images.iter().enumerate() {
        let detections = to_array(&image.detections)?;
        let labels = to_array(&image.labels)?;

        confusion.process_batch(&detections.view(), &labels.view())
            .with_context(|| format!("Invalid image {}", index))?;
        if let Some(od_roc) = od_roc.as_mut() {
            od_roc.process_batch(&detections.view(), &labels.view())
                .with_context(|| format!("Invalid image {}", index))?;
        }

        target_cls.extend(labels.column(0).iter().copied());
        if detections.nrows() == 0 {
            continue;
        }
        correct.push(match_predictions(&detections.view(), &labels.view(), &iouv)?);
        conf.extend(detections.column(4).iter().copied());
        pred_cls.extend(detections.column(5).iter().copied());
    }
    debug!("{} predictions, {} labels", conf.len(), target_cls.len());
    debug!("Confusion matrix:\n{}", confusion);

    let views: Vec<_> = correct.iter().map(|o| o.view()).collect();
    let tp = if views.is_empty() {
        Array2::from_elem((0, iouv.len()), false)
    } else {
        concatenate(Axis(0), &views)?
    };
    let target_cls = Array1F::from(target_cls);
    let metrics = ap_per_class(&tp.view(), &Array1F::from(conf).view(), &Array1F::from(pred_cls).view(), &target_cls.view())?;

    let means = mean_results(&metrics);
    let total_fitness = fitness(&arr2(&[means]).view())?[0];

    let ap50 = metrics.ap50();
    let ap_mean = metrics.ap_mean();
    let classes = metrics.classes.iter().enumerate()
        .map(|(i, &class)| ClassSummary {
            class,
            name: usize::try_from(class).ok()
                .and_then(|o| input.names.get(o).cloned())
                .unwrap_or_else(|| class.to_string()),
            labels: target_cls.iter().filter(|&&o| o as i64 == class).count(),
            precision: metrics.p[i],
            recall: metrics.r[i],
            map50: ap50[i],
            map: ap_mean[i],
            f1: metrics.f1[i],
        })
        .collect();

    let (roc, roc_curves) = match &od_roc {
        Some(od_roc) => match od_roc.score().and_then(|o| Ok((o, od_roc.curves()?))) {
            Ok((scores, curves)) => (Some(scores), Some(curves)),
            Err(e) => {
                warn!("ROC scores unavailable: {}", e);
                (None, None)
            }
        },
        None => (None, None),
    };
    let roc_fitness = roc
        .map(|o| fitness_roc(&arr2(&[o.to_array()]).view()))
        .transpose()?;
    let (roc_image, roc_lesion) = match roc_curves {
        Some((image, lesion)) => (Some(image.into()), Some(lesion.into())),
        None => (None, None),
    };

    let summary = MetricsSummary {
        nc: input.nc,
        images: input.images.len(),
        labels: target_cls.len(),
        precision: means[0],
        recall: means[1],
        map50: means[2],
        map: means[3],
        fitness: total_fitness,
        classes,
        confusion_matrix: rows(confusion.matrix()),
        roc,
        roc_fitness,
    };
    let curves = CurvesReport {
        detection: metrics.curves,
        confusion_matrix_normalized: rows(&confusion.normalized()),
        roc_image,
        roc_lesion,
    };
    Ok(Evaluation { summary, curves })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> GenericResult<()> {
    let file = File::create(path).with_context(|| format!("Could not create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("Could not write {}", path.display()))
}

/// Writes `metrics.json` and `curves.json` into `out_dir`, creating it if needed
pub fn write_reports(evaluation: &Evaluation, out_dir: &Path) -> GenericResult<(PathBuf, PathBuf)> {
    fs::create_dir_all(out_dir).with_context(|| format!("Could not create {}", out_dir.display()))?;
    let metrics_path = out_dir.join(METRICS_FILE);
    let curves_path = out_dir.join(CURVES_FILE);
    write_json(&metrics_path, &evaluation.summary)?;
    write_json(&curves_path, &evaluation.curves)?;
    Ok((metrics_path, curves_path))
}

pub fn run_evaluation(input_path: &Path, out_dir: &Path) -> GenericResult<()> {
    let file = File::open(input_path).with_context(|| format!("Could not open {}", input_path.display()))?;
    let input: EvaluationInput = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Could not parse {}", input_path.display()))?;
    info!("Evaluating {} images, {} classes", input.images.len(), input.nc);

    let evaluation = evaluate(&input)?;
    let summary = &evaluation.summary;
    for class in &summary.classes {
        info!("{:>12} labels={} P={:.3} R={:.3} mAP@.5={:.3} mAP@.5:.95={:.3}",
              class.name, class.labels, class.precision, class.recall, class.map50, class.map);
    }
    info!("all labels={} P={:.3} R={:.3} mAP@.5={:.3} mAP@.5:.95={:.3} fitness={:.4}",
          summary.labels, summary.precision, summary.recall, summary.map50, summary.map, summary.fitness);
    if let Some(roc) = &summary.roc {
        info!("AUC-ROC lesion={:.3} image={:.3} image non-local={:.3}",
              roc.auc_roc_lesion, roc.auc_roc_image, roc.auc_roc_image_nonloc);
    }

    let (metrics_path, curves_path) = write_reports(&evaluation, out_dir)?;
    info!("Saved {} and {}", metrics_path.display(), curves_path.display());
    Ok(())
}
