//! Detection validation metrics: fitness, average precision, confusion matrix and ROC/FROC scoring.
//! Boxes are `x1, y1, x2, y2`; detections are rows of `x1, y1, x2, y2, conf, class`
//! and labels are rows of `class, x1, y1, x2, y2`.

pub mod average_precision;
pub mod boxes;
pub mod confusion_matrix;
pub mod fitness;
pub mod od_aucroc;
pub mod roc;

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("expected {expected} columns in {what}, found {actual}")]
    Columns { what: &'static str, expected: usize, actual: usize },
    #[error("length mismatch: {what} has {actual} entries, expected {expected}")]
    Length { what: &'static str, expected: usize, actual: usize },
    #[error("class {class} is outside of 0..{nc}")]
    ClassOutOfRange { class: i64, nc: usize },
    #[error("number of classes should be 1, 2 or 4, got {0}")]
    UnsupportedClassCount(usize),
    #[error("x values are neither increasing nor decreasing")]
    NotMonotonic,
    #[error("no samples were collected for {0}")]
    Empty(&'static str),
}

pub type MetricsResult<T> = Result<T, MetricsError>;

pub(crate) fn check_columns(what: &'static str, actual: usize, expected: usize) -> MetricsResult<()> {
    if actual < expected {
        Err(MetricsError::Columns { what, expected, actual })
    } else {
        Ok(())
    }
}
