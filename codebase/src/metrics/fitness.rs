use ndarray::{arr1, s};
use crate::metrics::{check_columns, MetricsError, MetricsResult};
use crate::utils::{Array1F, ArrayView2F, F};

/// Weights for `[P, R, mAP@0.5, mAP@0.5:0.95]`
pub const FITNESS_WEIGHTS: [F; 4] = [0.0, 0.0, 0.1, 0.9];

/// Model fitness as a weighted combination of the first four metric columns
pub fn fitness(x: &ArrayView2F) -> MetricsResult<Array1F> {
    check_columns("fitness input", x.ncols(), 4)?;
    Ok(x.slice(s![.., ..4]).dot(&arr1(&FITNESS_WEIGHTS)))
}

/// Fitness from ROC scores: the third score of the first row (image level, non-localized AUC)
pub fn fitness_roc(x: &ArrayView2F) -> MetricsResult<F> {
    check_columns("roc scores", x.ncols(), 3)?;
    x.rows().into_iter().next()
        .map(|o| o[2])
        .ok_or(MetricsError::Empty("roc scores"))
}
