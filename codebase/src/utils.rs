use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};

pub type F = f64;
pub type Array1F = Array1<F>;
pub type Array2F = Array2<F>;
pub type ArrayView1F<'a> = ArrayView1<'a, F>;
pub type ArrayView2F<'a> = ArrayView2<'a, F>;

pub type GenericResult<T> = anyhow::Result<T>;

pub const EPSILON: F = 1e-16;

pub fn arrays_almost_equal(arr1: &ArrayView1F, arr2: &ArrayView1F) -> bool {
    arr1.len() == arr2.len() && Zip::from(arr1).and(arr2).all(|a, b| (a - b).abs() < 0.001)
}

/// Piecewise linear interpolation of `fp(xp)` at the points `x`.
/// `xp` must be non-decreasing. Points before `xp[0]` take `left` (default `fp[0]`),
/// points after the last one take `right` (default the last `fp`).
pub fn interp(x: &ArrayView1F, xp: &ArrayView1F, fp: &ArrayView1F, left: Option<F>, right: Option<F>) -> Array1F {
    let len = xp.len().min(fp.len());
    if len == 0 {
        return Array1F::from_elem(x.len(), left.unwrap_or(F::NAN));
    }

    let xs: Vec<F> = xp.iter().take(len).copied().collect();
    let first = xs[0];
    let last = xs[len - 1];
    let left = left.unwrap_or(fp[0]);
    let right = right.unwrap_or(fp[len - 1]);

    x.mapv(|value| {
        if value < first {
            left
        } else if value > last {
            right
        } else if value == last {
            fp[len - 1]
        } else {
            // Largest j with xs[j] <= value. NaN in xp leaves no such j
            match xs.partition_point(|o| *o <= value).checked_sub(1) {
                Some(j) if j + 1 < len => {
                    let slope = (fp[j + 1] - fp[j]) / (xs[j + 1] - xs[j]);
                    fp[j] + slope * (value - xs[j])
                }
                _ => F::NAN,
            }
        }
    })
}

/// Trapezoidal integration of `y` over `x`
pub fn trapz(y: &ArrayView1F, x: &ArrayView1F) -> F {
    let len = x.len().min(y.len());
    (1..len).map(|i| (x[i] - x[i - 1]) * (y[i] + y[i - 1]) / 2.0).sum()
}

/// Running sum down each column
pub fn cumsum_rows(array: &ArrayView2F) -> Array2F {
    let mut result = array.to_owned();
    result.accumulate_axis_inplace(Axis(0), |prev, cur| *cur += *prev);
    result
}

/// Index of the first maximum, ignoring NaN. `None` for an empty array
pub fn argmax(array: &ArrayView1F) -> Option<usize> {
    let mut best: Option<(usize, F)> = None;
    for (i, &value) in array.iter().enumerate() {
        if value.is_nan() { continue; }
        match best {
            Some((_, current)) if current >= value => {}
            _ => best = Some((i, value)),
        }
    }
    best.map(|(i, _)| i)
}

/// Indices that sort `values` in descending order. Ties keep their original order
pub fn argsort_desc(values: &ArrayView1F) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
    indices
}
