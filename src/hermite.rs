/// The four 1D cubic Hermite basis functions at `xi`, ordered as
/// `[value at 0, derivative at 0, value at 1, derivative at 1]`.
///
/// ```
/// use sphere_shell_septum::hermite::cubic_hermite_basis;
///
/// let [f1, f2, f3, f4] = cubic_hermite_basis(0.5);
/// assert!((f1 - 0.5).abs() < 1e-15);
/// assert!((f2 - 0.125).abs() < 1e-15);
/// assert!((f3 - 0.5).abs() < 1e-15);
/// assert!((f4 + 0.125).abs() < 1e-15);
/// ```
pub fn cubic_hermite_basis(xi: f64) -> [f64; 4] {
    let xi2 = xi * xi;
    let xi3 = xi2 * xi;
    [
        1.0 - 3.0 * xi2 + 2.0 * xi3,
        xi - 2.0 * xi2 + xi3,
        3.0 * xi2 - 2.0 * xi3,
        -xi2 + xi3,
    ]
}

/// First derivatives (w.r.t. `xi`) of the functions returned by [cubic_hermite_basis]
pub fn cubic_hermite_basis_d1(xi: f64) -> [f64; 4] {
    let xi2 = xi * xi;
    [
        -6.0 * xi + 6.0 * xi2,
        1.0 - 4.0 * xi + 3.0 * xi2,
        6.0 * xi - 6.0 * xi2,
        -2.0 * xi + 3.0 * xi2,
    ]
}

/// Cubic Hermite interpolation from `v1`, `d1` (end 1) to `v2`, `d2` (end 2) at `xi` in [0, 1]
///
/// ```
/// use sphere_shell_septum::hermite::interpolate_cubic_hermite;
///
/// let v = interpolate_cubic_hermite(&[0.0, 1.0], &[1.0, 0.0], &[1.0, 1.0], &[1.0, 0.0], 0.25);
/// assert!((v[0] - 0.25).abs() < 1e-15);
/// assert!((v[1] - 1.0).abs() < 1e-15);
/// ```
pub fn interpolate_cubic_hermite<const N: usize>(
    v1: &[f64; N],
    d1: &[f64; N],
    v2: &[f64; N],
    d2: &[f64; N],
    xi: f64,
) -> [f64; N] {
    blend(cubic_hermite_basis(xi), v1, d1, v2, d2)
}

/// Derivative w.r.t. `xi` of [interpolate_cubic_hermite]
pub fn interpolate_cubic_hermite_derivative<const N: usize>(
    v1: &[f64; N],
    d1: &[f64; N],
    v2: &[f64; N],
    d2: &[f64; N],
    xi: f64,
) -> [f64; N] {
    blend(cubic_hermite_basis_d1(xi), v1, d1, v2, d2)
}

fn blend<const N: usize>(
    [f1, f2, f3, f4]: [f64; 4],
    v1: &[f64; N],
    d1: &[f64; N],
    v2: &[f64; N],
    d2: &[f64; N],
) -> [f64; N] {
    let mut result = [0.0; N];
    for (i, r) in result.iter_mut().enumerate() {
        *r = f1 * v1[i] + f2 * d1[i] + f3 * v2[i] + f4 * d2[i];
    }
    result
}
