use nalgebra::{Isometry3, Matrix3, Point3, Rotation3, Translation3, UnitQuaternion, Vector3};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigidFitError {
    #[error("point set sizes differ (src={src}, dst={dst})")]
    LengthMismatch { src: usize, dst: usize },
    #[error("need at least 3 correspondences, got {0}")]
    TooFewPoints(usize),
    #[error("non-finite coordinate in input")]
    NonFinite,
    #[error("SVD of the cross-covariance did not converge")]
    SvdFailed,
}

/// Closed-form rigid fit (Kabsch): find `T` minimizing `sum |T*src_i - dst_i|^2`.
///
/// With exactly three non-collinear noise-free correspondences the result is
/// an exact alignment. The rotation is forced to be proper (det = +1).
pub fn fit_rigid_transform(
    src: &[Point3<f64>],
    dst: &[Point3<f64>],
) -> Result<Isometry3<f64>, RigidFitError> {
    if src.len() != dst.len() {
        return Err(RigidFitError::LengthMismatch {
            src: src.len(),
            dst: dst.len(),
        });
    }
    if src.len() < 3 {
        return Err(RigidFitError::TooFewPoints(src.len()));
    }
    if src
        .iter()
        .chain(dst.iter())
        .any(|p| !p.coords.iter().all(|v| v.is_finite()))
    {
        return Err(RigidFitError::NonFinite);
    }

    let n = src.len() as f64;
    let mut c_src = Vector3::zeros();
    let mut c_dst = Vector3::zeros();
    for (ps, pd) in src.iter().zip(dst.iter()) {
        c_src += ps.coords;
        c_dst += pd.coords;
    }
    c_src /= n;
    c_dst /= n;

    let mut h = Matrix3::zeros();
    for (ps, pd) in src.iter().zip(dst.iter()) {
        h += (pd.coords - c_dst) * (ps.coords - c_src).transpose();
    }

    let svd = h.svd(true, true);
    let u = svd.u.ok_or(RigidFitError::SvdFailed)?;
    let v_t = svd.v_t.ok_or(RigidFitError::SvdFailed)?;
    let mut r = u * v_t;
    if r.determinant() < 0.0 {
        let mut u_fix = u;
        u_fix.column_mut(2).neg_mut();
        r = u_fix * v_t;
    }

    let t = c_dst - r * c_src;
    let rot = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r));
    Ok(Isometry3::from_parts(Translation3::from(t), rot))
}
