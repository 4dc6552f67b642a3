//! Pixel arithmetic used by the normalization and averaging stages.
//!
//! Scalars, fixed-length vectors (`[S; N]`) and variable-length vectors (`Vec<S>`) are
//! supported. Vector operations are componentwise.

/// Numeric component type.
pub trait Scalar: Copy + PartialEq + Default + Send + Sync + 'static {
    /// Additive identity.
    const ZERO: Self;

    /// `self / rhs`, or zero when `rhs` is zero.
    ///
    /// Integer quotients that overflow (`MIN / -1`) saturate to `MAX`.
    fn div_or_zero(self, rhs: Self) -> Self;

    /// Widen to `f64` for accumulation.
    fn to_f64(self) -> f64;

    /// Narrow from `f64`, rounding for integer types.
    fn from_f64(v: f64) -> Self;
}

macro_rules! impl_float_scalar {
    ($($t:ty),*) => {$(
        impl Scalar for $t {
            const ZERO: Self = 0.0;

            fn div_or_zero(self, rhs: Self) -> Self {
                if rhs == 0.0 { 0.0 } else { self / rhs }
            }

            fn to_f64(self) -> f64 {
                f64::from(self)
            }

            fn from_f64(v: f64) -> Self {
                v as $t
            }
        }
    )*};
}

macro_rules! impl_int_scalar {
    ($($t:ty),*) => {$(
        impl Scalar for $t {
            const ZERO: Self = 0;

            fn div_or_zero(self, rhs: Self) -> Self {
                if rhs == 0 { 0 } else { self.saturating_div(rhs) }
            }

            fn to_f64(self) -> f64 {
                f64::from(self)
            }

            fn from_f64(v: f64) -> Self {
                v.round() as $t
            }
        }
    )*};
}

impl_float_scalar!(f32, f64);
impl_int_scalar!(u8, u16, u32, i16, i32);

/// Division of a pixel by a reference value with the zero-saturation rule: wherever a
/// reference component is exactly zero, the output component is zero.
///
/// For vectors, a reference shorter than the pixel counts its missing components as zero.
pub trait DivideByReference<R> {
    /// Divide `self` by `reference` componentwise.
    fn divide_by_reference(&self, reference: &R) -> Self;
}

macro_rules! impl_scalar_divide {
    ($($t:ty),*) => {$(
        impl DivideByReference<$t> for $t {
            fn divide_by_reference(&self, reference: &$t) -> Self {
                self.div_or_zero(*reference)
            }
        }
    )*};
}

impl_scalar_divide!(f32, f64, u8, u16, u32, i16, i32);

fn divide_components<S: Scalar>(out: &mut [S], reference: &[S]) {
    for (i, c) in out.iter_mut().enumerate() {
        *c = c.div_or_zero(reference.get(i).copied().unwrap_or(S::ZERO));
    }
}

impl<S: Scalar, const N: usize> DivideByReference<[S; N]> for [S; N] {
    fn divide_by_reference(&self, reference: &[S; N]) -> Self {
        let mut out = *self;
        divide_components(&mut out, reference);
        out
    }
}

impl<S: Scalar> DivideByReference<Vec<S>> for Vec<S> {
    fn divide_by_reference(&self, reference: &Vec<S>) -> Self {
        let mut out = self.clone();
        divide_components(&mut out, reference);
        out
    }
}

impl<S: Scalar, const N: usize> DivideByReference<Vec<S>> for [S; N] {
    fn divide_by_reference(&self, reference: &Vec<S>) -> Self {
        let mut out = *self;
        divide_components(&mut out, reference);
        out
    }
}

impl<S: Scalar, const N: usize> DivideByReference<[S; N]> for Vec<S> {
    fn divide_by_reference(&self, reference: &[S; N]) -> Self {
        let mut out = self.clone();
        divide_components(&mut out, reference);
        out
    }
}

/// Componentwise arithmetic mean over several pixels.
pub trait Average: Sized {
    /// Mean of `samples`; `None` when `samples` is empty or component counts differ.
    fn average(samples: &[&Self]) -> Option<Self>;
}

macro_rules! impl_scalar_average {
    ($($t:ty),*) => {$(
        impl Average for $t {
            fn average(samples: &[&Self]) -> Option<Self> {
                if samples.is_empty() {
                    return None;
                }
                let sum: f64 = samples.iter().map(|s| s.to_f64()).sum();
                Some(<$t>::from_f64(sum / samples.len() as f64))
            }
        }
    )*};
}

impl_scalar_average!(f32, f64, u8, u16, u32, i16, i32);

fn average_components<S: Scalar>(out: &mut [S], samples: &[&[S]]) {
    let n = samples.len() as f64;
    for (i, c) in out.iter_mut().enumerate() {
        let sum: f64 = samples.iter().map(|s| s[i].to_f64()).sum();
        *c = S::from_f64(sum / n);
    }
}

impl<S: Scalar, const N: usize> Average for [S; N] {
    fn average(samples: &[&Self]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let slices: Vec<&[S]> = samples.iter().map(|s| s.as_slice()).collect();
        let mut out = [S::ZERO; N];
        average_components(&mut out, &slices);
        Some(out)
    }
}

impl<S: Scalar> Average for Vec<S> {
    fn average(samples: &[&Self]) -> Option<Self> {
        let len = samples.first()?.len();
        if samples.iter().any(|s| s.len() != len) {
            return None;
        }
        let slices: Vec<&[S]> = samples.iter().map(|s| s.as_slice()).collect();
        let mut out = vec![S::ZERO; len];
        average_components(&mut out, &slices);
        Some(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/image/pixel.rs"]
mod tests;
