//! 2D vector math shared by the world, player and raycasting code.
//!
//! One value type, [`Vector2<T>`], covers both the integer flavour (map cells)
//! and the floating flavour (positions, directions). Numeric capabilities come
//! from the [`Scalar`] and [`Float`] traits rather than from separate vector
//! types. [`VecCell`] is the only mutable variant and exists for player state.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Numeric kinds a [`Vector2`] can be built over.
pub trait Scalar:
    Copy
    + PartialOrd
    + fmt::Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    const ZERO: Self;
    const ONE: Self;

    fn abs(self) -> Self;

    #[inline]
    fn min_of(self, other: Self) -> Self {
        if other < self { other } else { self }
    }

    #[inline]
    fn max_of(self, other: Self) -> Self {
        if other > self { other } else { self }
    }
}

/// Floating-point kinds: rotation, length and conversion to map cells.
pub trait Float: Scalar {
    fn sqrt(self) -> Self;
    fn sin_cos(self) -> (Self, Self);
    fn acos(self) -> Self;
    fn floor(self) -> Self;
    fn fract(self) -> Self;
    fn is_finite(self) -> bool;
    fn to_i32(self) -> i32;
    fn from_i32(v: i32) -> Self;
}

macro_rules! impl_scalar {
    ($($t:ty),*) => {$(
        impl Scalar for $t {
            const ZERO: Self = 0 as $t;
            const ONE: Self = 1 as $t;

            #[inline]
            fn abs(self) -> Self {
                <$t>::abs(self)
            }
        }
    )*};
}

macro_rules! impl_float {
    ($($t:ty),*) => {$(
        impl Float for $t {
            #[inline]
            fn sqrt(self) -> Self {
                <$t>::sqrt(self)
            }
            #[inline]
            fn sin_cos(self) -> (Self, Self) {
                <$t>::sin_cos(self)
            }
            #[inline]
            fn acos(self) -> Self {
                <$t>::acos(self)
            }
            #[inline]
            fn floor(self) -> Self {
                <$t>::floor(self)
            }
            #[inline]
            fn fract(self) -> Self {
                self - <$t>::floor(self)
            }
            #[inline]
            fn is_finite(self) -> bool {
                <$t>::is_finite(self)
            }
            #[inline]
            fn to_i32(self) -> i32 {
                <$t>::floor(self) as i32
            }
            #[inline]
            fn from_i32(v: i32) -> Self {
                v as $t
            }
        }
    )*};
}

impl_scalar!(i32, i64, f32, f64);
impl_float!(f32, f64);

/// Immutable 2-component vector.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Vector2<T> {
    pub x: T,
    pub y: T,
}

pub type Vec2f = Vector2<f32>;
pub type Vec2i = Vector2<i32>;

impl<T> Vector2<T> {
    #[inline]
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T: fmt::Debug> fmt::Debug for Vector2<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?}, {:?})", self.x, self.y)
    }
}

impl<T: Scalar> Vector2<T> {
    pub const ZERO: Self = Self::new(T::ZERO, T::ZERO);

    #[inline]
    pub fn splat(v: T) -> Self {
        Self::new(v, v)
    }

    #[inline]
    pub fn dot(self, other: Self) -> T {
        self.x * other.x + self.y * other.y
    }

    /// Squared magnitude, exact for the integer flavour.
    #[inline]
    pub fn length_squared(self) -> T {
        self.dot(self)
    }

    /// Componentwise absolute value.
    #[inline]
    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs())
    }

    /// Componentwise product.
    #[inline]
    pub fn mul_elem(self, other: Self) -> Self {
        Self::new(self.x * other.x, self.y * other.y)
    }

    /// Componentwise quotient. Divisors are the caller's concern; for floats a
    /// zero component yields an infinity, which the DDA relies on.
    #[inline]
    pub fn div_elem(self, other: Self) -> Self {
        Self::new(self.x / other.x, self.y / other.y)
    }

    #[inline]
    pub fn clamp(self, min: Self, max: Self) -> Self {
        Self::new(
            self.x.max_of(min.x).min_of(max.x),
            self.y.max_of(min.y).min_of(max.y),
        )
    }
}

impl<T: Float> Vector2<T> {
    #[inline]
    pub fn length(self) -> T {
        self.length_squared().sqrt()
    }

    /// Rotate counter-clockwise by `theta` radians:
    /// `(x·cosθ − y·sinθ, x·sinθ + y·cosθ)`.
    #[inline]
    pub fn rotate(self, theta: T) -> Self {
        let (s, c) = theta.sin_cos();
        Self::new(self.x * c - self.y * s, self.x * s + self.y * c)
    }

    /// Unit vector in the same direction. The zero vector maps to itself.
    #[inline]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == T::ZERO { self } else { self / len }
    }

    /// Angle in radians between two non-zero vectors.
    pub fn angle_between(self, other: Self) -> T {
        let cos = self.dot(other) / (self.length() * other.length());
        // Rounding can push the quotient just outside [-1, 1].
        cos.max_of(-T::ONE).min_of(T::ONE).acos()
    }

    #[inline]
    pub fn floor(self) -> Self {
        Self::new(self.x.floor(), self.y.floor())
    }

    /// Fractional part of each component, always in `[0, 1)`.
    #[inline]
    pub fn fract(self) -> Self {
        Self::new(self.x.fract(), self.y.fract())
    }

    /// The integer cell containing this point.
    #[inline]
    pub fn to_cell(self) -> Vec2i {
        Vector2::new(self.x.to_i32(), self.y.to_i32())
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Vec2i {
    /// Floating copy of an integer vector.
    #[inline]
    pub fn to_float<F: Float>(self) -> Vector2<F> {
        Vector2::new(F::from_i32(self.x), F::from_i32(self.y))
    }
}

impl<T: Scalar> Add for Vector2<T> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl<T: Scalar> Sub for Vector2<T> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl<T: Scalar> Neg for Vector2<T> {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl<T: Scalar> Mul<T> for Vector2<T> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: T) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl<T: Scalar> Div<T> for Vector2<T> {
    type Output = Self;
    #[inline]
    fn div(self, rhs: T) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl<T> From<(T, T)> for Vector2<T> {
    fn from((x, y): (T, T)) -> Self {
        Self::new(x, y)
    }
}

/// In-place mutable vector for state that is updated every frame.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct VecCell<T> {
    value: Vector2<T>,
}

impl<T: Scalar> VecCell<T> {
    pub fn new(value: Vector2<T>) -> Self {
        Self { value }
    }

    #[inline]
    pub fn get(&self) -> Vector2<T> {
        self.value
    }

    #[inline]
    pub fn set(&mut self, value: Vector2<T>) {
        self.value = value;
    }

    #[inline]
    pub fn set_x(&mut self, x: T) {
        self.value.x = x;
    }

    #[inline]
    pub fn set_y(&mut self, y: T) {
        self.value.y = y;
    }

    /// Clamp each axis independently into `[min, max]`.
    pub fn clamp_axes(&mut self, x_min: T, x_max: T, y_min: T, y_max: T) {
        self.value = self
            .value
            .clamp(Vector2::new(x_min, y_min), Vector2::new(x_max, y_max));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn close(a: Vec2f, b: Vec2f) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn arithmetic_int_and_float() {
        let a = Vec2i::new(3, 4);
        let b = Vec2i::new(-1, 2);
        assert_eq!(a + b, Vec2i::new(2, 6));
        assert_eq!(a - b, Vec2i::new(4, 2));
        assert_eq!(a * 2, Vec2i::new(6, 8));
        assert_eq!(a.dot(b), 5);
        assert_eq!(b.abs(), Vec2i::new(1, 2));
        assert_eq!(a.length_squared(), 25);

        let f: Vec2f = a.to_float();
        assert_eq!(f.length(), 5.0);
        assert_eq!(f.mul_elem(Vec2f::new(0.5, 2.0)), Vec2f::new(1.5, 8.0));
    }

    #[test]
    fn integer_vectors_are_eq() {
        fn is_eq<T: Eq>() {}
        is_eq::<Vec2i>();
        is_eq::<crate::error::RaycastError>();
        assert_eq!(Vec2i::new(1, -2), Vec2i::from((1, -2)));
    }

    #[test]
    fn rotate_quarter_turn_is_counter_clockwise() {
        let v = Vec2f::new(1.0, 0.0);
        assert!(close(v.rotate(FRAC_PI_2), Vec2f::new(0.0, 1.0)));
        assert!(close(v.rotate(PI), Vec2f::new(-1.0, 0.0)));
    }

    #[test]
    fn angle_between_axes() {
        let a = Vec2f::new(1.0, 0.0);
        let b = Vec2f::new(0.0, 3.0);
        assert!((a.angle_between(b) - FRAC_PI_2).abs() < 1e-5);
        assert!(a.angle_between(a).abs() < 1e-3);
    }

    #[test]
    fn division_by_zero_component_saturates() {
        let inv = Vec2f::splat(1.0).div_elem(Vec2f::new(0.0, 2.0)).abs();
        assert!(inv.x.is_infinite());
        assert_eq!(inv.y, 0.5);
    }

    #[test]
    fn cell_and_fract_handle_negatives() {
        let p = Vec2f::new(-0.25, 2.75);
        assert_eq!(p.to_cell(), Vec2i::new(-1, 2));
        assert!(close(p.fract(), Vec2f::new(0.75, 0.75)));
    }

    #[test]
    fn vec_cell_clamps_each_axis() {
        let mut c = VecCell::new(Vec2f::new(-3.0, 9.0));
        c.clamp_axes(0.5, 4.5, 0.5, 3.5);
        assert_eq!(c.get(), Vec2f::new(0.5, 3.5));
        c.set_x(2.0);
        assert_eq!(c.get().x, 2.0);
    }

    proptest! {
        #[test]
        fn rotation_preserves_unit_length(angle in -10.0f32..10.0, theta in -20.0f32..20.0) {
            let dir = Vec2f::new(1.0, 0.0).rotate(angle);
            let rotated = dir.rotate(theta);
            prop_assert!((rotated.length() - 1.0).abs() < 1e-4);
        }

        #[test]
        fn normalize_yields_unit(x in -100.0f32..100.0, y in -100.0f32..100.0) {
            prop_assume!(x.abs() > 1e-3 || y.abs() > 1e-3);
            prop_assert!((Vec2f::new(x, y).normalize().length() - 1.0).abs() < 1e-4);
        }
    }
}
