use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, Mul, Sub};

use ultraviolet::{DVec2, DVec3};

/// Double-precision spatial vector, the dimensionality seam of the crate.
///
/// Every algorithm here is identical in 2D and 3D; only the component count,
/// the number of tree partitions (4 vs 8) and the partition-index formula
/// differ. Implemented for [`DVec2`] and [`DVec3`].
pub trait Coord:
    Copy
    + Clone
    + Debug
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + AddAssign
    + Mul<f64, Output = Self>
    + Div<f64, Output = Self>
    + Send
    + Sync
    + 'static
{
    /// Spatial dimensionality D.
    const DIM: usize;
    /// Child regions per tree node, 2^D.
    const PARTITIONS: usize;

    fn zero() -> Self;

    /// Builds a vector by sampling `f` for each axis in order.
    fn from_fn(f: impl FnMut(usize) -> f64) -> Self;

    fn component(&self, axis: usize) -> f64;

    fn mag(&self) -> f64;

    fn mag_sq(&self) -> f64;

    /// Sign vector selecting a partition: bit `j` of `index` picks +1 (set)
    /// or -1 (clear) on axis `j`.
    fn basis(index: usize) -> Self {
        Self::from_fn(|axis| if index & (1 << axis) != 0 { 1.0 } else { -1.0 })
    }

    /// Builds a vector from a component slice; `None` unless the length is
    /// exactly `DIM`. This is how scenario files select their dimensionality.
    fn from_components(components: &[f64]) -> Option<Self> {
        if components.len() != Self::DIM {
            return None;
        }
        Some(Self::from_fn(|axis| components[axis]))
    }

    fn is_finite(&self) -> bool {
        (0..Self::DIM).all(|axis| self.component(axis).is_finite())
    }

    /// Appends the components, narrowed to f32, to a packed vertex buffer.
    fn push_components(&self, out: &mut Vec<f32>) {
        for axis in 0..Self::DIM {
            out.push(self.component(axis) as f32);
        }
    }
}

impl Coord for DVec2 {
    const DIM: usize = 2;
    const PARTITIONS: usize = 4;

    fn zero() -> Self {
        DVec2::zero()
    }

    fn from_fn(mut f: impl FnMut(usize) -> f64) -> Self {
        DVec2::new(f(0), f(1))
    }

    fn component(&self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => unreachable!("axis {axis} out of range for a 2D vector"),
        }
    }

    fn mag(&self) -> f64 {
        DVec2::mag(self)
    }

    fn mag_sq(&self) -> f64 {
        DVec2::mag_sq(self)
    }
}

impl Coord for DVec3 {
    const DIM: usize = 3;
    const PARTITIONS: usize = 8;

    fn zero() -> Self {
        DVec3::zero()
    }

    fn from_fn(mut f: impl FnMut(usize) -> f64) -> Self {
        DVec3::new(f(0), f(1), f(2))
    }

    fn component(&self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            2 => self.z,
            _ => unreachable!("axis {axis} out of range for a 3D vector"),
        }
    }

    fn mag(&self) -> f64 {
        DVec3::mag(self)
    }

    fn mag_sq(&self) -> f64 {
        DVec3::mag_sq(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basis_enumerates_sign_patterns() {
        // 2D: SW, SE, NW, NE
        assert_eq!(DVec2::basis(0), DVec2::new(-1.0, -1.0));
        assert_eq!(DVec2::basis(1), DVec2::new(1.0, -1.0));
        assert_eq!(DVec2::basis(2), DVec2::new(-1.0, 1.0));
        assert_eq!(DVec2::basis(3), DVec2::new(1.0, 1.0));

        // 3D: bit 2 lifts into the top layer
        assert_eq!(DVec3::basis(0), DVec3::new(-1.0, -1.0, -1.0));
        assert_eq!(DVec3::basis(5), DVec3::new(1.0, -1.0, 1.0));
        assert_eq!(DVec3::basis(7), DVec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn from_components_requires_exact_arity() {
        assert_eq!(
            DVec2::from_components(&[1.0, 2.0]),
            Some(DVec2::new(1.0, 2.0))
        );
        assert_eq!(DVec2::from_components(&[1.0, 2.0, 3.0]), None);
        assert_eq!(DVec3::from_components(&[1.0, 2.0]), None);
    }

    #[test]
    fn component_round_trips() {
        let v = DVec3::new(4.0, -5.0, 6.5);
        assert_eq!(v.component(0), 4.0);
        assert_eq!(v.component(1), -5.0);
        assert_eq!(v.component(2), 6.5);

        let rebuilt = DVec3::from_fn(|axis| v.component(axis));
        assert_eq!(rebuilt, v);
    }
}
