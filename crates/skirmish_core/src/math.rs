//! Fixed-point math utilities for deterministic simulation.
//!
//! All game simulation uses fixed-point arithmetic to ensure
//! deterministic behavior across platforms. Floating-point
//! operations can produce different results on different CPUs.
//!
//! Angles are radians normalized into `(-π, π]`. Trigonometry is
//! computed with CORDIC iterations on [`Fixed`] so headings, rotated
//! bounds and spawn points are bit-identical everywhere.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// One, as a constant.
pub const ONE: Fixed = Fixed::from_bits(1 << 32);

/// π/2.
pub const FRAC_PI_2: Fixed = Fixed::from_bits(6_746_518_852);

/// π, defined as exactly twice [`FRAC_PI_2`] so quadrant folds are exact.
pub const PI: Fixed = Fixed::from_bits(2 * 6_746_518_852);

/// 2π.
pub const TAU: Fixed = Fixed::from_bits(4 * 6_746_518_852);

/// π/180.
const DEG_TO_RAD: Fixed = Fixed::from_bits(74_961_321);

/// Reciprocal of the CORDIC gain (≈ 0.607252935).
const CORDIC_GAIN_INV: Fixed = Fixed::from_bits(2_608_131_496);

/// Largest component whose square can be summed twice without overflow.
const SQUARE_SAFE: Fixed = Fixed::from_bits(1 << 46);

/// Largest CORDIC input; the vectoring loop grows `x` by up to about 2.3×.
const CORDIC_SAFE: Fixed = Fixed::from_bits(1 << 60);

/// `atan(2^-i)` in raw 32.32 bits.
const ATAN_TABLE: [i64; 32] = [
    3_373_259_426,
    1_991_351_318,
    1_052_175_346,
    534_100_635,
    268_086_748,
    134_174_063,
    67_103_403,
    33_553_749,
    16_777_131,
    8_388_597,
    4_194_303,
    2_097_152,
    1_048_576,
    524_288,
    262_144,
    131_072,
    65_536,
    32_768,
    16_384,
    8_192,
    4_096,
    2_048,
    1_024,
    512,
    256,
    128,
    64,
    32,
    16,
    8,
    4,
    2,
];

/// Fixed-point 2D vector on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from whole world units.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    ///
    /// Saturates at [`Fixed::MAX`] for distances beyond about 46,000 units.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        (self - other).dot(self - other)
    }

    /// Dot product of two vectors, saturating on overflow.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x
            .saturating_mul(other.x)
            .saturating_add(self.y.saturating_mul(other.y))
    }

    /// Euclidean length.
    ///
    /// Long vectors are divided by their largest component before squaring,
    /// so squaring never overflows.
    #[must_use]
    pub fn length(self) -> Fixed {
        let largest = self.x.abs().max(self.y.abs());
        if largest <= SQUARE_SAFE {
            return fixed_sqrt(self.dot(self));
        }
        let unit = Self::new(self.x / largest, self.y / largest);
        fixed_sqrt(unit.dot(unit)).saturating_mul(largest)
    }

    /// Scale both components.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Unit vector pointing along `heading`.
    #[must_use]
    pub fn from_heading(heading: Fixed) -> Self {
        let (sin, cos) = sin_cos(heading);
        Self::new(cos, sin)
    }

    /// Heading of this vector, or `None` for the zero vector.
    #[must_use]
    pub fn heading(self) -> Option<Fixed> {
        if self == Self::ZERO {
            None
        } else {
            Some(atan2(self.y, self.x))
        }
    }
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

/// Fixed-point 3D vector. `x`/`y` lie on the ground plane, `z` is height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec3Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
    /// Height above the ground plane.
    #[serde(with = "fixed_serde")]
    pub z: Fixed,
}

impl Vec3Fixed {
    /// Create a new 3D vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed, z: Fixed) -> Self {
        Self { x, y, z }
    }

    /// Create a vector from whole world units.
    #[must_use]
    pub fn from_ints(x: i32, y: i32, z: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y), Fixed::from_num(z))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
        z: Fixed::ZERO,
    };

    /// Ground-plane projection.
    #[must_use]
    pub const fn ground(self) -> Vec2Fixed {
        Vec2Fixed::new(self.x, self.y)
    }
}

/// Axis-aligned bounding volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Bounds {
    /// Minimum corner.
    pub min: Vec3Fixed,
    /// Maximum corner.
    pub max: Vec3Fixed,
}

impl Bounds {
    /// Build a box from its centre and half extents.
    #[must_use]
    pub fn from_center_extents(center: Vec3Fixed, extents: Vec3Fixed) -> Self {
        Self {
            min: Vec3Fixed::new(
                center.x - extents.x,
                center.y - extents.y,
                center.z - extents.z,
            ),
            max: Vec3Fixed::new(
                center.x + extents.x,
                center.y + extents.y,
                center.z + extents.z,
            ),
        }
    }

    /// Box enclosing a footprint of half `extent`, standing on the ground at
    /// `position` and rotated by `heading`.
    #[must_use]
    pub fn enclosing(position: Vec2Fixed, heading: Fixed, extent: Vec3Fixed) -> Self {
        let (sin, cos) = sin_cos(heading);
        let (sin, cos) = (sin.abs(), cos.abs());
        let half = Vec3Fixed::new(
            cos * extent.x + sin * extent.y,
            sin * extent.x + cos * extent.y,
            extent.z,
        );
        Self::from_center_extents(Vec3Fixed::new(position.x, position.y, extent.z), half)
    }

    /// Centre of the box.
    #[must_use]
    pub fn center(&self) -> Vec3Fixed {
        let two = Fixed::from_num(2);
        Vec3Fixed::new(
            (self.min.x + self.max.x) / two,
            (self.min.y + self.max.y) / two,
            (self.min.z + self.max.z) / two,
        )
    }

    /// Half extents of the box.
    #[must_use]
    pub fn extents(&self) -> Vec3Fixed {
        let two = Fixed::from_num(2);
        Vec3Fixed::new(
            (self.max.x - self.min.x) / two,
            (self.max.y - self.min.y) / two,
            (self.max.z - self.min.z) / two,
        )
    }

    /// The eight corners of the box.
    #[must_use]
    pub fn corners(&self) -> [Vec3Fixed; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3Fixed::new(lo.x, lo.y, lo.z),
            Vec3Fixed::new(hi.x, lo.y, lo.z),
            Vec3Fixed::new(lo.x, hi.y, lo.z),
            Vec3Fixed::new(hi.x, hi.y, lo.z),
            Vec3Fixed::new(lo.x, lo.y, hi.z),
            Vec3Fixed::new(hi.x, lo.y, hi.z),
            Vec3Fixed::new(lo.x, hi.y, hi.z),
            Vec3Fixed::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Inclusive point containment.
    #[must_use]
    pub fn contains(&self, point: Vec3Fixed) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Ground-plane containment, ignoring height.
    #[must_use]
    pub fn contains_ground(&self, point: Vec2Fixed) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }
}

/// Computes the square root of a fixed-point number using binary search.
fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > ONE { value } else { ONE };

    for _ in 0..64 {
        let mid = low + (high - low) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

/// Convert whole degrees to radians.
#[must_use]
pub fn degrees(deg: i32) -> Fixed {
    Fixed::from_num(deg) * DEG_TO_RAD
}

/// Wrap an angle into `(-π, π]`.
#[must_use]
pub fn normalize_angle(angle: Fixed) -> Fixed {
    let mut wrapped = angle % TAU;
    if wrapped > PI {
        wrapped -= TAU;
    } else if wrapped <= -PI {
        wrapped += TAU;
    }
    wrapped
}

/// Whether two angles name the same heading.
///
/// `π` and `-π` are one heading; both normalize to `π`.
#[must_use]
pub fn same_heading(a: Fixed, b: Fixed) -> bool {
    normalize_angle(a - b) == Fixed::ZERO
}

/// Four-quadrant arctangent of `y / x`. Returns zero for the origin.
#[must_use]
pub fn atan2(y: Fixed, x: Fixed) -> Fixed {
    if y == Fixed::ZERO {
        return if x < Fixed::ZERO { PI } else { Fixed::ZERO };
    }
    if x == Fixed::ZERO {
        return if y > Fixed::ZERO { FRAC_PI_2 } else { -FRAC_PI_2 };
    }

    // Vectoring mode only converges in the right half-plane.
    let (mut x, mut y, mut angle) = if x < Fixed::ZERO {
        if y >= Fixed::ZERO {
            (y, -x, FRAC_PI_2)
        } else {
            (-y, x, -FRAC_PI_2)
        }
    } else {
        (x, y, Fixed::ZERO)
    };
    // Scaling both legs leaves the angle unchanged.
    while x > CORDIC_SAFE || y > CORDIC_SAFE || y < -CORDIC_SAFE {
        x >>= 1u32;
        y >>= 1u32;
    }

    for (shift, &step) in (0u32..).zip(ATAN_TABLE.iter()) {
        if y == Fixed::ZERO {
            break;
        }
        let dx = y >> shift;
        let dy = x >> shift;
        if y > Fixed::ZERO {
            x += dx;
            y -= dy;
            angle += Fixed::from_bits(step);
        } else {
            x -= dx;
            y += dy;
            angle -= Fixed::from_bits(step);
        }
    }

    normalize_angle(angle)
}

/// Sine and cosine of `angle`, returned as `(sin, cos)`.
///
/// Quarter turns are exact.
#[must_use]
pub fn sin_cos(angle: Fixed) -> (Fixed, Fixed) {
    let mut z = normalize_angle(angle);
    if z == Fixed::ZERO {
        return (Fixed::ZERO, ONE);
    }
    if z == FRAC_PI_2 {
        return (ONE, Fixed::ZERO);
    }
    if z == -FRAC_PI_2 {
        return (-ONE, Fixed::ZERO);
    }
    if z == PI {
        return (Fixed::ZERO, -ONE);
    }

    let flipped = if z > FRAC_PI_2 {
        z -= PI;
        true
    } else if z < -FRAC_PI_2 {
        z += PI;
        true
    } else {
        false
    };

    let mut x = CORDIC_GAIN_INV;
    let mut y = Fixed::ZERO;
    for (shift, &step) in (0u32..).zip(ATAN_TABLE.iter()) {
        let dx = y >> shift;
        let dy = x >> shift;
        if z >= Fixed::ZERO {
            x -= dx;
            y += dy;
            z -= Fixed::from_bits(step);
        } else {
            x += dx;
            y -= dy;
            z += Fixed::from_bits(step);
        }
    }

    if flipped {
        (-y, -x)
    } else {
        (y, x)
    }
}

/// Turn `current` toward `target` by at most `max_step` along the shorter arc.
///
/// An exact half turn goes the positive way. Lands exactly on the
/// normalized target once within reach.
#[must_use]
pub fn rotate_towards(current: Fixed, target: Fixed, max_step: Fixed) -> Fixed {
    let diff = normalize_angle(target - current);
    if diff.abs() <= max_step {
        return normalize_angle(target);
    }
    let step = if diff > Fixed::ZERO { max_step } else { -max_step };
    normalize_angle(current + step)
}

/// Move `current` toward `target` by at most `max_step`.
///
/// Lands exactly on `target` once within reach.
#[must_use]
pub fn move_towards(current: Vec2Fixed, target: Vec2Fixed, max_step: Fixed) -> Vec2Fixed {
    let delta = target - current;
    let distance = delta.length();
    if distance == Fixed::ZERO || distance <= max_step {
        return target;
    }
    if max_step <= Fixed::ZERO {
        return current;
    }
    current + delta.scale(max_step / distance)
}
