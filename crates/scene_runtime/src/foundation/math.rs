//! Math utilities and types
//!
//! Provides the fundamental math types used by scene nodes and serializable
//! attributes, plus the whitespace-separated text encoding those types use
//! in name-keyed (JSON) data.

pub use nalgebra::{Matrix3, Matrix3x4, Matrix4, Quaternion, Unit, UnitQuaternion, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 3x4 matrix type (rotation/scale plus translation)
pub type Mat3x4 = Matrix3x4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Quaternion type for rotations
pub type Quat = Quaternion<f32>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * UnitQuaternion::from_quaternion(self.rotation).to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

/// 2D integer vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntVector2 {
    /// X coordinate
    pub x: i32,
    /// Y coordinate
    pub y: i32,
}

impl IntVector2 {
    /// Create a new integer vector
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// 2D integer rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntRect {
    /// Left coordinate
    pub left: i32,
    /// Top coordinate
    pub top: i32,
    /// Right coordinate
    pub right: i32,
    /// Bottom coordinate
    pub bottom: i32,
}

impl IntRect {
    /// Create a new integer rectangle
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Rectangle width
    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Rectangle height
    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// RGBA color with float components
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red component
    pub r: f32,
    /// Green component
    pub g: f32,
    /// Blue component
    pub b: f32,
    /// Alpha component
    pub a: f32,
}

impl Color {
    /// Opaque white
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Opaque black
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Create a new color
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// 2D rectangle with float coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Minimum corner
    pub min: Vec2,
    /// Maximum corner
    pub max: Vec2,
}

impl Rect {
    /// Create a new rectangle from min and max points
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Size of the rectangle
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

/// Axis-Aligned Bounding Box for spatial queries
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl BoundingBox {
    /// Create a new bounding box from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create a bounding box centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Get the center of the bounding box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the bounding box
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Check if this bounding box contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this bounding box intersects another
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }
}

/// Whitespace-separated numeric text encoding.
///
/// This is the form vector, matrix and quaternion values take in name-keyed
/// data; `from_text` parses exactly what `to_text` produces, so values
/// round-trip losslessly.
pub trait TextCodec: Sized {
    /// Format as a space-separated component string.
    fn to_text(&self) -> String;
    /// Parse from a space-separated component string.
    fn from_text(text: &str) -> Option<Self>;
}

fn parse_floats<const N: usize>(text: &str) -> Option<[f32; N]> {
    let mut values = [0.0f32; N];
    let mut parts = text.split_whitespace();
    for value in &mut values {
        *value = parts.next()?.parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(values)
}

fn parse_ints<const N: usize>(text: &str) -> Option<[i32; N]> {
    let mut values = [0i32; N];
    let mut parts = text.split_whitespace();
    for value in &mut values {
        *value = parts.next()?.parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(values)
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

impl TextCodec for IntVector2 {
    fn to_text(&self) -> String {
        join(&[self.x, self.y])
    }

    fn from_text(text: &str) -> Option<Self> {
        let [x, y] = parse_ints(text)?;
        Some(Self::new(x, y))
    }
}

impl TextCodec for IntRect {
    fn to_text(&self) -> String {
        join(&[self.left, self.top, self.right, self.bottom])
    }

    fn from_text(text: &str) -> Option<Self> {
        let [left, top, right, bottom] = parse_ints(text)?;
        Some(Self::new(left, top, right, bottom))
    }
}

impl TextCodec for Vec2 {
    fn to_text(&self) -> String {
        join(&[self.x, self.y])
    }

    fn from_text(text: &str) -> Option<Self> {
        let [x, y] = parse_floats(text)?;
        Some(Self::new(x, y))
    }
}

impl TextCodec for Vec3 {
    fn to_text(&self) -> String {
        join(&[self.x, self.y, self.z])
    }

    fn from_text(text: &str) -> Option<Self> {
        let [x, y, z] = parse_floats(text)?;
        Some(Self::new(x, y, z))
    }
}

impl TextCodec for Vec4 {
    fn to_text(&self) -> String {
        join(&[self.x, self.y, self.z, self.w])
    }

    fn from_text(text: &str) -> Option<Self> {
        let [x, y, z, w] = parse_floats(text)?;
        Some(Self::new(x, y, z, w))
    }
}

impl TextCodec for Quat {
    // Scalar part first: "w x y z".
    fn to_text(&self) -> String {
        join(&[self.coords.w, self.coords.x, self.coords.y, self.coords.z])
    }

    fn from_text(text: &str) -> Option<Self> {
        let [w, x, y, z] = parse_floats(text)?;
        Some(Self::new(w, x, y, z))
    }
}

impl TextCodec for Color {
    fn to_text(&self) -> String {
        join(&[self.r, self.g, self.b, self.a])
    }

    fn from_text(text: &str) -> Option<Self> {
        let [r, g, b, a] = parse_floats(text)?;
        Some(Self::new(r, g, b, a))
    }
}

impl TextCodec for Rect {
    fn to_text(&self) -> String {
        join(&[self.min.x, self.min.y, self.max.x, self.max.y])
    }

    fn from_text(text: &str) -> Option<Self> {
        let [min_x, min_y, max_x, max_y] = parse_floats(text)?;
        Some(Self::new(Vec2::new(min_x, min_y), Vec2::new(max_x, max_y)))
    }
}

impl TextCodec for BoundingBox {
    fn to_text(&self) -> String {
        join(&[
            self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z,
        ])
    }

    fn from_text(text: &str) -> Option<Self> {
        let [min_x, min_y, min_z, max_x, max_y, max_z] = parse_floats(text)?;
        Some(Self::new(
            Vec3::new(min_x, min_y, min_z),
            Vec3::new(max_x, max_y, max_z),
        ))
    }
}

// Matrices serialize component-wise in nalgebra's native column-major order,
// in both text and binary form.
impl TextCodec for Mat3 {
    fn to_text(&self) -> String {
        join(&self.iter().copied().collect::<Vec<_>>())
    }

    fn from_text(text: &str) -> Option<Self> {
        let values = parse_floats::<9>(text)?;
        Some(Self::from_iterator(values))
    }
}

impl TextCodec for Mat3x4 {
    fn to_text(&self) -> String {
        join(&self.iter().copied().collect::<Vec<_>>())
    }

    fn from_text(text: &str) -> Option<Self> {
        let values = parse_floats::<12>(text)?;
        Some(Self::from_iterator(values))
    }
}

impl TextCodec for Mat4 {
    fn to_text(&self) -> String {
        join(&self.iter().copied().collect::<Vec<_>>())
    }

    fn from_text(text: &str) -> Option<Self> {
        let values = parse_floats::<16>(text)?;
        Some(Self::from_iterator(values))
    }
}
