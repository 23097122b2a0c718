//! # Camera — View, Projection, and Light-Space Transforms
//!
//! The camera owns the scene's viewing parameters (eye position, target,
//! vertical field of view, viewport size) and derives three matrices from
//! them every frame:
//!
//! - **View matrix**: world → camera space. Built from an orthonormal basis
//!   and inverted with the closed-form *Euclidean inverse* — the transpose of
//!   the rotation block plus a rotated negated translation. A rigid transform
//!   (rotation + translation only) never needs a general 4x4 inverse.
//! - **Projection matrix**: camera → clip space. A symmetric perspective
//!   frustum with a fixed depth range (`NEAR_PLANE`..`FAR_PLANE`, not
//!   scene-adaptive).
//! - **Light-space matrix**: the same basis/inverse/projection construction
//!   with the light position substituted for the eye. Used to render the
//!   shadow depth pass and to sample the shadow map in the color pass, so a
//!   frame computes it once and feeds both consumers the same value.
//!
//! All three are recomputed on demand — the math is a handful of
//! multiplications, far too cheap to be worth cache invalidation logic.
//!
//! ## Basis Construction
//!
//! ```text
//! z = normalize(eye - target)      (camera looks down -z)
//! x = normalize(up × z)
//! y = z × x
//! ```
//!
//! The up vector is fixed to +Y. A look direction parallel to +Y, or
//! `eye == target`, degenerates the basis — that is the caller's contract to
//! avoid, not something recovered here.
//!
//! ## Clip-Space Convention
//!
//! The projection matrix maps depth to the symmetric [-1, 1] range. wgpu
//! clips z to [0, 1], so [`FrameMatrices`] composes every GPU-bound matrix
//! with [`DEPTH_RANGE_ADAPTER`], the usual GL→wgpu depth remap. The
//! projection matrix itself keeps the symmetric form.

use glam::{Mat3, Mat4, Vec3, Vec4};

/// Near clipping plane distance. Fixed frustum depth range by design.
pub const NEAR_PLANE: f32 = 1.0;

/// Far clipping plane distance. Fixed frustum depth range by design.
pub const FAR_PLANE: f32 = 1000.0;

/// World up vector. The camera basis is always built against +Y.
pub const WORLD_UP: Vec3 = Vec3::Y;

/// Remaps clip-space depth from the symmetric [-1, 1] range the projection
/// produces to the [0, 1] range wgpu clips against: `z' = 0.5·z + 0.5·w`.
pub const DEPTH_RANGE_ADAPTER: Mat4 = Mat4::from_cols(
    Vec4::new(1.0, 0.0, 0.0, 0.0),
    Vec4::new(0.0, 1.0, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 0.5, 0.0),
    Vec4::new(0.0, 0.0, 0.5, 1.0),
);

/// Viewing parameters and the transform math derived from them.
///
/// Mutable state is limited to the eye position (moved by input), the target,
/// and the viewport size (updated on window resize). Everything else is
/// derived per call.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Eye position in world space.
    pub view_from: Vec3,
    /// Point the camera looks at, in world space.
    pub view_at: Vec3,
    fov_y: f32,
    width: u32,
    height: u32,
}

impl Camera {
    /// Create a camera. `fov_y` is the vertical field of view in radians and
    /// must be strictly positive.
    pub fn new(width: u32, height: u32, fov_y: f32, view_from: Vec3, view_at: Vec3) -> Self {
        assert!(fov_y > 0.0, "field of view must be strictly positive");
        Self {
            view_from,
            view_at,
            fov_y,
            width,
            height,
        }
    }

    /// Vertical field of view in radians.
    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    /// Set the vertical field of view. Must be strictly positive.
    pub fn set_fov_y(&mut self, fov_y: f32) {
        assert!(fov_y > 0.0, "field of view must be strictly positive");
        self.fov_y = fov_y;
    }

    /// Update the viewport size. Call on window resize so the aspect ratio
    /// (and with it the projection matrix) follows the surface.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    /// Viewport width / height.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Focal length in pixels: `height / (2·tan(fov_y/2))`.
    pub fn focal_length(&self) -> f32 {
        self.height as f32 / (2.0 * (self.fov_y * 0.5).tan())
    }

    /// World → camera matrix, built from the orthonormal camera basis and
    /// inverted in closed form.
    pub fn view_matrix(&self) -> Mat4 {
        world_to_eye(self.view_from, self.view_at)
    }

    /// Camera → clip matrix for the current fov and aspect ratio.
    pub fn projection_matrix(&self) -> Mat4 {
        perspective(self.fov_y, self.aspect())
    }

    /// Combined light-view-projection matrix: the light position takes the
    /// eye's place, looking at the camera target, through the same frustum
    /// shape. One frame must compute this once and reuse the value for both
    /// the depth pass and the color pass.
    pub fn light_space_matrix(&self, light_pos: Vec3) -> Mat4 {
        self.projection_matrix() * world_to_eye(light_pos, self.view_at)
    }
}

/// Orthonormal camera basis for an eye looking at a target.
fn camera_basis(eye: Vec3, target: Vec3) -> (Vec3, Vec3, Vec3) {
    let z = (eye - target).normalize();
    let x = WORLD_UP.cross(z).normalize();
    let y = z.cross(x);
    (x, y, z)
}

/// Build the camera-to-world matrix from basis + eye, then return its
/// Euclidean inverse (world → eye).
fn world_to_eye(eye: Vec3, target: Vec3) -> Mat4 {
    let (x, y, z) = camera_basis(eye, target);
    let eye_to_world = Mat4::from_cols(
        x.extend(0.0),
        y.extend(0.0),
        z.extend(0.0),
        eye.extend(1.0),
    );
    euclidean_inverse(eye_to_world)
}

/// Closed-form inverse of a rigid transform: transpose the rotation block,
/// rotate-negate the translation. Only valid for rotation + translation
/// matrices — exactly what the camera basis construction produces.
pub(crate) fn euclidean_inverse(m: Mat4) -> Mat4 {
    let rt = Mat3::from_mat4(m).transpose();
    let t = m.col(3).truncate();
    let ti = -(rt * t);
    Mat4::from_cols(
        rt.x_axis.extend(0.0),
        rt.y_axis.extend(0.0),
        rt.z_axis.extend(0.0),
        ti.extend(1.0),
    )
}

/// Symmetric perspective frustum with the fixed near/far planes.
///
/// With `h = n·tan(fov_y/2)` and `w = aspect·h`:
///
/// ```text
/// | n/w  0    0            0          |
/// | 0    n/h  0            0          |
/// | 0    0    (n+f)/(n-f)  2nf/(n-f)  |
/// | 0    0    -1           1          |
/// ```
///
/// Depth lands in [-1, 1]; see [`DEPTH_RANGE_ADAPTER`].
fn perspective(fov_y: f32, aspect: f32) -> Mat4 {
    let n = NEAR_PLANE;
    let f = FAR_PLANE;
    let h = n * (fov_y * 0.5).tan();
    let w = aspect * h;
    let a = (n + f) / (n - f);
    let b = (2.0 * n * f) / (n - f);
    Mat4::from_cols(
        Vec4::new(n / w, 0.0, 0.0, 0.0),
        Vec4::new(0.0, n / h, 0.0, 0.0),
        Vec4::new(0.0, 0.0, a, -1.0),
        Vec4::new(0.0, 0.0, b, 1.0),
    )
}

/// All matrices one frame needs, computed in one place.
///
/// Both render passes consume the same instance, which is what guarantees the
/// light-space matrix used to render the shadow map and the one used to
/// sample it are identical.
#[derive(Debug, Clone)]
pub struct FrameMatrices {
    /// Model matrix: spin rotation about the world Z axis.
    pub model: Mat4,
    /// World → camera.
    pub view: Mat4,
    /// Camera → clip (symmetric depth range).
    pub projection: Mat4,
    /// Depth-adapted projection · view · model, ready for the GPU.
    pub mvp: Mat4,
    /// Depth-adapted light-space · model. `None` when shadows are off.
    pub mlp: Option<Mat4>,
    /// Inverse transpose of the model matrix, for normal transformation.
    pub normal: Mat4,
    /// Eye position (specular term input).
    pub view_pos: Vec3,
    /// Light position in world space.
    pub light_pos: Vec3,
}

impl FrameMatrices {
    /// Compute the frame's matrix set. `spin` is the animation angle in
    /// radians; `shadows` controls whether the light-space matrix exists at
    /// all this frame.
    pub fn compute(camera: &Camera, light_pos: Vec3, spin: f32, shadows: bool) -> Self {
        let model = Mat4::from_rotation_z(spin);
        let view = camera.view_matrix();
        let projection = camera.projection_matrix();
        let mvp = DEPTH_RANGE_ADAPTER * projection * view * model;
        let mlp = shadows
            .then(|| DEPTH_RANGE_ADAPTER * camera.light_space_matrix(light_pos) * model);
        let normal = model.inverse().transpose();

        Self {
            model,
            view,
            projection,
            mvp,
            mlp,
            normal,
            view_pos: camera.view_from,
            light_pos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic xorshift, good enough to scatter camera placements.
    struct XorShift(u64);

    impl XorShift {
        fn next_u64(&mut self) -> u64 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            self.0 = x;
            x
        }

        /// Uniform float in [lo, hi).
        fn next_f32(&mut self, lo: f32, hi: f32) -> f32 {
            let unit = (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32;
            lo + unit * (hi - lo)
        }

        fn next_vec3(&mut self, lo: f32, hi: f32) -> Vec3 {
            Vec3::new(
                self.next_f32(lo, hi),
                self.next_f32(lo, hi),
                self.next_f32(lo, hi),
            )
        }
    }

    /// A hundred randomized placements, eyes kept away from the target and
    /// off the vertical axis so the basis never degenerates.
    fn random_placements() -> Vec<(Vec3, Vec3)> {
        let mut rng = XorShift(0x9e3779b97f4a7c15);
        let mut placements = Vec::new();
        while placements.len() < 100 {
            let at = rng.next_vec3(-10.0, 10.0);
            let from = at + rng.next_vec3(-20.0, 20.0);
            let look = from - at;
            if look.length() < 1.0 {
                continue;
            }
            // Reject near-vertical look directions (parallel to up).
            if look.normalize().dot(WORLD_UP).abs() > 0.99 {
                continue;
            }
            placements.push((from, at));
        }
        placements
    }

    #[test]
    fn view_rotation_block_is_orthonormal() {
        for (from, at) in random_placements() {
            let camera = Camera::new(640, 480, 0.785, from, at);
            let view = camera.view_matrix();
            let r = Mat3::from_mat4(view);
            let cols = [r.x_axis, r.y_axis, r.z_axis];
            for (i, c) in cols.iter().enumerate() {
                assert!(
                    (c.length() - 1.0).abs() < 1e-4,
                    "column {i} not unit length for eye {from:?}"
                );
            }
            for i in 0..3 {
                for j in (i + 1)..3 {
                    assert!(
                        cols[i].dot(cols[j]).abs() < 1e-4,
                        "columns {i},{j} not orthogonal for eye {from:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn euclidean_inverse_composes_to_identity() {
        for (from, at) in random_placements() {
            let (x, y, z) = camera_basis(from, at);
            let eye_to_world = Mat4::from_cols(
                x.extend(0.0),
                y.extend(0.0),
                z.extend(0.0),
                from.extend(1.0),
            );
            let composed = euclidean_inverse(eye_to_world) * eye_to_world;
            assert!(
                composed.abs_diff_eq(Mat4::IDENTITY, 1e-4),
                "inverse · matrix should be identity, got {composed:?}"
            );
        }
    }

    #[test]
    fn view_maps_eye_to_origin_and_target_onto_negative_z() {
        let from = Vec3::new(3.0, 1.0, 8.0);
        let at = Vec3::new(0.0, 0.5, 0.0);
        let camera = Camera::new(800, 600, 0.9, from, at);
        let view = camera.view_matrix();

        let eye = view * from.extend(1.0);
        assert!(eye.truncate().length() < 1e-4, "eye should map to origin");

        let target = view * at.extend(1.0);
        let dist = (at - from).length();
        assert!(
            target.truncate().abs_diff_eq(Vec3::new(0.0, 0.0, -dist), 1e-3),
            "target should sit on -z at distance {dist}, got {target:?}"
        );
    }

    #[test]
    fn projection_matches_closed_form() {
        let camera = Camera::new(800, 600, std::f32::consts::FRAC_PI_2, Vec3::ZERO, Vec3::NEG_Z);
        let p = camera.projection_matrix();

        let n = NEAR_PLANE;
        let f = FAR_PLANE;
        let h = n * (std::f32::consts::FRAC_PI_2 * 0.5).tan();
        let w = (800.0 / 600.0) * h;

        assert!((p.col(0).x - n / w).abs() < 1e-5);
        assert!((p.col(1).y - n / h).abs() < 1e-5);
        assert!((p.col(2).z - (n + f) / (n - f)).abs() < 1e-5);
        assert!((p.col(3).z - (2.0 * n * f) / (n - f)).abs() < 1e-5);
        assert!((p.col(2).w - -1.0).abs() < 1e-6);
        assert!((p.col(3).w - 1.0).abs() < 1e-6);
        // Everything else stays zero.
        assert_eq!(p.col(0).y, 0.0);
        assert_eq!(p.col(0).z, 0.0);
        assert_eq!(p.col(1).x, 0.0);
        assert_eq!(p.col(2).x, 0.0);
        assert_eq!(p.col(3).x, 0.0);
    }

    #[test]
    fn focal_length_follows_height_and_fov() {
        let camera = Camera::new(640, 480, std::f32::consts::FRAC_PI_2, Vec3::ONE, Vec3::ZERO);
        // tan(45°) = 1, so f_y = height / 2.
        assert!((camera.focal_length() - 240.0).abs() < 1e-3);
    }

    #[test]
    fn light_space_matrix_is_deterministic() {
        let camera = Camera::new(1280, 720, 0.7, Vec3::new(5.0, 2.0, 9.0), Vec3::ZERO);
        let light = Vec3::new(-4.0, 10.0, 3.0);
        let a = camera.light_space_matrix(light);
        let b = camera.light_space_matrix(light);
        assert_eq!(
            a.to_cols_array(),
            b.to_cols_array(),
            "identical inputs must produce bit-identical light matrices"
        );
    }

    #[test]
    fn frame_matrices_share_one_light_matrix() {
        let camera = Camera::new(1280, 720, 0.7, Vec3::new(5.0, 2.0, 9.0), Vec3::ZERO);
        let light = Vec3::new(-4.0, 10.0, 3.0);
        let frame = FrameMatrices::compute(&camera, light, 0.25, true);

        let expected = DEPTH_RANGE_ADAPTER
            * camera.light_space_matrix(light)
            * Mat4::from_rotation_z(0.25);
        assert_eq!(
            frame.mlp.unwrap().to_cols_array(),
            expected.to_cols_array(),
            "both passes read this one value; it must match the definition bit for bit"
        );
    }

    #[test]
    fn frame_matrices_skip_light_space_without_shadows() {
        let camera = Camera::new(1280, 720, 0.7, Vec3::new(5.0, 2.0, 9.0), Vec3::ZERO);
        let frame = FrameMatrices::compute(&camera, Vec3::Y, 0.0, false);
        assert!(frame.mlp.is_none());
    }

    #[test]
    #[should_panic(expected = "field of view must be strictly positive")]
    fn zero_fov_is_rejected() {
        Camera::new(800, 600, 0.0, Vec3::ONE, Vec3::ZERO);
    }

    #[test]
    #[should_panic(expected = "field of view must be strictly positive")]
    fn negative_fov_is_rejected_on_set() {
        let mut camera = Camera::new(800, 600, 1.0, Vec3::ONE, Vec3::ZERO);
        camera.set_fov_y(-0.5);
    }
}
