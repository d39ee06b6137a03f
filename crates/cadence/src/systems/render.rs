//! # Render Seam
//!
//! The loop hands the renderer a read-only view of the graphics pool once
//! per frame. Nothing here touches a GPU; a backend implements
//! [`Renderer`] and turns the view into draw calls.

use cadence_core::GraphicsComponent;
use cadence_shared::{Mat4, Vec3};

/// What the renderer sees each frame.
#[derive(Clone, Copy, Debug)]
pub struct RenderView<'a> {
    /// The dense graphics pool.
    pub graphics: &'a [GraphicsComponent],
    /// Camera view matrix.
    pub view: Mat4,
    /// Seconds since the loop started.
    pub time: f64,
}

/// A rendering backend.
pub trait Renderer {
    /// Draws one frame. Must not retain `view` past the call.
    fn render(&mut self, view: &RenderView<'_>);
}

/// Viewer position, owned by the loop and passed to rendering explicitly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// Eye position.
    pub eye: Vec3,
    /// Point looked at.
    pub target: Vec3,
    /// World up.
    pub up: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 5.0, 10.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
        }
    }
}

impl Camera {
    /// View matrix for the current eye and target.
    #[must_use]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at(self.eye, self.target, self.up)
    }
}

/// One object to draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawRecord {
    /// Model matrix.
    pub model: Mat4,
    /// Camera view matrix.
    pub view: Mat4,
    /// Material index.
    pub material: u32,
    /// Mesh index.
    pub mesh: u32,
}

/// Headless renderer that keeps the last frame's draw records.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    /// Draw records from the most recent frame, visible components only.
    pub records: Vec<DrawRecord>,
    /// Frames rendered.
    pub frames: u64,
    /// Time stamp of the most recent frame.
    pub last_time: f64,
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, view: &RenderView<'_>) {
        self.records.clear();
        self.records.extend(
            view.graphics
                .iter()
                .filter(|g| g.visible != 0)
                .map(|g| DrawRecord {
                    model: g.transform,
                    view: view.view,
                    material: g.material,
                    mesh: g.mesh,
                }),
        );
        self.frames += 1;
        self.last_time = view.time;
    }
}
