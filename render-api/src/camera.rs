//! Camera collaborator: supplies view/projection and wraps the per-frame draw.

use crate::{CameraMatrices, FrameInput};

pub trait CameraRig {
    /// Matrices for a frame of the given input (aspect comes from the viewport).
    fn matrices(&self, input: &FrameInput) -> CameraMatrices;

    /// Run `draw` inside this camera's scope.
    fn with_camera<R>(&mut self, input: &FrameInput, draw: impl FnOnce(&CameraMatrices) -> R) -> R {
        let matrices = self.matrices(input);
        draw(&matrices)
    }
}
