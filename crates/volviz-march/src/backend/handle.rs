//! Backend-resident volume textures.

use std::any::Any;

use volviz_core::TileLayout;

use crate::{MarchError, MarchResult};

/// Atlas and mask textures owned by a backend.
///
/// Dropping the handle releases the backend memory.
pub trait VolumeHandle: Send + Sync + AsAny {
    /// Tiling of the resident textures.
    fn layout(&self) -> TileLayout;

    /// Bytes of backend memory in use.
    fn size_bytes(&self) -> u64;

    /// Atlas generation last written to this handle.
    fn generation(&self) -> u64;
}

/// Lets a backend recover its concrete handle from a `dyn VolumeHandle`.
pub trait AsAny: 'static {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Concrete view of a handle, or an error naming the expected backend.
pub(crate) fn resident<'a, T: VolumeHandle>(handle: &'a dyn VolumeHandle, backend: &str) -> MarchResult<&'a T> {
    handle
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| MarchError::OperationFailed(format!("volume was not uploaded by the {backend} backend")))
}

/// Mutable form of [`resident`].
pub(crate) fn resident_mut<'a, T: VolumeHandle>(
    handle: &'a mut dyn VolumeHandle,
    backend: &str,
) -> MarchResult<&'a mut T> {
    handle
        .as_any_mut()
        .downcast_mut::<T>()
        .ok_or_else(|| MarchError::OperationFailed(format!("volume was not uploaded by the {backend} backend")))
}
