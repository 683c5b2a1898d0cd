use glam::{Quat, Vec3};

use crate::types::{ContainerId, InstanceId, PieceKind, TemplateHandle};

/// The instancing collaborator the generator places pieces through.
///
/// Implementations own every container and piece they hand out. All
/// operations are total: resource exhaustion is not modelled, so nothing
/// here returns a `Result`.
pub trait Instancer {
    /// Create an empty grouping node.
    fn create_container(&mut self, name: &str) -> ContainerId;

    /// Materialise `template` at `position`/`rotation` under `parent`.
    fn instantiate(
        &mut self,
        template: TemplateHandle,
        kind: PieceKind,
        position: Vec3,
        rotation: Quat,
        parent: ContainerId,
    ) -> InstanceId;

    /// Destroy a container and, transitively, every piece it owns.
    /// Destroying an unknown or already destroyed container is a no-op.
    fn destroy(&mut self, container: ContainerId);
}
