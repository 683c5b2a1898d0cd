use glam::{Quat, Vec3};
use roadspace_common::{ContainerId, InstanceId, Instancer, PieceKind, TemplateHandle, Transform};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An event record produced by every mutation to the scene.
///
/// The log is enough to rebuild the scene from scratch with [`Scene::replay`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneEvent {
    /// A segment container was created.
    ContainerCreated { id: ContainerId, name: String },
    /// A piece was placed under a container.
    PieceInstantiated { piece: Piece },
    /// A container and all of its pieces were destroyed.
    ContainerDestroyed { id: ContainerId, piece_count: usize },
}

/// A placed instance. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Piece {
    pub id: InstanceId,
    pub parent: ContainerId,
    pub template: TemplateHandle,
    pub kind: PieceKind,
    pub transform: Transform,
}

/// A grouping node owning the pieces of one segment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    /// Pieces in placement order.
    pub pieces: Vec<InstanceId>,
}

/// The authoritative scene.
///
/// Containers and pieces live in BTreeMaps so iteration order is the
/// allocation order on every platform. Ids are allocated from monotonically
/// increasing counters and never reused.
///
/// Event recording is off unless the scene is built with
/// [`Scene::with_event_log`]; a generator that runs indefinitely would
/// otherwise grow the log without bound.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    containers: BTreeMap<ContainerId, Container>,
    pieces: BTreeMap<InstanceId, Piece>,
    next_container: u64,
    next_instance: u64,
    /// Append-only event log of all mutations, when recording.
    #[serde(skip)]
    event_log: Vec<SceneEvent>,
    #[serde(skip)]
    recording: bool,
}

impl Scene {
    /// Scene without event recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scene that records every mutation for [`Scene::replay`].
    pub fn with_event_log() -> Self {
        Self {
            recording: true,
            ..Self::default()
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    /// Number of live pieces of the given kind.
    pub fn count_kind(&self, kind: PieceKind) -> usize {
        self.pieces.values().filter(|p| p.kind == kind).count()
    }

    pub fn contains(&self, id: ContainerId) -> bool {
        self.containers.contains_key(&id)
    }

    pub fn container(&self, id: ContainerId) -> Option<&Container> {
        self.containers.get(&id)
    }

    pub fn containers(&self) -> &BTreeMap<ContainerId, Container> {
        &self.containers
    }

    pub fn piece(&self, id: InstanceId) -> Option<&Piece> {
        self.pieces.get(&id)
    }

    /// Pieces owned by `id`, in placement order.
    pub fn pieces_of(&self, id: ContainerId) -> Vec<&Piece> {
        self.containers
            .get(&id)
            .map(|c| c.pieces.iter().filter_map(|p| self.pieces.get(p)).collect())
            .unwrap_or_default()
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[SceneEvent] {
        &self.event_log
    }

    /// Reconstruct a scene from a sequence of events.
    pub fn replay(events: &[SceneEvent]) -> Self {
        let mut scene = Self::new();
        for event in events {
            match event {
                SceneEvent::ContainerCreated { id, name } => {
                    scene.containers.insert(
                        *id,
                        Container {
                            name: name.clone(),
                            pieces: Vec::new(),
                        },
                    );
                    scene.next_container = scene.next_container.max(id.0 + 1);
                }
                SceneEvent::PieceInstantiated { piece } => {
                    if let Some(c) = scene.containers.get_mut(&piece.parent) {
                        c.pieces.push(piece.id);
                        scene.pieces.insert(piece.id, *piece);
                    }
                    scene.next_instance = scene.next_instance.max(piece.id.0 + 1);
                }
                SceneEvent::ContainerDestroyed { id, .. } => {
                    scene.remove_container(*id);
                }
            }
        }
        scene
    }

    /// Deterministic hash of the scene state (FNV-1a over canonical order).
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        for (id, c) in &self.containers {
            mix(&mut h, &id.0.to_le_bytes());
            mix(&mut h, c.name.as_bytes());
        }
        for (id, p) in &self.pieces {
            mix(&mut h, &id.0.to_le_bytes());
            mix(&mut h, &p.parent.0.to_le_bytes());
            mix(&mut h, &p.template.0.to_le_bytes());
            mix(&mut h, &[p.kind as u8]);
            let t = &p.transform;
            for v in t.position.to_array() {
                mix(&mut h, &v.to_le_bytes());
            }
            for v in t.rotation.to_array() {
                mix(&mut h, &v.to_le_bytes());
            }
        }
        h
    }

    fn remove_container(&mut self, id: ContainerId) -> Option<Container> {
        let container = self.containers.remove(&id)?;
        for piece in &container.pieces {
            self.pieces.remove(piece);
        }
        Some(container)
    }

    fn record(&mut self, event: SceneEvent) {
        if self.recording {
            self.event_log.push(event);
        }
    }
}

impl Instancer for Scene {
    fn create_container(&mut self, name: &str) -> ContainerId {
        let id = ContainerId(self.next_container);
        self.next_container += 1;
        self.containers.insert(
            id,
            Container {
                name: name.to_string(),
                pieces: Vec::new(),
            },
        );
        self.record(SceneEvent::ContainerCreated {
            id,
            name: name.to_string(),
        });
        id
    }

    fn instantiate(
        &mut self,
        template: TemplateHandle,
        kind: PieceKind,
        position: Vec3,
        rotation: Quat,
        parent: ContainerId,
    ) -> InstanceId {
        let id = InstanceId(self.next_instance);
        self.next_instance += 1;
        let piece = Piece {
            id,
            parent,
            template,
            kind,
            transform: Transform::from_position_rotation(position, rotation),
        };
        match self.containers.get_mut(&parent) {
            Some(c) => {
                c.pieces.push(id);
                self.pieces.insert(id, piece);
                self.record(SceneEvent::PieceInstantiated { piece });
            }
            // Parent already gone: the piece would be orphaned, so it is
            // dropped immediately.
            None => tracing::warn!(?parent, ?kind, "instantiate under missing container"),
        }
        id
    }

    fn destroy(&mut self, container: ContainerId) {
        if let Some(c) = self.remove_container(container) {
            tracing::trace!(?container, pieces = c.pieces.len(), "container destroyed");
            self.record(SceneEvent::ContainerDestroyed {
                id: container,
                piece_count: c.pieces.len(),
            });
        }
    }
}
