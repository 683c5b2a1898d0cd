use roadspace_common::{ContainerId, Instancer};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// A destruction request waiting for its deadline.
#[derive(Debug, Clone, Copy)]
struct PendingDestroy {
    deadline: f64,
    /// Scheduling order; breaks deadline ties first-in first-out.
    seq: u64,
    container: ContainerId,
}

impl PartialEq for PendingDestroy {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PendingDestroy {}

impl PartialOrd for PendingDestroy {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingDestroy {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline
            .total_cmp(&other.deadline)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Deferred destruction of segment containers against a simulated clock.
///
/// Requests cannot be cancelled. A container is destroyed on the first
/// [`advance`](Self::advance) whose clock reaches its deadline, never
/// earlier, and always on the caller's thread.
#[derive(Debug, Default)]
pub struct LifecycleManager {
    queue: BinaryHeap<Reverse<PendingDestroy>>,
    now: f64,
    next_seq: u64,
}

impl LifecycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulated time in seconds.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Number of containers still waiting for destruction.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<f64> {
        self.queue.peek().map(|Reverse(p)| p.deadline)
    }

    /// Destroy `container` once `delay_seconds` have elapsed from now.
    pub fn schedule_destroy(&mut self, container: ContainerId, delay_seconds: f32) {
        let deadline = self.now + f64::from(delay_seconds.max(0.0));
        self.queue.push(Reverse(PendingDestroy {
            deadline,
            seq: self.next_seq,
            container,
        }));
        self.next_seq += 1;
        tracing::trace!(?container, deadline, "destroy scheduled");
    }

    /// Move the clock forward by `dt` and destroy every container whose
    /// deadline has been reached. Returns them in deadline order.
    pub fn advance(&mut self, dt: f64, instancer: &mut impl Instancer) -> Vec<ContainerId> {
        self.now += dt.max(0.0);
        let mut destroyed = Vec::new();
        while let Some(Reverse(next)) = self.queue.peek() {
            if next.deadline > self.now {
                break;
            }
            let container = next.container;
            self.queue.pop();
            instancer.destroy(container);
            destroyed.push(container);
        }
        if !destroyed.is_empty() {
            tracing::debug!(count = destroyed.len(), now = self.now, "segments expired");
        }
        destroyed
    }
}
