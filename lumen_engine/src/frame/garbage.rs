//! Fence-tagged deferred release.
//!
//! Objects the CPU no longer wants may still be referenced by command lists
//! in flight. They are retired into the open epoch; sealing the epoch at the
//! end of a frame tags it with that frame's fence value, and the epoch is
//! reclaimed once the GPU timeline reaches the tag.

use crate::engine_warn;

struct Epoch<T> {
    fence: Option<u64>,
    items: Vec<T>,
}

/// Ring of `frames_in_flight + 1` epochs.
pub struct GarbageRing<T> {
    epochs: Vec<Epoch<T>>,
    open: usize,
}

impl<T> GarbageRing<T> {
    pub fn new(frames_in_flight: usize) -> Self {
        let epochs = (0..frames_in_flight.max(1) + 1)
            .map(|_| Epoch { fence: None, items: Vec::new() })
            .collect();
        Self { epochs, open: 0 }
    }

    /// Queue `item` for release after the open epoch is sealed and completed.
    pub fn retire(&mut self, item: T) {
        self.epochs[self.open].items.push(item);
    }

    /// Tag the open epoch with `fence_value` and open the next one.
    pub fn seal(&mut self, fence_value: u64) {
        self.epochs[self.open].fence = Some(fence_value);
        self.open = (self.open + 1) % self.epochs.len();

        let next = &mut self.epochs[self.open];
        if next.fence.is_some() {
            // Never collected: keep the items, they are released with the
            // newer tag, which is strictly later on the timeline.
            engine_warn!(
                "lumen::GarbageRing",
                "epoch reopened with {} uncollected items", next.items.len()
            );
            next.fence = None;
        }
    }

    /// Take every item whose epoch tag is `<= completed`.
    ///
    /// The caller releases them. Anything retired while releasing lands in
    /// the open epoch and is not part of this sweep.
    pub fn take_reclaimable(&mut self, completed: u64) -> Vec<T> {
        let mut reclaimed = Vec::new();
        for (index, epoch) in self.epochs.iter_mut().enumerate() {
            if index == self.open {
                continue;
            }
            if matches!(epoch.fence, Some(tag) if tag <= completed) {
                epoch.fence = None;
                reclaimed.append(&mut epoch.items);
            }
        }
        reclaimed
    }

    /// Take everything regardless of tags. Only valid once the GPU is idle.
    pub fn take_all(&mut self) -> Vec<T> {
        let mut all = Vec::new();
        for epoch in &mut self.epochs {
            epoch.fence = None;
            all.append(&mut epoch.items);
        }
        all
    }

    /// Items waiting in any epoch.
    pub fn pending(&self) -> usize {
        self.epochs.iter().map(|e| e.items.len()).sum()
    }

    /// Number of epochs (frames in flight + 1).
    pub fn epoch_count(&self) -> usize {
        self.epochs.len()
    }
}

#[cfg(test)]
#[path = "garbage_tests.rs"]
mod tests;
