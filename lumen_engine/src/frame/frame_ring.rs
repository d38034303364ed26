//! Per-frame GPU resource ring.
//!
//! N slots (N = frames in flight) each own a command list and a constant
//! buffer. A slot is reused only after the GPU has passed the fence value
//! recorded when the slot's last frame was submitted, so the CPU can run at
//! most N frames ahead of the GPU.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::graphics_device::{Buffer, BufferDesc, BufferUsage, CommandList, Fence, GraphicsDevice};
use crate::{engine_bail, engine_trace};

/// Resources owned by one frame in flight.
pub struct FrameSlot {
    command_list: Box<dyn CommandList>,
    constants: Arc<dyn Buffer>,
    fence_value: u64,
    frames_recorded: u64,
}

impl FrameSlot {
    pub fn command_list(&self) -> &dyn CommandList {
        self.command_list.as_ref()
    }

    pub fn command_list_mut(&mut self) -> &mut dyn CommandList {
        self.command_list.as_mut()
    }

    pub fn constants(&self) -> &Arc<dyn Buffer> {
        &self.constants
    }

    /// Fence value the GPU must reach before this slot is reusable.
    pub fn fence_value(&self) -> u64 {
        self.fence_value
    }

    /// Frames recorded through this slot.
    pub fn frames_recorded(&self) -> u64 {
        self.frames_recorded
    }
}

/// Ring of frame slots driven by one monotonically increasing fence.
pub struct FrameResourceRing {
    slots: Vec<FrameSlot>,
    fence: Arc<dyn Fence>,
    fence_counter: u64,
    current: Option<usize>,
    recording: bool,
    stalls: u64,
}

impl FrameResourceRing {
    /// Create `frames_in_flight` slots with a constant buffer of
    /// `constants_size` bytes each.
    pub fn new(
        device: &mut dyn GraphicsDevice,
        frames_in_flight: usize,
        constants_size: u64,
    ) -> Result<Self> {
        if frames_in_flight == 0 {
            return Err(Error::InitializationFailed("frame ring needs at least one slot".to_string()));
        }
        let mut slots = Vec::with_capacity(frames_in_flight);
        for index in 0..frames_in_flight {
            slots.push(FrameSlot {
                command_list: device.create_command_list()?,
                constants: device.create_buffer(BufferDesc {
                    name: format!("frame_constants{}", index),
                    size: constants_size,
                    usage: BufferUsage::Constant,
                })?,
                fence_value: 0,
                frames_recorded: 0,
            });
        }
        Ok(Self {
            slots,
            fence: device.fence(),
            fence_counter: 0,
            current: None,
            recording: false,
            stalls: 0,
        })
    }

    /// Advance to the next slot, blocking until the GPU has released it,
    /// then reset its command list.
    pub fn acquire_next_slot(&mut self) -> Result<usize> {
        if self.recording {
            engine_bail!("lumen::FrameRing", "acquire_next_slot called while a frame is open");
        }
        let next = self.current.map_or(0, |current| (current + 1) % self.slots.len());
        let required = self.slots[next].fence_value;
        if required > self.fence.completed_value() {
            engine_trace!("lumen::FrameRing", "slot {} waits for fence {}", next, required);
            self.stalls += 1;
            self.fence.wait(required)?;
        }

        let slot = &mut self.slots[next];
        slot.command_list.reset()?;
        slot.frames_recorded += 1;
        self.current = Some(next);
        self.recording = true;
        Ok(next)
    }

    /// Close the open frame: allocate the next fence value, record it on the
    /// current slot and enqueue the signal.
    pub fn end_frame(&mut self, device: &mut dyn GraphicsDevice) -> Result<u64> {
        let current = match (self.recording, self.current) {
            (true, Some(current)) => current,
            _ => engine_bail!("lumen::FrameRing", "end_frame called without an open frame"),
        };
        self.fence_counter += 1;
        self.slots[current].fence_value = self.fence_counter;
        device.signal(self.fence_counter)?;
        self.recording = false;
        Ok(self.fence_counter)
    }

    /// Block until every signaled frame has completed.
    pub fn flush(&self) -> Result<()> {
        if self.fence_counter > self.fence.completed_value() {
            self.fence.wait(self.fence_counter)?;
        }
        Ok(())
    }

    /// Highest fence value the GPU has reached.
    pub fn completed_fence(&self) -> u64 {
        self.fence.completed_value()
    }

    /// Fence value the open frame will signal when it ends.
    pub fn frame_fence_target(&self) -> u64 {
        self.fence_counter + 1
    }

    /// Last fence value handed out.
    pub fn last_signaled(&self) -> u64 {
        self.fence_counter
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Number of slots (frames the CPU may run ahead).
    pub fn frames_in_flight(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, index: usize) -> Option<&FrameSlot> {
        self.slots.get(index)
    }

    /// Times `acquire_next_slot` had to wait on the GPU.
    pub fn stall_count(&self) -> u64 {
        self.stalls
    }

    /// The slot of the open frame.
    pub fn current_slot(&self) -> Result<&FrameSlot> {
        match (self.recording, self.current) {
            (true, Some(current)) => Ok(&self.slots[current]),
            _ => Err(Error::InvalidOperation("no frame is open".to_string())),
        }
    }

    pub fn current_slot_mut(&mut self) -> Result<&mut FrameSlot> {
        match (self.recording, self.current) {
            (true, Some(current)) => Ok(&mut self.slots[current]),
            _ => Err(Error::InvalidOperation("no frame is open".to_string())),
        }
    }

    /// Upload the open frame's constants.
    pub fn write_constants(&self, bytes: &[u8]) -> Result<()> {
        self.current_slot()?.constants.update(0, bytes)
    }
}

#[cfg(test)]
#[path = "frame_ring_tests.rs"]
mod tests;
