/// Frame pacing: slot ring, deferred release and GPU constant layouts

pub mod frame_ring;
pub mod garbage;
pub mod frame_constants;
pub mod clock;

pub use frame_ring::{FrameResourceRing, FrameSlot};
pub use garbage::GarbageRing;
pub use clock::{FrameClock, FrameTime};
pub use frame_constants::{
    FrameConstants, GpuLight, GpuShadowView, MAX_SHADOW_VIEWS,
    constant_buffer_size, encode_frame_block,
};
