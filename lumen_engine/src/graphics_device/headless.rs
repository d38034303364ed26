//! In-memory graphics backend.
//!
//! Records every command as a readable string, keeps a journal of submitted
//! command lists and simulates an asynchronous GPU timeline. In automatic
//! mode the fence completes as soon as a value is signaled. In manual mode
//! nothing completes until `HeadlessFence::complete_up_to` is called, which
//! lets tests hold the "GPU" back and observe the CPU blocking.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::graphics_device::{
    Buffer, BufferDesc, CommandList, Fence, GraphicsDevice, IndexType, LoadOp, PipelineDesc,
    PipelineStateId, RenderPassBegin, Surface, Texture, TextureBarrier, TextureDesc,
    TextureFormat, TextureInfo, TextureUsage, Viewport,
};

// ============================================================================
// Fence
// ============================================================================

#[derive(Debug, Default)]
struct Timeline {
    completed: u64,
    signaled: u64,
}

/// Simulated queue timeline.
pub struct HeadlessFence {
    timeline: Mutex<Timeline>,
    reached: Condvar,
    auto_complete: bool,
    blocking_waits: AtomicU64,
}

impl HeadlessFence {
    pub fn new(auto_complete: bool) -> Self {
        Self {
            timeline: Mutex::new(Timeline::default()),
            reached: Condvar::new(),
            auto_complete,
            blocking_waits: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Timeline>> {
        self.timeline
            .lock()
            .map_err(|_| Error::BackendError("headless fence mutex poisoned".to_string()))
    }

    fn enqueue_signal(&self, value: u64) -> Result<()> {
        let mut timeline = self.lock()?;
        if value <= timeline.signaled {
            return Err(Error::BackendError(format!(
                "fence value {} signaled after {}", value, timeline.signaled)));
        }
        timeline.signaled = value;
        if self.auto_complete {
            timeline.completed = value;
            self.reached.notify_all();
        }
        Ok(())
    }

    /// Highest value signaled on the queue so far.
    pub fn signaled_value(&self) -> u64 {
        self.lock().map(|t| t.signaled).unwrap_or(0)
    }

    /// Let the simulated GPU reach `value` (clamped to the last signal).
    pub fn complete_up_to(&self, value: u64) {
        if let Ok(mut timeline) = self.lock() {
            let target = value.min(timeline.signaled);
            if target > timeline.completed {
                timeline.completed = target;
                self.reached.notify_all();
            }
        }
    }

    /// Let the simulated GPU drain everything signaled so far.
    pub fn complete_all(&self) {
        self.complete_up_to(u64::MAX);
    }

    /// Number of `wait` calls that actually had to block.
    pub fn blocking_waits(&self) -> u64 {
        self.blocking_waits.load(Ordering::SeqCst)
    }
}

impl Fence for HeadlessFence {
    fn completed_value(&self) -> u64 {
        self.lock().map(|t| t.completed).unwrap_or(0)
    }

    fn wait(&self, value: u64) -> Result<()> {
        let mut timeline = self.lock()?;
        if timeline.completed >= value {
            return Ok(());
        }
        if value > timeline.signaled {
            return Err(Error::BackendError(format!(
                "wait for fence value {} which was never signaled (last {})",
                value, timeline.signaled)));
        }
        self.blocking_waits.fetch_add(1, Ordering::SeqCst);
        while timeline.completed < value {
            timeline = self
                .reached
                .wait(timeline)
                .map_err(|_| Error::BackendError("headless fence mutex poisoned".to_string()))?;
        }
        Ok(())
    }
}

// ============================================================================
// Buffer / Texture
// ============================================================================

/// Host-memory buffer.
pub struct HeadlessBuffer {
    name: String,
    data: Mutex<Vec<u8>>,
}

impl HeadlessBuffer {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self { name: name.into(), data: Mutex::new(vec![0; size as usize]) }
    }

    /// Copy of the current contents.
    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

impl Buffer for HeadlessBuffer {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.data.lock().map(|d| d.len() as u64).unwrap_or(0)
    }

    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        let mut storage = self
            .data
            .lock()
            .map_err(|_| Error::BackendError(format!("buffer '{}' mutex poisoned", self.name)))?;
        let start = offset as usize;
        let end = start + data.len();
        if end > storage.len() {
            return Err(Error::InvalidResource(format!(
                "write of {} bytes at {} overflows buffer '{}' ({} bytes)",
                data.len(), offset, self.name, storage.len())));
        }
        storage[start..end].copy_from_slice(data);
        Ok(())
    }
}

/// Texture with no backing memory.
pub struct HeadlessTexture {
    info: TextureInfo,
}

impl HeadlessTexture {
    pub fn new(desc: TextureDesc) -> Self {
        Self {
            info: TextureInfo {
                name: desc.name,
                width: desc.width,
                height: desc.height,
                format: desc.format,
                usage: desc.usage,
            },
        }
    }
}

impl Texture for HeadlessTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }
}

// ============================================================================
// CommandList
// ============================================================================

/// Command list recording one string per command.
#[derive(Debug, Default)]
pub struct HeadlessCommandList {
    commands: Vec<String>,
    recording: bool,
    in_render_pass: bool,
    resets: u64,
}

impl HeadlessCommandList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded since the last reset.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Number of resets since creation.
    pub fn reset_count(&self) -> u64 {
        self.resets
    }

    fn require_recording(&self, command: &str) -> Result<()> {
        if !self.recording {
            return Err(Error::BackendError(format!("{} outside begin/end", command)));
        }
        Ok(())
    }

    fn require_pass(&self, command: &str, inside: bool) -> Result<()> {
        self.require_recording(command)?;
        if self.in_render_pass != inside {
            let place = if inside { "outside" } else { "inside" };
            return Err(Error::BackendError(format!("{} recorded {} a render pass", command, place)));
        }
        Ok(())
    }

    fn record(&mut self, command: String) -> Result<()> {
        self.commands.push(command);
        Ok(())
    }
}

impl CommandList for HeadlessCommandList {
    fn reset(&mut self) -> Result<()> {
        if self.recording {
            return Err(Error::BackendError("reset while recording".to_string()));
        }
        self.commands.clear();
        self.resets += 1;
        Ok(())
    }

    fn begin(&mut self) -> Result<()> {
        if self.recording {
            return Err(Error::BackendError("begin while already recording".to_string()));
        }
        self.recording = true;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.require_pass("end", false)?;
        self.recording = false;
        Ok(())
    }

    fn transition(&mut self, barrier: &TextureBarrier) -> Result<()> {
        self.require_pass("transition", false)?;
        self.record(format!(
            "transition {} {:?}->{:?}",
            barrier.texture.info().name, barrier.before, barrier.after))
    }

    fn begin_render_pass(&mut self, desc: &RenderPassBegin) -> Result<()> {
        self.require_pass("begin_render_pass", false)?;
        self.in_render_pass = true;
        let load = match desc.load_op {
            LoadOp::Load => "load",
            LoadOp::Clear => "clear",
            LoadOp::DontCare => "dont_care",
        };
        self.record(format!("begin_render_pass {} {}", desc.label, load))
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.require_pass("end_render_pass", true)?;
        self.in_render_pass = false;
        self.record("end_render_pass".to_string())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.require_pass("set_viewport", true)?;
        self.record(format!(
            "set_viewport {},{} {}x{}", viewport.x, viewport.y, viewport.width, viewport.height))
    }

    fn bind_pipeline(&mut self, pipeline: PipelineStateId) -> Result<()> {
        self.require_pass("bind_pipeline", true)?;
        self.record(format!("bind_pipeline {}", pipeline.0))
    }

    fn bind_textures(&mut self, textures: &[&dyn Texture]) -> Result<()> {
        self.require_pass("bind_textures", true)?;
        let names: Vec<&str> = textures.iter().map(|t| t.info().name.as_str()).collect();
        self.record(format!("bind_textures {}", names.join(",")))
    }

    fn bind_constants(&mut self, buffer: &dyn Buffer, offset: u64) -> Result<()> {
        self.require_pass("bind_constants", true)?;
        self.record(format!("bind_constants {}+{}", buffer.name(), offset))
    }

    fn push_constants(&mut self, offset: u32, data: &[u8]) -> Result<()> {
        self.require_pass("push_constants", true)?;
        self.record(format!("push_constants {} {}", offset, data.len()))
    }

    fn bind_vertex_buffer(&mut self, buffer: &dyn Buffer, offset: u64) -> Result<()> {
        self.require_pass("bind_vertex_buffer", true)?;
        self.record(format!("bind_vertex_buffer {}+{}", buffer.name(), offset))
    }

    fn bind_index_buffer(&mut self, buffer: &dyn Buffer, offset: u64, index_type: IndexType) -> Result<()> {
        self.require_pass("bind_index_buffer", true)?;
        self.record(format!("bind_index_buffer {}+{} {:?}", buffer.name(), offset, index_type))
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.require_pass("draw", true)?;
        self.record(format!("draw {} {}", vertex_count, first_vertex))
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.require_pass("draw_indexed", true)?;
        self.record(format!("draw_indexed {} {} {}", index_count, first_index, vertex_offset))
    }

    fn copy_texture(&mut self, src: &dyn Texture, dst: &dyn Texture) -> Result<()> {
        self.require_pass("copy_texture", false)?;
        self.record(format!("copy_texture {}->{}", src.info().name, dst.info().name))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Device
// ============================================================================

/// One entry of the submission journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// A command list with its recorded commands
    Commands(Vec<String>),
    /// A fence signal
    Signal(u64),
}

/// Shared view into a headless device, kept by tests after the device is
/// moved into a frame loop.
#[derive(Clone)]
pub struct HeadlessProbe {
    fence: Arc<HeadlessFence>,
    journal: Arc<Mutex<Vec<Submission>>>,
    pipelines_created: Arc<AtomicU64>,
}

impl HeadlessProbe {
    pub fn fence(&self) -> &Arc<HeadlessFence> {
        &self.fence
    }

    /// Every submission so far, in queue order.
    pub fn journal(&self) -> Vec<Submission> {
        self.journal.lock().map(|j| j.clone()).unwrap_or_default()
    }

    /// Commands of the most recent submitted command list.
    pub fn last_commands(&self) -> Vec<String> {
        self.journal()
            .into_iter()
            .rev()
            .find_map(|s| match s {
                Submission::Commands(commands) => Some(commands),
                Submission::Signal(_) => None,
            })
            .unwrap_or_default()
    }

    /// Number of `create_pipeline` calls so far.
    pub fn pipelines_created(&self) -> u64 {
        self.pipelines_created.load(Ordering::SeqCst)
    }
}

/// In-memory graphics device.
pub struct HeadlessDevice {
    fence: Arc<HeadlessFence>,
    journal: Arc<Mutex<Vec<Submission>>>,
    pipelines_created: Arc<AtomicU64>,
    next_pipeline: u64,
}

impl HeadlessDevice {
    /// Device whose fence completes on signal.
    pub fn new() -> Self {
        Self::with_fence(HeadlessFence::new(true))
    }

    /// Device whose fence only advances through `HeadlessFence::complete_up_to`.
    pub fn with_manual_fence() -> Self {
        Self::with_fence(HeadlessFence::new(false))
    }

    fn with_fence(fence: HeadlessFence) -> Self {
        Self {
            fence: Arc::new(fence),
            journal: Arc::new(Mutex::new(Vec::new())),
            pipelines_created: Arc::new(AtomicU64::new(0)),
            next_pipeline: 1,
        }
    }

    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe {
            fence: Arc::clone(&self.fence),
            journal: Arc::clone(&self.journal),
            pipelines_created: Arc::clone(&self.pipelines_created),
        }
    }

    fn push(&self, submission: Submission) -> Result<()> {
        self.journal
            .lock()
            .map_err(|_| Error::BackendError("headless journal mutex poisoned".to_string()))?
            .push(submission);
        Ok(())
    }
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn Buffer>> {
        if desc.size == 0 {
            return Err(Error::InvalidResource(format!("buffer '{}' has zero size", desc.name)));
        }
        Ok(Arc::new(HeadlessBuffer::new(desc.name, desc.size)))
    }

    fn create_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn Texture>> {
        if desc.width == 0 || desc.height == 0 {
            return Err(Error::InvalidResource(format!(
                "texture '{}' has zero extent {}x{}", desc.name, desc.width, desc.height)));
        }
        Ok(Arc::new(HeadlessTexture::new(desc)))
    }

    fn create_pipeline(&mut self, _desc: &PipelineDesc) -> Result<PipelineStateId> {
        let id = PipelineStateId(self.next_pipeline);
        self.next_pipeline += 1;
        self.pipelines_created.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    fn create_command_list(&mut self) -> Result<Box<dyn CommandList>> {
        Ok(Box::new(HeadlessCommandList::new()))
    }

    fn submit(&mut self, commands: &dyn CommandList) -> Result<()> {
        let list = commands
            .as_any()
            .downcast_ref::<HeadlessCommandList>()
            .ok_or_else(|| Error::BackendError("foreign command list submitted".to_string()))?;
        if list.recording {
            return Err(Error::BackendError("submitted a command list still recording".to_string()));
        }
        self.push(Submission::Commands(list.commands.clone()))
    }

    fn signal(&mut self, value: u64) -> Result<()> {
        self.fence.enqueue_signal(value)?;
        self.push(Submission::Signal(value))
    }

    fn fence(&self) -> Arc<dyn Fence> {
        Arc::clone(&self.fence) as Arc<dyn Fence>
    }

    fn wait_idle(&mut self) -> Result<()> {
        let last = self.fence.signaled_value();
        self.fence.wait(last)
    }
}

// ============================================================================
// Surface
// ============================================================================

/// Double-buffered surface with no window behind it.
pub struct HeadlessSurface {
    width: u32,
    height: u32,
    images: Vec<Arc<HeadlessTexture>>,
    next_image: usize,
    acquired: bool,
    presented: Arc<AtomicU64>,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        let mut surface = Self {
            width,
            height,
            images: Vec::new(),
            next_image: 0,
            acquired: false,
            presented: Arc::new(AtomicU64::new(0)),
        };
        surface.create_images();
        surface
    }

    fn create_images(&mut self) {
        self.images = (0..2)
            .map(|i| {
                Arc::new(HeadlessTexture::new(TextureDesc {
                    name: format!("backbuffer{}", i),
                    width: self.width,
                    height: self.height,
                    format: TextureFormat::B8G8R8A8_SRGB,
                    usage: TextureUsage::SampledAndRenderTarget,
                }))
            })
            .collect();
        self.next_image = 0;
    }

    /// Shared counter of presented images.
    pub fn present_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.presented)
    }
}

impl Surface for HeadlessSurface {
    fn acquire_next_image(&mut self) -> Result<Arc<dyn Texture>> {
        if self.acquired {
            return Err(Error::BackendError("surface image acquired twice".to_string()));
        }
        self.acquired = true;
        let image = Arc::clone(&self.images[self.next_image]);
        self.next_image = (self.next_image + 1) % self.images.len();
        Ok(image as Arc<dyn Texture>)
    }

    fn present(&mut self) -> Result<()> {
        if !self.acquired {
            return Err(Error::BackendError("present without an acquired image".to_string()));
        }
        self.acquired = false;
        self.presented.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidResource(format!("surface resized to {}x{}", width, height)));
        }
        self.width = width;
        self.height = height;
        self.acquired = false;
        self.create_images();
        Ok(())
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> TextureFormat {
        TextureFormat::B8G8R8A8_SRGB
    }
}

#[cfg(test)]
#[path = "headless_tests.rs"]
mod tests;
