/// Render targets of the pass graph.
///
/// Every pass reads and writes a fixed set of named resources. All of them
/// except the backbuffer are transients owned by the graph: created for the
/// current surface size, treated as holding undefined contents at the start
/// of every frame. The backbuffer is the surface image acquired for the
/// frame being recorded.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::graphics_device::{GraphicsDevice, Texture, TextureDesc, TextureFormat, TextureUsage};
use crate::engine_debug;

/// Shared resource of the pass graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceId {
    ShadowAtlas,
    GBufferAlbedo,
    GBufferNormal,
    GBufferMotion,
    Depth,
    /// AO output (and the target of every vertical blur)
    AoRaw,
    /// Intermediate of the separable AO blur
    AoBlur,
    /// Lighting composite and forward output
    SceneColor,
    PostPing,
    PostPong,
    /// Half-resolution bright pass of the bloom stage
    BloomScratch,
    /// Surface image acquired for the frame
    Backbuffer,
}

impl ResourceId {
    pub fn name(self) -> &'static str {
        match self {
            ResourceId::ShadowAtlas => "shadow_atlas",
            ResourceId::GBufferAlbedo => "gbuffer_albedo",
            ResourceId::GBufferNormal => "gbuffer_normal",
            ResourceId::GBufferMotion => "gbuffer_motion",
            ResourceId::Depth => "depth",
            ResourceId::AoRaw => "ao_raw",
            ResourceId::AoBlur => "ao_blur",
            ResourceId::SceneColor => "scene_color",
            ResourceId::PostPing => "post_ping",
            ResourceId::PostPong => "post_pong",
            ResourceId::BloomScratch => "bloom_scratch",
            ResourceId::Backbuffer => "backbuffer",
        }
    }

    /// Format of the transient. The backbuffer reports the usual surface format.
    pub fn format(self) -> TextureFormat {
        match self {
            ResourceId::ShadowAtlas | ResourceId::Depth => TextureFormat::D32_FLOAT,
            ResourceId::GBufferAlbedo => TextureFormat::R8G8B8A8_UNORM,
            ResourceId::GBufferMotion => TextureFormat::R16G16_SFLOAT,
            ResourceId::AoRaw | ResourceId::AoBlur => TextureFormat::R8_UNORM,
            ResourceId::GBufferNormal
            | ResourceId::SceneColor
            | ResourceId::PostPing
            | ResourceId::PostPong
            | ResourceId::BloomScratch => TextureFormat::R16G16B16A16_SFLOAT,
            ResourceId::Backbuffer => TextureFormat::B8G8R8A8_SRGB,
        }
    }

    pub fn is_transient(self) -> bool {
        self != ResourceId::Backbuffer
    }

    /// Pixel size for a `width` x `height` surface.
    pub fn extent(self, width: u32, height: u32, atlas_size: u32) -> (u32, u32) {
        match self {
            ResourceId::ShadowAtlas => (atlas_size, atlas_size),
            ResourceId::BloomScratch => ((width / 2).max(1), (height / 2).max(1)),
            _ => (width, height),
        }
    }
}

/// Transient textures for one surface size.
pub struct RenderTargets {
    textures: FxHashMap<ResourceId, Arc<dyn Texture>>,
    width: u32,
    height: u32,
}

impl RenderTargets {
    /// Create one texture per transient in `resources`.
    pub(crate) fn create(
        device: &mut dyn GraphicsDevice,
        resources: &[ResourceId],
        width: u32,
        height: u32,
        atlas_size: u32,
    ) -> Result<Self> {
        let mut textures = FxHashMap::default();
        for &id in resources.iter().filter(|id| id.is_transient()) {
            let (w, h) = id.extent(width, height, atlas_size);
            let format = id.format();
            let usage = if format.is_depth() {
                TextureUsage::SampledAndDepthStencil
            } else {
                TextureUsage::SampledAndRenderTarget
            };
            let texture = device.create_texture(TextureDesc {
                name: id.name().to_string(),
                width: w,
                height: h,
                format,
                usage,
            })?;
            textures.insert(id, texture);
        }
        engine_debug!("lumen::RenderTargets", "created {} transient(s) for {}x{}", textures.len(), width, height);
        Ok(Self { textures, width, height })
    }

    pub fn texture(&self, id: ResourceId) -> Option<&Arc<dyn Texture>> {
        self.textures.get(&id)
    }

    /// Resolve `id`, mapping the backbuffer to the acquired image.
    pub(crate) fn resolve<'t>(&'t self, id: ResourceId, backbuffer: &'t dyn Texture) -> Result<&'t dyn Texture> {
        if id == ResourceId::Backbuffer {
            return Ok(backbuffer);
        }
        self.textures
            .get(&id)
            .map(|t| t.as_ref())
            .ok_or_else(|| Error::InvalidResource(format!("render target '{}' was never created", id.name())))
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Surface size the transients were created for.
    pub fn extent(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
