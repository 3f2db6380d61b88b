use bytemuck::Pod;

use crate::arena::MemoryView;
use crate::config::BridgeConfig;
use crate::error::PassError;
use crate::upload::UploadCache;
use crate::wire::{BufferMeta, UploadKey};

use super::backend::{Backend, DrawCall, ProgramDesc};
use super::ctx::FrameParams;

enum PassState<B: Backend> {
    Uninitialized,
    Initialized(PassResources<B>),
    Disposed,
}

struct PassResources<B: Backend> {
    program: B::Program,
    vertices: B::VertexBuffer,
}

/// One GPU program plus its vertex buffer, for one primitive kind.
///
/// Lifecycle: `Uninitialized -> Initialized -> Disposed`. Only
/// [`initialize`](Self::initialize) can fail; every per-frame method degrades
/// to "draw nothing" instead.
pub struct RenderPass<B: Backend> {
    desc: &'static ProgramDesc,
    state: PassState<B>,
    cache: UploadCache,
    vertex_count: u32,
    min_capacity: usize,
    px_range: f32,
    warned_stride: bool,
    warned_read: bool,
    warned_limit: bool,
}

impl<B: Backend> RenderPass<B> {
    pub fn new(desc: &'static ProgramDesc, config: &BridgeConfig) -> Self {
        Self {
            desc,
            state: PassState::Uninitialized,
            cache: UploadCache::new(),
            vertex_count: 0,
            min_capacity: config.min_vertex_capacity.max(1),
            px_range: config.px_range,
            warned_stride: false,
            warned_read: false,
            warned_limit: false,
        }
    }

    #[inline]
    pub fn label(&self) -> &'static str {
        self.desc.label
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        matches!(self.state, PassState::Initialized(_))
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        matches!(self.state, PassState::Disposed)
    }

    /// Vertices currently resident on the GPU.
    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Builds the program and an initial vertex buffer. No-op when already
    /// initialized. On error the pass stays unusable.
    pub fn initialize(&mut self, backend: &mut B) -> Result<(), PassError> {
        if self.is_initialized() {
            return Ok(());
        }

        self.desc.validate()?;
        let program = backend.create_program(self.desc)?;
        let stride = u64::from(self.desc.layout.stride);
        let bytes = (self.min_capacity as u64 * stride).min(buffer_limit(backend, stride));
        let vertices = backend.create_vertex_buffer(self.desc.label, bytes);

        self.state = PassState::Initialized(PassResources { program, vertices });
        self.cache.invalidate();
        self.vertex_count = 0;
        self.warned_stride = false;
        self.warned_read = false;
        self.warned_limit = false;
        log::debug!("{}: initialized", self.desc.label);
        Ok(())
    }

    /// Releases every GPU resource. The pass must be re-initialized before it
    /// draws again. No-op on a pass that was never initialized.
    pub fn dispose(&mut self, backend: &mut B) {
        match std::mem::replace(&mut self.state, PassState::Disposed) {
            PassState::Initialized(res) => {
                backend.destroy_program(res.program);
                backend.destroy_vertex_buffer(res.vertices);
            }
            other => {
                self.state = other;
                return;
            }
        }
        self.cache.invalidate();
        self.vertex_count = 0;
        log::debug!("{}: disposed", self.desc.label);
    }

    /// Re-uploads the engine buffer described by `meta` when it changed.
    ///
    /// Returns `true` when an upload happened. A stride that does not match
    /// the pass layout is reported once and treated as an empty buffer.
    pub fn sync(&mut self, backend: &mut B, view: &MemoryView<'_>, meta: &BufferMeta) -> bool {
        if !self.is_initialized() {
            return false;
        }

        let stride = self.desc.layout.stride;
        let key = if meta.is_empty() || meta.byte_stride == stride {
            self.warned_stride = false;
            meta.upload_key()
        } else {
            if !self.warned_stride {
                log::warn!(
                    "{}: engine reports {}-byte vertices, pass expects {}; not drawing",
                    self.desc.label,
                    meta.byte_stride,
                    stride
                );
                self.warned_stride = true;
            }
            UploadKey { element_count: 0, ..meta.upload_key() }
        };

        let byte_len = key.element_count as usize * stride as usize;
        match self.cache.stage(view, key, byte_len) {
            Ok(None) => false,
            Ok(Some(bytes)) => {
                self.warned_read = false;
                self.upload_bytes(backend, bytes, key.element_count)
            }
            Err(err) => {
                if !self.warned_read {
                    log::warn!("{}: {err}", self.desc.label);
                    self.warned_read = true;
                }
                self.cache.invalidate();
                self.vertex_count = 0;
                false
            }
        }
    }

    /// Uploads CPU-built vertices, replacing the previous contents.
    ///
    /// Returns `false` when nothing was uploaded.
    pub fn upload<V: Pod>(&mut self, backend: &mut B, vertices: &[V]) -> bool {
        debug_assert_eq!(size_of::<V>(), self.desc.layout.stride as usize);
        self.upload_bytes(backend, bytemuck::cast_slice(vertices), vertices.len() as u32)
    }

    /// Writes `count` vertices, growing the buffer when needed. A buffer the
    /// device cannot hold is reported once and leaves the pass empty.
    fn upload_bytes(&mut self, backend: &mut B, bytes: &[u8], count: u32) -> bool {
        let PassState::Initialized(res) = &mut self.state else { return false };
        let stride = u64::from(self.desc.layout.stride);
        let limit = buffer_limit(backend, stride);

        let needed = u64::from(count) * stride;
        if needed > limit {
            if !self.warned_limit {
                log::warn!(
                    "{}: {count} vertices need {needed} bytes, device allows {limit}; not drawing",
                    self.desc.label
                );
                self.warned_limit = true;
            }
            self.vertex_count = 0;
            return false;
        }
        self.warned_limit = false;

        let capacity = backend.vertex_buffer_capacity(&res.vertices) / stride;
        if u64::from(count) > capacity {
            let grown = (u64::from(count).next_power_of_two().max(self.min_capacity as u64) * stride).min(limit);
            let buffer = backend.create_vertex_buffer(self.desc.label, grown);
            backend.destroy_vertex_buffer(std::mem::replace(&mut res.vertices, buffer));
            log::debug!("{}: vertex buffer grown to {} vertices", self.desc.label, grown / stride);
        }

        if !bytes.is_empty() {
            backend.write_vertices(&res.vertices, bytes);
        }
        self.vertex_count = count;
        log::debug!("{}: uploaded {count} vertices", self.desc.label);
        true
    }

    /// Draws the first `vertex_count` resident vertices.
    ///
    /// No-op when `vertex_count == 0`, when the pass is not initialized, or
    /// when an atlas-sampling pass has no atlas.
    pub fn render(
        &mut self,
        backend: &mut B,
        target: &mut B::Target<'_>,
        frame: &FrameParams,
        vertex_count: u32,
        atlas: Option<&B::Texture>,
    ) {
        if vertex_count == 0 {
            return;
        }
        let PassState::Initialized(res) = &mut self.state else { return };
        if self.desc.samples_atlas && atlas.is_none() {
            return;
        }

        let capacity = backend.vertex_buffer_capacity(&res.vertices) / u64::from(self.desc.layout.stride);
        let vertex_count = vertex_count.min(u32::try_from(capacity).unwrap_or(u32::MAX));
        backend.draw(
            target,
            &mut res.program,
            DrawCall {
                vertex_buffer: &res.vertices,
                vertex_count,
                uniforms: frame.uniforms(self.px_range),
                atlas,
            },
        );
        log::trace!("{}: drew {vertex_count} vertices", self.desc.label);
    }

    /// Draws everything uploaded by the last `sync`/`upload`.
    pub fn draw(
        &mut self,
        backend: &mut B,
        target: &mut B::Target<'_>,
        frame: &FrameParams,
        atlas: Option<&B::Texture>,
    ) {
        self.render(backend, target, frame, self.vertex_count, atlas);
    }
}

/// Largest vertex buffer the device allows, in whole vertices of `stride`.
fn buffer_limit<B: Backend>(backend: &B, stride: u64) -> u64 {
    backend.max_buffer_size() / stride * stride
}
