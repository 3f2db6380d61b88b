//! Production backend on wgpu.

use crate::error::PassError;

use super::backend::{AttributeFormat, Backend, DrawCall, ProgramDesc, Topology, ViewUniforms};
use super::ctx::RenderTarget;

/// Pipeline plus the bindings it owns.
///
/// The bind group references the atlas view, so it is rebuilt whenever a
/// different texture is drawn with.
pub struct WgpuProgram {
    label: &'static str,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniforms: wgpu::Buffer,
    sampler: Option<wgpu::Sampler>,
    bind_group: Option<wgpu::BindGroup>,
    bound_texture: Option<u64>,
}

pub struct WgpuVertexBuffer {
    buffer: wgpu::Buffer,
    capacity: u64,
}

pub struct WgpuTexture {
    id: u64,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// wgpu implementation of [`Backend`]. Shares the device and queue with the
/// surface owner; create it once and keep it for the device's lifetime.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    next_texture_id: u64,
}

impl WgpuBackend {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, surface_format: wgpu::TextureFormat) -> Self {
        Self { device, queue, surface_format, next_texture_id: 0 }
    }

    #[inline]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    #[inline]
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    fn bind_group_layout(&self, desc: &ProgramDesc) -> wgpu::BindGroupLayout {
        let mut entries = vec![wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(size_of::<ViewUniforms>() as u64),
            },
            count: None,
        }];
        if desc.samples_atlas {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            });
        }

        self.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(desc.label),
            entries: &entries,
        })
    }

    fn pipeline(&self, desc: &ProgramDesc, shader: &wgpu::ShaderModule, bgl: &wgpu::BindGroupLayout) -> wgpu::RenderPipeline {
        let pipeline_layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(desc.label),
            bind_group_layouts: &[bgl],
            immediate_size: 0,
        });

        let attributes: Vec<wgpu::VertexAttribute> = desc
            .layout
            .attributes
            .iter()
            .map(|a| wgpu::VertexAttribute {
                format: match a.format {
                    AttributeFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
                    AttributeFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
                    AttributeFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
                },
                offset: u64::from(a.offset),
                shader_location: a.location,
            })
            .collect();

        let topology = match desc.topology {
            Topology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            Topology::LineList => wgpu::PrimitiveTopology::LineList,
        };

        self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(desc.label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: u64::from(desc.layout.stride),
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }

    fn ensure_bind_group(&self, program: &mut WgpuProgram, atlas: Option<&WgpuTexture>) {
        let wanted = atlas.map(|t| t.id);
        if program.bind_group.is_some() && program.bound_texture == wanted {
            return;
        }

        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: program.uniforms.as_entire_binding(),
        }];
        if let (Some(atlas), Some(sampler)) = (atlas, program.sampler.as_ref()) {
            entries.push(wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&atlas.view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            });
        }

        program.bind_group = Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(program.label),
            layout: &program.bind_group_layout,
            entries: &entries,
        }));
        program.bound_texture = wanted;
    }
}

impl Backend for WgpuBackend {
    type Program = WgpuProgram;
    type VertexBuffer = WgpuVertexBuffer;
    type Texture = WgpuTexture;
    type Target<'t> = RenderTarget<'t>;

    fn create_program(&mut self, desc: &ProgramDesc) -> Result<WgpuProgram, PassError> {
        let scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Wgsl(desc.source.into()),
        });
        if let Some(err) = pollster::block_on(scope.pop()) {
            return Err(PassError::ShaderCompile { label: desc.label, message: err.to_string() });
        }

        let scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let bind_group_layout = self.bind_group_layout(desc);
        let pipeline = self.pipeline(desc, &shader, &bind_group_layout);
        if let Some(err) = pollster::block_on(scope.pop()) {
            return Err(PassError::PipelineLink { label: desc.label, message: err.to_string() });
        }

        let uniforms = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(desc.label),
            size: size_of::<ViewUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let sampler = desc.samples_atlas.then(|| {
            self.device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some(desc.label),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                mipmap_filter: wgpu::MipmapFilterMode::Nearest,
                ..Default::default()
            })
        });

        log::debug!("{}: pipeline created", desc.label);
        Ok(WgpuProgram {
            label: desc.label,
            pipeline,
            bind_group_layout,
            uniforms,
            sampler,
            bind_group: None,
            bound_texture: None,
        })
    }

    fn destroy_program(&mut self, program: WgpuProgram) {
        program.uniforms.destroy();
    }

    fn create_vertex_buffer(&mut self, label: &'static str, capacity_bytes: u64) -> WgpuVertexBuffer {
        let capacity = capacity_bytes.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: capacity,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        WgpuVertexBuffer { buffer, capacity }
    }

    fn vertex_buffer_capacity(&self, buffer: &WgpuVertexBuffer) -> u64 {
        buffer.capacity
    }

    fn write_vertices(&mut self, buffer: &WgpuVertexBuffer, bytes: &[u8]) {
        self.queue.write_buffer(&buffer.buffer, 0, bytes);
    }

    fn destroy_vertex_buffer(&mut self, buffer: WgpuVertexBuffer) {
        buffer.buffer.destroy();
    }

    fn create_texture(&mut self, label: &'static str, width: u32, height: u32) -> WgpuTexture {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            // Distances are linear data; sRGB decoding would shift the edge.
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.next_texture_id += 1;
        WgpuTexture { id: self.next_texture_id, texture, view }
    }

    fn write_texture(&mut self, texture: &WgpuTexture, width: u32, height: u32, rgba: &[u8]) {
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        );
    }

    fn destroy_texture(&mut self, texture: WgpuTexture) {
        texture.texture.destroy();
    }

    fn draw(&mut self, target: &mut RenderTarget<'_>, program: &mut WgpuProgram, call: DrawCall<'_, Self>) {
        self.queue.write_buffer(&program.uniforms, 0, bytemuck::bytes_of(&call.uniforms));
        self.ensure_bind_group(program, call.atlas);
        let Some(bind_group) = program.bind_group.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(program.label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&program.pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(0, call.vertex_buffer.buffer.slice(..));
        rpass.draw(0..call.vertex_count, 0..1);
    }

    fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    fn max_buffer_size(&self) -> u64 {
        self.device.limits().max_buffer_size
    }
}
