use bytemuck::{Pod, Zeroable};

use crate::config::{BLOOM_DOWNSAMPLE, BLOOM_RADIUS, BLOOM_STRENGTH, BLOOM_THRESHOLD};
use crate::viewport::BufferSize;

/// Threshold and radius stay at their configured values; strength is driven
/// by the transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BloomParams {
    pub threshold: f32,
    pub strength: f32,
    pub radius: f32,
}

impl Default for BloomParams {
    fn default() -> Self {
        Self {
            threshold: BLOOM_THRESHOLD,
            strength: BLOOM_STRENGTH,
            radius: BLOOM_RADIUS,
        }
    }
}

impl BloomParams {
    /// Blur tap spacing in bloom texels.
    pub fn spread(&self) -> f32 {
        1.0 + self.radius.clamp(0.0, 1.0) * 4.0
    }

    pub fn is_visible(&self) -> bool {
        self.strength > 0.0
    }
}

#[repr(C)]
#[derive(Default, Copy, Clone, Debug, Pod, Zeroable)]
struct BloomUniforms {
    threshold: f32,
    strength: f32,
    spread: f32,
    _padding: f32,
    direction: [f32; 2],
    texel_size: [f32; 2],
}

const TEXTURE_GROUP_ID: u32 = 0;
const UNIFORM_GROUP_ID: u32 = 1;
const BLOOM_GROUP_ID: u32 = 2;

struct RenderTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl RenderTarget {
    fn new(device: &wgpu::Device, format: wgpu::TextureFormat, width: u32, height: u32, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { _texture: texture, view }
    }
}

/// Size-dependent resources, rebuilt together by `set_size`.
struct Targets {
    size: BufferSize,
    scene: RenderTarget,
    bloom_a: RenderTarget,
    bloom_b: RenderTarget,
    scene_input: wgpu::BindGroup,
    bloom_a_input: wgpu::BindGroup,
    bloom_b_input: wgpu::BindGroup,
}

/// Scene target plus threshold, separable blur and additive composite.
pub struct BloomPipeline {
    format: wgpu::TextureFormat,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    threshold_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    // One buffer per pass direction; writes land before the whole submission.
    main_uniform: (wgpu::Buffer, wgpu::BindGroup),
    horizontal_uniform: (wgpu::Buffer, wgpu::BindGroup),
    vertical_uniform: (wgpu::Buffer, wgpu::BindGroup),
    targets: Targets,
}

impl BloomPipeline {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, size: BufferSize) -> Self {
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom: Texture Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom: Uniform Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Bloom Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let shader = device.create_shader_module(wgpu::include_wgsl!("bloom.wgsl"));
        let single_input = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Bloom: Single Input Pipeline Layout"),
            bind_group_layouts: &[&texture_layout, &uniform_layout],
            push_constant_ranges: &[],
        });
        let composite_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Bloom: Composite Pipeline Layout"),
            bind_group_layouts: &[&texture_layout, &uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let threshold_pipeline = fullscreen_pipeline(device, &shader, &single_input, "fs_threshold", format, "Bloom Threshold Pipeline");
        let blur_pipeline = fullscreen_pipeline(device, &shader, &single_input, "fs_blur", format, "Bloom Blur Pipeline");
        let composite_pipeline = fullscreen_pipeline(device, &shader, &composite_layout, "fs_composite", format, "Bloom Composite Pipeline");

        let main_uniform = uniform(device, &uniform_layout, "Bloom: Main Uniform");
        let horizontal_uniform = uniform(device, &uniform_layout, "Bloom: Horizontal Blur Uniform");
        let vertical_uniform = uniform(device, &uniform_layout, "Bloom: Vertical Blur Uniform");

        let targets = Self::create_targets(device, format, &texture_layout, &sampler, size);

        Self {
            format,
            texture_layout,
            sampler,
            threshold_pipeline,
            blur_pipeline,
            composite_pipeline,
            main_uniform,
            horizontal_uniform,
            vertical_uniform,
            targets,
        }
    }

    fn create_targets(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        size: BufferSize,
    ) -> Targets {
        let (bloom_width, bloom_height) = bloom_extent(size);
        let scene = RenderTarget::new(device, format, size.width, size.height, "Scene Target");
        let bloom_a = RenderTarget::new(device, format, bloom_width, bloom_height, "Bloom Target A");
        let bloom_b = RenderTarget::new(device, format, bloom_width, bloom_height, "Bloom Target B");
        let input = |target: &RenderTarget, label: &str| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&target.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
            })
        };
        Targets {
            size,
            scene_input: input(&scene, "Bloom: Scene Input"),
            bloom_a_input: input(&bloom_a, "Bloom: A Input"),
            bloom_b_input: input(&bloom_b, "Bloom: B Input"),
            scene,
            bloom_a,
            bloom_b,
        }
    }

    pub fn set_size(&mut self, device: &wgpu::Device, size: BufferSize) {
        if size == self.targets.size {
            return;
        }
        self.targets = Self::create_targets(device, self.format, &self.texture_layout, &self.sampler, size);
    }

    /// Target the scene pass renders into.
    pub fn scene_view(&self) -> &wgpu::TextureView {
        &self.targets.scene.view
    }

    pub fn record(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        output: &wgpu::TextureView,
        params: &BloomParams,
    ) {
        let (bloom_width, bloom_height) = bloom_extent(self.targets.size);
        let base = BloomUniforms {
            threshold: params.threshold,
            strength: params.strength.max(0.0),
            spread: params.spread(),
            _padding: 0.0,
            direction: [0.0, 0.0],
            texel_size: [1.0 / bloom_width as f32, 1.0 / bloom_height as f32],
        };
        queue.write_buffer(&self.main_uniform.0, 0, bytemuck::bytes_of(&base));

        if params.is_visible() {
            let horizontal = BloomUniforms { direction: [1.0, 0.0], ..base };
            let vertical = BloomUniforms { direction: [0.0, 1.0], ..base };
            queue.write_buffer(&self.horizontal_uniform.0, 0, bytemuck::bytes_of(&horizontal));
            queue.write_buffer(&self.vertical_uniform.0, 0, bytemuck::bytes_of(&vertical));

            self.fullscreen(encoder, "Bloom Threshold Pass", &self.targets.bloom_a.view, &self.threshold_pipeline, &self.targets.scene_input, &self.main_uniform.1, None);
            self.fullscreen(encoder, "Bloom Horizontal Blur Pass", &self.targets.bloom_b.view, &self.blur_pipeline, &self.targets.bloom_a_input, &self.horizontal_uniform.1, None);
            self.fullscreen(encoder, "Bloom Vertical Blur Pass", &self.targets.bloom_a.view, &self.blur_pipeline, &self.targets.bloom_b_input, &self.vertical_uniform.1, None);
        }

        self.fullscreen(
            encoder,
            "Bloom Composite Pass",
            output,
            &self.composite_pipeline,
            &self.targets.scene_input,
            &self.main_uniform.1,
            Some(&self.targets.bloom_a_input),
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn fullscreen(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        output: &wgpu::TextureView,
        pipeline: &wgpu::RenderPipeline,
        input: &wgpu::BindGroup,
        uniforms: &wgpu::BindGroup,
        bloom: Option<&wgpu::BindGroup>,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(TEXTURE_GROUP_ID, input, &[]);
        pass.set_bind_group(UNIFORM_GROUP_ID, uniforms, &[]);
        if let Some(bloom) = bloom {
            pass.set_bind_group(BLOOM_GROUP_ID, bloom, &[]);
        }
        pass.draw(0..6, 0..1);
    }
}

fn bloom_extent(size: BufferSize) -> (u32, u32) {
    (
        (size.width / BLOOM_DOWNSAMPLE).max(1),
        (size.height / BLOOM_DOWNSAMPLE).max(1),
    )
}

fn uniform(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: std::mem::size_of::<BloomUniforms>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    });
    (buffer, bind_group)
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    fragment_entry: &str,
    format: wgpu::TextureFormat,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main_quad"),
            compilation_options: Default::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_dark() {
        let params = BloomParams::default();
        assert_eq!(params.threshold, 0.0);
        assert_eq!(params.strength, 0.0);
        assert_eq!(params.radius, 0.0);
        assert!(!params.is_visible());
    }

    #[test]
    fn test_spread_follows_radius() {
        let mut params = BloomParams::default();
        assert_eq!(params.spread(), 1.0);
        params.radius = 1.0;
        assert_eq!(params.spread(), 5.0);
        params.radius = 10.0;
        assert_eq!(params.spread(), 5.0);
    }

    #[test]
    fn test_bloom_extent_never_zero() {
        assert_eq!(bloom_extent(BufferSize { width: 1, height: 1 }), (1, 1));
        assert_eq!(bloom_extent(BufferSize { width: 1920, height: 1080 }), (960, 540));
    }

    #[test]
    fn test_uniform_layout_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<BloomUniforms>(), 32);
    }
}
