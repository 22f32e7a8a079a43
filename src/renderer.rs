use std::sync::Arc;

use image::RgbaImage;
use log::info;
use winit::window::Window;

use crate::bloom_pass::BloomPipeline;
use crate::config::{EngineConfig, GRID_HEIGHT, GRID_SEGMENTS_X, GRID_SEGMENTS_Y, GRID_WIDTH};
use crate::engine::EngineState;
use crate::error::{EngineError, Result};
use crate::geometry::point_grid;
use crate::scene_pass::ScenePass;
use crate::selector::TexturePool;
use crate::uniforms::MaterialUniforms;
use crate::viewport::BufferSize;

pub struct GpuTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl GpuTexture {
    fn from_rgba(device: &wgpu::Device, queue: &wgpu::Queue, image: &RgbaImage, label: &str) -> Self {
        let (width, height) = image.dimensions();
        let size = wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { _texture: texture, view }
    }

    /// 1x1 black stand-in for slots that are unset or failed to load.
    fn placeholder(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let pixel = RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 255]));
        Self::from_rgba(device, queue, &pixel, "Placeholder Texture")
    }
}

/// Key of the cached pair bind group: slots plus pool revision.
type PairKey = (Option<usize>, Option<usize>, u64);

pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    clear_color: wgpu::Color,
    scene: ScenePass,
    bloom: BloomPipeline,
    pool: TexturePool<GpuTexture>,
    pool_revision: u64,
    placeholder: GpuTexture,
    pair_bind_group: Option<(PairKey, wgpu::BindGroup)>,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, size: BufferSize, engine_config: &EngineConfig) -> Result<Self> {
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: Some(&surface),
            })
            .await
            .ok_or(EngineError::NoAdapter)?;
        info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

        let config = surface
            .get_default_config(&adapter, size.width, size.height)
            .ok_or(EngineError::UnsupportedSurface)?;
        surface.configure(&device, &config);

        let points = point_grid(GRID_WIDTH, GRID_HEIGHT, GRID_SEGMENTS_X, GRID_SEGMENTS_Y);
        let scene = ScenePass::new(&device, config.format, &points);
        let bloom = BloomPipeline::new(&device, config.format, size);
        let placeholder = GpuTexture::placeholder(&device, &queue);
        info!("scene assembled: {} points, surface format {:?}", points.len(), config.format);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            clear_color: engine_config.clear_color,
            scene,
            bloom,
            pool: TexturePool::new(engine_config.textures.len()),
            pool_revision: 0,
            placeholder,
            pair_bind_group: None,
        })
    }

    pub fn upload_texture(&mut self, index: usize, image: &RgbaImage) {
        let texture = GpuTexture::from_rgba(&self.device, &self.queue, image, "Pool Texture");
        self.pool.insert(index, texture);
        self.pool_revision += 1;
        info!("texture slot {index} loaded ({}x{})", image.width(), image.height());
    }

    pub fn mark_failed(&mut self, index: usize, reason: &EngineError) {
        self.pool.mark_failed(index, reason);
    }

    /// Follows the resize adapter: surface and bloom buffers.
    pub fn set_size(&mut self, size: BufferSize) {
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
        self.bloom.set_size(&self.device, size);
    }

    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    fn refresh_pair_bind_group(&mut self, state: &EngineState) {
        let key = (state.uniforms.texture_a, state.uniforms.texture_b, self.pool_revision);
        if matches!(&self.pair_bind_group, Some((cached, _)) if *cached == key) {
            return;
        }
        let a = self.pool.get_or(key.0, &self.placeholder);
        let b = self.pool.get_or(key.1, &self.placeholder);
        let bind_group = self.scene.pair_bind_group(&self.device, &a.view, &b.view);
        self.pair_bind_group = Some((key, bind_group));
    }

    /// Scene pass into the offscreen target, then bloom composite to the surface.
    pub fn render(&mut self, state: &EngineState) -> std::result::Result<(), wgpu::SurfaceError> {
        let material = MaterialUniforms::new(state.camera.view_projection(), &state.uniforms);
        self.scene.write_material(&self.queue, &material);
        self.refresh_pair_bind_group(state);

        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });

        if let Some((_, pair)) = &self.pair_bind_group {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.bloom.scene_view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.scene.record(&mut rpass, pair);
        }
        self.bloom.record(&mut encoder, &self.queue, &view, &state.bloom);

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}
