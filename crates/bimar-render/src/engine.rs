//! The wgpu forward renderer.

use std::sync::Arc;

use bimar_core::{Camera, Color, SceneGraph};
use wgpu::util::DeviceExt;

use crate::draw_list::DrawList;
use crate::error::{RenderError, RenderResult};
use crate::gpu_mesh::GpuMeshCache;
use crate::pipeline::{ScenePipelines, DEPTH_FORMAT};
use crate::screenshot::ScreenshotError;
use crate::uniforms::{CameraUniforms, DrawUniforms, LightUniforms};
use crate::SceneRenderer;

/// Color format of headless render targets.
const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Initial number of per-draw uniform slots.
const INITIAL_DRAW_CAPACITY: usize = 64;

struct Offscreen {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// The main rendering engine backed by wgpu.
pub struct RenderEngine {
    /// The wgpu instance.
    pub instance: wgpu::Instance,
    /// The wgpu adapter.
    pub adapter: wgpu::Adapter,
    /// The wgpu device.
    pub device: wgpu::Device,
    /// The wgpu queue.
    pub queue: wgpu::Queue,
    /// The render surface (None for headless).
    pub surface: Option<wgpu::Surface<'static>>,
    /// Surface configuration (describes the offscreen target when headless).
    pub surface_config: wgpu::SurfaceConfiguration,
    /// Current width in pixels.
    pub width: u32,
    /// Current height in pixels.
    pub height: u32,
    /// Clear color.
    pub background: Color,

    depth_view: wgpu::TextureView,
    offscreen: Option<Offscreen>,
    pipelines: ScenePipelines,
    camera_buffer: wgpu::Buffer,
    light_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    draw_buffer: wgpu::Buffer,
    draw_bind_group: wgpu::BindGroup,
    draw_capacity: usize,
    draw_stride: u64,
    meshes: GpuMeshCache,
    frame_index: u64,
}

impl RenderEngine {
    /// Creates a new windowed render engine.
    pub async fn new_windowed(window: Arc<winit::window::Window>) -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| RenderError::AdapterCreationFailed)?;

        let (device, queue) = Self::request_device(&adapter, "bimar device").await?;

        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(RenderError::SurfaceConfigurationFailed)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);
        log::info!(
            "render engine ready: {} ({:?}), {width}x{height}",
            adapter.get_info().name,
            surface_format
        );

        Ok(Self::assemble(
            instance,
            adapter,
            device,
            queue,
            Some(surface),
            surface_config,
        ))
    }

    /// Creates a render engine that draws into an offscreen texture.
    pub async fn new_headless(width: u32, height: u32) -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| RenderError::AdapterCreationFailed)?;

        let (device, queue) = Self::request_device(&adapter, "bimar device (headless)").await?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            format: OFFSCREEN_FORMAT,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        log::info!(
            "headless render engine ready: {}, {}x{}",
            adapter.get_info().name,
            surface_config.width,
            surface_config.height
        );

        Ok(Self::assemble(
            instance,
            adapter,
            device,
            queue,
            None,
            surface_config,
        ))
    }

    async fn request_device(
        adapter: &wgpu::Adapter,
        label: &str,
    ) -> RenderResult<(wgpu::Device, wgpu::Queue)> {
        Ok(adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some(label),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?)
    }

    fn assemble(
        instance: wgpu::Instance,
        adapter: wgpu::Adapter,
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface: Option<wgpu::Surface<'static>>,
        surface_config: wgpu::SurfaceConfiguration,
    ) -> Self {
        let width = surface_config.width;
        let height = surface_config.height;
        let pipelines = ScenePipelines::new(&device, surface_config.format);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera uniforms"),
            contents: bytemuck::cast_slice(&[CameraUniforms::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("light uniforms"),
            contents: bytemuck::cast_slice(&[LightUniforms::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame bind group"),
            layout: &pipelines.frame_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_buffer.as_entire_binding(),
                },
            ],
        });

        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let size = std::mem::size_of::<DrawUniforms>() as u64;
        let draw_stride = size.div_ceil(alignment) * alignment;
        let (draw_buffer, draw_bind_group) = Self::create_draw_buffer(
            &device,
            &pipelines.draw_layout,
            INITIAL_DRAW_CAPACITY,
            draw_stride,
        );

        let depth_view = Self::create_depth_view(&device, width, height);
        let offscreen = surface
            .is_none()
            .then(|| Self::create_offscreen(&device, width, height));

        Self {
            instance,
            adapter,
            device,
            queue,
            surface,
            surface_config,
            width,
            height,
            background: Color::BLACK,
            depth_view,
            offscreen,
            pipelines,
            camera_buffer,
            light_buffer,
            frame_bind_group,
            draw_buffer,
            draw_bind_group,
            draw_capacity: INITIAL_DRAW_CAPACITY,
            draw_stride,
            meshes: GpuMeshCache::new(),
            frame_index: 0,
        }
    }

    fn create_draw_buffer(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        capacity: usize,
        stride: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("draw uniforms"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniforms>() as u64),
                }),
            }],
        });
        (buffer, bind_group)
    }

    fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn create_offscreen(device: &wgpu::Device, width: u32, height: u32) -> Offscreen {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen color"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OFFSCREEN_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Offscreen { texture, view }
    }

    /// Resizes the render target. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.width = width;
        self.height = height;
        self.surface_config.width = width;
        self.surface_config.height = height;

        if let Some(ref surface) = self.surface {
            surface.configure(&self.device, &self.surface_config);
        }
        self.depth_view = Self::create_depth_view(&self.device, width, height);
        if self.offscreen.is_some() {
            self.offscreen = Some(Self::create_offscreen(&self.device, width, height));
        }
    }

    /// Returns the current viewport dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of geometries with buffers on the GPU.
    pub fn cached_meshes(&self) -> usize {
        self.meshes.len()
    }

    fn ensure_draw_capacity(&mut self, draws: usize) {
        if draws <= self.draw_capacity {
            return;
        }
        let capacity = draws.next_power_of_two();
        let (buffer, bind_group) = Self::create_draw_buffer(
            &self.device,
            &self.pipelines.draw_layout,
            capacity,
            self.draw_stride,
        );
        self.draw_buffer = buffer;
        self.draw_bind_group = bind_group;
        self.draw_capacity = capacity;
    }

    fn upload_frame(&mut self, camera: &Camera, list: &DrawList) {
        self.frame_index += 1;
        for geometry in &list.geometries {
            self.meshes.prepare(&self.device, geometry, self.frame_index);
        }

        self.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[CameraUniforms::from_camera(camera)]),
        );
        self.queue
            .write_buffer(&self.light_buffer, 0, bytemuck::cast_slice(&[list.lights]));

        self.ensure_draw_capacity(list.len());
        if !list.is_empty() {
            let stride = self.draw_stride as usize;
            let mut bytes = vec![0u8; stride * list.len()];
            for (i, call) in list.iter().enumerate() {
                let data = bytemuck::bytes_of(&call.uniforms);
                bytes[i * stride..i * stride + data.len()].copy_from_slice(data);
            }
            self.queue.write_buffer(&self.draw_buffer, 0, &bytes);
        }
    }

    fn encode_scene(&self, target: &wgpu::TextureView, list: &DrawList) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene encoder"),
            });

        {
            let bg = self.background.0;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(bg.x),
                            g: f64::from(bg.y),
                            b: f64::from(bg.z),
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
            let passes = [
                (&self.pipelines.opaque, &list.opaque, 0usize),
                (
                    &self.pipelines.transparent,
                    &list.transparent,
                    list.opaque.len(),
                ),
            ];
            for (pipeline, calls, first_slot) in passes {
                if calls.is_empty() {
                    continue;
                }
                render_pass.set_pipeline(pipeline);
                for (i, call) in calls.iter().enumerate() {
                    let Some(mesh) = self.meshes.get(call.geometry) else {
                        continue;
                    };
                    let offset = ((first_slot + i) as u64 * self.draw_stride) as u32;
                    render_pass.set_bind_group(1, &self.draw_bind_group, &[offset]);
                    render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    let end = call.indices.end.min(mesh.index_count);
                    render_pass.draw_indexed(call.indices.start..end, 0, 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Draws the scene to the window surface, or to the offscreen target when headless.
    pub fn render_scene(&mut self, scene: &SceneGraph, camera: &Camera) -> RenderResult<()> {
        let list = DrawList::collect(scene, camera);
        self.upload_frame(camera, &list);

        if let Some(surface) = &self.surface {
            let output = match surface.get_current_texture() {
                Ok(output) => output,
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    log::warn!("surface lost, reconfiguring");
                    surface.configure(&self.device, &self.surface_config);
                    return Ok(());
                }
                Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
                Err(err) => {
                    log::warn!("skipping frame: {err}");
                    return Ok(());
                }
            };
            let view = output
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());
            self.encode_scene(&view, &list);
            output.present();
        } else if let Some(offscreen) = &self.offscreen {
            self.encode_scene(&offscreen.view, &list);
        }

        self.meshes.evict_stale(self.frame_index);
        Ok(())
    }

    /// Calculates bytes per row with proper alignment for wgpu buffer copies.
    fn aligned_bytes_per_row(width: u32) -> u32 {
        let bytes_per_pixel = 4u32; // RGBA8
        let unaligned = width * bytes_per_pixel;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        unaligned.div_ceil(align) * align
    }

    /// Reads back the last headless frame as tightly packed RGBA8 rows.
    pub fn capture(&self) -> RenderResult<Vec<u8>> {
        let offscreen = self
            .offscreen
            .as_ref()
            .ok_or(RenderError::NoOffscreenTarget)?;

        let bytes_per_row = Self::aligned_bytes_per_row(self.width);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("capture buffer"),
            size: u64::from(bytes_per_row) * u64::from(self.height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("capture copy encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &offscreen.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).ok();
        });
        let _ = self.device.poll(wgpu::PollType::wait_indefinitely());
        rx.recv()
            .map_err(|_| ScreenshotError::BufferMapFailed)?
            .map_err(|_| ScreenshotError::BufferMapFailed)?;

        // Copy data, removing row padding
        let data = buffer_slice.get_mapped_range();
        let row_bytes = (self.width * 4) as usize;
        let mut pixels = Vec::with_capacity(row_bytes * self.height as usize);
        for row in 0..self.height {
            let start = (row * bytes_per_row) as usize;
            pixels.extend_from_slice(&data[start..start + row_bytes]);
        }
        drop(data);
        buffer.unmap();

        Ok(pixels)
    }
}

impl SceneRenderer for RenderEngine {
    fn render(&mut self, scene: &SceneGraph, camera: &Camera) -> RenderResult<()> {
        self.render_scene(scene, camera)
    }

    fn resize(&mut self, width: u32, height: u32) {
        RenderEngine::resize(self, width, height);
    }

    fn set_background(&mut self, color: Color) {
        self.background = color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_bytes_per_row() {
        assert_eq!(RenderEngine::aligned_bytes_per_row(64), 256);
        assert_eq!(RenderEngine::aligned_bytes_per_row(65), 512);
        assert_eq!(RenderEngine::aligned_bytes_per_row(1), 256);
    }
}
