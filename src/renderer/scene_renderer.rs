use super::{
    buffer::Buffer,
    image::{GpuTexture, Image, DEPTH_FORMAT},
    pipeline,
    vulkan_context::VulkanContext,
    Frame, FrameState, Renderer,
};
use crate::assets::{AssetHandle, AssetRegistry};
use crate::scene::{light::LightsUniform, texture::TextureData, Material};
use crate::ui::imgui_renderer::ImguiRenderer;
use anyhow::Context;
use ash::vk;
use bytemuck::{Pod, Zeroable};
use nalgebra_glm::{Mat4, Vec3, Vec4};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::{collections::HashMap, path::Path};

const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Per-frame uniform block shared by the background and mesh pipelines.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct FrameUniform {
    view_projection: Mat4,
    inverse_view_projection: Mat4,
    lights: LightsUniform,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct MeshPushConstants {
    model: Mat4,
    /// rgb base colour, w = 1 when the texture should be sampled
    color: Vec4,
}

struct SyncHandles {
    acquire: vk::Semaphore,
    present: vk::Semaphore,
    fence: vk::Fence,
}

impl SyncHandles {
    fn new(device: &ash::Device) -> anyhow::Result<Self> {
        Ok(Self {
            acquire: pipeline::create_semaphore(device)?,
            present: pipeline::create_semaphore(device)?,
            // Signalled so the first frame does not wait forever.
            fence: pipeline::create_fence(device, vk::FenceCreateFlags::SIGNALED)?,
        })
    }

    fn destroy(&self, device: &ash::Device) {
        unsafe {
            device.destroy_semaphore(self.acquire, None);
            device.destroy_semaphore(self.present, None);
            device.destroy_fence(self.fence, None);
        }
    }
}

struct GpuMesh {
    vertices: Buffer,
    indices: Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn destroy(&self, device: &ash::Device) {
        self.vertices.destroy(device);
        self.indices.destroy(device);
    }
}

/// Swapchain sized attachments, rebuilt on resize.
struct Targets {
    depth: Image,
    scene_framebuffers: Vec<vk::Framebuffer>,
    ui_framebuffers: Vec<vk::Framebuffer>,
}

impl Targets {
    fn new(
        vulkan_context: &VulkanContext,
        scene_pass: vk::RenderPass,
        ui_pass: vk::RenderPass,
    ) -> anyhow::Result<Self> {
        let extent = vulkan_context.swapchain_extent();
        let depth = Image::new_depth(vulkan_context, extent)?;
        let views = vulkan_context.swapchain().image_views();
        let scene_framebuffers = views
            .iter()
            .map(|view| {
                pipeline::create_framebuffer(
                    vulkan_context.device(),
                    scene_pass,
                    &[*view, depth.image_view],
                    extent,
                )
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        let ui_framebuffers = views
            .iter()
            .map(|view| pipeline::create_framebuffer(vulkan_context.device(), ui_pass, &[*view], extent))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self {
            depth,
            scene_framebuffers,
            ui_framebuffers,
        })
    }

    fn destroy(&self, device: &ash::Device) {
        unsafe {
            for framebuffer in self.scene_framebuffers.iter().chain(&self.ui_framebuffers) {
                device.destroy_framebuffer(*framebuffer, None);
            }
        }
        self.depth.destroy(device);
    }
}

/// Vulkan implementation of [`Renderer`]: a background pass, the lit
/// meshes and the UI overlay, one frame in flight.
pub struct VulkanRenderer {
    vulkan_context: VulkanContext,

    scene_pass: vk::RenderPass,
    ui_pass: vk::RenderPass,
    targets: Targets,

    set_layout: vk::DescriptorSetLayout,
    pipeline_layout: vk::PipelineLayout,
    mesh_pipeline: vk::Pipeline,
    background_pipeline: vk::Pipeline,
    frame_uniform: Buffer,

    command_buffer: vk::CommandBuffer,
    sync: SyncHandles,
    image_index: Option<u32>,

    meshes: HashMap<AssetHandle, GpuMesh>,
    textures: HashMap<AssetHandle, GpuTexture>,
    white: GpuTexture,
    ui: ImguiRenderer,

    output_size: [u32; 2],
    needs_resize: bool,
}

impl VulkanRenderer {
    pub fn new(
        window: &(impl HasWindowHandle + HasDisplayHandle),
        output_size: [u32; 2],
        enable_validation: bool,
        shader_dir: &Path,
        imgui: &mut imgui::Context,
    ) -> anyhow::Result<Self> {
        let vulkan_context = VulkanContext::new(window, output_size, enable_validation)?;
        let device = vulkan_context.device();

        let scene_pass = pipeline::create_render_pass(
            device,
            vulkan_context.surface_format(),
            vk::AttachmentLoadOp::CLEAR,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            Some(DEPTH_FORMAT),
        )?;
        // Last pass of the frame, keeps what the scene drew.
        let ui_pass = pipeline::create_render_pass(
            device,
            vulkan_context.surface_format(),
            vk::AttachmentLoadOp::LOAD,
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            vk::ImageLayout::PRESENT_SRC_KHR,
            None,
        )?;
        let targets = Targets::new(&vulkan_context, scene_pass, ui_pass)?;

        let bindings = [
            vk::DescriptorSetLayoutBinding::default()
                .binding(0)
                .descriptor_count(1)
                .descriptor_type(vk::DescriptorType::STORAGE_BUFFER)
                .stage_flags(vk::ShaderStageFlags::VERTEX),
            vk::DescriptorSetLayoutBinding::default()
                .binding(1)
                .descriptor_count(1)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .stage_flags(vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT),
            vk::DescriptorSetLayoutBinding::default()
                .binding(2)
                .descriptor_count(1)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .stage_flags(vk::ShaderStageFlags::FRAGMENT),
        ];
        let set_layout = pipeline::create_descriptor_set_layout(
            device,
            &bindings,
            vk::DescriptorSetLayoutCreateFlags::PUSH_DESCRIPTOR_KHR,
        )?;
        let push_constant_ranges = [vk::PushConstantRange::default()
            .stage_flags(vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT)
            .offset(0)
            .size(size_of::<MeshPushConstants>() as u32)];
        let pipeline_layout =
            pipeline::create_pipeline_layout(device, &push_constant_ranges, &[set_layout])?;

        let mesh_pipeline = pipeline::create_graphics_pipeline(
            device,
            scene_pass,
            pipeline_layout,
            vk::PipelineDepthStencilStateCreateInfo::default()
                .depth_test_enable(true)
                .depth_write_enable(true)
                .depth_compare_op(vk::CompareOp::LESS)
                .min_depth_bounds(0.0)
                .max_depth_bounds(1.0),
            vk::PipelineVertexInputStateCreateInfo::default(),
            pipeline::create_shader_module(device, shader_dir.join("scene.vert.spv"))?,
            pipeline::create_shader_module(device, shader_dir.join("scene.frag.spv"))?,
            false,
        )?;
        let background_pipeline = pipeline::create_graphics_pipeline(
            device,
            scene_pass,
            pipeline_layout,
            vk::PipelineDepthStencilStateCreateInfo::default(),
            vk::PipelineVertexInputStateCreateInfo::default(),
            pipeline::create_shader_module(device, shader_dir.join("background.vert.spv"))?,
            pipeline::create_shader_module(device, shader_dir.join("background.frag.spv"))?,
            false,
        )?;

        let frame_uniform = Buffer::new(
            &vulkan_context,
            size_of::<FrameUniform>() as vk::DeviceSize,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            vk::BufferUsageFlags::UNIFORM_BUFFER,
        )?;

        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_buffer_count(1)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_pool(vulkan_context.device.graphics_command_pool);
        let command_buffer = unsafe { device.allocate_command_buffers(&allocate_info)? }
            .into_iter()
            .next()
            .context("failed to allocate the frame command buffer")?;
        let sync = SyncHandles::new(device)?;

        let white = GpuTexture::upload(&vulkan_context, &TextureData::white())?;
        let ui = ImguiRenderer::new(&vulkan_context, ui_pass, shader_dir, imgui)?;

        Ok(Self {
            vulkan_context,
            scene_pass,
            ui_pass,
            targets,
            set_layout,
            pipeline_layout,
            mesh_pipeline,
            background_pipeline,
            frame_uniform,
            command_buffer,
            sync,
            image_index: None,
            meshes: HashMap::new(),
            textures: HashMap::new(),
            white,
            ui,
            output_size,
            needs_resize: false,
        })
    }

    fn recreate_targets(&mut self) -> anyhow::Result<()> {
        unsafe { self.vulkan_context.device().device_wait_idle()? };
        self.targets.destroy(self.vulkan_context.device());
        self.vulkan_context.recreate_swapchain(self.output_size)?;
        self.targets = Targets::new(&self.vulkan_context, self.scene_pass, self.ui_pass)?;
        self.needs_resize = false;
        Ok(())
    }

    fn upload_mesh(&mut self, registry: &AssetRegistry, handle: AssetHandle) -> anyhow::Result<bool> {
        if self.meshes.contains_key(&handle) {
            return Ok(true);
        }
        let Some(mesh) = registry.get_mesh(handle) else {
            return Ok(false);
        };
        let vertices = Buffer::from_data(
            &self.vulkan_context,
            vk::BufferUsageFlags::STORAGE_BUFFER,
            &mesh.vertices,
        )?;
        let indices = Buffer::from_data(
            &self.vulkan_context,
            vk::BufferUsageFlags::INDEX_BUFFER,
            &mesh.indices,
        )?;
        log::trace!("Uploaded mesh {:?} with {} triangles", handle, mesh.triangle_count());
        self.meshes.insert(
            handle,
            GpuMesh {
                vertices,
                indices,
                index_count: mesh.indices.len() as u32,
            },
        );
        Ok(true)
    }

    /// Uploads the texture on first use. `None` while it is still loading.
    fn texture(
        &mut self,
        registry: &AssetRegistry,
        handle: AssetHandle,
    ) -> anyhow::Result<Option<&GpuTexture>> {
        if !self.textures.contains_key(&handle) {
            let Some(texture) = registry.get_texture(handle) else {
                return Ok(None);
            };
            let gpu_texture = GpuTexture::upload(&self.vulkan_context, &texture)?;
            log::debug!("Uploaded {}x{} texture {:?}", texture.width, texture.height, handle);
            self.textures.insert(handle, gpu_texture);
        }
        Ok(self.textures.get(&handle))
    }

    fn texture_or_white(
        &mut self,
        registry: &AssetRegistry,
        handle: Option<AssetHandle>,
    ) -> anyhow::Result<(vk::Sampler, vk::ImageView)> {
        if let Some(handle) = handle {
            if let Some(texture) = self.texture(registry, handle)? {
                return Ok((texture.sampler, texture.image.image_view));
            }
        }
        Ok((self.white.sampler, self.white.image.image_view))
    }

    fn push_descriptors(
        &self,
        vertices: Option<&Buffer>,
        sampler: vk::Sampler,
        image_view: vk::ImageView,
    ) {
        let uniform_info = [vk::DescriptorBufferInfo::default()
            .buffer(self.frame_uniform.buffer)
            .offset(0)
            .range(self.frame_uniform.size)];
        let image_info = [vk::DescriptorImageInfo::default()
            .sampler(sampler)
            .image_view(image_view)
            .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)];
        let vertex_info = vertices.map(|buffer| {
            [vk::DescriptorBufferInfo::default()
                .buffer(buffer.buffer)
                .offset(0)
                .range(buffer.size)]
        });

        let mut writes = vec![
            vk::WriteDescriptorSet::default()
                .dst_binding(1)
                .descriptor_count(1)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .buffer_info(&uniform_info),
            vk::WriteDescriptorSet::default()
                .dst_binding(2)
                .descriptor_count(1)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .image_info(&image_info),
        ];
        if let Some(vertex_info) = &vertex_info {
            writes.push(
                vk::WriteDescriptorSet::default()
                    .dst_binding(0)
                    .descriptor_count(1)
                    .descriptor_type(vk::DescriptorType::STORAGE_BUFFER)
                    .buffer_info(vertex_info),
            );
        }
        unsafe {
            self.vulkan_context
                .device
                .push_descriptor
                .cmd_push_descriptor_set(
                    self.command_buffer,
                    vk::PipelineBindPoint::GRAPHICS,
                    self.pipeline_layout,
                    0,
                    &writes,
                );
        }
    }

    fn draw_mesh(
        &self,
        handle: AssetHandle,
        model: Mat4,
        color: Vec3,
        textured: bool,
        texture: (vk::Sampler, vk::ImageView),
    ) {
        let Some(mesh) = self.meshes.get(&handle) else {
            return;
        };
        let device = self.vulkan_context.device();
        let constants = MeshPushConstants {
            model,
            color: Vec4::new(color.x, color.y, color.z, if textured { 1.0 } else { 0.0 }),
        };
        self.push_descriptors(Some(&mesh.vertices), texture.0, texture.1);
        unsafe {
            device.cmd_push_constants(
                self.command_buffer,
                self.pipeline_layout,
                vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
                0,
                bytemuck::bytes_of(&constants),
            );
            device.cmd_bind_index_buffer(self.command_buffer, mesh.indices.buffer, 0, vk::IndexType::UINT32);
            device.cmd_draw_indexed(self.command_buffer, mesh.index_count, 1, 0, 0, 0);
        }
    }
}

impl Renderer for VulkanRenderer {
    fn start_frame(&mut self) -> anyhow::Result<FrameState> {
        if self.needs_resize {
            self.recreate_targets()?;
        }

        let device = self.vulkan_context.device();
        unsafe { device.wait_for_fences(&[self.sync.fence], true, u64::MAX)? };

        let Some(image_index) = self
            .vulkan_context
            .swapchain()
            .acquire_next_image(&self.vulkan_context.device, self.sync.acquire)?
        else {
            log::debug!("Swapchain out of date on acquire");
            self.needs_resize = true;
            return Ok(FrameState::OutOfDate);
        };

        unsafe { device.reset_fences(&[self.sync.fence])? };
        self.image_index = Some(image_index);
        Ok(FrameState::Ready)
    }

    fn draw(&mut self, frame: &Frame) -> anyhow::Result<()> {
        let image_index = self
            .image_index
            .context("draw called without a started frame")? as usize;
        let registry = &frame.scene.registry;

        // Uploads block on the queue, so they happen before recording.
        let mut shape_textures = Vec::with_capacity(frame.scene.shapes.len());
        for shape in &frame.scene.shapes {
            self.upload_mesh(registry, shape.mesh)?;
            let texture = self.texture_or_white(registry, shape.material.texture())?;
            shape_textures.push(texture);
        }
        for model in frame.scene.models.iter().filter(|model| model.visible) {
            for mesh in &model.meshes {
                self.upload_mesh(registry, *mesh)?;
            }
        }
        let background = match frame.scene.background {
            Some(handle) => self
                .texture(registry, handle)?
                .map(|texture| (texture.sampler, texture.image.image_view)),
            None => None,
        };
        let white = (self.white.sampler, self.white.image.image_view);

        let view_projection = frame.camera.view_projection();
        let uniform = FrameUniform {
            view_projection,
            inverse_view_projection: nalgebra_glm::inverse(&view_projection),
            lights: LightsUniform::new(&frame.scene.lights, frame.camera.position()),
        };
        self.frame_uniform
            .write(&self.vulkan_context, std::slice::from_ref(&uniform))?;

        let extent = self.vulkan_context.swapchain_extent();
        let cmd = self.command_buffer;
        let device = self.vulkan_context.device();
        unsafe {
            device.reset_command_buffer(cmd, vk::CommandBufferResetFlags::empty())?;
            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            device.begin_command_buffer(cmd, &begin_info)?;

            let clear_values = [
                vk::ClearValue {
                    color: vk::ClearColorValue { float32: CLEAR_COLOR },
                },
                vk::ClearValue {
                    depth_stencil: vk::ClearDepthStencilValue {
                        depth: 1.0,
                        stencil: 0,
                    },
                },
            ];
            let render_area = vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            };
            device.cmd_begin_render_pass(
                cmd,
                &vk::RenderPassBeginInfo::default()
                    .render_pass(self.scene_pass)
                    .framebuffer(self.targets.scene_framebuffers[image_index])
                    .render_area(render_area)
                    .clear_values(&clear_values),
                vk::SubpassContents::INLINE,
            );

            // Flipped so +Y is up in clip space.
            let viewports = [vk::Viewport::default()
                .x(0.0)
                .y(extent.height as f32)
                .width(extent.width as f32)
                .height(-(extent.height as f32))
                .min_depth(0.0)
                .max_depth(1.0)];
            device.cmd_set_viewport(cmd, 0, &viewports);
            device.cmd_set_scissor(cmd, 0, &[render_area]);

            if let Some((sampler, view)) = background {
                device.cmd_bind_pipeline(cmd, vk::PipelineBindPoint::GRAPHICS, self.background_pipeline);
                self.push_descriptors(None, sampler, view);
                device.cmd_draw(cmd, 3, 1, 0, 0);
            }

            device.cmd_bind_pipeline(cmd, vk::PipelineBindPoint::GRAPHICS, self.mesh_pipeline);
            for (shape, texture) in frame.scene.shapes.iter().zip(shape_textures) {
                let textured = matches!(shape.material, Material::Textured(_));
                self.draw_mesh(
                    shape.mesh,
                    shape.transform.matrix(),
                    shape.material.base_color(),
                    textured,
                    texture,
                );
            }
            for model in frame.scene.models.iter().filter(|model| model.visible) {
                let matrix = model.transform.matrix();
                for mesh in &model.meshes {
                    self.draw_mesh(*mesh, matrix, Vec3::repeat(1.0), false, white);
                }
            }
            device.cmd_end_render_pass(cmd);

            device.cmd_begin_render_pass(
                cmd,
                &vk::RenderPassBeginInfo::default()
                    .render_pass(self.ui_pass)
                    .framebuffer(self.targets.ui_framebuffers[image_index])
                    .render_area(render_area),
                vk::SubpassContents::INLINE,
            );
        }
        if let Some(draw_data) = frame.ui {
            self.ui.record(&self.vulkan_context, cmd, draw_data)?;
        }
        unsafe {
            device.cmd_end_render_pass(cmd);
            device.end_command_buffer(cmd)?;
        }
        Ok(())
    }

    fn end_frame(&mut self) -> anyhow::Result<FrameState> {
        let image_index = self
            .image_index
            .take()
            .context("end_frame called without a started frame")?;
        let device = self.vulkan_context.device();

        let cmds = [self.command_buffer];
        let waits = [self.sync.acquire];
        let signals = [self.sync.present];
        let stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let submit_info = vk::SubmitInfo::default()
            .command_buffers(&cmds)
            .wait_semaphores(&waits)
            .wait_dst_stage_mask(&stages)
            .signal_semaphores(&signals);
        unsafe {
            device.queue_submit(
                self.vulkan_context.device.graphics_queue,
                &[submit_info],
                self.sync.fence,
            )?;
        }

        let presented = self.vulkan_context.swapchain().queue_present(
            &self.vulkan_context.device,
            image_index,
            self.sync.present,
        )?;
        if !presented {
            log::debug!("Swapchain out of date on present");
            self.needs_resize = true;
            return Ok(FrameState::OutOfDate);
        }
        Ok(FrameState::Ready)
    }

    fn resized(&mut self, dims: [u32; 2]) -> anyhow::Result<()> {
        self.output_size = dims;
        self.needs_resize = true;
        Ok(())
    }

    fn output_size(&self) -> [u32; 2] {
        self.output_size
    }
}

impl Drop for VulkanRenderer {
    fn drop(&mut self) {
        let device = self.vulkan_context.device();
        unsafe {
            let _ = device.device_wait_idle();
        }
        self.ui.destroy(device);
        for mesh in self.meshes.values() {
            mesh.destroy(device);
        }
        for texture in self.textures.values() {
            texture.destroy(device);
        }
        self.white.destroy(device);
        self.frame_uniform.destroy(device);
        self.sync.destroy(device);
        self.targets.destroy(device);
        unsafe {
            device.free_command_buffers(
                self.vulkan_context.device.graphics_command_pool,
                &[self.command_buffer],
            );
            device.destroy_pipeline(self.mesh_pipeline, None);
            device.destroy_pipeline(self.background_pipeline, None);
            device.destroy_pipeline_layout(self.pipeline_layout, None);
            device.destroy_descriptor_set_layout(self.set_layout, None);
            device.destroy_render_pass(self.scene_pass, None);
            device.destroy_render_pass(self.ui_pass, None);
        }
    }
}
