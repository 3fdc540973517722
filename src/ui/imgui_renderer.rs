use crate::renderer::{
    buffer::Buffer,
    image::Image,
    pipeline,
    vulkan_context::VulkanContext,
};
use ash::vk::{self, Handle};
use imgui::{internal::RawWrapper, DrawCmd, DrawData, DrawIdx, DrawVert, TextureId};
use std::path::Path;

/// Draws ImGui output into whatever render pass the caller has begun.
pub struct ImguiRenderer {
    pipeline_layout: vk::PipelineLayout,
    pipeline: vk::Pipeline,
    descriptor_pool: vk::DescriptorPool,
    descriptor_set_layout: vk::DescriptorSetLayout,

    font_image: Image,
    font_sampler: vk::Sampler,
    font_descriptor_set: vk::DescriptorSet,

    /// Kept alive until the next frame's fence has passed.
    vtx_buffer: Option<Buffer>,
    idx_buffer: Option<Buffer>,
}

impl ImguiRenderer {
    /// Builds the pipeline for `render_pass` and uploads the font atlas of
    /// `imgui`.
    pub fn new(
        vulkan_context: &VulkanContext,
        render_pass: vk::RenderPass,
        shader_dir: &Path,
        imgui: &mut imgui::Context,
    ) -> anyhow::Result<Self> {
        let device = vulkan_context.device();

        let descriptor_pool = pipeline::create_descriptor_pool(
            device,
            &[vk::DescriptorPoolSize {
                ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                descriptor_count: 1,
            }],
            1,
        )?;
        let descriptor_set_layout = pipeline::create_descriptor_set_layout(
            device,
            &[vk::DescriptorSetLayoutBinding::default()
                .stage_flags(vk::ShaderStageFlags::FRAGMENT)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(1)
                .binding(0)],
            vk::DescriptorSetLayoutCreateFlags::empty(),
        )?;
        let push_constant_ranges = [vk::PushConstantRange::default()
            .stage_flags(vk::ShaderStageFlags::VERTEX)
            .offset(0)
            // Scale and translate for 2D ImGui coordinates.
            .size(2 * size_of::<nalgebra_glm::Vec2>() as u32)];
        let pipeline_layout = pipeline::create_pipeline_layout(
            device,
            &push_constant_ranges,
            &[descriptor_set_layout],
        )?;

        let vert_module = pipeline::create_shader_module(device, shader_dir.join("imgui.vert.spv"))?;
        let frag_module = pipeline::create_shader_module(device, shader_dir.join("imgui.frag.spv"))?;

        let binding_descs = [vk::VertexInputBindingDescription::default()
            .stride(size_of::<DrawVert>() as u32)
            .input_rate(vk::VertexInputRate::VERTEX)];
        let attribute_descs = [
            vk::VertexInputAttributeDescription::default()
                .location(0)
                .binding(binding_descs[0].binding)
                .format(vk::Format::R32G32_SFLOAT)
                .offset(std::mem::offset_of!(DrawVert, pos) as u32),
            vk::VertexInputAttributeDescription::default()
                .location(1)
                .binding(binding_descs[0].binding)
                .format(vk::Format::R32G32_SFLOAT)
                .offset(std::mem::offset_of!(DrawVert, uv) as u32),
            vk::VertexInputAttributeDescription::default()
                .location(2)
                .binding(binding_descs[0].binding)
                .format(vk::Format::R8G8B8A8_UNORM)
                .offset(std::mem::offset_of!(DrawVert, col) as u32),
        ];
        let pipeline = pipeline::create_graphics_pipeline(
            device,
            render_pass,
            pipeline_layout,
            vk::PipelineDepthStencilStateCreateInfo::default(),
            vk::PipelineVertexInputStateCreateInfo::default()
                .vertex_binding_descriptions(&binding_descs)
                .vertex_attribute_descriptions(&attribute_descs),
            vert_module,
            frag_module,
            true,
        )?;

        let fonts = imgui.fonts();
        let atlas = fonts.build_rgba32_texture();
        log::debug!("Uploading {}x{} font atlas", atlas.width, atlas.height);
        let font_image =
            Image::new_sampled(vulkan_context, atlas.width, atlas.height, vk::Format::R8G8B8A8_UNORM)?;
        font_image.upload(vulkan_context, atlas.data)?;
        let font_sampler = pipeline::create_sampler(
            device,
            vk::Filter::LINEAR,
            vk::Filter::LINEAR,
            vk::SamplerAddressMode::CLAMP_TO_EDGE,
        )?;
        let font_descriptor_set = pipeline::create_texture_descriptor_set(
            device,
            &[descriptor_set_layout],
            descriptor_pool,
            font_sampler,
            font_image.image_view,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        )?;
        fonts.tex_id = TextureId::new(font_descriptor_set.as_raw() as usize);

        Ok(Self {
            pipeline_layout,
            pipeline,
            descriptor_pool,
            descriptor_set_layout,
            font_image,
            font_sampler,
            font_descriptor_set,
            vtx_buffer: None,
            idx_buffer: None,
        })
    }

    pub fn destroy(&mut self, device: &ash::Device) {
        unsafe {
            self.release_buffers(device);
            device.destroy_pipeline(self.pipeline, None);
            device.destroy_pipeline_layout(self.pipeline_layout, None);
            device.destroy_sampler(self.font_sampler, None);
            // Also frees the font descriptor set.
            device.destroy_descriptor_pool(self.descriptor_pool, None);
            device.destroy_descriptor_set_layout(self.descriptor_set_layout, None);
        }
        self.font_image.destroy(device);
    }

    fn release_buffers(&mut self, device: &ash::Device) {
        if let Some(buffer) = self.vtx_buffer.take() {
            buffer.destroy(device);
        }
        if let Some(buffer) = self.idx_buffer.take() {
            buffer.destroy(device);
        }
    }

    /// Records `draw_data` into `cmd`. The previous frame must have finished.
    pub fn record(
        &mut self,
        vulkan_context: &VulkanContext,
        cmd: vk::CommandBuffer,
        draw_data: &DrawData,
    ) -> anyhow::Result<()> {
        let device = vulkan_context.device();
        self.release_buffers(device);

        let width = draw_data.display_size[0] * draw_data.framebuffer_scale[0];
        let height = draw_data.display_size[1] * draw_data.framebuffer_scale[1];
        if width <= 0.0 || height <= 0.0 || draw_data.total_vtx_count == 0 {
            return Ok(());
        }

        let mut vertices = Vec::with_capacity(draw_data.total_vtx_count as usize);
        let mut indices = Vec::with_capacity(draw_data.total_idx_count as usize);
        for draw_list in draw_data.draw_lists() {
            vertices.extend_from_slice(draw_list.vtx_buffer());
            indices.extend_from_slice(draw_list.idx_buffer());
        }

        // Owned by `self` as soon as they exist, so an error still frees them.
        let vtx_buffer = Self::host_buffer(vulkan_context, &vertices, vk::BufferUsageFlags::VERTEX_BUFFER)?;
        let vtx_handle = vtx_buffer.buffer;
        self.vtx_buffer = Some(vtx_buffer);
        let idx_buffer = Self::host_buffer(vulkan_context, &indices, vk::BufferUsageFlags::INDEX_BUFFER)?;
        let idx_handle = idx_buffer.buffer;
        self.idx_buffer = Some(idx_buffer);

        let scale = draw_data.display_size.map(|v| 2.0 / v);
        let translate = [
            -1.0 - draw_data.display_pos[0] * scale[0],
            -1.0 - draw_data.display_pos[1] * scale[1],
        ];
        let mut push_constants = [0.0f32; 4];
        push_constants[..2].copy_from_slice(&scale);
        push_constants[2..].copy_from_slice(&translate);

        unsafe {
            device.cmd_bind_pipeline(cmd, vk::PipelineBindPoint::GRAPHICS, self.pipeline);
            let viewports = [vk::Viewport::default()
                .width(width)
                .height(height)
                .min_depth(0.0)
                .max_depth(1.0)];
            device.cmd_set_viewport(cmd, 0, &viewports);
            device.cmd_push_constants(
                cmd,
                self.pipeline_layout,
                vk::ShaderStageFlags::VERTEX,
                0,
                bytemuck::cast_slice(&push_constants),
            );
            device.cmd_bind_vertex_buffers(cmd, 0, &[vtx_handle], &[0]);
            device.cmd_bind_index_buffer(
                cmd,
                idx_handle,
                0,
                if size_of::<DrawIdx>() == 2 {
                    vk::IndexType::UINT16
                } else {
                    vk::IndexType::UINT32
                },
            );
            device.cmd_bind_descriptor_sets(
                cmd,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline_layout,
                0,
                &[self.font_descriptor_set],
                &[],
            );
        }

        let clip_off = draw_data.display_pos;
        let clip_scale = draw_data.framebuffer_scale;
        let mut vtx_offset = 0;
        let mut idx_offset = 0;
        for draw_list in draw_data.draw_lists() {
            for draw_cmd in draw_list.commands() {
                match draw_cmd {
                    DrawCmd::Elements { count, cmd_params } => {
                        let clip_min = [
                            ((cmd_params.clip_rect[0] - clip_off[0]) * clip_scale[0]).max(0.0),
                            ((cmd_params.clip_rect[1] - clip_off[1]) * clip_scale[1]).max(0.0),
                        ];
                        let clip_max = [
                            ((cmd_params.clip_rect[2] - clip_off[0]) * clip_scale[0]).min(width),
                            ((cmd_params.clip_rect[3] - clip_off[1]) * clip_scale[1]).min(height),
                        ];
                        if clip_max[0] <= clip_min[0] || clip_max[1] <= clip_min[1] {
                            continue;
                        }

                        let scissors = [vk::Rect2D {
                            offset: vk::Offset2D {
                                x: clip_min[0] as i32,
                                y: clip_min[1] as i32,
                            },
                            extent: vk::Extent2D {
                                width: (clip_max[0] - clip_min[0]) as u32,
                                height: (clip_max[1] - clip_min[1]) as u32,
                            },
                        }];
                        unsafe {
                            device.cmd_set_scissor(cmd, 0, &scissors);
                            device.cmd_draw_indexed(
                                cmd,
                                count as u32,
                                1,
                                (cmd_params.idx_offset + idx_offset) as u32,
                                (cmd_params.vtx_offset + vtx_offset) as i32,
                                0,
                            );
                        }
                    }
                    DrawCmd::ResetRenderState => {
                        log::trace!("Ignoring ImGui render state reset");
                    }
                    DrawCmd::RawCallback { callback, raw_cmd } => unsafe {
                        callback(draw_list.raw(), raw_cmd);
                    },
                }
            }
            idx_offset += draw_list.idx_buffer().len();
            vtx_offset += draw_list.vtx_buffer().len();
        }

        Ok(())
    }

    fn host_buffer<T: Copy>(
        vulkan_context: &VulkanContext,
        data: &[T],
        usage: vk::BufferUsageFlags,
    ) -> anyhow::Result<Buffer> {
        let bytes = std::mem::size_of_val(data);
        let buffer = Buffer::new(
            vulkan_context,
            pipeline::align_buffer_size(bytes as vk::DeviceSize, 256),
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            usage,
        )?;
        let mapped = match buffer.map_memory(vulkan_context) {
            Ok(mapped) => mapped,
            Err(err) => {
                buffer.destroy(vulkan_context.device());
                return Err(err);
            }
        };
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr().cast::<u8>(), mapped.cast::<u8>(), bytes);
        }
        buffer.unmap_memory(vulkan_context.device());
        Ok(buffer)
    }
}
