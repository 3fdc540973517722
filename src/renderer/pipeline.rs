//! Free helpers for the render passes, pipelines and sync objects the
//! scene and UI renderers share.

use anyhow::Context;
use ash::vk;
use std::path::Path;

/// Single subpass pass over a colour attachment and, optionally, a depth
/// attachment that is always cleared.
pub fn create_render_pass(
    device: &ash::Device,
    color_format: vk::Format,
    load_op: vk::AttachmentLoadOp,
    initial_layout: vk::ImageLayout,
    final_layout: vk::ImageLayout,
    depth_format: Option<vk::Format>,
) -> anyhow::Result<vk::RenderPass> {
    let mut attachments = vec![vk::AttachmentDescription::default()
        .format(color_format)
        .samples(vk::SampleCountFlags::TYPE_1)
        .load_op(load_op)
        .store_op(vk::AttachmentStoreOp::STORE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(initial_layout)
        .final_layout(final_layout)];
    if let Some(depth_format) = depth_format {
        attachments.push(
            vk::AttachmentDescription::default()
                .format(depth_format)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::DONT_CARE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
        );
    }

    let color_refs = [vk::AttachmentReference::default()
        .attachment(0)
        .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)];
    let depth_ref = vk::AttachmentReference::default()
        .attachment(1)
        .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);
    let mut subpass = vk::SubpassDescription::default()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(&color_refs);
    if depth_format.is_some() {
        subpass = subpass.depth_stencil_attachment(&depth_ref);
    }

    // Waits for the previous pass (or the acquire) before touching colour.
    let dependencies = [vk::SubpassDependency::default()
        .src_subpass(vk::SUBPASS_EXTERNAL)
        .dst_subpass(0)
        .src_stage_mask(
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
        )
        .dst_stage_mask(
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
        )
        .src_access_mask(
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        )
        .dst_access_mask(
            vk::AccessFlags::COLOR_ATTACHMENT_READ
                | vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        )];

    let subpasses = [subpass];
    let create_info = vk::RenderPassCreateInfo::default()
        .attachments(&attachments)
        .subpasses(&subpasses)
        .dependencies(&dependencies);
    Ok(unsafe { device.create_render_pass(&create_info, None)? })
}

pub fn create_framebuffer(
    device: &ash::Device,
    render_pass: vk::RenderPass,
    attachments: &[vk::ImageView],
    extent: vk::Extent2D,
) -> anyhow::Result<vk::Framebuffer> {
    let create_info = vk::FramebufferCreateInfo::default()
        .render_pass(render_pass)
        .attachments(attachments)
        .width(extent.width)
        .height(extent.height)
        .layers(1);
    Ok(unsafe { device.create_framebuffer(&create_info, None)? })
}

pub fn create_descriptor_set_layout(
    device: &ash::Device,
    bindings: &[vk::DescriptorSetLayoutBinding],
    flags: vk::DescriptorSetLayoutCreateFlags,
) -> anyhow::Result<vk::DescriptorSetLayout> {
    let create_info = vk::DescriptorSetLayoutCreateInfo::default()
        .bindings(bindings)
        .flags(flags);
    Ok(unsafe { device.create_descriptor_set_layout(&create_info, None)? })
}

pub fn create_pipeline_layout(
    device: &ash::Device,
    push_constant_ranges: &[vk::PushConstantRange],
    set_layouts: &[vk::DescriptorSetLayout],
) -> anyhow::Result<vk::PipelineLayout> {
    let create_info = vk::PipelineLayoutCreateInfo::default()
        .set_layouts(set_layouts)
        .push_constant_ranges(push_constant_ranges);
    Ok(unsafe { device.create_pipeline_layout(&create_info, None)? })
}

pub fn create_descriptor_pool(
    device: &ash::Device,
    pool_sizes: &[vk::DescriptorPoolSize],
    max_sets: u32,
) -> anyhow::Result<vk::DescriptorPool> {
    let create_info = vk::DescriptorPoolCreateInfo::default()
        .flags(vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET)
        .pool_sizes(pool_sizes)
        .max_sets(max_sets);
    Ok(unsafe { device.create_descriptor_pool(&create_info, None)? })
}

/// Reads a SPIR-V file as words.
pub fn load_shader(path: impl AsRef<Path>) -> anyhow::Result<Vec<u32>> {
    let path = path.as_ref();
    let mut file = std::fs::File::open(path)
        .with_context(|| format!("failed to open shader {}", path.display()))?;
    ash::util::read_spv(&mut file).with_context(|| format!("invalid SPIR-V in {}", path.display()))
}

pub fn create_shader_module(
    device: &ash::Device,
    path: impl AsRef<Path>,
) -> anyhow::Result<vk::ShaderModule> {
    let code = load_shader(path)?;
    let create_info = vk::ShaderModuleCreateInfo::default().code(&code);
    Ok(unsafe { device.create_shader_module(&create_info, None)? })
}

/// Triangle list pipeline with dynamic viewport and scissor. The shader
/// modules are consumed.
#[allow(clippy::too_many_arguments)]
pub fn create_graphics_pipeline(
    device: &ash::Device,
    render_pass: vk::RenderPass,
    pipeline_layout: vk::PipelineLayout,
    depth_stencil_state: vk::PipelineDepthStencilStateCreateInfo,
    vertex_input_state: vk::PipelineVertexInputStateCreateInfo,
    vert_module: vk::ShaderModule,
    frag_module: vk::ShaderModule,
    alpha_blend: bool,
) -> anyhow::Result<vk::Pipeline> {
    let stages = [
        vk::PipelineShaderStageCreateInfo::default()
            .stage(vk::ShaderStageFlags::VERTEX)
            .module(vert_module)
            .name(c"main"),
        vk::PipelineShaderStageCreateInfo::default()
            .stage(vk::ShaderStageFlags::FRAGMENT)
            .module(frag_module)
            .name(c"main"),
    ];
    let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
        .topology(vk::PrimitiveTopology::TRIANGLE_LIST);
    let viewport_state = vk::PipelineViewportStateCreateInfo::default()
        .viewport_count(1)
        .scissor_count(1);
    let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
        .polygon_mode(vk::PolygonMode::FILL)
        .cull_mode(vk::CullModeFlags::NONE)
        .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
        .line_width(1.0);
    let multisample = vk::PipelineMultisampleStateCreateInfo::default()
        .rasterization_samples(vk::SampleCountFlags::TYPE_1);

    let blend_attachments = [vk::PipelineColorBlendAttachmentState::default()
        .blend_enable(alpha_blend)
        .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
        .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
        .color_blend_op(vk::BlendOp::ADD)
        .src_alpha_blend_factor(vk::BlendFactor::ONE)
        .dst_alpha_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
        .alpha_blend_op(vk::BlendOp::ADD)
        .color_write_mask(vk::ColorComponentFlags::RGBA)];
    let color_blend = vk::PipelineColorBlendStateCreateInfo::default().attachments(&blend_attachments);

    let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
    let dynamic_state = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

    let create_info = vk::GraphicsPipelineCreateInfo::default()
        .stages(&stages)
        .vertex_input_state(&vertex_input_state)
        .input_assembly_state(&input_assembly)
        .viewport_state(&viewport_state)
        .rasterization_state(&rasterization)
        .multisample_state(&multisample)
        .depth_stencil_state(&depth_stencil_state)
        .color_blend_state(&color_blend)
        .dynamic_state(&dynamic_state)
        .layout(pipeline_layout)
        .render_pass(render_pass)
        .subpass(0);

    let result = unsafe {
        device.create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None)
    };
    unsafe {
        device.destroy_shader_module(vert_module, None);
        device.destroy_shader_module(frag_module, None);
    }
    let pipelines = result.map_err(|(_, err)| err)?;
    pipelines
        .into_iter()
        .next()
        .context("driver returned no pipeline")
}

pub fn create_sampler(
    device: &ash::Device,
    mag_filter: vk::Filter,
    min_filter: vk::Filter,
    address_mode: vk::SamplerAddressMode,
) -> anyhow::Result<vk::Sampler> {
    let create_info = vk::SamplerCreateInfo::default()
        .mag_filter(mag_filter)
        .min_filter(min_filter)
        .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
        .address_mode_u(address_mode)
        .address_mode_v(address_mode)
        .address_mode_w(address_mode)
        .max_lod(vk::LOD_CLAMP_NONE);
    Ok(unsafe { device.create_sampler(&create_info, None)? })
}

/// Allocates a set with a combined image sampler at binding 0.
pub fn create_texture_descriptor_set(
    device: &ash::Device,
    set_layouts: &[vk::DescriptorSetLayout],
    descriptor_pool: vk::DescriptorPool,
    sampler: vk::Sampler,
    image_view: vk::ImageView,
    image_layout: vk::ImageLayout,
) -> anyhow::Result<vk::DescriptorSet> {
    let allocate_info = vk::DescriptorSetAllocateInfo::default()
        .descriptor_pool(descriptor_pool)
        .set_layouts(set_layouts);
    let set = unsafe { device.allocate_descriptor_sets(&allocate_info)? }
        .into_iter()
        .next()
        .context("descriptor pool returned no set")?;

    let image_info = [vk::DescriptorImageInfo::default()
        .sampler(sampler)
        .image_view(image_view)
        .image_layout(image_layout)];
    let writes = [vk::WriteDescriptorSet::default()
        .dst_set(set)
        .dst_binding(0)
        .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
        .image_info(&image_info)];
    unsafe { device.update_descriptor_sets(&writes, &[]) };
    Ok(set)
}

pub fn create_semaphore(device: &ash::Device) -> anyhow::Result<vk::Semaphore> {
    Ok(unsafe { device.create_semaphore(&vk::SemaphoreCreateInfo::default(), None)? })
}

pub fn create_fence(device: &ash::Device, flags: vk::FenceCreateFlags) -> anyhow::Result<vk::Fence> {
    Ok(unsafe { device.create_fence(&vk::FenceCreateInfo::default().flags(flags), None)? })
}

pub fn align_buffer_size(size: vk::DeviceSize, alignment: vk::DeviceSize) -> vk::DeviceSize {
    (size + alignment - 1) & !(alignment - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_sizes_round_up_to_alignment() {
        assert_eq!(align_buffer_size(0, 256), 0);
        assert_eq!(align_buffer_size(1, 256), 256);
        assert_eq!(align_buffer_size(256, 256), 256);
        assert_eq!(align_buffer_size(257, 256), 512);
    }
}
