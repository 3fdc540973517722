use super::vulkan_context::VulkanContext;
use ash::vk;
use bytemuck::{Pod, Zeroable};
use nalgebra_glm::{Vec2, Vec3, Vec4};
use std::ffi::c_void;

/// One vertex as the scene shaders read it from a storage buffer (std430).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec4,
    pub normal: Vec4,
    pub tex_coords: Vec2,
    pub _padding: Vec2,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, tex_coords: Vec2) -> Self {
        Self {
            position: Vec4::new(position.x, position.y, position.z, 1.0),
            normal: Vec4::new(normal.x, normal.y, normal.z, 0.0),
            tex_coords,
            _padding: Vec2::zeros(),
        }
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self::new(Vec3::zeros(), Vec3::zeros(), Vec2::zeros())
    }
}

pub struct Buffer {
    pub buffer: vk::Buffer,
    pub memory: vk::DeviceMemory,
    pub size: u64,
}

impl Buffer {
    pub fn new(
        vulkan_context: &VulkanContext,
        size: vk::DeviceSize,
        required_memory_flags: vk::MemoryPropertyFlags,
        usage: vk::BufferUsageFlags,
    ) -> anyhow::Result<Self> {
        let create_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        unsafe {
            let buffer = vulkan_context.device().create_buffer(&create_info, None)?;
            let mem_req = vulkan_context
                .device()
                .get_buffer_memory_requirements(buffer);
            let mem_index = vulkan_context
                .physical_device
                .get_required_memory_index(mem_req, required_memory_flags)?;
            log::trace!("Picking memory index {} for buffer.", mem_index);

            let allocate_info = vk::MemoryAllocateInfo::default()
                .allocation_size(mem_req.size)
                .memory_type_index(mem_index);
            let memory = vulkan_context
                .device()
                .allocate_memory(&allocate_info, None)?;

            vulkan_context
                .device()
                .bind_buffer_memory(buffer, memory, 0)?;

            Ok(Self {
                buffer,
                memory,
                size,
            })
        }
    }

    /// Host visible and coherent buffer holding `data`.
    pub fn from_data<T: Pod>(
        vulkan_context: &VulkanContext,
        usage: vk::BufferUsageFlags,
        data: &[T],
    ) -> anyhow::Result<Self> {
        let size = std::mem::size_of_val(data).max(1) as vk::DeviceSize;
        let buffer = Self::new(
            vulkan_context,
            size,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            usage,
        )?;
        buffer.write(vulkan_context, data)?;
        Ok(buffer)
    }

    /// Copies `data` to the start of a host coherent buffer.
    pub fn write<T: Pod>(&self, vulkan_context: &VulkanContext, data: &[T]) -> anyhow::Result<()> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        anyhow::ensure!(
            bytes.len() as u64 <= self.size,
            "writing {} bytes into a {} byte buffer",
            bytes.len(),
            self.size
        );
        let mapped = self.map_memory(vulkan_context)?;
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), mapped.cast::<u8>(), bytes.len());
        }
        self.unmap_memory(vulkan_context.device());
        Ok(())
    }

    pub fn map_memory(&self, vulkan_context: &VulkanContext) -> anyhow::Result<*mut c_void> {
        unsafe {
            Ok(vulkan_context.device().map_memory(
                self.memory,
                0,
                self.size,
                vk::MemoryMapFlags::empty(),
            )?)
        }
    }

    pub fn unmap_memory(&self, device: &ash::Device) {
        unsafe {
            device.unmap_memory(self.memory);
        }
    }

    pub fn destroy(&self, device: &ash::Device) {
        unsafe {
            device.destroy_buffer(self.buffer, None);
            device.free_memory(self.memory, None);
        }
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("buffer", &self.buffer)
            .field("memory", &self.memory)
            .field("size", &self.size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_matches_std430_layout() {
        assert_eq!(std::mem::size_of::<Vertex>(), 48);
        assert_eq!(std::mem::offset_of!(Vertex, normal), 16);
        assert_eq!(std::mem::offset_of!(Vertex, tex_coords), 32);
    }

    #[test]
    fn position_is_a_point_and_normal_a_direction() {
        let vertex = Vertex::new(Vec3::new(1.0, 2.0, 3.0), Vec3::z(), Vec2::new(0.5, 1.0));
        assert_eq!(vertex.position.w, 1.0);
        assert_eq!(vertex.normal.w, 0.0);
    }
}
