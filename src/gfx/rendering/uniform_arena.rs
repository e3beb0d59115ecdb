//! Per-frame storage for constant buffer snapshots
//!
//! Constant buffers can change between two draws of the same frame (every
//! transform buffer does). Each draw therefore copies the bytes it sees into
//! this arena and binds its own range of one shared uniform buffer.

/// A byte range inside the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSlice {
    pub offset: u64,
    pub size: u64,
}

#[derive(Debug)]
pub struct UniformArena {
    alignment: u64,
    staging: Vec<u8>,
    buffer: Option<wgpu::Buffer>,
}

impl UniformArena {
    pub fn new(alignment: u32) -> Self {
        Self {
            alignment: u64::from(alignment.max(1)),
            staging: Vec::new(),
            buffer: None,
        }
    }

    pub fn clear(&mut self) {
        self.staging.clear();
    }

    pub fn len(&self) -> u64 {
        self.staging.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.staging.is_empty()
    }

    /// Appends `data` at the next aligned offset
    pub fn push(&mut self, data: &[u8]) -> UniformSlice {
        let offset = self.len().next_multiple_of(self.alignment);
        self.staging.resize(offset as usize, 0);
        self.staging.extend_from_slice(data);
        UniformSlice {
            offset,
            size: data.len() as u64,
        }
    }

    /// Uploads everything pushed this frame, growing the GPU buffer if needed
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> Option<&wgpu::Buffer> {
        if self.staging.is_empty() {
            return None;
        }
        let needed = self.len().next_multiple_of(self.alignment);
        let too_small = self.buffer.as_ref().is_none_or(|b| b.size() < needed);
        if too_small {
            let size = needed.next_power_of_two();
            log::debug!("Growing uniform arena to {size} bytes");
            self.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Uniform Arena"),
                size,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
        }
        let buffer = self.buffer.as_ref()?;
        queue.write_buffer(buffer, 0, &self.staging);
        Some(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slices_start_on_alignment() {
        let mut arena = UniformArena::new(256);
        let a = arena.push(&[1u8; 128]);
        let b = arena.push(&[2u8; 16]);
        let c = arena.push(&[3u8; 300]);
        assert_eq!(a, UniformSlice { offset: 0, size: 128 });
        assert_eq!(b.offset, 256);
        assert_eq!(c.offset, 512);
        assert_eq!(arena.len(), 812);
    }

    #[test]
    fn test_clear_reuses_from_zero() {
        let mut arena = UniformArena::new(64);
        arena.push(&[0u8; 32]);
        arena.clear();
        assert!(arena.is_empty());
        assert_eq!(arena.push(&[0u8; 8]).offset, 0);
    }
}
