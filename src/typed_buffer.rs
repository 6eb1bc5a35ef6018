/*!
Typed `wgpu` buffers.

A [`Buffer<A>`] remembers the element type it was created for, so element
counts rather than byte offsets appear at call sites, and a buffer of seeds
can't be read back as a buffer of step counts.

Readback is blocking: [`Buffer::read_into`] maps the buffer, waits on the
device, copies the elements out and unmaps.
*/

use std::{marker::PhantomData, mem::size_of};

use crate::error::Error;

pub struct Buffer<A> {
    buffer: wgpu::Buffer,
    len: u64,
    phantom_data: PhantomData<A>,
}

impl<A: bytemuck::Pod + bytemuck::Zeroable> Buffer<A> {
    pub fn write(&self, queue: &wgpu::Queue, contents: &[A]) {
        debug_assert!(contents.len() as u64 <= self.len);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(contents));
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Capacity in elements.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }

    /// Copy the first `out.len()` elements of a `MAP_READ` buffer into `out`.
    ///
    /// Work already submitted that writes this buffer completes first.
    pub fn read_into(&self, device: &wgpu::Device, out: &mut [A]) -> Result<(), Error> {
        if out.is_empty() {
            return Ok(());
        }
        debug_assert!(out.len() as u64 <= self.len);

        let slice = self.buffer.slice(..(out.len() * size_of::<A>()) as u64);

        let (sender, receiver) = futures_channel::oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        device.poll(wgpu::Maintain::Wait);

        pollster::block_on(receiver)
            .map_err(|_| Error::Backend("buffer map callback dropped".into()))??;

        {
            let view = slice.get_mapped_range();
            out.copy_from_slice(bytemuck::cast_slice(&view));
        }
        self.buffer.unmap();

        Ok(())
    }
}

pub struct Builder<'a, A> {
    label: Option<&'a str>,
    len: u64,
    usage: wgpu::BufferUsages,
    phantom_data: PhantomData<A>,
}

impl<'a, A: bytemuck::Pod + bytemuck::Zeroable> Builder<'a, A> {
    /// An uninitialised buffer of `len` elements.
    pub fn new(len: u64) -> Self {
        Self {
            label: None,
            len,
            usage: wgpu::BufferUsages::empty(),
            phantom_data: PhantomData,
        }
    }

    pub fn with_label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    pub fn with_usage(mut self, usage: wgpu::BufferUsages) -> Self {
        self.usage |= usage;
        self
    }

    pub fn create(self, device: &wgpu::Device) -> Buffer<A> {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: self.label,
            size: self.len * size_of::<A>() as u64,
            usage: self.usage,
            mapped_at_creation: false,
        });

        Buffer {
            buffer,
            len: self.len,
            phantom_data: PhantomData,
        }
    }
}

pub fn copy_buffer_to_buffer<A: bytemuck::Pod + bytemuck::Zeroable>(
    command_encoder: &mut wgpu::CommandEncoder,
    source: &Buffer<A>,
    destination: &Buffer<A>,
    copy_len: u64,
) {
    command_encoder.copy_buffer_to_buffer(
        source.buffer(),
        0,
        destination.buffer(),
        0,
        copy_len * size_of::<A>() as u64,
    )
}
