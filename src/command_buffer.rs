/// Record a command buffer with `function`, labelled `label`.
pub fn create(
    device: &wgpu::Device,
    label: &str,
    function: impl FnOnce(&mut wgpu::CommandEncoder),
) -> wgpu::CommandBuffer {
    let mut command_encoder =
        device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
    command_encoder.push_debug_group(label);
    function(&mut command_encoder);
    command_encoder.pop_debug_group();
    command_encoder.finish()
}
