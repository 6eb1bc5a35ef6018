/// Workgroup size for `trace.wgsl#trace`.
pub const TRACE_WORKGROUP_SIZE_X: u32 = 64;

/// Largest dispatch along one dimension
/// ([maxComputeWorkgroupsPerDimension](https://www.w3.org/TR/webgpu/#dom-supported-limits-maxcomputeworkgroupsperdimension)).
pub const MAX_WORKGROUPS_PER_DIMENSION: u32 = 65535;

/**
Dispatch size for `trace.wgsl#trace`.

One invocation traces one seed, and the seed index is `global_invocation_id.x`.
A batch is a single scan row of seeds, which is far below
`MAX_WORKGROUPS_PER_DIMENSION * TRACE_WORKGROUP_SIZE_X`, so a one-dimensional
dispatch is enough. The last workgroup is padded out; the kernel skips any
invocation whose index is at or past the seed count.

Returns `None` for a batch too wide to dispatch in one dimension.
*/
pub fn trace_dispatch_size(seed_count: usize) -> Option<(u32, u32, u32)> {
    let workgroups = seed_count.div_ceil(TRACE_WORKGROUP_SIZE_X as usize);
    let x = u32::try_from(workgroups)
        .ok()
        .filter(|x| *x <= MAX_WORKGROUPS_PER_DIMENSION)?;
    Some((x, 1, 1))
}
