use crate::block_sizes::BlockSizes;
use crate::strategy::Strategy;

/// Round `value` up to the next multiple of `multiple`.
pub fn round_up(value: usize, multiple: usize) -> usize {
    value.div_ceil(multiple) * multiple
}

/// Number of destination elements one batch of an `n` x `k` operand
/// occupies once rearranged with `bs` and `strategy`.
///
/// Every block is stored padded to the strategy's `out_width` and
/// `k_unroll`, so this is the sum of the padded footprints over the block
/// grid, computed in closed form: the full rows of blocks (K-direction),
/// each `k_block` high and as wide as all full blocks plus the padded
/// leftover, then the padded leftover row.
///
/// `bs` is assumed valid for `strategy` (see [`BlockSizes::validate`]).
///
/// # Panics
/// Panics if either block size is zero.
pub fn required_destination_element_count(
    n: usize,
    k: usize,
    bs: &BlockSizes,
    strategy: &Strategy,
) -> usize {
    let num_full_k = k / bs.k_block;
    let num_full_x = n / bs.x_block;

    let left_over_x = round_up(n % bs.x_block, strategy.out_width());
    let left_over_k = round_up(k % bs.k_block, strategy.k_unroll());

    let padded_width = num_full_x * bs.x_block + left_over_x;
    num_full_k * bs.k_block * padded_width + left_over_k * padded_width
}
