//! CUDA source for the two decimation kernel variants.
//!
//! Both kernels share the launch geometry described in `launch.rs`; they
//! differ only in how many input samples and taps each thread consumes
//! before the block-wide reduction. Samples and taps are passed as
//! interleaved `(re, im)` `float` pairs, since the CUDA driver API has no
//! native complex type.

pub const SMALL_VARIANT_ENTRY_POINT: &str = "decimate_small";
pub const LARGE_VARIANT_ENTRY_POINT: &str = "decimate_large";

/// Small variant: one thread per (tap, frequency) pair, `num_taps *
/// num_freqs <= maxThreadsPerBlock`.
pub const SMALL_VARIANT_SRC: &str = r#"
extern "C" __global__ void decimate_small(
    const float* __restrict__ in,
    const float* __restrict__ taps,
    float* __restrict__ out,
    int samples_per_antenna,
    int num_taps,
    int num_freqs,
    int dm_rate)
{
    extern __shared__ float shmem[]; // num_freqs * num_taps complex lanes

    int tx = threadIdx.x; // tap index
    int ty = threadIdx.y; // frequency index

    int antenna_offset = blockIdx.y * samples_per_antenna;
    int dec_offset = blockIdx.x * dm_rate;
    int sample_idx = dec_offset + tx;

    float in_re = 0.0f;
    float in_im = 0.0f;
    if (sample_idx < samples_per_antenna) {
        in_re = in[2 * (antenna_offset + sample_idx)];
        in_im = in[2 * (antenna_offset + sample_idx) + 1];
    }

    int tap_idx = ty * num_taps + tx;
    float tap_re = taps[2 * tap_idx];
    float tap_im = taps[2 * tap_idx + 1];

    float prod_re = in_re * tap_re - in_im * tap_im;
    float prod_im = in_re * tap_im + in_im * tap_re;

    int shmem_idx = ty * num_taps + tx;
    shmem[2 * shmem_idx] = prod_re;
    shmem[2 * shmem_idx + 1] = prod_im;

    __syncthreads();

    // Tree reduction over this frequency row's num_taps entries, down to
    // 32, then warp-synchronous shuffle for the final steps.
    int n = num_taps;
    int row_base = ty * num_taps;
    while (n > 32) {
        n >>= 1;
        if (tx < n) {
            int a = row_base + tx;
            int b = row_base + tx + n;
            shmem[2 * a] += shmem[2 * b];
            shmem[2 * a + 1] += shmem[2 * b + 1];
        }
        __syncthreads();
    }

    if (tx < 32 && tx < n) {
        float re = shmem[2 * (row_base + tx)];
        float im = shmem[2 * (row_base + tx) + 1];
        for (int offset = 16; offset > 0; offset >>= 1) {
            re += __shfl_down_sync(0xffffffff, re, offset);
            im += __shfl_down_sync(0xffffffff, im, offset);
        }
        if (tx == 0) {
            int out_idx = (ty * gridDim.y + blockIdx.y) * gridDim.x + blockIdx.x;
            out[2 * out_idx] = re;
            out[2 * out_idx + 1] = im;
        }
    }
}
"#;

/// Large variant: each thread pre-sums two adjacent (sample, tap) products
/// before the same reduction as the small variant runs over `num_taps / 2`
/// entries.
pub const LARGE_VARIANT_SRC: &str = r#"
extern "C" __global__ void decimate_large(
    const float* __restrict__ in,
    const float* __restrict__ taps,
    float* __restrict__ out,
    int samples_per_antenna,
    int num_taps,
    int num_freqs,
    int dm_rate)
{
    extern __shared__ float shmem[];

    int tx = threadIdx.x; // half-tap index, covers taps [2*tx, 2*tx+1]
    int ty = threadIdx.y;
    int half_taps = num_taps / 2;

    int antenna_offset = blockIdx.y * samples_per_antenna;
    int dec_offset = blockIdx.x * dm_rate;

    float acc_re = 0.0f;
    float acc_im = 0.0f;

    for (int lane = 0; lane < 2; lane++) {
        int tap_pos = 2 * tx + lane;
        int sample_idx = dec_offset + tap_pos;

        float in_re = 0.0f;
        float in_im = 0.0f;
        if (sample_idx < samples_per_antenna) {
            in_re = in[2 * (antenna_offset + sample_idx)];
            in_im = in[2 * (antenna_offset + sample_idx) + 1];
        }

        int tap_idx = ty * num_taps + tap_pos;
        float tap_re = taps[2 * tap_idx];
        float tap_im = taps[2 * tap_idx + 1];

        acc_re += in_re * tap_re - in_im * tap_im;
        acc_im += in_re * tap_im + in_im * tap_re;
    }

    int shmem_idx = ty * half_taps + tx;
    shmem[2 * shmem_idx] = acc_re;
    shmem[2 * shmem_idx + 1] = acc_im;

    __syncthreads();

    int n = half_taps;
    int row_base = ty * half_taps;
    while (n > 32) {
        n >>= 1;
        if (tx < n) {
            int a = row_base + tx;
            int b = row_base + tx + n;
            shmem[2 * a] += shmem[2 * b];
            shmem[2 * a + 1] += shmem[2 * b + 1];
        }
        __syncthreads();
    }

    if (tx < 32 && tx < n) {
        float re = shmem[2 * (row_base + tx)];
        float im = shmem[2 * (row_base + tx) + 1];
        for (int offset = 16; offset > 0; offset >>= 1) {
            re += __shfl_down_sync(0xffffffff, re, offset);
            im += __shfl_down_sync(0xffffffff, im, offset);
        }
        if (tx == 0) {
            int out_idx = (ty * gridDim.y + blockIdx.y) * gridDim.x + blockIdx.x;
            out[2 * out_idx] = re;
            out[2 * out_idx + 1] = im;
        }
    }
}
"#;
