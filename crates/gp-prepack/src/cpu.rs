use std::sync::OnceLock;

/// Default L1 data cache size assumed when nothing better is known.
pub const DEFAULT_L1_CACHE_SIZE: usize = 32 * 1024;
/// Default L2 cache size assumed when nothing better is known.
pub const DEFAULT_L2_CACHE_SIZE: usize = 256 * 1024;

/// Capabilities of the CPU a transform runs on.
///
/// Passed explicitly into configuration so that strategy and block-size
/// selection can be exercised for any target from any host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuInfo {
    /// L1 data cache size in bytes.
    pub l1_cache_size: usize,
    /// L2 cache size in bytes.
    pub l2_cache_size: usize,
    /// 8-bit dot-product instructions are available.
    pub has_dotprod: bool,
    /// Half-precision vector arithmetic is available.
    pub has_fp16: bool,
}

impl CpuInfo {
    /// A descriptor with default cache sizes and no optional features.
    pub const fn new() -> Self {
        CpuInfo {
            l1_cache_size: DEFAULT_L1_CACHE_SIZE,
            l2_cache_size: DEFAULT_L2_CACHE_SIZE,
            has_dotprod: false,
            has_fp16: false,
        }
    }

    /// Probe the running CPU for optional features.
    pub fn detect() -> Self {
        let info = CpuInfo::new();

        #[cfg(target_arch = "aarch64")]
        {
            return info
                .with_dotprod(std::arch::is_aarch64_feature_detected!("dotprod"))
                .with_fp16(std::arch::is_aarch64_feature_detected!("fp16"));
        }

        #[cfg(not(target_arch = "aarch64"))]
        {
            info
        }
    }

    pub const fn with_cache_sizes(mut self, l1: usize, l2: usize) -> Self {
        self.l1_cache_size = l1;
        self.l2_cache_size = l2;
        self
    }

    pub const fn with_dotprod(mut self, enabled: bool) -> Self {
        self.has_dotprod = enabled;
        self
    }

    pub const fn with_fp16(mut self, enabled: bool) -> Self {
        self.has_fp16 = enabled;
        self
    }
}

impl Default for CpuInfo {
    fn default() -> Self {
        Self::new()
    }
}

static CPU_INFO: OnceLock<CpuInfo> = OnceLock::new();

/// Get the detected CPU descriptor (cached).
pub fn cpu_info() -> CpuInfo {
    *CPU_INFO.get_or_init(CpuInfo::detect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let ci = CpuInfo::default();
        assert_eq!(ci.l1_cache_size, 32 * 1024);
        assert_eq!(ci.l2_cache_size, 256 * 1024);
        assert!(!ci.has_dotprod);
        assert!(!ci.has_fp16);
    }

    #[test]
    fn test_builders() {
        let ci = CpuInfo::new()
            .with_cache_sizes(64 * 1024, 1024 * 1024)
            .with_dotprod(true)
            .with_fp16(true);
        assert_eq!(ci.l1_cache_size, 64 * 1024);
        assert_eq!(ci.l2_cache_size, 1024 * 1024);
        assert!(ci.has_dotprod);
        assert!(ci.has_fp16);
    }

    #[test]
    fn test_detect_is_cached() {
        let first = cpu_info();
        let second = cpu_info();
        assert_eq!(first, second);
        assert_eq!(first.l1_cache_size, DEFAULT_L1_CACHE_SIZE);

        #[cfg(not(target_arch = "aarch64"))]
        assert!(!first.has_dotprod);
    }
}
