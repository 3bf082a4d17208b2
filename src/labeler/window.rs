use anyhow::{bail, Result};
use serde::Serialize;

pub const DEFAULT_WINDOW_SIZE: usize = 512;
pub const DEFAULT_STRIDE: usize = 256;

/// Window geometry in core tokens (boundary markers excluded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowConfig {
    pub window_size: usize,
    pub stride: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { window_size: DEFAULT_WINDOW_SIZE, stride: DEFAULT_STRIDE }
    }
}

impl WindowConfig {
    pub fn new(window_size: usize, stride: usize) -> Result<Self> {
        let cfg = Self { window_size, stride };
        cfg.validate()?;
        Ok(cfg)
    }

    /// `0 < stride <= window_size`; a larger stride leaves indices no window covers.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            bail!("window_size must be positive");
        }
        if self.stride == 0 {
            bail!("stride must be positive");
        }
        if self.stride > self.window_size {
            bail!(
                "stride={} exceeds window_size={}; windows would leave coverage gaps",
                self.stride, self.window_size
            );
        }
        Ok(())
    }

    pub fn overlap(&self) -> usize {
        self.window_size.saturating_sub(self.stride)
    }
}

/// `[start, end)` over the core ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: usize,
    pub end: usize,
}

impl Window {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Length once the boundary markers are added.
    pub fn framed_len(&self) -> usize {
        self.len() + 2
    }
}

/// Window starts at `0, stride, 2*stride, ...` while `start < len`; ends clip to `len`.
pub fn plan_windows(len: usize, cfg: &WindowConfig) -> Vec<Window> {
    let stride = cfg.stride.max(1);
    (0..len)
        .step_by(stride)
        .map(|start| Window { start, end: (start + cfg.window_size).min(len) })
        .collect()
}

/// Number of windows covering each core index.
pub fn coverage(len: usize, windows: &[Window]) -> Vec<u32> {
    let mut counts = vec![0u32; len];
    for w in windows {
        for c in &mut counts[w.start..w.end] {
            *c += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_zero_and_gapped_strides() {
        assert!(WindowConfig::new(512, 256).is_ok());
        assert!(WindowConfig::new(512, 512).is_ok());
        assert!(WindowConfig::new(0, 1).is_err());
        assert!(WindowConfig::new(512, 0).is_err());
        assert!(WindowConfig::new(512, 513).is_err());
        assert_eq!(WindowConfig::default().overlap(), 256);
    }

    #[test]
    fn six_hundred_tokens_start_at_0_256_512() {
        let windows = plan_windows(600, &WindowConfig::default());
        assert_eq!(
            windows,
            vec![
                Window { start: 0, end: 512 },
                Window { start: 256, end: 600 },
                Window { start: 512, end: 600 },
            ]
        );
        assert_eq!(windows[0].framed_len(), 514);
        assert_eq!(windows[2].framed_len(), 90);

        let counts = coverage(600, &windows);
        assert!(counts[..256].iter().all(|c| *c == 1));
        assert!(counts[256..512].iter().all(|c| *c == 2));
        // the clipped window at 256 reaches the end too
        assert!(counts[512..].iter().all(|c| *c == 2));
    }

    #[test]
    fn every_index_is_covered_for_valid_configs() {
        for window_size in [1usize, 2, 3, 7, 16] {
            for stride in 1..=window_size {
                let cfg = WindowConfig::new(window_size, stride).unwrap();
                for len in 0..50 {
                    let windows = plan_windows(len, &cfg);
                    let counts = coverage(len, &windows);
                    assert!(
                        counts.iter().all(|c| *c >= 1),
                        "gap: len={len} window_size={window_size} stride={stride}"
                    );
                    if len > 0 {
                        assert_eq!(windows.last().map(|w| w.end), Some(len));
                        assert!(windows.iter().all(|w| w.len() <= window_size && w.len() > 0));
                    } else {
                        assert!(windows.is_empty());
                    }
                }
            }
        }
    }

    #[test]
    fn no_overlap_when_stride_equals_window() {
        let cfg = WindowConfig::new(4, 4).unwrap();
        let windows = plan_windows(10, &cfg);
        assert_eq!(windows.len(), 3);
        assert!(coverage(10, &windows).iter().all(|c| *c == 1));
    }
}
