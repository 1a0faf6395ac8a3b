//! Processor configuration (component C13).

/// Buffer capacities for an [`crate::rtf::RtfProcessor`].
///
/// Defaults match the original implementation's compile-time buffer-size constants; unlike a
/// compile-time `#define`, these are runtime fields so a caller whose replacement keys are
/// unusually long can size buffers to fit without recompiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorOptions {
    /// Capacity of the raw-RTF buffer, in bytes.
    pub raw_capacity: usize,
    /// Capacity of the rendered-text buffer, in bytes.
    pub txt_capacity: usize,
    /// Capacity of the control-word buffer, in bytes.
    pub cmd_capacity: usize,
    /// Maximum number of distinct fonts the font table tracks.
    pub fonttbl_capacity: usize,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            raw_capacity: 65536,
            txt_capacity: 2048,
            cmd_capacity: 2048,
            fonttbl_capacity: 512,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_constants() {
        let opts = ProcessorOptions::default();
        assert_eq!(opts.raw_capacity, 65536);
        assert_eq!(opts.txt_capacity, 2048);
        assert_eq!(opts.cmd_capacity, 2048);
        assert_eq!(opts.fonttbl_capacity, 512);
    }
}
