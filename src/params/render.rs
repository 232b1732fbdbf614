//! Window and GPU configuration.

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Requested window width (pixels); the window manager may pick another
    pub window_width: u32,

    /// Requested window height (pixels)
    pub window_height: u32,

    /// Requested MSAA sample count (falls back to 1 if the adapter refuses)
    pub msaa_samples: u32,

    /// Wait for vertical blank on present. Off: the audio read paces the loop.
    pub vsync: bool,

    /// Background colour (linear RGBA)
    pub clear_color: [f64; 4],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1024,
            window_height: 768,
            msaa_samples: 4,
            vsync: false,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl RenderConfig {
    pub fn title(&self) -> String {
        format!(
            "SpectrumAnalyser - requested {}x{}",
            self.window_width, self.window_height
        )
    }

    pub fn present_mode(&self) -> wgpu::PresentMode {
        if self.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        }
    }

    pub fn clear_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_color;
        wgpu::Color { r, g, b, a }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_names_requested_size() {
        let config = RenderConfig::default();
        assert_eq!(config.title(), "SpectrumAnalyser - requested 1024x768");
    }

    #[test]
    fn test_vsync_off_by_default() {
        let config = RenderConfig::default();
        assert_eq!(config.present_mode(), wgpu::PresentMode::AutoNoVsync);
    }
}
