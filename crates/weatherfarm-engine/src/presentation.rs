//! Console presentation.
//!
//! The binary has no renderer, so presentation updates are written to the
//! log. The last shown state is kept for status snapshots.

use tracing::{debug, info};
use weatherfarm_gameplay::{LightColor, ParticleChannel, PresentationSink, WeatherIcon};

/// Presentation sink that logs every update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogPresentation {
    icon: Option<WeatherIcon>,
    light_intensity: f32,
    particles: Option<ParticleChannel>,
    label: String,
}

impl LogPresentation {
    /// Creates a sink with nothing shown yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Icon on screen.
    #[must_use]
    pub fn icon(&self) -> Option<WeatherIcon> {
        self.icon
    }

    /// Current sun light intensity.
    #[must_use]
    pub fn light_intensity(&self) -> f32 {
        self.light_intensity
    }

    /// Running particle channel.
    #[must_use]
    pub fn particles(&self) -> Option<ParticleChannel> {
        self.particles
    }

    /// Day label text.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl PresentationSink for LogPresentation {
    fn set_icon(&mut self, icon: WeatherIcon) {
        if self.icon != Some(icon) {
            debug!("Icon: {icon:?}");
        }
        self.icon = Some(icon);
    }

    fn set_light(&mut self, intensity: f32, color: LightColor) {
        debug!(
            "Light: {intensity:.2} @ ({:.2}, {:.2}, {:.2})",
            color.r, color.g, color.b
        );
        self.light_intensity = intensity;
    }

    fn start_particles(&mut self, channel: ParticleChannel) {
        debug!("Particles on: {}", channel.display_name());
        self.particles = Some(channel);
    }

    fn stop_particles(&mut self, channel: ParticleChannel) {
        debug!("Particles off: {}", channel.display_name());
        if self.particles == Some(channel) {
            self.particles = None;
        }
    }

    fn set_day_label(&mut self, text: &str) {
        info!("[{text}]");
        self.label = text.to_string();
    }
}
