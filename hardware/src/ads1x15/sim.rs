//! Simulated converter for bench-free runs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use super::{AdcError, AdcSource, Gain};

/// ADC returning a fixed level with uniform noise of `±noise` counts.
pub struct SimulatedAdc {
    level: i16,
    noise: i16,
    rng: StdRng,
    running: Option<(u8, Gain)>,
}

impl SimulatedAdc {
    pub fn new(level: i16, noise: i16) -> Self {
        Self {
            level,
            noise: noise.abs(),
            rng: StdRng::seed_from_u64(0x00e7_a104),
            running: None,
        }
    }

    /// Channel and gain of the active continuous conversion, if started.
    pub fn running(&self) -> Option<(u8, Gain)> {
        self.running
    }
}

impl AdcSource for SimulatedAdc {
    fn start_continuous(&mut self, channel: u8, gain: Gain) -> Result<(), AdcError> {
        if channel > 3 {
            return Err(AdcError::InvalidChannel(channel));
        }
        info!("Simulated ADC running on channel {} gain {}", channel, gain);
        self.running = Some((channel, gain));
        Ok(())
    }

    fn last_result(&mut self) -> Result<i16, AdcError> {
        let jitter = self.rng.random_range(-self.noise..=self.noise);
        Ok(self.level.saturating_add(jitter))
    }
}
