//! Stereo front end: two independent channel engines, one per side.
//!
//! The engines share nothing. A mono host buffer only runs engine 0;
//! channels past the second are left as they are.

use log::debug;

use crate::engine::ChannelEngine;
use crate::params::AmpParams;

pub const MAX_CHANNELS: usize = 2;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AmpDriver {
    engines: [ChannelEngine; MAX_CHANNELS],
}

impl AmpDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize) {
        for engine in &mut self.engines {
            engine.prepare(sample_rate, max_block_size);
        }
        debug!("amp driver prepared: {MAX_CHANNELS} channels");
    }

    pub fn reset(&mut self) {
        for engine in &mut self.engines {
            engine.reset();
        }
    }

    /// Process one block. `channels` holds one slice per channel, all the
    /// same length; the snapshot applies to every channel.
    pub fn process(&mut self, channels: &mut [&mut [f32]], params: &AmpParams) {
        for (engine, samples) in self.engines.iter_mut().zip(channels.iter_mut()) {
            engine.process_block(samples, params);
        }
    }

    pub fn engine(&self, channel: usize) -> Option<&ChannelEngine> {
        self.engines.get(channel)
    }
}
