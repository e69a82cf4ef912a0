// GainForge — dual-channel high-gain amp plugin (CLAP + VST3).

use gainforge_dsp::AmpDriver;
use nih_plug::prelude::*;
use std::num::NonZeroU32;
use std::sync::Arc;

mod params;
use params::GainForgeParams;

struct GainForge {
    params: Arc<GainForgeParams>,
    driver: AmpDriver,
}

impl Default for GainForge {
    fn default() -> Self {
        Self {
            params: Arc::new(GainForgeParams::default()),
            driver: AmpDriver::new(),
        }
    }
}

impl Plugin for GainForge {
    const NAME: &'static str = "GainForge";
    const VENDOR: &'static str = "GainForge";
    const URL: &'static str = "";
    const EMAIL: &'static str = "";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let channels = audio_io_layout
            .main_output_channels
            .map(NonZeroU32::get)
            .unwrap_or(0);
        nih_log!(
            "initialize: {} Hz, max buffer {}, {} channel(s)",
            buffer_config.sample_rate,
            buffer_config.max_buffer_size,
            channels
        );

        // All engine allocation happens here, off the audio thread.
        self.driver.prepare(
            buffer_config.sample_rate as f64,
            buffer_config.max_buffer_size as usize,
        );

        true
    }

    // Called from the audio thread: no logging here.
    fn reset(&mut self) {
        self.driver.reset();
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        // One snapshot per block; the engine smooths from there.
        let snapshot = self.params.snapshot();
        self.driver.process(buffer.as_slice(), &snapshot);

        ProcessStatus::Normal
    }
}

impl ClapPlugin for GainForge {
    const CLAP_ID: &'static str = "com.gainforge.amp";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("High-gain tube amp: four-stage preamp, sagging rectifier, four-band tone stack");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Distortion,
        ClapFeature::Stereo,
        ClapFeature::Mono,
    ];
}

impl Vst3Plugin for GainForge {
    const VST3_CLASS_ID: [u8; 16] = *b"GainForgeAmpVST3";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Distortion];
}

nih_export_clap!(GainForge);
nih_export_vst3!(GainForge);

#[cfg(test)]
mod tests {
    use super::*;
    use gainforge_dsp::{AmpParams, EngineState, RectifierMode};

    #[test]
    fn test_reset_only_clears_driver_state() {
        let mut plugin = GainForge::default();
        plugin.driver.prepare(48000.0, 256);

        let tube = AmpParams { rectifier: RectifierMode::Tube, ..Default::default() };
        let mut left = vec![0.5f32; 256];
        let mut right = vec![0.5f32; 256];
        plugin.driver.process(&mut [&mut left[..], &mut right[..]], &tube);
        assert!(plugin.driver.engine(0).unwrap().sag_state() > 0.0);

        let before = plugin.driver.clone();
        Plugin::reset(&mut plugin);

        let mut expected = before;
        expected.reset();
        assert_eq!(plugin.driver, expected);
        for ch in 0..2 {
            let engine = plugin.driver.engine(ch).unwrap();
            assert_eq!(engine.state(), EngineState::Prepared);
            assert_eq!(engine.sag_state(), 0.0);
        }
    }
}
