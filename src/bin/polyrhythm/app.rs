//! Audio device setup and the wiring between session, scheduler and engine.

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info};

use polyrhythm::{
    synth::ring_backend, Config, RotationalScheduler, Session, VoiceEngine, MAX_BLOCK_SIZE,
};

use super::ui::UiApp;

/// Commands that may queue up between two audio callbacks.
const COMMAND_CAPACITY: usize = 256;

pub struct App {
    config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Open the default output device, start the stream and hand the
    /// terminal to the UI until the user quits.
    pub fn run(self) -> EyreResult<()> {
        self.config.validate().wrap_err("invalid configuration")?;

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let stream_config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = stream_config.sample_rate().0 as f32;
        let channels = stream_config.channels() as usize;
        info!(sample_rate, channels, "audio device opened");

        let mut engine_config = self.config.engine.clone();
        engine_config.sample_rate = sample_rate;

        let (backend, mut renderer) = ring_backend(
            sample_rate,
            engine_config.max_voices,
            engine_config.master_volume,
            COMMAND_CAPACITY,
        );

        let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];
        let stream = device.build_output_stream(
            &stream_config.into(),
            move |data: &mut [f32], _| {
                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let block = &mut render_buf[..frames_to_render];
                    renderer.render(block);

                    // mono to all channels
                    let out_off = frames_written * channels;
                    for (i, &s) in block.iter().enumerate() {
                        for ch in 0..channels {
                            data[out_off + i * channels + ch] = s;
                        }
                    }
                    frames_written += frames_to_render;
                }
            },
            |err| error!(%err, "audio stream error"),
            None,
        )?;
        stream.play()?;

        let session = Session::from_defaults(&self.config.session, self.config.scheduler.default_rpm)
            .wrap_err("failed to build starting session")?;
        let scheduler = RotationalScheduler::new(self.config.scheduler.clone());
        let engine = VoiceEngine::new(backend, engine_config);

        let mut terminal = ratatui::init();
        let result = UiApp::new(session, scheduler, engine).run(&mut terminal);
        ratatui::restore();

        drop(stream);
        info!("shut down");
        result
    }
}
