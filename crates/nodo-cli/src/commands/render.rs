//! Offline rendering command.

use std::path::PathBuf;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use nodo_core::nodes::{OutputNode, SineNode};
use nodo_core::{InputRef, MultiSampleBuffer, NodeManager, OutputRef};
use nodo_io::write_wav;

use super::load_config;

#[derive(Args)]
pub struct RenderArgs {
    /// Output WAV file
    #[arg(value_name = "FILE")]
    output: PathBuf,

    /// Tone frequency in Hz
    #[arg(short, long, default_value_t = 440.0)]
    frequency: f32,

    /// Linear amplitude (0.0 - 1.0)
    #[arg(short, long, default_value_t = 0.5)]
    amplitude: f32,

    /// Length of the render in seconds
    #[arg(short, long, default_value_t = 2.0)]
    duration: f32,

    /// Engine configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let channels = config.output_channels as usize;
    let block = config.internal_buffer_size as usize;

    let mut manager = NodeManager::new(config.sample_rate as f32, block, 0, channels);
    let osc = SineNode::new(args.frequency);
    osc.amplitude().set(args.amplitude.clamp(0.0, 1.0));
    let osc = manager.add_node(Box::new(osc));
    for channel in 0..channels {
        let root = manager.add_root_node(Box::new(OutputNode::new(channel)));
        manager.connect(OutputRef::new(osc, 0), InputRef::new(root, 0));
    }

    let total_frames = (args.duration * config.sample_rate as f32) as usize;
    let chunk_frames = block * 64;
    let bar = ProgressBar::new(total_frames as u64);
    bar.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} frames ({eta})",
    )?);

    let input = MultiSampleBuffer::default();
    let mut chunk = MultiSampleBuffer::new(channels, chunk_frames);
    let mut rendered: Vec<Vec<f32>> = (0..channels)
        .map(|_| Vec::with_capacity(total_frames))
        .collect();

    let mut done = 0;
    while done < total_frames {
        let frames = chunk_frames.min(total_frames - done).next_multiple_of(block);
        manager.process(&input, &mut chunk, frames);
        let take = frames.min(total_frames - done);
        for (channel, sink) in rendered.iter_mut().enumerate() {
            if let Some(samples) = chunk.channel(channel) {
                sink.extend_from_slice(&samples[..take]);
            }
        }
        done += take;
        bar.set_position(done as u64);
    }
    bar.finish();

    let output = MultiSampleBuffer::from_channels(rendered);
    write_wav(&args.output, &output, config.sample_rate)?;
    println!(
        "Wrote {} ({} frames, {} channel(s), {} Hz)",
        args.output.display(),
        total_frames,
        channels,
        config.sample_rate
    );
    Ok(())
}
