//! Live sine test tone command.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Args;
use nodo_core::nodes::{OutputNode, SineNode};
use nodo_core::{InputRef, NodeManager, OutputRef};
use nodo_io::AudioStream;

use super::load_config;

#[derive(Args)]
pub struct SineArgs {
    /// Tone frequency in Hz
    #[arg(short, long, default_value_t = 440.0)]
    frequency: f32,

    /// Linear amplitude (0.0 - 1.0)
    #[arg(short, long, default_value_t = 0.2)]
    amplitude: f32,

    /// Stop after this many seconds (runs until Ctrl+C if unset)
    #[arg(short, long)]
    duration: Option<f32>,

    /// Sweep the tone to this frequency over the playback duration
    #[arg(long)]
    sweep_to: Option<f32>,

    /// Engine configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

pub fn run(args: SineArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;

    let mut manager = NodeManager::new(
        config.sample_rate as f32,
        config.internal_buffer_size as usize,
        config.input_channels as usize,
        config.output_channels as usize,
    );

    let osc = SineNode::new(args.frequency);
    let frequency = osc.frequency();
    let amplitude = osc.amplitude();
    amplitude.set(args.amplitude.clamp(0.0, 1.0));
    let osc = manager.add_node(Box::new(osc));

    for channel in 0..config.output_channels as usize {
        let root = manager.add_root_node(Box::new(OutputNode::new(channel)));
        manager.connect(OutputRef::new(osc, 0), InputRef::new(root, 0));
    }

    let stream = AudioStream::open(manager, &config)?;
    println!(
        "Playing {} Hz sine on {} channel(s)... Press Ctrl+C to stop.",
        args.frequency, config.output_channels
    );

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        handler_flag.store(false, Ordering::SeqCst);
    })?;

    let step = Duration::from_millis(50);
    let mut elapsed = 0.0f32;
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(step);
        elapsed += step.as_secs_f32();

        if let (Some(target), Some(total)) = (args.sweep_to, args.duration) {
            let t = (elapsed / total).min(1.0);
            frequency.set(args.frequency + (target - args.frequency) * t);
        }
        if let Some(total) = args.duration
            && elapsed >= total
        {
            break;
        }
    }

    stream.stop();
    println!("Stopped.");
    Ok(())
}
