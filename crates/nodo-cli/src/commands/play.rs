//! WAV file playback command.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Args;
use nodo_core::nodes::{BufferPlayerNode, GainNode, OutputNode};
use nodo_core::{InputRef, NodeManager, OutputRef};
use nodo_io::{AudioStream, read_wav};

use super::load_config;

#[derive(Args)]
pub struct PlayArgs {
    /// WAV file to play
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Playback gain (linear)
    #[arg(short, long, default_value_t = 1.0)]
    gain: f32,

    /// Loop playback
    #[arg(short, long, alias = "repeat")]
    r#loop: bool,

    /// Engine configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;

    println!("Loading {}...", args.file.display());
    let (buffer, file_rate) = read_wav(&args.file)?;
    let frames = buffer.frame_count();
    let file_channels = buffer.channel_count();
    println!(
        "  {} frames, {} channel(s), {} Hz, {:.1}s",
        frames,
        file_channels,
        file_rate,
        frames as f32 / file_rate as f32
    );
    if file_rate != config.sample_rate {
        tracing::warn!(
            "file rate {} Hz differs from engine rate {} Hz; playing without resampling",
            file_rate,
            config.sample_rate
        );
    }

    let mut manager = NodeManager::new(
        config.sample_rate as f32,
        config.internal_buffer_size as usize,
        0,
        config.output_channels as usize,
    );

    // One player per output channel; mono files fan out to every channel.
    let buffer = Arc::new(buffer);
    let gain_params: Vec<_> = (0..config.output_channels as usize)
        .map(|channel| {
            let player = manager.add_node(Box::new(BufferPlayerNode::new(
                Arc::clone(&buffer),
                channel % file_channels.max(1),
                args.r#loop,
            )));
            let gain = GainNode::new(args.gain);
            let param = gain.gain();
            let gain = manager.add_node(Box::new(gain));
            let root = manager.add_root_node(Box::new(OutputNode::new(channel)));
            manager.connect(OutputRef::new(player, 0), InputRef::new(gain, 0));
            manager.connect(OutputRef::new(gain, 0), InputRef::new(root, 0));
            param
        })
        .collect();

    let stream = AudioStream::open(manager, &config)?;
    let looping = args.r#loop;
    println!(
        "Playing{}... Press Ctrl+C to stop.",
        if looping { " (looping)" } else { "" }
    );

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        handler_flag.store(false, Ordering::SeqCst);
    })?;

    let total = frames as f32 / config.sample_rate as f32;
    let step = Duration::from_millis(50);
    let mut elapsed = 0.0f32;
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(step);
        elapsed += step.as_secs_f32();
        if !looping && elapsed >= total + 0.25 {
            break;
        }
    }

    // Fade out before tearing the stream down.
    for param in &gain_params {
        param.set(0.0);
    }
    std::thread::sleep(Duration::from_millis(50));
    stream.stop();
    println!("Done.");
    Ok(())
}
