//! Audio device listing command.

use clap::Args;
use nodo_io::{default_devices, list_devices};

#[derive(Args)]
pub struct DevicesArgs {
    /// Show only the default devices
    #[arg(long)]
    defaults: bool,
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    if args.defaults {
        let (input, output) = default_devices()?;
        match input {
            Some(device) => println!(
                "Default input:  {} ({} Hz)",
                device.name, device.default_sample_rate
            ),
            None => println!("Default input:  none"),
        }
        match output {
            Some(device) => println!(
                "Default output: {} ({} Hz)",
                device.name, device.default_sample_rate
            ),
            None => println!("Default output: none"),
        }
        return Ok(());
    }

    let devices = list_devices()?;
    if devices.is_empty() {
        println!("No audio devices found.");
        return Ok(());
    }

    let inputs: Vec<_> = devices.iter().filter(|d| d.is_input).collect();
    if !inputs.is_empty() {
        println!("Input Devices:");
        for (idx, device) in inputs.iter().enumerate() {
            let also = if device.is_output { " (also output)" } else { "" };
            println!(
                "  [{}] {} ({} Hz){}",
                idx, device.name, device.default_sample_rate, also
            );
        }
        println!();
    }

    let outputs: Vec<_> = devices.iter().filter(|d| d.is_output).collect();
    if !outputs.is_empty() {
        println!("Output Devices:");
        for (idx, device) in outputs.iter().enumerate() {
            let also = if device.is_input { " (also input)" } else { "" };
            println!(
                "  [{}] {} ({} Hz){}",
                idx, device.name, device.default_sample_rate, also
            );
        }
        println!();
    }

    println!("Total: {} input(s), {} output(s)", inputs.len(), outputs.len());
    println!();
    println!("Tip: pass a device index or partial name via --output, or set");
    println!("output_device in a config file loaded with --config.");
    Ok(())
}
