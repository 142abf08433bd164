//! Example: decode a synthesized AD5592R acquisition session
//!
//! Builds the event stream a framing layer would produce for an `ADC_SEQ`
//! request followed by NOP reads (and optionally a DAC readback), runs it
//! through the decoder as a pipeline stage and prints every annotation.
//!
//! Usage:
//!   cargo run --example decode_sequence -- \
//!       --channels 0x05 --temperature -n 6
//!
//! With a DAC readback of channel 3 at the end:
//!   cargo run --example decode_sequence -- \
//!       --channels 0x0F --dac-readback 3

use ad5592r::runtime::{Receiver, Sender};
use ad5592r::{
    Ad5592rDecoder, Annotation, ProcessNode, Scheduler, SpiEvent, WorkError, WorkResult, bounded,
    transaction_events,
};
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// ADC channel mask for ADC_SEQ (hex)
    #[arg(long, value_parser = parse_hex, default_value = "0x05")]
    channels: u8,

    /// Interleave the temperature sensor
    #[arg(long)]
    temperature: bool,

    /// Keep cycling through the sequence
    #[arg(long)]
    repeat: bool,

    /// Number of NOP reads after the request (default: one full round)
    #[arg(short, long)]
    n: Option<usize>,

    /// Finish with a DAC readback of this channel
    #[arg(long)]
    dac_readback: Option<u8>,

    /// Samples per SPI bit
    #[arg(long, default_value_t = 8)]
    samples_per_bit: u64,
}

fn parse_hex(s: &str) -> Result<u8, std::num::ParseIntError> {
    let s = s.trim_start_matches("0x").trim_start_matches("0X");
    u8::from_str_radix(s, 16)
}

/// Minimal device model producing plausible MISO words
struct DeviceModel {
    channels: Vec<u16>,
    temperature: bool,
    position: usize,
}

impl DeviceModel {
    fn round_len(&self) -> usize {
        self.channels.len() + usize::from(self.temperature)
    }

    fn next_sample(&mut self) -> u16 {
        let len = self.round_len().max(1);
        let slot = self.position % len;
        self.position += 1;
        if self.temperature && slot == 0 {
            return 0x8000 | 0x3A0;
        }
        let index = slot - usize::from(self.temperature);
        let channel = self.channels.get(index).copied().unwrap_or(0);
        (channel << 12) | (0x100 * (channel + 1))
    }
}

fn build_exchanges(args: &Args) -> Vec<(u16, u16)> {
    let mut device = DeviceModel {
        channels: (0..8).filter(|ch| args.channels & (1 << ch) != 0).collect(),
        temperature: args.temperature,
        position: 0,
    };

    let request = 0x1000
        | (u16::from(args.repeat) << 9)
        | (u16::from(args.temperature) << 8)
        | u16::from(args.channels);
    let reads = args.n.unwrap_or(device.round_len() + 1);

    let mut exchanges = vec![(request, 0x0000)];
    for i in 0..reads {
        // First read after the request returns a stale word
        let miso = if i == 0 { 0xFFFF } else { device.next_sample() };
        exchanges.push((0x0000, miso));
    }

    if let Some(channel) = args.dac_readback {
        let dac_rd = 0x0800 | 0x0018 | u16::from(channel & 0x7);
        exchanges.push((dac_rd, 0x0000));
        exchanges.push((0x0000, (u16::from(channel & 0x7) << 12) | 0x800));
    }
    exchanges
}

/// Source that replays a prepared event list
struct EventReplay {
    events: Vec<SpiEvent>,
    next: usize,
}

impl ProcessNode for EventReplay {
    type Input = ();
    type Output = SpiEvent;

    fn name(&self) -> &str {
        "event_replay"
    }

    fn should_stop(&self) -> bool {
        self.next >= self.events.len()
    }

    fn work(&mut self, _input: &mut Receiver<()>, output: &Sender<SpiEvent>) -> WorkResult<usize> {
        let event = self.events[self.next];
        self.next += 1;
        output.send(event)?;
        Ok(1)
    }
}

/// Sink that prints annotations
struct AnnotationPrinter;

impl ProcessNode for AnnotationPrinter {
    type Input = Annotation;
    type Output = ();

    fn name(&self) -> &str {
        "annotation_printer"
    }

    fn work(&mut self, input: &mut Receiver<Annotation>, _output: &Sender<()>) -> WorkResult<usize> {
        let annotation = input.recv()?;
        info!(
            "{:>8}..{:<8} {:<15} {}",
            annotation.start_sample,
            annotation.end_sample,
            annotation.row.id(),
            annotation.text
        );
        Ok(0)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if args.samples_per_bit == 0 {
        return Err(Box::new(WorkError::NodeError(
            "samples-per-bit must be at least 1".to_string(),
        )));
    }

    info!("=== AD5592R Decode Example ===");
    info!(
        "ADC_SEQ: channels=0x{:02X} temperature={} repeat={}",
        args.channels, args.temperature, args.repeat
    );

    // Four idle bit times between frames
    let frame_len = 20 * args.samples_per_bit;
    let events: Vec<SpiEvent> = build_exchanges(&args)
        .into_iter()
        .enumerate()
        .flat_map(|(i, (mosi, miso))| {
            transaction_events(mosi, miso, i as u64 * frame_len, args.samples_per_bit)
        })
        .collect();
    info!("Synthesized {} bus events", events.len());

    let (_idle_tx, idle_rx) = bounded::<()>(1);
    let (event_tx, event_rx) = bounded::<SpiEvent>(1024);
    let (annotation_tx, annotation_rx) = bounded::<Annotation>(1024);

    let mut scheduler = Scheduler::new();
    scheduler.start_process(EventReplay { events, next: 0 }, idle_rx, event_tx)?;
    scheduler.start_process(
        Ad5592rDecoder::new().with_name("ad5592r"),
        event_rx,
        annotation_tx,
    )?;
    scheduler.start_process(AnnotationPrinter, annotation_rx, Sender::disconnected())?;

    info!("Running...");
    scheduler.wait();
    info!("Done!");

    Ok(())
}
