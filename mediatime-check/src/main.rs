// Mediatime Check Tool
// Copyright (c) 2024 The Project Mediatime Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

mod pipeline;

use mediatime::core::audio::{AudioSpec, ChannelLayout};
use mediatime::core::sample::SampleFormat;

use clap::Parser;
use log::error;

use pipeline::{PipelineOptions, PipelineResult};

#[derive(Parser, Debug)]
#[command(
    name = "Mediatime Check",
    version,
    about = "Check timestamp continuity through a synthetic decode and resample pipeline"
)]
struct Args {
    /// Sample rate of the decoded audio
    #[arg(long, default_value_t = 48_000)]
    src_rate: u32,
    /// Sample rate of the resampled audio
    #[arg(long, default_value_t = 44_100)]
    dst_rate: u32,
    /// Sample format of the decoded audio
    #[arg(long, default_value = "s16")]
    src_format: SampleFormat,
    /// Sample format of the resampled audio
    #[arg(long, default_value = "fltp")]
    dst_format: SampleFormat,
    /// Channel layout of the audio, for example `stereo`, `5.1`, or `FL+FR+LFE`
    #[arg(long, default_value = "stereo")]
    layout: ChannelLayout,
    /// Number of frames in each decoded unit
    #[arg(long, default_value_t = 1024)]
    chunk: usize,
    /// Number of frames in each resampled buffer
    #[arg(long, default_value_t = 1024)]
    out_frames: usize,
    /// Number of decoded units
    #[arg(long, default_value_t = 100)]
    chunks: usize,
    /// Decode units out of presentation order, as B-frames are
    #[arg(long)]
    reorder: bool,
    /// Only print test results
    #[arg(long, short)]
    quiet: bool,
}

fn main() {
    pretty_env_logger::init();

    let args = Args::parse();

    if args.chunk == 0 || args.out_frames == 0 {
        error!("frame counts must be greater than zero");
        std::process::exit(1);
    }

    let opts = PipelineOptions {
        src: AudioSpec::new(args.src_format, args.src_rate, args.layout),
        dst: AudioSpec::new(args.dst_format, args.dst_rate, args.layout),
        chunk: args.chunk,
        out_frames: args.out_frames,
        chunks: args.chunks,
        reorder: args.reorder,
        is_quiet: args.quiet,
    };

    let mut res: PipelineResult = Default::default();

    println!("Source:      {}", opts.src);
    println!("Destination: {}", opts.dst);
    println!();

    if let Err(err) = pipeline::run(&opts, &mut res) {
        error!("test interrupted by error: {}", err);
        std::process::exit(1);
    }

    if !opts.is_quiet {
        println!();
    }

    println!("Test Results");
    println!("=================================================");
    println!();
    println!("  Failed/Total Units:   {:>12}/{:>12}", res.n_failed_units, res.n_units);
    println!("  Failed/Total Buffers: {:>12}/{:>12}", res.n_failed_buffers, res.n_buffers);
    println!();
    println!("  Frames In:            {:>12}", res.frames_in);
    println!("  Frames Out:           {:>12}", res.frames_out);
    println!("  Frames Expected:      {:>12}", res.frames_expected(&opts));
    println!();

    let ret = if res.is_pass(&opts) {
        println!("PASS");
        0
    }
    else {
        println!("FAIL");
        1
    };
    println!();

    std::process::exit(ret);
}
