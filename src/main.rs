use anyhow::{Context, Result};
use backscrub::capture::{CaptureSource, TestPattern, WebcamCapture};
use backscrub::config::{self, ChromaPolicy, FilterOptions, KeyColor, Settings};
use backscrub::output::{LoopbackOutput, OutputSink};
use backscrub::segmentation::OnnxMaskFactory;
use backscrub::{BackscrubFilter, DebugSink, FrameOutcome, VideoPath};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input webcam device index
    #[arg(short, long, default_value_t = 0)]
    input_device: u32,

    /// Feed a synthetic colour-bar pattern instead of a webcam
    #[arg(long)]
    test_pattern: bool,

    /// Output v4l2loopback device path
    #[arg(short, long, default_value = "/dev/video10")]
    output_device: String,

    /// Video width (capture and output)
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Video height (capture and output)
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Target frames per second
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Segmentation model (ONNX file), relative paths resolve against --data-dir
    #[arg(long, default_value = config::MODEL_DEFAULT)]
    model: String,

    /// Directory holding bundled models
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Inference threads
    #[arg(long, default_value_t = config::DEFAULT_THREADS)]
    threads: usize,

    /// Width the segmentation model runs at
    #[arg(long, default_value_t = config::DEFAULT_TARGET_WIDTH)]
    model_width: u32,

    /// Height the segmentation model runs at
    #[arg(long, default_value_t = config::DEFAULT_TARGET_HEIGHT)]
    model_height: u32,

    /// How background chroma is keyed
    #[arg(long, value_enum, default_value_t = ChromaPolicy::Proportional)]
    chroma: ChromaPolicy,

    /// Luma background pixels are keyed to
    #[arg(long, default_value_t = KeyColor::GREEN_SCREEN.luma)]
    key_luma: u8,

    /// Chroma (U and V) background pixels are keyed to
    #[arg(long, default_value_t = KeyColor::GREEN_SCREEN.chroma)]
    key_chroma: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("Backscrub starting");
    tracing::info!("Video: {}x{} @ {} fps", args.width, args.height, args.fps);
    tracing::info!(
        "Model: {} at {}x{} ({} threads)",
        args.model,
        args.model_width,
        args.model_height,
        args.threads
    );

    let mut capture: Box<dyn CaptureSource> = if args.test_pattern {
        tracing::info!("Using synthetic test pattern");
        Box::new(TestPattern::new(args.width, args.height))
    } else {
        Box::new(
            WebcamCapture::new(args.input_device, args.width, args.height)
                .context("Failed to initialize webcam capture")?,
        )
    };

    let mut output = LoopbackOutput::new(&args.output_device, args.width, args.height)
        .context("Failed to initialize v4l2loopback output")?;

    let options = FilterOptions {
        target_width: args.model_width,
        target_height: args.model_height,
        threads: args.threads,
        chroma_policy: args.chroma,
        key: KeyColor {
            luma: args.key_luma,
            chroma: args.key_chroma,
        },
        data_dir: args.data_dir.clone(),
        debug: DebugSink::tracing(),
    };
    let filter = BackscrubFilter::create(
        &Settings::new(args.model.clone()),
        Arc::new(OnnxMaskFactory),
        options,
    );
    if let Some(reason) = filter.status() {
        tracing::warn!("Segmentation unavailable, passing video through: {}", reason);
    }

    let mut video = filter.video_path();
    run_pipeline(
        capture.as_mut(),
        &mut output,
        &mut video,
        args.fps,
        args.frames,
    )
}

fn run_pipeline<O>(
    capture: &mut dyn CaptureSource,
    output: &mut O,
    video: &mut VideoPath,
    target_fps: u32,
    max_frames: Option<u64>,
) -> Result<()>
where
    O: OutputSink,
{
    let frame_duration = Duration::from_secs_f32(1.0 / target_fps.max(1) as f32);
    let mut frame_count = 0u64;
    let mut composited = 0u64;
    let mut total_capture_time = Duration::ZERO;
    let mut total_filter_time = Duration::ZERO;
    let mut total_output_time = Duration::ZERO;

    tracing::info!("Starting main pipeline loop");
    tracing::info!("Press Ctrl+C to stop");

    while max_frames.map_or(true, |max| frame_count < max) {
        let loop_start = Instant::now();

        // Capture frame
        let capture_start = Instant::now();
        let mut frame = capture
            .capture_frame()
            .context("Failed to capture frame")?;
        total_capture_time += capture_start.elapsed();

        // Filter in place; never waits on inference
        let filter_start = Instant::now();
        if video.filter_video(&mut frame) == FrameOutcome::Composited {
            composited += 1;
        }
        total_filter_time += filter_start.elapsed();

        // Output frame
        let output_start = Instant::now();
        output
            .write_frame(&frame)
            .context("Failed to write frame")?;
        total_output_time += output_start.elapsed();

        frame_count += 1;

        // Log stats every 30 frames
        if frame_count % 30 == 0 {
            let avg_capture_ms = total_capture_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_filter_ms = total_filter_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_output_ms = total_output_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let total_ms = avg_capture_ms + avg_filter_ms + avg_output_ms;
            let stats = video.mailbox().stats();

            tracing::info!(
                "Frame {}: capture={:.1}ms, filter={:.1}ms, output={:.1}ms, total={:.1}ms, composited={}, masks={}, dropped={}",
                frame_count,
                avg_capture_ms,
                avg_filter_ms,
                avg_output_ms,
                total_ms,
                composited,
                stats.masks_published,
                stats.frames_dropped()
            );
        }

        // Frame rate limiting
        let elapsed = loop_start.elapsed();
        if elapsed < frame_duration {
            std::thread::sleep(frame_duration - elapsed);
        }
    }

    tracing::info!("Processed {} frames", frame_count);
    Ok(())
}
