//! Meditation player entry points.
//!
//! Wires the concrete collaborators (speech endpoint, bell file, output
//! device, wake lock) into the timeline builder and the transport.

use crate::asset::{AssetLoader, FileAssetLoader, SynthesizedBell};
use crate::audio::output::CpalPlaybackDevice;
use crate::audio::wav;
use crate::cli::BuildArgs;
use crate::config::Config;
use crate::defaults;
use crate::progress::{LogSink, ProgressSink};
use crate::script::ScriptParser;
use crate::session::BuildSession;
use crate::timeline::{SegmentSynthesizer, Timeline, TimelineBuilder};
use crate::transport::driver::{self, SharedTransport};
use crate::transport::{InhibitWakeLock, Phase, Transport};
use crate::tts::openai::OpenAiSpeech;
use crate::tts::{MockSpeechSynthesizer, SpeechSynthesizer};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// One line typed at the interactive prompt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    Toggle,
    Stop,
    Seek(f64),
    Quit,
}

/// Parse `p`, `s`, `q`, `+N` or `-N` (seconds).
pub fn parse_control(line: &str) -> Option<Control> {
    let line = line.trim();
    match line {
        "p" | "P" => Some(Control::Toggle),
        "s" | "S" => Some(Control::Stop),
        "q" | "Q" => Some(Control::Quit),
        _ => {
            let sign = match line.chars().next()? {
                '+' => 1.0,
                '-' => -1.0,
                _ => return None,
            };
            let secs: f64 = line[1..].trim().parse().ok()?;
            secs.is_finite().then_some(Control::Seek(sign * secs))
        }
    }
}

/// Format seconds as `MM:SS`.
pub fn format_clock(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Read a script from a file, or from stdin when the path is `-`.
pub fn read_script(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut script = String::new();
        std::io::stdin()
            .read_to_string(&mut script)
            .context("Failed to read script from stdin")?;
        return Ok(script);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))
}

/// Fold command-line overrides into the config.
pub fn apply_build_args(config: &mut Config, build: &BuildArgs) {
    if let Some(voice) = &build.voice {
        config.speech.voice = voice.clone();
    }
    if let Some(bell) = &build.bell {
        config.bell.path = Some(bell.clone());
    }
    if let Some(jobs) = build.jobs {
        config.speech.max_concurrent_requests = jobs;
    }
}

/// Assemble a timeline builder from config.
///
/// Offline mode swaps the speech endpoint for a local test tone.
pub fn create_builder(config: &Config, offline: bool) -> Result<TimelineBuilder> {
    let rate = config.audio.sample_rate;

    let speech: Arc<dyn SpeechSynthesizer> = if offline {
        Arc::new(MockSpeechSynthesizer::new(rate))
    } else {
        Arc::new(
            OpenAiSpeech::from_env(&config.speech).context("Speech endpoint not available")?,
        )
    };

    let bell: Arc<dyn AssetLoader> = match &config.bell.path {
        Some(path) => Arc::new(FileAssetLoader::new(path)),
        None => {
            tracing::info!("no bell file configured, using a synthesized bell");
            Arc::new(SynthesizedBell::new(rate, defaults::SYNTH_BELL_SECS))
        }
    };

    let synthesizer = SegmentSynthesizer::new(speech, bell, rate);
    Ok(
        TimelineBuilder::new(ScriptParser::new(config.script.parser_options()), synthesizer)
            .with_max_concurrent(config.speech.max_concurrent_requests),
    )
}

fn progress_bar(quiet: bool, template: &str) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(100);
    pb.set_style(
        // SAFETY: hardcoded template strings, always valid
        #[allow(clippy::expect_used)]
        ProgressStyle::default_bar()
            .template(template)
            .expect("hardcoded progress bar template")
            .progress_chars("#>-"),
    );
    pb
}

/// Build a timeline with a progress bar on stderr.
///
/// In quiet mode build steps go to the debug log instead.
pub async fn build_with_progress(
    builder: TimelineBuilder,
    script: String,
    quiet: bool,
) -> Result<Timeline> {
    let pb = progress_bar(quiet, "{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}");
    let sink: Arc<dyn ProgressSink> = if quiet {
        Arc::new(LogSink)
    } else {
        let sink_pb = pb.clone();
        Arc::new(move |percentage: f64, message: &str| {
            sink_pb.set_position(percentage.round() as u64);
            sink_pb.set_message(message.to_string());
        })
    };

    let mut session = BuildSession::new(builder);
    let timeline = session
        .spawn_build(script, sink)
        .await
        .context("Timeline build task failed")?;

    match timeline {
        Ok(timeline) => {
            pb.finish_and_clear();
            Ok(timeline)
        }
        Err(e) => {
            pb.abandon();
            let kind = e.kind();
            Err(anyhow::Error::new(e).context(format!("Timeline build failed ({})", kind)))
        }
    }
}

fn print_summary(timeline: &Timeline, verbosity: u8) {
    eprintln!(
        "Timeline: {} ({} segments)",
        format_clock(timeline.total_duration_secs()),
        timeline.marks().len()
    );
    if verbosity >= 1 {
        for mark in timeline.marks() {
            eprintln!("  {}  {}", format_clock(mark.offset_secs), mark.kind);
        }
    }
}

/// Run the play command: build the timeline, then drive it interactively.
///
/// Controls on stdin: `p` play/pause, `s` stop, `+N`/`-N` seek, `q` quit.
/// Returns when the timeline ends on its own or on `q`.
pub async fn run_play_command(
    mut config: Config,
    script_path: &Path,
    start_at: Option<f64>,
    build: BuildArgs,
    quiet: bool,
    verbosity: u8,
) -> Result<()> {
    apply_build_args(&mut config, &build);
    config.validate()?;
    let script = read_script(script_path)?;

    let builder = create_builder(&config, build.offline)?;
    let timeline = Arc::new(build_with_progress(builder, script, quiet).await?);
    if !quiet {
        print_summary(&timeline, verbosity);
    }

    let device = CpalPlaybackDevice::new(config.audio.device.as_deref())
        .context("Failed to open audio output")?;
    let total = timeline.total_duration_secs();
    let mut transport = Transport::new(Arc::clone(&timeline), Box::new(device))
        .with_wake_lock(Box::new(InhibitWakeLock::new()));

    let pb = progress_bar(quiet, "[{bar:40.cyan/blue}] {msg}");
    let sink_pb = pb.clone();
    transport.on_progress(Arc::new(move |percentage: f64, description: &str| {
        sink_pb.set_position(percentage.round() as u64);
        sink_pb.set_message(format!(
            "{} / {}  {}",
            format_clock(total * percentage / 100.0),
            format_clock(total),
            description
        ));
    }));

    let shared = driver::shared(transport);
    let poller = driver::spawn_progress_loop(
        &shared,
        Duration::from_millis(config.playback.progress_interval_ms),
    );

    {
        let mut transport = shared.lock().await;
        if let Some(position) = start_at {
            transport.seek_to(position)?;
        }
        transport.play().context("Failed to start playback")?;
    }
    if !quiet {
        pb.println("Controls: p = play/pause, s = stop, +N/-N = seek N seconds, q = quit");
    }

    let result = control_loop(&shared, &pb).await;

    shared.lock().await.stop();
    poller.abort();
    pb.finish_and_clear();
    result
}

async fn control_loop(shared: &SharedTransport, pb: &ProgressBar) -> Result<()> {
    let (tx, mut rx) = mpsc::channel::<String>(8);
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });

    let mut watch = tokio::time::interval(Duration::from_millis(200));
    let mut stdin_open = true;
    let mut user_stopped = false;

    let result = loop {
        tokio::select! {
            line = rx.recv(), if stdin_open => {
                let Some(line) = line else {
                    // stdin closed; keep playing until the timeline ends
                    stdin_open = false;
                    continue;
                };
                let Some(control) = parse_control(&line) else {
                    if !line.trim().is_empty() {
                        pb.println(format!("Unknown control: {}", line.trim()));
                    }
                    continue;
                };

                let mut transport = shared.lock().await;
                let outcome = match control {
                    Control::Toggle => {
                        user_stopped = false;
                        transport.toggle_play_pause()
                    }
                    Control::Stop => {
                        user_stopped = true;
                        transport.stop();
                        Ok(())
                    }
                    Control::Seek(delta) => transport.seek_by(delta),
                    Control::Quit => break Ok(()),
                };
                if let Err(e) = outcome {
                    pb.println(format!("Error ({}): {}", e.kind(), e));
                }
                if transport.phase() != Phase::Playing {
                    pb.set_message(format!(
                        "{} at {}",
                        transport.phase(),
                        format_clock(transport.elapsed_secs())
                    ));
                }
            }
            _ = watch.tick() => {
                if !user_stopped && shared.lock().await.phase() == Phase::Stopped {
                    break Ok(());
                }
            }
        }
    };

    reader.abort();
    result
}

/// Run the render command: build the timeline and write it as 16-bit WAV.
pub async fn run_render_command(
    mut config: Config,
    script_path: &Path,
    output: &Path,
    build: BuildArgs,
    quiet: bool,
    verbosity: u8,
) -> Result<()> {
    apply_build_args(&mut config, &build);
    config.validate()?;
    let script = read_script(script_path)?;

    let builder = create_builder(&config, build.offline)?;
    let timeline = build_with_progress(builder, script, quiet).await?;

    wav::write_file(timeline.buffer(), output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if !quiet {
        print_summary(&timeline, verbosity);
        eprintln!("Wrote {}", output.display());
    }
    Ok(())
}

/// Run the parse command: print the segments a script produces.
pub fn run_parse_command(config: &Config, script_path: &Path, json: bool) -> Result<()> {
    let script = read_script(script_path)?;
    let parser = ScriptParser::new(config.script.parser_options());
    let segments = parser.parse(&script)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&segments)?);
    } else {
        for (idx, segment) in segments.iter().enumerate() {
            println!("{:>3}  {}", idx, segment);
        }
    }
    Ok(())
}
