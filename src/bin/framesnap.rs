use std::{path::PathBuf, sync::Arc};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use serde_json::{Value, json};

use framesnap::{
    DEFAULT_FRAME_COUNT, DEFAULT_JPEG_QUALITY, DEFAULT_OUTPUT_DIR, ExtractionMethod,
    ExtractionReport, ExtractionRequest, ExtractorConfig, FfmpegLogLevel, FrameExtractor,
    OperationType, ProgressCallback, ProgressInfo, VideoMetadata, VideoMetadataReader,
};

const CLI_AFTER_HELP: &str = "Examples:\n  framesnap extract talk.mp4 --frames 6 --method scene --progress\n  framesnap extract talk.mp4 --json --title \"Keynote\"\n  framesnap metadata talk.mp4 --json\n  framesnap list --out frames\n  framesnap cleanup --all --out frames\n  framesnap completions zsh > _framesnap";

#[derive(Debug, Parser)]
#[command(
    name = "framesnap",
    version,
    about = "Extract representative frames from videos as JPEG files",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Print debug logging to stderr.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while extracting.
    #[arg(long, global = true)]
    progress: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, global = true, default_value = "error")]
    ffmpeg_log_level: String,

    /// Directory frames are written to and listed from.
    #[arg(long, global = true, default_value = DEFAULT_OUTPUT_DIR)]
    out: PathBuf,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract representative frames from a video.
    #[command(
        after_help = "Examples:\n  framesnap extract talk.mp4\n  framesnap extract talk.mp4 --method time --frames 8 --quality 90"
    )]
    Extract {
        /// Input video path.
        input: PathBuf,
        /// Selection method: auto | time | scene.
        #[arg(long, default_value = "auto")]
        method: String,
        /// Number of frames to extract.
        #[arg(long, default_value_t = DEFAULT_FRAME_COUNT)]
        frames: u32,
        /// JPEG quality (1-100).
        #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY)]
        quality: u8,
        /// Display title echoed in the report.
        #[arg(long)]
        title: Option<String>,
        /// Name files `{video}_frame_NN_SSSs.jpg` without a per-request token.
        #[arg(long)]
        plain_names: bool,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the geometry of a video.
    #[command(visible_alias = "info")]
    Metadata {
        /// Input video path.
        input: PathBuf,
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List JPEG files in the output directory.
    List {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Delete extracted frames.
    Cleanup {
        /// Files to delete.
        paths: Vec<PathBuf>,
        /// Delete every JPEG file in the output directory.
        #[arg(long, conflicts_with = "paths")]
        all: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

/// Level used unless `RUST_LOG` overrides it.
fn default_log_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

fn install_logger(verbose: bool) {
    env_logger::Builder::new()
        .filter_level(default_log_level(verbose))
        .parse_default_env()
        .init();
}

/// Drives an indicatif bar from pipeline progress.
struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {msg:>10} {bar:40.cyan/blue} {pos}/{len}",
        )?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let stage = match info.operation {
            OperationType::SceneAnalysis => "analysing",
            OperationType::FrameDecoding => "decoding",
            OperationType::FrameEncoding => "encoding",
            _ => "working",
        };
        self.bar.set_message(stage);
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
    }
}

fn metadata_json(metadata: &VideoMetadata) -> Value {
    json!({
        "total_frames": metadata.total_frame_count,
        "fps": metadata.fps,
        "width": metadata.width,
        "height": metadata.height,
        "duration": metadata.duration_seconds,
        "duration_str": metadata.duration_label(),
    })
}

fn report_json(report: &ExtractionReport) -> Value {
    let frames: Vec<Value> = report
        .frames
        .iter()
        .map(|frame| {
            let mut entry = json!({
                "frame_number": frame.ordinal,
                "timestamp": frame.timestamp_seconds,
                "timestamp_str": frame.timestamp_label,
                "file_path": frame.path.display().to_string(),
                "file_name": frame.file_name,
                "file_size": frame.byte_size,
            });
            if let Some(score) = frame.change_score {
                entry["change_score"] = json!(score);
            }
            entry
        })
        .collect();

    json!({
        "success": true,
        "title": report.title,
        "video_info": metadata_json(&report.metadata),
        "extraction_method": report.method_used.to_string(),
        "extraction_time": (report.elapsed_seconds * 100.0).round() / 100.0,
        "frames_extracted": report.frames_extracted(),
        "frames": frames,
        "total_size": report.total_bytes,
    })
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    install_logger(cli.global.verbose);

    let ffmpeg_level: FfmpegLogLevel = cli.global.ffmpeg_log_level.parse()?;
    framesnap::set_ffmpeg_log_level(ffmpeg_level);

    match cli.command {
        Commands::Extract {
            input,
            method,
            frames,
            quality,
            title,
            plain_names,
            json,
        } => {
            let method: ExtractionMethod = method.parse()?;
            let mut request = ExtractionRequest::new(method, frames);
            if let Some(title) = title {
                request = request.with_title(title);
            }

            let mut config = ExtractorConfig::new(&cli.global.out)
                .with_jpeg_quality(quality)
                .with_unique_file_names(!plain_names);
            let progress = if cli.global.progress {
                let progress = Arc::new(TerminalProgress::new()?);
                config = config.with_progress(progress.clone());
                Some(progress)
            } else {
                None
            };

            let extractor = FrameExtractor::new(config)?;
            let outcome = extractor.extract(&input, &request);
            if let Some(progress) = progress {
                progress.bar.finish_and_clear();
            }

            match outcome {
                Ok(report) if json => {
                    println!("{}", serde_json::to_string_pretty(&report_json(&report))?);
                }
                Ok(report) => {
                    for frame in &report.frames {
                        let score = frame
                            .change_score
                            .map(|score| format!(" (change {score:.3})"))
                            .unwrap_or_default();
                        println!(
                            "{:>2}. {} {} {} bytes{score}",
                            frame.ordinal,
                            frame.timestamp_label.cyan(),
                            frame.path.display(),
                            frame.byte_size,
                        );
                    }
                    println!(
                        "{} {}",
                        "success:".green().bold(),
                        format!(
                            "Extracted {} frame(s) via {} sampling in {:.2}s ({} bytes)",
                            report.frames_extracted(),
                            report.method_used,
                            report.elapsed_seconds,
                            report.total_bytes,
                        )
                        .green()
                    );
                }
                Err(error) if json => {
                    let payload = json!({ "success": false, "error": error.to_string() });
                    println!("{}", serde_json::to_string_pretty(&payload)?);
                    return Err(error.into());
                }
                Err(error) => return Err(error.into()),
            }
        }
        Commands::Metadata { input, json } => {
            let metadata = VideoMetadataReader::read(&input)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&metadata_json(&metadata))?);
            } else {
                println!("Resolution: {}x{}", metadata.width, metadata.height);
                println!("Frame rate: {:.3} fps", metadata.fps);
                println!("Frames: {}", metadata.total_frame_count);
                println!(
                    "Duration: {} ({:.2}s)",
                    metadata.duration_label(),
                    metadata.duration_seconds
                );
            }
        }
        Commands::List { json } => {
            let files = framesnap::list_output_files(&cli.global.out)?;
            if json {
                let names: Vec<String> = files
                    .iter()
                    .filter_map(|path| path.file_name())
                    .map(|name| name.to_string_lossy().into_owned())
                    .collect();
                let payload = json!({
                    "output_dir": cli.global.out.display().to_string(),
                    "frame_count": names.len(),
                    "frames": names,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                for file in &files {
                    println!("{}", file.display());
                }
                eprintln!("{} file(s) in {}", files.len(), cli.global.out.display());
            }
        }
        Commands::Cleanup { paths, all } => {
            let removed = if all {
                framesnap::delete_files(framesnap::list_output_files(&cli.global.out)?)
            } else if paths.is_empty() {
                return Err("nothing to delete (pass file paths or --all)".into());
            } else {
                framesnap::delete_files(&paths)
            };
            println!(
                "{} {}",
                "success:".green().bold(),
                format!("Deleted {removed} file(s)").green()
            );
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framesnap", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands, default_log_level, report_json};
    use clap::Parser;
    use log::LevelFilter;
    use framesnap::{ExtractedFrame, ExtractionReport, SamplingStrategy, VideoMetadata};

    #[test]
    fn extract_defaults() {
        let cli = Cli::try_parse_from(["framesnap", "extract", "talk.mp4"]).unwrap();
        match cli.command {
            Commands::Extract {
                method,
                frames,
                quality,
                plain_names,
                ..
            } => {
                assert_eq!(method, "auto");
                assert_eq!(frames, 4);
                assert_eq!(quality, 85);
                assert!(!plain_names);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.global.out.to_str(), Some("temp/extracted_frames"));
        assert_eq!(cli.global.ffmpeg_log_level, "error");
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "framesnap", "list", "--out", "frames", "--verbose", "--json",
        ])
        .unwrap();
        assert!(cli.global.verbose);
        assert_eq!(cli.global.out.to_str(), Some("frames"));
        assert!(matches!(cli.command, Commands::List { json: true }));
    }

    #[test]
    fn verbose_raises_default_log_level() {
        let quiet = Cli::try_parse_from(["framesnap", "list"]).unwrap();
        assert_eq!(default_log_level(quiet.global.verbose), LevelFilter::Warn);
        let verbose = Cli::try_parse_from(["framesnap", "list", "--verbose"]).unwrap();
        assert_eq!(default_log_level(verbose.global.verbose), LevelFilter::Debug);
    }

    #[test]
    fn cleanup_all_conflicts_with_paths() {
        assert!(Cli::try_parse_from(["framesnap", "cleanup", "a.jpg", "--all"]).is_err());
        assert!(Cli::try_parse_from(["framesnap", "cleanup", "--all"]).is_ok());
    }

    #[test]
    fn report_json_omits_score_for_uniform_frames() {
        let report = ExtractionReport {
            method_used: SamplingStrategy::Time,
            elapsed_seconds: 1.23456,
            metadata: VideoMetadata::new(3000, 30.0, 640, 360),
            frames: vec![ExtractedFrame {
                ordinal: 1,
                timestamp_seconds: 50.0,
                timestamp_label: "0:00:50".to_string(),
                file_name: "talk_frame_01_050s.jpg".to_string(),
                path: "frames/talk_frame_01_050s.jpg".into(),
                byte_size: 1024,
                change_score: None,
            }],
            total_bytes: 1024,
            title: Some("Talk".to_string()),
        };

        let payload = report_json(&report);
        assert_eq!(payload["success"], true);
        assert_eq!(payload["extraction_method"], "time");
        assert_eq!(payload["extraction_time"], 1.23);
        assert_eq!(payload["frames_extracted"], 1);
        assert_eq!(payload["video_info"]["duration_str"], "0:01:40");
        assert_eq!(payload["frames"][0]["file_name"], "talk_frame_01_050s.jpg");
        assert!(payload["frames"][0].get("change_score").is_none());
        assert_eq!(payload["title"], "Talk");
    }
}
