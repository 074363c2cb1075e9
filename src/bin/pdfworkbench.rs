//! Command-line front-end: one subcommand per tool, outputs written to a
//! directory, progress on stderr.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use pdfworkbench::{
    CompressOptions, Dispatcher, ImageOutputFormat, InputFile, OutputFile, OutputSink,
    PdfToImagesOptions, ProgressObserver, RemovePagesOptions, RotateOptions, RotationAngle,
    SplitMethod, SplitOptions, StagingStore, ToolKind, ToolOptions, WatermarkAnchor,
    WatermarkOptions,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pdfworkbench",
    version,
    about = "Merge, split, compress, rotate, watermark and convert PDFs, entirely on this machine"
)]
struct Cli {
    /// Directory where outputs are written
    #[arg(short, long, global = true, default_value = ".")]
    output: PathBuf,

    /// Verbose logging (or set RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Combine PDFs into one document, in argument order
    Merge {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Split a PDF into single pages, or extract a page selection
    Split {
        file: PathBuf,
        /// Page selection like "1,3,5-8"; omit to split into single pages
        #[arg(long)]
        pages: Option<String>,
    },
    /// Re-save PDFs with object pruning and stream compression
    Compress {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, default_value_t = 0.8)]
        level: f32,
    },
    /// Rasterize PDF pages into a zip of images
    PdfToImages {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, value_enum, default_value = "png")]
        format: FormatArg,
        /// JPEG quality (1-100)
        #[arg(long, default_value_t = 80)]
        quality: u8,
        /// Oversampling factor
        #[arg(long, default_value_t = 2.0)]
        scale: f32,
    },
    /// Convert images into a PDF, one page per image
    ImagesToPdf {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Rotate every page of each PDF by a fixed angle
    Rotate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, value_enum, default_value = "90")]
        angle: AngleArg,
    },
    /// Stamp text on every page of each PDF
    Watermark {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, default_value = "DRAFT")]
        text: String,
        #[arg(long, value_enum, default_value = "center")]
        anchor: AnchorArg,
        #[arg(long, default_value_t = 0.5)]
        opacity: f32,
        #[arg(long, default_value_t = 50.0)]
        font_size: f32,
        /// Tilt in degrees; defaults to 45 for center, 0 for corners
        #[arg(long)]
        tilt: Option<f32>,
    },
    /// Delete selected pages from a PDF
    RemovePages {
        file: PathBuf,
        /// Pages to delete, like "2,4-6"
        #[arg(long)]
        pages: String,
    },
    /// List the available tools
    Tools,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Png,
    Jpeg,
}

impl From<FormatArg> for ImageOutputFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Png => ImageOutputFormat::Png,
            FormatArg::Jpeg => ImageOutputFormat::Jpeg,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum AngleArg {
    #[value(name = "90")]
    Deg90,
    #[value(name = "180")]
    Deg180,
    #[value(name = "270")]
    Deg270,
}

impl From<AngleArg> for RotationAngle {
    fn from(a: AngleArg) -> Self {
        match a {
            AngleArg::Deg90 => RotationAngle::Deg90,
            AngleArg::Deg180 => RotationAngle::Deg180,
            AngleArg::Deg270 => RotationAngle::Deg270,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum AnchorArg {
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl From<AnchorArg> for WatermarkAnchor {
    fn from(a: AnchorArg) -> Self {
        match a {
            AnchorArg::Center => WatermarkAnchor::Center,
            AnchorArg::TopLeft => WatermarkAnchor::TopLeft,
            AnchorArg::TopRight => WatermarkAnchor::TopRight,
            AnchorArg::BottomLeft => WatermarkAnchor::BottomLeft,
            AnchorArg::BottomRight => WatermarkAnchor::BottomRight,
        }
    }
}

/// Writes each output into the target directory as it is emitted.
struct DirSink {
    dir: PathBuf,
}

impl OutputSink for DirSink {
    fn emit(&self, output: OutputFile) {
        let path = self.dir.join(&output.name);
        match std::fs::write(&path, &output.bytes) {
            Ok(()) => println!("wrote {} ({} bytes)", path.display(), output.bytes.len()),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to write output"),
        }
    }
}

/// Bridges pipeline progress onto an indicatif bar.
struct BarProgress {
    bar: ProgressBar,
}

impl ProgressObserver for BarProgress {
    fn on_run_start(&self, total_items: usize) {
        self.bar.set_length(100);
        self.bar.set_message(format!("{total_items} file(s)"));
    }

    fn on_progress(&self, percent: u8) {
        self.bar.set_position(u64::from(percent));
    }

    fn on_run_complete(&self, _outputs: usize) {
        self.bar.finish_and_clear();
    }

    fn on_run_failed(&self, _error: &str) {
        self.bar.abandon();
    }
}

fn guess_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

fn read_inputs(paths: &[PathBuf]) -> Result<Vec<InputFile>> {
    paths
        .iter()
        .map(|path| {
            let bytes = std::fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
                .unwrap_or_else(|| path.display().to_string());
            Ok(InputFile::new(name, guess_mime(path), bytes))
        })
        .collect()
}

fn plan(command: Command) -> (ToolKind, ToolOptions, Vec<PathBuf>) {
    match command {
        Command::Merge { files } => (ToolKind::Merge, ToolOptions::Merge, files),
        Command::Split { file, pages } => {
            let method = match pages {
                Some(expression) => SplitMethod::Pages { expression },
                None => SplitMethod::All,
            };
            (
                ToolKind::Split,
                ToolOptions::Split(SplitOptions { method }),
                vec![file],
            )
        }
        Command::Compress { files, level } => (
            ToolKind::Compress,
            ToolOptions::Compress(CompressOptions { level }),
            files,
        ),
        Command::PdfToImages {
            files,
            format,
            quality,
            scale,
        } => (
            ToolKind::PdfToImages,
            ToolOptions::PdfToImages(PdfToImagesOptions {
                format: format.into(),
                quality,
                scale,
            }),
            files,
        ),
        Command::ImagesToPdf { files } => (ToolKind::ImagesToPdf, ToolOptions::ImagesToPdf, files),
        Command::Rotate { files, angle } => (
            ToolKind::Rotate,
            ToolOptions::Rotate(RotateOptions {
                angle: angle.into(),
            }),
            files,
        ),
        Command::Watermark {
            files,
            text,
            anchor,
            opacity,
            font_size,
            tilt,
        } => (
            ToolKind::Watermark,
            ToolOptions::Watermark(WatermarkOptions {
                text,
                anchor: anchor.into(),
                opacity,
                font_size,
                tilt_degrees: tilt,
            }),
            files,
        ),
        Command::RemovePages { file, pages } => (
            ToolKind::RemovePages,
            ToolOptions::RemovePages(RemovePagesOptions { expression: pages }),
            vec![file],
        ),
        Command::Tools => unreachable!("handled before planning"),
    }
}

fn print_tools() {
    for kind in ToolKind::ALL {
        let config = kind.config();
        println!("{:<14} {}", kind.id(), config.description);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "pdfworkbench=debug"
    } else {
        "pdfworkbench=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if matches!(cli.command, Command::Tools) {
        print_tools();
        return Ok(());
    }

    let (kind, options, paths) = plan(cli.command);
    let inputs = read_inputs(&paths)?;

    let mut store = StagingStore::new(kind);
    store.set_options(options);
    let staged = store.add_files(inputs);
    if staged.len() < paths.len() {
        warn!(
            staged = staged.len(),
            given = paths.len(),
            "some files were skipped (wrong type or duplicate)"
        );
    }
    if store.is_empty() {
        bail!("no usable input files for '{kind}'");
    }

    std::fs::create_dir_all(&cli.output)
        .with_context(|| format!("failed to create {}", cli.output.display()))?;
    let sink = DirSink {
        dir: cli.output.clone(),
    };

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {msg}")?
            .progress_chars("##-"),
    );
    let progress = Arc::new(BarProgress { bar });

    let dispatcher = Dispatcher::with_default_backends().with_progress(progress);
    let summary = dispatcher.run(&store, &sink).await?;

    println!(
        "{}: {} file(s) in, {} output(s) in {}",
        kind.id(),
        summary.items,
        summary.outputs,
        cli.output.display()
    );
    Ok(())
}
