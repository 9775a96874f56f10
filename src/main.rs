use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};

use eos_spectro_rs::logger::{self, error, info};
use eos_spectro_rs::spectro_pipeline::{
    AnalysisConfig, CalibrationCoefficients, Channel, Confirmer, CsvPlotSink, GapMode,
    ImageToNitratePipeline, PeakChannel, PlotSink, Prompt, TiffCompression, TracingPlotSink,
};

#[derive(Parser)]
#[command(name = "eos_spectro")]
#[command(version, about = "Nitrate concentration from smartphone spectrometer photographs", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Answer yes to every confirmation prompt
    #[arg(long, global = true, conflicts_with = "no")]
    yes: bool,

    /// Answer no to every confirmation prompt
    #[arg(long, global = true)]
    no: bool,

    #[command(flatten)]
    analysis: AnalysisArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct AnalysisArgs {
    /// Calibration record file
    #[arg(long, value_name = "FILE", global = true, default_value = "nitrate_calibration.csv")]
    record: PathBuf,

    /// Heatmap threshold fraction (0.1-0.9)
    #[arg(long, value_name = "FLOAT", global = true, default_value = "0.25")]
    threshold: f64,

    /// Centre of the integration window in nm
    #[arg(long, value_name = "NM", global = true, default_value = "530")]
    center: f64,

    /// Half-width of the integration window in nm
    #[arg(long, value_name = "NM", global = true, default_value = "5")]
    half_window: f64,

    /// Channel integrated over the window (r, g or b)
    #[arg(long, value_name = "CHANNEL", global = true, default_value = "g")]
    channel: Channel,

    /// Crop photographs to their central half before analysis
    #[arg(long, global = true)]
    trim_edge: bool,

    /// Locate the blue fiducial on the blue channel instead of the red one
    #[arg(long, global = true)]
    per_channel_peaks: bool,

    /// Estimate the reference-to-sample gap from the band width
    #[arg(long, global = true)]
    gap_from_width: bool,

    /// Average the full band width instead of dropping a margin on each side
    #[arg(long, global = true)]
    no_margin: bool,

    /// Save rotated photographs as <name>_rot.tiff next to the input
    #[arg(long, global = true)]
    save_rotated: bool,

    /// Compression of saved rotated photographs
    #[arg(long, value_enum, value_name = "METHOD", global = true, default_value = "none")]
    compression: CompressionArg,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure the nitrate concentration of one photograph
    Measure {
        /// Photograph of the spectrometer (TIFF, JPEG or PNG)
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
    },

    /// Fit and store new calibration coefficients from photographs of known samples
    Calibrate {
        /// Photographs of the calibration samples
        #[arg(long, value_name = "IMAGES", value_delimiter = ',', required = true)]
        images: Vec<PathBuf>,

        /// Nitrate concentration of each sample in mg/L, in image order
        #[arg(long, value_name = "MG_L", value_delimiter = ',', required = true)]
        concentrations: Vec<f64>,

        /// Also write the absorbance-vs-concentration points to this CSV file
        #[arg(long, value_name = "FILE")]
        plot: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CompressionArg {
    None,
    Lzw,
    Deflate,
}

impl From<CompressionArg> for TiffCompression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::None => TiffCompression::None,
            CompressionArg::Lzw => TiffCompression::Lzw,
            CompressionArg::Deflate => TiffCompression::Deflate,
        }
    }
}

impl AnalysisArgs {
    fn to_config(&self) -> AnalysisConfig {
        AnalysisConfig::builder()
            .record_path(&self.record)
            .threshold_fraction(self.threshold)
            .center_wavelength(self.center)
            .half_window(self.half_window)
            .intensity_channel(self.channel)
            .trim_edge(self.trim_edge)
            .peak_channel(if self.per_channel_peaks {
                PeakChannel::PerChannel
            } else {
                PeakChannel::Red
            })
            .gap_mode(if self.gap_from_width {
                GapMode::ReferenceWidth
            } else {
                GapMode::PeakDistance
            })
            .trim_margin(!self.no_margin)
            .save_rotated(self.save_rotated)
            .rotated_compression(self.compression.into())
            .build()
    }
}

/// Asks on the terminal unless `--yes` or `--no` fixed the answer.
struct ConsoleConfirmer {
    fixed: Option<bool>,
}

impl ConsoleConfirmer {
    fn read_line(&self, question: &str) -> Option<String> {
        eprint!("{question} ");
        io::stderr().flush().ok()?;
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }

    fn ask(&self, question: &str) -> bool {
        if let Some(answer) = self.fixed {
            return answer;
        }
        self.read_line(&format!("{question} [y/N]"))
            .is_some_and(|answer| matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
    }

    fn read_number(&self, name: &str) -> Option<f64> {
        loop {
            let line = self.read_line(&format!("Enter {name}:"))?;
            match line.parse::<f64>() {
                Ok(value) if value.is_finite() => return Some(value),
                _ => eprintln!("'{line}' is not a number"),
            }
        }
    }
}

impl Confirmer for ConsoleConfirmer {
    fn confirm(&self, prompt: &Prompt) -> bool {
        self.ask(&prompt.to_string())
    }

    fn manual_coefficients(&self) -> Option<CalibrationCoefficients> {
        if self.fixed.is_some() || !self.ask("No calibration record found. Enter coefficients manually?") {
            return None;
        }
        let k = self.read_number("k")?;
        let b = self.read_number("b")?;
        Some(CalibrationCoefficients::new(k, b))
    }

    fn alternate_record_path(&self, existing: &Path) -> Option<PathBuf> {
        if self.fixed.is_some() {
            return None;
        }
        let line = self.read_line(&format!(
            "Enter another file name for the new record instead of '{}' (empty to abort):",
            existing.display()
        ))?;
        (!line.is_empty()).then(|| PathBuf::from(line))
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let confirmer = ConsoleConfirmer {
        fixed: match (cli.yes, cli.no) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        },
    };
    let pipeline = ImageToNitratePipeline::new(cli.analysis.to_config());

    info!("Integration window: {:?} nm", pipeline.config().wavelength_window());
    info!("Intensity channel: {}", pipeline.config().intensity_channel);

    match cli.command {
        Commands::Measure { image } => {
            let measurement = pipeline
                .measure_file(&image, &confirmer)
                .with_context(|| format!("measuring {}", image.display()))?;

            if measurement.analysis.aligned.tilt_accepted {
                info!("Measured on a tilted image; treat the result with caution");
            }
            println!(
                "Nitrate concentration: {:.3} mg/L (intensity {:.5}, {})",
                measurement.concentration,
                measurement.analysis.intensity.average,
                measurement.source
            );
        }
        Commands::Calibrate {
            images,
            concentrations,
            plot,
        } => {
            let csv_sink = plot.map(CsvPlotSink::new);
            let sink: &dyn PlotSink = match &csv_sink {
                Some(sink) => sink,
                None => &TracingPlotSink,
            };

            let outcome = pipeline
                .calibrate_files(&images, &concentrations, &confirmer, Some(sink))
                .context("calibration failed")?;

            println!(
                "Calibration saved to {}: k = {}, b = {}",
                outcome.record_path.display(),
                outcome.record.k,
                outcome.record.b
            );
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    info!("Starting eos_spectro...");

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}
