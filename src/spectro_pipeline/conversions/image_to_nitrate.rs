use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::spectro_pipeline::{
    analysis::{Heatmap, check_alignment, extract_spectrum, integrate_intensity, locate_band},
    calibration::{
        AbsorbancePlot, CalibrationCoefficients, CalibrationRecord, CoefficientSource, PlotSink,
    },
    common::error::{AnalysisError, Result},
    config::AnalysisConfig,
    confirm::{Confirmer, Prompt},
    conversions::types::{AlignedImage, CalibrationOutcome, Measurement, SpectralAnalysis},
    image::{AutoImageReader, ImageReader, ImageWriter, RgbImage, TiffImageWriter},
    rotation::{CpuRotator, ImageRotator},
};

pub struct ImageToNitratePipeline<R: ImageReader, T: ImageRotator> {
    reader: R,
    rotator: Option<T>,
    config: AnalysisConfig,
}

impl ImageToNitratePipeline<AutoImageReader, CpuRotator> {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            reader: AutoImageReader,
            rotator: Some(CpuRotator::new()),
            config,
        }
    }
}

impl<R: ImageReader, T: ImageRotator> ImageToNitratePipeline<R, T> {
    /// `rotator = None` models a setup without a rotation service; tilted images can
    /// then only be accepted as they are or rejected.
    pub fn with_custom(reader: R, rotator: Option<T>, config: AnalysisConfig) -> Self {
        Self {
            reader,
            rotator,
            config,
        }
    }

    fn check_orientation(&self, image: RgbImage, confirmer: &dyn Confirmer) -> Result<RgbImage> {
        let (width, height) = (image.width, image.height);
        if !image.is_portrait() {
            warn!(width, height, "Image appears to be landscape");
            if !confirmer.confirm(&Prompt::LandscapeOrientation { width, height }) {
                return Err(AnalysisError::LandscapeRejected { width, height });
            }
        }

        if !self.config.trim_edge {
            return Ok(image);
        }

        let trimmed = image.trim_edges()?;
        info!(width = trimmed.width, height = trimmed.height, "Trimmed image edges");
        let prompt = Prompt::TrimmedImage {
            width: trimmed.width,
            height: trimmed.height,
        };
        if !confirmer.confirm(&prompt) {
            return Err(AnalysisError::TrimRejected);
        }
        Ok(trimmed)
    }

    /// Locates the reference band and verifies the tilt, rotating and starting over from
    /// the heatmap at most `max_rotation_retries` times.
    #[instrument(skip_all, fields(width = image.width, height = image.height))]
    pub fn align(&self, image: RgbImage, confirmer: &dyn Confirmer) -> Result<AlignedImage> {
        let mut image = image;
        let mut rotations = 0;

        loop {
            let heatmap = {
                let _span = tracing::info_span!("heatmap").entered();
                Heatmap::from_image(&image)
            };
            let geometry = {
                let _span = tracing::info_span!("locate_band").entered();
                locate_band(&heatmap, self.config.threshold_fraction)?
            };
            let alignment = {
                let _span = tracing::info_span!("check_alignment").entered();
                check_alignment(&heatmap, &geometry)?
            };

            info!(
                l_edge = geometry.l_edge,
                r_edge = geometry.r_edge,
                t_edge = geometry.t_edge,
                b_edge = geometry.b_edge,
                tilt_deg = alignment.tilt_angle,
                "Located reference band"
            );

            let within = alignment.is_within(self.config.tilt_tolerance);
            if within {
                info!("Alignment check passed");
            } else {
                warn!(
                    tilt_deg = alignment.tilt_angle,
                    slope = alignment.slope,
                    "Image tilt outside permitted range"
                );
            }

            if within {
                return Ok(AlignedImage {
                    image,
                    heatmap,
                    geometry,
                    alignment,
                    rotations,
                    tilt_accepted: false,
                });
            }

            if rotations < self.config.max_rotation_retries {
                match &self.rotator {
                    Some(rotator) => {
                        let prompt = Prompt::RotateTiltedImage {
                            tilt_deg: alignment.tilt_angle,
                            correction_deg: alignment.correction_angle(),
                        };
                        if confirmer.confirm(&prompt) {
                            let rotated = {
                                let _span = tracing::info_span!("rotate").entered();
                                rotator.rotate(&image, alignment.correction_angle())?
                            };
                            image = rotated;
                            rotations += 1;
                            continue;
                        }
                    }
                    None => warn!("No rotation service available; rotate the image manually"),
                }
            }

            let prompt = Prompt::ContinueWithTilt {
                tilt_deg: alignment.tilt_angle,
            };
            if confirmer.confirm(&prompt) {
                warn!(
                    tilt_deg = alignment.tilt_angle,
                    "Continuing with tilted image; measurement error may be significant"
                );
                return Ok(AlignedImage {
                    image,
                    heatmap,
                    geometry,
                    alignment,
                    rotations,
                    tilt_accepted: true,
                });
            }
            return Err(alignment.out_of_tolerance());
        }
    }

    /// Runs every stage on a decoded image and integrates the sample profile.
    #[instrument(skip_all)]
    pub fn analyze_image(&self, image: RgbImage, confirmer: &dyn Confirmer) -> Result<SpectralAnalysis> {
        let image = self.check_orientation(image, confirmer)?;
        let aligned = self.align(image, confirmer)?;

        let extraction = {
            let _span = tracing::info_span!("extract_spectrum").entered();
            extract_spectrum(&aligned.image, &aligned.geometry, &self.config.extraction_options())?
        };

        let (wl_low, wl_high) = self.config.wavelength_window();
        let intensity = {
            let _span = tracing::info_span!("integrate_intensity", wl_low, wl_high).entered();
            integrate_intensity(
                &extraction.normalized,
                &extraction.wavelengths,
                self.config.intensity_channel,
                wl_low,
                wl_high,
            )?
        };

        info!(
            channel = %self.config.intensity_channel,
            rows = intensity.count,
            average = intensity.average,
            "Integrated sample intensity"
        );

        Ok(SpectralAnalysis {
            aligned,
            extraction,
            intensity,
        })
    }

    #[instrument(skip_all, fields(input_size = input_data.len()))]
    pub fn analyze(&self, input_data: &[u8], confirmer: &dyn Confirmer) -> Result<SpectralAnalysis> {
        let image = {
            let _span = tracing::info_span!("decode_image").entered();
            self.reader.read_image(input_data)?
        };
        self.analyze_image(image, confirmer)
    }

    #[instrument(skip(self, input_path, confirmer))]
    pub fn analyze_file<P: AsRef<Path>>(
        &self,
        input_path: P,
        confirmer: &dyn Confirmer,
    ) -> Result<SpectralAnalysis> {
        let input_path = input_path.as_ref();
        info!(input = %input_path.display(), "Analyzing file");

        let input_data = {
            let _span = tracing::info_span!("read_input_file").entered();
            std::fs::read(input_path).map_err(|e| {
                AnalysisError::InputReadError(format!("{}: {}", input_path.display(), e))
            })?
        };

        let analysis = self.analyze(&input_data, confirmer)?;

        if self.config.save_rotated && analysis.aligned.rotations > 0 {
            self.save_rotated(input_path, &analysis.aligned.image)?;
        }
        Ok(analysis)
    }

    fn save_rotated(&self, input_path: &Path, image: &RgbImage) -> Result<PathBuf> {
        let writer = TiffImageWriter::new(self.config.rotated_compression);
        let output_path = rotated_path(input_path, writer.extension());

        let mut output_file = std::fs::File::create(&output_path).map_err(|e| {
            AnalysisError::OutputWriteError(format!("{}: {}", output_path.display(), e))
        })?;
        writer.write_image(image, &mut output_file)?;

        info!(output = %output_path.display(), "Rotated image generated and saved");
        Ok(output_path)
    }

    /// Coefficients from the calibration record, else from the confirmer, else the defaults.
    pub fn resolve_coefficients(
        &self,
        confirmer: &dyn Confirmer,
    ) -> Result<(CalibrationCoefficients, CoefficientSource)> {
        let path = &self.config.record_path;
        if path.is_file() {
            let record = CalibrationRecord::read_from(path)?;
            let source = CoefficientSource::Record {
                date: record.date.clone(),
                time: record.time.clone(),
            };
            return Ok((record.coefficients(), source));
        }

        info!(path = %path.display(), "Calibration record not found");
        match confirmer.manual_coefficients() {
            Some(coefficients) => Ok((coefficients, CoefficientSource::Manual)),
            None => Ok((CalibrationCoefficients::default(), CoefficientSource::Default)),
        }
    }

    fn measurement(&self, analysis: SpectralAnalysis, confirmer: &dyn Confirmer) -> Result<Measurement> {
        let (coefficients, source) = self.resolve_coefficients(confirmer)?;
        info!("Using {}", source);

        let concentration = coefficients.concentration(analysis.intensity.average)?;
        info!(concentration, "Nitrate concentration (mg/L)");

        Ok(Measurement {
            analysis,
            coefficients,
            source,
            concentration,
        })
    }

    pub fn measure_image(&self, image: RgbImage, confirmer: &dyn Confirmer) -> Result<Measurement> {
        let analysis = self.analyze_image(image, confirmer)?;
        self.measurement(analysis, confirmer)
    }

    pub fn measure_file<P: AsRef<Path>>(
        &self,
        input_path: P,
        confirmer: &dyn Confirmer,
    ) -> Result<Measurement> {
        let analysis = self.analyze_file(input_path, confirmer)?;
        self.measurement(analysis, confirmer)
    }

    /// Fits and persists a calibration from images of known concentration.
    #[instrument(skip_all, fields(samples = images.len()))]
    pub fn calibrate_images(
        &self,
        images: Vec<RgbImage>,
        concentrations: &[f64],
        confirmer: &dyn Confirmer,
        sink: Option<&dyn PlotSink>,
    ) -> Result<CalibrationOutcome> {
        check_lengths(images.len(), concentrations.len())?;

        let intensities = images
            .into_iter()
            .enumerate()
            .map(|(index, image)| {
                let _span = tracing::info_span!("calibration_sample", index).entered();
                Ok(self.analyze_image(image, confirmer)?.intensity.average)
            })
            .collect::<Result<Vec<f64>>>()?;

        self.finish_calibration(intensities, concentrations, confirmer, sink)
    }

    #[instrument(skip_all, fields(samples = input_paths.len()))]
    pub fn calibrate_files<P: AsRef<Path>>(
        &self,
        input_paths: &[P],
        concentrations: &[f64],
        confirmer: &dyn Confirmer,
        sink: Option<&dyn PlotSink>,
    ) -> Result<CalibrationOutcome> {
        check_lengths(input_paths.len(), concentrations.len())?;

        let intensities = input_paths
            .iter()
            .map(|path| Ok(self.analyze_file(path, confirmer)?.intensity.average))
            .collect::<Result<Vec<f64>>>()?;

        self.finish_calibration(intensities, concentrations, confirmer, sink)
    }

    fn finish_calibration(
        &self,
        intensities: Vec<f64>,
        concentrations: &[f64],
        confirmer: &dyn Confirmer,
        sink: Option<&dyn PlotSink>,
    ) -> Result<CalibrationOutcome> {
        let coefficients = CalibrationCoefficients::fit(&intensities, concentrations)?;
        info!(k = coefficients.k, b = coefficients.b, "Fitted calibration");

        let mut record_path = self.config.record_path.clone();
        if record_path.exists() {
            let prompt = Prompt::OverwriteRecord {
                path: record_path.clone(),
            };
            if !confirmer.confirm(&prompt) {
                record_path = confirmer
                    .alternate_record_path(&record_path)
                    .ok_or_else(|| AnalysisError::RecordExists(record_path.display().to_string()))?;
            }
        }

        let record = CalibrationRecord::new(coefficients);
        info!(path = %record_path.display(), "Writing calibration record");
        record.write_to(&record_path)?;

        let plot = match sink {
            Some(sink) => {
                let (wl_low, wl_high) = self.config.wavelength_window();
                let plot = AbsorbancePlot::from_samples(concentrations, &intensities, wl_low, wl_high)?;
                sink.present(&plot)?;
                Some(plot)
            }
            None => None,
        };

        Ok(CalibrationOutcome {
            coefficients,
            intensities,
            record,
            record_path,
            plot,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: AnalysisConfig) {
        self.config = config;
    }
}

fn check_lengths(images: usize, concentrations: usize) -> Result<()> {
    if images != concentrations {
        return Err(AnalysisError::LengthMismatch {
            images,
            concentrations,
        });
    }
    Ok(())
}

/// `dir/photo.jpg` becomes `dir/photo_rot.<extension>`.
fn rotated_path(input_path: &Path, extension: &str) -> PathBuf {
    let stem = input_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    input_path.with_file_name(format!("{stem}_rot.{extension}"))
}
