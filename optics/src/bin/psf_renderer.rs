//! Render the point spread function of a preset telescope model.
//!
//! Computes a monochromatic or broadband PSF for one of the built-in
//! telescope models, prints an ASCII preview, and writes the result as a
//! log-stretched grayscale PNG.

use clap::Parser;
use optics::models::{models as telescope_models, TelescopeModel};
use optics::{Detector, Psf};

/// Command line arguments for the PSF renderer
#[derive(Parser, Debug)]
#[command(version, about = "Telescope PSF Renderer")]
struct Args {
    /// Telescope model: clear-1m, cassegrain-2m4, or segmented-6m5
    #[arg(long, default_value = "cassegrain-2m4")]
    model: String,

    /// Wavelength in microns
    #[arg(long, default_value_t = 1.0)]
    wavelength: f64,

    /// Fractional bandwidth of the source (0 for monochromatic)
    #[arg(long, default_value_t = 0.0)]
    bandwidth: f64,

    /// Number of wavelength samples across the bandwidth
    #[arg(long, default_value_t = 9)]
    nwavelengths: usize,

    /// Pupil sampling in pixels
    #[arg(long, default_value_t = 512)]
    npix: usize,

    /// Detector pixel scale in arcseconds
    #[arg(long, default_value_t = 0.02)]
    pixelscale: f64,

    /// Detector field of view in pixels
    #[arg(long, default_value_t = 256)]
    fov_pixels: usize,

    /// Detector oversampling factor
    #[arg(long, default_value_t = 2)]
    oversample: usize,

    /// Decades of dynamic range in the rendered output
    #[arg(long, default_value_t = 5.0)]
    decades: f64,

    /// Output file path
    #[arg(long, default_value = "psf.png")]
    output: String,
}

fn lookup_model(name: &str) -> Option<TelescopeModel> {
    match name {
        "clear-1m" => Some(telescope_models::CLEAR_1M.clone()),
        "cassegrain-2m4" => Some(telescope_models::CASSEGRAIN_2M4.clone()),
        "segmented-6m5" => Some(telescope_models::SEGMENTED_6M5.clone()),
        _ => None,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let Some(model) = lookup_model(&args.model) else {
        eprintln!("unknown model '{}'", args.model);
        eprintln!("available models: clear-1m, cassegrain-2m4, segmented-6m5");
        std::process::exit(2);
    };

    println!("Telescope PSF Renderer");
    println!("======================");
    println!("Model: {}", model.name);
    println!("Wavelength: {:.3} um", args.wavelength);
    if args.bandwidth > 0.0 {
        println!(
            "Bandwidth: {:.1}% over {} samples",
            args.bandwidth * 100.0,
            args.nwavelengths
        );
    }
    println!("Pupil sampling: {} px", args.npix);
    println!(
        "Detector: {} px at {:.4} arcsec/px, oversample {}",
        args.fov_pixels, args.pixelscale, args.oversample
    );
    println!(
        "Airy radius: {:.4} arcsec",
        model.airy_radius_arcsec(args.wavelength * 1e-6)
    );

    let detector = Detector::new(args.pixelscale, args.fov_pixels)?
        .with_oversample(args.oversample)?;
    let osys = model.optical_system(args.npix, detector)?;

    let center = args.wavelength * 1e-6;
    println!(
        "Native image scale: {:.4} arcsec/px",
        osys.native_image_pixelscale(center)
    );
    let psf: Psf = if args.bandwidth > 0.0 && args.nwavelengths > 1 {
        let n = args.nwavelengths;
        let source: Vec<(f64, f64)> = (0..n)
            .map(|i| {
                let offset = (i as f64 / (n - 1) as f64) - 0.5;
                (center * (1.0 + offset * args.bandwidth), 1.0)
            })
            .collect();
        osys.calc_psf_broadband(&source)?
    } else {
        osys.calc_psf(center)?
    };

    println!(
        "Captured flux: {:.4}  peak pixel: {:.3e}",
        psf.total_intensity(),
        psf.peak()
    );
    println!("{}", viz::ascii_preview(psf.data(), args.decades, 64)?);

    viz::save_png(psf.data(), args.decades, &args.output)?;
    println!("Wrote {}", args.output);
    Ok(())
}
