//! Subcommand implementations.

pub mod check;
pub mod convert;
pub mod ocr;
pub mod profiles;

use std::path::PathBuf;

use clap::Args;

use ocrsweep::config::{ConversionOverrides, PageSelection};
use ocrsweep::models::{Profile, Thresholding};

/// OCR engine options shared by `convert` and `ocr`.
#[derive(Args, Debug, Clone)]
pub struct EngineFlags {
    /// OCR language(s), `+`-joined (e.g. rus+eng)
    #[arg(short, long, env = "OCRSWEEP_LANG")]
    pub lang: Option<String>,

    /// Output optimization level (0-3)
    #[arg(long)]
    pub optimize: Option<u8>,

    /// OCR engine worker processes per page
    #[arg(short, long)]
    pub jobs: Option<u32>,

    /// Do not auto-rotate pages
    #[arg(long)]
    pub no_rotate_pages: bool,

    /// Do not deskew pages
    #[arg(long)]
    pub no_deskew: bool,

    /// Reduce OCR engine output
    #[arg(short, long)]
    pub quiet: bool,
}

impl EngineFlags {
    fn overrides(&self) -> ConversionOverrides {
        ConversionOverrides {
            language: self.lang.clone(),
            optimize: self.optimize,
            jobs: self.jobs,
            rotate_pages: self.no_rotate_pages.then_some(false),
            deskew: self.no_deskew.then_some(false),
            quiet: self.quiet.then_some(true),
            ..Default::default()
        }
    }
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Scanned PDF to convert
    pub input: PathBuf,

    /// Output PDF (default: <input>_searchable.pdf beside the input)
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub engine: EngineFlags,

    /// Tune for prose scans instead of technical drawings
    #[arg(long)]
    pub standard: bool,

    /// Skip the coverage scan, rescue passes and text injection
    #[arg(long)]
    pub no_deep_verify: bool,

    /// Pages to OCR (e.g. "1,3,7-"); the rest are copied unchanged
    #[arg(short, long)]
    pub pages: Option<String>,

    /// Print the job report as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl ConvertArgs {
    fn overrides(&self) -> anyhow::Result<ConversionOverrides> {
        let pages = self.pages.as_deref().map(PageSelection::parse).transpose()?;
        Ok(ConversionOverrides {
            drawing_mode: self.standard.then_some(false),
            deep_verify: self.no_deep_verify.then_some(false),
            pages,
            ..self.engine.overrides()
        })
    }
}

fn parse_thresholding(s: &str) -> Result<Thresholding, String> {
    Thresholding::from_str(s)
        .ok_or_else(|| format!("'{}' is not one of auto, otsu, adaptive-otsu, sauvola", s))
}

#[derive(Args, Debug)]
pub struct OcrArgs {
    /// PDF to OCR
    pub input: PathBuf,

    /// Output PDF (default: <input>_searchable.pdf beside the input)
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub engine: EngineFlags,

    /// Tesseract page segmentation mode
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=13))]
    pub psm: Option<u8>,

    /// Rasterize at this DPI before OCR
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub oversample: Option<u32>,

    /// Remove page background before OCR
    #[arg(long)]
    pub remove_background: bool,

    /// Clean pages before OCR
    #[arg(long)]
    pub clean: bool,

    /// Keep the cleaned image in the output
    #[arg(long)]
    pub clean_final: bool,

    /// Mask vector graphics before OCR
    #[arg(long)]
    pub remove_vectors: bool,

    /// Binarization: auto, otsu, adaptive-otsu or sauvola
    #[arg(long, value_parser = parse_thresholding)]
    pub thresholding: Option<Thresholding>,

    /// Keep pages that already have text instead of re-running OCR on them
    #[arg(long)]
    pub skip_text: bool,
}

impl OcrArgs {
    fn profile(&self) -> Profile {
        Profile {
            name: "custom".to_string(),
            psm: self.psm,
            oversample: self.oversample,
            remove_background: self.remove_background,
            clean: self.clean,
            clean_final: self.clean_final,
            remove_vectors: self.remove_vectors,
            thresholding: self.thresholding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: TestCommand,
    }

    #[derive(clap::Subcommand)]
    enum TestCommand {
        Convert(ConvertArgs),
        Ocr(OcrArgs),
    }

    #[test]
    fn test_convert_flags_become_overrides() {
        let cli = TestCli::try_parse_from([
            "ocrsweep", "convert", "in.pdf", "--standard", "--no-deskew", "-l", "eng", "-p", "2-3",
        ])
        .unwrap();
        let TestCommand::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        let overrides = args.overrides().unwrap();
        assert_eq!(overrides.drawing_mode, Some(false));
        assert_eq!(overrides.deskew, Some(false));
        assert_eq!(overrides.rotate_pages, None);
        assert_eq!(overrides.deep_verify, None);
        assert_eq!(overrides.language.as_deref(), Some("eng"));
        assert!(overrides.pages.unwrap().contains(3));
    }

    #[test]
    fn test_convert_rejects_bad_pages() {
        let cli = TestCli::try_parse_from(["ocrsweep", "convert", "in.pdf", "--pages", "3-1"]).unwrap();
        let TestCommand::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        assert!(args.overrides().is_err());
    }

    #[test]
    fn test_ocr_profile_flags() {
        let cli = TestCli::try_parse_from([
            "ocrsweep", "ocr", "in.pdf", "--psm", "11", "--oversample", "600", "--thresholding", "sauvola",
            "--remove-vectors",
        ])
        .unwrap();
        let TestCommand::Ocr(args) = cli.command else {
            panic!("expected ocr");
        };
        let profile = args.profile();
        assert_eq!(profile.psm, Some(11));
        assert_eq!(profile.oversample, Some(600));
        assert_eq!(profile.thresholding, Some(Thresholding::Sauvola));
        assert!(profile.remove_vectors);
        assert!(!profile.clean);
    }

    #[test]
    fn test_ocr_rejects_out_of_range_options() {
        assert!(TestCli::try_parse_from(["ocrsweep", "ocr", "in.pdf", "--psm", "14"]).is_err());
        assert!(TestCli::try_parse_from(["ocrsweep", "ocr", "in.pdf", "--oversample", "0"]).is_err());
        assert!(TestCli::try_parse_from(["ocrsweep", "ocr", "in.pdf", "--thresholding", "best"]).is_err());
    }
}
