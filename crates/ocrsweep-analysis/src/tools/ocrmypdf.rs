//! ocrmypdf adapter.

use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use super::{run_tool, OcrEngine, OcrRequest, ToolError};

/// Command-line arguments for one ocrmypdf run.
pub fn build_args(input: &Path, output: &Path, request: &OcrRequest) -> Vec<OsString> {
    let profile = &request.profile;
    let mut args: Vec<OsString> = vec![
        "--language".into(),
        request.language.clone().into(),
        "--output-type".into(),
        "pdf".into(),
        "--optimize".into(),
        request.optimize.to_string().into(),
        "--jobs".into(),
        request.jobs.to_string().into(),
    ];

    args.push(if request.force_ocr { "--force-ocr" } else { "--skip-text" }.into());
    if request.rotate_pages {
        args.push("--rotate-pages".into());
    }
    if request.deskew {
        args.push("--deskew".into());
    }
    if let Some(psm) = profile.psm {
        args.push("--tesseract-pagesegmode".into());
        args.push(psm.to_string().into());
    }
    if let Some(dpi) = profile.oversample {
        args.push("--oversample".into());
        args.push(dpi.to_string().into());
    }
    for (enabled, flag) in [
        (profile.remove_background, "--remove-background"),
        (profile.clean, "--clean"),
        (profile.clean_final, "--clean-final"),
        (profile.remove_vectors, "--remove-vectors"),
    ] {
        if enabled {
            args.push(flag.into());
        }
    }
    if let Some(mode) = profile.thresholding {
        args.push("--tesseract-thresholding".into());
        args.push(mode.as_str().into());
    }
    if request.quiet {
        args.push("--quiet".into());
    }

    args.push(input.into());
    args.push(output.into());
    args
}

/// Runs the `ocrmypdf` executable.
pub struct OcrMyPdf {
    program: String,
}

impl OcrMyPdf {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for OcrMyPdf {
    fn default() -> Self {
        Self::new("ocrmypdf")
    }
}

impl OcrEngine for OcrMyPdf {
    fn run_ocr(&self, input: &Path, output: &Path, request: &OcrRequest) -> Result<(), ToolError> {
        let mut command = Command::new(&self.program);
        command.args(build_args(input, output, request));
        run_tool("ocrmypdf", "ocrmypdf", &mut command)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocrsweep::config::ConversionSettings;
    use ocrsweep::models::{OcrMode, Profile};

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_standard_profile_args() {
        let request = OcrRequest::new(&ConversionSettings::default(), &Profile::standard());
        let args = strings(build_args(Path::new("in.pdf"), Path::new("out.pdf"), &request));
        assert_eq!(
            args,
            vec![
                "--language", "rus+eng", "--output-type", "pdf", "--optimize", "1", "--jobs",
                "1", "--force-ocr", "--rotate-pages", "--deskew", "in.pdf", "out.pdf",
            ]
        );
    }

    #[test]
    fn test_drawing_profile_args() {
        let settings = ConversionSettings {
            rotate_pages: false,
            deskew: false,
            quiet: true,
            ..Default::default()
        };
        let profile = Profile::secondary_rescue(OcrMode::Drawing);
        let request = OcrRequest::new(&settings, &profile);
        let args = strings(build_args(Path::new("a.pdf"), Path::new("b.pdf"), &request));
        let tail: Vec<&str> = args[9..].iter().map(String::as_str).collect();
        assert_eq!(
            tail,
            vec![
                "--tesseract-pagesegmode",
                "6",
                "--oversample",
                "900",
                "--remove-background",
                "--remove-vectors",
                "--tesseract-thresholding",
                "adaptive-otsu",
                "--quiet",
                "a.pdf",
                "b.pdf",
            ]
        );
    }

    #[test]
    fn test_skip_text() {
        let mut request = OcrRequest::new(&ConversionSettings::default(), &Profile::standard());
        request.force_ocr = false;
        let args = strings(build_args(Path::new("a.pdf"), Path::new("b.pdf"), &request));
        assert!(args.contains(&"--skip-text".to_string()));
        assert!(!args.contains(&"--force-ocr".to_string()));
    }
}
