//! Profile listing.

use console::style;

use ocrsweep::config::ConversionSettings;
use ocrsweep::models::{OcrMode, Profile};

fn describe(profile: &Profile) -> String {
    let mut parts = Vec::new();
    if let Some(psm) = profile.psm {
        parts.push(format!("psm {}", psm));
    }
    if let Some(dpi) = profile.oversample {
        parts.push(format!("{} dpi", dpi));
    }
    if let Some(t) = profile.thresholding {
        parts.push(t.as_str().to_string());
    }
    if profile.remove_background {
        parts.push("remove-background".to_string());
    }
    if profile.remove_vectors {
        parts.push("remove-vectors".to_string());
    }
    if profile.clean {
        parts.push("clean".to_string());
    }
    if parts.is_empty() {
        "engine defaults".to_string()
    } else {
        parts.join(", ")
    }
}

/// Print the profiles a conversion runs in the given mode.
pub fn cmd_profiles(standard: bool) {
    let mode = OcrMode::from_drawing_flag(!standard);
    let settings = ConversionSettings {
        drawing_mode: mode.is_drawing(),
        ..Default::default()
    };

    println!("{} {} mode", style("→").cyan(), mode);
    println!("\n{}", style("Primary attempts").bold());
    for (i, profile) in Profile::primary_set(mode).iter().enumerate() {
        println!("  {}. {:<18} {}", i + 1, profile.name, describe(profile));
    }

    println!("\n{}", style("Rescue passes (deep verify)").bold());
    for profile in [Profile::rescue(mode), Profile::secondary_rescue(mode)] {
        println!("  -  {:<18} {}", profile.name, describe(&profile));
    }

    println!(
        "\n  {} up to {} attempts per page",
        style("→").dim(),
        settings.planned_attempts()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_profiles() {
        assert_eq!(describe(&Profile::standard()), "engine defaults");
        let rescue = describe(&Profile::rescue(OcrMode::Drawing));
        assert!(rescue.starts_with("psm 11, 750 dpi, sauvola"));
        assert!(rescue.contains("remove-vectors"));
    }
}
