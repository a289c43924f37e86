//! External tool check.

use console::style;

use ocrsweep::config::Config;
use ocrsweep_analysis::tools::check_tools;
use ocrsweep_analysis::PipelineError;

/// Report every external executable and fail if any is missing.
pub fn cmd_check(config: &Config) -> anyhow::Result<()> {
    let statuses = check_tools(&config.tools);
    let mut missing = Vec::new();

    for status in &statuses {
        match &status.path {
            Some(path) => println!(
                "{} {:<10} {}",
                style("✓").green(),
                status.name,
                style(path.display()).dim()
            ),
            None => {
                println!(
                    "{} {:<10} not found (install {})",
                    style("✗").red(),
                    status.name,
                    status.hint
                );
                missing.push(format!("{} (install {})", status.program, status.hint));
            }
        }
    }

    if missing.is_empty() {
        println!("{} All tools available", style("✓").green());
        Ok(())
    } else {
        Err(PipelineError::MissingTools(missing.join(", ")).into())
    }
}
