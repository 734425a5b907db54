use std::path::Path;
use std::path::PathBuf;

pub fn run(file: &Path, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let text = std::fs::read_to_string(file)?;
    let review = switchboard_quality::score_with_threshold(&text, config.quality.pass_threshold);

    println!(
        "overall: {:.1} / 100  — {}",
        review.overall,
        if review.passed { "PASS" } else { "FAIL" }
    );
    let d = &review.dimensions;
    println!("  structure        {:>3}", d.structure);
    println!("  factual density  {:>3}", d.factual_density);
    println!("  attribution      {:>3}", d.attribution);
    println!("  formatting       {:>3}", d.formatting);
    println!("  depth            {:>3}", d.depth);
    println!("  register         {:>3}", d.register);

    if !review.issues.is_empty() {
        println!("\nissues:");
        for issue in &review.issues {
            println!(
                "  [{}] {} — {}",
                format!("{:?}", issue.severity).to_lowercase(),
                issue.description,
                issue.suggestion
            );
        }
    }

    if !review.passed {
        std::process::exit(1);
    }
    Ok(())
}
