// Result rendering for the terminal

use sizeup_core::{render, Analysis, ObjectSizePrior, DEFAULT_PRIOR};

pub fn print_analysis(analysis: &Analysis, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(analysis)?);
    } else {
        println!("✅ Analysis results ({} detector)", source_name(analysis));
        print!("{}", render(analysis));
    }
    Ok(())
}

fn source_name(analysis: &Analysis) -> &'static str {
    match analysis.source {
        sizeup_core::SourceKind::Local => "local",
        sizeup_core::SourceKind::Remote => "remote",
    }
}

pub fn print_priors() {
    println!("{:<16} {:>10} {:>10}", "class", "height m", "width m");
    for (name, prior) in ObjectSizePrior::all() {
        println!("{:<16} {:>10.2} {:>10.2}", name, prior.height, prior.width);
    }
    println!(
        "{:<16} {:>10.2} {:>10.2}",
        "(default)", DEFAULT_PRIOR.height, DEFAULT_PRIOR.width
    );
}
