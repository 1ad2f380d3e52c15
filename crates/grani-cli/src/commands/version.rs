//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - comparator sorts and Grover search on quantum backends",
        style("Grani").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  grani-ir           Circuit intermediate representation");
    println!("  grani-hal          Hardware abstraction layer");
    println!("  grani-adapter-sim  Local statevector simulator");
    println!("  grani-adapter-ibm  IBM Quantum adapter (feature `ibm`)");
    println!("  grani-cli          Command-line interface");
    println!();
    println!(
        "Repository: {}",
        style("https://github.com/hiq-lab/grani").underlined()
    );
    println!("License:    {}", style("Apache-2.0").dim());
}
