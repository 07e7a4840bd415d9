use colored::*;

pub fn print_banner() {
    println!("{}", "Compliance Navigator".cyan().bold());
    println!("{}", "Local audit-and-remediation pipeline for SOC 2 / HIPAA\n".green());
}

pub fn print_success(message: &str) {
    println!("{} {}", "OK".green().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "ERROR".red().bold(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "WARN".yellow().bold(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "INFO".blue().bold(), message);
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
