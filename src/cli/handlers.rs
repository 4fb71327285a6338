// FILE: src/cli/handlers.rs
use crate::{
    check_css_source, check_html_source, cli::OutputFormat, default_target_browsers, CheckOptions,
    CompatError, Issue, Result, TargetBrowser, WebCompat,
};

use clap::ArgMatches;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

type CheckFn = fn(&WebCompat, &str, &[TargetBrowser], &CheckOptions) -> Result<Vec<Issue>>;

#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    issues: Vec<Issue>,
}

// --- CSS ---
pub fn handle_css_command(cli: &super::EnhancedCli, matches: &ArgMatches) -> Result<()> {
    check_command(cli, matches, check_css_source)
}

// --- HTML ---
pub fn handle_html_command(cli: &super::EnhancedCli, matches: &ArgMatches) -> Result<()> {
    check_command(cli, matches, check_html_source)
}

fn check_command(cli: &super::EnhancedCli, matches: &ArgMatches, check: CheckFn) -> Result<()> {
    let input_path = required_arg(matches, "input")?;
    let format = output_format(matches);

    let engine = cli.load_engine(matches)?;
    let browsers = cli.build_target_browsers(engine.database(), matches)?;
    let options = cli.build_check_options(matches);
    log::info!(
        "Checking against {} browser releases (values: {}, unknown browsers: {})",
        browsers.len(),
        options.css_values,
        options.flag_unknown_browsers
    );

    let files = if matches.get_flag("recursive") && Path::new(input_path).is_dir() {
        collect_json_files(input_path)?
    } else {
        vec![PathBuf::from(input_path)]
    };

    let mut reports = Vec::new();
    let mut error_files = 0;

    for file in &files {
        let display = file.display().to_string();
        let result = fs::read_to_string(file)
            .map_err(|e| CompatError::FileNotFound {
                path: format!("{}: {}", display, e),
            })
            .and_then(|source| check(&engine, &source, &browsers, &options));

        match result {
            Ok(issues) => {
                if format == OutputFormat::Text {
                    print_text_report(&display, &issues);
                }
                reports.push(FileReport {
                    file: display,
                    issues,
                });
            }
            Err(e) => {
                eprintln!("❌ {} - {}", display, e);
                error_files += 1;
            }
        }
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        OutputFormat::Text if files.len() > 1 => {
            print_summary(&reports, files.len(), error_files, cli.elapsed_ms());
        }
        OutputFormat::Text => {}
    }

    if error_files > 0 {
        Err(CompatError::format(format!("{} files could not be checked", error_files)))
    } else {
        Ok(())
    }
}

fn collect_json_files(dir_path: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in walkdir::WalkDir::new(dir_path).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            CompatError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Directory traversal error: {}", e),
            ))
        })?;
        if entry.file_type().is_file()
            && entry.path().extension().map_or(false, |ext| ext == "json")
        {
            files.push(entry.into_path());
        }
    }

    log::debug!("Found {} JSON files under {}", files.len(), dir_path);
    Ok(files)
}

fn print_text_report(file: &str, issues: &[Issue]) {
    if issues.is_empty() {
        println!("✅ {} - No issues found", file);
        return;
    }

    println!("🔍 {} - {} issues", file, issues.len());
    for issue in issues {
        println!("   ⚠️  {}", issue);
    }
}

fn print_summary(reports: &[FileReport], total_files: usize, error_files: usize, elapsed_ms: u128) {
    let issue_count: usize = reports.iter().map(|r| r.issues.len()).sum();
    let files_with_issues = reports.iter().filter(|r| !r.issues.is_empty()).count();

    println!("\n📊 Check Summary:");
    println!("   Total files: {}", total_files);
    println!("   Files with issues: {}", files_with_issues);
    println!("   Total issues: {}", issue_count);
    if error_files > 0 {
        println!("   Files with errors: {}", error_files);
    }
    println!("   Time: {}ms", elapsed_ms);
}

// --- BROWSERS ---
pub fn handle_browsers_command(cli: &super::EnhancedCli, matches: &ArgMatches) -> Result<()> {
    let engine = cli.load_engine(matches)?;
    let browsers = default_target_browsers(engine.database());

    match output_format(matches) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&browsers)?),
        OutputFormat::Text => {
            println!("🌐 Default target browsers:");
            for browser in &browsers {
                match browser.status {
                    Some(status) => println!("   {} ({})", browser, status.as_str()),
                    None => println!("   {}", browser),
                }
            }
        }
    }

    Ok(())
}

fn required_arg<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(id)
        .map(|s| s.as_str())
        .ok_or_else(|| CompatError::format(format!("Missing required argument '{}'", id)))
}

fn output_format(matches: &ArgMatches) -> OutputFormat {
    matches
        .get_one::<OutputFormat>("format")
        .copied()
        .unwrap_or(OutputFormat::Text)
}
