use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;

use md_syntax_helper::rule::{CheckResult, Rule, RuleRegistry};
use md_syntax_helper::utils::discover::expand_inputs;

#[derive(Parser)]
#[command(name = "md-syntax-helper")]
#[command(about = "Helper tool for checking and fixing Markdown content")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check files for known problems
    Check {
        /// Input files, directories, or glob patterns like "content/**/*.md"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Rules to check (defaults to "all")
        #[arg(short = 'r', long = "rule", default_values_t = vec!["all".to_string()])]
        rule: Vec<String>,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Output results as JSONL
        #[arg(long)]
        json: bool,

        /// Save detailed results to file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Cap the number of files visited
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Convert/fix problems in files (dry-run unless --in-place)
    Convert {
        /// Input files, directories, or glob patterns like "content/**/*.md"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Rules to apply ("all" runs every non-lossy rule; image-paths
        /// must be named explicitly)
        #[arg(short = 'r', long = "rule", default_values_t = vec!["all".to_string()])]
        rule: Vec<String>,

        /// Write changes back to the file(s)
        #[arg(short, long)]
        in_place: bool,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Cap the number of files visited
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List all available rules
    ListRules,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", "ERROR:".red());
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let registry = RuleRegistry::new()?;

    match cli.command {
        Commands::Check {
            inputs,
            rule: rule_names,
            verbose,
            json,
            output,
            limit,
        } => {
            let file_paths = expand_inputs(&inputs, limit)?;
            let rules = resolve_rules(&registry, &rule_names, false)?;

            let mut all_results = Vec::new();

            for file_path in file_paths {
                if verbose && !json {
                    println!("Checking: {}", file_path.display());
                }

                for rule in &rules {
                    match rule.check(&file_path, verbose && !json) {
                        Ok(results) => {
                            for result in results {
                                if !json && result.has_issue {
                                    println!(
                                        "  {} {}",
                                        "✗".red(),
                                        result.message.clone().unwrap_or_default()
                                    );
                                }
                                all_results.push(result);
                            }
                        }
                        Err(e) => {
                            eprintln!("  {} Error checking {}: {}", "✗".red(), rule.name(), e);
                        }
                    }
                }
            }

            if !json && !all_results.is_empty() {
                print_check_summary(&all_results);
            }

            if json {
                for result in &all_results {
                    println!("{}", serde_json::to_string(result)?);
                }
            }

            if let Some(output_path) = output {
                let mut output_str = String::new();
                for result in &all_results {
                    output_str.push_str(&serde_json::to_string(result)?);
                    output_str.push('\n');
                }
                std::fs::write(output_path, output_str)?;
            }

            let any_issue = all_results.iter().any(|r| r.has_issue);
            Ok(if any_issue {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            })
        }

        Commands::Convert {
            inputs,
            rule: rule_names,
            in_place,
            verbose,
            limit,
        } => {
            let file_paths = expand_inputs(&inputs, limit)?;
            let rules = resolve_rules(&registry, &rule_names, true)?;

            let mut changed_any = false;
            let mut failures = 0usize;

            for file_path in file_paths {
                // A broken file must not sink the rest of the batch.
                let mut file_changed = false;
                let mut details = Vec::new();
                let mut failed = false;

                for rule in &rules {
                    match rule.convert(&file_path, in_place, !in_place, verbose) {
                        Ok(result) => {
                            file_changed = file_changed || result.changed;
                            if let Some(msg) = result.message {
                                details.push(msg);
                            }
                        }
                        Err(e) => {
                            eprintln!("{}: {} failed: {e:#}", file_path.display(), rule.name());
                            failed = true;
                        }
                    }
                }

                if failed {
                    failures += 1;
                    continue;
                }

                changed_any = changed_any || file_changed;
                let status = if file_changed { "updated" } else { "no changes" };
                if details.is_empty() {
                    println!("{}: {status}", file_path.display());
                } else {
                    println!("{}: {status}; {}", file_path.display(), details.join("; "));
                }
            }

            if !in_place && changed_any {
                println!("\n(dry-run) Re-run with --in-place to apply changes.");
            }

            Ok(if failures > 0 {
                ExitCode::from(2)
            } else if changed_any {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            })
        }

        Commands::ListRules => {
            println!("{}", "Available rules:".bold());
            for name in registry.list_names() {
                let rule = registry.get(&name)?;
                println!("  {} - {}", name.cyan(), rule.description());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn resolve_rules(
    registry: &RuleRegistry,
    names: &[String],
    for_convert: bool,
) -> Result<Vec<std::sync::Arc<dyn Rule + Send + Sync>>> {
    if names.len() == 1 && names[0] == "all" {
        Ok(if for_convert {
            registry.convert_defaults()
        } else {
            registry.all()
        })
    } else {
        let mut rules = Vec::new();
        for name in names {
            rules.push(registry.get(name)?);
        }
        Ok(rules)
    }
}

fn print_check_summary(results: &[CheckResult]) {
    use std::collections::{HashMap, HashSet};

    let unique_files: HashSet<&str> = results.iter().map(|r| r.file_path.as_str()).collect();
    let total_files = unique_files.len();

    let mut files_with_issues = HashSet::new();
    let mut total_issues = 0;
    let mut issues_by_rule: HashMap<String, usize> = HashMap::new();

    for result in results {
        if result.has_issue {
            files_with_issues.insert(&result.file_path);
            total_issues += result.issue_count;
            *issues_by_rule.entry(result.rule_name.clone()).or_insert(0) += result.issue_count;
        }
    }

    let files_with_issues_count = files_with_issues.len();
    let files_clean = total_files - files_with_issues_count;

    println!("\n{}", "=== Summary ===".bold());
    println!("Total files:         {}", total_files);
    println!(
        "Files with issues:   {} {}",
        files_with_issues_count,
        if files_with_issues_count > 0 {
            "✗".red()
        } else {
            "✓".green()
        }
    );
    println!("Clean files:         {} {}", files_clean, "✓".green());

    if !issues_by_rule.is_empty() {
        println!("\n{}", "Issues by rule:".bold());
        let mut rule_names: Vec<_> = issues_by_rule.keys().collect();
        rule_names.sort();
        for rule_name in rule_names {
            println!("  {}: {} issue(s)", rule_name.cyan(), issues_by_rule[rule_name]);
        }
    }

    println!("\nTotal issues found:  {}", total_issues);
}
