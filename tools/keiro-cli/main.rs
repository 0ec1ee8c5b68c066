use clap::{Parser, Subcommand};
use keiro::prelude::*;
use std::fs;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Validates automation plans and compiles them into workflow graphs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run structural and semantic validation and print every problem found
    Validate {
        /// Path to the plan JSON file
        plan_path: String,
        #[command(flatten)]
        environment: Environment,
    },
    /// Compile a plan and print (or write) the resulting workflow
    Compile {
        /// Path to the plan JSON file
        plan_path: String,
        #[command(flatten)]
        environment: Environment,
        /// Write the workflow to this file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Collaborators and settings shared by both subcommands.
#[derive(clap::Args, Debug)]
struct Environment {
    /// JSON file with custom action definitions ({"global": [...], "orgs": {...}})
    #[arg(short, long)]
    actions: Option<String>,
    /// Host an HTTP step may call; `*.example.com` allows every subdomain. Repeatable.
    #[arg(long = "allow-host")]
    allow_hosts: Vec<String>,
    /// JSON configuration file for compiler and layout options
    #[arg(short, long)]
    config: Option<String>,
    /// Organization the plan belongs to
    #[arg(long, default_value = "default")]
    org: String,
}

struct Loaded {
    plan: Plan,
    pipeline: Pipeline,
    ctx: RequestContext,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("keiro=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Validate {
            plan_path,
            environment,
        } => run_validate(&plan_path, environment),
        Command::Compile {
            plan_path,
            environment,
            output,
        } => run_compile(&plan_path, environment, output),
    }
}

fn load(plan_path: &str, environment: Environment) -> Loaded {
    let json = fs::read_to_string(plan_path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read plan file '{}': {}", plan_path, e))
    });

    let plan = parse_plan_str(&json).unwrap_or_else(|errors| {
        eprintln!("Plan failed structural validation:");
        for error in &errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(1);
    });

    let config = match &environment.config {
        Some(path) => KeiroConfig::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&e.to_string())),
        None => KeiroConfig::default(),
    };
    let actions = match &environment.actions {
        Some(path) => StaticActionRegistry::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&e.to_string())),
        None => StaticActionRegistry::new(),
    };
    let hosts = StaticHostAllowlist::new(environment.allow_hosts.iter().map(String::as_str));

    Loaded {
        plan,
        pipeline: Pipeline::new(Arc::new(actions), Arc::new(hosts), config),
        ctx: RequestContext::new(environment.org),
    }
}

fn validate(loaded: &Loaded) -> ValidationReport {
    futures::executor::block_on(loaded.pipeline.validator().validate(&loaded.plan, &loaded.ctx))
}

fn run_validate(plan_path: &str, environment: Environment) {
    let loaded = load(plan_path, environment);
    let report = validate(&loaded);

    if report.valid {
        println!(
            "Plan '{}' is valid ({} steps).",
            loaded.plan.name,
            loaded.plan.total_steps()
        );
        return;
    }
    print_issues(&report);
    std::process::exit(1);
}

fn run_compile(plan_path: &str, environment: Environment, output: Option<String>) {
    let loaded = load(plan_path, environment);

    // --- 1. Semantic validation ---
    let report = validate(&loaded);
    if !report.valid {
        print_issues(&report);
        std::process::exit(1);
    }

    // --- 2. Compilation and layout ---
    let compile_start = Instant::now();
    let result = futures::executor::block_on(
        loaded.pipeline.compiler().compile(&loaded.plan, &loaded.ctx),
    )
    .unwrap_or_else(|e| {
        let report = serde_json::to_string_pretty(&e.report()).unwrap_or_else(|_| e.to_string());
        exit_with_error(&format!("[{}] compilation failed\n{}", e.code(), report))
    });
    let compile_duration = compile_start.elapsed();

    for issue in check_layout(&result.workflow.nodes) {
        tracing::warn!(%issue, "layout issue");
    }

    // --- 3. Output ---
    let json = result
        .to_json()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize workflow: {}", e)));
    match output {
        Some(path) => {
            fs::write(&path, json).unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to write workflow to '{}': {}", path, e))
            });
            eprintln!(
                "Compiled '{}' into {} nodes in {:?} -> {}",
                result.name,
                result.workflow.nodes.len(),
                compile_duration,
                path
            );
        }
        None => println!("{}", json),
    }
}

fn print_issues(report: &ValidationReport) {
    eprintln!("Plan failed semantic validation:");
    for issue in &report.issues {
        eprintln!("  - {}", issue);
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
