//! Goal Cascade CLI
//!
//! Plans a goal over the configured tool catalog and runs the plan. Reports
//! and plans are printed as JSON on stdout; logs go to stderr.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use goal_cascade::{ConfigManager, Orchestrator, TaskContext, DEFAULT_CONFIG_PATH};

/// Goal Cascade - plan a goal and run it over a tool catalog
#[derive(Parser)]
#[command(name = "goal-cascade")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Turn a goal into a multi-step tool plan and execute it")]
#[command(long_about = r#"
Goal Cascade asks a planning model to break a goal into tasks over a fixed
catalog of tools, then runs the tasks in order. Each task sees the results
of the tasks it depends on. A failing task is reported and the run goes on.

Examples:
  goal-cascade run "帮我规划一次去成都的3天旅行"
  goal-cascade run "分析这张图片" --image ./photo.png
  goal-cascade plan "Plan a 2 day trip to Hefei" > plan.json
  goal-cascade execute plan.json
  goal-cascade tools
"#)]
struct Cli {
    /// Configuration file
    #[arg(short, long, env = "GOAL_CASCADE_CONFIG", default_value = DEFAULT_CONFIG_PATH, global = true)]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan and execute a goal, printing the report
    Run {
        /// What you want done
        goal: String,

        /// Initial context entry (key=value, value parsed as JSON when possible)
        #[arg(long = "context", value_name = "KEY=VALUE")]
        context: Vec<String>,

        /// Image for the vision analyzer (sets `image_path`)
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Generate a plan without executing it
    Plan {
        /// What you want done
        goal: String,

        #[arg(long = "context", value_name = "KEY=VALUE")]
        context: Vec<String>,

        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Execute a saved plan file (a JSON array of tasks, or {"plan": [...]})
    Execute {
        plan_file: PathBuf,

        #[arg(long = "context", value_name = "KEY=VALUE")]
        context: Vec<String>,

        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// List the tool catalog
    Tools,

    /// Check the configuration for missing settings
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("goal_cascade={0},goal_cascade_tools={0},warn", log_level).into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let manager = ConfigManager::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    match cli.command {
        Commands::Run {
            goal,
            context,
            image,
        } => {
            let context = build_context(&context, image)?;
            let orchestrator = Orchestrator::from_config(manager)?;
            let report = orchestrator.run_goal(&goal, &context).await;
            println!("{}", report.to_json_pretty()?);
        }
        Commands::Plan {
            goal,
            context,
            image,
        } => {
            let context = build_context(&context, image)?;
            let orchestrator = Orchestrator::from_config(manager)?;
            let plan = orchestrator.plan(&goal, &context).await;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Commands::Execute {
            plan_file,
            context,
            image,
        } => {
            let context = build_context(&context, image)?;
            let content = std::fs::read_to_string(&plan_file)
                .with_context(|| format!("failed to read {}", plan_file.display()))?;
            let value: Value = serde_json::from_str(&content)
                .with_context(|| format!("{} is not valid JSON", plan_file.display()))?;
            let plan = match value {
                Value::Object(mut object) if object.contains_key("plan") => {
                    object.remove("plan").unwrap_or(Value::Null)
                }
                other => other,
            };

            let orchestrator = Orchestrator::from_config(manager)?;
            let report = orchestrator.execute_plan_value(&plan, &context).await;
            println!("{}", report.to_json_pretty()?);
        }
        Commands::Tools => {
            let catalog = manager.tool_catalog()?;
            for spec in catalog.iter() {
                println!("{}\t{} (provider: {}, page: {})", spec.name, spec.description, spec.provider, spec.page);
            }
        }
        Commands::CheckConfig => {
            let problems = manager.validate();
            let planner_page = &manager.config().planner.page;
            let key = manager.resolve_api_key(planner_page);
            println!("config: {}", cli.config.display());
            println!("planner page: {}", planner_page);
            println!("planner base url: {}", manager.resolve_base_url(planner_page));
            println!("planner api key: {}", manager.mask_api_key(&key));
            if problems.is_empty() {
                println!("configuration OK");
            } else {
                for problem in &problems {
                    println!("problem: {}", problem);
                }
                bail!("{} configuration problem(s)", problems.len());
            }
        }
    }

    Ok(())
}

/// Build the initial context from `key=value` pairs and an optional image.
fn build_context(pairs: &[String], image: Option<PathBuf>) -> Result<TaskContext> {
    let mut context = TaskContext::new();
    for pair in pairs {
        let Some((key, raw)) = pair.split_once('=') else {
            bail!("context entry '{}' must look like key=value", pair);
        };
        let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        context.insert(key.trim(), value);
    }
    if let Some(path) = image {
        context.insert("image_path", path.display().to_string());
    }
    Ok(context)
}
