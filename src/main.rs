//! Command-line driver for the form service.
//!
//! ```bash
//! formpress list
//! formpress submit handover --value "user=Max Muster" --value notebook=X1
//! formpress confirm handover <transient-id> --value "user=Max Muster"
//! formpress fetch handover_Max_Muster_1700000000 -o out.pdf
//! ```

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use formpress::{FormService, ServiceConfig, SubmittedValues};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "formpress")]
#[command(about = "Render form submissions to PDF and manage the results")]
struct Cli {
    /// Service config file (TOML)
    #[arg(long, env = "FORMPRESS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct ValueArgs {
    /// Field value as name=value; repeat a name for multi-select fields
    #[arg(short, long = "value", value_name = "NAME=VALUE")]
    values: Vec<String>,

    /// JSON object of field values (strings or arrays of strings)
    #[arg(long, value_name = "FILE")]
    values_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reload and list all forms
    List,

    /// Print a form definition as JSON
    Show { form: String },

    /// Print the initial values of a form
    Prefill { form: String },

    /// Render a submission as a transient artifact
    Submit {
        form: String,
        #[command(flatten)]
        values: ValueArgs,
    },

    /// Move a transient artifact to its permanent name
    Confirm {
        form: String,
        transient_id: String,
        #[command(flatten)]
        values: ValueArgs,
    },

    /// Delete a transient artifact
    Discard { transient_id: String },

    /// Copy an artifact out of the output directory
    Fetch {
        /// Transient id or permanent name
        reference: String,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List transient artifacts awaiting confirm or discard
    Orphans,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = ServiceConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    let service = FormService::new(&config)?;

    match cli.command {
        Commands::List => {
            for form in service.list_forms() {
                println!("{}\t{}", form.id, form.title);
            }
        }
        Commands::Show { form } => {
            let schema = service.form(&form)?;
            println!("{}", serde_json::to_string_pretty(schema.as_ref())?);
        }
        Commands::Prefill { form } => {
            for (name, value) in service.prefill(&form)?.iter() {
                println!("{}\t{}", name, value);
            }
        }
        Commands::Submit { form, values } => {
            let submission = service.submit(&form, &values.read()?)?;
            println!("{}", serde_json::to_string_pretty(&submission)?);
        }
        Commands::Confirm {
            form,
            transient_id,
            values,
        } => {
            let path = service.confirm(&form, &transient_id, &values.read()?)?;
            println!("{}", path.display());
        }
        Commands::Discard { transient_id } => {
            if !service.discard(&transient_id)? {
                log::warn!("Nothing to discard for {}", transient_id);
            }
        }
        Commands::Fetch { reference, output } => {
            let bytes = service.fetch(&reference)?;
            fs::write(&output, &bytes).with_context(|| format!("writing {}", output.display()))?;
            println!("{} bytes written to {}", bytes.len(), output.display());
        }
        Commands::Orphans => {
            for orphan in service.orphans()? {
                let age = orphan
                    .modified
                    .and_then(|m| m.elapsed().ok())
                    .map(|d| format!("{}s", d.as_secs()))
                    .unwrap_or_else(|| "?".to_string());
                let state = if orphan.claimed { "claimed" } else { "transient" };
                println!("{}\t{}\t{}\t{}", orphan.id, state, age, orphan.path.display());
            }
        }
    }
    Ok(())
}

impl ValueArgs {
    fn read(&self) -> anyhow::Result<SubmittedValues> {
        let mut submitted = match &self.values_file {
            Some(path) => read_values_file(path)?,
            None => SubmittedValues::new(),
        };
        for pair in &self.values {
            let Some((name, value)) = pair.split_once('=') else {
                bail!("expected NAME=VALUE, got '{}'", pair);
            };
            submitted.insert(name.trim(), value);
        }
        Ok(submitted)
    }
}

fn read_values_file(path: &Path) -> anyhow::Result<SubmittedValues> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let Value::Object(map) = serde_json::from_str(&text)? else {
        bail!("{} must contain a JSON object", path.display());
    };

    let mut submitted = SubmittedValues::new();
    for (name, value) in map {
        match value {
            Value::Array(items) => {
                for item in items {
                    submitted.insert(name.as_str(), scalar(item));
                }
            }
            other => submitted.insert(name.as_str(), scalar(other)),
        }
    }
    Ok(submitted)
}

fn scalar(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
