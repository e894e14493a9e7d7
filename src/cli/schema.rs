//! Schema command: settings JSON schema generation and validation

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use schemars::schema_for;
use serde_json::Value;
use std::path::{Path, PathBuf};

use modals::config::{SettingsFile, DEFAULT_BUCKET, SETTINGS_ENV};
use modals::Settings;

const DEFAULT_TITLE: &str = "Modals Settings";
const DEFAULT_DESCRIPTION: &str = "Named modal configuration buckets over a mandatory default";

/// Generate and validate settings schemas
#[derive(Debug, Args)]
pub struct SchemaCommand {
    /// Output file path (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty print the output
    #[arg(short, long)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Option<SchemaSubcommand>,
}

#[derive(Debug, Subcommand)]
pub enum SchemaSubcommand {
    /// Generate JSON schema for settings files
    Generate {
        /// Schema title
        #[arg(long, default_value = DEFAULT_TITLE)]
        title: String,

        /// Schema description
        #[arg(long, default_value = DEFAULT_DESCRIPTION)]
        description: String,
    },
    /// Check that a settings file loads
    Validate {
        /// Settings file to validate
        settings_file: PathBuf,
    },
    /// Show settings documentation
    Docs,
}

impl SchemaCommand {
    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Some(SchemaSubcommand::Generate { title, description }) => {
                self.generate_schema(title, description).await
            }
            Some(SchemaSubcommand::Validate { settings_file }) => {
                self.validate_settings(settings_file).await
            }
            Some(SchemaSubcommand::Docs) => {
                show_docs();
                Ok(())
            }
            None => self.generate_schema(DEFAULT_TITLE, DEFAULT_DESCRIPTION).await,
        }
    }

    async fn generate_schema(&self, title: &str, description: &str) -> Result<()> {
        let output = self.render_schema(title, description)?;

        if let Some(ref output_path) = self.output {
            tokio::fs::write(output_path, output)
                .await
                .with_context(|| format!("Failed to write schema to: {}", output_path.display()))?;
            println!("Schema written to: {}", output_path.display());
        } else {
            println!("{}", output);
        }

        Ok(())
    }

    fn render_schema(&self, title: &str, description: &str) -> Result<String> {
        let schema = schema_for!(SettingsFile);
        let mut schema_value =
            serde_json::to_value(schema).context("Failed to convert schema to JSON value")?;

        if let Some(obj) = schema_value.as_object_mut() {
            obj.insert("title".to_string(), Value::String(title.to_string()));
            obj.insert("description".to_string(), Value::String(description.to_string()));
            obj.insert(
                "required".to_string(),
                Value::Array(vec![Value::String(DEFAULT_BUCKET.to_string())]),
            );
        }

        let output = if self.pretty {
            serde_json::to_string_pretty(&schema_value)?
        } else {
            serde_json::to_string(&schema_value)?
        };
        Ok(output)
    }

    async fn validate_settings(&self, settings_file: &Path) -> Result<()> {
        match Settings::load(settings_file).await {
            Ok(settings) => {
                println!("✅ Settings are valid!");
                println!("Buckets: {}", settings.bucket_names().join(", "));
                Ok(())
            }
            Err(e) => {
                println!("❌ Settings validation failed: {}", e);
                Err(e).with_context(|| {
                    format!("Invalid settings file: {}", settings_file.display())
                })
            }
        }
    }
}

fn show_docs() {
    println!("Modals Settings Documentation");
    println!("=============================\n");

    println!("Settings File Locations:");
    println!("  1. --settings <path>");
    println!("  2. ${}", SETTINGS_ENV);
    println!("  3. ./modals.json");
    println!("  4. ~/.config/modals/settings.json\n");

    println!("Buckets:");
    println!("  A JSON object keyed by bucket name. The \"{}\" bucket is required", DEFAULT_BUCKET);
    println!("  and must set every field; other buckets override a subset.");
    println!("  A dialog uses the bucket named after its data-modal value.\n");

    println!("Fields:");
    println!("  preventDefault       - Reserved; trigger clicks always suppress the default action");
    println!("  openTimeout          - Milliseconds between an open request and activation");
    println!("  enableScrollTimeout  - Milliseconds between close and scroll restore");
    println!("  enableScrolling      - Restore page scroll when the dialog closes");
    println!("  disableScrolling     - Suppress page scroll while the dialog is open");
    println!("  stopPlay             - Pause video/audio inside the dialog on close");
    println!("  lockFocus            - Contain focus inside the dialog while open\n");

    println!("Example Settings:");
    println!("{}", example_settings());
}

fn example_settings() -> &'static str {
    r#"{
  "default": {
    "preventDefault": true,
    "openTimeout": 300,
    "enableScrollTimeout": 300,
    "enableScrolling": true,
    "disableScrolling": true,
    "stopPlay": true,
    "lockFocus": true
  },
  "video": {
    "openTimeout": 0,
    "stopPlay": true
  }
}"#
}
