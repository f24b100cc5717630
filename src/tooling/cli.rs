//! CLI Tooling
//!
//! Command-line interface for extracting, importing, watching and exporting
//! script descriptors. Every command returns the text printed on success.

use crate::config::{ConfigLoader, ScriptsyncConfig};
use crate::error::ScriptError;
use crate::logging::LoggingConfig;
use crate::progress::{ConsoleProgress, ProgressSink, TracingProgress};
use crate::remote::{HttpScriptService, InMemoryScriptService, ScriptService};
use crate::script::{detect, Representation, ScriptDescriptor};
use crate::sync::{ImportOptions, PipelineReport, ScriptSync};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

/// Scriptsync CLI - script descriptors as editable files
#[derive(Parser)]
#[command(name = "scriptsync")]
#[command(about = "Extract, import and watch-reconcile scripted configuration descriptors")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Logging settings from `base` with command-line overrides applied.
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut logging = base.clone();
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            logging.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            logging.file = Some(file.clone());
        }
        logging
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Move the inline body of a descriptor file into a sibling script file
    Extract {
        /// Descriptor file (`<name>.script.json`)
        file: PathBuf,
        /// Directory for the extracted pair (default: beside the descriptor)
        #[arg(long)]
        target: Option<PathBuf>,
    },
    /// Publish descriptor files to the script service
    Import {
        /// Single descriptor or body file
        #[arg(long, conflicts_with = "directory", required_unless_present = "directory")]
        file: Option<PathBuf>,
        /// Directory scanned for script pairs
        #[arg(long)]
        directory: Option<PathBuf>,
        /// Keep watching the directory and publish every change
        #[arg(long, requires = "directory")]
        watch: bool,
        /// Give imported scripts fresh ids (ignored while watching)
        #[arg(long)]
        re_uuid: bool,
        /// Ask the service to import script dependencies too
        #[arg(long)]
        include_deps: bool,
        /// Reject scripts whose source does not pass basic checks
        #[arg(long)]
        validate: bool,
        /// Publish into an in-memory service instead of the configured remote
        #[arg(long)]
        dry_run: bool,
    },
    /// Write remote scripts to descriptor files
    Export {
        /// Export a single script by id
        #[arg(long, conflicts_with = "all")]
        id: Option<String>,
        /// Export every script
        #[arg(long)]
        all: bool,
        /// Write bodies as separate script files
        #[arg(long)]
        extract: bool,
        /// Output directory
        #[arg(long, default_value = ".")]
        directory: PathBuf,
        /// Write every script into one inline collection file instead
        #[arg(long, conflicts_with_all = ["id", "extract"])]
        bundle: Option<PathBuf>,
    },
    /// List remote scripts
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

/// CLI context: loaded configuration plus the workspace every relative path
/// is resolved against.
pub struct CliContext {
    workspace_root: PathBuf,
    config: ScriptsyncConfig,
    progress: Arc<dyn ProgressSink>,
}

impl CliContext {
    /// Create a new CLI context
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ScriptError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        // JSON logs carry progress as structured records instead of console lines.
        let progress: Arc<dyn ProgressSink> = if config.logging.format == "json" {
            Arc::new(TracingProgress)
        } else {
            let color = config.logging.color && std::io::stderr().is_terminal();
            Arc::new(ConsoleProgress::new(color))
        };
        Ok(Self {
            workspace_root,
            config,
            progress,
        })
    }

    /// Replace the console progress sink.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &ScriptsyncConfig {
        &self.config
    }

    /// Service configured under `[remote]`, or an in-memory one for dry runs.
    fn service(
        &self,
        dry_run: bool,
        include_dependencies: bool,
    ) -> Result<Arc<dyn ScriptService>, ScriptError> {
        if dry_run {
            info!("Dry run: publishing into an in-memory script service");
            return Ok(Arc::new(InMemoryScriptService::new()));
        }
        let base_url = self.config.remote.base_url.as_deref().ok_or_else(|| {
            ScriptError::Config(
                "No script service configured; set remote.base_url or SCRIPTSYNC__REMOTE__BASE_URL"
                    .to_string(),
            )
        })?;
        let service = HttpScriptService::new(
            base_url,
            Duration::from_secs(self.config.remote.timeout_secs),
        )?
        .with_dependencies(include_dependencies);
        Ok(Arc::new(service))
    }

    fn script_sync(&self, service: Arc<dyn ScriptService>) -> ScriptSync {
        ScriptSync::new(
            self.workspace_root.clone(),
            service,
            Arc::clone(&self.progress),
        )
        .with_watch_defaults(
            self.config
                .watch
                .to_watch_config(&self.workspace_root),
        )
    }

    /// Execute a CLI command
    pub async fn execute(&self, command: &Commands) -> Result<String, ScriptError> {
        match command {
            Commands::Extract { file, target } => {
                // Extraction is local; no service is contacted.
                let sync = self.script_sync(Arc::new(InMemoryScriptService::new()));
                let pair = sync.extract_file(file, target.as_deref())?;
                Ok(format!(
                    "Extracted {} -> {}",
                    pair.descriptor_path.display(),
                    pair.body_path.display()
                ))
            }
            Commands::Import {
                file,
                directory,
                watch,
                re_uuid,
                include_deps,
                validate,
                dry_run,
            } => {
                let options = ImportOptions {
                    regenerate_ids: *re_uuid,
                    validate: *validate,
                };
                let sync = self.script_sync(self.service(*dry_run, *include_deps)?);
                match (file, directory) {
                    (Some(file), _) => {
                        let outcome = sync.import_file(file, options).await?;
                        Ok(format!(
                            "{} {} ({})",
                            if outcome.is_created() { "Created" } else { "Updated" },
                            file.display(),
                            outcome.id()
                        ))
                    }
                    (None, Some(directory)) if *watch => {
                        let report = sync
                            .watch_directory(directory, options, ctrl_c_shutdown())
                            .await?;
                        Ok(report_text(&report))
                    }
                    (None, Some(directory)) => {
                        let report = sync.import_directory(directory, options).await?;
                        Ok(report_text(&report))
                    }
                    (None, None) => Err(ScriptError::Config(
                        "import needs --file or --directory".to_string(),
                    )),
                }
            }
            Commands::Export {
                id,
                all,
                extract,
                directory,
                bundle,
            } => {
                let sync = self.script_sync(self.service(false, false)?);
                if let Some(bundle) = bundle {
                    let count = sync.export_bundle(bundle).await?;
                    return Ok(format!(
                        "Exported {} script(s) to {}",
                        count,
                        bundle.display()
                    ));
                }
                match (id, all) {
                    (Some(id), _) => {
                        let path = sync.export_one(id, directory, *extract).await?;
                        Ok(format!("Exported {} to {}", id, path.display()))
                    }
                    (None, true) => {
                        let paths = sync.export_all(directory, *extract).await?;
                        Ok(format!(
                            "Exported {} script(s) to {}",
                            paths.len(),
                            directory.display()
                        ))
                    }
                    (None, false) => Err(ScriptError::Config(
                        "export needs --id, --all or --bundle".to_string(),
                    )),
                }
            }
            Commands::List { format } => {
                let scripts = self.script_sync(self.service(false, false)?).list().await?;
                format_script_list(&scripts, format)
            }
        }
    }
}

/// Flips to `true` on Ctrl-C.
fn ctrl_c_shutdown() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, finishing current script");
            let _ = tx.send(true);
        }
    });
    rx
}

fn report_text(report: &PipelineReport) -> String {
    let mut text = report.summary();
    if report.skipped > 0 {
        text.push_str(&format!(", {} skipped", report.skipped));
    }
    text
}

fn representation_label(descriptor: &ScriptDescriptor) -> String {
    match detect(descriptor) {
        Representation::LineArray => "inline".to_string(),
        Representation::EncodedScalar => "encoded".to_string(),
        Representation::Reference(path) => format!("file: {}", path.display()),
    }
}

/// Format the remote script list as a table or JSON array.
fn format_script_list(scripts: &[ScriptDescriptor], format: &str) -> Result<String, ScriptError> {
    match format {
        "json" => serde_json::to_string_pretty(scripts).map_err(|e| ScriptError::Json {
            path: PathBuf::from("<stdout>"),
            source: e,
        }),
        "text" => {
            if scripts.is_empty() {
                return Ok("No scripts found.".to_string());
            }
            use comfy_table::Table;
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["ID", "Name", "Context", "Language", "Body"]);
            for script in scripts {
                table.add_row(vec![
                    script.id.clone(),
                    script.name.clone(),
                    script.context.clone(),
                    script.language.to_string(),
                    representation_label(script),
                ]);
            }
            Ok(table.to_string())
        }
        other => Err(ScriptError::Config(format!(
            "Invalid list format: {} (must be 'text' or 'json')",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{ScriptBody, ScriptLanguage};

    #[test]
    fn test_cli_parses_import_flags() {
        let cli = Cli::try_parse_from([
            "scriptsync",
            "import",
            "--directory",
            "scripts",
            "--watch",
            "--re-uuid",
            "--validate",
        ])
        .unwrap();
        match cli.command {
            Commands::Import {
                directory,
                watch,
                re_uuid,
                validate,
                include_deps,
                ..
            } => {
                assert_eq!(directory, Some(PathBuf::from("scripts")));
                assert!(watch && re_uuid && validate);
                assert!(!include_deps);
            }
            _ => panic!("expected import"),
        }
    }

    #[test]
    fn test_cli_rejects_watch_without_directory() {
        assert!(Cli::try_parse_from(["scriptsync", "import", "--file", "a.script.json", "--watch"])
            .is_err());
        assert!(Cli::try_parse_from(["scriptsync", "import"]).is_err());
    }

    #[test]
    fn test_logging_overrides() {
        let cli = Cli::try_parse_from(["scriptsync", "--log-format", "json", "list"]).unwrap();
        let logging = cli.logging_config(&LoggingConfig::default());
        assert_eq!(logging.format, "json");
        assert_eq!(logging.level, "info");
    }

    #[test]
    fn test_format_script_list() {
        let scripts = vec![ScriptDescriptor::new(
            "a1",
            "Header Injector",
            "OAUTH2_ACCESS_TOKEN_MODIFICATION",
            ScriptLanguage::Javascript,
            ScriptBody::Text("file://Header-Injector.script.js".into()),
        )];
        let text = format_script_list(&scripts, "text").unwrap();
        assert!(text.contains("Header Injector"));
        assert!(text.contains("file: Header-Injector.script.js"));

        let json = format_script_list(&scripts, "json").unwrap();
        assert!(json.contains("\"_id\": \"a1\""));
        assert!(format_script_list(&scripts, "yaml").is_err());
        assert_eq!(format_script_list(&[], "text").unwrap(), "No scripts found.");
    }

    #[tokio::test]
    async fn test_export_without_remote_is_config_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let context = CliContext::new(temp.path().to_path_buf(), None).unwrap();
        if context.config().remote.base_url.is_some() {
            return;
        }
        let result = context
            .execute(&Commands::List {
                format: "text".to_string(),
            })
            .await;
        assert!(matches!(result, Err(ScriptError::Config(_))));
    }

    #[tokio::test]
    async fn test_dry_run_directory_import() {
        let temp = tempfile::TempDir::new().unwrap();
        let scripts = temp.path().join("scripts");
        std::fs::create_dir_all(&scripts).unwrap();
        let descriptor = ScriptDescriptor::new(
            "d1",
            "Dry Run",
            "AUTHENTICATION_TREE_DECISION_NODE",
            ScriptLanguage::Javascript,
            ScriptBody::Lines(vec!["outcome = \"true\";".into()]),
        );
        crate::script::write_collection(
            &scripts.join("Dry-Run.script.json"),
            &crate::script::DescriptorCollection::from_single(descriptor),
        )
        .unwrap();

        let context = CliContext::new(temp.path().to_path_buf(), None)
            .unwrap()
            .with_progress(Arc::new(crate::progress::RecordingProgress::new()));
        let output = context
            .execute(&Commands::Import {
                file: None,
                directory: Some(PathBuf::from("scripts")),
                watch: false,
                re_uuid: false,
                include_deps: false,
                validate: true,
                dry_run: true,
            })
            .await
            .unwrap();
        assert!(output.contains("Published 1 script(s) (1 created, 0 updated)"));
    }
}
