//! Command-line shell
//!
//! Argument parsing and the command handlers driven by the binary.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};

use aspirepath_core::{
    AnalysisRequest, ContactSubmission, ProfileFields, ProfileUpload,
};

use crate::models::settings::SettingsUpdate;
use crate::services::contact::load_upload;
use crate::services::ReportView;
use crate::state::AppState;
use crate::storage::ConfigService;

#[derive(Debug, Parser)]
#[command(
    name = "aspirepath",
    version,
    about = "Career analysis: automation risk, strengths, skill gaps and next steps"
)]
pub struct Cli {
    /// Config file (defaults to ~/.aspirepath/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL, overriding config and ASPIREPATH_API_URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Analyze a questionnaire response and print the report
    Analyze {
        /// Response identifier from the questionnaire
        response_id: String,

        /// Program you are interested in (used when no career path is recommended)
        #[arg(long)]
        program: Option<String>,

        /// Interests to match reviews against
        #[arg(long = "interest")]
        interests: Vec<String>,
    },
    /// Analyze a LinkedIn profile and/or resume
    Profile {
        /// LinkedIn profile URL
        #[arg(long)]
        linkedin: Option<String>,

        /// Resume file (PDF or Word, up to 1 MiB)
        #[arg(long)]
        resume: Option<PathBuf>,
    },
    /// Send the contact form
    Contact {
        #[arg(long)]
        email: String,

        #[arg(long)]
        country: String,

        /// Opt in to promotional emails
        #[arg(long)]
        promo: bool,

        #[arg(long)]
        linkedin: Option<String>,

        #[arg(long)]
        resume: Option<PathBuf>,
    },
    /// Check whether the backend knowledge base is ready
    Status,
    /// Upload documents to the backend knowledge base
    Index {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Show or change the saved configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the saved configuration
    Show,
    /// Change saved settings and print the result
    Set(ConfigSet),
}

#[derive(Debug, Default, Args)]
pub struct ConfigSet {
    /// Backend base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Default request timeout in seconds
    #[arg(long)]
    pub request_timeout: Option<u64>,

    /// Analysis request timeout in seconds
    #[arg(long)]
    pub analysis_timeout: Option<u64>,

    /// Per-step review timeout in seconds (8-30)
    #[arg(long)]
    pub review_timeout: Option<u64>,

    /// Analysis retries after the first attempt (0-5)
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Send cookies with backend requests
    #[arg(long)]
    pub send_credentials: Option<bool>,

    #[arg(long)]
    pub log_level: Option<String>,
}

impl From<ConfigSet> for SettingsUpdate {
    fn from(set: ConfigSet) -> Self {
        Self {
            api_base_url: set.base_url,
            request_timeout_secs: set.request_timeout,
            analysis_timeout_secs: set.analysis_timeout,
            review_timeout_secs: set.review_timeout,
            max_retries: set.max_retries,
            send_credentials: set.send_credentials,
            log_level: set.log_level,
            ..Default::default()
        }
    }
}

impl Cli {
    /// Load the config file and apply environment and flag overrides.
    pub fn load_config(&self) -> anyhow::Result<ConfigService> {
        let mut service = open_config(self.config.as_deref())?;

        service.apply_overrides(SettingsUpdate::from_env())?;
        service.apply_overrides(SettingsUpdate {
            api_base_url: self.api_url.clone(),
            log_level: self.verbose.then(|| "debug".to_string()),
            ..Default::default()
        })?;
        Ok(service)
    }
}

fn open_config(path: Option<&Path>) -> anyhow::Result<ConfigService> {
    match path {
        Some(path) => ConfigService::open(path),
        None => ConfigService::new(),
    }
    .context("loading configuration")
}

/// Run one command to completion. Ctrl-C cancels in-flight work.
///
/// `config_path` is the file `config` commands read and write.
pub async fn run(
    command: Commands,
    config_path: Option<&Path>,
    state: &AppState,
) -> anyhow::Result<()> {
    tokio::select! {
        result = dispatch(command, config_path, state) => result,
        _ = tokio::signal::ctrl_c() => {
            state.shutdown();
            bail!("interrupted")
        }
    }
}

async fn dispatch(
    command: Commands,
    config_path: Option<&Path>,
    state: &AppState,
) -> anyhow::Result<()> {
    match command {
        Commands::Analyze {
            response_id,
            program,
            interests,
        } => {
            let request = AnalysisRequest::questionnaire(response_id)?.with_profile(ProfileFields {
                interests,
                program,
                ..Default::default()
            });
            analyze(state, request).await
        }
        Commands::Profile { linkedin, resume } => {
            let resume = resume.as_deref().map(load_upload).transpose()?;
            let request = AnalysisRequest::upload(ProfileUpload {
                linkedin_url: linkedin,
                resume,
            })?;
            analyze(state, request).await
        }
        Commands::Contact {
            email,
            country,
            promo,
            linkedin,
            resume,
        } => {
            let submission = ContactSubmission {
                email,
                country,
                promotional_emails: promo,
                linkedin_url: linkedin,
                resume: resume.as_deref().map(load_upload).transpose()?,
            };
            let receipt = state.contact().submit(&submission).await?;
            println!("{} (submission #{})", receipt.message, receipt.submission_id);
            Ok(())
        }
        Commands::Status => {
            let ready = state.knowledge().check_readiness().await?;
            if ready {
                println!("Knowledge base is ready.");
            } else {
                println!("Knowledge base is not set up yet. Run `aspirepath index <FILES>`.");
            }
            Ok(())
        }
        Commands::Index { files } => {
            let documents = files
                .iter()
                .map(|p| load_upload(p))
                .collect::<Result<Vec<_>, _>>()?;
            let response = state.knowledge().setup(documents).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Commands::Config { action } => configure(config_path, action),
    }
}

/// Works on the file alone; environment and flag overrides are not saved.
fn configure(config_path: Option<&Path>, action: ConfigAction) -> anyhow::Result<()> {
    let mut service = open_config(config_path)?;
    if let ConfigAction::Set(set) = action {
        service.update_config(set.into())?;
        println!("Saved {}", service.path().display());
    }
    println!("{}", serde_json::to_string_pretty(service.get_config())?);
    Ok(())
}

async fn analyze(state: &AppState, request: AnalysisRequest) -> anyhow::Result<()> {
    let flow = state.analysis();
    let result = flow.submit(request).await?;
    let review = flow.wait_for_review().await;
    print!("{}", ReportView::new(&result, review.as_ref()));
    Ok(())
}
