// ABOUTME: Command-line interface definitions using clap
// ABOUTME: Defines all subcommands, global flags and their env fallbacks

use crate::api::DEFAULT_API_BASE;
use crate::auth::Credentials;
use crate::convert::ExportConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "audump")]
#[command(about = "Export collaboratively edited transcripts as audapolis archives", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Bearer token (skips login)
    #[arg(long, global = true, env = "AUDAPOLIS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Username for login
    #[arg(long, global = true, env = "AUDAPOLIS_USERNAME")]
    pub username: Option<String>,

    /// Password for login
    #[arg(long, global = true, env = "AUDAPOLIS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// API base URL
    #[arg(long, global = true, default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Sync WebSocket base URL
    #[arg(long, global = true, default_value = "ws://localhost:8000/sync/")]
    pub sync_base: String,

    /// Directory for exported archives (defaults to the current directory)
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List all documents
    List,

    /// Export a document with its audio as an archive
    Export {
        /// Document ID to export
        id: String,

        /// Archive path (overrides --output-dir naming)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Show the video track in the editor
        #[arg(long)]
        display_video: bool,

        /// Hide speaker names in the editor
        #[arg(long)]
        hide_speaker_names: bool,
    },

    /// Print the replicated document as JSON
    Dump {
        /// Document ID to dump
        id: String,
    },
}

impl Cli {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            token: self.token.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

pub fn export_config(display_video: bool, hide_speaker_names: bool) -> ExportConfig {
    ExportConfig {
        display_video,
        display_speaker_names: !hide_speaker_names,
        ..ExportConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_export_command() {
        let cli = Cli::try_parse_from([
            "audump",
            "export",
            "42",
            "--display-video",
            "--token",
            "abc",
        ])
        .unwrap();
        assert_eq!(cli.token.as_deref(), Some("abc"));
        match cli.command {
            Commands::Export {
                id,
                display_video,
                hide_speaker_names,
                output,
            } => {
                assert_eq!(id, "42");
                assert!(display_video);
                assert!(!hide_speaker_names);
                assert!(output.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_default_bases() {
        let cli = Cli::try_parse_from(["audump", "list"]).unwrap();
        assert_eq!(cli.api_base, "http://localhost:8000");
        assert_eq!(cli.sync_base, "ws://localhost:8000/sync/");
    }

    #[test]
    fn test_export_config_flags() {
        let config = export_config(false, true);
        assert_eq!(config.version, 3);
        assert!(!config.display_video);
        assert!(!config.display_speaker_names);
    }
}
