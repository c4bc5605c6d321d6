// ABOUTME: CLI entrypoint for audump command
// ABOUTME: Handles error exit codes and command dispatch

use audump::{
    api::ApiClient,
    auth::resolve_token,
    cli::{export_config, Cli, Commands},
    export::{export_document, replicate_with_progress, ExportRequest},
    storage::Paths,
    stream::{SyncConfig, WsSource},
    Result,
};
use clap::Parser;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run() {
        eprintln!("audump: [E{}] {}", e.exit_code(), e);
        std::process::exit(e.exit_code());
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let client = ApiClient::new(Some(cli.api_base.clone()))?;
    let token = resolve_token(&client, &cli.credentials())?;
    let client = client.with_token(token.clone());
    let sync = SyncConfig::new(cli.sync_base.clone());

    match cli.command.clone() {
        Commands::List => {
            let docs = client.list_documents()?;
            if docs.is_empty() {
                println!("No documents found");
            }
            for doc in docs {
                let created = doc
                    .created_at
                    .map(|ts| ts.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "----------".into());
                println!(
                    "{}  {}  {}",
                    doc.id,
                    created,
                    doc.name.as_deref().unwrap_or("(untitled)")
                );
            }
        }
        Commands::Export {
            id,
            output,
            display_video,
            hide_speaker_names,
        } => {
            let source = WsSource::connect(&sync, &token, &id)?;
            let paths = Paths::new(cli.output_dir.clone())?;
            let request = ExportRequest {
                doc_id: id,
                output,
                config: export_config(display_video, hide_speaker_names),
            };
            export_document(&client, source, &paths, &request)?;
        }
        Commands::Dump { id } => {
            let source = WsSource::connect(&sync, &token, &id)?;
            let document = replicate_with_progress(source)?;
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
    }

    Ok(())
}
