use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use foldersync::callbacks::PrintActions;
use foldersync::config::{CliOverrides, Config};
use foldersync::logging::*;
use foldersync::signals::{setup_signal_handlers, EXIT_INTERRUPTED};
use foldersync::store::S3Store;
use foldersync::sync::SyncBuilder;
use foldersync::SyncError;

fn cli() -> Command {
	Command::new("foldersync")
		.version(env!("CARGO_PKG_VERSION"))
		.about("Sync a local directory to an S3 bucket")
		.arg(
			Arg::new("src")
				.long("src")
				.value_name("DIR")
				.help("Source directory"),
		)
		.arg(
			Arg::new("bucket")
				.long("bucket")
				.value_name("BUCKET")
				.help("Destination S3 bucket"),
		)
		.arg(Arg::new("prefix").long("prefix").value_name("PREFIX").help("Key prefix within the bucket"))
		.arg(Arg::new("region").long("region").value_name("REGION").help("AWS region [default: us-east-1]"))
		.arg(
			Arg::new("storage-class")
				.long("storage-class")
				.value_name("CLASS")
				.help("S3 storage class: GLACIER_IR (cheapest, instant access), STANDARD_IA, STANDARD [default: GLACIER_IR]"),
		)
		.arg(
			Arg::new("endpoint-url")
				.long("endpoint-url")
				.value_name("URL")
				.help("Custom S3-compatible endpoint (MinIO, LocalStack)"),
		)
		.arg(
			Arg::new("dry-run")
				.long("dry-run")
				.action(ArgAction::SetTrue)
				.help("Print actions without making changes"),
		)
		.arg(
			Arg::new("delete")
				.long("delete")
				.action(ArgAction::SetTrue)
				.help("Delete S3 objects absent from the source"),
		)
		.arg(
			Arg::new("config")
				.short('c')
				.long("config")
				.value_name("FILE")
				.help("Config file [default: ~/.config/foldersync/config.toml]"),
		)
}

async fn run(config: Config, cancel: CancellationToken) -> Result<(), SyncError> {
	let store = S3Store::new(config.store_config()).await;
	info!("Destination s3://{}/{}", store.bucket(), config.prefix);

	let options = config.sync_options();
	let report = SyncBuilder::new()
		.source(options.source)
		.dry_run(options.dry_run)
		.mirror(options.mirror)
		.callbacks(Arc::new(PrintActions))
		.cancel_token(cancel)
		.run(Arc::new(store))
		.await?;

	info!(
		"Done: {} uploads, {} deletes, {} bytes sent{}",
		report.uploads().len(),
		report.deletes().len(),
		report.bytes_uploaded,
		if config.dry_run { " (dry run, nothing changed)" } else { "" }
	);
	Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
	let matches = cli().get_matches();
	let arg = |name: &str| matches.get_one::<String>(name).cloned();

	let overrides = CliOverrides {
		source: arg("src").map(PathBuf::from),
		bucket: arg("bucket"),
		prefix: arg("prefix"),
		region: arg("region"),
		storage_class: arg("storage-class"),
		endpoint_url: arg("endpoint-url"),
		dry_run: matches.get_flag("dry-run"),
		delete: matches.get_flag("delete"),
	};
	let config_path = arg("config").map(PathBuf::from);

	let config = match Config::load(config_path.as_deref(), overrides) {
		Ok(config) => config,
		Err(e) => {
			eprintln!("foldersync: {}", e);
			eprintln!("usage: foldersync --src <DIR> --bucket <BUCKET> [options]");
			return ExitCode::FAILURE;
		}
	};
	init_tracing(&config.log_level);

	let cancel = CancellationToken::new();
	setup_signal_handlers(cancel.clone());

	match run(config, cancel).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) if e.is_cancelled() => {
			error!("sync interrupted");
			ExitCode::from(EXIT_INTERRUPTED)
		}
		Err(e) => {
			eprintln!("foldersync: sync failed: {}", e);
			ExitCode::FAILURE
		}
	}
}

// vim: ts=4
