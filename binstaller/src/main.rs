//! CLI binary interface for binstaller.

use std::time::Duration;

use binstaller::{
    adapters::{aqua, github, goreleaser},
    checksum::{self, ChecksumMode},
    errors::DistResult,
    generator, net, Spec,
};
use clap::Parser;
use console::Term;

use crate::cli::{ChecksumModeArg, Cli, Commands, EmbedChecksumsArgs, GenArgs, InitArgs, SourceArg};

mod cli;

fn print_success(message: &str) {
    let out = Term::stdout();
    let _ = out.write_line(&format!("{}", out.style().green().apply_to(message)));
}

fn main() {
    let cli = Cli::parse();
    axocli::CliAppBuilder::new("binstaller")
        .verbose(cli.verbose)
        .json_errors(false)
        .start(cli, real_main);
}

fn real_main(app: &axocli::CliApp<Cli>) -> Result<(), miette::Report> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .max_blocking_threads(128)
        .enable_all()
        .build()
        .expect("initializing tokio runtime failed");
    let _guard = runtime.enter();

    let cli = &app.config;
    match &cli.command {
        Commands::Init(args) => runtime.block_on(cmd_init(cli, args)),
        Commands::Gen(args) => cmd_gen(cli, args),
        Commands::EmbedChecksums(args) => runtime.block_on(cmd_embed_checksums(cli, args)),
    }
    .map_err(Into::into)
}

async fn cmd_init(cli: &Cli, args: &InitArgs) -> DistResult<()> {
    let settings = net::ClientSettings { timeout: Some(Duration::from_secs(cli.timeout)) };
    let axo_client = net::create_axoasset_client(settings)?;
    let reqwest_client = net::create_reqwest_client(settings)?;
    let name_override = args.name.as_deref();

    let spec = match args.source {
        SourceArg::Goreleaser => {
            goreleaser::build(
                &args.repo,
                args.workdir.as_ref(),
                args.file.as_ref(),
                args.sha.as_deref().unwrap_or("HEAD"),
                name_override,
                &axo_client,
            )
            .await?
        }
        SourceArg::Aqua => {
            aqua::build(
                &args.repo,
                args.workdir.as_ref(),
                args.file.as_ref(),
                args.sha.as_deref().unwrap_or("main"),
                name_override,
                &axo_client,
            )
            .await?
        }
        SourceArg::Github => github::build(&args.repo, name_override, &reqwest_client).await?,
        SourceArg::Auto => {
            let goreleaser_attempt = goreleaser::build(
                &args.repo,
                args.workdir.as_ref(),
                args.file.as_ref(),
                args.sha.as_deref().unwrap_or("HEAD"),
                name_override,
                &axo_client,
            )
            .await;
            if let Ok(spec) = goreleaser_attempt {
                spec
            } else if let Ok(spec) = aqua::build(
                &args.repo,
                args.workdir.as_ref(),
                args.file.as_ref(),
                args.sha.as_deref().unwrap_or("main"),
                name_override,
                &axo_client,
            )
            .await
            {
                spec
            } else {
                github::build(&args.repo, name_override, &reqwest_client).await?
            }
        }
    };

    let bytes = binstaller_schema::save(&spec)?;
    if cli.dry_run {
        println!("{}", String::from_utf8_lossy(&bytes));
    } else {
        axoasset::LocalAsset::write_new(&String::from_utf8_lossy(&bytes), &args.output)?;
        print_success(&format!("wrote {}", args.output));
    }
    Ok(())
}

fn cmd_gen(cli: &Cli, args: &GenArgs) -> DistResult<()> {
    let spec_path = config_path(cli);
    let bytes = axoasset::LocalAsset::load_bytes(&spec_path)?;
    let spec: Spec = binstaller_schema::load_and_prepare(&bytes)?;

    if cli.dry_run || args.output.as_str() == "-" {
        let rendered = generator::render_to_string(&spec)?;
        println!("{rendered}");
    } else {
        generator::generate(&spec, &args.output)?;
        print_success(&format!("wrote {}", args.output));
    }
    Ok(())
}

async fn cmd_embed_checksums(cli: &Cli, args: &EmbedChecksumsArgs) -> DistResult<()> {
    let spec_path = config_path(cli);
    let bytes = axoasset::LocalAsset::load_bytes(&spec_path)?;
    let mut spec: Spec = binstaller_schema::load_and_prepare(&bytes)?;

    let settings = net::ClientSettings { timeout: Some(Duration::from_secs(cli.timeout)) };
    let axo_client = net::create_axoasset_client(settings)?;

    let version = args
        .version
        .clone()
        .unwrap_or_else(|| spec.default_version.clone());
    if version != "latest" {
        semver::Version::parse(version.trim_start_matches('v')).map_err(|_| {
            binstaller::errors::BinstallerError::InvalidVersion { version: version.clone() }
        })?;
    }
    let download_base_url = format!("https://github.com/{}/releases/download/v{version}", spec.repo);

    let checksums = spec
        .checksums
        .clone()
        .unwrap_or_else(|| binstaller_schema::ChecksumConfig {
            template: format!("{}_checksums.txt", spec.name),
            algorithm: Default::default(),
            embedded_checksums: Default::default(),
        });

    let entries = match args.mode {
        ChecksumModeArg::ChecksumFile => {
            let path = args.file.as_ref().ok_or_else(|| {
                binstaller::errors::BinstallerError::SourceLoad {
                    what: "a local checksum file (--file)",
                    repo: spec.repo.clone(),
                    tried: Vec::new(),
                }
            })?;
            let text = axoasset::LocalAsset::load_string(path.as_str())?;
            let parsed = checksum::parse_checksum_file(&text, checksums.algorithm);
            if parsed.is_empty() {
                return Err(binstaller::errors::BinstallerError::EmptyChecksumFile {
                    filename: path.to_string(),
                });
            }
            parsed
        }
        ChecksumModeArg::Download => {
            checksum::embed_checksums(
                &axo_client,
                &download_base_url,
                &version,
                checksums.algorithm,
                ChecksumMode::ChecksumFile,
                &[],
            )
            .await?
        }
        ChecksumModeArg::Calculate => {
            let asset_filenames = if args.all_platforms {
                spec.supported_platforms
                    .iter()
                    .map(|p| generator::resolve_asset_filename(&spec, &p.os, &p.arch, &version))
                    .collect()
            } else {
                args.assets.clone()
            };
            checksum::embed_checksums(
                &axo_client,
                &download_base_url,
                &version,
                checksums.algorithm,
                ChecksumMode::Calculate,
                &asset_filenames,
            )
            .await?
        }
    };

    let mut checksums = checksums;
    checksums.embedded_checksums.insert(version, entries);
    spec.checksums = Some(checksums);

    let out_bytes = binstaller_schema::save(&spec)?;
    let write_path = args.output.clone().unwrap_or(spec_path);
    if cli.dry_run {
        println!("{}", String::from_utf8_lossy(&out_bytes));
    } else {
        axoasset::LocalAsset::write_new(&String::from_utf8_lossy(&out_bytes), &write_path)?;
        tracing::info!("updated {}", write_path);
    }
    Ok(())
}

/// The `.binstaller.yml` path `gen` and `embed-checksums` operate on:
/// `--config` if given, the conventional default otherwise.
fn config_path(cli: &Cli) -> camino::Utf8PathBuf {
    cli.config.clone().unwrap_or_else(|| camino::Utf8PathBuf::from(".binstaller.yml"))
}
