use anyhow::{anyhow, Context, Result};
use clap::{crate_version, App, Arg};
use quire::aggregate::Mode;
use quire::build::build_blog;
use quire::config::Config;
use std::path::Path;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let matches = App::new("quire")
        .version(crate_version!())
        .about(
            "Compiles markdown blog posts into JSON post, tag, and author \
             listings",
        )
        .arg(
            Arg::with_name("project")
                .short("p")
                .long("project")
                .value_name("DIR")
                .takes_value(true)
                .default_value(".")
                .help("Where to start searching for quire.yaml"),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .value_name("DIR")
                .takes_value(true)
                .default_value("dist")
                .help("The output root; listings are written to DIR/api/blog"),
        )
        .arg(
            Arg::with_name("environment")
                .short("e")
                .long("environment")
                .value_name("ENV")
                .takes_value(true)
                .env("QUIRE_ENV")
                .default_value("production")
                .help(
                    "The build environment; drafts are only included in \
                     `development`",
                ),
        )
        .arg(
            Arg::with_name("threads")
                .short("t")
                .long("threads")
                .value_name("N")
                .takes_value(true)
                .help("The number of threads used to parse posts"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("Logs more detail (repeat for even more)"),
        )
        .get_matches();

    init_logging(matches.occurrences_of("verbose"))?;

    let threads = match matches.value_of("threads") {
        None => None,
        Some(threads) => Some(threads.parse::<usize>().map_err(|e| {
            anyhow!("Invalid thread count `{}`: {}", threads, e)
        })?),
    };
    let mode: Mode = matches
        .value_of("environment")
        .unwrap_or("production")
        .parse()?;
    let project = matches.value_of("project").unwrap_or(".");
    let project_dir = Path::new(project)
        .canonicalize()
        .with_context(|| format!("Resolving project directory `{}`", project))?;

    let config = Config::from_directory(
        &project_dir,
        Path::new(matches.value_of("output").unwrap_or("dist")),
        mode,
        threads,
    )?;
    let report = build_blog(&config)?;
    println!(
        "Wrote {} posts, {} tags, and {} authors to {}",
        report.posts,
        report.tags,
        report.authors,
        report.directory.display()
    );
    Ok(())
}

fn init_logging(verbosity: u64) -> Result<()> {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
