//! Command-line parsing.

mod parsed_args;


use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Arg, ArgAction, Command, value_parser};

pub use parsed_args::ParsedArgs;

/// Builds the `clap` command used for parsing.
fn clap_command() -> Command {
    Command::new("share-mirror")
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(
            Arg::new("help")
                .long("help")
                .short('h')
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .short('V')
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("dest")
                .long("dest")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("server")
                .long("server")
                .value_name("ADDR=FOLDER")
                .action(ArgAction::Append),
        )
        .arg(Arg::new("user").long("user").value_name("NAME"))
        .arg(Arg::new("password").long("password").value_name("SECRET"))
        .arg(Arg::new("domain").long("domain").value_name("DOMAIN"))
        .arg(
            Arg::new("port")
                .long("port")
                .value_name("PORT")
                .value_parser(value_parser!(u16)),
        )
        .arg(
            Arg::new("date-format")
                .long("date-format")
                .value_name("FORMAT"),
        )
        .arg(Arg::new("date").long("date").value_name("YYYY-MM-DD"))
        .arg(
            Arg::new("jobs")
                .long("jobs")
                .short('j')
                .value_name("N")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("checksum")
                .long("checksum")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("retries")
                .long("retries")
                .value_name("N")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECONDS")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("mount-root")
                .long("mount-root")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::Count),
        )
}

/// Parses command-line arguments into a [`ParsedArgs`] structure.
pub fn parse_args<I, S>(arguments: I) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut args: Vec<OsString> = arguments.into_iter().map(Into::into).collect();
    if args.is_empty() {
        args.push(OsString::from("share-mirror"));
    }

    let mut matches = clap_command().try_get_matches_from(args)?;

    Ok(ParsedArgs {
        show_help: matches.get_flag("help"),
        show_version: matches.get_flag("version"),
        config: matches.remove_one::<PathBuf>("config"),
        destination: matches.remove_one::<PathBuf>("dest"),
        servers: matches
            .remove_many::<String>("server")
            .map(|values| values.collect())
            .unwrap_or_default(),
        user: matches.remove_one::<String>("user"),
        password: matches.remove_one::<String>("password"),
        domain: matches.remove_one::<String>("domain"),
        port: matches.remove_one::<u16>("port"),
        date_format: matches.remove_one::<String>("date-format"),
        date: matches.remove_one::<String>("date"),
        jobs: matches.remove_one::<usize>("jobs"),
        checksum: matches.get_flag("checksum"),
        retries: matches.remove_one::<u32>("retries"),
        timeout: matches.remove_one::<u64>("timeout"),
        mount_root: matches.remove_one::<PathBuf>("mount-root"),
        quiet: matches.get_flag("quiet"),
        verbose: matches.get_count("verbose"),
    })
}
