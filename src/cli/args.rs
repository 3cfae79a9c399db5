//! Command-line argument parsing for the `bootcodec` binary.
//!
//! A thin `clap` derive surface over the library's three entry points:
//! one-shot XZ decode, one-shot gzip decode, and payload-chain inspection.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "bootcodec", author, version, about, long_about = None)]
pub struct ParsedArgs {
    /// Increase diagnostic verbosity; repeat for more (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a single-block XZ stream (LZMA2 filter only).
    XzDecode {
        input: PathBuf,
        output: PathBuf,
    },
    /// Decode a gzip member.
    GzipDecode {
        input: PathBuf,
        output: PathBuf,
    },
    /// Walk a concatenated payload stream and report what it contains.
    Inspect {
        payload: PathBuf,
    },
}

/// Maps `-v` repeats and `-q` onto the crate's 0-4 display-level scale.
pub fn resolve_display_level(args: &ParsedArgs) -> u32 {
    if args.quiet {
        return 0;
    }
    match args.verbose {
        0 => 2,
        1 => 3,
        _ => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_wins_over_default_verbosity() {
        let args = ParsedArgs::parse_from(["bootcodec", "-q", "inspect", "x"]);
        assert_eq!(resolve_display_level(&args), 0);
    }

    #[test]
    fn repeated_verbose_saturates_at_four() {
        let args = ParsedArgs::parse_from(["bootcodec", "-vvv", "inspect", "x"]);
        assert_eq!(resolve_display_level(&args), 4);
    }

    #[test]
    fn parses_xz_decode_subcommand() {
        let args = ParsedArgs::parse_from(["bootcodec", "xz-decode", "in.xz", "out.bin"]);
        match args.command {
            Command::XzDecode { input, output } => {
                assert_eq!(input, PathBuf::from("in.xz"));
                assert_eq!(output, PathBuf::from("out.bin"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
