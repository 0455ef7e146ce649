//! Publish command-line flags
//!
//! The pipeline accepts CLI-style tokens: a positional version-bump
//! specifier (defaulting to "patch"), `--yolo`, `--dry-run`/`-d`, and
//! `--otp`/`-o`.

use clap::Parser;
use secrecy::SecretString;

/// Default bump kind when none is supplied
pub const DEFAULT_BUMP: &str = "patch";

fn parse_otp(token: &str) -> Result<SecretString, std::convert::Infallible> {
    Ok(SecretString::from(token.to_owned()))
}

/// Parsed publish flags
#[derive(Debug, Default, clap::Args)]
pub struct PublishArgs {
    /// Version bump to apply: patch, minor, major, or an explicit version
    #[arg(value_name = "BUMP")]
    pub bump: Option<String>,

    /// Skip dependency reinstall and the test suite
    #[arg(long)]
    pub yolo: bool,

    /// Ask the registry for a no-op publish; also the only way past the
    /// test-environment safety gate
    #[arg(short = 'd', long = "dry-run")]
    pub dry_run: bool,

    /// One-time password forwarded to the publish step
    #[arg(short = 'o', long, value_name = "TOKEN", value_parser = parse_otp)]
    pub otp: Option<SecretString>,
}

#[derive(Parser)]
#[command(name = "publish", no_binary_name = true)]
struct TokenParser {
    #[command(flatten)]
    args: PublishArgs,
}

impl PublishArgs {
    /// Parse an ordered sequence of CLI-style tokens
    pub fn parse_tokens(tokens: &[String]) -> Result<Self, clap::Error> {
        TokenParser::try_parse_from(tokens).map(|parser| parser.args)
    }

    /// Bump specifier with the "patch" default applied
    pub fn bump_or_default(&self) -> &str {
        self.bump.as_deref().unwrap_or(DEFAULT_BUMP)
    }
}

/// Check a bump specifier: a named kind or an explicit semver version
pub fn is_valid_bump(kind: &str) -> bool {
    matches!(kind, "patch" | "minor" | "major") || semver::Version::parse(kind).is_ok()
}
