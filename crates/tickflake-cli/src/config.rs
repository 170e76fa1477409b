use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use core::time::Duration;
use tickflake::{GeneratorConfig, Layout, TWITTER_EPOCH};

/// Command-line interface of the `tickflake` binary.
///
/// Every option can also be supplied through the environment variable named
/// in its help text, and a `.env` file in the working directory is loaded
/// before parsing.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "tickflake",
    version,
    about = "Mint and decode 64-bit Snowflake-style IDs"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Mint identifiers and print one per line.
    Mint(MintArgs),
    /// Split identifiers into their fields.
    Decode(DecodeArgs),
}

/// Field widths and epoch shared by both subcommands. The defaults are the
/// Twitter layout (41/10/12) and the Twitter epoch.
#[derive(Args, Debug, Clone)]
pub struct LayoutArgs {
    /// Width of the timestamp field in bits.
    ///
    /// Environment variable: `TICKFLAKE_TIMESTAMP_BITS`
    #[arg(long, env = "TICKFLAKE_TIMESTAMP_BITS", default_value_t = Layout::TWITTER.timestamp_bits())]
    pub timestamp_bits: u32,

    /// Width of the node ID field in bits.
    ///
    /// Environment variable: `TICKFLAKE_NODE_BITS`
    #[arg(long, env = "TICKFLAKE_NODE_BITS", default_value_t = Layout::TWITTER.node_bits())]
    pub node_bits: u32,

    /// Width of the sequence field in bits.
    ///
    /// Environment variable: `TICKFLAKE_SEQUENCE_BITS`
    #[arg(long, env = "TICKFLAKE_SEQUENCE_BITS", default_value_t = Layout::TWITTER.sequence_bits())]
    pub sequence_bits: u32,

    /// Zero point of the timestamp field, in milliseconds since the Unix
    /// epoch.
    ///
    /// Environment variable: `TICKFLAKE_EPOCH_MS`
    #[arg(long, env = "TICKFLAKE_EPOCH_MS", default_value_t = TWITTER_EPOCH.as_millis() as u64)]
    pub epoch_ms: u64,
}

#[derive(Args, Debug, Clone)]
pub struct MintArgs {
    /// Number of identifiers to mint.
    ///
    /// Environment variable: `TICKFLAKE_COUNT`
    #[arg(short = 'n', long, env = "TICKFLAKE_COUNT", default_value_t = 1)]
    pub count: u64,

    /// Node ID embedded in every identifier. Must fit in `--node-bits`.
    ///
    /// Environment variable: `TICKFLAKE_NODE_ID`
    #[arg(long, env = "TICKFLAKE_NODE_ID", default_value_t = 0)]
    pub node_id: u64,

    /// A period spans `2^period_shift` milliseconds.
    ///
    /// Environment variable: `TICKFLAKE_PERIOD_SHIFT`
    #[arg(long, env = "TICKFLAKE_PERIOD_SHIFT", default_value_t = GeneratorConfig::TWITTER_PERIOD_SHIFT)]
    pub period_shift: u32,

    /// Identifiers available per period. Must fit in `--sequence-bits`.
    ///
    /// Environment variable: `TICKFLAKE_BOUND`
    #[arg(long, env = "TICKFLAKE_BOUND", default_value_t = GeneratorConfig::TWITTER_BOUND)]
    pub bound: u64,

    #[command(flatten)]
    pub layout: LayoutArgs,
}

#[derive(Args, Debug, Clone)]
pub struct DecodeArgs {
    /// Identifiers to decode, as unsigned decimal integers.
    #[arg(required = true, value_name = "ID")]
    pub ids: Vec<u64>,

    #[command(flatten)]
    pub layout: LayoutArgs,
}

/// A validated `mint` invocation.
#[derive(Debug, Clone)]
pub struct MintConfig {
    pub count: u64,
    pub generator: GeneratorConfig,
}

/// A validated `decode` invocation.
#[derive(Debug, Clone)]
pub struct DecodeConfig {
    pub ids: Vec<u64>,
    pub layout: Layout,
    pub epoch_ms: u64,
}

impl TryFrom<LayoutArgs> for Layout {
    type Error = anyhow::Error;

    fn try_from(args: LayoutArgs) -> Result<Self, Self::Error> {
        Layout::new(args.timestamp_bits, args.node_bits, args.sequence_bits)
            .context("invalid field widths")
    }
}

impl TryFrom<MintArgs> for MintConfig {
    type Error = anyhow::Error;

    fn try_from(args: MintArgs) -> Result<Self, Self::Error> {
        if args.count == 0 {
            bail!("TICKFLAKE_COUNT must be greater than 0");
        }

        let epoch = Duration::from_millis(args.layout.epoch_ms);
        let generator = GeneratorConfig {
            node_id: args.node_id,
            layout: Layout::try_from(args.layout)?,
            epoch,
            period_shift: args.period_shift,
            bound: args.bound,
        };
        generator
            .validate()
            .context("invalid generator configuration")?;

        Ok(Self {
            count: args.count,
            generator,
        })
    }
}

impl TryFrom<DecodeArgs> for DecodeConfig {
    type Error = anyhow::Error;

    fn try_from(args: DecodeArgs) -> Result<Self, Self::Error> {
        let epoch_ms = args.layout.epoch_ms;
        let layout = Layout::try_from(args.layout)?;

        if let Some(id) = args.ids.iter().find(|&&id| !layout.is_valid(id)) {
            bail!("{id} does not fit the {}-bit layout", layout.total_bits());
        }

        Ok(Self {
            ids: args.ids,
            layout,
            epoch_ms,
        })
    }
}
