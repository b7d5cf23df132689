#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use kestrel_consensus::{
    decode_compact, get_next_work_required, validate_pow, work_from_bits, HeaderIndex,
    RetargetEra,
};
use kestrel_core::{BlockHeaderRecord, ConsensusParams, Hash32, Network};
use num_bigint::BigUint;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kestrel", version, about = "Kestrel difficulty and proof-of-work tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug)]
struct NetworkArgs {
    /// mainnet, testnet or regtest.
    #[arg(long, default_value = "mainnet")]
    network: Network,
    /// JSON file with a full `ConsensusParams` replacing the network preset.
    #[arg(long)]
    params: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compact target required of the next block.
    NextWork {
        #[command(flatten)]
        net: NetworkArgs,
        /// JSON array of `{height, time, bits}` records, oldest first.
        #[arg(long)]
        chain: PathBuf,
        /// Candidate block time; defaults to one spacing after the last record.
        #[arg(long)]
        time: Option<u64>,
    },
    /// Check a block hash against compact bits.
    CheckPow {
        #[command(flatten)]
        net: NetworkArgs,
        #[arg(long)]
        hash: Hash32,
        #[arg(long, value_parser = parse_bits)]
        bits: u32,
        /// The hash is written in little-endian byte order.
        #[arg(long)]
        le: bool,
    },
    /// Show the target a compact encoding stands for.
    DecodeBits {
        #[arg(value_parser = parse_bits)]
        bits: u32,
    },
}

fn parse_bits(s: &str) -> Result<u32, String> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    u32::from_str_radix(digits, 16).map_err(|e| format!("invalid compact bits {s:?}: {e}"))
}

fn load_params(net: &NetworkArgs) -> Result<ConsensusParams> {
    let params = match &net.params {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let params: ConsensusParams =
                serde_json::from_str(&raw).context("invalid consensus params")?;
            info!(path = %path.display(), "using consensus params override");
            params
        }
        None => ConsensusParams::for_network(net.network),
    };
    params.validate().context("inconsistent consensus params")?;
    Ok(params)
}

fn load_chain(path: &Path) -> Result<HeaderIndex> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let records: Vec<BlockHeaderRecord> =
        serde_json::from_str(&raw).context("invalid header records")?;
    let index = HeaderIndex::from_records(records).context("header records out of order")?;
    debug!(
        base = index.base_height(),
        len = index.len(),
        "loaded header records"
    );
    Ok(index)
}

fn target_hex(target: &BigUint) -> String {
    let bytes = target.to_bytes_be();
    let mut padded = vec![0u8; 32usize.saturating_sub(bytes.len())];
    padded.extend_from_slice(&bytes);
    hex::encode(padded)
}

/// Requirement for the block after the newest loaded record.
#[derive(Debug)]
struct NextWork {
    height: u64,
    bits: u32,
    era: RetargetEra,
    work: BigUint,
}

fn compute_next_work(
    params: &ConsensusParams,
    index: &HeaderIndex,
    time: Option<u64>,
) -> Result<NextWork> {
    let last = *index
        .tip()
        .ok_or_else(|| anyhow!("no header records loaded"))?;
    let candidate_time = match time {
        Some(t) => t,
        None => u64::try_from(last.time.saturating_add(params.pow_target_spacing))
            .context("last record time is negative; pass --time")?,
    };

    let height = last.height.saturating_add(1);
    let bits = get_next_work_required(index, &last, candidate_time, params)?;
    Ok(NextWork {
        height,
        bits,
        era: RetargetEra::for_next_height(height, params),
        work: work_from_bits(bits)?,
    })
}

fn next_work(net: &NetworkArgs, chain: &Path, time: Option<u64>) -> Result<()> {
    let params = load_params(net)?;
    let index = load_chain(chain)?;
    let next = compute_next_work(&params, &index, time)
        .with_context(|| format!("next work for {}", chain.display()))?;
    let era = match next.era {
        RetargetEra::Legacy => "legacy",
        RetargetEra::PerBlock => "per-block",
    };

    println!("height: {}", next.height);
    println!("bits:   {:08x}", next.bits);
    println!("era:    {era}");
    println!("work:   {:x}", next.work);
    Ok(())
}

fn check_pow(net: &NetworkArgs, hash: Hash32, bits: u32, le: bool) -> Result<bool> {
    let params = load_params(net)?;
    let hash = if le { Hash32::from_le_bytes(hash.0) } else { hash };
    match validate_pow(&hash, bits, &params) {
        Ok(()) => {
            println!("valid");
            Ok(true)
        }
        Err(err) => {
            println!("invalid: {err}");
            Ok(false)
        }
    }
}

fn decode_bits(bits: u32) -> Result<()> {
    let decoded = decode_compact(bits);
    println!("target:   {}", target_hex(&decoded.target));
    println!("negative: {}", decoded.negative);
    println!("overflow: {}", decoded.overflow);
    if !decoded.is_valid() {
        bail!("{bits:08x} is not a usable target");
    }
    Ok(())
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let cli = Cli::parse();

    match cli.command {
        Commands::NextWork { net, chain, time } => next_work(&net, &chain, time)?,
        Commands::CheckPow {
            net,
            hash,
            bits,
            le,
        } => {
            if !check_pow(&net, hash, bits, le)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::DecodeBits { bits } => decode_bits(bits)?,
    }
    Ok(ExitCode::SUCCESS)
}
