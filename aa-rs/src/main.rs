use anyhow::{anyhow, Context, Result};
use callkit_aa::config::{load_operation, OperationFile};
use callkit_aa::encoding::{fmt_address, fmt_h256, packed_user_op_to_json, user_op_to_json};
use callkit_aa::signer::{sign_user_operation, wallet_from_private_key};
use callkit_abi::{
    decode_hex, decode_output, decode_with_abi, encode_call, encode_hex, Abi, AbiError,
    AbiValue, DecodedParams, FunctionSignature,
};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

// With --json, stdout carries exactly one JSON object and every
// human-readable line goes to stderr instead.
macro_rules! outln {
    ($machine_mode:expr, $($arg:tt)*) => {{
        if $machine_mode {
            eprintln!($($arg)*);
        } else {
            println!($($arg)*);
        }
    }};
}

#[derive(Parser, Debug)]
#[command(name = "callkit", version)]
struct Cli {
    /// Print a single JSON object to stdout; all other output goes to stderr.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the 4-byte selector of a function signature.
    Selector(SelectorArgs),

    /// Encode call data for an ABI function.
    Encode(EncodeArgs),

    /// Find the ABI function a call data blob targets and decode its arguments.
    Decode(DecodeArgs),

    /// Decode return data of an ABI function.
    DecodeOutput(DecodeOutputArgs),

    /// Print the packed form of a UserOperation.
    Pack(PackArgs),

    /// Print the userOpHash the account has to sign.
    Hash(HashArgs),

    /// Sign a UserOperation with an owner key and print the signed operation.
    Sign(SignArgs),
}

#[derive(Args, Debug)]
struct SelectorArgs {
    /// e.g. `transfer(address,uint256)`
    signature: String,
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// JSON ABI (bare array or a compiler artifact with an `abi` field).
    #[arg(long, env = "CALLKIT_ABI")]
    abi: PathBuf,

    /// Function name, or full signature to pick an overload.
    #[arg(long)]
    function: String,

    /// Arguments as a JSON array, e.g. `["0xabc...", "1000"]`.
    #[arg(long, default_value = "[]")]
    args: String,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    #[arg(long, env = "CALLKIT_ABI")]
    abi: PathBuf,

    /// `0x` call data, selector included.
    #[arg(long)]
    data: String,
}

#[derive(Args, Debug)]
struct DecodeOutputArgs {
    #[arg(long, env = "CALLKIT_ABI")]
    abi: PathBuf,

    #[arg(long)]
    function: String,

    /// `0x` return data from `eth_call`.
    #[arg(long)]
    data: String,
}

#[derive(Args, Debug)]
struct OpArgs {
    /// Operation file (camelCase JSON, quantities as hex or decimal strings).
    #[arg(long, env = "CALLKIT_OP")]
    op: PathBuf,
}

#[derive(Args, Debug)]
struct TargetArgs {
    /// EntryPoint address; overrides `entryPoint` in the operation file.
    #[arg(long, env = "CALLKIT_ENTRYPOINT")]
    entrypoint: Option<String>,

    /// Chain id; overrides `chainId` in the operation file.
    #[arg(long, env = "CALLKIT_CHAIN_ID")]
    chain_id: Option<u64>,
}

#[derive(Args, Debug)]
struct PackArgs {
    #[command(flatten)]
    op: OpArgs,
}

#[derive(Args, Debug)]
struct HashArgs {
    #[command(flatten)]
    op: OpArgs,

    #[command(flatten)]
    target: TargetArgs,
}

#[derive(Args, Debug)]
struct SignArgs {
    #[command(flatten)]
    op: OpArgs,

    #[command(flatten)]
    target: TargetArgs,

    /// Smart account owner private key.
    ///
    /// Recommended: set via env var CALLKIT_PRIVATE_KEY.
    #[arg(long, env = "CALLKIT_PRIVATE_KEY", hide_env_values = true)]
    private_key: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        // Logs always go to stderr so stdout stays usable from scripts.
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;

    match cli.cmd {
        Command::Selector(args) => cmd_selector(args, json),
        Command::Encode(args) => cmd_encode(args, json),
        Command::Decode(args) => cmd_decode(args, json),
        Command::DecodeOutput(args) => cmd_decode_output(args, json),
        Command::Pack(args) => cmd_pack(args, json),
        Command::Hash(args) => cmd_hash(args, json),
        Command::Sign(args) => cmd_sign(args, json).await,
    }
}

fn cmd_selector(args: SelectorArgs, json: bool) -> Result<()> {
    let sig = FunctionSignature::parse(&args.signature)
        .with_context(|| format!("invalid signature `{}`", args.signature))?;
    let selector = encode_hex(&sig.selector());

    if json {
        let out = serde_json::json!({
            "signature": sig.canonical(),
            "selector": selector,
        });
        println!("{}", out);
    }
    outln!(json, "{}", selector);
    Ok(())
}

fn cmd_encode(args: EncodeArgs, json: bool) -> Result<()> {
    let abi = load_abi(&args.abi)?;
    let sig = abi.function(&args.function)?;
    let raw_args: serde_json::Value =
        serde_json::from_str(&args.args).context("--args must be a JSON array")?;
    let types: Vec<_> = sig.inputs.iter().map(|p| p.kind.clone()).collect();
    let values = AbiValue::from_json_args(&types, &raw_args)
        .with_context(|| format!("invalid arguments for {}", sig.canonical()))?;
    let call_data = encode_hex(&encode_call(&sig, &values)?);

    if json {
        let out = serde_json::json!({
            "function": sig.canonical(),
            "selector": encode_hex(&sig.selector()),
            "callData": call_data,
        });
        println!("{}", out);
    }
    outln!(json, "{}", call_data);
    Ok(())
}

fn cmd_decode(args: DecodeArgs, json: bool) -> Result<()> {
    let abi = load_abi(&args.abi)?;
    let data = decode_hex(&args.data).context("invalid --data hex")?;

    let (sig, params) = match decode_with_abi(&abi, &data) {
        Ok(found) => found,
        Err(AbiError::FunctionNotFound(selector)) => {
            if json {
                let out = serde_json::json!({
                    "function": serde_json::Value::Null,
                    "selector": selector,
                    "error": "unknown function",
                });
                println!("{}", out);
            }
            return Err(anyhow!("unknown function: selector {selector} is not in the ABI"));
        }
        Err(e) => return Err(e).context("failed to decode call data"),
    };

    if json {
        let out = serde_json::json!({
            "function": sig.name,
            "signature": sig.canonical(),
            "params": params.to_json(),
        });
        println!("{}", out);
    }
    outln!(json, "function:  {}", sig.canonical());
    print_params(json, &params);
    Ok(())
}

fn cmd_decode_output(args: DecodeOutputArgs, json: bool) -> Result<()> {
    let abi = load_abi(&args.abi)?;
    let sig = abi.function(&args.function)?;
    let data = decode_hex(&args.data).context("invalid --data hex")?;
    let params = decode_output(&sig, &data)
        .with_context(|| format!("failed to decode return data of {}", sig.canonical()))?;

    if json {
        let out = serde_json::json!({
            "function": sig.canonical(),
            "outputs": params.to_json(),
        });
        println!("{}", out);
    }
    print_params(json, &params);
    Ok(())
}

fn cmd_pack(args: PackArgs, json: bool) -> Result<()> {
    let file = load_operation(&args.op.op)?;
    let packed = file.op.pack();

    let out = packed_user_op_to_json(&packed);
    if json {
        println!("{}", out);
    } else {
        println!("{}", serde_json::to_string_pretty(&out)?);
    }
    Ok(())
}

fn cmd_hash(args: HashArgs, json: bool) -> Result<()> {
    let file = load_operation(&args.op.op)?;
    let target = resolve_target(&file, &args.target)?;
    let user_op_hash = file.op.hash(target.entry_point, target.chain_id);

    if json {
        let out = serde_json::json!({
            "userOpHash": fmt_h256(user_op_hash),
            "entryPoint": fmt_address(target.entry_point),
            "chainId": target.chain_id,
        });
        println!("{}", out);
    }
    outln!(json, "entryPoint:  {}", fmt_address(target.entry_point));
    outln!(json, "chainId:     {}", target.chain_id);
    outln!(json, "userOpHash:  {}", fmt_h256(user_op_hash));
    Ok(())
}

async fn cmd_sign(args: SignArgs, json: bool) -> Result<()> {
    let file = load_operation(&args.op.op)?;
    let target = resolve_target(&file, &args.target)?;

    let wallet = wallet_from_private_key(&args.private_key).context("invalid owner private key")?;
    let (signed, user_op_hash) =
        sign_user_operation(&file.op, target.entry_point, target.chain_id, &wallet)
            .await
            .context("failed to sign userOpHash")?;

    tracing::info!(
        owner = %fmt_address(ethers::signers::Signer::address(&wallet)),
        user_op_hash = %fmt_h256(user_op_hash),
        "signed user operation"
    );

    if json {
        let out = serde_json::json!({
            "userOpHash": fmt_h256(user_op_hash),
            "userOperation": user_op_to_json(&signed),
        });
        println!("{}", out);
    }
    outln!(json, "userOpHash:  {}", fmt_h256(user_op_hash));
    outln!(
        json,
        "{}",
        serde_json::to_string_pretty(&user_op_to_json(&signed))?
    );
    Ok(())
}

fn resolve_target(file: &OperationFile, target: &TargetArgs) -> Result<callkit_aa::HashTarget> {
    file.hash_target(target.entrypoint.as_deref(), target.chain_id)
}

fn load_abi(path: &Path) -> Result<Abi> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read ABI json at {}", path.display()))?;
    Abi::from_json(&raw).with_context(|| format!("failed to parse ABI json at {}", path.display()))
}

fn print_params(json: bool, params: &DecodedParams) {
    for (name, value) in params.iter() {
        outln!(json, "  {:<12} {}", name, value);
    }
}
