use std::fs::File;
use std::io::{self, Read, Write};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Args as ClapArgs, Parser, Subcommand};
use crossbeam::channel::bounded;
use memmap2::Mmap;
use szs::{Algorithm, CompressionLevel, EncodeConfig, Encoder, Header, Magic};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "szs")]
#[command(about = "Compress, decompress and inspect YAZ0/YAZ1 (SZS) files")]
#[command(version)]
struct Cli {
    /// Show verbose statistics and debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compress a file to SZS
    Compress(CompressArgs),
    /// Decompress an SZS (or SZP) file
    Decompress(IoArgs),
    /// Print header information (exit 0=SZS/SZP, 1=not compressed, 2=error)
    Info(InputArgs),
    /// Convert SZS to SZP (YAY0)
    Deinterlace(IoArgs),
    /// Encode a file with every algorithm and compare the results
    Compare(CompareArgs),
}

#[derive(ClapArgs, Debug)]
struct InputArgs {
    /// Input file (use - for stdin)
    #[arg(short, long)]
    input: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct IoArgs {
    /// Input file (use - for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Output file (use - for stdout)
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct CompressArgs {
    #[command(flatten)]
    io: IoArgs,

    /// Encoding algorithm: worst-case, reference, nintendo (mkw), lib-yaz0, mk8, ct-lib, ctgp
    #[arg(short, long, default_value = "reference")]
    algorithm: Algorithm,

    /// Compression level 1-9 (lib-yaz0 only)
    #[arg(short, long, default_value = "9")]
    level: u8,

    /// Write a Yaz1 header instead of Yaz0
    #[arg(long)]
    yaz1: bool,

    /// Decode the output and check it against the input
    #[arg(long)]
    verify: bool,
}

#[derive(ClapArgs, Debug)]
struct CompareArgs {
    /// Input file (use - for stdin); SZS input is decompressed first
    #[arg(short, long)]
    input: PathBuf,

    /// Number of threads (0 = auto, 1 = single-threaded)
    #[arg(short = 't', long, default_value = "1")]
    threads: usize,
}

/// Exit codes for `info`
const EXIT_IS_COMPRESSED: u8 = 0;
const EXIT_NOT_COMPRESSED: u8 = 1;
const EXIT_ERROR: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::builder().with_default_directive(level.into()).from_env_lossy())
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<u8, Box<dyn std::error::Error>> {
    match cli.command {
        Command::Compress(args) => run_compress(&args, cli.verbose),
        Command::Decompress(args) => run_decompress(&args, cli.verbose),
        Command::Info(args) => run_info(&args),
        Command::Deinterlace(args) => run_deinterlace(&args, cli.verbose),
        Command::Compare(args) => run_compare(&args),
    }
}

/// Input bytes: memory-mapped for files, buffered for stdin
enum Input {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Deref for Input {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Input::Mapped(map) => map,
            Input::Owned(buf) => buf,
        }
    }
}

fn read_input(path: &Path) -> io::Result<Input> {
    if path.to_str() == Some("-") {
        let mut buf = Vec::new();
        io::stdin().lock().read_to_end(&mut buf)?;
        return Ok(Input::Owned(buf));
    }

    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(Input::Owned(Vec::new()));
    }
    // SAFETY: the map is read-only and dropped before the command returns;
    // concurrent truncation of the input by another process is not supported.
    let map = unsafe { Mmap::map(&file)? };
    Ok(Input::Mapped(map))
}

fn write_output(path: &Path, data: &[u8]) -> io::Result<()> {
    if path.to_str() == Some("-") {
        let mut stdout = io::stdout().lock();
        stdout.write_all(data)?;
        stdout.flush()
    } else {
        File::create(path)?.write_all(data)
    }
}

fn report(verb: &str, input: usize, output: usize, elapsed: Duration) {
    eprintln!("{} complete:", verb);
    eprintln!("  Input bytes:      {}", input);
    eprintln!("  Output bytes:     {}", output);
    if input > 0 {
        eprintln!("  Ratio:            {:.2}%", output as f64 / input as f64 * 100.0);
    }
    eprintln!("  Time:             {:.2?}", elapsed);
    eprintln!("  Throughput:       {:.1} MB/s", input as f64 / elapsed.as_secs_f64() / 1_000_000.0);
}

fn run_compress(args: &CompressArgs, verbose: bool) -> Result<u8, Box<dyn std::error::Error>> {
    let input = read_input(&args.io.input)?;
    let config = EncodeConfig {
        algorithm: args.algorithm,
        level: CompressionLevel::from_level(args.level),
        magic: if args.yaz1 { Magic::Yaz1 } else { Magic::Yaz0 },
        verify: args.verify,
    };

    let start = Instant::now();
    let encoded = Encoder::new(config).encode(&input)?;
    let elapsed = start.elapsed();
    write_output(&args.io.output, &encoded)?;

    if verbose {
        eprintln!("Algorithm:          {}", args.algorithm);
        report("Compression", input.len(), encoded.len(), elapsed);
    }
    Ok(0)
}

fn run_decompress(args: &IoArgs, verbose: bool) -> Result<u8, Box<dyn std::error::Error>> {
    let input = read_input(&args.input)?;

    let start = Instant::now();
    let decoded = if szs::szp::is_compressed(&input) {
        szs::szp::decode(&input)?
    } else {
        szs::decode(&input)?
    };
    let elapsed = start.elapsed();
    write_output(&args.output, &decoded)?;

    if verbose {
        report("Decompression", input.len(), decoded.len(), elapsed);
    }
    Ok(0)
}

fn run_deinterlace(args: &IoArgs, verbose: bool) -> Result<u8, Box<dyn std::error::Error>> {
    let input = read_input(&args.input)?;

    let start = Instant::now();
    let szp = szs::szp::deinterlace(&input)?;
    let elapsed = start.elapsed();
    write_output(&args.output, &szp)?;

    if verbose {
        report("Deinterlace", input.len(), szp.len(), elapsed);
    }
    Ok(0)
}

fn run_info(args: &InputArgs) -> Result<u8, Box<dyn std::error::Error>> {
    let input = read_input(&args.input)?;

    if szs::szp::is_compressed(&input) {
        println!("Format: SZP (Yay0)");
        if input.len() >= 8 {
            let size = u32::from_be_bytes([input[4], input[5], input[6], input[7]]);
            println!("Decoded size: {size} bytes");
        }
        println!("File size: {} bytes", input.len());
        return Ok(EXIT_IS_COMPRESSED);
    }

    if !szs::is_compressed(&input) {
        println!("Format: not compressed");
        println!("File size: {} bytes", input.len());
        return Ok(EXIT_NOT_COMPRESSED);
    }

    let header = Header::parse(&input)?;
    let magic = match header.magic {
        Magic::Yaz0 => "Yaz0",
        Magic::Yaz1 => "Yaz1",
    };
    println!("Format: SZS ({})", magic);
    println!("Decoded size: {} bytes", header.decoded_size);
    println!("Alignment: {}", header.alignment);
    println!("File size: {} bytes", input.len());
    if header.decoded_size > 0 {
        println!("Ratio: {:.2}%", input.len() as f64 / header.decoded_size as f64 * 100.0);
    }
    Ok(EXIT_IS_COMPRESSED)
}

struct CompareRow {
    algorithm: Algorithm,
    size: usize,
    time: Duration,
    roundtrip_ok: bool,
}

fn compare_one(data: &[u8], crc: u32, algorithm: Algorithm) -> szs::Result<CompareRow> {
    let start = Instant::now();
    let encoded = szs::encode(data, algorithm)?;
    let time = start.elapsed();
    let decoded = szs::decode(&encoded)?;
    let roundtrip_ok = decoded.len() == data.len() && crc32fast::hash(&decoded) == crc;
    tracing::debug!(
        algorithm = algorithm.name(),
        size = encoded.len(),
        ?time,
        "compared"
    );
    Ok(CompareRow {
        algorithm,
        size: encoded.len(),
        time,
        roundtrip_ok,
    })
}

fn run_compare(args: &CompareArgs) -> Result<u8, Box<dyn std::error::Error>> {
    let input = read_input(&args.input)?;
    let data: Vec<u8> = if szs::is_compressed(&input) {
        szs::decode(&input)?
    } else {
        input.to_vec()
    };
    let crc = crc32fast::hash(&data);

    let threads = szs::batch::effective_threads(args.threads).min(Algorithm::ALL.len());
    let (job_tx, job_rx) = bounded::<Algorithm>(Algorithm::ALL.len());
    let (result_tx, result_rx) = bounded::<szs::Result<CompareRow>>(Algorithm::ALL.len());
    for algorithm in Algorithm::ALL {
        job_tx.send(algorithm)?;
    }
    drop(job_tx);

    let data = data.as_slice();
    crossbeam::scope(|scope| {
        for _ in 0..threads {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move |_| {
                for algorithm in job_rx {
                    if result_tx.send(compare_one(data, crc, algorithm)).is_err() {
                        break;
                    }
                }
            });
        }
    })
    .map_err(|_| "compare worker panicked")?;
    drop(result_tx);

    let mut rows = result_rx.iter().collect::<szs::Result<Vec<_>>>()?;
    rows.sort_by_key(|r| Algorithm::ALL.iter().position(|a| *a == r.algorithm));

    println!(
        "| {:<12} | {:>12} | {:>8} | {:>12} | {:<9} |",
        "Algorithm", "Size", "Ratio", "Time", "Roundtrip"
    );
    println!("|{:-<14}|{:->14}|{:->10}|{:->14}|{:-<11}|", "", "", "", "", "");
    for row in &rows {
        let ratio = if data.is_empty() {
            0.0
        } else {
            row.size as f64 / data.len() as f64 * 100.0
        };
        println!(
            "| {:<12} | {:>12} | {:>7.2}% | {:>12} | {:<9} |",
            row.algorithm.name(),
            row.size,
            ratio,
            format!("{:.2?}", row.time),
            if row.roundtrip_ok { "ok" } else { "MISMATCH" }
        );
    }
    println!("CRC32: {:08x} ({} bytes)", crc, data.len());

    if rows.iter().all(|r| r.roundtrip_ok) {
        Ok(0)
    } else {
        Ok(EXIT_ERROR)
    }
}
