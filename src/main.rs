use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom, Write},
    path::PathBuf,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::Level;

use sift6502::{
    analysis::{analyse_code_blocks, default_segments, vector_entry_symbols, AnalysisConfig},
    listing::{gen_print_items, write_equates, write_listing},
    parser::{parse_hex, parse_hex_u16, read_segments, read_symbols},
    symbol::{build_symbols, merge_symbols, sort_symbols},
    DataBlock,
};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Binary image file
    input: PathBuf,

    /// Load address of the image (hex, e.g. 8000, $8000, or 0x8000)
    address: String,

    /// Byte offset into the input file (hex)
    #[arg(long)]
    offset: Option<String>,

    /// Number of bytes to analyse (hex, default: rest of the file)
    #[arg(long)]
    size: Option<String>,

    /// Segment table CSV (name,start,size,caps)
    #[arg(short = 'm', long)]
    segments: Option<PathBuf>,

    /// Symbol table CSV (name,value,caps)
    #[arg(short, long)]
    symbols: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Allow BRK instructions in analysed code
    #[arg(long)]
    brk: bool,

    /// Generate symbols for addresses outside the image too
    #[arg(long)]
    auto_symbols: bool,

    /// Print input symbols alongside generated ones in the equate block
    #[arg(long)]
    print_input_symbols: bool,

    /// One of `TRACE`, `DEBUG`, `INFO`, `WARN`, or `ERROR`
    #[arg(short, long, default_value_t = Level::INFO)]
    log_level: Level,
}

fn load_image(args: &Args) -> Result<DataBlock> {
    let address = parse_hex_u16(&args.address)
        .with_context(|| format!("bad load address {:?}", args.address))?;

    let mut file = File::open(&args.input)
        .with_context(|| format!("cannot open input file {:?}", args.input))?;

    if let Some(offset) = &args.offset {
        let offset = parse_hex(offset).with_context(|| format!("bad offset {:?}", offset))?;

        file.seek(SeekFrom::Start(offset))
            .with_context(|| format!("cannot seek to offset ${:X}", offset))?;
    }

    let mut data = Vec::new();

    match &args.size {
        Some(size) => {
            let size = parse_hex(size).with_context(|| format!("bad size {:?}", size))?;

            data.resize(size as usize, 0);
            file.read_exact(&mut data)
                .with_context(|| format!("cannot read ${:X} bytes from input", size))?;
        }
        None => {
            file.read_to_end(&mut data).context("cannot read input file")?;
        }
    }

    if data.is_empty() {
        bail!("input image is empty");
    }

    // Block sizes are 16 bits, so the image tops out one byte short of 64K.
    if data.len() > usize::min(0xFFFF, 0x10000 - address as usize) {
        bail!(
            "image of {} bytes loaded at ${:04X} does not fit in the address space",
            data.len(),
            address
        );
    }

    Ok(DataBlock::new(address, data))
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(io::stderr)
        .init();

    let image = load_image(&args)?;

    let segments = match &args.segments {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("cannot open segment table {:?}", path))?;

            read_segments(file).with_context(|| format!("bad segment table {:?}", path))?
        }
        None => default_segments(),
    };

    let mut input_symbols = match &args.symbols {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("cannot open symbol table {:?}", path))?;

            read_symbols(file).with_context(|| format!("bad symbol table {:?}", path))?
        }
        None => Vec::new(),
    };

    input_symbols.extend(vector_entry_symbols(&image));
    sort_symbols(&mut input_symbols);

    let config = AnalysisConfig {
        image: &image,
        segments: &segments,
        symbols: &input_symbols,
        allow_brk: args.brk,
    };

    let blocks = analyse_code_blocks(&config);
    tracing::info!("analysis found {} code blocks", blocks.len());

    let new_symbols = build_symbols(&config, &blocks, args.auto_symbols);
    let all_symbols = merge_symbols(input_symbols, new_symbols.clone());

    let items = gen_print_items(image.as_block(), &blocks, &all_symbols);

    let mut output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("cannot open output file {:?}", path))?,
        ),
        None => Box::new(io::stdout()),
    };

    let equates = if args.print_input_symbols { &all_symbols } else { &new_symbols };

    write_equates(image.as_block(), equates, &mut output).context("cannot write output")?;
    write_listing(&image, &items, &all_symbols, &mut output).context("cannot write output")?;

    Ok(())
}
