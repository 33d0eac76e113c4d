//! Main file runs the command-line application for `svmblock`: parse a set
//! of LibSVM files in parallel into one sparse block, report its shape, and
//! optionally dump it as CSR binary arrays.

use byte_slice_cast::ToByteSlice;
use std::error::Error;
use std::path::PathBuf;
use structopt::clap::arg_enum;
use structopt::StructOpt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use svmblock::{ChunkSource, FeatureId, FeatureValue, LibSvmParser, ParserConfig};

arg_enum! {

#[derive(Debug, Clone, Copy)]
enum IndexWidth {
    U32,
    U64
}

}

arg_enum! {

#[derive(Debug, Clone, Copy)]
enum ValueWidth {
    F32,
    F64
}

}

/// Reads a sequence of LibSVM files, treated as one stream in the order
/// given. Each file is memory-mapped and split into line-aligned chunks
/// that are parsed in parallel, then concatenated in input order.
///
/// Every line looks like
///
/// <label>[:<weight>] [qid:<id>] <feature>:<value> ... [# comment]
///
/// Weights and qids must appear on every record or on none.
///
/// Calls into rayon, so use `RAYON_NUM_THREADS` env variable to
/// control thread count. Use `RUST_LOG` to control log verbosity.
#[derive(Debug, StructOpt)]
#[structopt(name = "svmblock", about = "Parse LibSVM files into CSR arrays.")]
struct Opt {
    /// Input files, read in parallel (space separated).
    #[structopt(required = true)]
    inputs: Vec<PathBuf>,

    /// Input format; only `libsvm` is understood.
    #[structopt(long, default_value = "libsvm")]
    format: String,

    /// If >0, feature ids are 1-based. If =0, they are 0-based. If <0,
    /// each chunk is treated as 1-based when id 0 never appears in it.
    #[structopt(long, default_value = "0", allow_hyphen_values = true)]
    indexing_mode: i32,

    /// Width of the feature id type.
    #[structopt(long, default_value = "u32", possible_values = &IndexWidth::variants(), case_insensitive = true)]
    index_width: IndexWidth,

    /// Width of the feature value type.
    #[structopt(long, default_value = "f32", possible_values = &ValueWidth::variants(), case_insensitive = true)]
    value_width: ValueWidth,

    /// If specified, write <stem>.y.bin, <stem>.indptr.bin, <stem>.indices.bin,
    /// <stem>.data.bin (and weight/qid when present) next to this path.
    #[structopt(long)]
    bins: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let opt = Opt::from_args();

    let config = ParserConfig {
        format: opt.format.clone(),
        indexing_mode: opt.indexing_mode,
    };
    let parser = LibSvmParser::new(&config)?;

    match (opt.index_width, opt.value_width) {
        (IndexWidth::U32, ValueWidth::F32) => run::<u32, f32>(&opt, &parser),
        (IndexWidth::U32, ValueWidth::F64) => run::<u32, f64>(&opt, &parser),
        (IndexWidth::U64, ValueWidth::F32) => run::<u64, f32>(&opt, &parser),
        (IndexWidth::U64, ValueWidth::F64) => run::<u64, f64>(&opt, &parser),
    }
}

fn run<I, V>(opt: &Opt, parser: &LibSvmParser) -> Result<(), Box<dyn Error>>
where
    I: FeatureId + ToByteSlice,
    V: FeatureValue + ToByteSlice,
{
    let nthreads = rayon::current_num_threads();
    info!("num threads {}", nthreads);
    let scan = ChunkSource::open(opt.inputs.clone(), nthreads)?;
    info!("num chunks {}", scan.num_chunks());

    let block = scan.parse::<I, V>(parser)?;
    info!("num rows {}", block.num_rows());
    info!("num nonzeros {}", block.num_nonzeros());
    info!("max feature id {:?}", block.max_index());
    info!("weights {}", block.has_weight());
    info!("qids {}", block.has_qid());

    if let Some(stem) = &opt.bins {
        for path in svmblock::bins::write_bins(&block, stem)? {
            info!("wrote {:?}", path);
        }
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}
