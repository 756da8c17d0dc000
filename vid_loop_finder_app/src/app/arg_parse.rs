use std::path::{Path, PathBuf};

use clap::{value_parser, ArgAction::*};
use vid_loop_finder_lib::AnalysisConfig;

use crate::app::*;

const ANALYZE: &str = "analyze";

// what to analyze
const ANALYSIS: &str = "Analysis";
const VIDEO_FILE: &str = "Video file";

// analysis configuration
const CONFIG_FILE: &str = "Config file";
const THRESHOLD: &str = "Similarity threshold";
const FRAME_SKIP: &str = "Frame skip";
const HASH_ALG: &str = "Hash algorithm";
const SSIM_THRESHOLD: &str = "SSIM threshold";
const SEARCH_RANGE: &str = "Search range";
const CACHE_CAPACITY: &str = "Cache capacity";

//output settings
const OUTPUT_FORMAT: &str = "Format";
const SORTED: &str = "Sort";
const SEARCH_TEXT: &str = "Search";

//Verbosity
const VERBOSITY_QUIET: &str = "Quiet";
const VERBOSITY_VERBOSE: &str = "Verbose";

const DISPLAY_ORDERING: [&str; 14] = [
    //
    // what to analyze
    ANALYSIS,
    VIDEO_FILE,
    //
    //analysis configuration
    CONFIG_FILE,
    THRESHOLD,
    FRAME_SKIP,
    HASH_ALG,
    SSIM_THRESHOLD,
    SEARCH_RANGE,
    CACHE_CAPACITY,
    //
    //outputs
    OUTPUT_FORMAT,
    SORTED,
    SEARCH_TEXT,
    //
    //verbosity
    VERBOSITY_QUIET,
    VERBOSITY_VERBOSE,
];

fn build_app() -> clap::Command {
    let get_ordering = |arg_name: &str| -> usize {
        match DISPLAY_ORDERING.iter().position(|x| *x == arg_name) {
            Some(idx) => idx,
            None => {
                panic!("argument not assigned a display order: {arg_name:?}");
            }
        }
    };

    //args are not added through method chaining because rustfmt struggles with very long expressions.
    let mut analyze = clap::Command::new(ANALYZE).about("Analyze a single video file");

    analyze = analyze.arg(
        clap::Arg::new(ANALYSIS)
            .required(true)
            .value_parser(value_parser!(AnalysisKind))
            .help("Which analysis to run")
            .display_order(get_ordering(ANALYSIS)),
    );

    analyze = analyze.arg(
        clap::Arg::new(VIDEO_FILE)
            .long("file")
            .required(true)
            .value_parser(value_parser!(PathBuf))
            .help("The video file to analyze")
            .display_order(get_ordering(VIDEO_FILE)),
    );

    analyze = analyze.arg(
        clap::Arg::new(CONFIG_FILE)
            .long("config")
            .value_parser(value_parser!(PathBuf))
            .help("A JSON file of analysis options. Options given on the command line take precedence over the file")
            .display_order(get_ordering(CONFIG_FILE)),
    );

    analyze = analyze.arg(
        clap::Arg::new(THRESHOLD)
            .long("threshold")
            .value_parser(value_parser!(f64))
            .help("Maximum dissimilarity for similar frames and first frame echoes. Smaller is stricter. Range: 0.05-0.30 (similar), 0.05-0.50 (first-frame)")
            .display_order(get_ordering(THRESHOLD)),
    );

    analyze = analyze.arg(
        clap::Arg::new(FRAME_SKIP)
            .long("frame-skip")
            .value_parser(value_parser!(u64))
            .help("Only examine every Nth frame")
            .display_order(get_ordering(FRAME_SKIP)),
    );

    analyze = analyze.arg(
        clap::Arg::new(HASH_ALG)
            .long("hash-alg")
            .value_parser(value_parser!(HashAlgArg))
            .help("Perceptual hash used by the similar and first-frame analyses")
            .display_order(get_ordering(HASH_ALG)),
    );

    analyze = analyze.arg(
        clap::Arg::new(SSIM_THRESHOLD)
            .long("ssim-threshold")
            .value_parser(value_parser!(f64))
            .help("Minimum structural similarity for a loop point. Range: 0.50-0.99")
            .display_order(get_ordering(SSIM_THRESHOLD)),
    );

    analyze = analyze.arg(
        clap::Arg::new(SEARCH_RANGE)
            .long("search-range")
            .value_parser(value_parser!(u64))
            .help("How many frames back to look for a loop point. Range: 10-1000")
            .display_order(get_ordering(SEARCH_RANGE)),
    );

    analyze = analyze.arg(
        clap::Arg::new(CACHE_CAPACITY)
            .long("cache-capacity")
            .value_parser(value_parser!(usize))
            .help("Maximum number of frames held in memory while searching for loop points")
            .display_order(get_ordering(CACHE_CAPACITY)),
    );

    analyze = analyze.arg(
        clap::Arg::new(OUTPUT_FORMAT)
            .long("format")
            .value_parser(value_parser!(OutputFormat))
            .default_value("normal")
            .help("Print results as text or as JSON")
            .display_order(get_ordering(OUTPUT_FORMAT)),
    );

    analyze = analyze.arg(
        clap::Arg::new(SORTED)
            .long("sort")
            .value_parser(value_parser!(Sorting))
            .default_value("index")
            .help("Order of the printed results")
            .display_order(get_ordering(SORTED)),
    );

    analyze = analyze.arg(
        clap::Arg::new(SEARCH_TEXT)
            .long("search")
            .value_parser(value_parser!(String))
            .help("Only print results whose timestamps or frame numbers contain this text")
            .display_order(get_ordering(SEARCH_TEXT)),
    );

    analyze = analyze.arg(
        clap::Arg::new(VERBOSITY_QUIET)
            .long("quiet")
            .help("Reduced verbosity")
            .conflicts_with(VERBOSITY_VERBOSE)
            .action(SetTrue)
            .display_order(get_ordering(VERBOSITY_QUIET)),
    );

    analyze = analyze.arg(
        clap::Arg::new(VERBOSITY_VERBOSE)
            .long("verbose")
            .help("Increased verbosity")
            .conflicts_with(VERBOSITY_QUIET)
            .action(SetTrue)
            .display_order(get_ordering(VERBOSITY_VERBOSE)),
    );

    clap::Command::new("Video loop finder")
        .version(clap::crate_version!())
        .about("Find similar frames, first frame echoes and seamless loop points in a video")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(analyze)
}

pub fn parse_args() -> AppCfg {
    let matches = build_app().get_matches();

    match cfg_from_matches(&matches) {
        Ok(cfg) => cfg,
        Err(e) => print_error_and_quit(e.into()),
    }
}

fn cfg_from_matches(matches: &clap::ArgMatches) -> Result<AppCfg, AppError> {
    //the only subcommand is required, so this always succeeds for matches from build_app.
    let Some(args) = matches.subcommand_matches(ANALYZE) else {
        return Err(AppError::ConfigFile {
            path: PathBuf::new(),
            reason: format!("expected the '{ANALYZE}' subcommand"),
        });
    };

    //capture the cwd once, to minimize the risk of working with two values if it is changed by the OS at runtime.
    let cwd = std::env::current_dir().unwrap_or_default();

    let video_path = args
        .get_one::<PathBuf>(VIDEO_FILE)
        .map(|p| absolutify_path(&cwd, p))
        .unwrap_or_default();

    let analysis = *args
        .get_one::<AnalysisKind>(ANALYSIS)
        .unwrap_or(&AnalysisKind::All);

    let mut analysis_cfg = match args.get_one::<PathBuf>(CONFIG_FILE) {
        Some(path) => load_config_file(&absolutify_path(&cwd, path))?,
        None => AnalysisConfig::default(),
    };

    let overrides = CfgOverrides {
        threshold: args.get_one::<f64>(THRESHOLD).copied(),
        frame_skip: args.get_one::<u64>(FRAME_SKIP).copied(),
        ssim_threshold: args.get_one::<f64>(SSIM_THRESHOLD).copied(),
        search_range: args.get_one::<u64>(SEARCH_RANGE).copied(),
        cache_capacity: args.get_one::<usize>(CACHE_CAPACITY).copied(),
        hash_alg: args.get_one::<HashAlgArg>(HASH_ALG).map(|alg| (*alg).into()),
    };
    overrides.apply(&mut analysis_cfg);

    let verbosity = if args.get_flag(VERBOSITY_QUIET) {
        ReportVerbosity::Quiet
    } else if args.get_flag(VERBOSITY_VERBOSE) {
        ReportVerbosity::Verbose
    } else {
        ReportVerbosity::Default
    };

    let output_cfg = OutputCfg {
        format: *args.get_one::<OutputFormat>(OUTPUT_FORMAT).unwrap_or(&OutputFormat::Normal),
        sorting: *args.get_one::<Sorting>(SORTED).unwrap_or(&Sorting::Index),
        search: args.get_one::<String>(SEARCH_TEXT).cloned(),
        verbosity,
    };

    Ok(AppCfg {
        video_path,
        analysis,
        analysis_cfg,
        output_cfg,
    })
}

fn load_config_file(path: &Path) -> Result<AnalysisConfig, AppError> {
    let to_err = |reason: String| AppError::ConfigFile {
        path: path.to_path_buf(),
        reason,
    };

    let text = std::fs::read_to_string(path).map_err(|e| to_err(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| to_err(e.to_string()))
}

fn absolutify_path(cwd: &Path, path: &Path) -> PathBuf {
    //get the absolute path if it is not absolute, by prepending the cwd.
    let path = if path.is_relative() {
        cwd.join(path)
    } else {
        path.to_path_buf()
    };

    //now try canonicalizing the path. If that fails then carry on with the joined path;
    //a missing file is reported when the analysis starts.
    let p = path.canonicalize().unwrap_or(path);

    p
}
