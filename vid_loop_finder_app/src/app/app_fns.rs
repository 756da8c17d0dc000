use std::{
    error::Error as StdError,
    io::{BufWriter, Write},
    path::Path,
};

use serde_json::{Map, Value};
use vid_loop_finder_lib::*;

use crate::app::{
    search_output::{ResultRow, SearchOutput},
    *,
};

// * read cfg
// * open the video (once per analysis)
// * run the analyses
// * sort and filter the results
// * output results

pub fn run_app() -> i32 {
    let cfg = arg_parse::parse_args();
    configure_logs(cfg.output_cfg.verbosity);

    match run_app_inner(&cfg) {
        Ok(()) => 0,
        Err(fatal_error) => {
            print_fatal_err(fatal_error, cfg.output_cfg.verbosity);
            1
        }
    }
}

/// Everything an `analyze` run produced. Analyses that were not requested are `None`.
#[derive(Debug, Default)]
struct AnalysisOutputs {
    similar: Option<SearchOutput<SimilarPair>>,
    first_frame: Option<SearchOutput<ReferenceMatch>>,
    loops: Option<SearchOutput<LoopCandidate>>,
}

fn run_app_inner(cfg: &AppCfg) -> eyre::Result<()> {
    let video_path = &cfg.video_path;
    if !video_path.exists() {
        return Err(AppError::VideoNotFound(video_path.clone()).into());
    }

    cfg.analysis_cfg.validate().map_err(AppError::from)?;
    let hasher = FrameHasher::new(cfg.analysis_cfg.hash).map_err(AppError::from)?;

    let mut outputs = run_analyses(cfg, &hasher)?;

    if let Some(query) = &cfg.output_cfg.search {
        info!(target: "app", "Filtering results for {query:?}");
    }
    prepare(&mut outputs.similar, &cfg.output_cfg);
    prepare(&mut outputs.first_frame, &cfg.output_cfg);
    prepare(&mut outputs.loops, &cfg.output_cfg);

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match cfg.output_cfg.format {
        OutputFormat::Normal => write_normal(&outputs, &mut out)?,
        OutputFormat::Json => write_json(video_path, &outputs, &mut out)?,
    }
    out.flush().map_err(AppError::from)?;

    Ok(())
}

// Each analysis opens its own source, so that `all` can run them concurrently without sharing
// a decoder.
fn run_analyses(cfg: &AppCfg, hasher: &FrameHasher) -> Result<AnalysisOutputs, AppError> {
    let kind = cfg.analysis;
    let path = cfg.video_path.as_path();

    let mut similar = None;
    let mut first_frame = None;
    let mut loops = None;

    rayon::scope(|s| {
        if kind.includes(AnalysisKind::Similar) {
            s.spawn(|_| similar = Some(run_similar(path, &cfg.analysis_cfg.similar, hasher)));
        }
        if kind.includes(AnalysisKind::FirstFrame) {
            s.spawn(|_| first_frame = Some(run_first_frame(path, &cfg.analysis_cfg.first_frame, hasher)));
        }
        if kind.includes(AnalysisKind::Loop) {
            s.spawn(|_| loops = Some(run_loop(path, &cfg.analysis_cfg.looping)));
        }
    });

    Ok(AnalysisOutputs {
        similar: similar.transpose()?,
        first_frame: first_frame.transpose()?,
        loops: loops.transpose()?,
    })
}

fn progress_logger(title: &'static str) -> ScanControl {
    ScanControl::new().with_progress(move |p| {
        debug!(target: "progress", "{title}: frame {} of {}", p.current, p.total);
    })
}

fn run_similar(
    path: &Path,
    opts: &SimilarFrameOptions,
    hasher: &FrameHasher,
) -> Result<SearchOutput<SimilarPair>, AppError> {
    let title = "Similar frames";
    let mut source = FfmpegFrameSource::open(path)?;
    let scan = find_similar_frames(&mut source, opts, hasher, &progress_logger(title))?;
    Ok(SearchOutput::new(title, source.fps(), scan))
}

fn run_first_frame(
    path: &Path,
    opts: &FirstFrameOptions,
    hasher: &FrameHasher,
) -> Result<SearchOutput<ReferenceMatch>, AppError> {
    let title = "First frame echoes";
    let mut source = FfmpegFrameSource::open(path)?;
    let scan = find_first_frame_echoes(&mut source, opts, hasher, &progress_logger(title))?;
    Ok(SearchOutput::new(title, source.fps(), scan))
}

fn run_loop(path: &Path, opts: &LoopOptions) -> Result<SearchOutput<LoopCandidate>, AppError> {
    let title = "Loop candidates";
    let mut source = FfmpegFrameSource::open(path)?;
    let scan = find_loop_candidates(&mut source, opts, &progress_logger(title))?;
    Ok(SearchOutput::new(title, source.fps(), scan))
}

fn prepare<T: ResultRow>(output: &mut Option<SearchOutput<T>>, output_cfg: &OutputCfg) {
    if let Some(output) = output {
        output.log_summary();
        output.sort(output_cfg.sorting);
        if let Some(query) = &output_cfg.search {
            output.filter(query);
        }
    }
}

fn write_normal(outputs: &AnalysisOutputs, mut out: impl Write) -> Result<(), AppError> {
    if let Some(similar) = &outputs.similar {
        similar.write_normal(&mut out)?;
        writeln!(out)?;
    }
    if let Some(first_frame) = &outputs.first_frame {
        first_frame.write_normal(&mut out)?;
        writeln!(out)?;
    }
    if let Some(loops) = &outputs.loops {
        loops.write_normal(&mut out)?;
        writeln!(out)?;
    }
    Ok(())
}

fn write_json(video_path: &Path, outputs: &AnalysisOutputs, mut out: impl Write) -> Result<(), AppError> {
    let mut map = Map::new();
    map.insert("video".to_string(), Value::String(video_path.display().to_string()));

    if let Some(similar) = &outputs.similar {
        map.insert("similar".to_string(), similar.to_json()?);
    }
    if let Some(first_frame) = &outputs.first_frame {
        map.insert("first_frame".to_string(), first_frame.to_json()?);
    }
    if let Some(loops) = &outputs.loops {
        map.insert("loop".to_string(), loops.to_json()?);
    }

    serde_json::to_writer_pretty(&mut out, &Value::Object(map))?;
    writeln!(out)?;
    Ok(())
}

fn print_fatal_err(fatal_err: eyre::Report, verbosity: ReportVerbosity) {
    error!(target: "app-errorlog", "{}", fatal_err);

    if verbosity == ReportVerbosity::Verbose {
        let mut source: Option<&(dyn StdError + 'static)> = fatal_err.source();
        while let Some(e) = source {
            error!(target: "app-errorlog", "    caused by: {}", e);
            source = e.source();
        }
    }
}

pub fn configure_logs(verbosity: ReportVerbosity) {
    use simplelog::*;

    let mut cfg = simplelog::ConfigBuilder::new();
    //per-comparison scores are only useful when debugging the library itself.
    cfg.add_filter_ignore_str("ssim");

    let min_loglevel = match verbosity {
        ReportVerbosity::Quiet => LevelFilter::Warn,
        ReportVerbosity::Default => LevelFilter::Info,
        ReportVerbosity::Verbose => LevelFilter::Trace,
    };

    //a logger can only be installed once per process, so a second call is a no-op.
    let _already_initialized = TermLogger::init(min_loglevel, cfg.build(), TerminalMode::Stderr, ColorChoice::Auto);
}
