use anyhow::{bail, Context, Result};
use letterprint_lib::models::{DistributionModel, FeatureSet, Lens, LensVerdict};
use letterprint_lib::services::config_store::{AnalysisConfig, ConfigStore};
use letterprint_lib::services::fingerprint::{assess, compare_features, create_model, model_summary, rank_anomalies};
use letterprint_lib::services::model_store::{load_model, save_model};
use letterprint_lib::services::text_processor::{extract_features, normalize_alphanumeric};
use std::path::{Path, PathBuf};
use tracing::info;

const USAGE: &str = "Usage:
  letterprint compare <a.txt> <b.txt> [--details]
  letterprint train --train <dir> --out <model.json> [--threshold <x>] [--fit-threshold <y>] [--summary]
  letterprint check <query.txt> (--model <model.json> | --train <dir>) [--threshold <x>] [--fit-threshold <y>] [--top <n>] [--summary] [--out <report.json>]
  letterprint summary (--model <model.json> | --train <dir>) [--threshold <x>] [--fit-threshold <y>]

Notes:
  - Training reads every .txt file in <dir>.
  - A saved model keeps its own anomaly threshold unless --threshold is given.
  - Defaults come from the letterprint config.json; flags override them.";

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

fn parse_number<T: std::str::FromStr>(args: &[String], key: &str) -> Result<Option<T>> {
    match parse_arg_value(args, key) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("invalid value for {}: {}", key, raw)),
        None => Ok(None),
    }
}

fn load_analysis_config(args: &[String]) -> Result<AnalysisConfig> {
    let mut analysis = match ConfigStore::default_config_dir() {
        Some(dir) => ConfigStore::new(dir).load().context("load config")?.analysis,
        None => AnalysisConfig::default(),
    };
    if let Some(v) = parse_number(args, "--threshold")? {
        analysis.anomaly_threshold = v;
    }
    if let Some(v) = parse_number(args, "--fit-threshold")? {
        analysis.fit_acceptance_threshold = v;
    }
    if let Some(v) = parse_number(args, "--top")? {
        analysis.top_anomalies = v;
    }
    Ok(analysis)
}

fn read_text(path: &Path, analysis: &AnalysisConfig) -> Result<String> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(if analysis.strip_non_alphanumeric {
        normalize_alphanumeric(&raw)
    } else {
        raw
    })
}

fn read_training_folder(dir: &Path, analysis: &AnalysisConfig) -> Result<Vec<String>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("read folder {}", dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .map_or(false, |ext| ext.to_string_lossy().eq_ignore_ascii_case("txt"))
        })
        .collect();
    paths.sort();

    if paths.is_empty() {
        bail!("no .txt files found in {}", dir.display());
    }

    info!(files = paths.len(), folder = %dir.display(), "training files found");
    paths.iter().map(|p| read_text(p, analysis)).collect()
}

fn print_features(name: &str, features: &FeatureSet) {
    println!("{} counts: {:?}", name, features.count_by_slot);
    println!("{} total count: {}", name, features.total_count);
    println!("{} positions: {:?}", name, features.positions_by_slot);
}

fn run_compare(args: &[String]) -> Result<()> {
    let (Some(a), Some(b)) = (args.get(2), args.get(3)) else {
        bail!("compare needs two files\n\n{}", USAGE);
    };
    let analysis = load_analysis_config(args)?;
    let features_a = extract_features(&read_text(Path::new(a), &analysis)?);
    let features_b = extract_features(&read_text(Path::new(b), &analysis)?);

    if has_flag(args, "--details") {
        print_features("Text 1", &features_a);
        print_features("Text 2", &features_b);
        println!();
    }

    let report = compare_features(&features_a, &features_b);
    println!("Cosine Similarity: {}", report.cosine);
    println!("Jaccard Index: {}", report.jaccard);
    println!("Position Index: {}", report.position_difference);
    println!();
    println!("Equally weighted Similarity (average): {}", report.equal_weighted);
    println!("Weighted Similarity (40-30-30 Cosine-Jaccard-Position): {}", report.weighted);
    Ok(())
}

fn print_verdict(lens: Lens, verdict: &LensVerdict, threshold: f64, top: usize) {
    let title = match lens {
        Lens::Frequency => "Frequency",
        Lens::Position => "Positions",
    };
    println!("=== Analysis Results {} ===", title);
    if verdict.is_anomaly {
        println!("ANOMALY DETECTED with score {:.4} (threshold: {:.4})", verdict.score, threshold);
    } else {
        println!("Text appears normal with score {:.4} (threshold: {:.4})", verdict.score, threshold);
    }
    println!("Probability: {:.10}", verdict.probability);
    println!("Top anomalous characters:");
    let ranked = rank_anomalies(verdict, top);
    if ranked.is_empty() {
        println!("  No significant anomalies detected");
    }
    for entry in ranked {
        println!("  {}", entry);
    }
    println!();
}

fn train_model(train_dir: &str, analysis: &AnalysisConfig) -> Result<DistributionModel> {
    let training = read_training_folder(Path::new(train_dir), analysis)?;
    Ok(create_model(&training, analysis.anomaly_threshold, analysis.fit_acceptance_threshold)?)
}

/// Load `--model` when given, otherwise train from `--train`.
fn obtain_model(args: &[String], analysis: &AnalysisConfig) -> Result<DistributionModel> {
    if let Some(model_path) = parse_arg_value(args, "--model") {
        let mut model =
            load_model(Path::new(&model_path)).with_context(|| format!("load model {}", model_path))?;
        if let Some(threshold) = parse_number(args, "--threshold")? {
            model.anomaly_threshold = threshold;
        }
        return Ok(model);
    }

    let Some(train_dir) = parse_arg_value(args, "--train") else {
        bail!("--model <model.json> or --train <dir> is required\n\n{}", USAGE);
    };
    train_model(&train_dir, analysis)
}

fn run_train(args: &[String]) -> Result<()> {
    let (Some(train_dir), Some(out_path)) = (parse_arg_value(args, "--train"), parse_arg_value(args, "--out")) else {
        bail!("train needs --train <dir> and --out <model.json>\n\n{}", USAGE);
    };
    let analysis = load_analysis_config(args)?;
    let model = train_model(&train_dir, &analysis)?;

    if has_flag(args, "--summary") {
        println!("{}", model_summary(&model));
    }

    save_model(Path::new(&out_path), &model).with_context(|| format!("save model {}", out_path))?;
    println!("Model trained on {} texts and saved to: {}", model.sample_count, out_path);
    Ok(())
}

fn run_check(args: &[String]) -> Result<()> {
    let Some(query_path) = args.get(2).filter(|a| !a.starts_with("--")) else {
        bail!("check needs a query file\n\n{}", USAGE);
    };
    let analysis = load_analysis_config(args)?;
    let model = obtain_model(args, &analysis)?;

    if has_flag(args, "--summary") {
        println!("{}", model_summary(&model));
    }

    let query = read_text(Path::new(query_path), &analysis)?;
    let report = assess(&model, &query);
    print_verdict(Lens::Frequency, &report.frequency, model.anomaly_threshold, analysis.top_anomalies);
    print_verdict(Lens::Position, &report.position, model.anomaly_threshold, analysis.top_anomalies);

    if let Some(out_path) = parse_arg_value(args, "--out") {
        let json = serde_json::to_string_pretty(&report).context("serialize report")?;
        std::fs::write(&out_path, json).with_context(|| format!("write {}", out_path))?;
        println!("Report written to: {}", out_path);
    }
    Ok(())
}

fn run_summary(args: &[String]) -> Result<()> {
    let analysis = load_analysis_config(args)?;
    let model = obtain_model(args, &analysis)?;
    println!("{}", model);
    Ok(())
}

fn main() -> Result<()> {
    letterprint_lib::init_logging();

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("compare") => run_compare(&args),
        Some("train") => run_train(&args),
        Some("check") => run_check(&args),
        Some("summary") => run_summary(&args),
        _ => {
            eprintln!("{}", USAGE);
            Ok(())
        }
    }
}
