// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All work is delegated to Layer 2 (application); this layer
// only routes and prints the reports it gets back.
//
// Four exercises are supported:
//   1. `regress`   — LAD regression of wine quality
//   2. `compress`  — rank-k SVD image compression
//   3. `classify`  — CIFAR-10 classifiers (train / test)
//   4. `translate` — seq2seq translator (train / test / translate)
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use anyhow::Result;
use burn::backend::wgpu::WgpuDevice;
use clap::Parser;
use commands::{ClassifyMode, Commands, TranslateMode};
use std::io::{self, BufRead, Write};

use crate::domain::traits::Translator;
use crate::ml::{InferBackend, TrainBackend};

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "coursework",
    version,
    about = "Deep learning coursework: LP regression, SVD compression, CIFAR-10 classifiers and a seq2seq translator."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Regress(args) => run_regress(args),
            Commands::Compress(args) => run_compress(args),
            Commands::Classify { mode } => run_classify(mode),
            Commands::Translate { mode } => run_translate(mode),
        }
    }
}

fn device() -> WgpuDevice {
    let device = WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    device
}

// ─── regress ──────────────────────────────────────────────────────────────────
fn run_regress(args: commands::RegressArgs) -> Result<()> {
    use crate::application::regression_use_case::RegressUseCase;

    let report = RegressUseCase::new(args.into()).execute()?;
    print!("{}", regression_summary(&report));
    Ok(())
}

fn regression_summary(report: &crate::application::regression_use_case::RegressionReport) -> String {
    use crate::ml::lad::ErrorSummary;
    use std::fmt::Write as _;

    let mut out = String::new();
    let _ = writeln!(out, "Optimal value: {}", report.fit.objective);
    let _ = writeln!(out, "a = {:?}", report.fit.weights);
    let _ = writeln!(out, "b = {}", report.fit.intercept);

    let mut summary = |name: &str, s: &ErrorSummary| {
        let _ = writeln!(out, "\n{name} set:");
        let _ = writeln!(out, "   Average absolute error: {}", s.mean_abs);
        let _ = match s.mean_pct {
            Some(pct) => writeln!(out, "   Average percent error: {pct}%"),
            None => writeln!(out, "   Average percent error: undefined (all targets are zero)"),
        };
    };
    summary("Training", &report.train);
    if let Some(test) = &report.test {
        summary("Test", test);
    }
    out
}

// ─── compress ─────────────────────────────────────────────────────────────────
fn run_compress(args: commands::CompressArgs) -> Result<()> {
    use crate::application::compress_use_case::CompressUseCase;

    let report = CompressUseCase::new(args.into()).execute()?;

    println!("Image size: {} x {}", report.rows, report.cols);
    println!("Rank of the original image: {}", report.original_rank);
    println!("Rank of the rank-{} approximation: {}", report.k, report.approx_rank);
    println!("Storage ratio: {:.4}", report.storage_ratio);
    println!("Wrote '{}' and '{}'", report.original_path.display(), report.approx_path.display());
    Ok(())
}

// ─── classify ─────────────────────────────────────────────────────────────────
fn run_classify(mode: ClassifyMode) -> Result<()> {
    use crate::application::classify_use_case::ClassifyUseCase;

    match mode {
        ClassifyMode::Train(args) => {
            ClassifyUseCase::new(args.into()).train::<TrainBackend>(&device())?;
            println!("\nTraining complete. Model saved.");
        }
        ClassifyMode::Test(args) => {
            let use_case = ClassifyUseCase::new((&args).into());
            match &args.image {
                Some(path) => {
                    let label = use_case.predict_image::<InferBackend>(path, &device())?;
                    println!("Prediction: {label}");
                }
                None => {
                    let eval = use_case.test::<InferBackend>(&device())?;
                    println!("Test Set Loss: {}", eval.loss);
                    println!("Test Set Accuracy: {:.3}%", eval.accuracy * 100.0);
                }
            }
        }
    }
    Ok(())
}

// ─── translate ────────────────────────────────────────────────────────────────
fn run_translate(mode: TranslateMode) -> Result<()> {
    use crate::application::translate_use_case::TranslateUseCase;

    match mode {
        TranslateMode::Train(args) => {
            let step = TranslateUseCase::new(args.into()).train::<TrainBackend>(&device())?;
            println!("Training finished at iteration {step}.");
        }
        TranslateMode::Test(paths) => {
            let report = TranslateUseCase::new(paths.into()).test::<InferBackend>(&device())?;
            print!("{}", bleu_summary(&report));
        }
        TranslateMode::Translate(paths) => {
            let use_case = TranslateUseCase::new(paths.into());
            use_case.prepare_data()?;
            let translator = use_case.translator::<InferBackend>(&device())?;

            println!("\nWelcome to the English-Vietnamese Neural Machine Translator!");
            println!("Type a sentence in English and hit 'enter' to translate it to Vietnamese.");
            println!("Hit 'enter' without typing anything to exit the Neural Machine Translator");
            println!("**Note: The maximum sentence length is {} words\n", translator.max_length());

            let stdin = io::stdin();
            interactive_loop(&translator, stdin.lock(), io::stdout())?;
        }
    }
    Ok(())
}

fn bleu_summary(report: &crate::application::translate_use_case::BleuReport) -> String {
    let mut out = String::new();
    if let Some(sample) = &report.sample {
        out += "\nSample Test Translation... \n";
        out += &format!("   Encoded Text: {}\n", sample.encoded);
        out += &format!("   Decoded Text: {}\n", sample.decoded);
    }
    out += &format!(
        "\nScored {} test sentences ({} longer than every bucket were skipped)\n",
        report.evaluated, report.skipped
    );
    out += &format!(
        "The testing is complete! Average BLEU Score: {:.6}\n\n",
        report.average_bleu
    );
    out
}

/// Read sentences until an empty line (or end of input) and
/// print each translation. Returns the number of lines read.
fn interactive_loop<T, R, W>(translator: &T, mut input: R, mut output: W) -> Result<usize>
where
    T: Translator,
    R: BufRead,
    W: Write,
{
    let mut count = 0;
    loop {
        write!(output, "> ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end_matches(['\n', '\r']);
        if line.is_empty() {
            break;
        }
        count += 1;

        // Too-long sentences report the error and keep the loop going
        match translator.translate(line) {
            Ok(text) => writeln!(output, "Vietnamese Translation: {text}")?,
            Err(e) => writeln!(output, "Error: {e}")?,
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    /// Upper-cases short sentences, rejects long ones
    struct Shouty;

    impl Translator for Shouty {
        fn translate(&self, sentence: &str) -> Result<String> {
            if sentence.split_whitespace().count() > 3 {
                bail!("The maximum sentence length is 3 words");
            }
            Ok(sentence.to_uppercase())
        }
    }

    #[test]
    fn test_loop_stops_at_empty_line() {
        let input = b"hi there\none two three four\nbye\n\nignored\n";
        let mut out = Vec::new();
        let count = interactive_loop(&Shouty, &input[..], &mut out).unwrap();
        assert_eq!(count, 3);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Vietnamese Translation: HI THERE"));
        assert!(text.contains("Error: The maximum sentence length is 3 words"));
        assert!(text.contains("Vietnamese Translation: BYE"));
        assert!(!text.contains("IGNORED"));
    }

    #[test]
    fn test_loop_stops_at_end_of_input() {
        let mut out = Vec::new();
        assert_eq!(interactive_loop(&Shouty, &b"hello"[..], &mut out).unwrap(), 1);
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["coursework", "classify", "predict", "--image", "cat.png"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Classify { mode: ClassifyMode::Test(ref a) } if a.image.is_some()
        ));

        let cli = Cli::try_parse_from(["coursework", "classify", "train", "--model", "softmax"]).unwrap();
        let Commands::Classify { mode: ClassifyMode::Train(args) } = cli.command else {
            panic!("expected classify train");
        };
        let cfg: crate::application::classify_use_case::ClassifyConfig = args.into();
        assert_eq!(cfg.iterations, 5);
        assert_eq!(cfg.batch_size, 100);
        assert!(cfg.final_eval_only);

        let cli = Cli::try_parse_from(["coursework", "classify", "train", "--model", "softmax", "--eval-every", "2"])
            .unwrap();
        let Commands::Classify { mode: ClassifyMode::Train(args) } = cli.command else {
            panic!("expected classify train");
        };
        let cfg: crate::application::classify_use_case::ClassifyConfig = args.into();
        assert!(!cfg.final_eval_only);
        assert_eq!(cfg.eval_every, 2);

        assert!(Cli::try_parse_from(["coursework", "translate", "translate"]).is_ok());
        assert!(Cli::try_parse_from(["coursework", "classify", "train", "--model", "rnn"]).is_err());
    }

    #[test]
    fn test_regression_summary_reports_fit_and_undefined_percent() {
        use crate::application::regression_use_case::RegressionReport;
        use crate::ml::lad::{ErrorSummary, LadFit};

        let report = RegressionReport {
            fit: LadFit { weights: vec![0.5, -1.0], intercept: 2.0, objective: 0.25 },
            train: ErrorSummary { mean_abs: 0.25, mean_pct: Some(4.0), zero_targets: 0 },
            test: Some(ErrorSummary { mean_abs: 0.5, mean_pct: None, zero_targets: 3 }),
        };
        let text = regression_summary(&report);
        assert!(text.starts_with("Optimal value: 0.25\n"));
        assert!(!text.contains("Status"));
        assert!(text.contains("a = [0.5, -1.0]"));
        assert!(text.contains("Average percent error: 4%"));
        assert!(text.contains("Test set:"));
        assert!(text.contains("undefined (all targets are zero)"));
    }

    #[test]
    fn test_bleu_summary_reports_counts() {
        use crate::application::translate_use_case::{BleuReport, SampleTranslation};

        let report = BleuReport {
            average_bleu: 0.125,
            evaluated: 7,
            skipped: 2,
            sample: Some(SampleTranslation { encoded: "hello".into(), decoded: "xin chào".into() }),
        };
        let text = bleu_summary(&report);
        assert!(text.contains("Scored 7 test sentences (2 longer than every bucket were skipped)"));
        assert!(text.contains("Decoded Text: xin chào"));
        assert!(text.contains("Average BLEU Score: 0.125000"));
    }

    #[test]
    fn test_classify_and_translate_use_separate_model_dirs() {
        use crate::application::{classify_use_case::ClassifyConfig, translate_use_case::TranslateConfig};

        let cli = Cli::try_parse_from(["coursework", "classify", "train"]).unwrap();
        let Commands::Classify { mode: ClassifyMode::Train(args) } = cli.command else {
            panic!("expected classify train");
        };
        let classify: ClassifyConfig = args.into();

        let cli = Cli::try_parse_from(["coursework", "translate", "train"]).unwrap();
        let Commands::Translate { mode: TranslateMode::Train(args) } = cli.command else {
            panic!("expected translate train");
        };
        let translate: TranslateConfig = args.into();

        assert_eq!(classify.model_dir, "model/classify");
        assert_eq!(translate.model_dir, "model/translate");
        assert_eq!(ClassifyConfig::default().model_dir, classify.model_dir);
        assert_eq!(TranslateConfig::default().model_dir, translate.model_dir);
    }
}
