//! Prescription-to-protocol command-line interface

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;

use clinprot::{
    ConvertRequest, CoverageStrictness, DecomposeOptions, MAX_STRUCTURE_NAME_LEN, NumberFormat,
    PrescriptionRecord, ProtocolDocument, check_name_lengths, convert, decompose,
    expected_counts, read_prescriptions, suggest_corrections,
};

/// Prescription-to-protocol command-line tool
#[derive(Parser)]
#[command(name = "clinprot")]
#[command(author, version, about = "Radiotherapy prescription to clinical protocol converter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Compact representation, trailing zeros trimmed
    General,
    /// Fixed five decimal places
    Fixed5,
}

impl From<FormatArg> for NumberFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::General => NumberFormat::General,
            FormatArg::Fixed5 => NumberFormat::Fixed5,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Decompose a prescription export row and print the tables as JSON
    Decompose {
        /// Prescription CSV export
        file: PathBuf,
        /// Row index when the export holds several prescriptions
        #[arg(short, long, default_value_t = 0)]
        index: usize,
        /// Fail on coverage clauses that would otherwise be dropped
        #[arg(long)]
        strict: bool,
    },
    /// Convert a prescription row into a protocol document
    Convert {
        /// Prescription CSV export
        file: PathBuf,
        /// Protocol document to write
        #[arg(short, long)]
        output: PathBuf,
        /// Protocol identifier
        #[arg(long)]
        id: String,
        /// Assigned users recorded in the preview header
        #[arg(long)]
        users: String,
        /// Treatment site recorded in the preview header
        #[arg(long, default_value = "")]
        site: String,
        /// Template document to populate instead of the built-in skeleton
        #[arg(short, long)]
        template: Option<PathBuf>,
        /// Row index when the export holds several prescriptions
        #[arg(short, long, default_value_t = 0)]
        index: usize,
        /// Numeric text format
        #[arg(short, long, value_enum, default_value_t = FormatArg::General)]
        format: FormatArg,
        /// Fail on coverage clauses that would otherwise be dropped
        #[arg(long)]
        strict: bool,
    },
    /// Check structure names against the 16-character limit and, when a
    /// produced protocol is given, cross-check its entry counts
    Check {
        /// Prescription CSV export
        file: PathBuf,
        /// Row index when the export holds several prescriptions
        #[arg(short, long, default_value_t = 0)]
        index: usize,
        /// Produced protocol document to cross-check entry counts against
        #[arg(short, long)]
        protocol: Option<PathBuf>,
    },
    /// Suggest closest reference names for the prescription's structures
    Suggest {
        /// Prescription CSV export
        file: PathBuf,
        /// Reference structure names, one per line
        reference: PathBuf,
        /// Row index when the export holds several prescriptions
        #[arg(short, long, default_value_t = 0)]
        index: usize,
    },
    /// Copy a structure with its objectives and indices between documents
    Amend {
        /// Document to amend
        target: PathBuf,
        /// Document to copy from
        source: PathBuf,
        /// Structure ID to copy
        structure: String,
        /// Output path (default: overwrite the target)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn decompose_options(strict: bool) -> DecomposeOptions {
    DecomposeOptions {
        coverage_strictness: if strict {
            CoverageStrictness::Strict
        } else {
            CoverageStrictness::Lenient
        },
    }
}

fn load_record(file: &PathBuf, index: usize) -> anyhow::Result<PrescriptionRecord> {
    let records = read_prescriptions(file)
        .with_context(|| format!("reading prescription export {}", file.display()))?;
    Ok(PrescriptionRecord::select(&records, index)?.clone())
}

/// Structure names in document order, targets before organs
fn record_names(record: &PrescriptionRecord) -> anyhow::Result<Vec<String>> {
    let tables = decompose(record, &DecomposeOptions::default())?;
    Ok(tables
        .target_volumes
        .iter()
        .filter_map(|tv| tv.volume.clone())
        .chain(tables.organs.iter().filter_map(|o| o.organ.clone()))
        .collect())
}

fn run_decompose(file: PathBuf, index: usize, strict: bool) -> anyhow::Result<()> {
    let record = load_record(&file, index)?;
    let tables = decompose(&record, &decompose_options(strict))?;
    println!("{}", serde_json::to_string_pretty(&tables)?);
    let counts = expected_counts(&tables);
    eprintln!(
        "{} {} plan objectives, {} quality indices expected",
        "info:".green(),
        counts.plan_objectives,
        counts.quality_indices
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_convert(
    file: PathBuf,
    output: PathBuf,
    id: String,
    users: String,
    site: String,
    template: Option<PathBuf>,
    index: usize,
    format: FormatArg,
    strict: bool,
) -> anyhow::Result<()> {
    let record = load_record(&file, index)?;
    let mut request = ConvertRequest::new(record, id, users)
        .with_treatment_site(site)
        .with_number_format(format.into());
    request.decompose = decompose_options(strict);
    if let Some(path) = template {
        let template = ProtocolDocument::from_file(&path)
            .with_context(|| format!("reading template {}", path.display()))?;
        request = request.with_template(template);
    }

    let mut outcome = convert(&request)?;
    for warning in &outcome.unrecognized {
        eprintln!("{}", warning.render_colored());
    }
    outcome
        .document
        .write_to_file(&output)
        .with_context(|| format!("writing protocol {}", output.display()))?;
    println!(
        "{} wrote {} ({} fractions, {} objectives, {} indices)",
        "ok:".green(),
        output.display(),
        outcome.fraction_count,
        outcome.document.item_count(),
        outcome.document.measure_item_count()
    );
    Ok(())
}

fn run_check(file: PathBuf, index: usize, protocol: Option<PathBuf>) -> anyhow::Result<()> {
    let record = load_record(&file, index)?;
    let tables = decompose(&record, &DecomposeOptions::default())?;
    let names: Vec<String> = tables
        .target_volumes
        .iter()
        .filter_map(|tv| tv.volume.clone())
        .chain(tables.organs.iter().filter_map(|o| o.organ.clone()))
        .collect();
    let offending = check_name_lengths(names.iter().map(String::as_str));
    for name in &names {
        if offending.contains(name) {
            println!(
                "{} {name} ({} characters, limit {MAX_STRUCTURE_NAME_LEN})",
                "too long:".red(),
                name.chars().count()
            );
        } else {
            println!("{} {name}", "ok:".green());
        }
    }

    let mut failed = !offending.is_empty();
    if let Some(path) = protocol {
        let document = ProtocolDocument::from_file(&path)
            .with_context(|| format!("reading protocol {}", path.display()))?;
        let counts = expected_counts(&tables);
        if document.item_count() == counts.plan_objectives
            && document.measure_item_count() == counts.quality_indices
        {
            println!(
                "{} {} objectives, {} indices match the prescription",
                "ok:".green(),
                counts.plan_objectives,
                counts.quality_indices
            );
        } else {
            println!(
                "{} document has {} objectives / {} indices, prescription expects {} / {}",
                "mismatch:".red(),
                document.item_count(),
                document.measure_item_count(),
                counts.plan_objectives,
                counts.quality_indices
            );
            failed = true;
        }
    }

    if failed {
        anyhow::bail!("check failed");
    }
    Ok(())
}

fn run_suggest(file: PathBuf, reference: PathBuf, index: usize) -> anyhow::Result<()> {
    let record = load_record(&file, index)?;
    let names = record_names(&record)?;
    let reference_names: Vec<String> = std::fs::read_to_string(&reference)
        .with_context(|| format!("reading reference names {}", reference.display()))?
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    for suggestion in suggest_corrections(&names, &reference_names) {
        if suggestion.structure == suggestion.suggestion {
            println!("{} {}", "exact:".green(), suggestion.structure);
        } else {
            println!(
                "{} {} -> {} (similarity {:.2})",
                "rename:".yellow(),
                suggestion.structure,
                suggestion.suggestion,
                suggestion.similarity
            );
        }
    }
    Ok(())
}

fn run_amend(
    target: PathBuf,
    source: PathBuf,
    structure: String,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut document = ProtocolDocument::from_file(&target)
        .with_context(|| format!("reading target {}", target.display()))?;
    let source_doc = ProtocolDocument::from_file(&source)
        .with_context(|| format!("reading source {}", source.display()))?;
    document.amend(&source_doc, &structure)?;

    let destination = output.unwrap_or(target);
    document
        .write_to_file(&destination)
        .with_context(|| format!("writing {}", destination.display()))?;
    println!("{} copied {structure} into {}", "ok:".green(), destination.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    match cli.command {
        Commands::Decompose {
            file,
            index,
            strict,
        } => run_decompose(file, index, strict),
        Commands::Convert {
            file,
            output,
            id,
            users,
            site,
            template,
            index,
            format,
            strict,
        } => run_convert(file, output, id, users, site, template, index, format, strict),
        Commands::Check {
            file,
            index,
            protocol,
        } => run_check(file, index, protocol),
        Commands::Suggest {
            file,
            reference,
            index,
        } => run_suggest(file, reference, index),
        Commands::Amend {
            target,
            source,
            structure,
            output,
        } => run_amend(target, source, structure, output),
    }
}
