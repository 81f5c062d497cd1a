use std::path::PathBuf;

use annojoin::{
    commands::{
        annotations_categories, annotations_complete, annotations_distances, annotations_retrieve,
        bed_common_ids, bed_shift, clinvar_to_bed, fasta_relabel, fasta_retrieve, fasta_search,
        genes_compare, genes_compare_homer, gtf_remap, motifs_locate, report_snv,
    },
    io::parsers::{clinvar::DEFAULT_ASSEMBLY, MotifScanTool},
    prelude::*,
    ranges::chromosomes::Assembly,
    Position, PositionOffset,
};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::Verbosity;
use tracing_log::AsTrace as _;
use tracing_subscriber::EnvFilter;

const INFO: &str = "\
annojoin: joins and rewrites over genomic annotation tables
usage: annojoin [--help] <subcommand>

Subcommands:

  bed:          shift BED intervals, or find BED lines by name.
  genes:        compare a gene list to HOMER peak annotations.
  gtf:          rename GTF chromosomes to the chr-prefixed convention.
  annotations:  filter, complete and summarize HOMER peak annotations.
  motifs:       place MEME/FIMO motif hits on the genome.
  fasta:        retrieve, relabel or search FASTA sequences.
  report:       tabulate variants found within motifs.
  clinvar:      convert ClinVar XML locations to BED.
";

#[derive(Parser)]
#[clap(name = "annojoin")]
#[clap(about = INFO)]
struct Cli {
    /// abort on the first malformed row instead of skipping it with a warning
    #[arg(long, global = true)]
    strict: bool,

    #[command(flatten)]
    verbose: Verbosity,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Operations on BED files
    Bed {
        #[command(subcommand)]
        command: BedCommands,
    },
    /// Gene list comparisons
    Genes {
        #[command(subcommand)]
        command: GenesCommands,
    },
    /// GTF chromosome renaming
    Gtf {
        #[command(subcommand)]
        command: GtfCommands,
    },
    /// Operations on HOMER annotatePeaks.pl output
    Annotations {
        #[command(subcommand)]
        command: AnnotationsCommands,
    },
    /// Motif scan placement
    Motifs {
        #[command(subcommand)]
        command: MotifsCommands,
    },
    /// Operations on FASTA files
    Fasta {
        #[command(subcommand)]
        command: FastaCommands,
    },
    /// Variant reports
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// ClinVar release conversion
    Clinvar {
        #[command(subcommand)]
        command: ClinvarCommands,
    },
}

#[derive(Subcommand)]
enum BedCommands {
    /// Move each start down and each end up by an offset
    Shift {
        /// an input BED file
        #[arg(required = true)]
        bedfile: PathBuf,

        /// number of basepairs to widen each interval by, on both sides
        #[arg(long, allow_hyphen_values = true)]
        offset: PositionOffset,

        /// output file (default: <stem>_offset<offset>.bed beside the input)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write the lines of a BED file whose name is found in a second file
    CommonIds {
        /// the BED file whose lines are written (names in column 4)
        #[arg(required = true)]
        bedfile: PathBuf,

        /// a BED file or ID list to look names up from
        #[arg(long, required = true)]
        query: PathBuf,

        /// 1-based column of the IDs in the query file
        #[arg(long, default_value_t = 4)]
        field: usize,

        /// output file (default: commonLines.bed)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum GenesCommands {
    /// Find the genes of a list that are nearest to HOMER annotated peaks
    Compare {
        /// a gene list (gene ID, gene name), or with --both-homer a HOMER annotation file
        #[arg(required = true)]
        genes: PathBuf,

        /// the HOMER annotation file
        #[arg(long, required = true)]
        homer: PathBuf,

        /// a BioMart export of gene ID, transcript ID
        #[arg(long, required = true)]
        biomart: PathBuf,

        /// compare two HOMER annotation files
        #[arg(long)]
        both_homer: bool,

        /// directory for the output files
        #[arg(long, default_value = ".")]
        outdir: PathBuf,
    },
}

#[derive(Subcommand)]
enum GtfCommands {
    /// Rename the first column to chr1, chr2, ...
    Remap {
        /// the GTF file to edit
        #[arg(required = true)]
        gtf: PathBuf,

        /// the genome assembly
        #[arg(long, value_enum, required = true)]
        assembly: Assembly,

        /// the alternate scaffold placement file (alt_scaffold_placement.txt)
        #[arg(long)]
        patches: Option<PathBuf>,

        /// drop rows on scaffolds with no known placement instead of writing NA
        #[arg(long)]
        drop_unmapped: bool,

        /// output file (default: <stem>_locations_edited.gtf beside the input)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum AnnotationsCommands {
    /// Keep the peaks annotated as a keyword (promoter-tss, exon, intron, TTS, ...)
    Retrieve {
        /// the HOMER annotation file
        #[arg(required = true)]
        homer: PathBuf,

        /// the annotation keyword (case-insensitive prefix)
        #[arg(long, required = true)]
        keyword: String,

        /// output file (default: retrievedAnnotations_<keyword>.txt)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Add gene ID, name and description columns from a BioMart export
    Complete {
        /// the HOMER annotation file
        #[arg(required = true)]
        homer: PathBuf,

        /// a BioMart export of transcript ID, gene ID, gene name, description
        #[arg(long, required = true)]
        biomart: PathBuf,

        /// output file (default: <stem>_detailed.xls beside the input)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Tabulate a histogram of distances to the nearest TSS
    Distances {
        /// the HOMER annotation file
        #[arg(required = true)]
        homer: PathBuf,

        /// output file (default: <stem>_distances.tsv beside the input)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Count peaks per annotation category
    Categories {
        /// the HOMER annotation file
        #[arg(required = true)]
        homer: PathBuf,

        /// output file (default: <stem>_categories.tsv beside the input)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum MotifsCommands {
    /// Write the genomic locations of motif hits as BED
    Locate {
        /// the motif scan sites (MEME sites copied from the HTML report, or FIMO output)
        #[arg(long, required = true)]
        motifs: PathBuf,

        /// the MACS peaks, in BED format
        #[arg(long, required = true)]
        peaks: PathBuf,

        /// the motif width
        #[arg(long, required = true)]
        width: Position,

        /// the MACS experiment name (its -n argument)
        #[arg(long, required = true)]
        name: String,

        /// the tool that produced the motif scan
        #[arg(long, value_enum, default_value_t = MotifScanTool::Meme)]
        tool: MotifScanTool,

        /// write BED6 with each hit's strand
        #[arg(long)]
        with_strand: bool,

        /// output file (default: <name>_motif.bed)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ClinvarCommands {
    /// Write the SequenceLocations of a ClinVar XML release as BED6
    ToBed {
        /// the ClinVar full release XML
        #[arg(required = true)]
        xml: PathBuf,

        /// keep only locations on this assembly
        #[arg(long, default_value = DEFAULT_ASSEMBLY)]
        assembly: String,

        /// output file (default: clinvar.bed)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum FastaCommands {
    /// Retrieve the sequences listed in an ID file
    Retrieve {
        /// the FASTA file
        #[arg(required = true)]
        fasta: PathBuf,

        /// the sequence IDs, one per line
        #[arg(long, required = true)]
        ids: PathBuf,

        /// compare IDs by the part following '<separator>_'
        #[arg(long)]
        separator: Option<String>,

        /// output file (default: retrieved_sequences.fasta)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Rename the sequences to sequence_0, sequence_1, ...
    Relabel {
        /// the FASTA file
        #[arg(required = true)]
        fasta: PathBuf,

        /// output file (default: output.fasta)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Count the sequences containing a literal pattern
    Search {
        /// the FASTA file
        #[arg(required = true)]
        fasta: PathBuf,

        /// the pattern to look for
        #[arg(long, required = true)]
        pattern: String,
    },
}

#[derive(Subcommand)]
enum ReportCommands {
    /// Tabulate single-nucleotide variants found within motifs
    Snv {
        /// intersectBed -wo output of the ClinVar BED (-a) with motif locations (-b)
        #[arg(required = true)]
        intersect: PathBuf,

        /// the extended ClinVar BED file
        #[arg(long)]
        clinvar: Option<PathBuf>,

        /// the HOMER annotation of the peaks containing the motifs
        #[arg(long)]
        homer: Option<PathBuf>,

        /// the ClinVar disease_names file
        #[arg(long)]
        diseases: Option<PathBuf>,

        /// output file (default: variantTable.xls)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn run_bed(command: &BedCommands, strictness: Strictness) -> Result<Report, AnnoJoinError> {
    let output = match command {
        BedCommands::Shift {
            bedfile,
            offset,
            output,
        } => bed_shift(bedfile, *offset, output.as_deref(), strictness)?,
        BedCommands::CommonIds {
            bedfile,
            query,
            field,
            output,
        } => bed_common_ids(bedfile, query, *field, output.as_deref(), strictness)?,
    };
    Ok(output.into_parts().1)
}

fn run_annotations(
    command: &AnnotationsCommands,
    strictness: Strictness,
) -> Result<Report, AnnoJoinError> {
    let output = match command {
        AnnotationsCommands::Retrieve {
            homer,
            keyword,
            output,
        } => annotations_retrieve(homer, keyword, output.as_deref(), strictness)?,
        AnnotationsCommands::Complete {
            homer,
            biomart,
            output,
        } => annotations_complete(homer, biomart, output.as_deref(), strictness)?,
        AnnotationsCommands::Distances { homer, output } => {
            annotations_distances(homer, output.as_deref(), strictness)?
        }
        AnnotationsCommands::Categories { homer, output } => {
            annotations_categories(homer, output.as_deref(), strictness)?
        }
    };
    Ok(output.into_parts().1)
}

fn run_fasta(command: &FastaCommands, strictness: Strictness) -> Result<Report, AnnoJoinError> {
    let report = match command {
        FastaCommands::Retrieve {
            fasta,
            ids,
            separator,
            output,
        } => {
            fasta_retrieve(
                fasta,
                ids,
                separator.as_deref(),
                output.as_deref(),
                strictness,
            )?
            .into_parts()
            .1
        }
        FastaCommands::Relabel { fasta, output } => {
            fasta_relabel(fasta, output.as_deref())?.into_parts().1
        }
        FastaCommands::Search { fasta, pattern } => fasta_search(fasta, pattern)?.into_parts().1,
    };
    Ok(report)
}

fn run() -> Result<(), AnnoJoinError> {
    let cli = Cli::parse();

    match std::env::var("RUST_LOG") {
        Ok(_) => tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init(),
        Err(_) => tracing_subscriber::fmt()
            .with_max_level(cli.verbose.log_level_filter().as_trace())
            .with_writer(std::io::stderr)
            .init(),
    };

    let strictness = if cli.strict {
        Strictness::Strict
    } else {
        Strictness::Lenient
    };

    let report = match &cli.command {
        Some(Commands::Bed { command }) => run_bed(command, strictness),
        Some(Commands::Genes {
            command:
                GenesCommands::Compare {
                    genes,
                    homer,
                    biomart,
                    both_homer,
                    outdir,
                },
        }) => {
            let output = if *both_homer {
                genes_compare_homer(genes, homer, biomart, outdir, strictness)?
            } else {
                genes_compare(genes, homer, biomart, outdir, strictness)?
            };
            Ok(output.into_parts().1)
        }
        Some(Commands::Gtf {
            command:
                GtfCommands::Remap {
                    gtf,
                    assembly,
                    patches,
                    drop_unmapped,
                    output,
                },
        }) => gtf_remap(
            gtf,
            *assembly,
            patches.as_deref(),
            *drop_unmapped,
            output.as_deref(),
            strictness,
        )
        .map(|output| output.into_parts().1),
        Some(Commands::Annotations { command }) => run_annotations(command, strictness),
        Some(Commands::Motifs {
            command:
                MotifsCommands::Locate {
                    motifs,
                    peaks,
                    width,
                    name,
                    tool,
                    with_strand,
                    output,
                },
        }) => motifs_locate(
            motifs,
            *tool,
            peaks,
            name,
            *width,
            *with_strand,
            output.as_deref(),
            strictness,
        )
        .map(|output| output.into_parts().1),
        Some(Commands::Fasta { command }) => run_fasta(command, strictness),
        Some(Commands::Report {
            command:
                ReportCommands::Snv {
                    intersect,
                    clinvar,
                    homer,
                    diseases,
                    output,
                },
        }) => report_snv(
            intersect,
            clinvar.as_deref(),
            homer.as_deref(),
            diseases.as_deref(),
            output.as_deref(),
            strictness,
        )
        .map(|output| output.into_parts().1),
        Some(Commands::Clinvar {
            command:
                ClinvarCommands::ToBed {
                    xml,
                    assembly,
                    output,
                },
        }) => clinvar_to_bed(xml, assembly, output.as_deref(), strictness)
            .map(|output| output.into_parts().1),
        None => {
            eprintln!("{}\n", INFO);
            std::process::exit(1);
        }
    }?;

    for line in report.summaries() {
        println!("{}", line);
    }
    for line in report.issues() {
        println!("Warning: {}", line);
    }
    Ok(())
}

fn main() {
    match run() {
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
