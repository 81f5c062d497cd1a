//! Command functions, one per `annojoin` subcommand.
//!
//! Each command returns a [`CommandOutput`] whose [`Report`] carries the
//! read/matched/written counts. Printing that report is left to the caller.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{
    error::AnnoJoinError,
    index::{CollisionPolicy, Index},
    io::{
        fasta,
        parsers::{
            bed::{self, bed_source_options, BedRecord},
            clinvar::SequenceLocations,
            gtf::{self, gtf_source_options},
            homer::{
                self, count_categories, homer_source_options, AnnotationCategory, HomerAnnotation,
            },
            mapping::{load_mapping, MappingSpec},
            motif::{MotifHit, MotifScanTool},
            utils::derived_output_path,
            variants::{
                self, alternate_nucleotide, parse_medgen_id, snv_representation, MotifVariant,
            },
        },
        tsv::{write_serialized, NA_TSV},
        OutputFile, RecordSource, SourceOptions, TableWriter, WriteSummary,
    },
    join::{join, JoinCounts, JoinMode, JoinOptions},
    key::{Key, KeyExtractor, KeyParse, KeyPolicy, Normalize},
    ranges::{
        chromosomes::{load_patches, Assembly},
        operations::{motif_genomic_position, remap_chromosome, shift_interval},
        GenomicInterval, Strand,
    },
    record::{Record, Strictness},
    reporting::{CommandOutput, Histogram, Report},
    traits::TsvSerialize,
    Position, PositionOffset, MISSING,
};

/// Distance-to-TSS bins for gene list comparisons.
pub const GENE_DISTANCE_BINS: (Position, Position, Position) = (-12000, 12000, 2000);
/// Distance-to-TSS bins for annotation summaries.
pub const ANNOTATION_DISTANCE_BINS: (Position, Position, Position) = (-50000, 50000, 10000);

/// The columns appended to HOMER annotations by [`annotations_complete()`].
pub const COMPLETION_COLUMNS: [&str; 3] = ["Gene ID", "Gene Name", "Gene Description"];

/// The header of the SNV table written by [`report_snv()`].
pub const SNV_TABLE_HEADER: &str = "#Motif\tSNV AccVar\tFound in Peak\tPosition in motif\tSNV Name\tClinical Significance\tCondition\tNearest Gene Name\tGene Description\tDistance to TSS";

fn report_read(report: &mut Report, source: &RecordSource) {
    let counts = source.counts();
    report.add_summary(format!(
        "Reading '{}': {} records.",
        source.path().display(),
        counts.records
    ));
    if counts.malformed > 0 {
        report.add_issue(format!(
            "{} rows of '{}' had too few columns and were skipped.",
            counts.malformed,
            source.path().display()
        ));
    }
}

fn report_index<P>(report: &mut Report, index: &Index<P>, what: &str) {
    report.add_summary(format!(
        "Reading '{}': {} {}.",
        index.name(),
        index.len(),
        what
    ));
    let skipped = index.summary().skipped;
    if skipped > 0 {
        report.add_issue(format!(
            "{} rows of '{}' had no usable key and were skipped.",
            skipped,
            index.name()
        ));
    }
}

fn report_join(report: &mut Report, counts: &JoinCounts, index_name: &str) {
    report.add_summary(format!(
        "Matched {} of {} records against '{}'.",
        counts.matched, counts.primary, index_name
    ));
    if counts.unmatched_left > 0 {
        report.add_issue(format!(
            "{} records had no match in '{}'.",
            counts.unmatched_left, index_name
        ));
    }
    if counts.malformed > 0 {
        report.add_issue(format!(
            "{} records had no usable key for '{}'.",
            counts.malformed, index_name
        ));
    }
}

fn report_written(report: &mut Report, name: &str, summary: &WriteSummary) {
    report.add_summary(format!("Writing '{}': {} lines.", name, summary.rows));
}

/// Write all `rows` to `path` and report the count.
fn write_table<I, T>(
    path: &Path,
    header: Option<Vec<String>>,
    rows: I,
    report: &mut Report,
) -> Result<WriteSummary, AnnoJoinError>
where
    I: IntoIterator<Item = T>,
    T: TsvSerialize,
{
    let output = OutputFile::new(path, header);
    let mut writer = TableWriter::new(&output)?;
    writer.write_all(rows)?;
    let summary = writer.finish()?;
    report_written(report, &output.display_name(), &summary);
    Ok(summary)
}

fn output_or(output: Option<&Path>, default: impl FnOnce() -> PathBuf) -> PathBuf {
    output.map_or_else(default, Path::to_path_buf)
}

/// Shift the coordinates of a BED row. Only the first three columns are
/// validated; later columns pass through untouched.
fn shifted_coordinates(
    record: &Record,
    offset: PositionOffset,
) -> Result<GenomicInterval, AnnoJoinError> {
    let interval = GenomicInterval::new(
        record.require(bed::SEQNAME)?,
        record.parse(bed::START)?,
        record.parse(bed::END)?,
    )?;
    shift_interval(&interval, offset)
}

/// Shift every interval of a BED file by `offset` on both sides.
///
/// Writes `<stem>_offset<offset>.bed` beside the input unless `output` is given.
pub fn bed_shift(
    bedfile: &Path,
    offset: PositionOffset,
    output: Option<&Path>,
    strictness: Strictness,
) -> Result<CommandOutput<()>, AnnoJoinError> {
    let output_path = output_or(output, || {
        derived_output_path(bedfile, &format!("_offset{}.bed", offset))
    });
    let mut report = Report::new();
    let mut source =
        RecordSource::with_options(bedfile, bed_source_options().strictness(strictness))?;

    let output = OutputFile::new(&output_path, None);
    let mut writer = TableWriter::new(&output)?;
    let mut skipped = 0;
    for result in source.by_ref() {
        let mut record = result?;
        match shifted_coordinates(&record, offset) {
            Ok(interval) => {
                record.set(bed::START, interval.start.to_string());
                record.set(bed::END, interval.end.to_string());
                writer.write_row(&record)?;
            }
            Err(e) => {
                strictness.absorb(e)?;
                skipped += 1;
            }
        }
    }
    let summary = writer.finish()?;

    report_read(&mut report, &source);
    if skipped > 0 {
        report.add_issue(format!(
            "{} intervals could not be shifted and were skipped.",
            skipped
        ));
    }
    report_written(&mut report, &output.display_name(), &summary);
    Ok(CommandOutput::new((), report))
}

/// Write the lines of `bedfile` whose name (column 4) is found in `field`
/// (1-based) of `query`, once per matching query line.
///
/// `query` may be a plain ID list, with `field` set to 1.
pub fn bed_common_ids(
    bedfile: &Path,
    query: &Path,
    field: usize,
    output: Option<&Path>,
    strictness: Strictness,
) -> Result<CommandOutput<()>, AnnoJoinError> {
    if field == 0 {
        return Err(AnnoJoinError::ArgumentError(
            "--field is 1-based and must be at least 1".to_string(),
        ));
    }
    let output_path = output_or(output, || PathBuf::from("commonLines.bed"));
    let mut report = Report::new();

    let source =
        RecordSource::with_options(bedfile, bed_source_options().strictness(strictness))?;
    let extractor = KeyExtractor::new(bed::NAME, KeyPolicy::default());
    let index = Index::build(
        bedfile.display().to_string(),
        source,
        &extractor,
        CollisionPolicy::Overwrite,
        strictness,
        |record| Ok(record.clone()),
    )?;
    report_index(&mut report, &index, "named intervals");

    let options = SourceOptions::default()
        .skip_prefix("track")
        .skip_prefix("browser")
        .strictness(strictness);
    let mut query_source = RecordSource::with_options(query, options)?;

    let output = OutputFile::new(&output_path, None);
    let mut writer = TableWriter::new(&output)?;
    let mut joined = join(
        query_source.by_ref(),
        &index,
        field - 1,
        JoinOptions::new(JoinMode::InnerFilter).strictness(strictness),
    );
    for result in joined.by_ref() {
        for line in result?.payloads {
            writer.write_row(line)?;
        }
    }
    let counts = joined.counts();
    let summary = writer.finish()?;

    report_read(&mut report, &query_source);
    report_join(&mut report, &counts, index.name());
    report_written(&mut report, &output.display_name(), &summary);
    Ok(CommandOutput::new((), report))
}

/// The mapping from Ensembl transcript ID to gene ID, from a two-column
/// BioMart export of `gene ID`, `transcript ID`.
fn load_transcript_genes(
    biomart: &Path,
    strictness: Strictness,
) -> Result<Index<Vec<String>>, AnnoJoinError> {
    let spec = MappingSpec::new(1, vec![0], KeyPolicy::default());
    load_mapping(biomart, &spec, strictness)
}

/// Index HOMER annotation rows by the gene of their nearest transcript. When
/// several peaks share a gene, the last one is kept.
fn load_homer_genes(
    homer_path: &Path,
    transcripts: &Index<Vec<String>>,
    strictness: Strictness,
    report: &mut Report,
) -> Result<Index<Record>, AnnoJoinError> {
    let mut source =
        RecordSource::with_options(homer_path, homer_source_options().strictness(strictness))?;
    let mut genes = Index::new(
        homer_path.display().to_string(),
        KeyPolicy::default(),
        CollisionPolicy::Overwrite,
    );

    let mut joined = join(
        source.by_ref(),
        transcripts,
        homer::TRANSCRIPT_ID,
        JoinOptions::new(JoinMode::InnerFilter).strictness(strictness),
    );
    for result in joined.by_ref() {
        let result = result?;
        for gene_ids in result.payloads {
            let gene_id = gene_ids.first().map_or(MISSING, String::as_str);
            let key = genes.key(gene_id)?;
            genes.insert(key, result.record.clone());
        }
    }
    let counts = joined.counts();

    report_read(report, &source);
    report_join(report, &counts, transcripts.name());
    report.add_summary(format!(
        "Reading HOMER output '{}': {} genes.",
        homer_path.display(),
        genes.len()
    ));
    Ok(genes)
}

/// Compare a gene list (`gene ID`, `gene name`) to the genes nearest to HOMER
/// annotated peaks, using a BioMart transcript-to-gene export.
///
/// Writes into `outdir`:
///  - `common_genes.txt`: gene ID and name of genes on both sides.
///  - `common_genes_reference_sequences.txt`: the peak ID annotated with each common gene.
///  - `unique_genes_left.txt`, `unique_genes_right.txt`: genes found on one side only.
///  - `common_genes_distances.tsv`: a histogram of the common genes' distances to TSS.
pub fn genes_compare(
    genes: &Path,
    homer_path: &Path,
    biomart: &Path,
    outdir: &Path,
    strictness: Strictness,
) -> Result<CommandOutput<()>, AnnoJoinError> {
    let mut report = Report::new();

    let transcripts = load_transcript_genes(biomart, strictness)?;
    report_index(&mut report, &transcripts, "transcripts");
    let peak_genes = load_homer_genes(homer_path, &transcripts, strictness, &mut report)?;

    let source = RecordSource::with_options(genes, SourceOptions::default().strictness(strictness))?;
    let gene_names = Index::build(
        genes.display().to_string(),
        source,
        &KeyExtractor::new(0, KeyPolicy::default()),
        CollisionPolicy::Overwrite,
        strictness,
        |record| Ok(record.get_or_missing(1).trim().to_uppercase()),
    )?;
    report_index(&mut report, &gene_names, "genes");

    let diff = gene_names.set_difference(&peak_genes)?;
    report.add_summary(format!(
        "Comparing gene lists: {} genes in common, {} only in '{}', {} only in '{}'.",
        diff.common.len(),
        diff.unique_left.len(),
        gene_names.name(),
        diff.unique_right.len(),
        peak_genes.name()
    ));

    let name_of = |key: &Key| gene_names.get_one(key).map_or(MISSING, String::as_str);
    let peak_of = |key: &Key| {
        peak_genes
            .get_one(key)
            .map_or(MISSING, |record| record.get_or_missing(homer::PEAK_ID))
    };

    write_table(
        &outdir.join("common_genes.txt"),
        None,
        diff.common.iter().map(|key| vec![key.as_str(), name_of(key)]),
        &mut report,
    )?;
    write_table(
        &outdir.join("common_genes_reference_sequences.txt"),
        None,
        diff.common.iter().map(|key| vec![peak_of(key), key.as_str()]),
        &mut report,
    )?;
    write_table(
        &outdir.join("unique_genes_left.txt"),
        None,
        diff.unique_left.iter().map(|key| vec![key.as_str(), name_of(key)]),
        &mut report,
    )?;
    write_table(
        &outdir.join("unique_genes_right.txt"),
        None,
        diff.unique_right.iter().map(|key| vec![key.as_str(), peak_of(key)]),
        &mut report,
    )?;

    let (lower, upper, step) = GENE_DISTANCE_BINS;
    let mut histogram = Histogram::new(lower, upper, step)?;
    for record in diff.common.iter().filter_map(|key| peak_genes.get_one(key)) {
        match HomerAnnotation(record).distance_to_tss() {
            Ok(distance) => histogram.add(distance),
            Err(e) => strictness.absorb(e)?,
        }
    }
    write_histogram(
        &outdir.join("common_genes_distances.tsv"),
        &histogram,
        &mut report,
    )?;
    Ok(CommandOutput::new((), report))
}

/// Compare the genes nearest to the peaks of two HOMER annotation files, writing
/// the left file's row for each gene common to both to `common_genes.xls`.
pub fn genes_compare_homer(
    left: &Path,
    right: &Path,
    biomart: &Path,
    outdir: &Path,
    strictness: Strictness,
) -> Result<CommandOutput<()>, AnnoJoinError> {
    let mut report = Report::new();

    let transcripts = load_transcript_genes(biomart, strictness)?;
    report_index(&mut report, &transcripts, "transcripts");
    let left_genes = load_homer_genes(left, &transcripts, strictness, &mut report)?;
    let right_genes = load_homer_genes(right, &transcripts, strictness, &mut report)?;

    let diff = left_genes.set_difference(&right_genes)?;
    report.add_summary(format!(
        "Comparing gene lists: {} genes in common.",
        diff.common.len()
    ));
    write_table(
        &outdir.join("common_genes.xls"),
        None,
        diff.common.iter().filter_map(|key| left_genes.get_one(key).cloned()),
        &mut report,
    )?;
    Ok(CommandOutput::new((), report))
}

fn write_histogram(
    path: &Path,
    histogram: &Histogram,
    report: &mut Report,
) -> Result<WriteSummary, AnnoJoinError> {
    let output = OutputFile::new(path, None);
    let summary = write_serialized(&output, histogram.bins())?;
    report_written(report, &output.display_name(), &summary);
    let (below, above) = histogram.out_of_range();
    if below + above > 0 {
        report.add_issue(format!(
            "{} values fell below and {} above the histogram range.",
            below, above
        ));
    }
    Ok(summary)
}

/// Rename the sequence column of a GTF file to the `chr`-prefixed convention of
/// `assembly`, using an optional alternate scaffold placement file.
///
/// Scaffolds with no known placement are written as `NA`, or dropped when
/// `drop_unmapped` is set. Writes `<stem>_locations_edited.gtf` unless `output` is given.
pub fn gtf_remap(
    gtf_path: &Path,
    assembly: Assembly,
    patches: Option<&Path>,
    drop_unmapped: bool,
    output: Option<&Path>,
    strictness: Strictness,
) -> Result<CommandOutput<()>, AnnoJoinError> {
    let output_path = output_or(output, || {
        derived_output_path(gtf_path, "_locations_edited.gtf")
    });
    let mut report = Report::new();

    let patches = patches
        .map(|path| load_patches(path, assembly, strictness))
        .transpose()?;
    if let Some(index) = &patches {
        report_index(&mut report, index, "patches and alternate loci");
    }

    let mut source =
        RecordSource::with_options(gtf_path, gtf_source_options().strictness(strictness))?;
    let output = OutputFile::new(&output_path, None);
    let mut writer = TableWriter::new(&output)?;
    let mut unmapped = 0;
    for result in source.by_ref() {
        let mut record = result?;
        let chrom = remap_chromosome(record.require(gtf::SEQNAME)?, patches.as_ref(), assembly);
        if !chrom.is_mapped() {
            unmapped += 1;
            if drop_unmapped {
                continue;
            }
        }
        record.set(gtf::SEQNAME, chrom.to_string());
        writer.write_row(&record)?;
    }
    let summary = writer.finish()?;

    report_read(&mut report, &source);
    if unmapped > 0 {
        let fate = if drop_unmapped { "dropped" } else { "written as NA" };
        report.add_issue(format!(
            "{} rows were on unplaced scaffolds and were {}.",
            unmapped, fate
        ));
    }
    report_written(&mut report, &output.display_name(), &summary);
    Ok(CommandOutput::new((), report))
}

/// Keep the HOMER rows whose annotation starts with `keyword` (case-insensitive),
/// e.g. `promoter-tss` or `intron`. The header line is kept.
///
/// Writes `retrievedAnnotations_<keyword>.txt` unless `output` is given.
pub fn annotations_retrieve(
    homer_path: &Path,
    keyword: &str,
    output: Option<&Path>,
    strictness: Strictness,
) -> Result<CommandOutput<()>, AnnoJoinError> {
    let keyword = keyword.trim().to_lowercase();
    if keyword.is_empty() {
        return Err(AnnoJoinError::ArgumentError(
            "the annotation keyword must not be empty".to_string(),
        ));
    }
    let output_path = output_or(output, || {
        PathBuf::from(format!("retrievedAnnotations_{}.txt", keyword))
    });
    let mut report = Report::new();

    let options = homer_source_options()
        .min_columns(homer::ANNOTATION + 1)
        .strictness(strictness);
    let mut source = RecordSource::with_options(homer_path, options)?;
    let header = source.header().map(|h| vec![h.to_tsv()]);

    let output = OutputFile::new(&output_path, header);
    let mut writer = TableWriter::new(&output)?;
    for result in source.by_ref() {
        let record = result?;
        let annotation = HomerAnnotation(&record).annotation()?;
        if annotation.trim().to_lowercase().starts_with(&keyword) {
            writer.write_row(&record)?;
        }
    }
    let summary = writer.finish()?;

    report_read(&mut report, &source);
    report.add_summary(format!(
        "Looking for lines with annotation '{}': {} lines found.",
        keyword, summary.rows
    ));
    report_written(&mut report, &output.display_name(), &summary);
    Ok(CommandOutput::new((), report))
}

/// Append gene ID, gene name and gene description columns to a HOMER annotation
/// file, from a BioMart export of `transcript ID`, `gene ID`, `gene name`,
/// `description`. Unknown transcripts get `NA`s; no peak is dropped.
///
/// Writes `<stem>_detailed.xls` unless `output` is given.
pub fn annotations_complete(
    homer_path: &Path,
    biomart: &Path,
    output: Option<&Path>,
    strictness: Strictness,
) -> Result<CommandOutput<()>, AnnoJoinError> {
    let output_path = output_or(output, || derived_output_path(homer_path, "_detailed.xls"));
    let mut report = Report::new();

    let spec = MappingSpec::new(0, vec![1, 2, 3], KeyPolicy::default());
    let genes = load_mapping(biomart, &spec, strictness)?;
    report_index(&mut report, &genes, "transcripts");

    let mut source =
        RecordSource::with_options(homer_path, homer_source_options().strictness(strictness))?;
    let mut options = JoinOptions::new(JoinMode::InnerProject)
        .fill_width(spec.width())
        .strictness(strictness);
    let header = source.header().map(|h| {
        options.pad_to = Some(h.len());
        let mut h = h.clone();
        h.extend(COMPLETION_COLUMNS);
        vec![h.to_tsv()]
    });

    let output = OutputFile::new(&output_path, header);
    let mut writer = TableWriter::new(&output)?;
    let mut joined = join(source.by_ref(), &genes, homer::TRANSCRIPT_ID, options);
    for result in joined.by_ref() {
        writer.write_row(&result?.record)?;
    }
    let counts = joined.counts();
    let summary = writer.finish()?;

    report_read(&mut report, &source);
    report_join(&mut report, &counts, genes.name());
    report_written(&mut report, &output.display_name(), &summary);
    Ok(CommandOutput::new((), report))
}

/// Bin the distances to the nearest TSS of a HOMER annotation file.
///
/// Writes `<stem>_distances.tsv` unless `output` is given.
pub fn annotations_distances(
    homer_path: &Path,
    output: Option<&Path>,
    strictness: Strictness,
) -> Result<CommandOutput<()>, AnnoJoinError> {
    let output_path = output_or(output, || derived_output_path(homer_path, "_distances.tsv"));
    let mut report = Report::new();

    let options = homer_source_options()
        .min_columns(homer::DISTANCE_TO_TSS + 1)
        .strictness(strictness);
    let mut source = RecordSource::with_options(homer_path, options)?;
    let (lower, upper, step) = ANNOTATION_DISTANCE_BINS;
    let mut histogram = Histogram::new(lower, upper, step)?;
    for result in source.by_ref() {
        let record = result?;
        match HomerAnnotation(&record).distance_to_tss() {
            Ok(distance) => histogram.add(distance),
            Err(e) => strictness.absorb(e)?,
        }
    }

    report_read(&mut report, &source);
    write_histogram(&output_path, &histogram, &mut report)?;
    Ok(CommandOutput::new((), report))
}

/// Count the HOMER annotations per genomic feature category.
///
/// Writes `<stem>_categories.tsv` unless `output` is given.
pub fn annotations_categories(
    homer_path: &Path,
    output: Option<&Path>,
    strictness: Strictness,
) -> Result<CommandOutput<()>, AnnoJoinError> {
    let output_path = output_or(output, || derived_output_path(homer_path, "_categories.tsv"));
    let mut report = Report::new();

    let options = homer_source_options()
        .min_columns(homer::ANNOTATION + 1)
        .strictness(strictness);
    let mut source = RecordSource::with_options(homer_path, options)?;
    let mut categories = Vec::new();
    for result in source.by_ref() {
        let record = result?;
        categories.push(HomerAnnotation(&record).category()?);
    }
    let counts = count_categories(categories);

    report_read(&mut report, &source);
    let other = counts
        .iter()
        .find(|c| c.category == AnnotationCategory::Other)
        .map_or(0, |c| c.count);
    if other > 0 {
        report.add_issue(format!(
            "{} annotations matched no known category and were counted as {}.",
            other,
            AnnotationCategory::Other
        ));
    }
    let output = OutputFile::new(&output_path, None);
    let summary = write_serialized(&output, &counts)?;
    report_written(&mut report, &output.display_name(), &summary);
    Ok(CommandOutput::new((), report))
}

/// Place the motif hits of a MEME or FIMO scan on the genome, using the MACS peaks
/// the scanned sequences came from.
///
/// Peaks and scanned sequences are matched on the peak number that follows
/// `<name>_` in their IDs, where `name` is the MACS experiment name. Writes
/// `<name>_motif.bed` unless `output` is given; with `with_strand` it is BED6
/// carrying each hit's strand.
#[allow(clippy::too_many_arguments)]
pub fn motifs_locate(
    motifs: &Path,
    tool: MotifScanTool,
    peaks: &Path,
    name: &str,
    width: Position,
    with_strand: bool,
    output: Option<&Path>,
    strictness: Strictness,
) -> Result<CommandOutput<()>, AnnoJoinError> {
    if width < 0 {
        return Err(AnnoJoinError::ArgumentError(format!(
            "the motif width must not be negative, got {}",
            width
        )));
    }
    if name.trim().is_empty() {
        return Err(AnnoJoinError::ArgumentError(
            "the experiment name must not be empty".to_string(),
        ));
    }
    let output_path = output_or(output, || PathBuf::from(format!("{}_motif.bed", name)));
    let mut report = Report::new();

    let policy = KeyPolicy::new(
        Normalize::UppercaseTrim,
        KeyParse::AfterSeparator(format!("{}_", name)),
    );
    info!(
        "reading {:?} motif starts from column {}",
        tool,
        tool.start_column() + 1
    );
    let source = RecordSource::with_options(
        motifs,
        SourceOptions::default()
            .min_columns(tool.min_columns())
            .strictness(strictness),
    )?;
    let hits = Index::build(
        motifs.display().to_string(),
        source,
        &KeyExtractor::new(tool.peak_id_column(), policy),
        CollisionPolicy::Collect,
        strictness,
        |record| MotifHit::from_record(record, tool),
    )?;
    report_index(&mut report, &hits, "sequences with a motif");

    let options = bed_source_options()
        .min_columns(bed::MIN_NAMED_COLUMNS)
        .strictness(strictness);
    let mut peak_source = RecordSource::with_options(peaks, options)?;
    let output = OutputFile::new(&output_path, None);
    let mut writer = TableWriter::new(&output)?;
    let mut joined = join(
        peak_source.by_ref(),
        &hits,
        bed::NAME,
        JoinOptions::new(JoinMode::InnerFilter).strictness(strictness),
    );
    let mut skipped = 0;
    for result in joined.by_ref() {
        let result = result?;
        let peak = match BedRecord::from_record(&result.record) {
            Ok(peak) => peak,
            Err(e) => {
                strictness.absorb(e)?;
                skipped += 1;
                continue;
            }
        };
        let peak_id = peak.name().unwrap_or(MISSING).trim();
        for hit in result.payloads {
            let (start, end) = motif_genomic_position(peak.interval.start, hit.offset, width);
            let mut motif =
                GenomicInterval::new(&peak.interval.seqname, start, end)?.with_name(peak_id);
            if with_strand {
                motif = motif
                    .with_score("0")
                    .with_strand(hit.strand.unwrap_or(Strand::Unstranded));
            }
            writer.write_row(&motif)?;
        }
    }
    let counts = joined.counts();
    let summary = writer.finish()?;

    report_read(&mut report, &peak_source);
    report.add_summary(format!(
        "Found {} peaks with a motif in '{}'.",
        counts.matched,
        peaks.display()
    ));
    if counts.unmatched_right > 0 {
        report.add_issue(format!(
            "{} scanned sequences matched no peak.",
            counts.unmatched_right
        ));
    }
    if counts.malformed > 0 {
        report.add_issue(format!(
            "{} peak IDs lacked the '{}_' separator.",
            counts.malformed, name
        ));
    }
    if skipped > 0 {
        report.add_issue(format!("{} peaks had invalid coordinates.", skipped));
    }
    report_written(&mut report, &output.display_name(), &summary);
    Ok(CommandOutput::new((), report))
}

fn read_sequences(
    fasta_path: &Path,
    report: &mut Report,
) -> Result<Vec<noodles::fasta::Record>, AnnoJoinError> {
    let records = fasta::read_fasta(fasta_path)?;
    report.add_summary(format!(
        "Reading '{}': {} sequences.",
        fasta_path.display(),
        records.len()
    ));
    Ok(records)
}

/// Retrieve the sequences whose names are listed (first column) in `ids`.
///
/// With a `separator`, names on both sides are compared by the part following
/// `<separator>_`, e.g. `MITF_peak_201` and `CT_HG19_MITF_peak_201` with separator
/// `MITF`. Writes `retrieved_sequences.fasta` unless `output` is given.
pub fn fasta_retrieve(
    fasta_path: &Path,
    ids: &Path,
    separator: Option<&str>,
    output: Option<&Path>,
    strictness: Strictness,
) -> Result<CommandOutput<()>, AnnoJoinError> {
    let output_path = output_or(output, || PathBuf::from("retrieved_sequences.fasta"));
    let mut report = Report::new();

    let parse = separator.map_or(KeyParse::Whole, |s| {
        KeyParse::AfterSeparator(format!("{}_", s))
    });
    let policy = KeyPolicy::new(Normalize::Trim, parse);
    let source = RecordSource::with_options(ids, SourceOptions::default().strictness(strictness))?;
    let wanted = Index::build(
        ids.display().to_string(),
        source,
        &KeyExtractor::new(0, policy),
        CollisionPolicy::Overwrite,
        strictness,
        |_| Ok(()),
    )?;
    report_index(&mut report, &wanted, "sequence IDs to retrieve");

    let records = read_sequences(fasta_path, &mut report)?;
    let (retained, unparsable) = fasta::retrieve(records, &wanted)?;
    if unparsable > 0 {
        report.add_issue(format!(
            "{} sequence names could not be parsed with separator '{}_'.",
            unparsable,
            separator.unwrap_or_default()
        ));
    }
    report.add_summary(format!(
        "Found {} sequences matching IDs.",
        retained.len()
    ));

    let output = OutputFile::new(&output_path, None);
    let written = fasta::write_fasta(&output, &retained)?;
    report.add_summary(format!(
        "Writing '{}': {} sequences.",
        output.display_name(),
        written
    ));
    Ok(CommandOutput::new((), report))
}

/// Rename every sequence to `sequence_<n>`, counting from 0.
///
/// Writes `output.fasta` unless `output` is given.
pub fn fasta_relabel(
    fasta_path: &Path,
    output: Option<&Path>,
) -> Result<CommandOutput<()>, AnnoJoinError> {
    let output_path = output_or(output, || PathBuf::from("output.fasta"));
    let mut report = Report::new();
    let records = read_sequences(fasta_path, &mut report)?;
    let output = OutputFile::new(&output_path, None);
    let written = fasta::write_fasta(&output, &fasta::relabel(&records))?;
    report.add_summary(format!(
        "Writing '{}': {} sequences.",
        output.display_name(),
        written
    ));
    Ok(CommandOutput::new((), report))
}

/// Count the sequences containing `pattern` literally.
pub fn fasta_search(
    fasta_path: &Path,
    pattern: &str,
) -> Result<CommandOutput<usize>, AnnoJoinError> {
    if pattern.is_empty() {
        return Err(AnnoJoinError::ArgumentError(
            "the search pattern must not be empty".to_string(),
        ));
    }
    let mut report = Report::new();
    let records = read_sequences(fasta_path, &mut report)?;
    let matches = fasta::count_containing(&records, pattern.as_bytes());
    report.add_summary(format!("{} sequences with match(es).", matches));
    Ok(CommandOutput::new(matches, report))
}

/// Convert the `<SequenceLocation>`s of a ClinVar XML release on `assembly` to
/// BED6: `chr<Chr>`, start, stop, accession, `0`, strand.
///
/// Locations without a start or stop are skipped and counted. Writes
/// `clinvar.bed` unless `output` is given.
pub fn clinvar_to_bed(
    xml: &Path,
    assembly: &str,
    output: Option<&Path>,
    strictness: Strictness,
) -> Result<CommandOutput<()>, AnnoJoinError> {
    let output_path = output_or(output, || PathBuf::from("clinvar.bed"));
    let mut report = Report::new();
    let locations = SequenceLocations::from_path(xml)?;

    let output = OutputFile::new(&output_path, None);
    let mut writer = TableWriter::new(&output)?;
    let (mut found, mut other_assembly, mut incomplete, mut invalid) = (0, 0, 0, 0);
    for location in locations {
        let location = location?;
        found += 1;
        if !location.is_assembly(assembly) {
            other_assembly += 1;
            continue;
        }
        match location.to_interval() {
            Ok(Some(interval)) => writer.write_row(&interval)?,
            Ok(None) => {
                debug!(
                    "{} location on {} has no start or stop",
                    location.accession.as_deref().unwrap_or(NA_TSV.missing()),
                    assembly
                );
                incomplete += 1;
            }
            Err(e) => {
                strictness.absorb(e)?;
                invalid += 1;
            }
        }
    }
    let summary = writer.finish()?;

    report.add_summary(format!(
        "Reading '{}': {} locations found, {} on other assemblies.",
        xml.display(),
        found,
        other_assembly
    ));
    if incomplete > 0 {
        report.add_issue(format!(
            "{} {} locations had no start or stop and were skipped.",
            incomplete, assembly
        ));
    }
    if invalid > 0 {
        report.add_issue(format!(
            "{} {} locations had unparsable positions and were skipped.",
            invalid, assembly
        ));
    }
    report_written(&mut report, &output.display_name(), &summary);
    Ok(CommandOutput::new((), report))
}

/// Look up `raw` in an optional mapping, filling `width` `NA`s when there is no
/// mapping or no match. Misses are logged and counted.
fn lookup_or_missing(
    index: Option<&Index<Vec<String>>>,
    raw: &str,
    width: usize,
    misses: &mut usize,
) -> Result<Vec<String>, AnnoJoinError> {
    let missing = || -> Vec<String> { NA_TSV.fill(width).map(String::from).collect() };
    let Some(index) = index else {
        return Ok(missing());
    };
    match index.lookup(raw)? {
        Some(values) => Ok(values.clone()),
        None => {
            warn!("ID not found in '{}': {}", index.name(), raw);
            *misses += 1;
            Ok(missing())
        }
    }
}

/// Tabulate the single-nucleotide variants found within motifs.
///
/// `intersect` is the output of `intersectBed -a <clinvar.bed> -b <motifs.bed> -wo`.
/// Each optional table adds detail: the extended ClinVar BED (variant name,
/// clinical significance, condition), the HOMER annotation of the peaks
/// (nearest gene and distance), and ClinVar's disease names (condition name
/// from its MedGen ID). Writes `variantTable.xls` unless `output` is given.
pub fn report_snv(
    intersect: &Path,
    clinvar: Option<&Path>,
    homer_path: Option<&Path>,
    diseases: Option<&Path>,
    output: Option<&Path>,
    strictness: Strictness,
) -> Result<CommandOutput<()>, AnnoJoinError> {
    let output_path = output_or(output, || PathBuf::from("variantTable.xls"));
    let mut report = Report::new();
    let trimmed = KeyPolicy::normalized(Normalize::Trim);

    let variant_spec = MappingSpec::new(
        variants::clinvar::VARIANT_ID,
        vec![
            variants::clinvar::NAME,
            variants::clinvar::CLINICAL_SIGNIFICANCE,
            variants::clinvar::CONDITION,
        ],
        trimmed.clone(),
    );
    let peak_spec = MappingSpec::new(
        homer::PEAK_ID,
        vec![homer::DISTANCE_TO_TSS, homer::GENE_NAME, homer::GENE_DESCRIPTION],
        trimmed.clone(),
    )
    .source_options(homer_source_options());
    let disease_spec = MappingSpec::new(
        variants::disease::MEDGEN_ID,
        vec![variants::disease::NAME],
        trimmed,
    );
    let clinvar = clinvar
        .map(|path| load_mapping(path, &variant_spec, strictness))
        .transpose()?;
    let peaks = homer_path
        .map(|path| load_mapping(path, &peak_spec, strictness))
        .transpose()?;
    let diseases = diseases
        .map(|path| load_mapping(path, &disease_spec, strictness))
        .transpose()?;
    for (index, what) in [
        (&clinvar, "variants"),
        (&peaks, "annotations"),
        (&diseases, "diseases"),
    ] {
        if let Some(index) = index {
            report_index(&mut report, index, what);
        }
    }

    let options = SourceOptions::default()
        .min_columns(variants::overlap::MIN_COLUMNS)
        .strictness(strictness);
    let mut source = RecordSource::with_options(intersect, options)?;
    let mut snvs = Vec::new();
    let mut longer = 0;
    for result in source.by_ref() {
        let record = result?;
        match MotifVariant::from_record(&record) {
            Ok(variant) if variant.is_snv() => snvs.push(variant),
            Ok(_) => longer += 1,
            Err(e) => strictness.absorb(e)?,
        }
    }
    let motif_width = snvs.first().map_or(0, |v| v.motif_width);
    report_read(&mut report, &source);
    report.add_summary(format!(
        "Found {} SNVs, motif length: {}bp.",
        snvs.len(),
        motif_width
    ));
    if longer > 0 {
        report.add_issue(format!(
            "{} variants spanned more than {} bases and were left out.",
            longer,
            variants::MAX_SNV_SPAN
        ));
    }

    let (mut variant_misses, mut peak_misses) = (0, 0);
    let mut rows = Vec::with_capacity(snvs.len());
    for snv in &snvs {
        let variant = lookup_or_missing(
            clinvar.as_ref(),
            &snv.variant_id,
            variant_spec.width(),
            &mut variant_misses,
        )?;
        let peak = lookup_or_missing(
            peaks.as_ref(),
            &snv.peak_id,
            peak_spec.width(),
            &mut peak_misses,
        )?;
        let (name, significance, condition) = (&variant[0], &variant[1], &variant[2]);

        let disease = if condition == MISSING {
            MISSING.to_string()
        } else {
            let medgen_id = parse_medgen_id(condition);
            match &diseases {
                Some(index) => index.lookup(&medgen_id)?.map_or(medgen_id.clone(), |v| v[0].clone()),
                None => medgen_id,
            }
        };
        rows.push(vec![
            snv_representation(motif_width, snv.position, alternate_nucleotide(name)),
            snv.variant_id.clone(),
            snv.peak_id.clone(),
            snv.position.to_string(),
            name.clone(),
            significance.clone(),
            disease,
            peak[1].clone(),
            peak[2].clone(),
            peak[0].clone(),
        ]);
    }
    if variant_misses > 0 {
        report.add_issue(format!(
            "{} variants were not found in the ClinVar table.",
            variant_misses
        ));
    }
    if peak_misses > 0 {
        report.add_issue(format!(
            "{} peaks were not found in the HOMER annotation.",
            peak_misses
        ));
    }

    // the blank line after the header is part of the table layout
    let header = vec![SNV_TABLE_HEADER.to_string(), String::new()];
    write_table(&output_path, Some(header), rows, &mut report)?;
    Ok(CommandOutput::new((), report))
}
