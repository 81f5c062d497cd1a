use annojoin::io::parsers::homer::{self, homer_source_options};
use annojoin::io::parsers::mapping::{load_mapping, MappingSpec};
use annojoin::prelude::*;

fn try_main() -> Result<(), AnnoJoinError> {
    // transcript ID -> gene ID, gene name, description
    let spec = MappingSpec::new(0, vec![1, 2, 3], KeyPolicy::default());
    let genes = load_mapping(
        "tests_data/biomart_transcripts.txt",
        &spec,
        Strictness::Lenient,
    )?;

    let mut peaks = RecordSource::with_options(
        "tests_data/homer_annotation.txt",
        homer_source_options(),
    )?;

    // every peak is kept; unknown transcripts get NAs
    let options = JoinOptions::new(JoinMode::LeftFillMissing);
    let output = OutputFile::new_stdout(None);
    let mut writer = TableWriter::new(&output)?;
    let mut joined = JoinIter::new(peaks.by_ref(), &genes, homer::TRANSCRIPT_ID, options);
    for result in joined.by_ref() {
        writer.write_row(&result?.record)?;
    }
    let counts = joined.counts();
    writer.finish()?;

    eprintln!(
        "{} peaks, {} matched, {} unmatched",
        counts.primary, counts.matched, counts.unmatched_left
    );
    Ok(())
}

fn main() {
    try_main().unwrap();
}
