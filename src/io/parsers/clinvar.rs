//! ClinVar full release XML, as far as BED conversion needs it.
//!
//! Each `<SequenceLocation>` becomes one [`SequenceLocation`], named with the
//! accession of the nearest preceding `<ClinVarAccession>`. Locations nested in
//! a `<MeasureRelationship>` describe related genes, not the variant, and are
//! not reported.

use std::io::BufRead;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::{
    error::AnnoJoinError,
    io::{file::InputFile, tsv::NA_TSV},
    ranges::{chromosomes::CHROM_PREFIX, GenomicInterval, Strand},
    Position,
};

/// The assembly whose locations are kept by default.
pub const DEFAULT_ASSEMBLY: &str = "GRCh37";

const ACCESSION: &[u8] = b"ClinVarAccession";
const LOCATION: &[u8] = b"SequenceLocation";
const RELATIONSHIP: &[u8] = b"MeasureRelationship";

/// The attributes of one `<SequenceLocation>`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SequenceLocation {
    pub accession: Option<String>,
    pub assembly: Option<String>,
    pub chr: Option<String>,
    pub start: Option<String>,
    pub stop: Option<String>,
    pub strand: Option<String>,
}

impl SequenceLocation {
    pub fn is_assembly(&self, assembly: &str) -> bool {
        self.assembly.as_deref() == Some(assembly)
    }

    /// The BED6 interval `chr<Chr>, start, stop, accession, 0, strand`, or
    /// `None` when the location has no start, stop or chromosome.
    ///
    /// Coordinates are written as ClinVar gives them. Strands other than `+`
    /// and `-` become `.`.
    pub fn to_interval(&self) -> Result<Option<GenomicInterval>, AnnoJoinError> {
        let (Some(chr), Some(start), Some(stop)) = (&self.chr, &self.start, &self.stop) else {
            return Ok(None);
        };
        let start = parse_position("start", start)?;
        let stop = parse_position("stop", stop)?;
        let strand = match self.strand.as_deref() {
            Some("+") => Strand::Forward,
            Some("-") => Strand::Reverse,
            _ => Strand::Unstranded,
        };
        let interval = GenomicInterval::new(format!("{}{}", CHROM_PREFIX, chr), start, stop)?
            .with_name(self.accession.as_deref().unwrap_or(NA_TSV.missing()))
            .with_score("0")
            .with_strand(strand);
        Ok(Some(interval))
    }
}

fn parse_position(attribute: &str, value: &str) -> Result<Position, AnnoJoinError> {
    value
        .trim()
        .parse()
        .map_err(|_| AnnoJoinError::InvalidAttribute {
            element: String::from_utf8_lossy(LOCATION).to_string(),
            attribute: attribute.to_string(),
            value: value.to_string(),
        })
}

/// The value of attribute `name`, if present.
fn attribute(element: &BytesStart, name: &str) -> Result<Option<String>, AnnoJoinError> {
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == name.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn sequence_location(
    element: &BytesStart,
    accession: Option<&str>,
) -> Result<SequenceLocation, AnnoJoinError> {
    Ok(SequenceLocation {
        accession: accession.map(String::from),
        assembly: attribute(element, "Assembly")?,
        chr: attribute(element, "Chr")?,
        start: attribute(element, "start")?,
        stop: attribute(element, "stop")?,
        strand: attribute(element, "Strand")?,
    })
}

/// A streaming reader over the `<SequenceLocation>`s of a ClinVar XML file.
///
/// The file is never held in memory; only the current element is buffered.
pub struct SequenceLocations<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    accession: Option<String>,
    relationship_depth: usize,
    done: bool,
}

impl<R: BufRead> SequenceLocations<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Reader::from_reader(reader),
            buf: Vec::new(),
            accession: None,
            relationship_depth: 0,
            done: false,
        }
    }
}

impl SequenceLocations<std::io::BufReader<Box<dyn std::io::Read>>> {
    pub fn from_path(filepath: impl AsRef<Path>) -> Result<Self, AnnoJoinError> {
        let input = InputFile::new(filepath.as_ref());
        Ok(Self::new(input.reader()?))
    }
}

impl<R: BufRead> Iterator for SequenceLocations<R> {
    type Item = Result<SequenceLocation, AnnoJoinError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(e) => {
                    // the reader cannot resync after malformed markup
                    self.done = true;
                    return Some(Err(e.into()));
                }
            };
            match event {
                Event::Start(ref e) if e.name().as_ref() == RELATIONSHIP => {
                    self.relationship_depth += 1;
                }
                Event::End(ref e) if e.name().as_ref() == RELATIONSHIP => {
                    self.relationship_depth = self.relationship_depth.saturating_sub(1);
                }
                Event::Start(ref e) | Event::Empty(ref e) => match e.name().as_ref() {
                    ACCESSION => match attribute(e, "Acc") {
                        Ok(Some(acc)) => self.accession = Some(acc),
                        Ok(None) => {}
                        Err(err) => return Some(Err(err)),
                    },
                    LOCATION if self.relationship_depth == 0 => {
                        return Some(sequence_location(e, self.accession.as_deref()));
                    }
                    _ => {}
                },
                Event::Eof => {
                    self.done = true;
                    return None;
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::TsvSerialize;

    const RELEASE: &str = r#"<?xml version="1.0"?>
<ReleaseSet>
  <ClinVarSet ID="1">
    <ReferenceClinVarAssertion>
      <ClinVarAccession Acc="RCV000000001" Version="1" Type="RCV"/>
      <MeasureSet Type="Variant">
        <Measure Type="single nucleotide variant">
          <SequenceLocation Assembly="GRCh38" Chr="22" start="37972000" stop="37972000"/>
          <SequenceLocation Assembly="GRCh37" Chr="22" start="38368000" stop="38368000" Strand="+"/>
          <MeasureRelationship Type="variant in gene">
            <SequenceLocation Assembly="GRCh37" Chr="22" start="38368000" stop="38383000" Strand="-"/>
          </MeasureRelationship>
        </Measure>
      </MeasureSet>
    </ReferenceClinVarAssertion>
  </ClinVarSet>
  <ClinVarSet ID="2">
    <ReferenceClinVarAssertion>
      <ClinVarAccession Acc="RCV000000002" Version="1" Type="RCV"/>
      <MeasureSet Type="Variant">
        <Measure Type="Deletion">
          <SequenceLocation Assembly="GRCh37" Chr="X" start="100"/>
          <SequenceLocation Assembly="GRCh37" Chr="X" start="100" stop="104" Strand="?"></SequenceLocation>
        </Measure>
      </MeasureSet>
    </ReferenceClinVarAssertion>
  </ClinVarSet>
</ReleaseSet>
"#;

    fn locations() -> Vec<SequenceLocation> {
        SequenceLocations::new(RELEASE.as_bytes())
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_relationship_locations_are_skipped() {
        let locations = locations();
        assert_eq!(locations.len(), 4);
        assert!(locations.iter().all(|l| l.stop.as_deref() != Some("38383000")));
    }

    #[test]
    fn test_accession_and_assembly() {
        let locations = locations();
        assert_eq!(locations[0].accession.as_deref(), Some("RCV000000001"));
        assert!(!locations[0].is_assembly(DEFAULT_ASSEMBLY));
        assert!(locations[1].is_assembly(DEFAULT_ASSEMBLY));
        assert_eq!(locations[3].accession.as_deref(), Some("RCV000000002"));
    }

    #[test]
    fn test_to_interval() {
        let locations = locations();
        let interval = locations[1].to_interval().unwrap().unwrap();
        assert_eq!(interval.to_tsv(), "chr22\t38368000\t38368000\tRCV000000001\t0\t+");
        // no stop
        assert_eq!(locations[2].to_interval().unwrap(), None);
        let interval = locations[3].to_interval().unwrap().unwrap();
        assert_eq!(interval.to_tsv(), "chrX\t100\t104\tRCV000000002\t0\t.");
    }

    #[test]
    fn test_bad_position() {
        let location = SequenceLocation {
            chr: Some("1".to_string()),
            start: Some("one".to_string()),
            stop: Some("2".to_string()),
            ..Default::default()
        };
        let err = location.to_interval().unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_malformed_xml() {
        let results: Vec<_> =
            SequenceLocations::new("<ReleaseSet><ClinVarSet></ReleaseSet>".as_bytes()).collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }
}
