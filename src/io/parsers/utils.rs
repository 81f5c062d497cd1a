use std::path::{Path, PathBuf};

/// Get the *base* name of a file: the file name up to its first `.`,
/// e.g. `data/peaks.sorted.bed` gives `peaks`.
pub fn get_base_stem<P: AsRef<Path>>(filepath: P) -> String {
    let path = filepath.as_ref();

    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("")
        .split('.')
        .next()
        .unwrap_or("")
        .to_string()
}

/// Build an output path beside `input`, named from its base stem and `suffix`,
/// e.g. `data/peaks.bed` with suffix `_offset100.bed` gives `data/peaks_offset100.bed`.
pub fn derived_output_path<P: AsRef<Path>>(input: P, suffix: &str) -> PathBuf {
    let input = input.as_ref();
    let name = format!("{}{}", get_base_stem(input), suffix);
    match input.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_stem() {
        assert_eq!(get_base_stem("data/peaks.sorted.bed"), "peaks");
        assert_eq!(get_base_stem("genes"), "genes");
        assert_eq!(get_base_stem("ann.txt"), "ann");
    }

    #[test]
    fn test_derived_output_path() {
        assert_eq!(
            derived_output_path("data/peaks.bed", "_offset100.bed"),
            PathBuf::from("data/peaks_offset100.bed")
        );
        assert_eq!(
            derived_output_path("genes.gtf", "_locations_edited.gtf"),
            PathBuf::from("genes_locations_edited.gtf")
        );
    }
}
