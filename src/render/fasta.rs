//! FASTA record assembly.

/// Default residues per body line.
pub const DEFAULT_LINE_WIDTH: usize = 80;

/// Reverse complement of a nucleotide string. Case is kept; anything that is
/// not A/C/G/T (N, gaps, IUPAC codes) passes through unchanged.
pub fn reverse_complement(dna: &str) -> String {
    dna.chars()
        .rev()
        .map(|c| match c {
            'A' => 'T',
            'T' => 'A',
            'C' => 'G',
            'G' => 'C',
            'a' => 't',
            't' => 'a',
            'c' => 'g',
            'g' => 'c',
            _ => c,
        })
        .collect()
}

/// Break `seq` into lines of at most `width` characters, joined with `\n`.
/// Lines break on `char` boundaries. A width of zero leaves the sequence on
/// one line.
pub fn fold(seq: &str, width: usize) -> String {
    if width == 0 {
        return seq.to_string();
    }
    let mut out = String::with_capacity(seq.len() + seq.len() / width);
    for (i, c) in seq.chars().enumerate() {
        if i > 0 && i % width == 0 {
            out.push('\n');
        }
        out.push(c);
    }
    out
}

/// `>{label}|{acc}.{version}|{start+1}-{end}({strand})`
pub fn header(label: &str, acc: &str, version: i64, start: i64, end: i64, strand: i64) -> String {
    format!(">{label}|{acc}.{version}|{}-{end}({strand})", start + 1)
}

/// Full record: header line followed by the folded body.
pub fn record(header: String, body: &str, width: usize) -> String {
    format!("{header}\n{}", fold(body, width))
}

/// Nucleotide body of a feature: the stored slice, reverse-complemented on
/// the minus strand.
pub fn oriented(slice: &str, strand: i64) -> String {
    if strand == -1 {
        reverse_complement(slice)
    } else {
        slice.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_complement_keeps_case_and_unknowns() {
        assert_eq!(reverse_complement("ACGTN"), "NACGT");
        assert_eq!(reverse_complement("aacg"), "cgtt");
        assert_eq!(reverse_complement(""), "");
    }

    #[test]
    fn fold_never_splits_mid_line() {
        let seq = "A".repeat(170);
        let folded = fold(&seq, 80);
        let lines: Vec<_> = folded.lines().collect();
        assert_eq!(lines.iter().map(|l| l.len()).collect::<Vec<_>>(), vec![80, 80, 10]);
        assert_eq!(fold("ACGT", 80), "ACGT");
        assert_eq!(fold("ACGT", 0), "ACGT");
    }

    #[test]
    fn fold_counts_characters_not_bytes() {
        assert_eq!(fold("ACGÅTT", 4), "ACGÅ\nTT");
        assert_eq!(fold("ÅÅÅ", 1), "Å\nÅ\nÅ");
        let folded = fold(&"é".repeat(12), 5);
        assert_eq!(
            folded.lines().map(|l| l.chars().count()).collect::<Vec<_>>(),
            vec![5, 5, 2]
        );
    }

    #[test]
    fn header_is_one_based_inclusive() {
        assert_eq!(
            header("SCO0001", "NC_003888", 3, 100, 130, -1),
            ">SCO0001|NC_003888.3|101-130(-1)"
        );
    }

    #[test]
    fn minus_strand_body_is_reverse_complemented() {
        assert_eq!(oriented("AACG", -1), "CGTT");
        assert_eq!(oriented("AACG", 1), "AACG");
    }
}
