//! ABOUTME: Shared testing utilities and helper functions
//! ABOUTME: Common fixtures for antidb crates: sequences and PDB codes

const AMINO_ACIDS: &[u8] = b"ACDEFGHIKLMNPQRSTVWY";

/// Deterministic amino-acid sequence fixture; distinct for every `n` below 20^8
pub fn sample_sequence(n: usize) -> String {
    let mut seq = String::from("ACDE");
    let mut rest = n;
    for _ in 0..8 {
        seq.push(AMINO_ACIDS[rest % AMINO_ACIDS.len()] as char);
        rest /= AMINO_ACIDS.len();
    }
    seq
}

/// Four-character PDB code fixture (digit followed by three alphanumerics)
pub fn sample_pdb_code(n: usize) -> String {
    const ALNUM: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut code = String::with_capacity(4);
    code.push(char::from(b'1' + (n / (36 * 36 * 36) % 9) as u8));
    code.push(ALNUM[n / (36 * 36) % 36] as char);
    code.push(ALNUM[n / 36 % 36] as char);
    code.push(ALNUM[n % 36] as char);
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn sequences_are_distinct() {
        let seqs: HashSet<_> = (0..500).map(sample_sequence).collect();
        assert_eq!(seqs.len(), 500);
    }

    #[test]
    fn pdb_codes_are_distinct_and_short() {
        let codes: HashSet<_> = (0..2000).map(sample_pdb_code).collect();
        assert_eq!(codes.len(), 2000);
        assert!(codes.iter().all(|c| c.len() == 4));
    }
}
