
use std::fmt;

/// The four nucleotide bases we accept in mutation names
pub const NUCLEOTIDES: [u8; 4] = [b'A', b'C', b'G', b'T'];

#[derive(thiserror::Error, Debug)]
pub enum MutationParseError {
    #[error("mutation {name:?} is too short to parse")]
    TooShort { name: String },
    #[error("mutation {name:?} has an invalid position field")]
    InvalidPosition { name: String },
    #[error("mutation {name:?} has an invalid codon index field")]
    InvalidCodon { name: String },
    #[error("mutation {name:?} contains an unrecognized base '{base}'")]
    InvalidBase { name: String, base: char },
    #[error("mutation {name:?} contains an unrecognized residue '{residue}'")]
    InvalidResidue { name: String, residue: char },
    #[error("mutation {name:?} does not match a recognized deletion form")]
    InvalidDeletion { name: String }
}

/// The observed state at a single genomic position: either a substituted base or a deleted one
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Allele {
    /// A concrete nucleotide (A, C, G, or T)
    Base(u8),
    /// The position is deleted relative to the reference
    Deletion
}

impl fmt::Display for Allele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Allele::Base(b) => write!(f, "{}", *b as char),
            Allele::Deletion => write!(f, "-")
        }
    }
}

/// A single-nucleotide variant hypothesis at a fixed genomic locus.
/// Positions are 1-based throughout; gene tables are 0-based and converted at the translation boundary.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Snv {
    /// The reference base at this position
    reference_base: u8,
    /// 1-based genomic position
    position: u64,
    /// The mutant allele we are testing for
    target: Allele
}

impl Snv {
    pub fn new(reference_base: u8, position: u64, target: Allele) -> Self {
        Self { reference_base, position, target }
    }

    pub fn reference_base(&self) -> u8 {
        self.reference_base
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn target(&self) -> Allele {
        self.target
    }

    pub fn is_deletion(&self) -> bool {
        self.target == Allele::Deletion
    }
}

impl fmt::Display for Snv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.reference_base as char, self.position, self.target)
    }
}

/// An amino-acid level change within one codon of a gene
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ResidueChange {
    /// Replacement of the reference residue with a target residue
    Substitution {
        /// the residue encoded by the reference codon, as given in the mutation name
        reference: u8,
        /// the residue the mutant codon must encode
        target: u8
    },
    /// The whole codon is deleted
    Deletion
}

/// A diagnostic mutation, written either at nucleotide or amino-acid level.
/// Immutable once parsed; the catalog keys mutations by their canonical name.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Mutation {
    /// A direct nucleotide-level change, e.g. "A23403G" or "C21991-"
    Nucleotide(Snv),
    /// A gene-relative change, e.g. "S:N501Y" or "S:DEL69"
    AminoAcid {
        gene: String,
        /// 1-based codon index within the gene
        codon: usize,
        change: ResidueChange
    },
    /// A multi-base deletion given in genomic coordinates, e.g. "DEL:21633:9"
    GenomicDeletion {
        /// 1-based genomic position of the first deleted base
        start: u64,
        length: usize
    }
}

impl Mutation {
    /// Parses a mutation from its textual name.
    /// Names containing ':' are amino-acid level ("S:N501Y", "S:DEL69", "S:V70-")
    /// or genomic deletions ("DEL:21633:9"); everything else is a plain SNV ("A23403G", "C21991-").
    /// # Arguments
    /// * `name` - the mutation name to parse
    /// # Errors
    /// * if the name does not match any of the recognized forms
    pub fn parse(name: &str) -> Result<Mutation, MutationParseError> {
        if name.contains(':') {
            Self::parse_amino_acid(name)
        } else {
            Self::parse_snv(name).map(Mutation::Nucleotide)
        }
    }

    /// Parses a plain nucleotide mutation name such as "A23403G" or "C21991-"
    pub fn parse_snv(name: &str) -> Result<Snv, MutationParseError> {
        let bytes = name.as_bytes();
        if bytes.len() < 3 {
            return Err(MutationParseError::TooShort { name: name.to_string() });
        }

        let reference_base = bytes[0];
        if !NUCLEOTIDES.contains(&reference_base) {
            return Err(MutationParseError::InvalidBase { name: name.to_string(), base: reference_base as char });
        }

        let last = bytes[bytes.len() - 1];
        let target = match last {
            b'-' => Allele::Deletion,
            b if NUCLEOTIDES.contains(&b) => Allele::Base(b),
            _ => return Err(MutationParseError::InvalidBase { name: name.to_string(), base: last as char })
        };

        let position: u64 = name[1..name.len() - 1].parse()
            .map_err(|_| MutationParseError::InvalidPosition { name: name.to_string() })?;
        if position == 0 {
            return Err(MutationParseError::InvalidPosition { name: name.to_string() });
        }

        Ok(Snv::new(reference_base, position, target))
    }

    fn parse_amino_acid(name: &str) -> Result<Mutation, MutationParseError> {
        let (gene, rest) = name.split_once(':').unwrap();

        // genome-coordinate deletion form: DEL:<start>:<length>
        if gene == "DEL" {
            let (start_str, len_str) = rest.split_once(':')
                .ok_or_else(|| MutationParseError::InvalidDeletion { name: name.to_string() })?;
            let start: u64 = start_str.parse()
                .map_err(|_| MutationParseError::InvalidPosition { name: name.to_string() })?;
            let length: usize = len_str.parse()
                .map_err(|_| MutationParseError::InvalidDeletion { name: name.to_string() })?;
            if start == 0 || length == 0 {
                return Err(MutationParseError::InvalidDeletion { name: name.to_string() });
            }
            return Ok(Mutation::GenomicDeletion { start, length });
        }

        if gene.is_empty() || rest.len() < 2 {
            return Err(MutationParseError::TooShort { name: name.to_string() });
        }

        // codon deletion form: <gene>:DEL<codon>
        if let Some(codon_str) = rest.strip_prefix("DEL") {
            let codon = parse_codon(codon_str, name)?;
            return Ok(Mutation::AminoAcid { gene: gene.to_string(), codon, change: ResidueChange::Deletion });
        }

        let bytes = rest.as_bytes();
        let reference = bytes[0];
        if !is_residue(reference) {
            return Err(MutationParseError::InvalidResidue { name: name.to_string(), residue: reference as char });
        }

        let last = bytes[bytes.len() - 1];
        // trailing '-' is an alternate spelling for a codon deletion: <gene>:<ref><codon>-
        if last == b'-' {
            let codon = parse_codon(&rest[1..rest.len() - 1], name)?;
            return Ok(Mutation::AminoAcid { gene: gene.to_string(), codon, change: ResidueChange::Deletion });
        }
        if !is_residue(last) {
            return Err(MutationParseError::InvalidResidue { name: name.to_string(), residue: last as char });
        }

        let codon = parse_codon(&rest[1..rest.len() - 1], name)?;
        Ok(Mutation::AminoAcid {
            gene: gene.to_string(),
            codon,
            change: ResidueChange::Substitution { reference, target: last }
        })
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::Nucleotide(snv) => write!(f, "{snv}"),
            Mutation::AminoAcid { gene, codon, change } => match change {
                ResidueChange::Substitution { reference, target } => {
                    write!(f, "{gene}:{}{codon}{}", *reference as char, *target as char)
                },
                ResidueChange::Deletion => write!(f, "{gene}:DEL{codon}")
            },
            Mutation::GenomicDeletion { start, length } => write!(f, "DEL:{start}:{length}")
        }
    }
}

/// Residues are single uppercase letters, with '_' and '*' as stop markers
fn is_residue(b: u8) -> bool {
    b.is_ascii_uppercase() || b == b'_' || b == b'*'
}

fn parse_codon(codon_str: &str, name: &str) -> Result<usize, MutationParseError> {
    let codon: usize = codon_str.parse()
        .map_err(|_| MutationParseError::InvalidCodon { name: name.to_string() })?;
    if codon == 0 {
        return Err(MutationParseError::InvalidCodon { name: name.to_string() });
    }
    Ok(codon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_snv() {
        let snv = Mutation::parse_snv("A23403G").unwrap();
        assert_eq!(snv.reference_base(), b'A');
        assert_eq!(snv.position(), 23403);
        assert_eq!(snv.target(), Allele::Base(b'G'));
        assert_eq!(snv.to_string(), "A23403G");

        let del = Mutation::parse_snv("C21991-").unwrap();
        assert_eq!(del.target(), Allele::Deletion);
        assert!(del.is_deletion());
        assert_eq!(del.to_string(), "C21991-");
    }

    #[test]
    fn test_parse_amino_acid_substitution() {
        let mutation = Mutation::parse("S:N501Y").unwrap();
        assert_eq!(mutation, Mutation::AminoAcid {
            gene: "S".to_string(),
            codon: 501,
            change: ResidueChange::Substitution { reference: b'N', target: b'Y' }
        });
        assert_eq!(mutation.to_string(), "S:N501Y");
    }

    #[test]
    fn test_parse_codon_deletions() {
        let del = Mutation::parse("S:DEL69").unwrap();
        assert_eq!(del, Mutation::AminoAcid {
            gene: "S".to_string(),
            codon: 69,
            change: ResidueChange::Deletion
        });

        // trailing-dash spelling parses to the same thing
        let dash = Mutation::parse("S:V70-").unwrap();
        assert_eq!(dash, Mutation::AminoAcid {
            gene: "S".to_string(),
            codon: 70,
            change: ResidueChange::Deletion
        });
    }

    #[test]
    fn test_parse_genomic_deletion() {
        let del = Mutation::parse("DEL:21633:9").unwrap();
        assert_eq!(del, Mutation::GenomicDeletion { start: 21633, length: 9 });
        assert_eq!(del.to_string(), "DEL:21633:9");
    }

    #[test]
    fn test_parse_failures() {
        assert!(Mutation::parse("X123Y").is_err()); // not a base
        assert!(Mutation::parse("A0G").is_err()); // positions are 1-based
        assert!(Mutation::parse("S:N0Y").is_err());
        assert!(Mutation::parse("AG").is_err());
        assert!(Mutation::parse("DEL:21633").is_err());
        assert!(Mutation::parse("AxyzG").is_err());
    }
}
