//! ABOUTME: Closed choice sets stored in the schema's enumerated columns
//! ABOUTME: Each enum maps to the short TEXT code kept in the database

use adb_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Experimental method used to determine a PDB entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
pub enum ExpMethod {
    #[serde(rename = "XRD")]
    #[sqlx(rename = "XRD")]
    XrayDiffraction,
    #[serde(rename = "EMP")]
    #[sqlx(rename = "EMP")]
    ElectronMicroscopy,
    #[serde(rename = "SNM")]
    #[sqlx(rename = "SNM")]
    SolutionNmr,
    #[serde(rename = "SSH")]
    #[sqlx(rename = "SSH")]
    SolutionScatteringHomology,
    #[serde(rename = "EMH")]
    #[sqlx(rename = "EMH")]
    ElectronMicroscopyHomology,
    #[serde(rename = "SSC")]
    #[sqlx(rename = "SSC")]
    SolutionScattering,
    #[serde(rename = "SSN")]
    #[sqlx(rename = "SSN")]
    SolutionStateNmr,
    #[serde(rename = "SSM")]
    #[sqlx(rename = "SSM")]
    SolutionStateNmrHomology,
    #[default]
    #[serde(rename = "N/A")]
    #[sqlx(rename = "N/A")]
    NotAvailable,
}

impl ExpMethod {
    pub const ALL: [ExpMethod; 9] = [
        ExpMethod::XrayDiffraction,
        ExpMethod::ElectronMicroscopy,
        ExpMethod::SolutionNmr,
        ExpMethod::SolutionScatteringHomology,
        ExpMethod::ElectronMicroscopyHomology,
        ExpMethod::SolutionScattering,
        ExpMethod::SolutionStateNmr,
        ExpMethod::SolutionStateNmrHomology,
        ExpMethod::NotAvailable,
    ];

    /// Code stored in `pdb.exp_method`
    pub fn as_code(&self) -> &'static str {
        match self {
            Self::XrayDiffraction => "XRD",
            Self::ElectronMicroscopy => "EMP",
            Self::SolutionNmr => "SNM",
            Self::SolutionScatteringHomology => "SSH",
            Self::ElectronMicroscopyHomology => "EMH",
            Self::SolutionScattering => "SSC",
            Self::SolutionStateNmr => "SSN",
            Self::SolutionStateNmrHomology => "SSM",
            Self::NotAvailable => "N/A",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::XrayDiffraction => "X-ray diffraction",
            Self::ElectronMicroscopy => "Electron microscopy",
            Self::SolutionNmr => "Solution NMR",
            Self::SolutionScatteringHomology => "Solution scattering/Homology modelling",
            Self::ElectronMicroscopyHomology => "Electron microscopy/Homology modelling",
            Self::SolutionScattering => "Solution scattering",
            Self::SolutionStateNmr => "Solution-state NMR",
            Self::SolutionStateNmrHomology => "Solution-state NMR/Homology modelling",
            Self::NotAvailable => "N/A",
        }
    }
}

impl fmt::Display for ExpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for ExpMethod {
    type Err = Error;

    /// Accepts either the stored code or the display label
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_code() == s || m.label() == s)
            .ok_or_else(|| Error::Validation(format!("Invalid experimental method: {}", s)))
    }
}

/// Light chain isotype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
pub enum LightChainType {
    #[default]
    #[serde(rename = "N")]
    #[sqlx(rename = "N")]
    NotAvailable,
    #[serde(rename = "K")]
    #[sqlx(rename = "K")]
    Kappa,
    #[serde(rename = "L")]
    #[sqlx(rename = "L")]
    Lambda,
}

impl LightChainType {
    pub const ALL: [LightChainType; 3] = [
        LightChainType::NotAvailable,
        LightChainType::Kappa,
        LightChainType::Lambda,
    ];

    pub fn as_code(&self) -> &'static str {
        match self {
            Self::NotAvailable => "N",
            Self::Kappa => "K",
            Self::Lambda => "L",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::NotAvailable => "N/A",
            Self::Kappa => "kappa",
            Self::Lambda => "lambda",
        }
    }
}

impl fmt::Display for LightChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for LightChainType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_code() == s || t.label() == s)
            .ok_or_else(|| Error::Validation(format!("Invalid light chain type: {}", s)))
    }
}

/// CDR numbering/clustering scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
pub enum ClusterMethod {
    #[serde(rename = "CH")]
    #[sqlx(rename = "CH")]
    Chothia,
    #[serde(rename = "KB")]
    #[sqlx(rename = "KB")]
    Kabat,
    #[serde(rename = "CN")]
    #[sqlx(rename = "CN")]
    Contact,
    #[default]
    #[serde(rename = "NA")]
    #[sqlx(rename = "NA")]
    NotAvailable,
}

impl ClusterMethod {
    pub const ALL: [ClusterMethod; 4] = [
        ClusterMethod::Chothia,
        ClusterMethod::Kabat,
        ClusterMethod::Contact,
        ClusterMethod::NotAvailable,
    ];

    pub fn as_code(&self) -> &'static str {
        match self {
            Self::Chothia => "CH",
            Self::Kabat => "KB",
            Self::Contact => "CN",
            Self::NotAvailable => "NA",
        }
    }

    /// Display label; the stored label keeps the historical "Cohthia" spelling
    pub fn label(&self) -> &'static str {
        match self {
            Self::Chothia => "Cohthia",
            Self::Kabat => "Kabat",
            Self::Contact => "Contact",
            Self::NotAvailable => "N/A",
        }
    }
}

impl fmt::Display for ClusterMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for ClusterMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_code() == s || m.label() == s)
            .ok_or_else(|| Error::Validation(format!("Invalid clustering method: {}", s)))
    }
}

/// Which CDR loop a cluster describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
pub enum CdrType {
    H1,
    H2,
    H3,
    L1,
    L2,
    L3,
    #[default]
    #[serde(rename = "NA")]
    #[sqlx(rename = "NA")]
    NotAvailable,
}

impl CdrType {
    pub const ALL: [CdrType; 7] = [
        CdrType::H1,
        CdrType::H2,
        CdrType::H3,
        CdrType::L1,
        CdrType::L2,
        CdrType::L3,
        CdrType::NotAvailable,
    ];

    pub fn as_code(&self) -> &'static str {
        match self {
            Self::H1 => "H1",
            Self::H2 => "H2",
            Self::H3 => "H3",
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::L3 => "L3",
            Self::NotAvailable => "NA",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::NotAvailable => "N/A",
            other => other.as_code(),
        }
    }

    /// True for the heavy-chain loops H1..H3
    pub fn is_heavy(&self) -> bool {
        matches!(self, Self::H1 | Self::H2 | Self::H3)
    }

    /// True for the light-chain loops L1..L3
    pub fn is_light(&self) -> bool {
        matches!(self, Self::L1 | Self::L2 | Self::L3)
    }
}

impl fmt::Display for CdrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for CdrType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_code() == s || t.label() == s)
            .ok_or_else(|| Error::Validation(format!("Invalid CDR type: {}", s)))
    }
}
