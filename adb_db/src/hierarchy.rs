//! ABOUTME: Read views across the antibody hierarchy
//! ABOUTME: Antibody trees for reporting and cascade previews for structure deletes

use crate::error::classify;
use crate::repositories::{
    antibodies::{Antibody, AntibodyRepository},
    antigens::{Antigen, AntigenRepository},
    binding_affinities::{BindingAffinity, BindingAffinityRepository},
    cdrs::{CdrCluster, CdrHeavy, CdrLight, CdrPair, CdrRepository},
    chains::{ChainRepository, HeavyChain, LightChain},
    pdbs::{Pdb, PdbRepository},
    regions::{Region, RegionKind, RegionRepository},
};
use crate::{is_valid_table_name, ALLOWED_TABLES};
use adb_core::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableRegionTree<C> {
    pub region: Region,
    pub cdrs: Vec<C>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeavyChainTree {
    pub chain: HeavyChain,
    pub variable_regions: Vec<VariableRegionTree<CdrHeavy>>,
    pub conserved_regions: Vec<Region>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightChainTree {
    pub chain: LightChain,
    pub variable_regions: Vec<VariableRegionTree<CdrLight>>,
    pub conserved_regions: Vec<Region>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairTree {
    pub pair: CdrPair,
    pub clusters: Vec<CdrCluster>,
}

/// An antibody with everything hanging off it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntibodyTree {
    pub antibody: Antibody,
    pub pdb: Pdb,
    pub antigen: Option<Antigen>,
    pub heavy_chains: Vec<HeavyChainTree>,
    pub light_chains: Vec<LightChainTree>,
    pub pairs: Vec<PairTree>,
    pub affinities: Vec<BindingAffinity>,
}

impl AntibodyTree {
    pub fn heavy_cdr_ids(&self) -> Vec<i64> {
        self.heavy_chains
            .iter()
            .flat_map(|c| c.variable_regions.iter())
            .flat_map(|v| v.cdrs.iter().map(|cdr| cdr.id))
            .collect()
    }

    pub fn light_cdr_ids(&self) -> Vec<i64> {
        self.light_chains
            .iter()
            .flat_map(|c| c.variable_regions.iter())
            .flat_map(|v| v.cdrs.iter().map(|cdr| cdr.id))
            .collect()
    }
}

/// Rows that deleting one structure would remove, per table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependentCounts {
    pub structure_id: i64,
    pub table_counts: BTreeMap<String, i64>,
}

impl DependentCounts {
    pub fn count(&self, table: &str) -> i64 {
        self.table_counts.get(table).copied().unwrap_or(0)
    }

    pub fn total(&self) -> i64 {
        self.table_counts.values().sum()
    }
}

pub struct HierarchyReader<'a> {
    pool: &'a SqlitePool,
}

impl<'a> HierarchyReader<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Load an antibody with its chains, regions, CDRs, pairs and affinities
    #[instrument(skip(self))]
    pub async fn antibody_tree(&self, antibody_id: i64) -> Result<Option<AntibodyTree>> {
        let Some(antibody) = AntibodyRepository::new(self.pool)
            .find_by_id(antibody_id)
            .await?
        else {
            return Ok(None);
        };

        let pdb = PdbRepository::new(self.pool)
            .find_by_id(antibody.pdb_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("PDB entry {} not found", antibody.pdb_id)))?;

        let antigen = match antibody.antigen_id {
            Some(id) => AntigenRepository::new(self.pool).find_by_id(id).await?,
            None => None,
        };

        let chains = ChainRepository::new(self.pool);
        let regions = RegionRepository::new(self.pool);
        let cdrs = CdrRepository::new(self.pool);

        let mut heavy_chains = Vec::new();
        for chain in chains.list_heavy_by_antibody(antibody.id).await? {
            let mut variable_regions = Vec::new();
            for region in regions
                .list_by_chain(RegionKind::HeavyVariable, chain.id)
                .await?
            {
                let loops = cdrs.list_heavy_by_variable(region.id).await?;
                variable_regions.push(VariableRegionTree { region, cdrs: loops });
            }
            let conserved_regions = regions
                .list_by_chain(RegionKind::HeavyConserved, chain.id)
                .await?;
            heavy_chains.push(HeavyChainTree {
                chain,
                variable_regions,
                conserved_regions,
            });
        }

        let mut light_chains = Vec::new();
        for chain in chains.list_light_by_antibody(antibody.id).await? {
            let mut variable_regions = Vec::new();
            for region in regions
                .list_by_chain(RegionKind::LightVariable, chain.id)
                .await?
            {
                let loops = cdrs.list_light_by_variable(region.id).await?;
                variable_regions.push(VariableRegionTree { region, cdrs: loops });
            }
            let conserved_regions = regions
                .list_by_chain(RegionKind::LightConserved, chain.id)
                .await?;
            light_chains.push(LightChainTree {
                chain,
                variable_regions,
                conserved_regions,
            });
        }

        let affinities = BindingAffinityRepository::new(self.pool)
            .list_by_antibody(antibody.id)
            .await?;

        let mut tree = AntibodyTree {
            antibody,
            pdb,
            antigen,
            heavy_chains,
            light_chains,
            pairs: Vec::new(),
            affinities,
        };

        // A pair can reach this antibody through either side; keep each once
        let mut pairs = BTreeMap::new();
        for id in tree.heavy_cdr_ids() {
            for pair in cdrs.list_pairs_by_heavy(id).await? {
                pairs.insert(pair.id, pair);
            }
        }
        for id in tree.light_cdr_ids() {
            for pair in cdrs.list_pairs_by_light(id).await? {
                pairs.insert(pair.id, pair);
            }
        }
        for (_, pair) in pairs {
            let clusters = cdrs.list_clusters_by_pair(pair.id).await?;
            tree.pairs.push(PairTree { pair, clusters });
        }

        debug!(
            antibody_id,
            heavy = tree.heavy_chains.len(),
            light = tree.light_chains.len(),
            pairs = tree.pairs.len(),
            "Loaded antibody tree"
        );
        Ok(Some(tree))
    }

    /// Count what a delete of `structure_id` would cascade to.
    ///
    /// Runs the delete inside a transaction that is always rolled back, so
    /// the numbers come from the engine's own cascade rules.
    #[instrument(skip(self))]
    pub async fn structure_dependents(&self, structure_id: i64) -> Result<DependentCounts> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| classify("Failed to begin transaction", e))?;

        let counts = cascade_delete(&mut tx, structure_id).await;

        tx.rollback()
            .await
            .map_err(|e| classify("Failed to roll back preview", e))?;

        counts
    }

    /// Delete `structure_id` and report the rows removed, counted in the
    /// same transaction as the delete.
    #[instrument(skip(self))]
    pub async fn delete_structure(&self, structure_id: i64) -> Result<DependentCounts> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| classify("Failed to begin transaction", e))?;

        let counts = cascade_delete(&mut tx, structure_id).await?;

        tx.commit()
            .await
            .map_err(|e| classify("Failed to commit structure delete", e))?;

        debug!(structure_id, rows = counts.total(), "Deleted structure");
        Ok(counts)
    }
}

/// Delete on `conn` and diff per-table counts; the caller decides whether to keep it
async fn cascade_delete(conn: &mut SqliteConnection, structure_id: i64) -> Result<DependentCounts> {
    let before = table_counts(conn).await?;

    let deleted = sqlx::query("DELETE FROM structure WHERE id = ?1")
        .bind(structure_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| classify("Failed to delete structure", e))?
        .rows_affected();

    if deleted == 0 {
        return Err(Error::NotFound(format!(
            "Structure {} not found",
            structure_id
        )));
    }

    let after = table_counts(conn).await?;

    let table_counts = before
        .into_iter()
        .filter_map(|(table, n)| {
            let removed = n - after.get(&table).copied().unwrap_or(0);
            (removed > 0).then_some((table, removed))
        })
        .collect();

    Ok(DependentCounts {
        structure_id,
        table_counts,
    })
}

async fn table_counts(conn: &mut SqliteConnection) -> Result<BTreeMap<String, i64>> {
    let mut counts = BTreeMap::new();
    for &table in ALLOWED_TABLES {
        if !is_valid_table_name(table) {
            return Err(Error::Database(format!("Invalid table name: '{}'", table)));
        }
        let query = format!("SELECT COUNT(*) FROM {}", table);
        let n: i64 = sqlx::query_scalar(&query)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| classify(&format!("Failed to count {}", table), e))?;
        counts.insert(table.to_string(), n);
    }
    Ok(counts)
}
