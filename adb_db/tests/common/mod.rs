//! ABOUTME: Fixture that seeds one complete antibody hierarchy
//! ABOUTME: Shared by the integration tests of the database crate

#![allow(dead_code)]

use adb_db::{
    AntibodyRepository, AntigenRepository, BindingAffinityRepository, CdrRepository, CdrType,
    ChainRepository, ClusterMethod, CreateAntibodyRequest, CreateBindingAffinityRequest,
    CreateCdrClusterRequest, CreatePdbRequest, Db, ExpMethod, LightChainType, PdbRepository,
    RegionKind, RegionRepository, SequenceRepository, StructureRepository,
};
use test_support::{sample_pdb_code, sample_sequence};

/// Ids of every row the fixture created
#[derive(Debug, Clone)]
pub struct Seeded {
    pub sequence_id: i64,
    pub structure_id: i64,
    pub pdb_id: i64,
    pub antigen_id: i64,
    pub antibody_id: i64,
    pub heavy_chain_id: i64,
    pub light_chain_id: i64,
    pub heavy_variable_id: i64,
    pub heavy_conserved_id: i64,
    pub light_variable_id: i64,
    pub light_conserved_id: i64,
    pub cdr_heavy_id: i64,
    pub cdr_light_id: i64,
    pub pair_id: i64,
    pub cluster_id: i64,
    pub affinity_id: i64,
}

pub async fn seed_hierarchy(db: &Db, n: usize) -> Seeded {
    let pool = db.pool();

    let sequence = SequenceRepository::new(pool)
        .create(&sample_sequence(n))
        .await
        .expect("sequence");
    let structure = StructureRepository::new(pool)
        .create(sequence.id, &format!("structure_files/20240101/s{}.pdb", n))
        .await
        .expect("structure");
    let pdb = PdbRepository::new(pool)
        .create(CreatePdbRequest {
            pdb_code: sample_pdb_code(n),
            pdb_file: format!("pdb_files/20240101/p{}.pdb", n),
            exp_method: ExpMethod::XrayDiffraction,
            organism: Some("Homo sapiens".to_string()),
            resolution: Some(2.1),
            r_factor: Some(0.19),
        })
        .await
        .expect("pdb");
    let antigen = AntigenRepository::new(pool)
        .create(structure.id)
        .await
        .expect("antigen");
    let antibody = AntibodyRepository::new(pool)
        .create(CreateAntibodyRequest {
            pdb_id: pdb.id,
            structure_id: structure.id,
            antigen_id: Some(antigen.id),
        })
        .await
        .expect("antibody");

    let chains = ChainRepository::new(pool);
    let heavy = chains
        .create_heavy(antibody.id, structure.id)
        .await
        .expect("heavy chain");
    let light = chains
        .create_light(antibody.id, LightChainType::Kappa, structure.id)
        .await
        .expect("light chain");

    let regions = RegionRepository::new(pool);
    let heavy_variable = regions
        .create(RegionKind::HeavyVariable, heavy.id, structure.id)
        .await
        .expect("heavy variable");
    let heavy_conserved = regions
        .create(RegionKind::HeavyConserved, heavy.id, structure.id)
        .await
        .expect("heavy conserved");
    let light_variable = regions
        .create(RegionKind::LightVariable, light.id, structure.id)
        .await
        .expect("light variable");
    let light_conserved = regions
        .create(RegionKind::LightConserved, light.id, structure.id)
        .await
        .expect("light conserved");

    let cdrs = CdrRepository::new(pool);
    let cdr_heavy = cdrs
        .create_heavy(heavy_variable.id, structure.id)
        .await
        .expect("cdr heavy");
    let cdr_light = cdrs
        .create_light(light_variable.id, structure.id)
        .await
        .expect("cdr light");
    let pair = cdrs
        .create_pair(cdr_heavy.id, cdr_light.id)
        .await
        .expect("pair");
    let cluster = cdrs
        .create_cluster(CreateCdrClusterRequest {
            pair_id: pair.id,
            method: ClusterMethod::Chothia,
            cdr_type: CdrType::H3,
        })
        .await
        .expect("cluster");

    let affinity = BindingAffinityRepository::new(pool)
        .create(CreateBindingAffinityRequest {
            antibody_id: antibody.id,
            antigen_id: antigen.id,
            affinity: 1.2e-9,
        })
        .await
        .expect("affinity");

    Seeded {
        sequence_id: sequence.id,
        structure_id: structure.id,
        pdb_id: pdb.id,
        antigen_id: antigen.id,
        antibody_id: antibody.id,
        heavy_chain_id: heavy.id,
        light_chain_id: light.id,
        heavy_variable_id: heavy_variable.id,
        heavy_conserved_id: heavy_conserved.id,
        light_variable_id: light_variable.id,
        light_conserved_id: light_conserved.id,
        cdr_heavy_id: cdr_heavy.id,
        cdr_light_id: cdr_light.id,
        pair_id: pair.id,
        cluster_id: cluster.id,
        affinity_id: affinity.id,
    }
}
