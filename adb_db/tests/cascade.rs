//! ABOUTME: Cascade-delete tests across the antibody hierarchy
//! ABOUTME: Deleting a parent removes exactly the rows reachable through foreign keys

mod common;

use adb_db::{
    AntibodyRepository, AntigenRepository, CreateAntibodyRequest, Db, HierarchyReader,
    PdbRepository, SequenceRepository, StructureRepository, ALLOWED_TABLES,
};
use common::seed_hierarchy;

const STRUCTURE_DEPENDENTS: &[&str] = &[
    "structure",
    "antigen",
    "antibody",
    "heavy_chain",
    "light_chain",
    "heavy_variable",
    "heavy_conserved",
    "light_variable",
    "light_conserved",
    "cdr_heavy",
    "cdr_light",
    "cdr_pair",
    "cdr_cluster",
    "binding_affinity",
];

#[tokio::test]
async fn deleting_a_structure_removes_its_whole_subtree() {
    let db = Db::new_in_memory().await.unwrap();
    seed_hierarchy(&db, 1).await;
    let seeded = seed_hierarchy(&db, 2).await;

    StructureRepository::new(db.pool())
        .delete(seeded.structure_id)
        .await
        .unwrap();

    let stats = db.stats().await.unwrap();
    for &table in STRUCTURE_DEPENDENTS {
        assert_eq!(stats.count(table), 1, "{} should keep only the other tree", table);
    }
    // Parents above the structure survive
    assert_eq!(stats.count("sequence"), 2);
    assert_eq!(stats.count("pdb"), 2);
}

#[tokio::test]
async fn preview_matches_the_real_cascade_and_changes_nothing() {
    let db = Db::new_in_memory().await.unwrap();
    let seeded = seed_hierarchy(&db, 1).await;
    let before = db.stats().await.unwrap();

    let preview = HierarchyReader::new(db.pool())
        .structure_dependents(seeded.structure_id)
        .await
        .unwrap();

    assert_eq!(db.stats().await.unwrap().table_counts, before.table_counts);
    for &table in STRUCTURE_DEPENDENTS {
        assert_eq!(preview.count(table), 1, "preview count for {}", table);
    }
    assert_eq!(preview.count("sequence"), 0);
    assert_eq!(preview.total(), STRUCTURE_DEPENDENTS.len() as i64);

    StructureRepository::new(db.pool())
        .delete(seeded.structure_id)
        .await
        .unwrap();
    let after = db.stats().await.unwrap();
    for &table in ALLOWED_TABLES {
        assert_eq!(
            before.count(table) - after.count(table),
            preview.count(table),
            "removed rows in {}",
            table
        );
    }
}

#[tokio::test]
async fn preview_follows_the_antigen_link_into_other_structures() {
    let db = Db::new_in_memory().await.unwrap();
    let seeded = seed_hierarchy(&db, 1).await;

    // A second structure whose antigen is bound by an antibody modelled elsewhere
    let sequence = SequenceRepository::new(db.pool())
        .create("NIVLTQSPASLAVSLGQ")
        .await
        .unwrap();
    let other = StructureRepository::new(db.pool())
        .create(sequence.id, "structure_files/20240101/other.pdb")
        .await
        .unwrap();
    let antigen = AntigenRepository::new(db.pool())
        .create(other.id)
        .await
        .unwrap();
    AntibodyRepository::new(db.pool())
        .create(CreateAntibodyRequest {
            pdb_id: seeded.pdb_id,
            structure_id: seeded.structure_id,
            antigen_id: Some(antigen.id),
        })
        .await
        .unwrap();

    let preview = HierarchyReader::new(db.pool())
        .structure_dependents(other.id)
        .await
        .unwrap();

    assert_eq!(preview.count("structure"), 1);
    assert_eq!(preview.count("antigen"), 1);
    assert_eq!(preview.count("antibody"), 1);
    assert_eq!(preview.count("heavy_chain"), 0);
}

#[tokio::test]
async fn preview_of_missing_structure_is_not_found() {
    let db = Db::new_in_memory().await.unwrap();

    let err = HierarchyReader::new(db.pool())
        .structure_dependents(77)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn deleting_an_antigen_removes_bound_antibodies_and_affinities() {
    let db = Db::new_in_memory().await.unwrap();
    let seeded = seed_hierarchy(&db, 1).await;

    AntigenRepository::new(db.pool())
        .delete(seeded.antigen_id)
        .await
        .unwrap();

    let stats = db.stats().await.unwrap();
    assert_eq!(stats.count("antibody"), 0);
    assert_eq!(stats.count("binding_affinity"), 0);
    assert_eq!(stats.count("cdr_cluster"), 0);
    assert_eq!(stats.count("structure"), 1);
}

#[tokio::test]
async fn deleting_a_pdb_entry_keeps_the_antigen() {
    let db = Db::new_in_memory().await.unwrap();
    let seeded = seed_hierarchy(&db, 1).await;

    PdbRepository::new(db.pool()).delete(seeded.pdb_id).await.unwrap();

    let stats = db.stats().await.unwrap();
    assert_eq!(stats.count("antibody"), 0);
    assert_eq!(stats.count("heavy_chain"), 0);
    assert_eq!(stats.count("antigen"), 1);
}

#[tokio::test]
async fn deleting_a_sequence_leaves_only_pdb_rows() {
    let db = Db::new_in_memory().await.unwrap();
    let seeded = seed_hierarchy(&db, 1).await;

    SequenceRepository::new(db.pool())
        .delete(seeded.sequence_id)
        .await
        .unwrap();

    let stats = db.stats().await.unwrap();
    assert_eq!(stats.total_rows(), stats.count("pdb"));
    assert_eq!(stats.count("pdb"), 1);
}

#[tokio::test]
async fn deleting_twice_reports_not_found() {
    let db = Db::new_in_memory().await.unwrap();
    let seeded = seed_hierarchy(&db, 1).await;
    let structures = StructureRepository::new(db.pool());

    structures.delete(seeded.structure_id).await.unwrap();
    let err = structures.delete(seeded.structure_id).await.unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn delete_structure_reports_exactly_what_it_removed() {
    let db = Db::new_in_memory().await.unwrap();
    seed_hierarchy(&db, 1).await;
    let seeded = seed_hierarchy(&db, 2).await;
    let hierarchy = HierarchyReader::new(db.pool());
    let before = db.stats().await.unwrap();

    let deleted = hierarchy.delete_structure(seeded.structure_id).await.unwrap();

    let after = db.stats().await.unwrap();
    for &table in ALLOWED_TABLES {
        assert_eq!(
            before.count(table) - after.count(table),
            deleted.count(table),
            "reported rows in {}",
            table
        );
    }
    assert_eq!(deleted.total(), STRUCTURE_DEPENDENTS.len() as i64);
    assert!(StructureRepository::new(db.pool())
        .find_by_id(seeded.structure_id)
        .await
        .unwrap()
        .is_none());

    let err = hierarchy.delete_structure(seeded.structure_id).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(db.stats().await.unwrap().table_counts, after.table_counts);
}
