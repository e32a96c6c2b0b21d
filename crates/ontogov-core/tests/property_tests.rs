#![allow(clippy::unwrap_used, clippy::expect_used)]

use ontogov_core::debt::normalize_expression;
use ontogov_core::diff::ChangeType;
use ontogov_core::matching::MatchConfig;
use ontogov_core::merge::MergeStrategy;
use ontogov_core::model::{
    Cardinality, EntityDef, EntityKind, OntologySnapshot, PropertyDef, RelationshipDef, RuleDef,
};
use ontogov_core::{diff, merge};
use proptest::prelude::*;

const ENTITY_NAMES: &[&str] = &["Customer", "Invoice", "Warehouse", "Ledger", "Region", "Supplier"];
const PROPERTY_NAMES: &[&str] = &["Id", "Amount", "Label", "Created", "Status", "Notes", "Code"];
const TYPES: &[&str] = &["int", "bigint", "nvarchar(50)", "varchar(20)", "decimal(18,2)", "date", "bit"];
const STRATEGIES: [MergeStrategy; 4] = [
    MergeStrategy::Ours,
    MergeStrategy::Theirs,
    MergeStrategy::Union,
    MergeStrategy::Manual,
];

fn arb_property() -> impl Strategy<Value = (usize, PropertyDef)> {
    (0..PROPERTY_NAMES.len(), prop::sample::select(TYPES), any::<bool>()).prop_map(
        |(idx, data_type, required)| {
            let property = PropertyDef::new(PROPERTY_NAMES[idx], data_type);
            (idx, if required { property.required() } else { property })
        },
    )
}

fn arb_entity(name: &'static str) -> impl Strategy<Value = EntityDef> {
    (
        prop::sample::select(vec![EntityKind::Standard, EntityKind::Dimension, EntityKind::Fact]),
        prop::collection::vec(arb_property(), 0..5),
    )
        .prop_map(move |(kind, props)| {
            let mut seen = std::collections::BTreeSet::new();
            props
                .into_iter()
                .filter(|(idx, _)| seen.insert(*idx))
                .fold(EntityDef::new(name).with_kind(kind), |e, (_, p)| e.with_property(p))
        })
}

fn arb_entities() -> impl Strategy<Value = Vec<EntityDef>> {
    prop::sample::subsequence(ENTITY_NAMES.to_vec(), 0..=4)
        .prop_shuffle()
        .prop_flat_map(|names| names.into_iter().map(arb_entity).collect::<Vec<_>>())
}

fn arb_snapshot() -> impl Strategy<Value = OntologySnapshot> {
    (
        prop::sample::select(vec!["sales", "finance", "ops"]),
        1u32..4,
        arb_entities(),
        prop::sample::subsequence(vec!["Revenue", "Margin", "Backlog"], 0..=3),
        any::<bool>(),
        prop::option::of(prop::sample::select(vec!["finance", "ops"])),
    )
        .prop_map(|(name, version, entities, rules, with_link, owner)| {
            let mut snapshot = OntologySnapshot::new(name, version.to_string());
            if with_link && entities.len() >= 2 {
                snapshot = snapshot.with_relationship(RelationshipDef::new(
                    "Link",
                    entities[0].name.clone(),
                    entities[1].name.clone(),
                    Cardinality::OneToMany,
                ));
            }
            for entity in entities {
                snapshot = snapshot.with_entity(entity);
            }
            for rule in rules {
                snapshot = snapshot.with_rule(
                    RuleDef::new(rule, "Customer", "", "")
                        .with_classification("measure")
                        .derived_from(format!("SUM({})", rule)),
                );
            }
            if let Some(owner) = owner {
                snapshot = snapshot.with_metadata("owner", serde_json::json!(owner));
            }
            snapshot
        })
}

// ----------------------------------------------------------------------------
// Diff
// ----------------------------------------------------------------------------

proptest! {
    #[test]
    fn prop_self_diff_has_no_changes(s in arb_snapshot()) {
        let report = diff(&s, &s).unwrap();
        prop_assert!(!report.has_changes());
        prop_assert_eq!(report.totals.changed(), 0);
        prop_assert_eq!(&report.old_digest, &report.new_digest);
    }

    #[test]
    fn prop_added_mirrors_reverse_removed(a in arb_snapshot(), b in arb_snapshot()) {
        let forward = diff(&a, &b).unwrap();
        let backward = diff(&b, &a).unwrap();
        prop_assert_eq!(forward.paths_with(ChangeType::Added), backward.paths_with(ChangeType::Removed));
        prop_assert_eq!(forward.paths_with(ChangeType::Removed), backward.paths_with(ChangeType::Added));
        prop_assert_eq!(forward.renames().count(), backward.renames().count());
    }

    #[test]
    fn prop_modified_entries_reverse_with_swapped_values(a in arb_snapshot(), b in arb_snapshot()) {
        let forward = diff(&a, &b).unwrap();
        let backward = diff(&b, &a).unwrap();
        for entry in forward.entries.iter().filter(|e| e.change == ChangeType::Modified) {
            let reversed = backward.entries.iter().any(|r| {
                r.element == entry.element
                    && r.change == ChangeType::Modified
                    && r.before == entry.after
                    && r.after == entry.before
            });
            prop_assert!(reversed, "no reverse entry for {}", entry.path);
        }
        prop_assert_eq!(forward.totals.modified, backward.totals.modified);
    }

    #[test]
    fn prop_diff_is_deterministic(old in arb_snapshot(), new in arb_snapshot()) {
        let first = diff(&old, &new).unwrap();
        let second = diff(&old, &new).unwrap();
        prop_assert_eq!(first, second);
    }
}

// ----------------------------------------------------------------------------
// Merge
// ----------------------------------------------------------------------------

proptest! {
    #[test]
    fn prop_merge_of_identical_inputs_is_identity(s in arb_snapshot()) {
        for strategy in STRATEGIES {
            let outcome = merge(&s, &s, &s, strategy).unwrap();
            prop_assert!(outcome.conflicts.is_empty());
            prop_assert_eq!(&outcome.merged, &s);
        }
    }

    #[test]
    fn prop_merge_takes_the_only_changed_side(base in arb_snapshot(), side in arb_snapshot()) {
        for strategy in STRATEGIES {
            let ours_only = merge(&base, &side, &base, strategy).unwrap();
            prop_assert!(ours_only.conflicts.is_empty());
            prop_assert_eq!(&ours_only.merged, &side);

            let theirs_only = merge(&base, &base, &side, strategy).unwrap();
            prop_assert!(theirs_only.conflicts.is_empty());
            prop_assert_eq!(&theirs_only.merged, &side);
        }
    }

    #[test]
    fn prop_agreeing_sides_merge_to_their_value(base in arb_snapshot(), side in arb_snapshot()) {
        for strategy in STRATEGIES {
            let outcome = merge(&base, &side, &side, strategy).unwrap();
            prop_assert!(outcome.is_final());
            prop_assert_eq!(&outcome.merged, &side);
        }
    }

    #[test]
    fn prop_union_of_disjoint_additions_commutes(
        base in arb_snapshot(),
        product in arb_entity("Product"),
        shipment in arb_entity("Shipment"),
    ) {
        let ours = base.clone().with_entity(product);
        let theirs = base.clone().with_entity(shipment);

        let left = merge(&base, &ours, &theirs, MergeStrategy::Union).unwrap();
        let right = merge(&base, &theirs, &ours, MergeStrategy::Union).unwrap();
        prop_assert!(left.is_final());
        prop_assert_eq!(&left.merged, &right.merged);
        prop_assert_eq!(left.merged.entities.len(), base.entities.len() + 2);
    }

    #[test]
    fn prop_union_commutes_across_element_kinds_and_header(
        base in arb_snapshot(),
        product in arb_entity("Product"),
        shipment in arb_entity("Shipment"),
    ) {
        let mut ours = base
            .clone()
            .with_entity(product)
            .with_relationship(RelationshipDef::new("Stocks", "Product", "Product", Cardinality::OneToOne))
            .with_rule(RuleDef::new("Churn", "Product", "", "").derived_from("COUNT(Product)"));
        ours.version = format!("{}-ours", base.version);
        let mut theirs = base
            .clone()
            .with_entity(shipment)
            .with_relationship(RelationshipDef::new("Ships", "Shipment", "Shipment", Cardinality::ManyToMany))
            .with_rule(RuleDef::new("Uptime", "Shipment", "", "").with_classification("kpi"));
        theirs.version = format!("{}-theirs", base.version);

        let left = merge(&base, &ours, &theirs, MergeStrategy::Union).unwrap();
        let right = merge(&base, &theirs, &ours, MergeStrategy::Union).unwrap();
        prop_assert_eq!(&left.merged, &right.merged);
        prop_assert_eq!(left.open_paths(), vec!["snapshot:version".to_string()]);
        prop_assert_eq!(right.open_paths(), vec!["snapshot:version".to_string()]);
        prop_assert_eq!(&left.merged.version, &base.version);
        prop_assert_eq!(left.merged.entities.len(), base.entities.len() + 2);
        prop_assert_eq!(left.merged.relationships.len(), base.relationships.len() + 2);
        prop_assert_eq!(left.merged.rules.len(), base.rules.len() + 2);
    }
}

// ----------------------------------------------------------------------------
// Matching and normalization
// ----------------------------------------------------------------------------

proptest! {
    #[test]
    fn prop_name_similarity_is_symmetric_and_bounded(a in "[A-Za-z_]{0,12}", b in "[A-Za-z_]{0,12}") {
        let config = MatchConfig::default();
        let ab = config.name_similarity(&a, &b);
        let ba = config.name_similarity(&b, &a);
        prop_assert!((0.0..=1.0).contains(&ab));
        prop_assert!((ab - ba).abs() < 1e-12);
    }

    #[test]
    fn prop_normalize_expression_is_idempotent(expr in "[ A-Za-z0-9\\[\\]()\"+*/]{0,40}") {
        let once = normalize_expression(&expr);
        prop_assert_eq!(normalize_expression(&once), once.clone());
        prop_assert!(!once.contains(' ') || expr.contains('"'));
    }
}
