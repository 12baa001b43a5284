use fields::{FieldIndex, SourceTable, StateSource};
use proptest::prelude::*;

fn source_strategy() -> impl Strategy<Value = StateSource> {
    (0u8..7).prop_map(|raw| StateSource::from_raw(raw).unwrap())
}

proptest! {
    #[test]
    fn prop_table_matches_unpacked_model(
        writes in prop::collection::vec((0..FieldIndex::COUNT as u8, source_strategy()), 1..256)
    ) {
        let mut table = SourceTable::new();
        let mut model = [StateSource::Game; FieldIndex::COUNT];

        for (raw, source) in &writes {
            let field = FieldIndex::new(*raw).unwrap();
            let old = table.set(field, *source);
            prop_assert_eq!(old, model[field.get()]);
            model[field.get()] = *source;
        }

        for field in FieldIndex::all() {
            prop_assert_eq!(table.get(field), model[field.get()]);
        }
    }

    #[test]
    fn prop_remove_fixed_leaves_no_fixed(
        writes in prop::collection::vec((0..FieldIndex::COUNT as u8, source_strategy()), 0..128)
    ) {
        let mut table = SourceTable::new();
        for (raw, source) in &writes {
            table.set(FieldIndex::new(*raw).unwrap(), *source);
        }
        let manual_before = table.count(StateSource::is_manual);
        let fixed_before = table.count(StateSource::is_fixed);

        let changed = table.remove_fixed();

        prop_assert_eq!(changed, fixed_before);
        prop_assert_eq!(table.count(StateSource::is_fixed), 0);
        prop_assert_eq!(table.count(StateSource::is_manual), manual_before + fixed_before);
    }
}
