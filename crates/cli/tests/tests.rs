/// Library-level tests against the `engine`/`config` crates using a
/// standalone schema mirroring the CLI's `people` table, independent of the
/// binary's stdin/stdout surface (covered by `tests/integration_tests.rs`).
use codec::{Reader, Writer};
use config::{type_ids, Comparator, IndexValue, Mapper, PrimaryKey, TableSchema};
use engine::Table;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Person {
    id: i32,
    name: String,
    age: i32,
}

fn schema() -> TableSchema<Person> {
    Mapper::new("people")
        .key(|p: &Person| PrimaryKey::I32(p.id))
        .with_index("name", Comparator::OrdinalIgnoreCase, |p: &Person| IndexValue::Str(p.name.clone()))
        .with_index("age", Comparator::Ordinal, |p: &Person| IndexValue::I32(p.age))
        .codec(
            |p, w| {
                let mut writer = Writer::new(w);
                writer.write_i32(p.id)?;
                writer.write_str(&p.name)?;
                writer.write_i32(p.age)
            },
            |r| {
                let mut reader = Reader::new(r);
                Ok(Person {
                    id: reader.read_i32()?,
                    name: reader.read_str()?,
                    age: reader.read_i32()?,
                })
            },
        )
        .declare_types(&[type_ids::I32, type_ids::STRING, type_ids::I32])
        .build()
        .unwrap()
}

fn open_table(stem: &str) -> (tempfile::TempDir, Table<Person>) {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join(format!("{stem}.data"));
    let index = dir.path().join(format!("{stem}.index"));
    let table = Table::open(schema(), data, index).unwrap();
    (dir, table)
}

#[test]
fn save_then_load_round_trips() {
    let (_dir, table) = open_table("people");
    let alice = Person {
        id: 1,
        name: "Alice".into(),
        age: 30,
    };
    table.save(&alice).unwrap();
    assert_eq!(table.load_by_key(&PrimaryKey::I32(1)).unwrap(), Some(alice));
}

#[test]
fn delete_removes_the_row() {
    let (_dir, table) = open_table("people");
    let alice = Person {
        id: 1,
        name: "Alice".into(),
        age: 30,
    };
    table.save(&alice).unwrap();
    assert!(table.delete_by_key(&PrimaryKey::I32(1)).unwrap());
    assert_eq!(table.load_by_key(&PrimaryKey::I32(1)).unwrap(), None);
}

#[test]
fn bulk_write_applies_many_mutations_under_one_commit() {
    let (_dir, table) = open_table("people");
    table
        .bulk_write(|w| {
            for i in 0..1_000 {
                w.save(&Person {
                    id: i,
                    name: format!("person{i}"),
                    age: i % 80,
                })?;
            }
            Ok(())
        })
        .unwrap();

    assert_eq!(table.len(), 1_000);
}

#[test]
fn delete_heavy_workload_reclaims_rows_on_compact() {
    let (_dir, table) = open_table("people");
    for i in 0..200 {
        table
            .save(&Person {
                id: i,
                name: format!("p{i}"),
                age: i,
            })
            .unwrap();
    }
    for i in (0..200).step_by(2) {
        assert!(table.delete_by_key(&PrimaryKey::I32(i)).unwrap());
    }
    assert_eq!(table.len(), 100);

    let stats = table.compact().unwrap();
    assert_eq!(stats.rows_moved, 100);
    assert_eq!(table.len(), 100);
}
