use codec::{Reader, Writer};
use config::{type_ids, Comparator, IndexValue, Mapper, PrimaryKey, TableSchema};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub id: i32,
    pub name: String,
    pub age: i32,
}

pub fn person_schema(name: &str) -> TableSchema<Person> {
    Mapper::new(name)
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
                let id = reader.read_i32()?;
                let name = reader.read_str()?;
                let age = reader.read_i32()?;
                Ok(Person { id, name, age })
            },
        )
        .declare_types(&[type_ids::I32, type_ids::STRING, type_ids::I32])
        .build()
        .expect("schema builds")
}

pub fn person_schema_with_quota(name: &str, max_rows: u64) -> TableSchema<Person> {
    Mapper::new(name)
        .key(|p: &Person| PrimaryKey::I32(p.id))
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
                let id = reader.read_i32()?;
                let name = reader.read_str()?;
                let age = reader.read_i32()?;
                Ok(Person { id, name, age })
            },
        )
        .declare_types(&[type_ids::I32, type_ids::STRING, type_ids::I32])
        .quota(max_rows)
        .build()
        .expect("schema builds")
}

pub fn alice() -> Person {
    Person {
        id: 1,
        name: "Alice".into(),
        age: 30,
    }
}

pub fn bob() -> Person {
    Person {
        id: 2,
        name: "Bob".into(),
        age: 41,
    }
}

pub fn carol() -> Person {
    Person {
        id: 3,
        name: "Carol".into(),
        age: 25,
    }
}

pub struct TablePaths {
    pub _dir: TempDir,
    pub data: std::path::PathBuf,
    pub index: std::path::PathBuf,
}

pub fn table_paths(file_stem: &str) -> TablePaths {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = dir.path().join(format!("{file_stem}.data"));
    let index = dir.path().join(format!("{file_stem}.index"));
    TablePaths { _dir: dir, data, index }
}
