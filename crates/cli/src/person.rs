//! The `people` table's entity and schema: a small, self-contained example
//! of the explicit registration pattern every real table follows (see
//! `config::Mapper`).

use codec::{Reader, Writer};
use config::{type_ids, Comparator, IndexValue, Mapper, PrimaryKey, TableSchema};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub id: i32,
    pub name: String,
    pub age: i32,
}

impl std::fmt::Display for Person {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\t{}\t{}", self.id, self.name, self.age)
    }
}

/// Builds the `people` table's schema: primary key on `id`, a
/// case-insensitive index on `name`, and an ordinal index on `age`.
pub fn schema() -> TableSchema<Person> {
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
                let id = reader.read_i32()?;
                let name = reader.read_str()?;
                let age = reader.read_i32()?;
                Ok(Person { id, name, age })
            },
        )
        .declare_types(&[type_ids::I32, type_ids::STRING, type_ids::I32])
        .build()
        .expect("people schema builds")
}
