use codec::{Reader, Writer};

use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Person {
    id: i32,
    surname: String,
}

fn person_schema() -> TableSchema<Person> {
    Mapper::new("people")
        .key(|p: &Person| PrimaryKey::I32(p.id))
        .with_index("surname", Comparator::OrdinalIgnoreCase, |p: &Person| {
            IndexValue::Str(p.surname.clone())
        })
        .codec(
            |p, w| {
                let mut writer = Writer::new(w);
                writer.write_i32(p.id)?;
                writer.write_str(&p.surname)
            },
            |r| {
                let mut reader = Reader::new(r);
                let id = reader.read_i32()?;
                let surname = reader.read_str()?;
                Ok(Person { id, surname })
            },
        )
        .declare_types(&[type_ids::I32, type_ids::STRING])
        .build()
        .expect("schema builds")
}

#[test]
fn schema_round_trips_entity_bytes() {
    let schema = person_schema();
    let person = Person {
        id: 7,
        surname: "Nakamura".into(),
    };

    let mut buf = Vec::new();
    schema.encode(&person, &mut buf).unwrap();

    let mut cursor = &buf[..];
    let decoded = schema.decode(&mut cursor).unwrap();
    assert_eq!(decoded, person);
}

#[test]
fn schema_exposes_key_and_index_extraction() {
    let schema = person_schema();
    let person = Person {
        id: 7,
        surname: "Nakamura".into(),
    };

    assert_eq!(schema.primary_key(&person), PrimaryKey::I32(7));
    assert_eq!(schema.indexes().len(), 1);
    assert_eq!(schema.indexes()[0].extract(&person), IndexValue::Str("Nakamura".into()));
}

#[test]
fn schema_fingerprint_is_stable_for_same_type_list() {
    let a = person_schema();
    let b = person_schema();
    assert_eq!(a.schema_fingerprint(), b.schema_fingerprint());
}

#[test]
fn build_fails_without_key() {
    let err = Mapper::<Person>::new("people")
        .codec(|_, _| Ok(()), |_| Err(codec::CodecError::Corrupt("unused".into())))
        .declare_types(&[type_ids::I32])
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::MissingKey(_)));
}

#[test]
fn build_fails_without_codec() {
    let err = Mapper::<Person>::new("people")
        .key(|p: &Person| PrimaryKey::I32(p.id))
        .declare_types(&[type_ids::I32])
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::MissingCodec(_)));
}

#[test]
fn build_fails_without_declared_types() {
    let err = Mapper::<Person>::new("people")
        .key(|p: &Person| PrimaryKey::I32(p.id))
        .codec(|_, _| Ok(()), |_| Err(codec::CodecError::Corrupt("unused".into())))
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::EmptyTypeDeclaration(_)));
}

#[test]
fn build_fails_on_duplicate_index_name() {
    let err = Mapper::<Person>::new("people")
        .key(|p: &Person| PrimaryKey::I32(p.id))
        .with_index("surname", Comparator::Ordinal, |p: &Person| IndexValue::Str(p.surname.clone()))
        .with_index("surname", Comparator::Ordinal, |p: &Person| IndexValue::Str(p.surname.clone()))
        .codec(|_, _| Ok(()), |_| Err(codec::CodecError::Corrupt("unused".into())))
        .declare_types(&[type_ids::I32])
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateIndex(_, _)));
}
