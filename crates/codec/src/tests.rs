use std::any::Any;

use super::*;

#[test]
fn round_trips_all_primitives() {
    let mut buf = Vec::new();
    {
        let mut w = Writer::new(&mut buf);
        w.write_bool(true).unwrap();
        w.write_u8(200).unwrap();
        w.write_i8(-12).unwrap();
        w.write_u16(40_000).unwrap();
        w.write_i16(-1_234).unwrap();
        w.write_u32(3_000_000_000).unwrap();
        w.write_i32(-70_000).unwrap();
        w.write_u64(u64::MAX).unwrap();
        w.write_i64(i64::MIN).unwrap();
        w.write_f32(1.5).unwrap();
        w.write_f64(-2.25).unwrap();
        w.write_str("hello").unwrap();
        w.write_bytes(&[1, 2, 3, 4]).unwrap();
    }

    let mut r = Reader::new(&buf[..]);
    assert!(r.read_bool().unwrap());
    assert_eq!(r.read_u8().unwrap(), 200);
    assert_eq!(r.read_i8().unwrap(), -12);
    assert_eq!(r.read_u16().unwrap(), 40_000);
    assert_eq!(r.read_i16().unwrap(), -1_234);
    assert_eq!(r.read_u32().unwrap(), 3_000_000_000);
    assert_eq!(r.read_i32().unwrap(), -70_000);
    assert_eq!(r.read_u64().unwrap(), u64::MAX);
    assert_eq!(r.read_i64().unwrap(), i64::MIN);
    assert_eq!(r.read_f32().unwrap(), 1.5);
    assert_eq!(r.read_f64().unwrap(), -2.25);
    assert_eq!(r.read_str().unwrap(), "hello");
    assert_eq!(r.read_bytes().unwrap(), vec![1, 2, 3, 4]);
}

#[test]
fn read_bytes_rejects_oversized_length_prefix() {
    let mut buf = Vec::new();
    {
        let mut w = Writer::new(&mut buf);
        w.write_u32(u32::MAX).unwrap();
    }
    let mut r = Reader::new(&buf[..]);
    let err = r.read_bytes().unwrap_err();
    assert!(matches!(err, CodecError::Corrupt(_)));
}

#[test]
fn read_str_rejects_invalid_utf8() {
    let mut buf = Vec::new();
    {
        let mut w = Writer::new(&mut buf);
        w.write_bytes(&[0xff, 0xfe]).unwrap();
    }
    let mut r = Reader::new(&buf[..]);
    let err = r.read_str().unwrap_err();
    assert!(matches!(err, CodecError::Corrupt(_)));
}

#[test]
fn fingerprint_is_stable_and_order_sensitive() {
    let a = fingerprint(b"abc");
    let b = fingerprint(b"abc");
    let c = fingerprint(b"cba");
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn fingerprint_changes_with_single_byte_flip() {
    let a = fingerprint(b"entity-bytes-v1");
    let b = fingerprint(b"entity-bytes-v2");
    assert_ne!(a, b);
}

#[test]
fn schema_fingerprint_is_order_sensitive() {
    let a = registry::schema_fingerprint(&[ids::I32, ids::STRING]);
    let b = registry::schema_fingerprint(&[ids::STRING, ids::I32]);
    assert_ne!(a, b);

    let a2 = registry::schema_fingerprint(&[ids::I32, ids::STRING]);
    assert_eq!(a, a2);
}

#[test]
fn registry_rejects_builtin_range() {
    let mut reg = TypeRegistry::new();
    let err = reg
        .register_user(ids::I32, |r| Ok(Box::new(0i32) as Box<dyn Any + Send + Sync>), |_, _| Ok(()))
        .unwrap_err();
    assert!(matches!(err, CodecError::InvalidTypeId(_, _)));
}

#[test]
fn registry_rejects_duplicate_registration() {
    let mut reg = TypeRegistry::new();
    reg.register_user(
        2000,
        |r| {
            let mut buf = [0u8; 4];
            std::io::Read::read_exact(r, &mut buf)?;
            Ok(Box::new(i32::from_le_bytes(buf)) as Box<dyn Any + Send + Sync>)
        },
        |v, w| {
            let n = *v.downcast_ref::<i32>().unwrap();
            std::io::Write::write_all(w, &n.to_le_bytes())?;
            Ok(())
        },
    )
    .unwrap();

    let err = reg
        .register_user(2000, |r| Ok(Box::new(0i32) as Box<dyn Any + Send + Sync>), |_, _| Ok(()))
        .unwrap_err();
    assert!(matches!(err, CodecError::InvalidTypeId(_, _)));
}

#[test]
fn registry_rejects_registration_after_freeze() {
    let mut reg = TypeRegistry::new();
    reg.freeze();
    let err = reg
        .register_user(2001, |r| Ok(Box::new(0i32) as Box<dyn Any + Send + Sync>), |_, _| Ok(()))
        .unwrap_err();
    assert!(matches!(err, CodecError::RegistryFrozen));
}

#[test]
fn registry_round_trips_user_type() {
    let mut reg = TypeRegistry::new();
    reg.register_user(
        2002,
        |r| {
            let mut buf = [0u8; 4];
            std::io::Read::read_exact(r, &mut buf)?;
            Ok(Box::new(i32::from_le_bytes(buf)) as Box<dyn Any + Send + Sync>)
        },
        |v, w| {
            let n = *v.downcast_ref::<i32>().unwrap();
            std::io::Write::write_all(w, &n.to_le_bytes())?;
            Ok(())
        },
    )
    .unwrap();

    let mut buf = Vec::new();
    let value: Box<dyn Any + Send + Sync> = Box::new(42i32);
    reg.encode_user(2002, value.as_ref(), &mut buf).unwrap();

    let mut cursor = &buf[..];
    let decoded = reg.decode_user(2002, &mut cursor).unwrap();
    assert_eq!(*decoded.downcast_ref::<i32>().unwrap(), 42);
}

#[test]
fn is_known_covers_builtins_and_user_types() {
    let mut reg = TypeRegistry::new();
    assert!(reg.is_known(ids::STRING));
    assert!(!reg.is_known(5000));
    reg.register_user(5000, |r| Ok(Box::new(0i32) as Box<dyn Any + Send + Sync>), |_, _| Ok(()))
        .unwrap();
    assert!(reg.is_known(5000));
}
