use bytes::Bytes;
use cork::{
    decode, encode, Corker, CorkError, Decode, Decoder, Encode, Encoder, ErrorKind, ExtError,
    Extension, Reader, Registry, Selfer, Value, Writer,
};
use std::sync::Arc;

// =============================================================================
// Buffer protocol
// =============================================================================

#[derive(Debug, Default, PartialEq, Clone, Encode, Decode)]
#[cork(corker)]
struct Point {
    x: i16,
    y: i16,
}

impl Corker for Point {
    fn ext_tag(&self) -> u8 {
        5
    }

    fn marshal_cork(&self) -> Result<Vec<u8>, ExtError> {
        let mut out = self.x.to_be_bytes().to_vec();
        out.extend_from_slice(&self.y.to_be_bytes());
        Ok(out)
    }

    fn unmarshal_cork(&mut self, data: &[u8]) -> Result<(), ExtError> {
        if data.len() != 4 {
            return Err(format!("point payload is {} bytes", data.len()).into());
        }
        self.x = i16::from_be_bytes([data[0], data[1]]);
        self.y = i16::from_be_bytes([data[2], data[3]]);
        Ok(())
    }
}

#[test]
fn test_corker_wire_form() {
    let bytes = encode(&Point { x: 1, y: -2 }).unwrap();
    assert_eq!(&bytes[..], &[0xB4, 0x05, 0x00, 0x01, 0xFF, 0xFE]);

    let mut buf = bytes;
    let p: Point = decode(&mut buf).unwrap();
    assert_eq!(p, Point { x: 1, y: -2 });
}

#[test]
fn test_corker_decodes_into_value_when_registered() {
    cork::register(&Point::default()).unwrap();
    let mut buf = encode(&Point { x: 3, y: 4 }).unwrap();
    let value: Value = decode(&mut buf).unwrap();
    let ext = value.as_extension().unwrap();
    assert_eq!(ext.tag(), 5);
    assert_eq!(ext.downcast_ref::<Point>(), Some(&Point { x: 3, y: 4 }));

    // and back out again
    let again = encode(&value).unwrap();
    assert_eq!(&again[..], &[0xB4, 0x05, 0x00, 0x03, 0x00, 0x04]);
}

#[test]
fn test_corker_payload_error_is_user_codec() {
    let mut buf = Bytes::from_static(&[0xB1, 0x05, 0x00]);
    let err = decode::<Point>(&mut buf).unwrap_err();
    assert!(matches!(err, CorkError::UserCodec { tag: 5, .. }));
    assert_eq!(err.kind(), ErrorKind::UserCodec);
    assert!(err.to_string().contains("point payload is 1 bytes"));
}

#[test]
fn test_corker_tag_mismatch() {
    let mut buf = Bytes::from_static(&[0xB4, 0x06, 0, 0, 0, 0]);
    let err = decode::<Point>(&mut buf).unwrap_err();
    assert!(matches!(err, CorkError::TypeMismatch { found: 6, .. }));
}

#[derive(Debug, Default)]
struct Broken;

impl Corker for Broken {
    fn ext_tag(&self) -> u8 {
        11
    }

    fn marshal_cork(&self) -> Result<Vec<u8>, ExtError> {
        Err("cannot marshal".into())
    }

    fn unmarshal_cork(&mut self, _data: &[u8]) -> Result<(), ExtError> {
        Ok(())
    }
}

#[test]
fn test_marshal_failure_is_user_codec() {
    let mut writer = Writer::default();
    let err = cork::ext::encode_corker(&Broken, &mut writer).unwrap_err();
    assert!(matches!(err, CorkError::UserCodec { tag: 11, .. }));
    assert!(writer.is_empty());
}

#[test]
fn test_long_extension_payload() {
    #[derive(Debug, Default)]
    struct Blob(Vec<u8>);

    impl Corker for Blob {
        fn ext_tag(&self) -> u8 {
            12
        }

        fn marshal_cork(&self) -> Result<Vec<u8>, ExtError> {
            Ok(self.0.clone())
        }

        fn unmarshal_cork(&mut self, data: &[u8]) -> Result<(), ExtError> {
            self.0 = data.to_vec();
            Ok(())
        }
    }

    let blob = Blob(vec![1; 300]);
    let mut writer = Writer::default();
    cork::ext::encode_corker(&blob, &mut writer).unwrap();
    let bytes = writer.into_bytes();
    assert_eq!(&bytes[..4], &[0xED, 0x01, 0x2C, 12]);
    assert_eq!(bytes.len(), 304);

    let mut reader = Reader::new(bytes);
    let mut out = Blob::default();
    cork::ext::decode_corker(&mut out, &mut reader).unwrap();
    assert_eq!(out.0.len(), 300);
}

// =============================================================================
// Stream protocol
// =============================================================================

#[derive(Debug, Default, PartialEq, Encode, Decode)]
#[cork(selfer)]
struct Version {
    major: u8,
    minor: u16,
}

impl Selfer for Version {
    fn ext_tag(&self) -> u8 {
        7
    }

    fn marshal_to(&self, writer: &mut Writer) -> cork::Result<()> {
        self.major.encode(writer)?;
        self.minor.encode(writer)
    }

    fn unmarshal_from(&mut self, reader: &mut Reader) -> cork::Result<()> {
        self.major = u8::decode(reader)?;
        self.minor = u16::decode(reader)?;
        if self.major == 0 && self.minor == 0 {
            return Err(CorkError::user_codec(7, "version 0.0 is not valid"));
        }
        Ok(())
    }
}

#[test]
fn test_selfer_wire_form() {
    let v = Version { major: 1, minor: 300 };
    let bytes = encode(&v).unwrap();
    assert_eq!(&bytes[..], &[0xFE, 0x07, 0x01, 0xF5, 0x01, 0x2C]);
    let mut buf = bytes;
    assert_eq!(decode::<Version>(&mut buf).unwrap(), v);
}

#[test]
fn test_selfer_decodes_into_value_when_registered() {
    cork::register_selfer(&Version::default()).unwrap();
    let mut buf = encode(&Version { major: 2, minor: 1 }).unwrap();
    let value: Value = decode(&mut buf).unwrap();
    let ext = value.as_extension().unwrap();
    assert!(matches!(ext, Extension::Selfer(_)));
    assert_eq!(
        ext.downcast_ref::<Version>(),
        Some(&Version { major: 2, minor: 1 })
    );
}

#[test]
fn test_selfer_user_error() {
    let mut buf = Bytes::from_static(&[0xFE, 0x07, 0x00, 0x00]);
    let err = decode::<Version>(&mut buf).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UserCodec);
    assert!(std::error::Error::source(&err).is_some());
}

// =============================================================================
// Registry
// =============================================================================

#[test]
fn test_unregistered_extension_fails_dynamic_decode() {
    let registry = Arc::new(Registry::new());
    let bytes = encode(&Point { x: 0, y: 0 }).unwrap();
    let mut reader = Reader::new(bytes).with_registry(registry);
    let err = Value::decode(&mut reader).unwrap_err();
    assert!(matches!(err, CorkError::UnregisteredExtension(5)));
    assert_eq!(err.kind(), ErrorKind::MalformedStream);
}

#[test]
fn test_unregistered_corker_can_still_be_skipped() {
    let mut out = Vec::new();
    out.extend_from_slice(&[0xB2, 99, 0xAA, 0xBB]);
    out.extend_from_slice(&encode(&42u8).unwrap());
    let mut reader = Reader::new(Bytes::from(out)).with_registry(Arc::new(Registry::new()));
    cork::skip_value(&mut reader).unwrap();
    assert_eq!(u8::decode(&mut reader).unwrap(), 42);
}

#[test]
fn test_injected_registry() {
    let registry = Arc::new(Registry::new());
    registry.register_corker(&Point::default()).unwrap();
    assert!(registry.contains(5));
    assert!(registry.type_name(5).unwrap().ends_with("::Point"));

    let bytes = encode(&Point { x: 9, y: 9 }).unwrap();
    let mut reader = Reader::new(bytes).with_registry(registry);
    let value = Value::decode(&mut reader).unwrap();
    assert_eq!(
        value.as_extension().and_then(|e| e.downcast_ref::<Point>()),
        Some(&Point { x: 9, y: 9 })
    );
}

#[derive(Debug, Default)]
struct OtherPoint;

impl Corker for OtherPoint {
    fn ext_tag(&self) -> u8 {
        5
    }

    fn marshal_cork(&self) -> Result<Vec<u8>, ExtError> {
        Ok(Vec::new())
    }

    fn unmarshal_cork(&mut self, _data: &[u8]) -> Result<(), ExtError> {
        Ok(())
    }
}

#[test]
fn test_conflicting_registration() {
    let registry = Registry::new();
    registry.register_corker(&Point::default()).unwrap();
    // same type again is fine
    registry.register_corker(&Point::default()).unwrap();

    let err = registry.register_corker(&OtherPoint).unwrap_err();
    assert!(matches!(err, CorkError::DuplicateExtension { tag: 5, .. }));
    assert_eq!(err.kind(), ErrorKind::Registry);
    assert!(registry.type_name(5).unwrap().ends_with("::Point"));

    assert!(registry.register_selfer(&Version::default()).is_ok());
    assert!(registry.new_corker(7).is_err());
    assert!(registry.new_selfer(7).is_ok());
}

// =============================================================================
// Extensions inside other values
// =============================================================================

#[derive(Debug, Default, PartialEq, Encode, Decode)]
struct Shape {
    name: String,
    origin: Point,
    points: Vec<Point>,
    version: Option<Version>,
}

#[test]
fn test_extensions_as_struct_fields() {
    let shape = Shape {
        name: "tri".to_string(),
        origin: Point { x: 1, y: 1 },
        points: vec![Point { x: 0, y: 0 }, Point { x: 5, y: 0 }],
        version: Some(Version { major: 1, minor: 0 }),
    };
    let mut buf = encode(&shape).unwrap();
    assert_eq!(decode::<Shape>(&mut buf).unwrap(), shape);
}

#[test]
fn test_extension_equality_by_wire_bytes() {
    let a = Extension::from_corker(Point { x: 1, y: 2 });
    let b = Extension::from_corker(Point { x: 1, y: 2 });
    let c = Extension::from_corker(Point { x: 2, y: 1 });
    assert_eq!(a, b);
    assert_ne!(a, c);
}
