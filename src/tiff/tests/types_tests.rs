//! Tests for the TIFF types module

use crate::io::byte_order::ByteOrder;
use crate::tiff::ifd::{IFDEntry, IFD};
use crate::tiff::types::{SampleKind, TIFF};

#[test]
fn test_tiff_creation() {
    let tiff = TIFF::new(false, ByteOrder::LittleEndian);
    assert!(!tiff.is_big_tiff);
    assert_eq!(tiff.ifd_count(), 0);
    assert!(tiff.main_ifd().is_none());
}

#[test]
fn test_tiff_main_ifd_is_the_first() {
    let mut tiff = TIFF::new(true, ByteOrder::BigEndian);

    let mut main_ifd = IFD::new(0, 16);
    main_ifd.add_entry(IFDEntry::new(256, 4, 1, 1024, [0; 8]));
    main_ifd.add_entry(IFDEntry::new(257, 4, 1, 768, [0; 8]));
    tiff.ifds.push(main_ifd);

    let mut overview_ifd = IFD::new(1, 100);
    overview_ifd.add_entry(IFDEntry::new(254, 4, 1, 1, [0; 8]));
    overview_ifd.add_entry(IFDEntry::new(256, 4, 1, 512, [0; 8]));
    overview_ifd.add_entry(IFDEntry::new(257, 4, 1, 384, [0; 8]));
    tiff.ifds.push(overview_ifd);

    assert_eq!(tiff.ifd_count(), 2);
    assert_eq!(tiff.main_ifd().unwrap().get_dimensions(), Some((1024, 768)));
    assert!(!tiff.main_ifd().unwrap().is_tiled());
}

#[test]
fn test_sample_kind_from_tags() {
    assert_eq!(SampleKind::from_tags(1, 8).unwrap(), SampleKind::U8);
    assert_eq!(SampleKind::from_tags(2, 16).unwrap(), SampleKind::I16);
    assert_eq!(SampleKind::from_tags(3, 32).unwrap(), SampleKind::F32);
    assert_eq!(SampleKind::from_tags(3, 64).unwrap().size(), 8);
    assert!(SampleKind::from_tags(3, 16).is_err());
    assert!(SampleKind::from_tags(1, 12).is_err());
}

#[test]
fn test_nodata_is_narrowed_for_float32() {
    let narrowed = SampleKind::F32.normalize_nodata(0.1);
    assert_eq!(narrowed, 0.1f32 as f64);
    assert_eq!(SampleKind::F64.normalize_nodata(0.1), 0.1);
    assert!(SampleKind::F32.normalize_nodata(f64::NAN).is_nan());
}
